//! Per-group frame buffers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;
use tabpilot_core_types::GroupId;
use tracing::{debug, info};

use crate::metrics;
use crate::model::{ActionInfo, Frame, FrameCapture};

pub const MAX_FRAMES: usize = 50;

#[derive(Debug, Default)]
struct RecordingSession {
    frames: VecDeque<Frame>,
    is_recording: bool,
    /// Changes on every (re)start so stale export hand-offs are recognised.
    epoch: u64,
    /// Frames removed from the front since the epoch began.
    dropped: u64,
}

impl RecordingSession {
    fn push(&mut self, capacity: usize, capture: FrameCapture) -> usize {
        let frame = Frame {
            image: capture.image,
            action: capture.action,
            frame_number: self.frames.len() as u64,
            viewport_width: capture.viewport_width,
            viewport_height: capture.viewport_height,
            device_pixel_ratio: capture.device_pixel_ratio,
        };
        self.frames.push_back(frame);

        let mut evicted = 0;
        while self.frames.len() > capacity {
            self.frames.pop_front();
            evicted += 1;
        }
        self.dropped += evicted as u64;
        evicted
    }
}

/// Frames handed to an export, plus the position they occupied in the session.
///
/// Passing it back to [`RecordingStore::release`] removes exactly these frames,
/// leaving anything appended in the meantime for the next export.
#[derive(Clone, Debug)]
pub struct ExportHandoff {
    pub group: GroupId,
    pub frames: Vec<Frame>,
    epoch: u64,
    first: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started { discarded: usize },
    AlreadyActive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped { frames: usize },
    NotActive,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppendOutcome {
    pub appended: usize,
    pub evicted: usize,
    pub total: usize,
}

/// Recording sessions keyed by tab group. Each mutation runs under the group's lock.
#[derive(Debug)]
pub struct RecordingStore {
    capacity: usize,
    sessions: DashMap<GroupId, Mutex<RecordingSession>>,
    epochs: AtomicU64,
}

impl Default for RecordingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::with_capacity(MAX_FRAMES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            sessions: DashMap::new(),
            epochs: AtomicU64::new(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn start(&self, group: GroupId) -> StartOutcome {
        let entry = self.sessions.entry(group).or_default();
        let mut session = entry.lock();
        if session.is_recording {
            return StartOutcome::AlreadyActive;
        }
        let discarded = session.frames.len();
        session.frames.clear();
        session.epoch = self.epochs.fetch_add(1, Ordering::Relaxed);
        session.dropped = 0;
        session.is_recording = true;
        info!(group = %group, discarded, "recording started");
        StartOutcome::Started { discarded }
    }

    pub fn stop(&self, group: GroupId) -> StopOutcome {
        let Some(entry) = self.sessions.get(&group) else {
            return StopOutcome::NotActive;
        };
        let mut session = entry.lock();
        if !session.is_recording {
            return StopOutcome::NotActive;
        }
        session.is_recording = false;
        let frames = session.frames.len();
        info!(group = %group, frames, "recording stopped");
        StopOutcome::Stopped { frames }
    }

    pub fn is_recording(&self, group: GroupId) -> bool {
        self.sessions
            .get(&group)
            .map(|entry| entry.lock().is_recording)
            .unwrap_or(false)
    }

    pub fn frame_count(&self, group: GroupId) -> usize {
        self.sessions
            .get(&group)
            .map(|entry| entry.lock().frames.len())
            .unwrap_or(0)
    }

    pub fn frames(&self, group: GroupId) -> Vec<Frame> {
        self.sessions
            .get(&group)
            .map(|entry| entry.lock().frames.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop frames and recording state. Returns how many frames were discarded.
    pub fn clear(&self, group: GroupId) -> usize {
        let discarded = self
            .sessions
            .remove(&group)
            .map(|(_, session)| session.into_inner().frames.len())
            .unwrap_or(0);
        debug!(group = %group, discarded, "recording cleared");
        discarded
    }

    /// Snapshot the group's frames for an export. Recording state is untouched.
    pub fn hand_off(&self, group: GroupId) -> ExportHandoff {
        let Some(entry) = self.sessions.get(&group) else {
            return ExportHandoff {
                group,
                frames: Vec::new(),
                epoch: 0,
                first: 0,
            };
        };
        let session = entry.lock();
        ExportHandoff {
            group,
            frames: session.frames.iter().cloned().collect(),
            epoch: session.epoch,
            first: session.dropped,
        }
    }

    /// Remove the frames of `handoff` that are still buffered. Frames appended after the
    /// hand-off and the recording flag survive. Returns how many frames were removed.
    pub fn release(&self, handoff: &ExportHandoff) -> usize {
        let Some(entry) = self.sessions.get(&handoff.group) else {
            return 0;
        };
        let mut session = entry.lock();
        if session.epoch != handoff.epoch {
            debug!(group = %handoff.group, "recording restarted during export; nothing released");
            return 0;
        }
        let end = handoff.first + handoff.frames.len() as u64;
        let pending = end.saturating_sub(session.dropped) as usize;
        let released = pending.min(session.frames.len());
        session.frames.drain(..released);
        session.dropped += released as u64;
        debug!(
            group = %handoff.group,
            released,
            remaining = session.frames.len(),
            "exported frames released"
        );
        released
    }

    /// Append one frame. `None` when the group is not recording.
    pub fn append_frame(&self, group: GroupId, capture: FrameCapture) -> Option<AppendOutcome> {
        self.append_action_frames(group, None, capture)
    }

    /// Append the post-action frame, preceded by an overlay frame when `overlay` is set.
    ///
    /// The overlay duplicates the latest frame's image tagged with the new action and
    /// is skipped when the buffer is empty. Both frames land in one lock acquisition.
    pub fn append_action_frames(
        &self,
        group: GroupId,
        overlay: Option<ActionInfo>,
        capture: FrameCapture,
    ) -> Option<AppendOutcome> {
        let entry = self.sessions.get(&group)?;
        let mut session = entry.lock();
        if !session.is_recording {
            return None;
        }

        let mut outcome = AppendOutcome::default();
        if let Some(action) = overlay {
            if let Some(previous) = session.frames.back().cloned() {
                let overlay_capture = FrameCapture {
                    image: previous.image,
                    action: Some(action),
                    viewport_width: previous.viewport_width,
                    viewport_height: previous.viewport_height,
                    device_pixel_ratio: previous.device_pixel_ratio,
                };
                outcome.evicted += session.push(self.capacity, overlay_capture);
                outcome.appended += 1;
            }
        }
        outcome.evicted += session.push(self.capacity, capture);
        outcome.appended += 1;
        outcome.total = session.frames.len();

        metrics::record_frames(outcome.appended, outcome.evicted);
        debug!(
            group = %group,
            appended = outcome.appended,
            evicted = outcome.evicted,
            total = outcome.total,
            "frames appended"
        );
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabpilot_core_types::ImagePayload;

    fn capture(tag: &str) -> FrameCapture {
        FrameCapture {
            image: ImagePayload::png(tag),
            action: Some(ActionInfo::new("screenshot")),
            viewport_width: 1280,
            viewport_height: 800,
            device_pixel_ratio: 1.0,
        }
    }

    #[test]
    fn fifty_first_frame_evicts_the_oldest() {
        let store = RecordingStore::new();
        let group = GroupId(7);
        store.start(group);
        for i in 0..50 {
            store.append_frame(group, capture(&format!("f{i}"))).unwrap();
        }
        assert_eq!(store.frame_count(group), 50);

        let outcome = store.append_frame(group, capture("f50")).unwrap();
        assert_eq!(outcome.evicted, 1);
        assert_eq!(outcome.total, 50);

        let frames = store.frames(group);
        assert_eq!(frames.first().unwrap().image.data, "f1");
        assert_eq!(frames.last().unwrap().image.data, "f50");
        assert_eq!(frames.last().unwrap().frame_number, 50);
    }

    #[test]
    fn frame_number_is_buffer_index_at_capture() {
        let store = RecordingStore::with_capacity(2);
        let group = GroupId(8);
        store.start(group);
        for tag in ["a", "b", "c", "d"] {
            store.append_frame(group, capture(tag)).unwrap();
        }
        let numbers: Vec<u64> = store
            .frames(group)
            .into_iter()
            .map(|f| f.frame_number)
            .collect();
        assert_eq!(numbers, vec![2, 2]);
    }

    #[test]
    fn release_keeps_frames_appended_after_hand_off() {
        let store = RecordingStore::new();
        let group = GroupId(5);
        store.start(group);
        store.append_frame(group, capture("a")).unwrap();
        store.append_frame(group, capture("b")).unwrap();

        let handoff = store.hand_off(group);
        assert_eq!(handoff.frames.len(), 2);
        store.append_frame(group, capture("late")).unwrap();

        assert_eq!(store.release(&handoff), 2);
        assert!(store.is_recording(group));
        let data: Vec<_> = store
            .frames(group)
            .into_iter()
            .map(|f| f.image.data)
            .collect();
        assert_eq!(data, vec!["late"]);
    }

    #[test]
    fn release_accounts_for_evictions_during_export() {
        let store = RecordingStore::with_capacity(3);
        let group = GroupId(6);
        store.start(group);
        for tag in ["a", "b", "c"] {
            store.append_frame(group, capture(tag)).unwrap();
        }
        let handoff = store.hand_off(group);
        store.append_frame(group, capture("d")).unwrap();
        store.append_frame(group, capture("e")).unwrap();

        assert_eq!(store.release(&handoff), 1);
        let data: Vec<_> = store
            .frames(group)
            .into_iter()
            .map(|f| f.image.data)
            .collect();
        assert_eq!(data, vec!["d", "e"]);
    }

    #[test]
    fn release_after_restart_is_a_no_op() {
        let store = RecordingStore::new();
        let group = GroupId(11);
        store.start(group);
        store.append_frame(group, capture("a")).unwrap();
        let handoff = store.hand_off(group);

        store.stop(group);
        store.start(group);
        store.append_frame(group, capture("fresh")).unwrap();

        assert_eq!(store.release(&handoff), 0);
        assert_eq!(store.frame_count(group), 1);
    }

    #[test]
    fn start_while_recording_keeps_frames() {
        let store = RecordingStore::new();
        let group = GroupId(1);
        assert_eq!(store.start(group), StartOutcome::Started { discarded: 0 });
        store.append_frame(group, capture("a")).unwrap();
        assert_eq!(store.start(group), StartOutcome::AlreadyActive);
        assert_eq!(store.frame_count(group), 1);
    }

    #[test]
    fn restart_after_stop_discards_stale_frames() {
        let store = RecordingStore::new();
        let group = GroupId(1);
        store.start(group);
        store.append_frame(group, capture("a")).unwrap();
        assert_eq!(store.stop(group), StopOutcome::Stopped { frames: 1 });
        assert_eq!(store.stop(group), StopOutcome::NotActive);
        assert_eq!(store.frame_count(group), 1);
        assert_eq!(store.start(group), StartOutcome::Started { discarded: 1 });
        assert_eq!(store.frame_count(group), 0);
    }

    #[test]
    fn frames_are_ignored_when_not_recording() {
        let store = RecordingStore::new();
        assert!(store.append_frame(GroupId(2), capture("a")).is_none());
        store.start(GroupId(2));
        store.stop(GroupId(2));
        assert!(store.append_frame(GroupId(2), capture("b")).is_none());
    }

    #[test]
    fn overlay_duplicates_previous_image() {
        let store = RecordingStore::new();
        let group = GroupId(3);
        store.start(group);

        let first = store
            .append_action_frames(group, Some(ActionInfo::new("left_click")), capture("one"))
            .unwrap();
        assert_eq!(first.appended, 1);

        let second = store
            .append_action_frames(group, Some(ActionInfo::new("left_click")), capture("two"))
            .unwrap();
        assert_eq!(second.appended, 2);

        let frames = store.frames(group);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].image.data, "one");
        assert_eq!(frames[1].action.as_ref().unwrap().verb, "left_click");
        assert_eq!(frames[2].image.data, "two");
    }

    #[test]
    fn overlay_pair_respects_capacity() {
        let store = RecordingStore::with_capacity(3);
        let group = GroupId(4);
        store.start(group);
        for tag in ["a", "b", "c"] {
            store.append_frame(group, capture(tag)).unwrap();
        }
        let outcome = store
            .append_action_frames(group, Some(ActionInfo::new("right_click")), capture("d"))
            .unwrap();
        assert_eq!(outcome.evicted, 2);
        let data: Vec<_> = store
            .frames(group)
            .into_iter()
            .map(|f| f.image.data)
            .collect();
        assert_eq!(data, vec!["c", "c", "d"]);
    }

    #[test]
    fn clear_reports_discarded_count() {
        let store = RecordingStore::new();
        assert_eq!(store.clear(GroupId(9)), 0);
        store.start(GroupId(9));
        store.append_frame(GroupId(9), capture("a")).unwrap();
        store.append_frame(GroupId(9), capture("b")).unwrap();
        assert_eq!(store.clear(GroupId(9)), 2);
        assert!(!store.is_recording(GroupId(9)));
    }
}
