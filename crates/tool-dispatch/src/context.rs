//! Session-keyed execution contexts.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tabpilot_core_types::{GroupId, SessionId, TabId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub tab_id: Option<TabId>,
    pub tab_group_id: Option<GroupId>,
}

impl SessionContext {
    pub fn new(tab_id: TabId, tab_group_id: GroupId) -> Self {
        Self {
            tab_id: Some(tab_id),
            tab_group_id: Some(tab_group_id),
        }
    }
}

/// Active tab and group per automation session. Reads return copies.
#[derive(Debug, Default)]
pub struct SessionContexts {
    inner: DashMap<SessionId, SessionContext>,
}

impl SessionContexts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, session: &SessionId) -> SessionContext {
        self.inner
            .get(session)
            .map(|entry| *entry.value())
            .unwrap_or_default()
    }

    pub fn set(&self, session: SessionId, context: SessionContext) {
        self.inner.insert(session, context);
    }

    pub fn remove(&self, session: &SessionId) -> Option<SessionContext> {
        self.inner.remove(session).map(|(_, context)| context)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
