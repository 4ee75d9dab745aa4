//! Key names, chords and reload shortcuts.

use crate::errors::ActionError;
use crate::types::KeyMod;

/// A named key the surface can press directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyCode {
    pub key: &'static str,
    pub code: &'static str,
    pub key_code: u32,
    /// Text produced by the key, sent as a char event
    pub text: Option<&'static str>,
}

const fn named(key: &'static str, key_code: u32, text: Option<&'static str>) -> KeyCode {
    KeyCode {
        key,
        code: key,
        key_code,
        text,
    }
}

const KEY_TABLE: &[(&str, KeyCode)] = &[
    ("enter", named("Enter", 13, Some("\r"))),
    ("return", named("Enter", 13, Some("\r"))),
    ("tab", named("Tab", 9, Some("\t"))),
    ("escape", named("Escape", 27, None)),
    ("esc", named("Escape", 27, None)),
    ("backspace", named("Backspace", 8, None)),
    ("delete", named("Delete", 46, None)),
    ("insert", named("Insert", 45, None)),
    ("arrowup", named("ArrowUp", 38, None)),
    ("up", named("ArrowUp", 38, None)),
    ("arrowdown", named("ArrowDown", 40, None)),
    ("down", named("ArrowDown", 40, None)),
    ("arrowleft", named("ArrowLeft", 37, None)),
    ("left", named("ArrowLeft", 37, None)),
    ("arrowright", named("ArrowRight", 39, None)),
    ("right", named("ArrowRight", 39, None)),
    ("home", named("Home", 36, None)),
    ("end", named("End", 35, None)),
    ("pageup", named("PageUp", 33, None)),
    ("page_up", named("PageUp", 33, None)),
    ("pagedown", named("PageDown", 34, None)),
    ("page_down", named("PageDown", 34, None)),
    (
        "space",
        KeyCode {
            key: " ",
            code: "Space",
            key_code: 32,
            text: Some(" "),
        },
    ),
    ("f1", named("F1", 112, None)),
    ("f2", named("F2", 113, None)),
    ("f3", named("F3", 114, None)),
    ("f4", named("F4", 115, None)),
    ("f5", named("F5", 116, None)),
    ("f6", named("F6", 117, None)),
    ("f7", named("F7", 118, None)),
    ("f8", named("F8", 119, None)),
    ("f9", named("F9", 120, None)),
    ("f10", named("F10", 121, None)),
    ("f11", named("F11", 122, None)),
    ("f12", named("F12", 123, None)),
];

impl KeyCode {
    /// Case-insensitive lookup of a key name.
    pub fn lookup(name: &str) -> Option<KeyCode> {
        let lowered = name.trim().to_ascii_lowercase();
        KEY_TABLE
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|(_, code)| *code)
    }
}

/// Parse a single modifier name.
pub fn modifier_from_name(name: &str) -> Option<KeyMod> {
    match name.trim().to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Some(KeyMod::CTRL),
        "shift" => Some(KeyMod::SHIFT),
        "alt" | "option" => Some(KeyMod::ALT),
        "cmd" | "command" | "meta" | "super" | "win" => Some(KeyMod::META),
        _ => None,
    }
}

/// Parse modifier text such as `"ctrl+shift"` into a mask.
pub fn parse_modifiers(raw: &str) -> Result<KeyMod, ActionError> {
    let mut mask = KeyMod::empty();
    for part in raw.split('+').map(str::trim).filter(|p| !p.is_empty()) {
        let modifier = modifier_from_name(part)
            .ok_or_else(|| ActionError::validation(format!("unknown modifier '{part}'")))?;
        mask |= modifier;
    }
    Ok(mask)
}

/// Modifier keys held while the final key is pressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyChord {
    pub modifiers: KeyMod,
    /// Named key when known, the literal last segment otherwise
    pub key: String,
    pub code: Option<KeyCode>,
    /// Chord as the caller wrote it
    pub raw: String,
}

impl KeyChord {
    pub fn parse(raw: &str) -> Result<Self, ActionError> {
        let parts: Vec<&str> = raw.split('+').map(str::trim).collect();
        let Some((last, mods)) = parts.split_last() else {
            return Err(ActionError::validation("empty key chord"));
        };
        if last.is_empty() {
            return Err(ActionError::validation(format!("incomplete key chord '{raw}'")));
        }
        // Segments that are not modifiers stay in `raw` for the surface to interpret.
        let modifiers = mods
            .iter()
            .filter_map(|part| modifier_from_name(part))
            .fold(KeyMod::empty(), |mask, modifier| mask | modifier);
        let code = KeyCode::lookup(last);
        let key = match code {
            Some(code) => code.key.to_string(),
            None => last.to_string(),
        };
        Ok(Self {
            modifiers,
            key,
            code,
            raw: raw.to_string(),
        })
    }
}

/// Page reload requested through a keyboard shortcut.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReloadShortcut {
    pub bypass_cache: bool,
}

impl ReloadShortcut {
    /// Recognises `cmd/ctrl+r`, `cmd/ctrl+shift+r`, `f5`, `ctrl+f5` and `shift+f5`.
    pub fn detect(token: &str) -> Option<Self> {
        let lowered = token.trim().to_ascii_lowercase();
        let parts: Vec<&str> = lowered.split('+').map(str::trim).collect();
        let (last, mods) = parts.split_last()?;

        let mut modifiers = KeyMod::empty();
        for part in mods {
            modifiers |= modifier_from_name(part)?;
        }

        match *last {
            "r" => {
                let has_primary = modifiers.intersects(KeyMod::CTRL | KeyMod::META);
                let extra = modifiers - (KeyMod::CTRL | KeyMod::META | KeyMod::SHIFT);
                (has_primary && extra.is_empty()).then_some(Self {
                    bypass_cache: modifiers.contains(KeyMod::SHIFT),
                })
            }
            "f5" => {
                let allowed = KeyMod::CTRL | KeyMod::SHIFT;
                allowed.contains(modifiers).then_some(Self {
                    bypass_cache: !modifiers.is_empty(),
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_shortcuts_are_detected() {
        assert_eq!(
            ReloadShortcut::detect("ctrl+r"),
            Some(ReloadShortcut {
                bypass_cache: false
            })
        );
        assert_eq!(
            ReloadShortcut::detect("cmd+shift+r"),
            Some(ReloadShortcut { bypass_cache: true })
        );
        assert_eq!(
            ReloadShortcut::detect("F5"),
            Some(ReloadShortcut {
                bypass_cache: false
            })
        );
        assert_eq!(
            ReloadShortcut::detect("shift+F5"),
            Some(ReloadShortcut { bypass_cache: true })
        );
        assert_eq!(
            ReloadShortcut::detect("ctrl+f5"),
            Some(ReloadShortcut { bypass_cache: true })
        );
    }

    #[test]
    fn non_reload_tokens_are_ignored() {
        assert_eq!(ReloadShortcut::detect("r"), None);
        assert_eq!(ReloadShortcut::detect("alt+r"), None);
        assert_eq!(ReloadShortcut::detect("ctrl+alt+r"), None);
        assert_eq!(ReloadShortcut::detect("alt+f5"), None);
        assert_eq!(ReloadShortcut::detect("ctrl+t"), None);
    }

    #[test]
    fn chords_parse_modifiers_and_key() {
        let chord = KeyChord::parse("ctrl+shift+Tab").unwrap();
        assert_eq!(chord.modifiers, KeyMod::CTRL | KeyMod::SHIFT);
        assert_eq!(chord.key, "Tab");
        assert!(chord.code.is_some());

        let chord = KeyChord::parse("cmd+a").unwrap();
        assert_eq!(chord.modifiers, KeyMod::META);
        assert_eq!(chord.key, "a");
        assert!(chord.code.is_none());

        assert!(KeyChord::parse("ctrl+").is_err());
    }

    #[test]
    fn unknown_chord_segments_pass_through() {
        let chord = KeyChord::parse("a+b").unwrap();
        assert!(chord.modifiers.is_empty());
        assert_eq!(chord.key, "b");
        assert_eq!(chord.raw, "a+b");

        let chord = KeyChord::parse("hyper+shift+x").unwrap();
        assert_eq!(chord.modifiers, KeyMod::SHIFT);
        assert_eq!(chord.raw, "hyper+shift+x");
    }

    #[test]
    fn key_lookup_is_case_insensitive() {
        assert_eq!(KeyCode::lookup("ENTER").unwrap().key, "Enter");
        assert_eq!(KeyCode::lookup("page_down").unwrap().key_code, 34);
        assert!(KeyCode::lookup("hello").is_none());
    }

    #[test]
    fn modifier_text_builds_mask() {
        assert_eq!(
            parse_modifiers("ctrl+shift").unwrap(),
            KeyMod::CTRL | KeyMod::SHIFT
        );
        assert_eq!(parse_modifiers("").unwrap(), KeyMod::empty());
        assert!(parse_modifiers("ctrl+banana").is_err());
    }
}
