//! Key primitive - key sequences, chords and reload shortcuts

use tabpilot_core_types::ActionResult;
use tracing::{debug, info};

use crate::{
    errors::ActionError,
    keys::{KeyChord, KeyCode, ReloadShortcut},
    primitives::DefaultActionPrimitives,
    types::{ActionCtx, KeyParams},
};

pub const MAX_KEY_REPEAT: u32 = 100;

enum KeyStep {
    Chord(KeyChord),
    Named(KeyCode),
    Literal(String),
}

/// Execute key primitive
///
/// A lone reload shortcut reloads the page instead of sending key events.
/// Otherwise every token is classified once and the whole sequence is sent
/// `repeat` times.
pub async fn execute_key(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
    params: &KeyParams,
) -> Result<ActionResult, ActionError> {
    if !(1..=MAX_KEY_REPEAT).contains(&params.repeat) {
        return Err(ActionError::validation(format!(
            "repeat must be an integer between 1 and {MAX_KEY_REPEAT}"
        )));
    }
    let tokens: Vec<&str> = params.text.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(ActionError::validation("text is required for key"));
    }

    let tab = ctx.tab_id;
    if let [single] = tokens.as_slice() {
        if let Some(shortcut) = ReloadShortcut::detect(single) {
            info!(tab = %tab, hard = shortcut.bypass_cache, "reload shortcut");
            primitives
                .surface()
                .reload(tab, shortcut.bypass_cache)
                .await?;
            let kind = if shortcut.bypass_cache {
                "Hard reloaded"
            } else {
                "Reloaded"
            };
            return Ok(ActionResult::ok(format!("{kind} the page ({single})")));
        }
    }

    let steps = tokens
        .iter()
        .map(|token| classify(token))
        .collect::<Result<Vec<_>, _>>()?;

    let surface = primitives.surface();
    for _ in 0..params.repeat {
        for step in &steps {
            match step {
                KeyStep::Chord(chord) => surface.press_chord(tab, chord).await?,
                KeyStep::Named(code) => surface.press_key(tab, code).await?,
                KeyStep::Literal(text) => surface.insert_text(tab, text).await?,
            }
        }
    }
    debug!(tab = %tab, tokens = steps.len(), repeat = params.repeat, "keys sent");

    let sequence = tokens.join(" ");
    let output = if params.repeat > 1 {
        format!("Pressed {} {} times", sequence, params.repeat)
    } else {
        format!("Pressed {sequence}")
    };
    Ok(ActionResult::ok(output))
}

fn classify(token: &str) -> Result<KeyStep, ActionError> {
    if token.len() > 1 && token.contains('+') {
        return KeyChord::parse(token).map(KeyStep::Chord);
    }
    Ok(match KeyCode::lookup(token) {
        Some(code) => KeyStep::Named(code),
        None => KeyStep::Literal(token.to_string()),
    })
}
