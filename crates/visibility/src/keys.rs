//! Raw key events and the hold-to-reveal gesture built on them.

use std::fmt;
use std::str::FromStr;

use cartkeep_core::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub meta: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Meta,
}

impl Modifier {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Some(Modifier::Ctrl),
            "alt" | "option" => Some(Modifier::Alt),
            "shift" => Some(Modifier::Shift),
            "meta" | "cmd" | "command" | "super" => Some(Modifier::Meta),
            _ => None,
        }
    }
}

impl Modifiers {
    fn set(&mut self, m: Modifier) {
        match m {
            Modifier::Ctrl => self.ctrl = true,
            Modifier::Alt => self.alt = true,
            Modifier::Shift => self.shift = true,
            Modifier::Meta => self.meta = true,
        }
    }

    fn has(&self, m: Modifier) -> bool {
        match m {
            Modifier::Ctrl => self.ctrl,
            Modifier::Alt => self.alt,
            Modifier::Shift => self.shift,
            Modifier::Meta => self.meta,
        }
    }
}

/// A modifier set plus one key, e.g. `Alt+Shift+H`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub modifiers: Modifiers,
    key: String,
}

impl KeyCombo {
    pub fn key(&self) -> &str {
        &self.key
    }

    fn is_key(&self, event: &KeyEvent) -> bool {
        if event.key.eq_ignore_ascii_case(&self.key) {
            return true;
        }
        // Alt on macOS rewrites `key`; the physical code still matches.
        match &event.code {
            Some(code) => {
                code.eq_ignore_ascii_case(&format!("Key{}", self.key))
                    || code.eq_ignore_ascii_case(&format!("Digit{}", self.key))
            }
            None => false,
        }
    }

    fn modifiers_held(&self, held: &Modifiers) -> bool {
        [Modifier::Ctrl, Modifier::Alt, Modifier::Shift, Modifier::Meta]
            .into_iter()
            .all(|m| !self.modifiers.has(m) || held.has(m))
    }

    fn is_required_modifier(&self, key: &str) -> bool {
        Modifier::from_name(key).is_some_and(|m| self.modifiers.has(m))
    }
}

impl FromStr for KeyCombo {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let mut modifiers = Modifiers::default();
        let mut key: Option<String> = None;
        for part in raw.split('+').map(str::trim) {
            if part.is_empty() {
                return Err(Error::Config(format!("Invalid key combo '{}'", raw)));
            }
            match Modifier::from_name(part) {
                Some(m) => modifiers.set(m),
                None if key.is_none() => key = Some(part.to_ascii_lowercase()),
                None => {
                    return Err(Error::Config(format!(
                        "Key combo '{}' names more than one key",
                        raw
                    )))
                }
            }
        }
        let key = key.ok_or_else(|| Error::Config(format!("Key combo '{}' has no key", raw)))?;
        Ok(Self { modifiers, key })
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.modifiers;
        for (on, name) in [(m.ctrl, "Ctrl"), (m.alt, "Alt"), (m.shift, "Shift"), (m.meta, "Meta")] {
            if on {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{}", self.key.to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPhase {
    Down,
    Up,
}

/// The element that had focus when the key event fired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyTarget {
    pub tag: String,
    #[serde(default)]
    pub content_editable: bool,
}

impl KeyTarget {
    pub fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            content_editable: false,
        }
    }

    pub fn is_editable(&self) -> bool {
        self.content_editable
            || matches!(
                self.tag.to_ascii_lowercase().as_str(),
                "input" | "textarea" | "select"
            )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
    pub phase: KeyPhase,
    pub key: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub target: KeyTarget,
}

impl KeyEvent {
    pub fn down(key: &str, modifiers: Modifiers) -> Self {
        Self {
            phase: KeyPhase::Down,
            key: key.to_string(),
            code: None,
            modifiers,
            target: KeyTarget::element("body"),
        }
    }

    pub fn up(key: &str, modifiers: Modifiers) -> Self {
        Self {
            phase: KeyPhase::Up,
            ..Self::down(key, modifiers)
        }
    }

    pub fn on(mut self, target: KeyTarget) -> Self {
        self.target = target;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldSignal {
    Begin,
    End,
}

/// Turns raw key events into hold begin/end edges for one combo.
#[derive(Debug, Clone)]
pub struct HoldGesture {
    combo: KeyCombo,
    held: bool,
}

impl HoldGesture {
    pub fn new(combo: KeyCombo) -> Self {
        Self { combo, held: false }
    }

    pub fn combo(&self) -> &KeyCombo {
        &self.combo
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn on_event(&mut self, event: &KeyEvent) -> Option<HoldSignal> {
        match event.phase {
            KeyPhase::Down => {
                if event.target.is_editable() {
                    return None;
                }
                if self.held {
                    // Required modifiers gone on a later down: the release was missed.
                    if !self.combo.modifiers_held(&event.modifiers) {
                        self.held = false;
                        return Some(HoldSignal::End);
                    }
                    return None;
                }
                if self.combo.is_key(event) && event.modifiers == self.combo.modifiers {
                    self.held = true;
                    return Some(HoldSignal::Begin);
                }
                None
            }
            KeyPhase::Up => {
                if self.held
                    && (self.combo.is_key(event) || self.combo.is_required_modifier(&event.key))
                {
                    self.held = false;
                    return Some(HoldSignal::End);
                }
                None
            }
        }
    }

    /// Focus left the page. Returns `true` if a hold was in progress.
    pub fn reset(&mut self) -> bool {
        std::mem::replace(&mut self.held, false)
    }
}
