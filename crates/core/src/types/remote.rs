//! Remote-control (headset button) bindings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine operation a headset button can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteAction {
    Rewind10,
    Rewind30,
    Rewind45,
    Rewind60,
    FastForward10,
    FastForward30,
    FastForward60,
    AddBookmark,
    CreateClip,
    PreviousChapter,
    NextChapter,
    PlayPause,
    VolumeUp,
    VolumeDown,
    Nothing,
}

impl RemoteAction {
    /// Every action, in the order offered to the user
    pub const ALL: [RemoteAction; 15] = [
        Self::Rewind10,
        Self::Rewind30,
        Self::Rewind45,
        Self::Rewind60,
        Self::FastForward10,
        Self::FastForward30,
        Self::FastForward60,
        Self::AddBookmark,
        Self::CreateClip,
        Self::PreviousChapter,
        Self::NextChapter,
        Self::PlayPause,
        Self::VolumeUp,
        Self::VolumeDown,
        Self::Nothing,
    ];

    /// Display name, as stored in the mapping
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rewind10 => "Rewind 10 s",
            Self::Rewind30 => "Rewind 30 s",
            Self::Rewind45 => "Rewind 45 s",
            Self::Rewind60 => "Rewind 60 s",
            Self::FastForward10 => "Fast forward 10 s",
            Self::FastForward30 => "Fast forward 30 s",
            Self::FastForward60 => "Fast forward 60 s",
            Self::AddBookmark => "Add bookmark",
            Self::CreateClip => "Create clip",
            Self::PreviousChapter => "Previous chapter",
            Self::NextChapter => "Next chapter",
            Self::PlayPause => "Play/Pause",
            Self::VolumeUp => "Volume up",
            Self::VolumeDown => "Volume down",
            Self::Nothing => "Nothing",
        }
    }

    /// Looks an action up by name, ignoring case and surrounding whitespace
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|action| action.name().eq_ignore_ascii_case(name))
    }

    /// Seconds to skip for the rewind/fast-forward actions
    pub fn skip_seconds(&self) -> Option<f64> {
        match self {
            Self::Rewind10 => Some(-10.0),
            Self::Rewind30 => Some(-30.0),
            Self::Rewind45 => Some(-45.0),
            Self::Rewind60 => Some(-60.0),
            Self::FastForward10 => Some(10.0),
            Self::FastForward30 => Some(30.0),
            Self::FastForward60 => Some(60.0),
            _ => None,
        }
    }
}

impl fmt::Display for RemoteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical headset button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteButton {
    Previous,
    Next,
}

/// Outcome of press disambiguation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PressKind {
    Short,
    Long,
}

/// Action names bound to the two buttons
///
/// Names are kept as text so that bindings saved by a newer version with
/// unknown names still load; unknown names dispatch to nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteControlMapping {
    pub previous_short: String,
    pub next_short: String,
    pub previous_long: String,
    pub next_long: String,
    pub swap_buttons: bool,
}

impl Default for RemoteControlMapping {
    fn default() -> Self {
        Self {
            previous_short: RemoteAction::Rewind45.name().to_string(),
            next_short: RemoteAction::CreateClip.name().to_string(),
            previous_long: RemoteAction::PreviousChapter.name().to_string(),
            next_long: RemoteAction::NextChapter.name().to_string(),
            swap_buttons: false,
        }
    }
}

impl RemoteControlMapping {
    /// Returns the action name bound to a physical button and press kind
    pub fn action_for(&self, button: RemoteButton, kind: PressKind) -> &str {
        let logical = match (button, self.swap_buttons) {
            (RemoteButton::Previous, false) | (RemoteButton::Next, true) => RemoteButton::Previous,
            (RemoteButton::Next, false) | (RemoteButton::Previous, true) => RemoteButton::Next,
        };

        match (logical, kind) {
            (RemoteButton::Previous, PressKind::Short) => &self.previous_short,
            (RemoteButton::Next, PressKind::Short) => &self.next_short,
            (RemoteButton::Previous, PressKind::Long) => &self.previous_long,
            (RemoteButton::Next, PressKind::Long) => &self.next_long,
        }
    }

    /// Returns the names that do not match any known action
    pub fn unknown_actions(&self) -> Vec<&str> {
        [
            &self.previous_short,
            &self.next_short,
            &self.previous_long,
            &self.next_long,
        ]
        .into_iter()
        .filter(|name| RemoteAction::from_name(name).is_none())
        .map(String::as_str)
        .collect()
    }
}
