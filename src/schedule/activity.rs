//! Generic editing activity reported by an attached editor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Editor activity that does not name a source. It only extends an
/// already pending quiet period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Activity {
    KeyDown,
    KeyUp,
    Modifiers,
    MouseDown,
    MouseUp,
    MouseDrag,
    RightMouseDown,
    RightMouseUp,
    RightMouseDrag,
    WillScale,
    DidScale,
    Copy,
    CopyAsComponent,
    Cut,
    Paste,
    PasteSpecial,
    Delete,
    SelectAll,
    SelectAllAlternate,
    SelectAllControl,
    DeselectAll,
    Undo,
    SelectionChanged,
}

impl Activity {
    pub const ALL: [Self; 23] = [
        Self::KeyDown,
        Self::KeyUp,
        Self::Modifiers,
        Self::MouseDown,
        Self::MouseUp,
        Self::MouseDrag,
        Self::RightMouseDown,
        Self::RightMouseUp,
        Self::RightMouseDrag,
        Self::WillScale,
        Self::DidScale,
        Self::Copy,
        Self::CopyAsComponent,
        Self::Cut,
        Self::Paste,
        Self::PasteSpecial,
        Self::Delete,
        Self::SelectAll,
        Self::SelectAllAlternate,
        Self::SelectAllControl,
        Self::DeselectAll,
        Self::Undo,
        Self::SelectionChanged,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::KeyDown => "key-down",
            Self::KeyUp => "key-up",
            Self::Modifiers => "modifiers",
            Self::MouseDown => "mouse-down",
            Self::MouseUp => "mouse-up",
            Self::MouseDrag => "mouse-drag",
            Self::RightMouseDown => "right-mouse-down",
            Self::RightMouseUp => "right-mouse-up",
            Self::RightMouseDrag => "right-mouse-drag",
            Self::WillScale => "will-scale",
            Self::DidScale => "did-scale",
            Self::Copy => "copy",
            Self::CopyAsComponent => "copy-as-component",
            Self::Cut => "cut",
            Self::Paste => "paste",
            Self::PasteSpecial => "paste-special",
            Self::Delete => "delete",
            Self::SelectAll => "select-all",
            Self::SelectAllAlternate => "select-all-alternate",
            Self::SelectAllControl => "select-all-control",
            Self::DeselectAll => "deselect-all",
            Self::Undo => "undo",
            Self::SelectionChanged => "selection-changed",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown activity `{0}`")]
pub struct UnknownActivity(pub String);

impl FromStr for Activity {
    type Err = UnknownActivity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| UnknownActivity(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for activity in Activity::ALL {
            assert_eq!(activity.name().parse::<Activity>(), Ok(activity));
        }
    }

    #[test]
    fn test_serde_name_matches() {
        let json = serde_json::to_string(&Activity::CopyAsComponent).unwrap();
        assert_eq!(json, "\"copy-as-component\"");
    }

    #[test]
    fn test_unknown_activity() {
        assert_eq!(
            "scroll".parse::<Activity>(),
            Err(UnknownActivity("scroll".into()))
        );
    }
}
