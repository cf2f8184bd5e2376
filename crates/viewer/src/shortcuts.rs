//! Single-key shortcuts.

use crate::modes::ViewMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
    FitView,
    TopView,
    FrontView,
    ToggleGrid,
    Mode(ViewMode),
}

impl Shortcut {
    /// Case-insensitive mapping of a typed character.
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c.to_ascii_lowercase() {
            'f' => Shortcut::FitView,
            't' => Shortcut::TopView,
            'y' => Shortcut::FrontView,
            'g' => Shortcut::ToggleGrid,
            '1' => Shortcut::Mode(ViewMode::Textured),
            '2' => Shortcut::Mode(ViewMode::Wireframe),
            '3' => Shortcut::Mode(ViewMode::Solid),
            _ => return None,
        })
    }

    /// Text for the help hint.
    pub fn key(self) -> &'static str {
        match self {
            Shortcut::FitView => "F",
            Shortcut::TopView => "T",
            Shortcut::FrontView => "Y",
            Shortcut::ToggleGrid => "G",
            Shortcut::Mode(ViewMode::Textured) => "1",
            Shortcut::Mode(ViewMode::Wireframe) => "2",
            Shortcut::Mode(ViewMode::Solid) => "3",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_keys_in_any_case() {
        assert_eq!(Shortcut::from_char('F'), Some(Shortcut::FitView));
        assert_eq!(Shortcut::from_char('t'), Some(Shortcut::TopView));
        assert_eq!(Shortcut::from_char('Y'), Some(Shortcut::FrontView));
        assert_eq!(Shortcut::from_char('g'), Some(Shortcut::ToggleGrid));
        assert_eq!(Shortcut::from_char('2'), Some(Shortcut::Mode(ViewMode::Wireframe)));
        assert_eq!(Shortcut::from_char('x'), None);
        assert_eq!(Shortcut::from_char('4'), None);
    }
}
