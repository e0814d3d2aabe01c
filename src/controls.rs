use minifb::Key;

/// Keyboard commands accepted while presenting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    ToggleSpotlight,
    ToggleHardwareDim,
    RadiusUp,
    RadiusDown,
    /// Lighter background.
    DimDown,
    /// Darker background.
    DimUp,
}

impl Command {
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Q | Key::Escape => Some(Command::Quit),
            Key::S => Some(Command::ToggleSpotlight),
            Key::H => Some(Command::ToggleHardwareDim),
            Key::Equal | Key::NumPadPlus => Some(Command::RadiusUp),
            Key::Minus | Key::NumPadMinus => Some(Command::RadiusDown),
            Key::LeftBracket => Some(Command::DimDown),
            Key::RightBracket => Some(Command::DimUp),
            _ => None,
        }
    }
}

pub const HELP: &[(&str, &str)] = &[
    ("Thumb + Index (raised)", "Previous slide"),
    ("Thumb + Middle (raised)", "Next slide"),
    ("Thumb + Ring (raised)", "Toggle spotlight"),
    ("Index finger", "Draw"),
    ("Index + Middle", "Pointer"),
    ("Index + Middle + Ring", "Erase last stroke"),
    ("s", "Toggle spotlight"),
    ("h", "Toggle hardware brightness"),
    ("+", "Increase spotlight radius"),
    ("-", "Decrease spotlight radius"),
    ("[", "Lighter background"),
    ("]", "Darker background"),
    ("q / Esc", "Quit"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(Command::from_key(Key::Q), Some(Command::Quit));
        assert_eq!(Command::from_key(Key::Escape), Some(Command::Quit));
        assert_eq!(Command::from_key(Key::Equal), Some(Command::RadiusUp));
        assert_eq!(Command::from_key(Key::Minus), Some(Command::RadiusDown));
        assert_eq!(Command::from_key(Key::LeftBracket), Some(Command::DimDown));
        assert_eq!(Command::from_key(Key::RightBracket), Some(Command::DimUp));
        assert_eq!(Command::from_key(Key::A), None);
    }
}
