use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selectable ambient soundscape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundTheme {
    #[default]
    None,
    Rain,
    Ocean,
    Forest,
    Birds,
    Wind,
}

impl SoundTheme {
    pub const ALL: [SoundTheme; 6] = [
        SoundTheme::None,
        SoundTheme::Rain,
        SoundTheme::Ocean,
        SoundTheme::Forest,
        SoundTheme::Birds,
        SoundTheme::Wind,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoundTheme::None => "none",
            SoundTheme::Rain => "rain",
            SoundTheme::Ocean => "ocean",
            SoundTheme::Forest => "forest",
            SoundTheme::Birds => "birds",
            SoundTheme::Wind => "wind",
        }
    }

    pub fn is_silent(&self) -> bool {
        *self == SoundTheme::None
    }
}

impl fmt::Display for SoundTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SoundTheme::ALL
            .iter()
            .copied()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sound theme '{s}' (expected one of: none, rain, ocean, forest, birds, wind)"))
    }
}
