//! Device category of a search impression.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of device categories reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Device {
    Desktop,
    Mobile,
    Tablet,
}

impl Device {
    pub const ALL: [Device; 3] = [Device::Desktop, Device::Mobile, Device::Tablet];

    /// Persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "DESKTOP",
            Self::Mobile => "MOBILE",
            Self::Tablet => "TABLET",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DESKTOP" => Ok(Self::Desktop),
            "MOBILE" => Ok(Self::Mobile),
            "TABLET" => Ok(Self::Tablet),
            other => Err(format!("unknown device category '{other}'")),
        }
    }
}
