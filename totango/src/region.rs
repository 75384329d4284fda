use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

/// Pixel endpoint used when no region is configured.
pub const LEGACY_ENDPOINT: &str = "https://sdr.totango.com/pixel.gif/";

/// Deployment zones served by a dedicated, authenticated pixel endpoint.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Region {
    US,
    EU,
}

impl Region {
    /// The pixel endpoint events for this region are posted to.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Region::US => "https://api.totango.com/pixel.gif/",
            Region::EU => "https://api-eu1.totango.com/pixel.gif/",
        }
    }
}

/// Allow casting `Region` from strings, ignoring case.
impl FromStr for Region {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_ref() {
            "US" => Ok(Region::US),
            "EU" => Ok(Region::EU),
            invalid => Err(ClientError::InvalidRegion(invalid.to_owned())),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Region::US => write!(f, "US"),
            Region::EU => write!(f, "EU"),
        }
    }
}
