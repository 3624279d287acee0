//! Daily shifts (turnos) used by trial reservations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BookingError;

/// One of the two daily time windows, each with its own capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Morning,
    Afternoon,
}

impl Shift {
    /// Both shifts, in calendar order.
    pub const ALL: [Shift; 2] = [Shift::Morning, Shift::Afternoon];

    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Morning => "morning",
            Shift::Afternoon => "afternoon",
        }
    }

    /// The label the shop uses on its booking forms.
    pub fn label(&self) -> &'static str {
        match self {
            Shift::Morning => "manhã",
            Shift::Afternoon => "tarde",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shift {
    type Err = BookingError;

    /// Accepts the canonical names and the shop's Portuguese labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" | "manhã" | "manha" => Ok(Shift::Morning),
            "afternoon" | "tarde" => Ok(Shift::Afternoon),
            other => Err(BookingError::validation(format!(
                "unknown shift '{other}' (expected morning or afternoon)"
            ))),
        }
    }
}
