//! Enum types for Aula entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle flag carried by every administrative record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RecordStatus {
    #[default]
    #[serde(rename = "activo")]
    Active,
    #[serde(rename = "inactivo")]
    Inactive,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "activo",
            RecordStatus::Inactive => "inactivo",
        }
    }

    /// The other state; used by status-toggle screens.
    pub fn toggled(&self) -> Self {
        match self {
            RecordStatus::Active => RecordStatus::Inactive,
            RecordStatus::Inactive => RecordStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RecordStatus::Active)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "activo" | "active" => Ok(RecordStatus::Active),
            "inactivo" | "inactive" => Ok(RecordStatus::Inactive),
            other => Err(format!("unknown record status: {}", other)),
        }
    }
}

/// School shift a classroom is scheduled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    #[serde(rename = "mañana")]
    Morning,
    #[serde(rename = "tarde")]
    Afternoon,
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shift::Morning => f.write_str("mañana"),
            Shift::Afternoon => f.write_str("tarde"),
        }
    }
}

impl FromStr for Shift {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mañana" | "manana" | "morning" => Ok(Shift::Morning),
            "tarde" | "afternoon" => Ok(Shift::Afternoon),
            other => Err(format!("unknown shift: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_status_serde_uses_backend_names() {
        let json = serde_json::to_string(&RecordStatus::Inactive).unwrap();
        assert_eq!(json, "\"inactivo\"");
        let parsed: RecordStatus = serde_json::from_str("\"activo\"").unwrap();
        assert_eq!(parsed, RecordStatus::Active);
    }

    #[test]
    fn test_record_status_toggle_and_parse() {
        assert_eq!(RecordStatus::Active.toggled(), RecordStatus::Inactive);
        assert_eq!(RecordStatus::Inactive.toggled(), RecordStatus::Active);
        assert_eq!("ACTIVO".parse::<RecordStatus>(), Ok(RecordStatus::Active));
        assert!("archived".parse::<RecordStatus>().is_err());
    }

    #[test]
    fn test_shift_parses_display_form() {
        for shift in [Shift::Morning, Shift::Afternoon] {
            assert_eq!(shift.to_string().parse::<Shift>(), Ok(shift));
        }
        assert_eq!("Manana".parse::<Shift>(), Ok(Shift::Morning));
        assert!("noche".parse::<Shift>().is_err());
    }
}
