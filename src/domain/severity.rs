use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a log record.
///
/// Variants are declared in rank order so the derived `Ord` agrees with
/// [`SeverityLevel::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl SeverityLevel {
    pub const ALL: [SeverityLevel; 5] = [
        SeverityLevel::Debug,
        SeverityLevel::Info,
        SeverityLevel::Warn,
        SeverityLevel::Error,
        SeverityLevel::Fatal,
    ];

    pub fn rank(self) -> u8 {
        match self {
            SeverityLevel::Debug => 0,
            SeverityLevel::Info => 1,
            SeverityLevel::Warn => 2,
            SeverityLevel::Error => 3,
            SeverityLevel::Fatal => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityLevel::Debug => "debug",
            SeverityLevel::Info => "info",
            SeverityLevel::Warn => "warn",
            SeverityLevel::Error => "error",
            SeverityLevel::Fatal => "fatal",
        }
    }

    /// Parse an explicit severity field. Lowercased and trimmed first;
    /// anything outside the five known names yields `None`.
    pub fn from_explicit(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "debug" => Some(SeverityLevel::Debug),
            "info" => Some(SeverityLevel::Info),
            "warn" => Some(SeverityLevel::Warn),
            "error" => Some(SeverityLevel::Error),
            "fatal" => Some(SeverityLevel::Fatal),
            _ => None,
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSeverity(pub String);

impl fmt::Display for UnknownSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown severity '{}', expected one of: debug, info, warn, error, fatal",
            self.0
        )
    }
}

impl std::error::Error for UnknownSeverity {}

impl FromStr for SeverityLevel {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_explicit(s).ok_or_else(|| UnknownSeverity(s.to_string()))
    }
}
