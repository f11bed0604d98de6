//! Severity classification for log records.
//!
//! An explicit severity field always wins when it names a known level.
//! Otherwise the message text is scanned for whole-word level tokens after
//! ANSI colour codes are removed. Text carrying no recognisable token is
//! classified as [`UNCLASSIFIED_SEVERITY`], which is `error`: a minimum
//! severity threshold can therefore never silently discard a line whose
//! level could not be determined.

use super::patterns::{
    ANSI_SGR, DEBUG_TOKENS, ERROR_TOKENS, INFO_TOKENS, SEVERITY_PATTERNS, WARN_TOKENS,
};
use crate::domain::SeverityLevel;
use std::borrow::Cow;

/// Severity assigned when neither the explicit field nor the text decide.
pub const UNCLASSIFIED_SEVERITY: SeverityLevel = SeverityLevel::Error;

/// Text-based inference policy, consulted only without a usable explicit level.
pub type SeverityInference = fn(&str) -> SeverityLevel;

// Checked in order; the first match wins.
const TOKEN_PRIORITY: [(&str, SeverityLevel); 4] = [
    (ERROR_TOKENS, SeverityLevel::Error),
    (WARN_TOKENS, SeverityLevel::Warn),
    (INFO_TOKENS, SeverityLevel::Info),
    (DEBUG_TOKENS, SeverityLevel::Debug),
];

/// Remove ANSI SGR sequences (`ESC [ <params> m`) from `message`.
pub fn strip_ansi(message: &str) -> Cow<'_, str> {
    if !message.contains('\x1b') {
        return Cow::Borrowed(message);
    }

    match SEVERITY_PATTERNS.get_by_name(ANSI_SGR) {
        Ok(regex) => regex.replace_all(message, ""),
        Err(_) => Cow::Borrowed(message),
    }
}

/// Keyword heuristic over already-sanitised text.
pub fn infer_from_text(sanitized: &str) -> SeverityLevel {
    for (name, level) in TOKEN_PRIORITY {
        if let Ok(regex) = SEVERITY_PATTERNS.get_by_name(name)
            && regex.is_match(sanitized)
        {
            return level;
        }
    }

    UNCLASSIFIED_SEVERITY
}

/// Classify with the default keyword heuristic.
pub fn classify(message: &str, explicit: &str) -> SeverityLevel {
    classify_with(message, explicit, infer_from_text)
}

pub fn classify_with(message: &str, explicit: &str, infer: SeverityInference) -> SeverityLevel {
    if let Some(level) = SeverityLevel::from_explicit(explicit) {
        return level;
    }

    infer(&strip_ansi(message))
}
