//! Severity classification and content filtering.
//!
//! Both stages are total and side-effect free; the only fallible step is
//! building [`FilterSettings`], which happens once at startup.

pub mod classifier;
pub mod error;
pub mod patterns;
pub mod settings;

pub use classifier::{classify, classify_with, infer_from_text, strip_ansi, UNCLASSIFIED_SEVERITY};
pub use error::FilterError;
pub use settings::{FilterDecision, FilterSettings};
