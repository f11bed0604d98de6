use super::classifier::{classify, strip_ansi};
use super::error::FilterError;
use super::patterns::SEVERITY_PATTERNS;
use crate::domain::{LogRecord, SeverityLevel};
use regex::Regex;

/// Outcome of running one record through the filter stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Keep,
    BelowMinSeverity,
    NotWhitelisted,
    Blacklisted,
}

impl FilterDecision {
    pub fn is_keep(self) -> bool {
        self == FilterDecision::Keep
    }
}

/// Minimum severity plus compiled whitelist/blacklist patterns.
///
/// Built once at startup and shared read-only between dispatchers.
#[derive(Debug, Clone)]
pub struct FilterSettings {
    min_severity: SeverityLevel,
    whitelist: Vec<Regex>,
    blacklist: Vec<Regex>,
}

impl FilterSettings {
    pub fn new<S: AsRef<str>>(
        min_severity: SeverityLevel,
        whitelist: &[S],
        blacklist: &[S],
    ) -> Result<Self, FilterError> {
        SEVERITY_PATTERNS.ensure_compiled()?;

        Ok(Self {
            min_severity,
            whitelist: compile_patterns("whitelist", whitelist)?,
            blacklist: compile_patterns("blacklist", blacklist)?,
        })
    }

    /// Settings that keep every record.
    pub fn permissive() -> Self {
        Self {
            min_severity: SeverityLevel::Debug,
            whitelist: Vec::new(),
            blacklist: Vec::new(),
        }
    }

    pub fn min_severity(&self) -> SeverityLevel {
        self.min_severity
    }

    pub fn whitelist_patterns(&self) -> Vec<&str> {
        self.whitelist.iter().map(Regex::as_str).collect()
    }

    pub fn blacklist_patterns(&self) -> Vec<&str> {
        self.blacklist.iter().map(Regex::as_str).collect()
    }

    /// Run the stages in order: threshold, whitelist, blacklist.
    pub fn evaluate(&self, severity: SeverityLevel, sanitized_message: &str) -> FilterDecision {
        if severity.rank() < self.min_severity.rank() {
            return FilterDecision::BelowMinSeverity;
        }

        if !self.whitelist.is_empty()
            && !self.whitelist.iter().any(|re| re.is_match(sanitized_message))
        {
            return FilterDecision::NotWhitelisted;
        }

        if self.blacklist.iter().any(|re| re.is_match(sanitized_message)) {
            return FilterDecision::Blacklisted;
        }

        FilterDecision::Keep
    }

    pub fn keeps(&self, severity: SeverityLevel, sanitized_message: &str) -> bool {
        self.evaluate(severity, sanitized_message).is_keep()
    }

    /// Classify and evaluate a deploy record.
    pub fn evaluate_record(&self, record: &LogRecord) -> (SeverityLevel, FilterDecision) {
        let severity = classify(&record.message, &record.severity);
        let decision = self.evaluate(severity, &strip_ansi(&record.message));
        (severity, decision)
    }

    /// Keep only the records that pass every stage, preserving order.
    pub fn retain(&self, records: Vec<LogRecord>) -> Vec<LogRecord> {
        records
            .into_iter()
            .filter(|record| self.evaluate_record(record).1.is_keep())
            .collect()
    }
}

fn compile_patterns<S: AsRef<str>>(
    list: &'static str,
    patterns: &[S],
) -> Result<Vec<Regex>, FilterError> {
    patterns
        .iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
                list,
                pattern: pattern.to_string(),
                source,
            })
        })
        .collect()
}
