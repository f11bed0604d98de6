// Static regex pattern management for severity inference
use super::error::FilterError;
use regex::Regex;
use std::sync::OnceLock;

/// Named regex patterns compiled once on first use
pub struct StaticRegexSet {
    patterns: &'static [(&'static str, &'static str)], // (pattern, name)
    compiled: OnceLock<Result<Vec<Regex>, FilterError>>,
}

impl StaticRegexSet {
    pub const fn new(patterns: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            patterns,
            compiled: OnceLock::new(),
        }
    }

    fn compiled(&self) -> Result<&[Regex], FilterError> {
        let compiled = self.compiled.get_or_init(|| {
            let mut regexes = Vec::with_capacity(self.patterns.len());

            for (pattern, name) in self.patterns {
                match Regex::new(pattern) {
                    Ok(regex) => regexes.push(regex),
                    Err(e) => {
                        return Err(FilterError::InvalidPattern {
                            list: "builtin",
                            pattern: format!("{name}: {pattern}"),
                            source: e,
                        });
                    }
                }
            }

            Ok(regexes)
        });

        match compiled {
            Ok(regexes) => Ok(regexes.as_slice()),
            Err(e) => Err(e.clone()),
        }
    }

    pub fn get_by_name(&self, name: &str) -> Result<&Regex, FilterError> {
        let index = self
            .patterns
            .iter()
            .position(|(_, pattern_name)| *pattern_name == name)
            .ok_or(FilterError::PatternNotFound {
                name: name.to_string(),
            })?;

        let compiled = self.compiled()?;
        compiled.get(index).ok_or(FilterError::PatternNotFound {
            name: name.to_string(),
        })
    }

    /// Compile every pattern, surfacing the first failure. Checked when
    /// filter settings are built.
    pub fn ensure_compiled(&self) -> Result<(), FilterError> {
        self.compiled().map(|_| ())
    }
}

pub const ANSI_SGR: &str = "ansi_sgr";
pub const ERROR_TOKENS: &str = "error_tokens";
pub const WARN_TOKENS: &str = "warn_tokens";
pub const INFO_TOKENS: &str = "info_tokens";
pub const DEBUG_TOKENS: &str = "debug_tokens";

pub static SEVERITY_PATTERNS: StaticRegexSet = StaticRegexSet::new(&[
    (r"\x1b\[[0-9;]*m", ANSI_SGR),
    (r"(?i)\b(?:ERR|ERROR|FATAL|PANIC)\b", ERROR_TOKENS),
    (r"(?i)\b(?:WRN|WARN|WARNING)\b", WARN_TOKENS),
    (r"(?i)\b(?:INF|INFO)\b", INFO_TOKENS),
    (r"(?i)\b(?:DBG|DEBUG)\b", DEBUG_TOKENS),
]);
