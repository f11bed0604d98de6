use super::ConfigError;
use regex::Regex;
use std::sync::OnceLock;

/// Parse `Key:Value` pairs. The value may itself contain colons.
pub fn parse_additional_headers<S: AsRef<str>>(
    entries: &[S],
) -> Result<Vec<(String, String)>, ConfigError> {
    entries
        .iter()
        .map(AsRef::as_ref)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, value) = entry.split_once(':').ok_or_else(|| {
                ConfigError::InvalidHeader(format!("'{entry}' is not in Key:Value form"))
            })?;

            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::InvalidHeader(format!(
                    "'{entry}' has an empty header name"
                )));
            }

            Ok((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn scheme_regex() -> Option<&'static Regex> {
    static SCHEME: OnceLock<Option<Regex>> = OnceLock::new();
    SCHEME
        .get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").ok())
        .as_ref()
}

pub fn has_scheme(url: &str) -> bool {
    scheme_regex().is_some_and(|regex| regex.is_match(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers() {
        let headers = parse_additional_headers(&[
            "Authorization: Bearer abc",
            " X-Url:https://example.com ",
            "",
        ])
        .unwrap();
        assert_eq!(
            headers,
            vec![
                ("Authorization".to_string(), "Bearer abc".to_string()),
                ("X-Url".to_string(), "https://example.com".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_headers_rejects_missing_colon() {
        assert!(matches!(
            parse_additional_headers(&["Authorization"]),
            Err(ConfigError::InvalidHeader(_))
        ));
        assert!(parse_additional_headers(&[":value"]).is_err());
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://logs.example.com"));
        assert!(has_scheme("http+unix://socket"));
        assert!(!has_scheme("logs.example.com/ingest"));
    }
}
