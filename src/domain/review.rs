//! Review request domain types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Analysis mode selecting which prompt template is applied.
///
/// The set is fixed; anything else is rejected with an unknown-mode error
/// rather than silently falling back to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    Bugs,
    Improvements,
    Refactor,
    Performance,
    Security,
    Explain,
    Overview,
    Architecture,
}

impl ReviewMode {
    pub const ALL: [ReviewMode; 8] = [
        ReviewMode::Bugs,
        ReviewMode::Improvements,
        ReviewMode::Refactor,
        ReviewMode::Performance,
        ReviewMode::Security,
        ReviewMode::Explain,
        ReviewMode::Overview,
        ReviewMode::Architecture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bugs => "bugs",
            Self::Improvements => "improvements",
            Self::Refactor => "refactor",
            Self::Performance => "performance",
            Self::Security => "security",
            Self::Explain => "explain",
            Self::Overview => "overview",
            Self::Architecture => "architecture",
        }
    }
}

impl fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bugs" => Ok(Self::Bugs),
            "improvements" => Ok(Self::Improvements),
            "refactor" => Ok(Self::Refactor),
            "performance" => Ok(Self::Performance),
            "security" => Ok(Self::Security),
            "explain" => Ok(Self::Explain),
            "overview" => Ok(Self::Overview),
            "architecture" => Ok(Self::Architecture),
            other => Err(DomainError::unknown_mode(other)),
        }
    }
}

/// Where the code under review comes from. Exactly one source per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Pasted code snippet
    Pasted(String),
    /// One or more GitHub blob URLs
    Files(Vec<String>),
}

impl ContentSource {
    /// Build a source from the raw request fields, enforcing that exactly
    /// one of `code`, `url`, `urls` is present.
    pub fn from_fields(
        code: Option<String>,
        url: Option<String>,
        urls: Option<Vec<String>>,
    ) -> Result<Self, DomainError> {
        let code = code.filter(|c| !c.trim().is_empty());
        let url = url.filter(|u| !u.trim().is_empty());
        let urls = urls.filter(|list| !list.is_empty());

        match (code, url, urls) {
            (Some(code), None, None) => Ok(Self::Pasted(code)),
            (None, Some(url), None) => Ok(Self::Files(vec![url])),
            (None, None, Some(urls)) => {
                let cleaned: Vec<String> = urls
                    .into_iter()
                    .map(|u| u.trim().to_string())
                    .filter(|u| !u.is_empty())
                    .collect();
                if cleaned.is_empty() {
                    return Err(DomainError::validation("No valid URL(s) provided"));
                }
                Ok(Self::Files(cleaned))
            }
            (None, None, None) => Err(DomainError::validation(
                "Provide 'code' or 'url' (or 'urls' array)",
            )),
            _ => Err(DomainError::validation(
                "Provide exactly one of 'code', 'url', or 'urls'",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trip() {
        for mode in ReviewMode::ALL {
            assert_eq!(mode.as_str().parse::<ReviewMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_mode_rejects_unknown() {
        let err = "speed".parse::<ReviewMode>().unwrap_err();
        assert!(matches!(err, DomainError::UnknownMode { .. }));
        // Aliases from older clients are not normalized
        assert!("perf".parse::<ReviewMode>().is_err());
        assert!("vuln".parse::<ReviewMode>().is_err());
    }

    #[test]
    fn test_mode_is_case_insensitive() {
        assert_eq!("BUGS".parse::<ReviewMode>().unwrap(), ReviewMode::Bugs);
        assert_eq!(
            " Security ".parse::<ReviewMode>().unwrap(),
            ReviewMode::Security
        );
    }

    #[test]
    fn test_source_requires_exactly_one() {
        assert!(ContentSource::from_fields(None, None, None).is_err());

        let both = ContentSource::from_fields(
            Some("fn main() {}".into()),
            Some("https://github.com/a/b/blob/main/x.rs".into()),
            None,
        );
        assert!(both.is_err());
    }

    #[test]
    fn test_source_from_code() {
        let source = ContentSource::from_fields(Some("fn main() {}".into()), None, None).unwrap();
        assert_eq!(source, ContentSource::Pasted("fn main() {}".into()));
    }

    #[test]
    fn test_source_single_url_becomes_files() {
        let source = ContentSource::from_fields(
            None,
            Some("https://github.com/a/b/blob/main/x.rs".into()),
            None,
        )
        .unwrap();
        assert_eq!(
            source,
            ContentSource::Files(vec!["https://github.com/a/b/blob/main/x.rs".into()])
        );
    }

    #[test]
    fn test_source_urls_filters_blank_entries() {
        let source =
            ContentSource::from_fields(None, None, Some(vec!["  ".into(), "u1".into()])).unwrap();
        assert_eq!(source, ContentSource::Files(vec!["u1".into()]));

        let err = ContentSource::from_fields(None, None, Some(vec!["  ".into()]));
        assert!(err.is_err());
    }

    #[test]
    fn test_blank_code_is_missing() {
        assert!(ContentSource::from_fields(Some("   ".into()), None, None).is_err());
    }
}
