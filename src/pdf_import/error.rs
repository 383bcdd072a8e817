//! Error types for statement extraction.

use thiserror::Error;

/// A captured value had the expected shape but could not be converted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("cannot parse number '{value}'")]
    Number { value: String },

    #[error("cannot parse date '{value}'")]
    Date { value: String },

    #[error("cannot parse time '{value}'")]
    Time { value: String },

    #[error("unknown currency '{value}'")]
    Currency { value: String },
}

/// Errors raised while building rule sets or running them against a document.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A required section found no matching line in its block.
    #[error("section [{attributes}] not found, expected line matching '{pattern}'")]
    SectionNotMatched { attributes: String, pattern: String },

    /// A section matched but one of its declared attributes was not captured.
    #[error("attribute '{0}' was not captured")]
    MissingAttribute(String),

    /// The document format was recognized but a value could not be converted.
    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The wrap step rejected an object that lacks mandatory fields.
    #[error("incomplete {kind}: {reason}")]
    Incomplete { kind: &'static str, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    pub fn incomplete(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Incomplete {
            kind,
            reason: reason.into(),
        }
    }

    /// Short machine readable category used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SectionNotMatched { .. } | Self::MissingAttribute(_) => "format",
            Self::Value(_) => "value",
            Self::InvalidPattern { .. } => "pattern",
            Self::Incomplete { .. } => "incomplete",
            Self::Io(_) => "io",
        }
    }

    /// True when the layout was recognized but its content could not be parsed.
    pub fn is_value_error(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_errors_are_distinguishable_from_mismatches() {
        let value: ExtractionError = ValueError::Number {
            value: "1,2,3".to_string(),
        }
        .into();
        let mismatch = ExtractionError::SectionNotMatched {
            attributes: "amount".to_string(),
            pattern: "^Ausmachender Betrag .*".to_string(),
        };

        assert!(value.is_value_error());
        assert_eq!(value.kind(), "value");
        assert!(!mismatch.is_value_error());
        assert_eq!(mismatch.kind(), "format");
    }

    #[test]
    fn test_messages() {
        let err = ExtractionError::SectionNotMatched {
            attributes: "date".to_string(),
            pattern: "^Ex-Tag (?<date>.*)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "section [date] not found, expected line matching '^Ex-Tag (?<date>.*)'"
        );
        assert_eq!(
            ExtractionError::from(ValueError::Date {
                value: "31.02.2021".to_string()
            })
            .to_string(),
            "cannot parse date '31.02.2021'"
        );
    }
}
