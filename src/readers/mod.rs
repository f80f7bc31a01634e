use crate::domain::RawRecord;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

pub mod json_dump;
pub mod message_export;
pub mod sheet;

pub use json_dump::JsonDumpReader;
pub use message_export::MessageExportReader;
pub use sheet::SheetReader;

/// Core trait all source adapters implement.
///
/// An adapter is responsible only for shape translation, never validation:
/// implausible numbers pass through untouched and are judged later by the
/// extractor's validators. A malformed record is skipped with a logged
/// reason; an unreadable file is a `SourceUnreadable` error for this source
/// only and must not abort sibling sources.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Unique identifier for this source shape
    fn source_name(&self) -> &'static str;

    /// Read the batch file into an ordered sequence of raw records
    async fn read(&self, path: &Path) -> Result<Vec<RawRecord>>;
}

/// Wrap a file-level I/O failure into the per-source fatal error.
pub(crate) fn unreadable(source: &str, path: &Path, err: impl std::fmt::Display) -> crate::error::PipelineError {
    crate::error::PipelineError::SourceUnreadable {
        source_name: source.to_string(),
        message: format!("{}: {}", path.display(), err),
    }
}

/// Tolerant numeric parsing shared by the structured readers: accepts
/// regular/thin/no-break spaces as thousands separators and a comma as the
/// decimal separator. Returns None for empty or non-numeric cells.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00a0}' && *c != '\u{202f}')
        .map(|c| if c == ',' { '.' } else { c })
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number("5 200 000"), Some(5_200_000.0));
        assert_eq!(parse_number("12,5"), Some(12.5));
        assert_eq!(parse_number("178\u{00a0}571"), Some(178_571.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
    }
}
