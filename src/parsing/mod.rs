pub mod legacy;
pub mod structured;

use log::debug;
use serde_json::error::Category;
use std::fmt;

use structured::ChartRoot;

/// Output of the format dispatcher. Both variants carry the same normalized
/// root; the legacy variant additionally carries the raw-token checksum
/// source accumulated while parsing, which replaces the canonical field
/// string for fingerprinting.
#[derive(Debug, Clone)]
pub enum ParsedChart {
    Structured(ChartRoot),
    Legacy {
        root: ChartRoot,
        checksum_source: String,
    },
}

/// Parses chart text, trying the structured encoding first and falling back
/// to the legacy line-record encoding when the text is not a structured
/// chart (syntax, premature-EOF, and schema mismatches all indicate that;
/// an I/O-layer failure does not and propagates as fatal).
pub fn parse(text: &str) -> Result<ParsedChart, ParseError> {
    match serde_json::from_str::<ChartRoot>(text) {
        Ok(root) => {
            debug!(
                "parsed structured chart: {} notes, {} pages, {} tempo changes",
                root.note_list.len(),
                root.page_list.len(),
                root.tempo_list.len()
            );
            Ok(ParsedChart::Structured(root))
        }
        Err(err) => match err.classify() {
            Category::Syntax | Category::Eof | Category::Data => {
                debug!("structured parse failed ({}), trying legacy format", err);
                let (root, checksum_source) = legacy::convert(text)?;
                Ok(ParsedChart::Legacy {
                    root,
                    checksum_source,
                })
            }
            Category::Io => Err(ParseError::Structured(err)),
        },
    }
}

#[derive(Debug)]
pub enum ParseError {
    Structured(serde_json::Error),
    InvalidRecord { line: usize, reason: String },
    InvalidPageSize { value: f64 },
    DuplicateNote { line: usize, id: i64 },
    UndefinedLink { line: usize, id: i64 },
    EmptyLink { line: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Structured(err) => write!(f, "structured chart parse failed: {}", err),
            ParseError::InvalidRecord { line, reason } => {
                write!(f, "invalid record on line {}: {}", line, reason)
            }
            ParseError::InvalidPageSize { value } => {
                write!(f, "PAGE_SIZE must be positive, got {}", value)
            }
            ParseError::DuplicateNote { line, id } => {
                write!(f, "duplicate NOTE id {} on line {}", id, line)
            }
            ParseError::UndefinedLink { line, id } => {
                write!(f, "LINK on line {} references undefined note id {}", line, id)
            }
            ParseError::EmptyLink { line } => {
                write!(f, "LINK on line {} contains no note ids", line)
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Structured(err) => Some(err),
            _ => None,
        }
    }
}
