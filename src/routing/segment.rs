//! Path segment patterns.
//!
//! # Responsibilities
//! - Parse raw pattern strings ("contacts/:id") into segment lists
//! - Distinguish literal segments from dynamic `:name` segments
//! - Normalize request paths into segment slices
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Empty segments are collapsed ("//contacts/" == "/contacts")
//! - No regex: every pattern is a flat list of typed segments

use crate::routing::tree::ConfigurationError;

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentPattern {
    /// Requires an exact, case-sensitive match.
    Literal(String),
    /// Matches any non-empty segment and binds it under the given name.
    Param(String),
}

impl SegmentPattern {
    /// Render the segment back into pattern syntax.
    pub fn as_pattern(&self) -> String {
        match self {
            SegmentPattern::Literal(s) => s.clone(),
            SegmentPattern::Param(name) => format!(":{name}"),
        }
    }
}

/// Parse a raw pattern string into its segments.
///
/// The pattern must contain at least one segment once slashes are
/// normalized away; index and pathless routes are represented at the
/// node level, not as empty patterns.
pub fn parse_pattern(raw: &str) -> Result<Vec<SegmentPattern>, ConfigurationError> {
    let mut segments = Vec::new();
    for part in raw.split('/').filter(|p| !p.is_empty()) {
        if let Some(name) = part.strip_prefix(':') {
            if name.is_empty() {
                return Err(ConfigurationError::InvalidSegment {
                    pattern: raw.to_string(),
                    segment: part.to_string(),
                });
            }
            segments.push(SegmentPattern::Param(name.to_string()));
        } else {
            segments.push(SegmentPattern::Literal(part.to_string()));
        }
    }
    if segments.is_empty() {
        return Err(ConfigurationError::EmptyPattern {
            pattern: raw.to_string(),
        });
    }
    Ok(segments)
}

/// Split a request path into normalized segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|p| !p.is_empty()).collect()
}
