//! Structured error types.
//!
//! Only genuinely unrecoverable conditions surface as `Err` in the core;
//! everything else degrades and lands in the per-run
//! [`Diagnostics`](crate::Diagnostics) collector.

use thiserror::Error;

/// Errors raised by the folio pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum FolioError {
    /// A stylesheet rule could not be parsed. Carries the offending source
    /// slice so the host can point at it. Recoverable: the parser skips
    /// the rule and continues the stylesheet scan.
    #[error("CSS parse error in `{slice}`: {reason}")]
    CssParse {
        /// The offending source slice.
        slice: String,
        /// Why it failed.
        reason: String,
    },

    /// The buffered stylesheet source exceeded its byte budget.
    #[error("stylesheet source exceeds capacity of {capacity} bytes")]
    CapacityExceeded {
        /// The configured byte budget.
        capacity: usize,
    },

    /// A frame or cell resolved to non-positive dimensions. Non-fatal for
    /// layout (the engine renders anyway) but reported to hosts that ask.
    #[error("non-positive geometry: {width}x{height} for {context}")]
    DegenerateGeometry {
        /// Resolved width in points.
        width: f64,
        /// Resolved height in points.
        height: f64,
        /// What was being sized.
        context: String,
    },
}

impl FolioError {
    /// Build a [`FolioError::CssParse`], truncating long source slices.
    #[must_use]
    pub fn css_parse(slice: &str, reason: &str) -> Self {
        const MAX_SLICE: usize = 120;
        let mut slice = slice.to_string();
        if slice.len() > MAX_SLICE {
            let cut = slice
                .char_indices()
                .take_while(|(i, _)| *i < MAX_SLICE)
                .last()
                .map_or(0, |(i, c)| i + c.len_utf8());
            slice.truncate(cut);
            slice.push('…');
        }
        Self::CssParse {
            slice,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_parse_truncates_slice() {
        let long = "x".repeat(400);
        let err = FolioError::css_parse(&long, "bad rule");
        if let FolioError::CssParse { slice, .. } = err {
            assert!(slice.chars().count() <= 121);
            assert!(slice.ends_with('…'));
        } else {
            panic!("expected CssParse");
        }
    }

    #[test]
    fn test_display_carries_reason() {
        let err = FolioError::css_parse("@page {", "unterminated block");
        assert!(err.to_string().contains("unterminated block"));
    }
}
