//! Inline vector literals for CQL `ANN OF [...]` clauses.
//!
//! Every element is rendered with exactly eight decimals through Rust's
//! formatter, which never consults the process locale, so the same vector
//! always yields byte-identical query text.

use crate::error::{VideoError, VideoResult};

/// Fixed number of decimals per element.
pub const LITERAL_PRECISION: usize = 8;

/// Render `values` as `v1,v2,...` (no brackets, no spaces).
///
/// Non-finite values have no CQL literal form and are rejected.
///
/// ```
/// use domain_videos::literal::format_vector_literal;
///
/// assert_eq!(format_vector_literal(&[1.0, -0.5]).unwrap(), "1.00000000,-0.50000000");
/// ```
pub fn format_vector_literal(values: &[f32]) -> VideoResult<String> {
    let mut out = String::with_capacity(values.len() * (LITERAL_PRECISION + 4));
    for (i, v) in values.iter().enumerate() {
        if !v.is_finite() {
            return Err(VideoError::Validation(format!(
                "embedding element {} is not finite: {}",
                i, v
            )));
        }
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!("{:.*}", LITERAL_PRECISION, v));
    }
    Ok(out)
}

/// Parse a literal produced by [`format_vector_literal`]. Surrounding
/// brackets and whitespace around elements are tolerated.
pub fn parse_vector_literal(literal: &str) -> VideoResult<Vec<f32>> {
    let inner = literal
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();

    if inner.is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<f32>()
                .map_err(|e| VideoError::Validation(format!("invalid vector element {:?}: {}", s, e)))
        })
        .collect()
}
