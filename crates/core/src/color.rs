//! Overlay color parsing.
//!
//! Overlay colors are stored as `#rrggbb` strings (the form the design
//! toolbar emits); the export compositor needs them as raw channels.

use crate::error::CoreError;

/// Parse a `#rrggbb` color string into `[r, g, b]` channels.
///
/// Shorthand (`#fff`) and alpha forms are rejected.
pub fn parse_hex_color(s: &str) -> Result<[u8; 3], CoreError> {
    let hex = s
        .strip_prefix('#')
        .ok_or_else(|| CoreError::Validation(format!("Invalid color '{s}': must start with '#'")))?;
    if hex.len() != 6 {
        return Err(CoreError::Validation(format!(
            "Invalid color '{s}': expected #rrggbb"
        )));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map_err(|_| CoreError::Validation(format!("Invalid color '{s}': bad hex digit")))
    };
    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}
