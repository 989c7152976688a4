//! Keeps player input on one log line.
//!
//! Whatever the player types is logged at debug level and quoted in warnings
//! for failed commands; control characters and very long lines would
//! otherwise break the log file apart.

use std::fmt::Write;

/// Longest input echoed into a log line, in characters.
pub const MAX_LOGGED_INPUT: usize = 160;

/// Escape `s` for single-line logging.
///
/// Backslash, `\n`, `\r` and `\t` are escaped as in Rust string literals,
/// other control characters become `\xNN`. Input longer than
/// [`MAX_LOGGED_INPUT`] characters is cut and ends in `…`.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_LOGGED_INPUT) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count == MAX_LOGGED_INPUT {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
