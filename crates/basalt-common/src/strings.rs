//! ASCII character predicates.
//!
//! The predicates are deliberately ASCII-only; bytes at or above 0x80
//! are classified by none of them. Escape sequence expansion lives in
//! the lexer's string literal module, next to the diagnostics it emits.

/// `[a-zA-Z]`
pub fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

/// `[0-9]`
pub fn is_decimal_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

/// `[a-zA-Z0-9]`
pub fn is_alnum(c: u8) -> bool {
    c.is_ascii_alphanumeric()
}

/// `[0-9A-F]`; lower-case `a`..`f` are not hex digits in any context.
pub fn is_upper_hex_digit(c: u8) -> bool {
    c.is_ascii_digit() || (b'A'..=b'F').contains(&c)
}

/// `[a-z]`
pub fn is_lower(c: u8) -> bool {
    c.is_ascii_lowercase()
}

pub fn is_horizontal_whitespace(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

// Does not treat '\r' as vertical whitespace.
pub fn is_vertical_whitespace(c: u8) -> bool {
    c == b'\n'
}

pub fn is_space(c: u8) -> bool {
    is_horizontal_whitespace(c) || is_vertical_whitespace(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_are_ascii_only() {
        assert!(is_alpha(b'a'));
        assert!(is_alpha(b'Z'));
        assert!(!is_alpha(0xC3));
        assert!(is_decimal_digit(b'7'));
        assert!(!is_decimal_digit(b'a'));
        assert!(is_alnum(b'x'));
        assert!(is_alnum(b'5'));
        assert!(!is_alnum(b'_'));
        assert!(is_upper_hex_digit(b'F'));
        assert!(!is_upper_hex_digit(b'f'));
        assert!(is_lower(b'q'));
        assert!(!is_lower(b'Q'));
        assert!(is_horizontal_whitespace(b'\t'));
        assert!(!is_horizontal_whitespace(b'\n'));
        assert!(is_vertical_whitespace(b'\n'));
        assert!(!is_vertical_whitespace(b'\r'));
        assert!(is_space(b' '));
        assert!(!is_space(b'a'));
    }
}
