//! Identifier mangling.
//!
//! Every user identifier gains a trailing underscore so it can never
//! clash with a target-language keyword; characters outside
//! `[0-9A-Za-z_]` are base-32 encoded over the alphabet `[a-z0-5]`.
//! Operators the target language supports natively pass through a fixed
//! table; everything else mangles through the same encoder.

/// Translates a 5-bit value to its base-32 character (`[a-z0-5]`).
const fn encode32_char(c: u8) -> u8 {
    if c < 26 { b'a' + c } else { b'0' + (c - 26) }
}

/// Translates a base-32 character back to its 5-bit value.
const fn decode32_char(c: u8) -> u8 {
    if c >= b'a' { c - b'a' } else { c - b'0' + 26 }
}

/// Encodes a string of ASCII 0-127 in base 32.
#[must_use]
pub fn encode32(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(bytes.len().div_ceil(5) * 8);

    for chunk in bytes.chunks(5) {
        // Pack up to five 7-bit codes into a 35-bit group, then emit it
        // as seven 5-bit digits.
        let mut group: u64 = 0;
        for i in 0..5 {
            let code = chunk.get(i).copied().unwrap_or(0) & 0x7f;
            group |= u64::from(code) << (7 * (4 - i));
        }
        for i in 0..7 {
            let digit = ((group >> (5 * (6 - i))) & 0x1f) as u8;
            out.push(encode32_char(digit) as char);
        }
    }
    out
}

/// Decodes a base-32 string back to ASCII.
#[must_use]
pub fn decode32(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(bytes.len() / 7 * 5);

    for chunk in bytes.chunks(7) {
        let mut group: u64 = 0;
        for i in 0..7 {
            let digit = chunk.get(i).copied().map_or(0, decode32_char);
            group |= u64::from(digit & 0x1f) << (5 * (6 - i));
        }
        for i in 0..5 {
            let code = ((group >> (7 * (4 - i))) & 0x7f) as u8;
            if code != 0 {
                out.push(code as char);
            }
        }
    }
    out
}

/// Is the character in the class `[0-9A-Za-z_]`?
#[must_use]
pub const fn is_simple(c: char) -> bool { c.is_ascii_alphanumeric() || c == '_' }

/// Does this operator exist in the target language?
#[must_use]
pub fn is_translatable(op: &str) -> bool {
    matches!(
        op,
        "+" | "-" | "*" | "/" | "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" | "!"
    )
}

/// Generates a target-language identifier: the original name with any
/// characters outside `[0-9A-Za-z_]` base-32 encoded, and an underscore
/// appended to avoid clashes with target-language keywords.
#[must_use]
pub fn internalise(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    let mut pending = String::new();

    for c in name.chars() {
        if is_simple(c) {
            if !pending.is_empty() {
                out.push_str(&encode32(&pending));
                pending.clear();
            }
            out.push(c);
        } else {
            pending.push(c);
        }
    }
    if !pending.is_empty() {
        out.push_str(&encode32(&pending));
    }

    out.push('_');
    out
}

/// Escapes special characters for a target-language string literal.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        for input in ["", "+", "<=", "(Real, Real)", "Box<Integer>"] {
            assert_eq!(decode32(&encode32(input)), input, "round trip of {input:?}");
        }
    }

    #[test]
    fn encoded_text_is_identifier_safe() {
        let encoded = encode32("(Real, Real) -> Real");
        assert!(encoded.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn internalise_appends_underscore() {
        assert_eq!(internalise("f"), "f_");
        assert_eq!(internalise("observe"), "observe_");
    }

    #[test]
    fn internalise_encodes_non_simple_characters() {
        let mangled = internalise("f'");
        assert!(mangled.starts_with('f'));
        assert!(mangled.ends_with('_'));
        assert!(mangled.chars().all(|c| is_simple(c)));
    }

    #[test]
    fn operator_table_matches_target_language() {
        assert!(is_translatable("+"));
        assert!(is_translatable("<="));
        assert!(!is_translatable("<-"));
        assert!(!is_translatable("~>"));
    }

    #[test]
    fn escape_handles_quotes_and_newlines() {
        assert_eq!(escape("a\"b\nc"), "a\\\"b\\nc");
    }
}
