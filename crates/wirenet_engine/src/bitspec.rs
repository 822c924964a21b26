//! Parsing of the per-bit net specification carried by bit-labeled tunnels.
//!
//! A bit spec is a comma-separated list with one token per bit, bit 0 first.
//! Each token is a literal `0`/`1`, the don't-care `x`, or a net label such
//! as `N7`. Specs shorter than the tunnel's width are padded with `x` and
//! longer ones are truncated.

/// One classified bit-spec token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BitToken {
    /// Literal constant 0.
    Zero,
    /// Literal constant 1.
    One,
    /// Floating bit, left unconstrained.
    DontCare,
    /// A named net; the string is the normalized label.
    Net(String),
}

impl BitToken {
    /// Classifies a raw token after normalizing it.
    ///
    /// Empty tokens (as in `"1,,0"`) are don't-care.
    pub fn parse(raw: &str) -> Self {
        let normalized = normalize_token(raw);
        match normalized.as_str() {
            "0" => BitToken::Zero,
            "1" => BitToken::One,
            "x" | "" => BitToken::DontCare,
            _ => BitToken::Net(normalized),
        }
    }
}

/// Normalizes a raw bit-spec token.
///
/// Whitespace is trimmed, `x`/`X` becomes `x`, and `N<digits>` with either
/// case of `N` becomes `N<int>` with leading zeros dropped (`n007` → `N7`).
/// Anything else is returned trimmed.
pub fn normalize_token(raw: &str) -> String {
    let token = raw.trim();
    if token.eq_ignore_ascii_case("x") {
        return "x".to_string();
    }
    if let Some(digits) = token.strip_prefix(['N', 'n']) {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            let int = digits.trim_start_matches('0');
            return format!("N{}", if int.is_empty() { "0" } else { int });
        }
    }
    token.to_string()
}

/// Splits a bit spec into exactly `width` classified tokens.
pub fn parse_bit_spec(spec: &str, width: u32) -> Vec<BitToken> {
    let mut tokens: Vec<BitToken> = spec
        .split(',')
        .take(width as usize)
        .map(BitToken::parse)
        .collect();
    tokens.resize(width as usize, BitToken::DontCare);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_literals_pass_through() {
        assert_eq!(normalize_token("0"), "0");
        assert_eq!(normalize_token(" 1 "), "1");
    }

    #[test]
    fn normalize_dont_care_case() {
        assert_eq!(normalize_token("X"), "x");
        assert_eq!(normalize_token(" x"), "x");
    }

    #[test]
    fn normalize_numbered_nets() {
        assert_eq!(normalize_token("N7"), "N7");
        assert_eq!(normalize_token("n7"), "N7");
        assert_eq!(normalize_token("N007"), "N7");
        assert_eq!(normalize_token("n0"), "N0");
        assert_eq!(normalize_token("N000"), "N0");
        // Digits beyond any integer type still normalize.
        assert_eq!(
            normalize_token("N00123456789012345678901234567890"),
            "N123456789012345678901234567890"
        );
    }

    #[test]
    fn normalize_other_labels_trimmed_only() {
        assert_eq!(normalize_token("  clk "), "clk");
        assert_eq!(normalize_token("N"), "N");
        assert_eq!(normalize_token("N7a"), "N7a");
        assert_eq!(normalize_token("Data"), "Data");
    }

    #[test]
    fn classify_tokens() {
        assert_eq!(BitToken::parse("0"), BitToken::Zero);
        assert_eq!(BitToken::parse("1"), BitToken::One);
        assert_eq!(BitToken::parse("X"), BitToken::DontCare);
        assert_eq!(BitToken::parse("   "), BitToken::DontCare);
        assert_eq!(BitToken::parse("n07"), BitToken::Net("N7".into()));
        assert_eq!(BitToken::parse("carry"), BitToken::Net("carry".into()));
    }

    #[test]
    fn spec_padded_with_dont_care() {
        let tokens = parse_bit_spec("N1,0", 4);
        assert_eq!(
            tokens,
            vec![
                BitToken::Net("N1".into()),
                BitToken::Zero,
                BitToken::DontCare,
                BitToken::DontCare,
            ]
        );
    }

    #[test]
    fn spec_truncated_to_width() {
        let tokens = parse_bit_spec("1,0,N3,N4", 2);
        assert_eq!(tokens, vec![BitToken::One, BitToken::Zero]);
    }

    #[test]
    fn empty_spec_is_all_dont_care() {
        assert_eq!(parse_bit_spec("", 3), vec![BitToken::DontCare; 3]);
    }

    #[test]
    fn zero_width_yields_nothing() {
        assert!(parse_bit_spec("N1,N2", 0).is_empty());
    }
}
