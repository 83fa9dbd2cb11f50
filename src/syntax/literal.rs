//! Literal decoding: numerals, quote stripping and per-family unescaping.
//!
//! Everything here works on text the grammar has already tokenised, so malformed
//! input is limited to what the grammar lets through structurally (a hex prefix
//! with no digits, a misplaced underscore, an out-of-range suffixed value).

use crate::ast::Number;

// ============================================================================
// STRINGS
// ============================================================================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum QuoteStyle {
    Single,
    Double,
    TripleSingle,
    TripleDouble,
    Slashy,
}

impl QuoteStyle {
    /// Classifies a complete literal by its opening delimiter.
    pub fn of(text: &str) -> Option<Self> {
        if text.starts_with("'''") && text.len() >= 6 {
            Some(QuoteStyle::TripleSingle)
        } else if text.starts_with("\"\"\"") && text.len() >= 6 {
            Some(QuoteStyle::TripleDouble)
        } else if text.starts_with('\'') {
            Some(QuoteStyle::Single)
        } else if text.starts_with('"') {
            Some(QuoteStyle::Double)
        } else if text.starts_with('/') {
            Some(QuoteStyle::Slashy)
        } else {
            None
        }
    }

    pub fn delimiter_len(self) -> usize {
        match self {
            QuoteStyle::TripleSingle | QuoteStyle::TripleDouble => 3,
            QuoteStyle::Single | QuoteStyle::Double | QuoteStyle::Slashy => 1,
        }
    }

    /// Triple-quoted and slashy literals may span lines.
    pub fn is_multiline(self) -> bool {
        matches!(
            self,
            QuoteStyle::TripleSingle | QuoteStyle::TripleDouble | QuoteStyle::Slashy
        )
    }

    fn quote_char(self) -> char {
        match self {
            QuoteStyle::Single | QuoteStyle::TripleSingle => '\'',
            QuoteStyle::Double | QuoteStyle::TripleDouble => '"',
            QuoteStyle::Slashy => '/',
        }
    }

    fn interpolates(self) -> bool {
        matches!(
            self,
            QuoteStyle::Double | QuoteStyle::TripleDouble | QuoteStyle::Slashy
        )
    }
}

/// Converts `\r\n` and lone `\r` to `\n`.
pub fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Dequotes and unescapes a complete string literal without interpolation.
pub fn decode_string(text: &str) -> String {
    let Some(style) = QuoteStyle::of(text) else {
        return text.to_string();
    };
    let body = strip_quotes(text, style);
    let body = if style.is_multiline() {
        normalize_newlines(body)
    } else {
        body.to_string()
    };
    unescape(&body, style)
}

/// Removes the opening and closing delimiters.
pub fn strip_quotes(text: &str, style: QuoteStyle) -> &str {
    let n = style.delimiter_len();
    if text.len() < 2 * n {
        return "";
    }
    &text[n..text.len() - n]
}

/// Resolves escape sequences in a literal body according to its quote family.
pub fn unescape(body: &str, style: QuoteStyle) -> String {
    if style == QuoteStyle::Slashy {
        return body.replace("\\/", "/");
    }

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            'b' => out.push('\u{0008}'),
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'f' => out.push('\u{000C}'),
            'r' => out.push('\r'),
            's' => out.push(' '),
            '"' | '\'' | '\\' | '$' | '/' => out.push(next),
            // Line continuation.
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let unit = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
                out.push(decode_utf16_unit(unit, &mut chars));
            }
            '0'..='7' => {
                let max_len = if next <= '3' { 3 } else { 2 };
                let mut value = next.to_digit(8).unwrap_or(0);
                let mut len = 1;
                while len < max_len {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                            len += 1;
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

// A high surrogate followed by `\uDCxx` combines into one scalar value.
fn decode_utf16_unit(unit: u32, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> char {
    if !(0xD800..0xDC00).contains(&unit) {
        return char::from_u32(unit).unwrap_or('\u{FFFD}');
    }
    let mut lookahead = chars.clone();
    if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
        let hex: String = lookahead.by_ref().take(4).collect();
        if let Ok(low) = u32::from_str_radix(&hex, 16) {
            if (0xDC00..0xE000).contains(&low) {
                *chars = lookahead;
                let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(combined).unwrap_or('\u{FFFD}');
            }
        }
    }
    '\u{FFFD}'
}

/// Escapes `value` so that [`unescape`] with the same family returns it unchanged.
pub fn escape(value: &str, style: QuoteStyle) -> String {
    if style == QuoteStyle::Slashy {
        return value.replace('/', "\\/");
    }
    let quote = style.quote_char();
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '$' if style.interpolates() => out.push_str("\\$"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

// ============================================================================
// NUMERALS
// ============================================================================

/// Decodes an integer or decimal numeral, optionally preceded by `-`.
///
/// Unsuffixed integers take the narrowest of int, long and big-integer that holds
/// the value; unsuffixed decimals are big-decimals.
pub fn decode_number(text: &str) -> Result<Number, String> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let lower = unsigned.to_ascii_lowercase();
    if lower.starts_with("0x") || lower.starts_with("0b") {
        return decode_integer(negative, unsigned);
    }
    let is_decimal = lower.contains('.')
        || lower.contains('e')
        || lower.ends_with('f')
        || lower.ends_with('d');
    if is_decimal {
        decode_decimal(negative, unsigned)
    } else {
        decode_integer(negative, unsigned)
    }
}

fn decode_integer(negative: bool, text: &str) -> Result<Number, String> {
    let (body, suffix) = match text.chars().last() {
        Some(c @ ('i' | 'I' | 'l' | 'L' | 'g' | 'G')) => (&text[..text.len() - 1], Some(c)),
        _ => (text, None),
    };
    let (radix, digits) = split_radix(body);
    let digits = strip_separators(digits)?;
    if digits.is_empty() {
        return Err(format!("Number '{text}' has no digits"));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_digit(radix)) {
        return Err(format!("Invalid digit '{bad}' in base {radix} number '{text}'"));
    }

    let magnitude = parse_magnitude(&digits, radix);
    match suffix.map(|c| c.to_ascii_lowercase()) {
        Some('i') => {
            signed_i32(negative, magnitude)
                .map(Number::Integer)
                .ok_or_else(|| format!("Number '{text}' is too large for int"))
        }
        Some('l') => {
            signed_i64(negative, magnitude)
                .map(Number::Long)
                .ok_or_else(|| format!("Number '{text}' is too large for long"))
        }
        Some(_) => Ok(Number::BigInteger(big_decimal_text(negative, &digits, radix))),
        None => Ok(if let Some(value) = signed_i32(negative, magnitude) {
            Number::Integer(value)
        } else if let Some(value) = signed_i64(negative, magnitude) {
            Number::Long(value)
        } else {
            Number::BigInteger(big_decimal_text(negative, &digits, radix))
        }),
    }
}

fn decode_decimal(negative: bool, text: &str) -> Result<Number, String> {
    let (body, suffix) = match text.chars().last() {
        Some(c @ ('f' | 'F' | 'd' | 'D' | 'g' | 'G')) => (&text[..text.len() - 1], Some(c)),
        _ => (text, None),
    };
    let mut cleaned = String::with_capacity(body.len() + 1);
    if negative {
        cleaned.push('-');
    }
    for part in body.split(['.', 'e', 'E']) {
        if part.starts_with('_') || part.ends_with('_') {
            return Err(format!("Misplaced '_' in number '{text}'"));
        }
    }
    cleaned.extend(body.chars().filter(|c| *c != '_'));

    match suffix.map(|c| c.to_ascii_lowercase()) {
        Some('f') => match cleaned.parse::<f32>() {
            Ok(value) if value.is_finite() => Ok(Number::Float(value)),
            _ => Err(format!("Number '{text}' is out of range for float")),
        },
        Some('d') => match cleaned.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Number::Double(value)),
            _ => Err(format!("Number '{text}' is out of range for double")),
        },
        _ => Ok(Number::BigDecimal(cleaned)),
    }
}

fn split_radix(text: &str) -> (u32, &str) {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'0' {
        match bytes[1] {
            b'x' | b'X' => return (16, &text[2..]),
            b'b' | b'B' => return (2, &text[2..]),
            _ if text.len() > 1 => return (8, &text[1..]),
            _ => {}
        }
    }
    (10, text)
}

fn strip_separators(digits: &str) -> Result<String, String> {
    if digits.starts_with('_') || digits.ends_with('_') {
        return Err(format!("Misplaced '_' in number digits '{digits}'"));
    }
    Ok(digits.chars().filter(|c| *c != '_').collect())
}

/// `None` when the magnitude does not fit in 128 bits.
fn parse_magnitude(digits: &str, radix: u32) -> Option<u128> {
    digits.chars().try_fold(0u128, |acc, c| {
        acc.checked_mul(radix as u128)?
            .checked_add(c.to_digit(radix)? as u128)
    })
}

fn signed_i32(negative: bool, magnitude: Option<u128>) -> Option<i32> {
    let magnitude = magnitude?;
    if negative {
        (magnitude <= 1u128 << 31).then(|| (-(magnitude as i64)) as i32)
    } else {
        i32::try_from(magnitude).ok()
    }
}

fn signed_i64(negative: bool, magnitude: Option<u128>) -> Option<i64> {
    let magnitude = magnitude?;
    if negative {
        (magnitude <= 1u128 << 63).then(|| (magnitude as i128).wrapping_neg() as i64)
    } else {
        i64::try_from(magnitude).ok()
    }
}

/// Decimal rendering of an arbitrarily long digit string in any radix.
fn big_decimal_text(negative: bool, digits: &str, radix: u32) -> String {
    const BASE: u64 = 1_000_000_000;
    // Little-endian limbs of nine decimal digits each.
    let mut limbs: Vec<u64> = vec![0];
    for c in digits.chars() {
        let mut carry = c.to_digit(radix).unwrap_or(0) as u64;
        for limb in limbs.iter_mut() {
            let value = *limb * radix as u64 + carry;
            *limb = value % BASE;
            carry = value / BASE;
        }
        while carry > 0 {
            limbs.push(carry % BASE);
            carry /= BASE;
        }
    }
    let mut out = String::new();
    let is_zero = limbs.iter().all(|limb| *limb == 0);
    if negative && !is_zero {
        out.push('-');
    }
    let mut iter = limbs.iter().rev();
    if let Some(first) = iter.next() {
        out.push_str(&first.to_string());
    }
    for limb in iter {
        out.push_str(&format!("{limb:09}"));
    }
    out
}
