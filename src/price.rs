//! Parsing of display price strings such as `"KSh 4,500/day"`.

use serde::Serialize;

/// Result of interpreting a price string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "amount", rename_all = "camelCase")]
pub enum ParsedPrice {
    /// Leading whole amount before any `/unit` suffix.
    Amount(u64),
    /// Text without any digits ("Various", "On request"). Passes every price range.
    Various,
    /// Empty, or digits that do not form a usable amount.
    Invalid,
}

impl ParsedPrice {
    pub fn amount(&self) -> Option<u64> {
        match self {
            ParsedPrice::Amount(value) => Some(*value),
            _ => None,
        }
    }
}

/// Parse a price string.
///
/// The part before the first `/` is considered; the currency prefix is skipped,
/// thousands separators are dropped and the integer part is taken, so
/// `"KSh 4,500.50/day"` gives 4500.
pub fn parse_price(raw: &str) -> ParsedPrice {
    let head = raw.split('/').next().unwrap_or_default().trim();
    if head.is_empty() {
        return ParsedPrice::Invalid;
    }
    if !head.chars().any(|c| c.is_ascii_digit()) {
        return ParsedPrice::Various;
    }

    let mut amount: u64 = 0;
    let mut seen_digit = false;
    for c in head.chars().skip_while(|c| !c.is_ascii_digit()) {
        match c {
            '0'..='9' => {
                let digit = u64::from(c as u8 - b'0');
                amount = match amount.checked_mul(10).and_then(|a| a.checked_add(digit)) {
                    Some(next) => next,
                    None => return ParsedPrice::Invalid,
                };
                seen_digit = true;
            }
            ',' | '_' | ' ' | '\u{a0}' => continue,
            _ => break,
        }
    }

    if seen_digit {
        ParsedPrice::Amount(amount)
    } else {
        ParsedPrice::Invalid
    }
}
