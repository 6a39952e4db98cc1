//! Decoders for the COBOL fixed-width field encodings used by the
//! CardDemo master files.
//!
//! Every decoder here is total: a malformed legacy field yields zero (or
//! "absent"), never an error, so one bad field cannot abort a file load.
//! Callers apply clamp/default/skip policy explicitly.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// Trailing sign overpunch alphabets. The last character of a signed
/// numeric field carries both the final digit and the sign.
const POSITIVE_OVERPUNCH: [char; 10] = ['{', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I'];
const NEGATIVE_OVERPUNCH: [char; 10] = ['}', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R'];

/// Map an overpunch symbol to its digit and sign. `None` for ordinary
/// characters (the field is then unsigned).
fn overpunch_digit(c: char) -> Option<(u8, bool)> {
    if let Some(i) = POSITIVE_OVERPUNCH.iter().position(|&p| p == c) {
        return Some((i as u8, false));
    }
    if let Some(i) = NEGATIVE_OVERPUNCH.iter().position(|&n| n == c) {
        return Some((i as u8, true));
    }
    None
}

/// Decode a signed numeric field with trailing sign overpunch.
///
/// The source stores fixed-point values as scaled integers with the sign
/// folded into the last character; `scale` is the implied decimal places.
/// An empty or unparsable span decodes to exactly zero.
pub fn decode_signed_overpunch(raw: &str, scale: u32) -> Decimal {
    let mut digits: String = raw.trim().to_string();
    let mut negative = false;
    match digits.pop() {
        Some(last) => match overpunch_digit(last) {
            Some((digit, neg)) => {
                digits.push(char::from(b'0' + digit));
                negative = neg;
            }
            None => digits.push(last),
        },
        None => return Decimal::ZERO,
    }

    let scaled = match digits.parse::<i128>() {
        Ok(n) => n,
        Err(_) => return Decimal::ZERO,
    };
    match Decimal::try_from_i128_with_scale(scaled, scale) {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) => Decimal::ZERO,
    }
}

/// Decode a `YYYY-MM-DD` date span. Empty spans, the `0000-00-00`
/// sentinel, and unparsable text all mean "no date".
pub fn decode_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "0000-00-00" {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// Decode a `YYYY-MM-DD HH:MM:SS.ffffff` timestamp span, retrying the
/// first 19 characters without the fraction.
pub fn decode_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .or_else(|| {
            let head = trimmed.get(..19)?;
            NaiveDateTime::parse_from_str(head, "%Y-%m-%d %H:%M:%S").ok()
        })
}
