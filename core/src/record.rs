//! Typed records decoded from the fixed-width master files, plus the
//! per-field derivation rules applied while parsing.

use crate::types::{AccountId, CardNumber, CustomerId};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

/// Fallback open date for accounts whose open-date span does not decode.
pub const DEFAULT_OPEN_DATE: &str = "2020-01-01";
/// Fallback expiry date for accounts and cards.
pub const DEFAULT_EXPIRY_DATE: &str = "2025-12-31";

/// Render an optional date as `YYYY-MM-DD`, applying the given fallback.
pub fn date_or_default(date: Option<NaiveDate>, default: &str) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| default.to_string())
}

// ── Customer ───────────────────────────────────────────────────────

/// One line of `custdata.txt` (copybook CVCUS01Y).
#[derive(Debug, Clone)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub phone1: String,
    pub phone2: String,
    pub ssn: String,
    pub date_of_birth: Option<NaiveDate>,
    pub fico_score: Option<i32>,
}

impl CustomerRecord {
    /// Derived email address, `first.last@email.com` lowercased.
    pub fn email(&self) -> String {
        format!(
            "{}.{}@email.com",
            self.first_name.to_lowercase(),
            self.last_name.to_lowercase()
        )
    }
}

/// Clamp a raw FICO span to [300, 850].
///
/// All-digit values pass through unchanged inside the range; above 850
/// caps, in (0, 300) floors, non-digit or zero means "no score".
pub fn clamp_fico(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: i32 = trimmed.parse().ok()?;
    if (300..=850).contains(&value) {
        Some(value)
    } else if value > 850 {
        Some(850)
    } else if value > 0 {
        Some(300)
    } else {
        None
    }
}

// ── Account ────────────────────────────────────────────────────────

/// One line of `acctdata.txt` (copybook CVACT01Y).
///
/// Carries no customer id: the account-insert stage resolves the owner
/// from the cross-reference against the authoritative customer set.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub account_id: AccountId,
    pub active_status: String,
    pub current_balance: Decimal,
    pub credit_limit: Decimal,
    pub cash_credit_limit: Decimal,
    pub open_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub reissue_date: Option<NaiveDate>,
    pub curr_cycle_credit: Decimal,
    pub curr_cycle_debit: Decimal,
    pub group_id: Option<String>,
}

/// Blank account status defaults to active.
pub fn normalize_account_status(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "Y".to_string()
    } else {
        trimmed.to_string()
    }
}

// ── Card ───────────────────────────────────────────────────────────

/// Card network, inferred from the leading digits of the card number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    Visa,
    Mastercard,
    Amex,
    Discover,
}

impl CardType {
    pub fn from_card_number(number: &str) -> Self {
        if number.starts_with('4') {
            CardType::Visa
        } else if number.starts_with('5') {
            CardType::Mastercard
        } else if number.starts_with("34") || number.starts_with("37") {
            CardType::Amex
        } else if number.starts_with('6') {
            CardType::Discover
        } else {
            CardType::Visa
        }
    }

    /// Two-letter code as stored in `credit_cards.card_type`.
    pub fn code(&self) -> &'static str {
        match self {
            CardType::Visa => "VC",
            CardType::Mastercard => "MC",
            CardType::Amex => "AX",
            CardType::Discover => "DC",
        }
    }
}

/// Card status is restricted to Y/N/S; anything else defaults to active.
pub fn normalize_card_status(raw: &str) -> String {
    match raw.trim() {
        s @ ("Y" | "N" | "S") => s.to_string(),
        _ => "Y".to_string(),
    }
}

/// One line of `carddata.txt` (copybook CVACT02Y). The CVV span is read
/// past but never stored.
#[derive(Debug, Clone)]
pub struct CardRecord {
    pub card_number: CardNumber,
    pub account_id: AccountId,
    pub card_type: CardType,
    pub embossed_name: String,
    pub expiry_date: Option<NaiveDate>,
    pub active_status: String,
}

// ── Transaction ────────────────────────────────────────────────────

/// Map a two-digit transaction type code to its label. Unknown codes
/// fall back to the most common label.
pub fn transaction_type_label(code: &str) -> &'static str {
    match code {
        "01" => "SALE",
        "02" => "PYMT",
        "03" => "CRDT",
        "04" => "AUTH",
        "05" => "RFND",
        "06" => "RVRSL",
        "07" => "ADJ",
        _ => "SALE",
    }
}

/// One line of `dailytran.txt` (copybook CVTRA05Y). The account id is
/// resolved later through the card number; transactions have no natural
/// unique key of their own.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub type_code: String,
    pub category_code: String,
    pub source: String,
    pub description: String,
    pub amount: Decimal,
    pub merchant_id: Option<String>,
    pub merchant_name: Option<String>,
    pub merchant_city: Option<String>,
    pub merchant_zip: Option<String>,
    pub card_number: CardNumber,
    pub timestamp: Option<NaiveDateTime>,
}

impl TransactionRecord {
    /// Date half of the timestamp, defaulting to today when unparsable.
    pub fn transaction_date(&self) -> NaiveDate {
        self.timestamp
            .map(|t| t.date())
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Time half of the timestamp, defaulting to now when unparsable.
    pub fn transaction_time(&self) -> NaiveTime {
        self.timestamp
            .map(|t| t.time())
            .unwrap_or_else(|| Local::now().time())
    }
}
