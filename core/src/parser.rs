//! Fixed-width record parsers, one per source file kind.
//!
//! Field offsets are contractual, matching the CardDemo COBOL copybooks
//! (CVCUS01Y, CVACT01Y, CVACT02Y, CVTRA05Y and the cardxref layout).
//! Parsers skip records that are undersized or whose key field does not
//! decode; one bad line never aborts a file load.

use crate::decoder::{decode_date, decode_signed_overpunch, decode_timestamp};
use crate::error::ImportResult;
use crate::record::{
    clamp_fico, normalize_account_status, normalize_card_status, AccountRecord, CardRecord,
    CardType, CustomerRecord, TransactionRecord,
};
use crate::types::{AccountId, CustomerId};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Extract a trimmed field at `[start, end)`, tolerating lines shorter
/// than `end` the way byte-range slicing on the mainframe export does.
fn field(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("").trim()
}

/// Empty trimmed spans become NULLs downstream.
fn optional(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

// ── Customers (custdata.txt) ───────────────────────────────────────

pub fn parse_customers<R: BufRead>(reader: R) -> ImportResult<Vec<CustomerRecord>> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().len() < 50 {
            continue;
        }
        let customer_id: CustomerId = match field(&line, 0, 9).parse() {
            Ok(id) if id > 0 => id,
            _ => {
                log::warn!("custdata: skipping line with unparsable customer id");
                continue;
            }
        };
        records.push(CustomerRecord {
            customer_id,
            first_name: field(&line, 9, 34).to_string(),
            middle_name: field(&line, 34, 59).to_string(),
            last_name: field(&line, 59, 84).to_string(),
            address_line1: field(&line, 84, 134).to_string(),
            address_line2: field(&line, 134, 184).to_string(),
            city: field(&line, 184, 234).to_string(),
            state: field(&line, 234, 236).to_string(),
            country: field(&line, 236, 239).to_string(),
            zip_code: field(&line, 239, 249).to_string(),
            phone1: field(&line, 249, 264).to_string(),
            phone2: field(&line, 264, 279).to_string(),
            ssn: field(&line, 279, 288).to_string(),
            // govt id span [288, 297) is not carried forward
            date_of_birth: decode_date(field(&line, 297, 307)),
            fico_score: clamp_fico(field(&line, 307, 310)),
        });
    }
    Ok(records)
}

pub fn parse_customer_file(path: &str) -> ImportResult<Vec<CustomerRecord>> {
    let file = File::open(path)?;
    parse_customers(BufReader::new(file))
}

// ── Cross-reference (cardxref.txt) ─────────────────────────────────

/// Parse the card cross-reference into an account → customer mapping.
/// Later lines overwrite earlier ones for the same account id.
pub fn parse_cardxref<R: BufRead>(reader: R) -> ImportResult<HashMap<AccountId, CustomerId>> {
    let mut xref = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().len() < 30 {
            continue;
        }
        // card number [0, 16) keys the file but the mapping is by account
        let customer_id: CustomerId = match field(&line, 16, 25).parse() {
            Ok(id) => id,
            Err(_) => continue,
        };
        let account_id: AccountId = match field(&line, 25, 36).parse() {
            Ok(id) => id,
            Err(_) => continue,
        };
        xref.insert(account_id, customer_id);
    }
    Ok(xref)
}

pub fn parse_cardxref_file(path: &str) -> ImportResult<HashMap<AccountId, CustomerId>> {
    let file = File::open(path)?;
    parse_cardxref(BufReader::new(file))
}

// ── Accounts (acctdata.txt) ────────────────────────────────────────

pub fn parse_accounts<R: BufRead>(reader: R) -> ImportResult<Vec<AccountRecord>> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().len() < 90 {
            continue;
        }
        let account_id: AccountId = match field(&line, 0, 11).parse() {
            Ok(id) => id,
            Err(_) => {
                log::warn!("acctdata: skipping line with unparsable account id");
                continue;
            }
        };
        records.push(AccountRecord {
            account_id,
            active_status: normalize_account_status(field(&line, 11, 12)),
            current_balance: decode_signed_overpunch(field(&line, 12, 24), 2),
            credit_limit: decode_signed_overpunch(field(&line, 24, 36), 2),
            cash_credit_limit: decode_signed_overpunch(field(&line, 36, 48), 2),
            open_date: decode_date(field(&line, 48, 58)),
            expiry_date: decode_date(field(&line, 58, 68)),
            reissue_date: decode_date(field(&line, 68, 78)),
            curr_cycle_credit: decode_signed_overpunch(field(&line, 78, 90), 2),
            curr_cycle_debit: decode_signed_overpunch(field(&line, 90, 102), 2),
            group_id: optional(field(&line, 102, 112)),
        });
    }
    Ok(records)
}

pub fn parse_account_file(path: &str) -> ImportResult<Vec<AccountRecord>> {
    let file = File::open(path)?;
    parse_accounts(BufReader::new(file))
}

// ── Cards (carddata.txt) ───────────────────────────────────────────

pub fn parse_cards<R: BufRead>(reader: R) -> ImportResult<Vec<CardRecord>> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().len() < 50 {
            continue;
        }
        let card_number = field(&line, 0, 16).to_string();
        let account_id: AccountId = match field(&line, 16, 27).parse() {
            Ok(id) => id,
            Err(_) => {
                log::warn!("carddata: skipping line with unparsable account id");
                continue;
            }
        };
        // CVV at [27, 30) is deliberately not stored
        records.push(CardRecord {
            card_type: CardType::from_card_number(&card_number),
            card_number,
            account_id,
            embossed_name: field(&line, 30, 80).to_string(),
            expiry_date: decode_date(field(&line, 80, 90)),
            active_status: normalize_card_status(field(&line, 90, 91)),
        });
    }
    Ok(records)
}

pub fn parse_card_file(path: &str) -> ImportResult<Vec<CardRecord>> {
    let file = File::open(path)?;
    parse_cards(BufReader::new(file))
}

// ── Transactions (dailytran.txt) ───────────────────────────────────

pub fn parse_transactions<R: BufRead>(reader: R) -> ImportResult<Vec<TransactionRecord>> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().len() < 100 {
            continue;
        }
        // transaction id [0, 16) exists in the layout but the target
        // table keys transactions synthetically
        records.push(TransactionRecord {
            type_code: field(&line, 16, 18).to_string(),
            category_code: field(&line, 18, 22).to_string(),
            source: field(&line, 22, 32).to_string(),
            description: field(&line, 32, 132).to_string(),
            amount: decode_signed_overpunch(field(&line, 132, 143), 2),
            merchant_id: optional(field(&line, 143, 152)),
            merchant_name: optional(field(&line, 152, 202)),
            merchant_city: optional(field(&line, 202, 252)),
            merchant_zip: optional(field(&line, 252, 262)),
            card_number: field(&line, 262, 278).to_string(),
            timestamp: decode_timestamp(field(&line, 278, 304)),
        });
    }
    Ok(records)
}

pub fn parse_transaction_file(path: &str) -> ImportResult<Vec<TransactionRecord>> {
    let file = File::open(path)?;
    parse_transactions(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::io::Cursor;

    fn pad(s: &str, width: usize) -> String {
        format!("{s:<width$}")
    }

    fn customer_line(id: i64, first: &str, last: &str, dob: &str, fico: &str) -> String {
        let mut line = format!("{id:0>9}");
        line.push_str(&pad(first, 25));
        line.push_str(&pad("", 25)); // middle name
        line.push_str(&pad(last, 25));
        line.push_str(&pad("100 Main St", 50));
        line.push_str(&pad("", 50));
        line.push_str(&pad("Springfield", 50));
        line.push_str("IL");
        line.push_str("USA");
        line.push_str(&pad("62704", 10));
        line.push_str(&pad("555-555-0101", 15));
        line.push_str(&pad("", 15));
        line.push_str(&pad("123456789", 9));
        line.push_str(&pad("", 9)); // govt id
        line.push_str(&pad(dob, 10));
        line.push_str(&pad(fico, 3));
        line
    }

    #[test]
    fn customer_line_decodes_all_fields() {
        let line = customer_line(42, "Jane", "Doe", "1985-07-04", "712");
        let records = parse_customers(Cursor::new(line)).unwrap();
        assert_eq!(records.len(), 1);
        let c = &records[0];
        assert_eq!(c.customer_id, 42);
        assert_eq!(c.first_name, "Jane");
        assert_eq!(c.last_name, "Doe");
        assert_eq!(c.city, "Springfield");
        assert_eq!(c.state, "IL");
        assert_eq!(c.zip_code, "62704");
        assert_eq!(
            c.date_of_birth,
            chrono::NaiveDate::from_ymd_opt(1985, 7, 4)
        );
        assert_eq!(c.fico_score, Some(712));
        assert_eq!(c.email(), "jane.doe@email.com");
    }

    #[test]
    fn undersized_and_bad_id_customer_lines_are_skipped() {
        let input = format!(
            "short line\n{}\n{}\n",
            customer_line(7, "Ann", "Lee", "1990-01-01", "650"),
            // id span not numeric
            customer_line(0, "Bad", "Row", "1990-01-01", "650").replacen("000000000", "IDNOTNUM!", 1),
        );
        let records = parse_customers(Cursor::new(input)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].customer_id, 7);
    }

    fn account_line(id: i64) -> String {
        let mut line = format!("{id:0>11}");
        line.push('Y');
        line.push_str("00000012345{"); // 1234.50, positive overpunch
        line.push_str("00000050000A"); // 5000.01
        line.push_str("000000250000"); // 2500.00, unsigned
        line.push_str("2021-06-15");
        line.push_str("2026-06-30");
        line.push_str(&pad("", 10)); // reissue blank
        line.push_str("000000000000");
        line.push_str("00000001000}"); // -100.00
        line.push_str(&pad("GOLD", 10));
        line
    }

    #[test]
    fn account_line_decodes_amounts_and_dates() {
        let mut line = format!("{:0>11}", 100_i64);
        line.push('Y');
        line.push_str("00000012345{"); // 1234.50
        line.push_str("00000050000A"); // 5000.01
        line.push_str("000000250000"); // 2500.00
        line.push_str("2021-06-15");
        line.push_str("2026-06-30");
        line.push_str(&pad("", 10));
        line.push_str("000000000000");
        line.push_str("00000001000}"); // -100.00
        line.push_str(&pad("GOLD", 10));

        let records = parse_accounts(Cursor::new(line)).unwrap();
        assert_eq!(records.len(), 1);
        let a = &records[0];
        assert_eq!(a.account_id, 100);
        assert_eq!(a.active_status, "Y");
        assert_eq!(a.current_balance, Decimal::new(123450, 2));
        assert_eq!(a.credit_limit, Decimal::new(500001, 2));
        assert_eq!(a.cash_credit_limit, Decimal::new(250000, 2));
        assert_eq!(a.open_date, chrono::NaiveDate::from_ymd_opt(2021, 6, 15));
        assert_eq!(a.expiry_date, chrono::NaiveDate::from_ymd_opt(2026, 6, 30));
        assert_eq!(a.reissue_date, None);
        assert_eq!(a.curr_cycle_debit, Decimal::new(-10000, 2));
        assert_eq!(a.group_id.as_deref(), Some("GOLD"));
    }

    #[test]
    fn blank_account_status_defaults_to_active() {
        let line = account_line(5).replacen("00000000005Y", "00000000005 ", 1);
        let records = parse_accounts(Cursor::new(line)).unwrap();
        assert_eq!(records[0].active_status, "Y");
    }

    #[test]
    fn cardxref_last_line_wins() {
        let mut input = String::new();
        input.push_str(&format!(
            "{}{:0>9}{:0>11}\n",
            pad("4111111111111111", 16),
            5,
            100
        ));
        input.push_str(&format!(
            "{}{:0>9}{:0>11}\n",
            pad("4111111111111112", 16),
            9,
            100
        ));
        input.push_str("too short\n");
        let xref = parse_cardxref(Cursor::new(input)).unwrap();
        assert_eq!(xref.len(), 1);
        assert_eq!(xref.get(&100), Some(&9));
    }

    fn card_line(card: &str, acct: i64, expiry: &str, status: &str) -> String {
        let mut line = pad(card, 16);
        line.push_str(&format!("{acct:0>11}"));
        line.push_str("123"); // cvv, not stored
        line.push_str(&pad("JANE DOE", 50));
        line.push_str(&pad(expiry, 10));
        line.push_str(status);
        line
    }

    #[test]
    fn card_line_decodes_with_network_and_status() {
        let records = parse_cards(Cursor::new(card_line(
            "5500000000000004",
            100,
            "2026-06-30",
            "S",
        )))
        .unwrap();
        assert_eq!(records.len(), 1);
        let c = &records[0];
        assert_eq!(c.card_number, "5500000000000004");
        assert_eq!(c.account_id, 100);
        assert_eq!(c.card_type.code(), "MC");
        assert_eq!(c.embossed_name, "JANE DOE");
        assert_eq!(c.active_status, "S");
    }

    #[test]
    fn card_status_defaults_when_line_ends_early_or_code_unknown() {
        // 90-char line: status column missing entirely
        let short = card_line("4111111111111111", 100, "2026-06-30", "");
        let records = parse_cards(Cursor::new(short)).unwrap();
        assert_eq!(records[0].active_status, "Y");

        let bad = card_line("4111111111111111", 100, "2026-06-30", "Q");
        let records = parse_cards(Cursor::new(bad)).unwrap();
        assert_eq!(records[0].active_status, "Y");
    }

    fn transaction_line(card: &str, type_code: &str, amount: &str, ts: &str) -> String {
        let mut line = pad("TX0000000000001", 16);
        line.push_str(type_code);
        line.push_str(&pad("5411", 4));
        line.push_str(&pad("POS", 10));
        line.push_str(&pad("GROCERY PURCHASE", 100));
        line.push_str(&format!("{amount:0>11}"));
        line.push_str(&pad("MERCH001", 9));
        line.push_str(&pad("Corner Grocer", 50));
        line.push_str(&pad("Springfield", 50));
        line.push_str(&pad("62704", 10));
        line.push_str(&pad(card, 16));
        line.push_str(&pad(ts, 26));
        line
    }

    #[test]
    fn transaction_line_decodes_amount_and_timestamp() {
        let line = transaction_line(
            "4111111111111111",
            "02",
            "0000012A", // 1.21
            "2022-06-10 19:27:53.000000",
        );
        let records = parse_transactions(Cursor::new(line)).unwrap();
        assert_eq!(records.len(), 1);
        let t = &records[0];
        assert_eq!(t.type_code, "02");
        assert_eq!(t.amount, Decimal::new(121, 2));
        assert_eq!(t.card_number, "4111111111111111");
        assert_eq!(t.merchant_name.as_deref(), Some("Corner Grocer"));
        let ts = t.timestamp.unwrap();
        assert_eq!(ts.date(), chrono::NaiveDate::from_ymd_opt(2022, 6, 10).unwrap());
        assert_eq!(t.transaction_date(), ts.date());
    }

    #[test]
    fn unparsable_timestamp_defaults_independently() {
        let line = transaction_line("4111111111111111", "01", "00000000500", "garbage ts");
        let records = parse_transactions(Cursor::new(line)).unwrap();
        let t = &records[0];
        assert!(t.timestamp.is_none());
        // both halves still produce values (today / now)
        let _ = t.transaction_date();
        let _ = t.transaction_time();
    }
}
