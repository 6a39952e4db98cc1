//! SQLite target store.
//!
//! RULE: Only store.rs talks to the database. The orchestrator and the
//! parsers call store methods — they never execute SQL directly.
//!
//! Every stage method opens its own transaction and commits it before
//! returning; an early error return rolls the stage back on drop.

use crate::{
    error::ImportResult,
    record::{
        date_or_default, transaction_type_label, AccountRecord, CardRecord, CustomerRecord,
        TransactionRecord, DEFAULT_EXPIRY_DATE, DEFAULT_OPEN_DATE,
    },
    types::{AccountId, CardNumber, CustomerId},
};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Row counts for the four imported tables, as reported after a run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportSummary {
    pub customers: i64,
    pub accounts: i64,
    pub credit_cards: i64,
    pub transactions: i64,
}

pub struct ImportStore {
    conn: Connection,
}

impl ImportStore {
    pub fn open(path: &str) -> ImportResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ImportResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply the target schema.
    pub fn migrate(&self) -> ImportResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_schema.sql"))?;
        Ok(())
    }

    // ── Customers ──────────────────────────────────────────────

    /// Clear every table that transitively depends on customers (in
    /// FK-safe order), delete customers no login references, then
    /// upsert the parsed set keyed on customer id.
    pub fn replace_customers(&mut self, customers: &[CustomerRecord]) -> ImportResult<usize> {
        let tx = self.conn.transaction()?;
        for table in [
            "bill_payments",
            "bill_payees",
            "pending_authorizations",
            "transactions",
            "credit_cards",
            "accounts",
        ] {
            tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        tx.execute(
            "DELETE FROM customers
             WHERE customer_id NOT IN
                 (SELECT customer_id FROM users WHERE customer_id IS NOT NULL)",
            [],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO customers (
                    customer_id, first_name, last_name, date_of_birth,
                    fico_credit_score, address_line1, address_line2, city,
                    state, zip_code, phone_number, email
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ON CONFLICT(customer_id) DO UPDATE SET
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    date_of_birth = excluded.date_of_birth,
                    fico_credit_score = excluded.fico_credit_score,
                    address_line1 = excluded.address_line1,
                    address_line2 = excluded.address_line2,
                    city = excluded.city,
                    state = excluded.state,
                    zip_code = excluded.zip_code,
                    phone_number = excluded.phone_number,
                    email = excluded.email,
                    updated_at = CURRENT_TIMESTAMP",
            )?;
            for c in customers {
                stmt.execute(params![
                    c.customer_id,
                    c.first_name,
                    c.last_name,
                    c.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
                    c.fico_score,
                    c.address_line1,
                    c.address_line2,
                    c.city,
                    c.state,
                    c.zip_code,
                    c.phone1,
                    c.email(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(customers.len())
    }

    // ── Accounts ───────────────────────────────────────────────

    /// Upsert accounts keyed on account id, each paired with its
    /// resolved (authoritative) owning customer.
    pub fn upsert_accounts(
        &mut self,
        accounts: &[(AccountRecord, CustomerId)],
    ) -> ImportResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO accounts (
                    account_id, customer_id, active_status, current_balance,
                    credit_limit, cash_credit_limit, open_date, expiry_date,
                    reissue_date, curr_cycle_credit, curr_cycle_debit, group_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ON CONFLICT(account_id) DO UPDATE SET
                    customer_id = excluded.customer_id,
                    active_status = excluded.active_status,
                    current_balance = excluded.current_balance,
                    credit_limit = excluded.credit_limit,
                    cash_credit_limit = excluded.cash_credit_limit,
                    open_date = excluded.open_date,
                    expiry_date = excluded.expiry_date,
                    reissue_date = excluded.reissue_date,
                    curr_cycle_credit = excluded.curr_cycle_credit,
                    curr_cycle_debit = excluded.curr_cycle_debit,
                    group_id = excluded.group_id,
                    updated_at = CURRENT_TIMESTAMP",
            )?;
            for (a, customer_id) in accounts {
                stmt.execute(params![
                    a.account_id,
                    customer_id,
                    a.active_status,
                    a.current_balance.to_string(),
                    a.credit_limit.to_string(),
                    a.cash_credit_limit.to_string(),
                    date_or_default(a.open_date, DEFAULT_OPEN_DATE),
                    date_or_default(a.expiry_date, DEFAULT_EXPIRY_DATE),
                    a.reissue_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    a.curr_cycle_credit.to_string(),
                    a.curr_cycle_debit.to_string(),
                    a.group_id,
                ])?;
            }
        }
        tx.commit()?;
        Ok(accounts.len())
    }

    // ── Cards ──────────────────────────────────────────────────

    /// Upsert cards keyed on card number. The issued date approximates
    /// to the expiry date, matching the source system's export.
    pub fn upsert_cards(&mut self, cards: &[CardRecord]) -> ImportResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO credit_cards (
                    card_number, account_id, card_type, embossed_name,
                    expiry_date, active_status, issued_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(card_number) DO UPDATE SET
                    account_id = excluded.account_id,
                    card_type = excluded.card_type,
                    embossed_name = excluded.embossed_name,
                    expiry_date = excluded.expiry_date,
                    active_status = excluded.active_status,
                    updated_at = CURRENT_TIMESTAMP",
            )?;
            for c in cards {
                stmt.execute(params![
                    c.card_number,
                    c.account_id,
                    c.card_type.code(),
                    c.embossed_name,
                    date_or_default(c.expiry_date, DEFAULT_EXPIRY_DATE),
                    c.active_status,
                    date_or_default(c.expiry_date, DEFAULT_OPEN_DATE),
                ])?;
            }
        }
        tx.commit()?;
        Ok(cards.len())
    }

    // ── Transactions ───────────────────────────────────────────

    /// Append transactions against their resolved accounts. Insert-only
    /// with no conflict key: rerunning an import duplicates these rows
    /// (append-only ledger semantics).
    pub fn append_transactions(
        &mut self,
        transactions: &[(TransactionRecord, AccountId)],
    ) -> ImportResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO transactions (
                    account_id, transaction_type, transaction_category,
                    transaction_source, transaction_desc, transaction_amount,
                    merchant_id, merchant_name, merchant_city, merchant_zip,
                    card_number, transaction_date, transaction_time
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for (t, account_id) in transactions {
                let card_number = (!t.card_number.is_empty()).then(|| t.card_number.clone());
                stmt.execute(params![
                    account_id,
                    transaction_type_label(&t.type_code),
                    t.category_code,
                    t.source,
                    t.description,
                    t.amount.to_string(),
                    t.merchant_id,
                    t.merchant_name,
                    t.merchant_city,
                    t.merchant_zip,
                    card_number,
                    t.transaction_date().format("%Y-%m-%d").to_string(),
                    t.transaction_time().format("%H:%M:%S%.6f").to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(transactions.len())
    }

    // ── Authoritative id sets ──────────────────────────────────

    pub fn customer_ids(&self) -> ImportResult<BTreeSet<CustomerId>> {
        let mut stmt = self.conn.prepare("SELECT customer_id FROM customers")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(ids)
    }

    pub fn account_ids(&self) -> ImportResult<BTreeSet<AccountId>> {
        let mut stmt = self.conn.prepare("SELECT account_id FROM accounts")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(ids)
    }

    pub fn card_account_map(&self) -> ImportResult<HashMap<CardNumber, AccountId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT card_number, account_id FROM credit_cards")?;
        let map = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(map)
    }

    // ── User fixups ────────────────────────────────────────────

    /// First `limit` customer ids in ascending order.
    pub fn first_customer_ids(&self, limit: usize) -> ImportResult<Vec<CustomerId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT customer_id FROM customers ORDER BY customer_id LIMIT ?1")?;
        let ids = stmt
            .query_map(params![limit as i64], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Attach the seed login users USER0001..USER0005 to the given
    /// customers, in order.
    pub fn attach_seed_users(&mut self, customer_ids: &[CustomerId]) -> ImportResult<()> {
        let tx = self.conn.transaction()?;
        for (i, customer_id) in customer_ids.iter().take(5).enumerate() {
            let user_id = format!("USER{:04}", i + 1);
            tx.execute(
                "UPDATE users SET customer_id = ?1
                 WHERE user_id = ?2 AND user_type = 'U'",
                params![customer_id, user_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Summary / verification helpers ─────────────────────────

    fn count(&self, table: &str) -> ImportResult<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    pub fn summary(&self) -> ImportResult<ImportSummary> {
        Ok(ImportSummary {
            customers: self.count("customers")?,
            accounts: self.count("accounts")?,
            credit_cards: self.count("credit_cards")?,
            transactions: self.count("transactions")?,
        })
    }

    /// Owning customer of an account.
    pub fn account_customer(&self, account_id: AccountId) -> ImportResult<CustomerId> {
        let customer_id = self.conn.query_row(
            "SELECT customer_id FROM accounts WHERE account_id = ?1",
            params![account_id],
            |row| row.get(0),
        )?;
        Ok(customer_id)
    }

    pub fn card_exists(&self, card_number: &str) -> ImportResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM credit_cards WHERE card_number = ?1",
            params![card_number],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Account ids of all stored transactions, in insertion order.
    pub fn transaction_account_ids(&self) -> ImportResult<Vec<AccountId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT account_id FROM transactions ORDER BY transaction_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Customer attached to a login user, if any.
    pub fn user_customer(&self, user_id: &str) -> ImportResult<Option<CustomerId>> {
        let customer_id = self.conn.query_row(
            "SELECT customer_id FROM users WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(customer_id)
    }

    /// Stored decimal string of an account's current balance.
    pub fn account_balance(&self, account_id: AccountId) -> ImportResult<String> {
        let balance = self.conn.query_row(
            "SELECT current_balance FROM accounts WHERE account_id = ?1",
            params![account_id],
            |row| row.get(0),
        )?;
        Ok(balance)
    }
}
