//! Reconciliation/load orchestrator.
//!
//! Stages run strictly in order: customers → cross-reference → accounts
//! (parse) → accounts (insert) → cards → transactions → user fixups.
//! Each later stage re-queries the authoritative id sets from the store
//! rather than trusting in-memory assumptions, because earlier stages
//! may have rejected or remapped rows.

use crate::{
    config::ImportConfig,
    error::ImportResult,
    parser,
    record::{AccountRecord, CardRecord, TransactionRecord},
    store::{ImportStore, ImportSummary},
    types::{AccountId, CardNumber, CustomerId},
};
use std::collections::{BTreeSet, HashMap};

/// Customer id used when the target store holds no customers at all.
pub const FALLBACK_CUSTOMER_ID: CustomerId = 1;

/// Pick the owning customer for an account: the cross-reference value
/// when it names a customer that actually exists, else the smallest
/// existing customer id, else the fixed fallback id.
pub fn resolve_customer_for_account(
    xref_customer: Option<CustomerId>,
    valid: &BTreeSet<CustomerId>,
) -> CustomerId {
    match xref_customer {
        Some(id) if valid.contains(&id) => id,
        _ => valid
            .iter()
            .next()
            .copied()
            .unwrap_or(FALLBACK_CUSTOMER_ID),
    }
}

/// Resolve a transaction's account through the card→account map, falling
/// back to the smallest valid account id. `None` (skip the record) only
/// when no valid account exists at all.
pub fn resolve_account_for_transaction(
    card_number: &str,
    cards: &HashMap<CardNumber, AccountId>,
    valid: &BTreeSet<AccountId>,
) -> Option<AccountId> {
    match cards.get(card_number) {
        Some(id) if valid.contains(id) => Some(*id),
        _ => valid.iter().next().copied(),
    }
}

pub struct CardDemoImporter {
    config: ImportConfig,
}

impl CardDemoImporter {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Run the whole import. Any error aborts the run; the failing
    /// stage's open transaction rolls back and nothing after it runs.
    pub fn run(&self, store: &mut ImportStore) -> ImportResult<ImportSummary> {
        // Stage 1: customers
        let customers = parser::parse_customer_file(&self.config.customer_path())?;
        let loaded = store.replace_customers(&customers)?;
        log::info!("loaded {loaded} customers");

        // Stage 2: cross-reference (later lines win per account)
        let xref = parser::parse_cardxref_file(&self.config.cardxref_path())?;
        log::info!("loaded {} cross-references", xref.len());

        // Stage 3: accounts (parse)
        let accounts = parser::parse_account_file(&self.config.account_path())?;

        // Stage 4: accounts (insert), against the authoritative customer set
        let valid_customers = store.customer_ids()?;
        let mapped: Vec<(AccountRecord, CustomerId)> = accounts
            .into_iter()
            .map(|a| {
                let customer_id = resolve_customer_for_account(
                    xref.get(&a.account_id).copied(),
                    &valid_customers,
                );
                (a, customer_id)
            })
            .collect();
        let inserted = store.upsert_accounts(&mapped)?;
        log::info!("inserted {inserted} accounts");

        // Stage 5: cards — a card without a live account is meaningless
        let valid_accounts = store.account_ids()?;
        let parsed_cards = parser::parse_card_file(&self.config.card_path())?;
        let parsed_count = parsed_cards.len();
        let cards: Vec<CardRecord> = parsed_cards
            .into_iter()
            .filter(|c| valid_accounts.contains(&c.account_id))
            .collect();
        if cards.len() < parsed_count {
            log::debug!(
                "dropped {} cards referencing unknown accounts",
                parsed_count - cards.len()
            );
        }
        let loaded = store.upsert_cards(&cards)?;
        log::info!("loaded {loaded} credit cards");

        // Stage 6: transactions, resolved through the just-loaded cards
        let valid_accounts = store.account_ids()?;
        let card_map = store.card_account_map()?;
        let parsed_txns = parser::parse_transaction_file(&self.config.transaction_path())?;
        let resolved: Vec<(TransactionRecord, AccountId)> = parsed_txns
            .into_iter()
            .filter_map(|t| {
                resolve_account_for_transaction(&t.card_number, &card_map, &valid_accounts)
                    .map(|account_id| (t, account_id))
            })
            .collect();
        let loaded = store.append_transactions(&resolved)?;
        log::info!("loaded {loaded} transactions");

        // Stage 7: attach seed login users to the first customers
        let first = store.first_customer_ids(10)?;
        store.attach_seed_users(&first)?;
        log::info!("user mappings updated");

        store.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[i64]) -> BTreeSet<i64> {
        ids.iter().copied().collect()
    }

    #[test]
    fn account_resolution_prefers_valid_xref() {
        let valid = set(&[3, 5, 8]);
        assert_eq!(resolve_customer_for_account(Some(5), &valid), 5);
    }

    #[test]
    fn account_resolution_falls_back_to_smallest_valid() {
        // xref points at a customer the store rejected
        let valid = set(&[3, 5, 8]);
        assert_eq!(resolve_customer_for_account(Some(99), &valid), 3);
        assert_eq!(resolve_customer_for_account(None, &valid), 3);
    }

    #[test]
    fn account_resolution_uses_fixed_default_when_store_is_empty() {
        let valid = BTreeSet::new();
        assert_eq!(
            resolve_customer_for_account(Some(42), &valid),
            FALLBACK_CUSTOMER_ID
        );
        assert_eq!(resolve_customer_for_account(None, &valid), FALLBACK_CUSTOMER_ID);
    }

    #[test]
    fn transaction_resolution_through_card_map() {
        let mut cards = HashMap::new();
        cards.insert("4111111111111111".to_string(), 200_i64);
        let valid = set(&[100, 200]);
        assert_eq!(
            resolve_account_for_transaction("4111111111111111", &cards, &valid),
            Some(200)
        );
    }

    #[test]
    fn transaction_resolution_falls_back_to_minimum_account() {
        let cards = HashMap::new();
        let valid = set(&[100, 200]);
        assert_eq!(
            resolve_account_for_transaction("9999000000000001", &cards, &valid),
            Some(100)
        );
    }

    #[test]
    fn transaction_skipped_when_no_accounts_exist() {
        let cards = HashMap::new();
        let valid = BTreeSet::new();
        assert_eq!(
            resolve_account_for_transaction("4111111111111111", &cards, &valid),
            None
        );
    }
}
