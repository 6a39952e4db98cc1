//! import-runner: loads the CardDemo fixed-width master files into the
//! relational target.
//!
//! Usage:
//!   import-runner --data-dir ./data --db carddemo.db
//!   import-runner --config import_config.json

use anyhow::Result;
use carddemo_core::{config::ImportConfig, importer::CardDemoImporter, store::ImportStore};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match arg_value(&args, "--config") {
        Some(path) => ImportConfig::load(path)?,
        None => ImportConfig::new("./data"),
    };
    if let Some(dir) = arg_value(&args, "--data-dir") {
        config.data_dir = dir.to_string();
    }
    if let Some(db) = arg_value(&args, "--db") {
        config.database_path = db.to_string();
    }

    println!("============================================================");
    println!("CardDemo Data Import");
    println!("============================================================");
    println!("  data_dir: {}", config.data_dir);
    println!("  db:       {}", config.database_path);
    println!();

    let mut store = if config.database_path == ":memory:" {
        ImportStore::in_memory()?
    } else {
        ImportStore::open(&config.database_path)?
    };
    store.migrate()?;

    let importer = CardDemoImporter::new(config);
    let summary = importer.run(&mut store)?;

    println!();
    println!("============================================================");
    println!("Import Summary");
    println!("============================================================");
    println!("Customers:    {}", summary.customers);
    println!("Accounts:     {}", summary.accounts);
    println!("Credit Cards: {}", summary.credit_cards);
    println!("Transactions: {}", summary.transactions);
    println!();
    println!("Data import completed successfully!");

    Ok(())
}

fn arg_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}
