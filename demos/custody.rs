//! Walks a 2-of-3 wallet through deposit, submit, confirm and execute, then
//! prints the audit history.
//!
//! Set `CUSTODY_JOURNAL_PATH` to keep the journal between runs.
//!
//! ```text
//! cargo run --example custody
//! ```
use anyhow::Context;
use multisig_custody::{Config, CustodyService, Ledger, Principal};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env().context("Invalid environment: ")?;
    let ledger = Arc::new(Ledger::new());
    let service = CustodyService::new(config, ledger.clone())?;

    let alice = service.new_principal()?;
    let bob = service.new_principal()?;
    let carol = service.new_principal()?;
    let vendor = Principal::generate("vendor")?;

    let wallet = service.create_wallet(vec![alice.clone(), bob.clone(), carol.clone()], 2)?;
    service.deposit(&wallet, &alice, 1_000)?;

    let id = service.submit(&wallet, &alice, vendor.clone(), 250, b"invoice-42".to_vec())?;
    service.confirm(&wallet, &alice, id)?;
    service.confirm(&wallet, &bob, id)?;
    service.execute(&wallet, &carol, id)?;

    println!("wallet {wallet}");
    println!("  balance: {}", service.balance(&wallet)?);
    println!("  {vendor} received {}", ledger.balance_of(&vendor));
    println!("history:");
    for record in service.events(&wallet)? {
        println!("  #{} {} {}", record.seq, record.timestamp.to_datetime_utc(), record.event);
    }

    Ok(())
}
