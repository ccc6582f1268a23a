#![allow(dead_code)]

use std::fs::File;
use std::io::{BufWriter, Error, Write};
use std::path::Path;

pub fn charge_json(bank: &str, account: u64, amount: &str) -> String {
    serde_json::json!({
        "bank": bank,
        "merchant_name": "Corner Shop",
        "merchant_token": "m-1",
        "cc_num": account.to_string(),
        "card_type": "credit",
        "amount": amount,
    })
    .to_string()
}

pub fn generate_accounts(path: &Path, accounts: u64, balance: &str) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["bank", "account", "balance"])?;
    for account in 1..=accounts {
        wtr.write_record(["First Bank", &account.to_string(), balance])?;
    }

    wtr.flush()?;
    Ok(())
}

/// One charge per line, spread round-robin over accounts `1..=accounts`.
pub fn generate_requests(
    path: &Path,
    rows: usize,
    accounts: u64,
    amount: &str,
) -> Result<(), Error> {
    let mut out = BufWriter::new(File::create(path)?);
    for i in 0..rows {
        let account = (i as u64 % accounts) + 1;
        writeln!(out, "{}", charge_json("First Bank", account, amount))?;
    }
    out.flush()?;
    Ok(())
}
