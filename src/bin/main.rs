// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use account_app_rs::logging::init_logging;
use account_app_rs::rates;
use account_app_rs::{
    Account, AccountId, AccountService, AppConfig, ClientId, CreateAccount, MemoryStore, Storage,
    TransferEngine, TransferRequest,
};
use chrono::NaiveDateTime;
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{info, warn};

/// Account App - Run fund transfers over CSV files
///
/// Loads accounts, applies every transfer in order and writes the resulting
/// accounts to stdout.
#[derive(Parser, Debug)]
#[command(name = "account-app-rs")]
#[command(about = "Applies fund transfers from CSV files to a set of accounts", long_about = None)]
struct Args {
    /// Path to CSV file with accounts
    ///
    /// Expected format: client,number,balance,currency
    #[arg(value_name = "ACCOUNTS")]
    accounts: PathBuf,

    /// Path to CSV file with transfers
    ///
    /// Expected format: sender,receiver,amount,date
    /// Example: cargo run -- accounts.csv transfers.csv > result.csv
    #[arg(value_name = "TRANSFERS")]
    transfers: PathBuf,

    /// YAML configuration (money settings, rate provider, log level)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load(path).unwrap_or_else(|e| fail("Error loading config", e)),
        None => AppConfig::default(),
    };
    init_logging(&config.log_level, config.use_json);

    let rates = rates::from_config(&config.currency_converter)
        .unwrap_or_else(|e| fail("Error creating rate provider", e));
    let storage = Arc::new(MemoryStore::new());
    let accounts = AccountService::new(Arc::clone(&storage), config.money);
    let engine = TransferEngine::new(
        Arc::clone(&storage),
        rates,
        config.money,
        config.transfer,
    );

    let file = open(&args.accounts);
    if let Err(e) = load_accounts(&accounts, BufReader::new(file)) {
        fail("Error loading accounts", e);
    }

    let file = open(&args.transfers);
    if let Err(e) = process_transfers(&engine, BufReader::new(file)).await {
        fail("Error processing transfers", e);
    }

    let result = accounts
        .find_all()
        .map_err(|e| e.to_string())
        .and_then(|all| write_accounts(&all, std::io::stdout()).map_err(|e| e.to_string()));
    if let Err(e) = result {
        fail("Error writing output", e);
    }
}

fn open(path: &Path) -> File {
    File::open(path).unwrap_or_else(|e| fail(&format!("Error opening file '{}'", path.display()), e))
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("{context}: {error}");
    process::exit(1);
}

/// Raw account row.
///
/// Fields: `client, number, balance, currency`
#[derive(Debug, Deserialize)]
struct AccountRecord {
    client: u32,
    number: String,
    balance: Decimal,
    currency: String,
}

/// Raw transfer row. `amount` is in the receiver's currency.
///
/// Fields: `sender, receiver, amount, date`
#[derive(Debug, Deserialize)]
struct TransferRecord {
    sender: u32,
    receiver: u32,
    amount: Decimal,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    date: Option<NaiveDateTime>,
}

impl TransferRecord {
    fn into_request(self) -> TransferRequest {
        TransferRequest {
            sender_account_id: Some(AccountId(self.sender)),
            receiver_account_id: Some(AccountId(self.receiver)),
            amount: self.amount,
            transaction_date: self.date,
        }
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader)
}

/// Creates one account per valid row. Accounts get ids in row order,
/// starting at 1.
///
/// # Errors
///
/// Returns a CSV error if the reader fails. Malformed rows and rejected
/// accounts are logged and skipped.
fn load_accounts<R: Read, S: Storage>(
    service: &AccountService<S>,
    reader: R,
) -> Result<usize, csv::Error> {
    let mut created = 0;
    for (row, result) in csv_reader(reader).deserialize::<AccountRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                warn!(row, error = %e, "Skipping malformed account row");
                continue;
            }
        };

        let request = CreateAccount {
            client_id: ClientId(record.client),
            number: record.number,
            balance: record.balance,
            currency: record.currency,
        };
        match service.create_account(request) {
            Ok(_) => created += 1,
            Err(e) => warn!(row, error = %e, "Skipping account"),
        }
    }
    info!(created, "Accounts loaded");
    Ok(created)
}

/// Runs every transfer row through the engine, in file order.
///
/// # Errors
///
/// Returns a CSV error if the reader fails. Malformed rows and rejected
/// transfers are logged and skipped.
async fn process_transfers<R: Read, S: Storage>(
    engine: &TransferEngine<S>,
    reader: R,
) -> Result<usize, csv::Error> {
    let mut accepted = 0;
    for (row, result) in csv_reader(reader).deserialize::<TransferRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                warn!(row, error = %e, "Skipping malformed transfer row");
                continue;
            }
        };

        match engine.transfer_funds(record.into_request()).await {
            Ok(_) => accepted += 1,
            Err(e) => warn!(row, error = %e, "Transfer rejected"),
        }
    }
    info!(accepted, "Transfers processed");
    Ok(accepted)
}

/// Writes accounts as CSV.
///
/// Columns: `id, clientId, number, balance, currency`
fn write_accounts<W: Write>(accounts: &[Account], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for account in accounts {
        wtr.serialize(account)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use account_app_rs::{FixedRateProvider, MoneySettings, TransferSettings};
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    fn services() -> (AccountService<MemoryStore>, TransferEngine<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        let money = MoneySettings::default();
        let eur = "EUR".parse().unwrap();
        let usd = "USD".parse().unwrap();
        let rates = FixedRateProvider::default()
            .with_rate(&eur, &usd, dec!(2))
            .with_rate(&usd, &eur, dec!(0.5));
        (
            AccountService::new(Arc::clone(&storage), money),
            TransferEngine::new(storage, Arc::new(rates), money, TransferSettings::default()),
        )
    }

    const ACCOUNTS: &str = "client,number,balance,currency\n\
                            1,ACC-1,100.00,EUR\n\
                            2,ACC-2,50.00,USD\n";

    #[test]
    fn load_valid_accounts() {
        let (accounts, _) = services();
        let created = load_accounts(&accounts, Cursor::new(ACCOUNTS)).unwrap();
        assert_eq!(created, 2);
        assert_eq!(accounts.find_all().unwrap()[1].number, "ACC-2");
    }

    #[test]
    fn skip_malformed_and_invalid_accounts() {
        let (accounts, _) = services();
        let csv = "client,number,balance,currency\n\
                   1,ACC-1,100.00,EUR\n\
                   x,ACC-2,1,EUR\n\
                   3,ACC-3,1,euro\n\
                   4, ACC-4 , 7 , GBP \n";
        let created = load_accounts(&accounts, Cursor::new(csv)).unwrap();
        assert_eq!(created, 2);
    }

    #[tokio::test]
    async fn apply_transfers_in_order() {
        let (accounts, engine) = services();
        load_accounts(&accounts, Cursor::new(ACCOUNTS)).unwrap();

        let csv = "sender,receiver,amount,date\n\
                   1,2,10.00,\n\
                   2,1,5.00,2024-01-02T10:00:00\n\
                   1,1,1.00,\n\
                   1,2,bogus,\n";
        let accepted = process_transfers(&engine, Cursor::new(csv)).await.unwrap();
        assert_eq!(accepted, 2);

        // 10 USD cost 5 EUR, then 5 EUR cost 10 USD
        let all = accounts.find_all().unwrap();
        assert_eq!(all[0].balance, dec!(100.00));
        assert_eq!(all[1].balance, dec!(50.00));
    }

    #[test]
    fn write_accounts_to_csv() {
        let (accounts, _) = services();
        load_accounts(&accounts, Cursor::new(ACCOUNTS)).unwrap();

        let mut output = Vec::new();
        write_accounts(&accounts.find_all().unwrap(), &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        let mut lines = output.lines();
        assert_eq!(lines.next(), Some("id,clientId,number,balance,currency"));
        assert_eq!(lines.next(), Some("1,1,ACC-1,100.0000000000,EUR"));
    }
}
