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

//! # Account App
//!
//! This library manages client accounts and fund transfers between them,
//! converting currency when sender and receiver hold different ones.
//!
//! ## Core Components
//!
//! - [`TransferEngine`]: validates and executes fund transfers atomically
//! - [`TransactionHistory`]: per-account, directional view of past transfers
//! - [`AccountService`]: account creation and listing
//! - [`RateProvider`]: exchange rate source, fixed or backed by exchangerate.host
//! - [`Storage`]: unit-of-work seam over the account and transaction stores
//!
//! ## Example
//!
//! ```
//! use account_app_rs::{
//!     AccountId, AccountService, ClientId, CreateAccount, FixedRateProvider, MemoryStore,
//!     MoneySettings, TransactionHistory, TransferEngine, TransferRequest, TransferSettings,
//! };
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let storage = Arc::new(MemoryStore::new());
//! let money = MoneySettings::default();
//!
//! let accounts = AccountService::new(Arc::clone(&storage), money);
//! for number in ["ACC-1", "ACC-2"] {
//!     accounts
//!         .create_account(CreateAccount {
//!             client_id: ClientId(1),
//!             number: number.to_string(),
//!             balance: dec!(100.00),
//!             currency: "EUR".to_string(),
//!         })
//!         .unwrap();
//! }
//!
//! let engine = TransferEngine::new(
//!     Arc::clone(&storage),
//!     Arc::new(FixedRateProvider::default()),
//!     money,
//!     TransferSettings::default(),
//! );
//! engine
//!     .transfer_funds(TransferRequest::new(AccountId(1), AccountId(2), dec!(25.00)))
//!     .await
//!     .unwrap();
//!
//! let history = TransactionHistory::new(storage, money);
//! let page = history.history(AccountId(2), 0, 10).unwrap();
//! assert_eq!(page.total_elements(), 1);
//! assert_eq!(page.content()[0].amount, dec!(25.00));
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! Services share one [`Storage`]. Every transfer runs in a single
//! serializable unit of work, so concurrent transfers over overlapping
//! accounts never lose updates.

pub mod account;
pub mod accounts;
pub mod api;
mod base;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod logging;
pub mod money;
pub mod page;
pub mod rates;
pub mod store;
pub mod transaction;

pub use account::{Account, AccountSummary, CreateAccount, NewAccount};
pub use accounts::AccountService;
pub use base::{AccountId, ClientId, Currency, TransactionId};
pub use config::{AppConfig, CurrencyConverterConfig, TransferSettings};
pub use engine::{TransferEngine, TransferRequest};
pub use error::{ConfigError, ConversionError, ServiceError, StoreError, ValidationError};
pub use history::TransactionHistory;
pub use money::{MoneySettings, RoundingMode};
pub use page::{Page, PageRequest, Sort, SortDirection, SortField};
pub use rates::{ExchangeRateHostProvider, FixedRateProvider, RateProvider};
pub use store::{AccountStore, MemoryStore, Storage, Store, TransactionStore};
pub use transaction::{Direction, HistoryEntry, NewTransaction, PeerAccount, Transaction};
