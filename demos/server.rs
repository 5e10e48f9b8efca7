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

//! REST API server for the account app.
//!
//! Run with: `cargo run --example server -- config/default.yaml`
//!
//! # Example requests
//!
//! ```bash
//! # Create accounts
//! curl -X PUT http://localhost:8080/account \
//!   -H "Content-Type: application/json" \
//!   -d '{"clientId": 1, "number": "ACC-1", "balance": "1000.00", "currency": "EUR"}'
//! curl -X PUT http://localhost:8080/account \
//!   -H "Content-Type: application/json" \
//!   -d '{"clientId": 2, "number": "ACC-2", "balance": "900.00", "currency": "USD"}'
//!
//! # Transfer 30.00 USD, paid in EUR
//! curl -X POST "http://localhost:8080/transaction/fund-transfer?senderAccountId=1&receiverAccountId=2&amount=30.00"
//!
//! # History of the receiving account
//! curl "http://localhost:8080/transaction/history?accountId=2&offset=0&limit=10"
//!
//! # Accounts of client 1
//! curl "http://localhost:8080/account?clientId=1"
//! ```

use account_app_rs::api::{AppState, router};
use account_app_rs::logging::init_logging;
use account_app_rs::{AppConfig, MemoryStore, rates};
use std::env;
use std::process;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() {
    let config = match env::args().nth(1) {
        Some(path) => AppConfig::load(&path).unwrap_or_else(|e| {
            eprintln!("Error loading config '{path}': {e}");
            process::exit(1);
        }),
        None => AppConfig::default(),
    };
    init_logging(&config.log_level, config.use_json);

    let rates = rates::from_config(&config.currency_converter).unwrap_or_else(|e| {
        eprintln!("Error creating rate provider: {e}");
        process::exit(1);
    });
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        rates,
        config.money,
        config.transfer,
    );
    let app = router(state);

    let address = config.server.address();
    let listener = TcpListener::bind(&address).await.unwrap_or_else(|e| {
        eprintln!("Error binding {address}: {e}");
        process::exit(1);
    });
    info!(%address, "Account API server listening");

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {e}");
        process::exit(1);
    }
}
