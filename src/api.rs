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

//! REST surface.
//!
//! | Method | Path                          | Query                                                          |
//! |--------|-------------------------------|----------------------------------------------------------------|
//! | PUT    | `/account`                    | JSON body: `clientId`, `number`, `balance`, `currency`         |
//! | GET    | `/account`                    | `clientId` (optional)                                          |
//! | GET    | `/transaction`                | `offset`, `limit`                                              |
//! | GET    | `/transaction/history`        | `accountId`, `offset`, `limit`                                 |
//! | POST   | `/transaction/fund-transfer`  | `senderAccountId`, `receiverAccountId`, `amount`, `transactionDate` |
//!
//! Decimal amounts are exchanged as strings. Validation errors answer 400
//! and rate service errors 503, both with the plain-text message.

use crate::account::{Account, CreateAccount};
use crate::accounts::AccountService;
use crate::base::{AccountId, ClientId};
use crate::config::TransferSettings;
use crate::engine::{TransferEngine, TransferRequest};
use crate::error::ServiceError;
use crate::history::TransactionHistory;
use crate::money::MoneySettings;
use crate::page::Page;
use crate::rates::RateProvider;
use crate::store::Storage;
use crate::transaction::{HistoryEntry, Transaction};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

const DEFAULT_PAGE_LIMIT: u32 = 20;

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountQuery {
    pub client_id: Option<ClientId>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub account_id: AccountId,
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferQuery {
    pub sender_account_id: Option<AccountId>,
    pub receiver_account_id: Option<AccountId>,
    pub amount: Decimal,
    pub transaction_date: Option<NaiveDateTime>,
}

impl From<TransferQuery> for TransferRequest {
    fn from(query: TransferQuery) -> Self {
        TransferRequest {
            sender_account_id: query.sender_account_id,
            receiver_account_id: query.receiver_account_id,
            amount: query.amount,
            transaction_date: query.transaction_date,
        }
    }
}

/// Services shared by all handlers.
pub struct AppState<S> {
    pub engine: Arc<TransferEngine<S>>,
    pub history: Arc<TransactionHistory<S>>,
    pub accounts: Arc<AccountService<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            history: Arc::clone(&self.history),
            accounts: Arc::clone(&self.accounts),
        }
    }
}

impl<S: Storage> AppState<S> {
    pub fn new(
        storage: Arc<S>,
        rates: Arc<dyn RateProvider>,
        money: MoneySettings,
        transfer: TransferSettings,
    ) -> Self {
        Self {
            engine: Arc::new(TransferEngine::new(
                Arc::clone(&storage),
                rates,
                money,
                transfer,
            )),
            history: Arc::new(TransactionHistory::new(Arc::clone(&storage), money)),
            accounts: Arc::new(AccountService::new(storage, money)),
        }
    }
}

/// Wrapper for converting [`ServiceError`] into HTTP responses.
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conversion(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Store(err) => {
                error!(error = %err, "Storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.0.to_string()).into_response()
    }
}

/// PUT /account
async fn create_account<S: Storage + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<CreateAccount>,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(state.accounts.create_account(request)?))
}

/// GET /account
async fn list_accounts<S: Storage + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<AccountQuery>,
) -> Result<Response, ApiError> {
    let response = match query.client_id {
        Some(client_id) => Json(state.accounts.find_by_client_id(client_id)?).into_response(),
        None => Json(state.accounts.find_all()?).into_response(),
    };
    Ok(response)
}

/// GET /transaction
async fn list_transactions<S: Storage + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Transaction>>, ApiError> {
    Ok(Json(state.history.all_transactions(query.offset, query.limit)?))
}

/// GET /transaction/history
async fn transaction_history<S: Storage + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Page<HistoryEntry>>, ApiError> {
    let page = state
        .history
        .history(query.account_id, query.offset, query.limit)?;
    Ok(Json(page))
}

/// POST /transaction/fund-transfer
async fn fund_transfer<S: Storage + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<TransferQuery>,
) -> Result<Json<Transaction>, ApiError> {
    let transaction = state.engine.transfer_funds(query.into()).await?;
    Ok(Json(transaction))
}

pub fn router<S: Storage + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route(
            "/account",
            get(list_accounts::<S>).put(create_account::<S>),
        )
        .route("/transaction", get(list_transactions::<S>))
        .route("/transaction/history", get(transaction_history::<S>))
        .route("/transaction/fund-transfer", post(fund_transfer::<S>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConversionError, StoreError, ValidationError};

    #[test]
    fn errors_map_to_status_codes() {
        let response = ApiError(ValidationError::SameAccount.into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            ApiError(ConversionError::Service("down".to_string()).into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = ApiError(
            ConversionError::ResultInterpretation("no quotes".to_string()).into(),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = ApiError(StoreError::MissingAccount(AccountId(1)).into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn transfer_query_becomes_request() {
        let query = TransferQuery {
            sender_account_id: Some(AccountId(1)),
            receiver_account_id: None,
            amount: Decimal::ONE,
            transaction_date: None,
        };
        let request = TransferRequest::from(query);
        assert_eq!(request.sender_account_id, Some(AccountId(1)));
        assert_eq!(request.receiver_account_id, None);
    }
}
