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

//! Error types for transfers, history queries, rate lookups and storage.
//!
//! Client-facing messages are part of the HTTP contract and are passed
//! through verbatim, so the `Display` text of [`ValidationError`] and
//! [`ConversionError`] must not change casually.

use crate::base::{AccountId, Currency};
use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Client-caused input or business-rule violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Amount carries more fractional digits than the money scale allows
    #[error("Amount scale must not be greater than {max_scale}")]
    AmountScale { max_scale: u32 },

    /// Amount is zero or negative
    #[error("Amount must be positive")]
    NonPositiveAmount,

    /// Sender or receiver id was not supplied
    #[error("Sender and receiver account must be specified")]
    MissingAccountId,

    /// Sender and receiver are the same account
    #[error("Sender and receiver account must be different")]
    SameAccount,

    /// One or more referenced accounts are not persisted, in request order
    #[error("Accounts with these IDs do not exist: [{}]", join(.0))]
    AccountsNotFound(Vec<AccountId>),

    /// The rate provider does not know these currencies, in order of first occurrence
    #[error("Conversion from/to any of these currencies is not supported: [{}]", join(.0))]
    UnsupportedCurrencies(Vec<Currency>),

    /// Debit would take the sender below zero
    #[error("Source account has insufficient balance")]
    InsufficientBalance,

    /// Amount is too large to carry the money scale
    #[error("Amount cannot be represented with {max_scale} fractional digits")]
    AmountOutOfRange { max_scale: u32 },

    /// A debit or credit would leave a balance outside the representable range
    #[error("Resulting balance is out of range")]
    BalanceOutOfRange,

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Page limit must be greater than zero")]
    InvalidPageLimit,

    #[error("Account number must be between 1 and {max_len} characters")]
    InvalidAccountNumber { max_len: usize },

    #[error("Balance scale must not be greater than {max_scale}")]
    BalanceScale { max_scale: u32 },

    #[error("Account number {0} is already in use")]
    DuplicateAccountNumber(String),
}

/// Failures of the external currency rate source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The rate service is unreachable, timed out, answered with a non-2xx
    /// status, or reported a failure in its payload.
    #[error("{0}")]
    Service(String),

    /// The rate service answered but the payload cannot be used: empty
    /// currency list, zero or several quotes for one pair, unusable rate.
    #[error("{0}")]
    ResultInterpretation(String),
}

/// Storage failures. These are never client-caused and are not retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Account {0} does not exist")]
    MissingAccount(AccountId),

    #[error("Account number {0} is already in use")]
    DuplicateAccountNumber(String),

    #[error("identifier space exhausted for {0}")]
    IdsExhausted(&'static str),
}

/// Everything the account and transfer services can surface to a caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Validation(_))
    }

    pub fn is_conversion(&self) -> bool {
        matches!(self, ServiceError::Conversion(_))
    }
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
