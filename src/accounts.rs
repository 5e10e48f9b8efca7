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

//! Account creation and listing.

use crate::account::{Account, AccountSummary, CreateAccount, NewAccount};
use crate::base::{ClientId, Currency};
use crate::error::{ServiceError, StoreError, ValidationError};
use crate::money::MoneySettings;
use crate::store::Storage;
use std::sync::Arc;
use tracing::info;

/// Longest accepted account number.
pub const MAX_ACCOUNT_NUMBER_LEN: usize = 50;

pub struct AccountService<S> {
    storage: Arc<S>,
    money: MoneySettings,
}

impl<S: Storage> AccountService<S> {
    pub fn new(storage: Arc<S>, money: MoneySettings) -> Self {
        Self { storage, money }
    }

    /// Validates and persists a new account.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::InvalidCurrency`] - not a three-letter upper case code.
    /// - [`ValidationError::InvalidAccountNumber`] - empty or longer than 50 characters.
    /// - [`ValidationError::BalanceScale`] - more fractional digits than the money scale.
    /// - [`ValidationError::BalanceOutOfRange`] - too large to carry the money scale.
    /// - [`ValidationError::DuplicateAccountNumber`] - the number is taken.
    pub fn create_account(&self, request: CreateAccount) -> Result<Account, ServiceError> {
        let currency: Currency = request.currency.parse()?;

        let number = request.number.trim();
        let length = number.chars().count();
        if length == 0 || length > MAX_ACCOUNT_NUMBER_LEN {
            return Err(ValidationError::InvalidAccountNumber {
                max_len: MAX_ACCOUNT_NUMBER_LEN,
            }
            .into());
        }

        if !self.money.fits_scale(request.balance) {
            return Err(ValidationError::BalanceScale {
                max_scale: self.money.scale,
            }
            .into());
        }

        let balance = self
            .money
            .checked_normalize(request.balance)
            .ok_or(ValidationError::BalanceOutOfRange)?;

        let new_account = NewAccount {
            client_id: request.client_id,
            number: number.to_string(),
            balance,
            currency,
        };

        let account = self
            .storage
            .write(|store| store.save(new_account))
            .map_err(|error| match error {
                StoreError::DuplicateAccountNumber(number) => {
                    ServiceError::from(ValidationError::DuplicateAccountNumber(number))
                }
                other => other.into(),
            })?;

        info!(
            account_id = %account.id,
            client_id = %account.client_id,
            currency = %account.currency,
            "Account created"
        );
        Ok(account)
    }

    pub fn find_all(&self) -> Result<Vec<Account>, ServiceError> {
        Ok(self.storage.read(|store| store.find_all())?)
    }

    pub fn find_by_client_id(&self, client_id: ClientId) -> Result<Vec<AccountSummary>, ServiceError> {
        let accounts = self
            .storage
            .read(|store| store.find_all_by_client_id(client_id))?;
        Ok(accounts.iter().map(Account::summary).collect())
    }
}
