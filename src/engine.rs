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

//! Fund transfer engine.
//!
//! The [`TransferEngine`] moves money between two accounts, converting it
//! when their currencies differ.
//!
//! # Transfer Processing
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. **Scale**: the amount has at most `scale` fractional digits, and is positive.
//! 2. **Accounts**: both ids are given and differ.
//! 3. **Existence**: both accounts are persisted (one batched lookup).
//! 4. **Currencies**: when they differ, the rate provider supports both.
//! 5. **Balance**: unless overdrafts are allowed, the sender can cover the debit.
//!
//! The amount and both resulting balances must also be representable at the
//! money scale; anything larger is rejected instead of losing digits.
//!
//! The amount is always in the receiver's currency. With different
//! currencies the sender is debited `amount / rate(sender → receiver)`,
//! rounded with the money settings.
//!
//! # Atomicity
//!
//! The rate lookup happens before any write. The balance check, both balance
//! updates and the transaction insert then run in one storage unit of work,
//! re-reading the accounts inside it, so a failure at any point leaves no
//! trace and concurrent transfers cannot lose updates.

use crate::account::Account;
use crate::base::{AccountId, Currency};
use crate::config::TransferSettings;
use crate::error::{ConversionError, ServiceError, ValidationError};
use crate::money::MoneySettings;
use crate::rates::RateProvider;
use crate::store::{Storage, Store};
use crate::transaction::{NewTransaction, Transaction};
use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A request to move `amount` (in the receiver's currency) between accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub sender_account_id: Option<AccountId>,
    pub receiver_account_id: Option<AccountId>,
    pub amount: Decimal,
    /// Defaults to the current local time. When set, the rate of that day is used.
    pub transaction_date: Option<NaiveDateTime>,
}

impl TransferRequest {
    pub fn new(sender: AccountId, receiver: AccountId, amount: Decimal) -> Self {
        Self {
            sender_account_id: Some(sender),
            receiver_account_id: Some(receiver),
            amount,
            transaction_date: None,
        }
    }

    pub fn dated(self, transaction_date: NaiveDateTime) -> Self {
        Self {
            transaction_date: Some(transaction_date),
            ..self
        }
    }
}

/// Executes fund transfers against a [`Storage`].
pub struct TransferEngine<S> {
    storage: Arc<S>,
    rates: Arc<dyn RateProvider>,
    money: MoneySettings,
    settings: TransferSettings,
}

impl<S: Storage> TransferEngine<S> {
    pub fn new(
        storage: Arc<S>,
        rates: Arc<dyn RateProvider>,
        money: MoneySettings,
        settings: TransferSettings,
    ) -> Self {
        Self {
            storage,
            rates,
            money,
            settings,
        }
    }

    pub fn money(&self) -> MoneySettings {
        self.money
    }

    /// Validates and executes a transfer, returning the persisted record.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] - the request breaks one of the checks above.
    /// - [`ServiceError::Conversion`] - the rate provider failed or answered unusably.
    /// - [`ServiceError::Store`] - persistence failed; nothing was written.
    pub async fn transfer_funds(&self, request: TransferRequest) -> Result<Transaction, ServiceError> {
        match self.execute(&request).await {
            Ok(transaction) => {
                info!(
                    transaction_id = %transaction.id,
                    sender = %transaction.sender_account_id,
                    receiver = %transaction.receiver_account_id,
                    source_amount = %transaction.source_amount,
                    target_amount = %transaction.target_amount,
                    "Transfer completed"
                );
                Ok(transaction)
            }
            Err(ServiceError::Validation(error)) => {
                debug!(?request, %error, "Transfer rejected");
                Err(error.into())
            }
            Err(error) => {
                warn!(?request, %error, "Transfer failed");
                Err(error)
            }
        }
    }

    async fn execute(&self, request: &TransferRequest) -> Result<Transaction, ServiceError> {
        let amount = request.amount;
        if !self.money.fits_scale(amount) {
            return Err(ValidationError::AmountScale {
                max_scale: self.money.scale,
            }
            .into());
        }
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount.into());
        }

        let (Some(sender_id), Some(receiver_id)) =
            (request.sender_account_id, request.receiver_account_id)
        else {
            return Err(ValidationError::MissingAccountId.into());
        };
        if sender_id == receiver_id {
            return Err(ValidationError::SameAccount.into());
        }

        let (sender, receiver) = self
            .storage
            .read(|store| find_pair(store, sender_id, receiver_id))?;

        let target_amount = self
            .money
            .checked_normalize(amount)
            .ok_or(ValidationError::AmountOutOfRange {
                max_scale: self.money.scale,
            })?;
        let source_amount = if sender.currency == receiver.currency {
            target_amount
        } else {
            self.ensure_supported(&sender.currency, &receiver.currency)
                .await?;
            self.convert(amount, &sender.currency, &receiver.currency, request)
                .await?
        };

        let transaction_date = request
            .transaction_date
            .unwrap_or_else(|| Local::now().naive_local());
        let allow_negative = self.settings.allow_negative_balance;

        self.storage.write(|store| -> Result<Transaction, ServiceError> {
            let (mut sender, mut receiver) = find_pair(&*store, sender_id, receiver_id)?;

            sender.debit(source_amount, allow_negative)?;
            receiver.credit(target_amount)?;
            for account in [&mut sender, &mut receiver] {
                account.balance = self
                    .money
                    .checked_normalize(account.balance)
                    .ok_or(ValidationError::BalanceOutOfRange)?;
            }
            store.save_all(&[sender, receiver])?;

            let transaction = store.insert(NewTransaction {
                sender_account_id: sender_id,
                receiver_account_id: receiver_id,
                source_amount,
                target_amount,
                transaction_date,
            })?;
            Ok(transaction)
        })
    }

    async fn ensure_supported(&self, from: &Currency, to: &Currency) -> Result<(), ServiceError> {
        let supported = self.rates.supported_currencies().await?;

        let mut unsupported: Vec<Currency> = Vec::new();
        for currency in [from, to] {
            if !supported.contains(currency) && !unsupported.contains(currency) {
                unsupported.push(currency.clone());
            }
        }

        if unsupported.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedCurrencies(unsupported).into())
        }
    }

    /// Source amount for `amount` of `to`, paid in `from`.
    async fn convert(
        &self,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
        request: &TransferRequest,
    ) -> Result<Decimal, ServiceError> {
        let date = request.transaction_date.map(|date| date.date());
        let rate = self.rates.direct_rate(from, to, date).await?;
        debug!(provider = self.rates.name(), %from, %to, %rate, "Exchange rate resolved");

        if rate <= Decimal::ZERO {
            return Err(unusable_rate(from, to, rate).into());
        }
        self.money
            .divide(amount, rate)
            .ok_or_else(|| unusable_rate(from, to, rate).into())
    }
}

fn unusable_rate(from: &Currency, to: &Currency, rate: Decimal) -> ConversionError {
    ConversionError::ResultInterpretation(format!(
        "Exchange rate {rate} for {from}{to} cannot be applied"
    ))
}

/// Resolves both accounts with one batched lookup. Missing ids are reported
/// together, sender first.
fn find_pair(
    store: &dyn Store,
    sender_id: AccountId,
    receiver_id: AccountId,
) -> Result<(Account, Account), ServiceError> {
    let mut sender = None;
    let mut receiver = None;
    for account in store.find_all_by_id(&[sender_id, receiver_id])? {
        if account.id == sender_id {
            sender = Some(account);
        } else if account.id == receiver_id {
            receiver = Some(account);
        }
    }

    match (sender, receiver) {
        (Some(sender), Some(receiver)) => Ok((sender, receiver)),
        (sender, receiver) => {
            let mut missing = Vec::with_capacity(2);
            if sender.is_none() {
                missing.push(sender_id);
            }
            if receiver.is_none() {
                missing.push(receiver_id);
            }
            Err(ValidationError::AccountsNotFound(missing).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::NewAccount;
    use crate::base::ClientId;
    use crate::error::StoreError;
    use crate::rates::FixedRateProvider;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn engine_with(accounts: &[(&str, Decimal, &str)]) -> TransferEngine<MemoryStore> {
        let storage = Arc::new(MemoryStore::new());
        storage
            .write(|store| -> Result<(), StoreError> {
                for (number, balance, currency) in accounts {
                    store.save(NewAccount {
                        client_id: ClientId(1),
                        number: number.to_string(),
                        balance: *balance,
                        currency: currency.parse().unwrap(),
                    })?;
                }
                Ok(())
            })
            .unwrap();
        let rates = FixedRateProvider::default().with_rate(
            &"EUR".parse().unwrap(),
            &"USD".parse().unwrap(),
            dec!(1.0952),
        );
        TransferEngine::new(
            storage,
            Arc::new(rates),
            MoneySettings::default(),
            TransferSettings::default(),
        )
    }

    #[test]
    fn transfer_request_builder() {
        let date: NaiveDateTime = "2023-11-11T11:11:00".parse().unwrap();
        let request = TransferRequest::new(AccountId(1), AccountId(2), dec!(5)).dated(date);
        assert_eq!(request.sender_account_id, Some(AccountId(1)));
        assert_eq!(request.transaction_date, Some(date));
    }

    #[test]
    fn find_pair_reports_only_missing_ids() {
        let engine = engine_with(&[("A", dec!(1), "EUR")]);
        let result = engine
            .storage
            .read(|store| find_pair(store, AccountId(1), AccountId(9)));
        assert_eq!(
            result.unwrap_err(),
            ServiceError::Validation(ValidationError::AccountsNotFound(vec![AccountId(9)]))
        );
    }

    #[tokio::test]
    async fn missing_ids_are_rejected_before_equality() {
        let engine = engine_with(&[]);
        let request = TransferRequest {
            sender_account_id: None,
            receiver_account_id: None,
            amount: dec!(1),
            transaction_date: None,
        };
        assert_eq!(
            engine.transfer_funds(request).await.unwrap_err(),
            ServiceError::Validation(ValidationError::MissingAccountId)
        );
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let engine = engine_with(&[("A", dec!(1), "EUR"), ("B", dec!(1), "EUR")]);
        let request = TransferRequest::new(AccountId(1), AccountId(2), dec!(0.00));
        assert_eq!(
            engine.transfer_funds(request).await.unwrap_err(),
            ServiceError::Validation(ValidationError::NonPositiveAmount)
        );
    }

    #[tokio::test]
    async fn converts_with_sender_to_receiver_rate() {
        let engine = engine_with(&[("A", dec!(1000.00), "EUR"), ("B", dec!(900.00), "USD")]);
        let request = TransferRequest::new(AccountId(1), AccountId(2), dec!(30.00));

        let transaction = engine.transfer_funds(request).await.unwrap();
        assert_eq!(transaction.target_amount, dec!(30.0000000000));
        assert_eq!(transaction.source_amount, dec!(27.3922571220));
    }
}
