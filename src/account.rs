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

//! Client accounts.
//!
//! Balances only change through a fund transfer: the sender is debited the
//! source amount and the receiver is credited the target amount.
//!
//! # Example
//!
//! ```
//! use account_app_rs::{Account, AccountId, ClientId};
//! use rust_decimal_macros::dec;
//!
//! let mut account = Account {
//!     id: AccountId(1),
//!     client_id: ClientId(1),
//!     number: "ACC-0001".to_string(),
//!     balance: dec!(100.00),
//!     currency: "EUR".parse().unwrap(),
//! };
//! account.debit(dec!(30.00), false).unwrap();
//! assert_eq!(account.balance, dec!(70.00));
//! ```

use crate::base::{AccountId, ClientId, Currency};
use crate::error::ValidationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A persisted client account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub client_id: ClientId,
    pub number: String,
    pub balance: Decimal,
    pub currency: Currency,
}

impl Account {
    /// Increases the balance.
    ///
    /// A sum that overflows, or that only fits by dropping fractional
    /// digits, is rejected and the balance is left untouched.
    pub fn credit(&mut self, amount: Decimal) -> Result<(), ValidationError> {
        self.balance = exact(self.balance.checked_add(amount), self.balance, amount)?;
        Ok(())
    }

    /// Decreases the balance.
    ///
    /// Unless `allow_negative` is set, a debit that would take the balance
    /// below zero is rejected and the balance is left untouched. Results
    /// that overflow are rejected like in [`Account::credit`].
    pub fn debit(&mut self, amount: Decimal, allow_negative: bool) -> Result<(), ValidationError> {
        let remaining = exact(self.balance.checked_sub(amount), self.balance, amount)?;
        if !allow_negative && remaining < Decimal::ZERO {
            return Err(ValidationError::InsufficientBalance);
        }
        self.balance = remaining;
        Ok(())
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            number: self.number.clone(),
            balance: self.balance,
            currency: self.currency.clone(),
        }
    }
}

/// Keeps a balance result only if it carries every fractional digit of its
/// operands.
fn exact(result: Option<Decimal>, a: Decimal, b: Decimal) -> Result<Decimal, ValidationError> {
    result
        .filter(|value| value.scale() >= a.scale().max(b.scale()))
        .ok_or(ValidationError::BalanceOutOfRange)
}

/// An account that has not been persisted yet; the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub client_id: ClientId,
    pub number: String,
    pub balance: Decimal,
    pub currency: Currency,
}

impl NewAccount {
    pub fn with_id(self, id: AccountId) -> Account {
        Account {
            id,
            client_id: self.client_id,
            number: self.number,
            balance: self.balance,
            currency: self.currency,
        }
    }
}

/// Account creation request as received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccount {
    pub client_id: ClientId,
    pub number: String,
    pub balance: Decimal,
    pub currency: String,
}

/// Account as listed for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: AccountId,
    pub number: String,
    pub balance: Decimal,
    pub currency: Currency,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(balance: Decimal) -> Account {
        Account {
            id: AccountId(1),
            client_id: ClientId(9),
            number: "ACC-0001".to_string(),
            balance,
            currency: "EUR".parse().unwrap(),
        }
    }

    #[test]
    fn credit_increases_balance() {
        let mut account = account(dec!(10.00));
        account.credit(dec!(2.50)).unwrap();
        assert_eq!(account.balance, dec!(12.50));
    }

    #[test]
    fn overflowing_credit_is_rejected() {
        let mut account = account(Decimal::MAX);
        assert_eq!(account.credit(dec!(1)), Err(ValidationError::BalanceOutOfRange));
        assert_eq!(account.balance, Decimal::MAX);
    }

    #[test]
    fn overflowing_debit_is_rejected() {
        let mut account = account(Decimal::MIN);
        assert_eq!(account.debit(dec!(1), true), Err(ValidationError::BalanceOutOfRange));
        assert_eq!(account.balance, Decimal::MIN);
    }

    #[test]
    fn credit_that_would_drop_digits_is_rejected() {
        let mut account = account(dec!(7000000000000000000.0000000000));
        let result = account.credit(dec!(7000000000000000000.0000000000));
        assert_eq!(result, Err(ValidationError::BalanceOutOfRange));
        assert_eq!(account.balance.scale(), 10);
    }

    #[test]
    fn debit_exact_balance_succeeds() {
        let mut account = account(dec!(10.00));
        account.debit(dec!(10.00), false).unwrap();
        assert_eq!(account.balance, Decimal::ZERO);
    }

    #[test]
    fn debit_beyond_balance_is_rejected() {
        let mut account = account(dec!(10.00));
        let result = account.debit(dec!(10.01), false);
        assert_eq!(result, Err(ValidationError::InsufficientBalance));
        assert_eq!(account.balance, dec!(10.00));
    }

    #[test]
    fn debit_beyond_balance_allowed_when_overdraft_enabled() {
        let mut account = account(dec!(10.00));
        account.debit(dec!(15.00), true).unwrap();
        assert_eq!(account.balance, dec!(-5.00));
    }

    #[test]
    fn serializes_camel_case_with_string_amounts() {
        let json = serde_json::to_value(account(dec!(1.50))).unwrap();
        assert_eq!(json["clientId"], 9);
        assert_eq!(json["number"], "ACC-0001");
        assert_eq!(json["balance"], "1.50");
        assert_eq!(json["currency"], "EUR");
    }

    #[test]
    fn new_account_takes_assigned_id() {
        let new = NewAccount {
            client_id: ClientId(2),
            number: "ACC-0002".to_string(),
            balance: dec!(5),
            currency: "USD".parse().unwrap(),
        };
        let account = new.with_id(AccountId(17));
        assert_eq!(account.id, AccountId(17));
        assert_eq!(account.summary().number, "ACC-0002");
    }
}
