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

//! Transfer records and their per-account history view.
//!
//! A [`Transaction`] is stored once per accepted transfer and never changes.
//! It is symmetric: it does not know which side is asking. A
//! [`HistoryEntry`] is the same record seen from one participating account.

use crate::base::{AccountId, Currency, TransactionId};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An append-only ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub sender_account_id: AccountId,
    pub receiver_account_id: AccountId,
    /// Debited from the sender, in the sender's currency.
    pub source_amount: Decimal,
    /// Credited to the receiver, in the receiver's currency.
    pub target_amount: Decimal,
    pub transaction_date: NaiveDateTime,
}

impl Transaction {
    pub fn involves(&self, account_id: AccountId) -> bool {
        self.sender_account_id == account_id || self.receiver_account_id == account_id
    }
}

/// A transfer record before the store assigned its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub sender_account_id: AccountId,
    pub receiver_account_id: AccountId,
    pub source_amount: Decimal,
    pub target_amount: Decimal,
    pub transaction_date: NaiveDateTime,
}

impl NewTransaction {
    pub fn with_id(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            sender_account_id: self.sender_account_id,
            receiver_account_id: self.receiver_account_id,
            source_amount: self.source_amount,
            target_amount: self.target_amount,
            transaction_date: self.transaction_date,
        }
    }
}

/// Direction of a transfer relative to the queried account. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Outbound,
    Inbound,
}

/// The other side of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerAccount {
    pub id: AccountId,
    pub number: String,
}

/// One transfer as seen from a single account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub transaction_id: TransactionId,
    pub peer_account: PeerAccount,
    pub direction: Direction,
    /// What left the account for outbound entries, what arrived for inbound ones.
    pub amount: Decimal,
    /// The queried account's own currency.
    pub currency: Currency,
    pub transaction_date: NaiveDateTime,
}
