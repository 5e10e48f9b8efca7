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

//! Per-account transaction history.
//!
//! Stored transactions do not know who is asking. [`TransactionHistory`]
//! turns a page of them into [`HistoryEntry`] rows seen from one account:
//! which way the money went, who was on the other side and how much moved
//! in the account's own currency.
//!
//! The read path does not validate that the account exists; an unknown
//! account simply has an empty history.

use crate::account::Account;
use crate::base::AccountId;
use crate::error::{ServiceError, StoreError};
use crate::money::MoneySettings;
use crate::page::{Page, PageRequest};
use crate::store::Storage;
use crate::transaction::{Direction, HistoryEntry, PeerAccount, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub struct TransactionHistory<S> {
    storage: Arc<S>,
    money: MoneySettings,
}

impl<S: Storage> TransactionHistory<S> {
    pub fn new(storage: Arc<S>, money: MoneySettings) -> Self {
        Self { storage, money }
    }

    /// Transfers `account_id` took part in, newest first.
    ///
    /// # Errors
    ///
    /// Fails with a validation error if `limit` is zero.
    pub fn history(
        &self,
        account_id: AccountId,
        offset: u64,
        limit: u32,
    ) -> Result<Page<HistoryEntry>, ServiceError> {
        let request = PageRequest::new(offset, limit)?;
        self.history_page(account_id, &request)
    }

    /// Same as [`history`](Self::history) with an explicit request, e.g. one
    /// obtained from [`PageRequest::next`].
    pub fn history_page(
        &self,
        account_id: AccountId,
        request: &PageRequest,
    ) -> Result<Page<HistoryEntry>, ServiceError> {
        let (page, accounts) = self.storage.read(|store| -> Result<_, StoreError> {
            let page = store.find_page_by_participant(account_id, request)?;
            if page.content().is_empty() {
                return Ok((page, Vec::new()));
            }

            let mut ids = vec![account_id];
            for transaction in page.content() {
                let peer = peer_of(transaction, account_id);
                if !ids.contains(&peer) {
                    ids.push(peer);
                }
            }
            let accounts = store.find_all_by_id(&ids)?;
            Ok((page, accounts))
        })?;

        debug!(
            %account_id,
            offset = request.offset(),
            rows = page.number_of_elements(),
            total = page.total_elements(),
            "History page loaded"
        );

        let accounts: HashMap<AccountId, Account> = accounts
            .into_iter()
            .map(|account| (account.id, account))
            .collect();
        let Some(owner) = accounts.get(&account_id) else {
            return Ok(Page::new(Vec::new(), page.request(), page.total_elements()));
        };

        let content = page
            .content()
            .iter()
            .map(|transaction| self.project(transaction, owner, &accounts))
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(Page::new(content, page.request(), page.total_elements()))
    }

    /// Every stored transfer, newest first.
    pub fn all_transactions(&self, offset: u64, limit: u32) -> Result<Page<Transaction>, ServiceError> {
        let request = PageRequest::new(offset, limit)?;
        let page = self.storage.read(|store| store.find_page(&request))?;
        Ok(page.map(|mut transaction| {
            transaction.source_amount = self.money.normalize(transaction.source_amount);
            transaction.target_amount = self.money.normalize(transaction.target_amount);
            transaction
        }))
    }

    fn project(
        &self,
        transaction: &Transaction,
        owner: &Account,
        accounts: &HashMap<AccountId, Account>,
    ) -> Result<HistoryEntry, StoreError> {
        let (direction, amount) = if transaction.sender_account_id == owner.id {
            (Direction::Outbound, transaction.source_amount)
        } else {
            (Direction::Inbound, transaction.target_amount)
        };

        let peer_id = peer_of(transaction, owner.id);
        let peer = accounts
            .get(&peer_id)
            .ok_or(StoreError::MissingAccount(peer_id))?;

        Ok(HistoryEntry {
            transaction_id: transaction.id,
            peer_account: PeerAccount {
                id: peer.id,
                number: peer.number.clone(),
            },
            direction,
            amount: self.money.normalize(amount),
            currency: owner.currency.clone(),
            transaction_date: transaction.transaction_date,
        })
    }
}

fn peer_of(transaction: &Transaction, account_id: AccountId) -> AccountId {
    if transaction.sender_account_id == account_id {
        transaction.receiver_account_id
    } else {
        transaction.sender_account_id
    }
}
