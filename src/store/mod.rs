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

//! Account and transaction storage.
//!
//! [`AccountStore`] and [`TransactionStore`] describe what the services need
//! from persistence. [`Storage`] scopes them into units of work:
//!
//! - [`Storage::read`] sees committed state only.
//! - [`Storage::write`] is serializable with every other write and
//!   all-or-nothing: if the closure fails, nothing it saved or inserted
//!   becomes visible.

mod memory;

pub use memory::MemoryStore;

use crate::account::{Account, NewAccount};
use crate::base::{AccountId, ClientId};
use crate::error::StoreError;
use crate::page::{Page, PageRequest, Sort, SortDirection, SortField};
use crate::transaction::{NewTransaction, Transaction};
use std::cmp::Ordering;

pub trait AccountStore {
    fn find_all(&self) -> Result<Vec<Account>, StoreError>;

    fn find_all_by_client_id(&self, client_id: ClientId) -> Result<Vec<Account>, StoreError>;

    /// Batched lookup. Unknown ids are skipped; duplicates are returned once.
    fn find_all_by_id(&self, ids: &[AccountId]) -> Result<Vec<Account>, StoreError>;

    /// Persists a new account and returns it with its assigned id.
    fn save(&mut self, account: NewAccount) -> Result<Account, StoreError>;

    /// Overwrites existing accounts in one batch.
    fn save_all(&mut self, accounts: &[Account]) -> Result<(), StoreError>;
}

pub trait TransactionStore {
    /// Appends a transfer record and returns it with its assigned id.
    fn insert(&mut self, transaction: NewTransaction) -> Result<Transaction, StoreError>;

    /// All transfers, ordered and windowed by `page`.
    fn find_page(&self, page: &PageRequest) -> Result<Page<Transaction>, StoreError>;

    /// Transfers where `account_id` is the sender or the receiver.
    fn find_page_by_participant(
        &self,
        account_id: AccountId,
        page: &PageRequest,
    ) -> Result<Page<Transaction>, StoreError>;
}

/// Both stores, as seen inside one unit of work.
pub trait Store: AccountStore + TransactionStore {}

impl<T: AccountStore + TransactionStore + ?Sized> Store for T {}

/// A backing store that can scope [`Store`] access into units of work.
pub trait Storage: Send + Sync {
    fn read<R>(&self, work: impl FnOnce(&dyn Store) -> R) -> R;

    fn write<T, E>(&self, work: impl FnOnce(&mut dyn Store) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>;
}

pub(crate) fn compare_transactions(sort: Sort, a: &Transaction, b: &Transaction) -> Ordering {
    let ordering = match sort.field {
        SortField::TransactionDate => a
            .transaction_date
            .cmp(&b.transaction_date)
            .then_with(|| a.id.cmp(&b.id)),
        SortField::Id => a.id.cmp(&b.id),
    };
    match sort.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Orders `rows` as requested and cuts out the requested window.
pub(crate) fn paginate<'a>(
    rows: impl Iterator<Item = &'a Transaction>,
    request: &PageRequest,
) -> Page<Transaction> {
    let mut rows: Vec<&Transaction> = rows.collect();
    rows.sort_by(|a, b| compare_transactions(request.sort(), a, b));

    let total = rows.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let content = rows
        .into_iter()
        .skip(offset)
        .take(request.limit() as usize)
        .cloned()
        .collect();

    Page::new(content, *request, total)
}
