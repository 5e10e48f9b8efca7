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

//! In-process store.
//!
//! All tables live behind one [`RwLock`]. Reads share the lock; a write
//! holds it exclusively for the whole unit of work, so concurrent transfers
//! over the same accounts are serialized and cannot lose updates.
//!
//! Writes never touch the tables directly. They go through a [`Journal`]
//! that overlays staged rows on the committed ones and is applied only when
//! the unit of work succeeds.

use super::{AccountStore, Storage, Store, TransactionStore, paginate};
use crate::account::{Account, NewAccount};
use crate::base::{AccountId, ClientId, TransactionId};
use crate::error::StoreError;
use crate::page::{Page, PageRequest};
use crate::transaction::{NewTransaction, Transaction};
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct Tables {
    accounts: BTreeMap<AccountId, Account>,
    /// Insertion order, which is also id order.
    transactions: Vec<Transaction>,
    last_account_id: u32,
    last_transaction_id: u64,
}

impl Tables {
    fn journal(&self) -> Journal<'_> {
        Journal {
            base: self,
            accounts: BTreeMap::new(),
            transactions: Vec::new(),
            last_account_id: self.last_account_id,
            last_transaction_id: self.last_transaction_id,
        }
    }

    fn apply(&mut self, changes: Changes) {
        for account in changes.accounts {
            self.accounts.insert(account.id, account);
        }
        self.transactions.extend(changes.transactions);
        self.last_account_id = changes.last_account_id;
        self.last_transaction_id = changes.last_transaction_id;
    }

    /// Runs a single write through a journal so direct writes follow the
    /// same rules as unit-of-work writes.
    fn autocommit<T>(
        &mut self,
        work: impl FnOnce(&mut Journal<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut journal = self.journal();
        let value = work(&mut journal)?;
        let changes = journal.into_changes();
        self.apply(changes);
        Ok(value)
    }
}

impl AccountStore for Tables {
    fn find_all(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.accounts.values().cloned().collect())
    }

    fn find_all_by_client_id(&self, client_id: ClientId) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .accounts
            .values()
            .filter(|account| account.client_id == client_id)
            .cloned()
            .collect())
    }

    fn find_all_by_id(&self, ids: &[AccountId]) -> Result<Vec<Account>, StoreError> {
        self.journal().find_all_by_id(ids)
    }

    fn save(&mut self, account: NewAccount) -> Result<Account, StoreError> {
        self.autocommit(|journal| journal.save(account))
    }

    fn save_all(&mut self, accounts: &[Account]) -> Result<(), StoreError> {
        self.autocommit(|journal| journal.save_all(accounts))
    }
}

impl TransactionStore for Tables {
    fn insert(&mut self, transaction: NewTransaction) -> Result<Transaction, StoreError> {
        self.autocommit(|journal| journal.insert(transaction))
    }

    fn find_page(&self, page: &PageRequest) -> Result<Page<Transaction>, StoreError> {
        Ok(paginate(self.transactions.iter(), page))
    }

    fn find_page_by_participant(
        &self,
        account_id: AccountId,
        page: &PageRequest,
    ) -> Result<Page<Transaction>, StoreError> {
        Ok(paginate(
            self.transactions.iter().filter(|tx| tx.involves(account_id)),
            page,
        ))
    }
}

/// Rows staged by an open unit of work.
struct Changes {
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
    last_account_id: u32,
    last_transaction_id: u64,
}

/// Committed tables overlaid with the rows staged so far.
struct Journal<'a> {
    base: &'a Tables,
    accounts: BTreeMap<AccountId, Account>,
    transactions: Vec<Transaction>,
    last_account_id: u32,
    last_transaction_id: u64,
}

impl Journal<'_> {
    fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id).or_else(|| self.base.accounts.get(&id))
    }

    fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.base
            .accounts
            .values()
            .filter(|account| !self.accounts.contains_key(&account.id))
            .chain(self.accounts.values())
    }

    fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.base.transactions.iter().chain(self.transactions.iter())
    }

    fn into_changes(self) -> Changes {
        Changes {
            accounts: self.accounts.into_values().collect(),
            transactions: self.transactions,
            last_account_id: self.last_account_id,
            last_transaction_id: self.last_transaction_id,
        }
    }
}

impl AccountStore for Journal<'_> {
    fn find_all(&self) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> = self.accounts().cloned().collect();
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }

    fn find_all_by_client_id(&self, client_id: ClientId) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> = self
            .accounts()
            .filter(|account| account.client_id == client_id)
            .cloned()
            .collect();
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }

    fn find_all_by_id(&self, ids: &[AccountId]) -> Result<Vec<Account>, StoreError> {
        let mut found: Vec<Account> = Vec::with_capacity(ids.len());
        for id in ids {
            if found.iter().any(|account| account.id == *id) {
                continue;
            }
            if let Some(account) = self.account(*id) {
                found.push(account.clone());
            }
        }
        Ok(found)
    }

    fn save(&mut self, account: NewAccount) -> Result<Account, StoreError> {
        if self.accounts().any(|existing| existing.number == account.number) {
            return Err(StoreError::DuplicateAccountNumber(account.number));
        }
        let id = self
            .last_account_id
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted("accounts"))?;
        self.last_account_id = id;

        let account = account.with_id(AccountId(id));
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    fn save_all(&mut self, accounts: &[Account]) -> Result<(), StoreError> {
        if let Some(unknown) = accounts.iter().find(|account| self.account(account.id).is_none()) {
            return Err(StoreError::MissingAccount(unknown.id));
        }
        for account in accounts {
            self.accounts.insert(account.id, account.clone());
        }
        Ok(())
    }
}

impl TransactionStore for Journal<'_> {
    fn insert(&mut self, transaction: NewTransaction) -> Result<Transaction, StoreError> {
        let id = self
            .last_transaction_id
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted("transactions"))?;
        self.last_transaction_id = id;

        let transaction = transaction.with_id(TransactionId(id));
        self.transactions.push(transaction.clone());
        Ok(transaction)
    }

    fn find_page(&self, page: &PageRequest) -> Result<Page<Transaction>, StoreError> {
        Ok(paginate(self.transactions(), page))
    }

    fn find_page_by_participant(
        &self,
        account_id: AccountId,
        page: &PageRequest,
    ) -> Result<Page<Transaction>, StoreError> {
        Ok(paginate(
            self.transactions().filter(|tx| tx.involves(account_id)),
            page,
        ))
    }
}

/// Thread-safe in-memory [`Storage`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStore {
    fn read<R>(&self, work: impl FnOnce(&dyn Store) -> R) -> R {
        let tables = self.tables.read();
        work(&*tables)
    }

    fn write<T, E>(&self, work: impl FnOnce(&mut dyn Store) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut tables = self.tables.write();
        let (result, changes) = {
            let mut journal = tables.journal();
            let result = work(&mut journal);
            (result, journal.into_changes())
        };
        // Staged rows of a failed unit of work are dropped here.
        let value = result?;
        tables.apply(changes);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn new_account(client: u32, number: &str, balance: Decimal) -> NewAccount {
        NewAccount {
            client_id: ClientId(client),
            number: number.to_string(),
            balance,
            currency: "EUR".parse().unwrap(),
        }
    }

    fn new_transaction(sender: u32, receiver: u32, date: &str) -> NewTransaction {
        NewTransaction {
            sender_account_id: AccountId(sender),
            receiver_account_id: AccountId(receiver),
            source_amount: dec!(1),
            target_amount: dec!(1),
            transaction_date: date.parse().unwrap(),
        }
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .write(|s| -> Result<(), StoreError> {
                s.save(new_account(1, "ACC-1", dec!(100)))?;
                s.save(new_account(1, "ACC-2", dec!(50)))?;
                s.save(new_account(2, "ACC-3", dec!(10)))?;
                Ok(())
            })
            .unwrap();
        store
    }

    #[test]
    fn save_assigns_sequential_ids() {
        let store = seeded();
        let ids: Vec<AccountId> = store
            .read(|s| s.find_all())
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![AccountId(1), AccountId(2), AccountId(3)]);
    }

    #[test]
    fn duplicate_account_number_is_rejected() {
        let store = seeded();
        let result = store.write(|s| s.save(new_account(5, "ACC-2", dec!(0))));
        assert_eq!(
            result,
            Err(StoreError::DuplicateAccountNumber("ACC-2".to_string()))
        );
    }

    #[test]
    fn find_all_by_id_keeps_request_order_and_skips_unknown() {
        let store = seeded();
        let found = store
            .read(|s| s.find_all_by_id(&[AccountId(3), AccountId(99), AccountId(1), AccountId(3)]))
            .unwrap();
        let ids: Vec<AccountId> = found.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![AccountId(3), AccountId(1)]);
    }

    #[test]
    fn find_all_by_client_id_filters() {
        let store = seeded();
        let accounts = store.read(|s| s.find_all_by_client_id(ClientId(1))).unwrap();
        assert_eq!(accounts.len(), 2);
        assert!(accounts.iter().all(|a| a.client_id == ClientId(1)));
    }

    #[test]
    fn failed_unit_of_work_leaves_no_trace() {
        let store = seeded();

        let result: Result<(), StoreError> = store.write(|s| {
            let mut accounts = s.find_all_by_id(&[AccountId(1), AccountId(2)])?;
            accounts[0].balance -= dec!(40);
            accounts[1].balance += dec!(40);
            s.save_all(&accounts)?;
            s.insert(new_transaction(1, 2, "2024-01-01T00:00:00"))?;
            Err(StoreError::MissingAccount(AccountId(42)))
        });
        assert!(result.is_err());

        let balances: Vec<Decimal> = store
            .read(|s| s.find_all())
            .unwrap()
            .into_iter()
            .map(|a| a.balance)
            .collect();
        assert_eq!(balances, vec![dec!(100), dec!(50), dec!(10)]);

        let page = store
            .read(|s| s.find_page(&PageRequest::new(0, 10).unwrap()))
            .unwrap();
        assert_eq!(page.total_elements(), 0);
    }

    #[test]
    fn unit_of_work_sees_its_own_staged_rows() {
        let store = seeded();
        store
            .write(|s| -> Result<(), StoreError> {
                let mut accounts = s.find_all_by_id(&[AccountId(1)])?;
                accounts[0].balance = dec!(1);
                s.save_all(&accounts)?;
                assert_eq!(s.find_all_by_id(&[AccountId(1)])?[0].balance, dec!(1));

                s.insert(new_transaction(1, 2, "2024-01-01T00:00:00"))?;
                let page = s.find_page_by_participant(AccountId(2), &PageRequest::new(0, 5).unwrap())?;
                assert_eq!(page.total_elements(), 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn save_all_rejects_unknown_account() {
        let store = seeded();
        let mut ghost = store.read(|s| s.find_all_by_id(&[AccountId(1)])).unwrap().remove(0);
        ghost.id = AccountId(77);

        let result = store.write(|s| s.save_all(&[ghost.clone()]));
        assert_eq!(result, Err(StoreError::MissingAccount(AccountId(77))));
    }

    #[test]
    fn participant_query_is_newest_first_and_windowed() {
        let store = seeded();
        store
            .write(|s| -> Result<(), StoreError> {
                s.insert(new_transaction(1, 2, "2024-01-01T00:00:00"))?;
                s.insert(new_transaction(3, 1, "2024-03-01T00:00:00"))?;
                s.insert(new_transaction(2, 3, "2024-02-01T00:00:00"))?;
                s.insert(new_transaction(1, 3, "2024-02-01T00:00:00"))?;
                Ok(())
            })
            .unwrap();

        let page = store
            .read(|s| s.find_page_by_participant(AccountId(1), &PageRequest::new(0, 2).unwrap()))
            .unwrap();
        let ids: Vec<TransactionId> = page.content().iter().map(|tx| tx.id).collect();
        assert_eq!(ids, vec![TransactionId(2), TransactionId(4)]);
        assert_eq!(page.total_elements(), 3);
        assert!(!page.is_last());

        let next = store
            .read(|s| s.find_page_by_participant(AccountId(1), &page.request().next()))
            .unwrap();
        let ids: Vec<TransactionId> = next.content().iter().map(|tx| tx.id).collect();
        assert_eq!(ids, vec![TransactionId(1)]);
        assert!(next.is_last());
    }
}
