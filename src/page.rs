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

//! Offset/limit pagination.
//!
//! Pages are addressed by row offset, not by page index. The page number is
//! derived (`offset / limit`), so an offset that is not a multiple of the
//! limit still yields a valid page.
//!
//! # Example
//!
//! ```
//! use account_app_rs::PageRequest;
//!
//! let request = PageRequest::new(20, 10).unwrap();
//! assert_eq!(request.page_number(), 2);
//! assert_eq!(request.next().offset(), 30);
//! assert_eq!(request.previous_or_first().offset(), 10);
//! ```

use crate::error::ValidationError;
use serde::ser::{Serialize, SerializeStruct, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    TransactionDate,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Ordering requested by the caller. Ties on `field` are broken by id in
/// the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Sort {
    /// Most recent transfers first.
    pub const NEWEST_FIRST: Sort = Sort {
        field: SortField::TransactionDate,
        direction: SortDirection::Desc,
    };
}

/// A row window into an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: u64,
    limit: u32,
    sort: Sort,
}

impl PageRequest {
    /// Creates a request sorted newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPageLimit`] if `limit` is zero.
    pub fn new(offset: u64, limit: u32) -> Result<Self, ValidationError> {
        if limit == 0 {
            return Err(ValidationError::InvalidPageLimit);
        }
        Ok(Self {
            offset,
            limit,
            sort: Sort::NEWEST_FIRST,
        })
    }

    pub fn sorted_by(self, sort: Sort) -> Self {
        Self { sort, ..self }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    pub fn page_number(&self) -> u64 {
        self.offset / u64::from(self.limit)
    }

    pub fn next(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(u64::from(self.limit)),
            ..*self
        }
    }

    pub fn previous_or_first(&self) -> Self {
        Self {
            offset: self.offset.saturating_sub(u64::from(self.limit)),
            ..*self
        }
    }

    pub fn first(&self) -> Self {
        Self { offset: 0, ..*self }
    }

    pub fn with_page(&self, page_number: u64) -> Self {
        Self {
            offset: page_number.saturating_mul(u64::from(self.limit)),
            ..*self
        }
    }

    pub fn has_previous(&self) -> bool {
        self.offset > 0
    }
}

/// One window of results plus the size of the whole result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    content: Vec<T>,
    request: PageRequest,
    total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            request,
            total_elements,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn request(&self) -> PageRequest {
        self.request
    }

    pub fn offset(&self) -> u64 {
        self.request.offset()
    }

    pub fn page_size(&self) -> u32 {
        self.request.limit()
    }

    pub fn page_number(&self) -> u64 {
        self.request.page_number()
    }

    pub fn total_pages(&self) -> u64 {
        self.total_elements.div_ceil(u64::from(self.request.limit()))
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn is_first(&self) -> bool {
        !self.request.has_previous()
    }

    pub fn is_last(&self) -> bool {
        self.offset().saturating_add(self.content.len() as u64) >= self.total_elements
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            request: self.request,
            total_elements: self.total_elements,
        }
    }
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Page", 9)?;
        state.serialize_field("content", &self.content)?;
        state.serialize_field("offset", &self.offset())?;
        state.serialize_field("pageSize", &self.page_size())?;
        state.serialize_field("pageNumber", &self.page_number())?;
        state.serialize_field("totalPages", &self.total_pages())?;
        state.serialize_field("numberOfElements", &self.number_of_elements())?;
        state.serialize_field("totalElements", &self.total_elements())?;
        state.serialize_field("isFirst", &self.is_first())?;
        state.serialize_field("isLast", &self.is_last())?;
        state.end()
    }
}
