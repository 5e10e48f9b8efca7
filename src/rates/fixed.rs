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

//! Static rate table, for local runs and tests.

use super::RateProvider;
use crate::base::Currency;
use crate::error::ConversionError;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// Rates keyed by the concatenated pair, e.g. `EURUSD`. Dates are ignored.
#[derive(Debug, Clone, Default)]
pub struct FixedRateProvider {
    supported: BTreeSet<Currency>,
    rates: BTreeMap<String, Decimal>,
}

impl FixedRateProvider {
    pub fn new(
        supported: impl IntoIterator<Item = Currency>,
        rates: BTreeMap<String, Decimal>,
    ) -> Self {
        Self {
            supported: supported.into_iter().collect(),
            rates,
        }
    }

    /// Adds or replaces the `from`→`to` rate and marks both as supported.
    pub fn with_rate(mut self, from: &Currency, to: &Currency, rate: Decimal) -> Self {
        self.supported.insert(from.clone());
        self.supported.insert(to.clone());
        self.rates.insert(pair(from, to), rate);
        self
    }
}

fn pair(from: &Currency, to: &Currency) -> String {
    format!("{from}{to}")
}

#[async_trait]
impl RateProvider for FixedRateProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn supported_currencies(&self) -> Result<BTreeSet<Currency>, ConversionError> {
        Ok(self.supported.clone())
    }

    async fn direct_rate(
        &self,
        from: &Currency,
        to: &Currency,
        _date: Option<NaiveDate>,
    ) -> Result<Decimal, ConversionError> {
        let key = pair(from, to);
        self.rates.get(&key).copied().ok_or_else(|| {
            ConversionError::ResultInterpretation(format!("No exchange rate configured for {key}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn currency(code: &str) -> Currency {
        code.parse().unwrap()
    }

    #[tokio::test]
    async fn returns_configured_rate() {
        let provider =
            FixedRateProvider::default().with_rate(&currency("EUR"), &currency("USD"), dec!(1.0952));

        let rate = provider
            .direct_rate(&currency("EUR"), &currency("USD"), None)
            .await
            .unwrap();
        assert_eq!(rate, dec!(1.0952));

        let supported = provider.supported_currencies().await.unwrap();
        assert_eq!(supported.len(), 2);
    }

    #[tokio::test]
    async fn missing_pair_is_an_interpretation_error() {
        let provider = FixedRateProvider::new([currency("EUR"), currency("USD")], BTreeMap::new());

        let error = provider
            .direct_rate(&currency("USD"), &currency("EUR"), None)
            .await
            .unwrap_err();
        assert_eq!(
            error,
            ConversionError::ResultInterpretation("No exchange rate configured for USDEUR".to_string())
        );
    }
}
