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

//! Currency rate providers.
//!
//! The transfer engine only depends on [`RateProvider`]. Which implementation
//! backs it is decided once at startup by [`from_config`].

mod exchangerate_host;
mod fixed;

pub use exchangerate_host::ExchangeRateHostProvider;
pub use fixed::FixedRateProvider;

use crate::base::Currency;
use crate::config::CurrencyConverterConfig;
use crate::error::{ConfigError, ConversionError};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Source of exchange rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Every currency the provider can convert from or to.
    async fn supported_currencies(&self) -> Result<BTreeSet<Currency>, ConversionError>;

    /// Units of `to` bought by one unit of `from`.
    ///
    /// With `date` set the historical rate of that day is returned, otherwise
    /// the current one.
    async fn direct_rate(
        &self,
        from: &Currency,
        to: &Currency,
        date: Option<NaiveDate>,
    ) -> Result<Decimal, ConversionError>;
}

/// Builds the provider selected in configuration.
pub fn from_config(config: &CurrencyConverterConfig) -> Result<Arc<dyn RateProvider>, ConfigError> {
    let provider: Arc<dyn RateProvider> = match config {
        CurrencyConverterConfig::Fixed {
            supported_currencies,
            exchange_rates,
        } => Arc::new(FixedRateProvider::new(
            supported_currencies.iter().cloned(),
            exchange_rates.clone(),
        )),
        CurrencyConverterConfig::ExchangerateHost {
            root_url,
            access_key,
            connect_timeout_ms,
            read_timeout_ms,
        } => Arc::new(
            ExchangeRateHostProvider::new(
                root_url.clone(),
                access_key.clone(),
                Duration::from_millis(*connect_timeout_ms),
                Duration::from_millis(*read_timeout_ms),
            )
            .map_err(|e| ConfigError::Invalid(format!("cannot build HTTP client: {e}")))?,
        ),
    };

    info!(provider = provider.name(), "Currency rate provider selected");
    Ok(provider)
}
