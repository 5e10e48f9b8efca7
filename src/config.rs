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

//! Application configuration, read from YAML.
//!
//! ```yaml
//! log_level: info
//! use_json: false
//! money: { scale: 10, rounding_mode: HALF_UP }
//! transfer: { allow_negative_balance: false }
//! server: { host: 127.0.0.1, port: 8080 }
//! currency_converter:
//!   provider: fixed
//!   supported_currencies: [EUR, USD]
//!   exchange_rates: { EURUSD: "1.0952" }
//! ```
//!
//! Every section is optional and falls back to its default.

use crate::base::Currency;
use crate::error::ConfigError;
use crate::money::{MAX_SCALE, MoneySettings};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub use_json: bool,
    pub money: MoneySettings,
    pub transfer: TransferSettings,
    pub server: ServerConfig,
    pub currency_converter: CurrencyConverterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            use_json: false,
            money: MoneySettings::default(),
            transfer: TransferSettings::default(),
            server: ServerConfig::default(),
            currency_converter: CurrencyConverterConfig::default(),
        }
    }
}

/// Transfer policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransferSettings {
    /// Accept transfers that leave the sender with a negative balance.
    pub allow_negative_balance: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_connect_timeout_ms() -> u64 {
    2_000
}

fn default_read_timeout_ms() -> u64 {
    5_000
}

/// Which rate provider backs currency conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum CurrencyConverterConfig {
    Fixed {
        #[serde(default)]
        supported_currencies: Vec<Currency>,
        /// Keyed by concatenated pair, e.g. `EURUSD`.
        #[serde(default)]
        exchange_rates: BTreeMap<String, Decimal>,
    },
    ExchangerateHost {
        root_url: String,
        access_key: String,
        #[serde(default = "default_connect_timeout_ms")]
        connect_timeout_ms: u64,
        #[serde(default = "default_read_timeout_ms")]
        read_timeout_ms: u64,
    },
}

impl Default for CurrencyConverterConfig {
    fn default() -> Self {
        Self::Fixed {
            supported_currencies: Vec::new(),
            exchange_rates: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Reads and validates the YAML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.money.scale > MAX_SCALE {
            return Err(ConfigError::Invalid(format!(
                "money scale {} exceeds the maximum of {MAX_SCALE}",
                self.money.scale
            )));
        }
        if let CurrencyConverterConfig::Fixed { exchange_rates, .. } = &self.currency_converter {
            for (pair, rate) in exchange_rates {
                if pair.len() != 6 || !pair.bytes().all(|b| b.is_ascii_uppercase()) {
                    return Err(ConfigError::Invalid(format!(
                        "exchange rate key {pair} is not a currency pair like EURUSD"
                    )));
                }
                if *rate <= Decimal::ZERO {
                    return Err(ConfigError::Invalid(format!(
                        "exchange rate {pair} must be positive"
                    )));
                }
            }
        }
        Ok(())
    }
}
