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

//! Client for the exchangerate.host HTTP API.
//!
//! Every call is a single GET authenticated with an `access_key` query
//! parameter. Responses carry a `success` flag; on failure an `error` object
//! with `code` and `info` explains why.
//!
//! | Call                      | Endpoint                                            |
//! |---------------------------|-----------------------------------------------------|
//! | supported currencies      | `/list`                                             |
//! | current rate              | `/live?source=EUR&currencies=USD`                   |
//! | historical rate           | `/historical?source=EUR&currencies=USD&date=...`    |

use super::RateProvider;
use crate::base::Currency;
use crate::error::ConversionError;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

const LIST_FAILED: &str = "Currency exchange service failed to return list of supported currencies";
const QUOTES_FAILED: &str = "Currency exchange service failed to return quotes";

#[derive(Debug, Deserialize)]
struct CurrencyList {
    #[serde(default)]
    currencies: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Quotes {
    #[serde(default)]
    quotes: BTreeMap<String, serde_json::Number>,
}

/// Live [`RateProvider`] backed by exchangerate.host.
#[derive(Debug, Clone)]
pub struct ExchangeRateHostProvider {
    client: Client,
    root_url: String,
    access_key: String,
}

impl ExchangeRateHostProvider {
    /// Creates a provider for `root_url`, e.g. `http://api.exchangerate.host`.
    ///
    /// `read_timeout` bounds the whole request; an expired timeout surfaces as
    /// a service error.
    pub fn new(
        root_url: impl Into<String>,
        access_key: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()?;

        Ok(Self {
            client,
            root_url: root_url.into().trim_end_matches('/').to_string(),
            access_key: access_key.into(),
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        context: &str,
    ) -> Result<T, ConversionError> {
        let url = format!("{}/{path}", self.root_url);
        debug!(%url, ?query, "Requesting exchange rates");

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("access_key", self.access_key.as_str())])
            .send()
            .await
            .map_err(service_unreachable)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "Currency exchange service returned an error status");
            return Err(ConversionError::Service(format!(
                "Currency exchange service responded with status {status}"
            )));
        }

        let body = response.bytes().await.map_err(service_unreachable)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ConversionError::Service(
                "Currency exchange service response body is missing".to_string(),
            ));
        }

        let body: Map<String, Value> = serde_json::from_slice(&body).map_err(unreadable)?;
        if body.get("success").and_then(Value::as_bool) != Some(true) {
            let error = body.get("error");
            let code = error_field(error, "code");
            let info = error_field(error, "info");
            warn!(%url, %code, %info, "Currency exchange service reported a failure");
            return Err(ConversionError::Service(format!(
                "{context}. Reason code: {code}. Reason description: {info}"
            )));
        }

        serde_json::from_value(Value::Object(body)).map_err(unreadable)
    }
}

fn service_unreachable(error: reqwest::Error) -> ConversionError {
    // The URL carries the access key.
    let error = error.without_url();
    ConversionError::Service(format!("Currency exchange service is unreachable: {error}"))
}

fn unreadable(error: serde_json::Error) -> ConversionError {
    ConversionError::ResultInterpretation(format!(
        "Currency exchange service returned an unreadable response: {error}"
    ))
}

fn error_field(error: Option<&Value>, field: &str) -> String {
    match error.and_then(|error| error.get(field)) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

fn parse_rate(number: &serde_json::Number) -> Result<Decimal, ConversionError> {
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| {
            ConversionError::ResultInterpretation(format!(
                "Currency exchange service returned an unusable rate {text}: {e}"
            ))
        })
}

#[async_trait]
impl RateProvider for ExchangeRateHostProvider {
    fn name(&self) -> &str {
        "exchangerate_host"
    }

    async fn supported_currencies(&self) -> Result<BTreeSet<Currency>, ConversionError> {
        let list: CurrencyList = self.fetch("list", &[], LIST_FAILED).await?;

        let supported: BTreeSet<Currency> = list
            .currencies
            .keys()
            .filter_map(|code| code.parse().ok())
            .collect();
        if supported.is_empty() {
            return Err(ConversionError::ResultInterpretation(
                "Currency exchange service did not return any supported currencies".to_string(),
            ));
        }
        Ok(supported)
    }

    async fn direct_rate(
        &self,
        from: &Currency,
        to: &Currency,
        date: Option<NaiveDate>,
    ) -> Result<Decimal, ConversionError> {
        let mut query = vec![
            ("source", from.to_string()),
            ("currencies", to.to_string()),
        ];
        let path = match date {
            Some(date) => {
                query.push(("date", date.format("%Y-%m-%d").to_string()));
                "historical"
            }
            None => "live",
        };

        let quotes: Quotes = self.fetch(path, &query, QUOTES_FAILED).await?;

        let mut values = quotes.quotes.values();
        match (values.next(), values.next()) {
            (Some(rate), None) => parse_rate(rate),
            (Some(_), Some(_)) => Err(ConversionError::ResultInterpretation(
                "Currency exchange service returned more than one quote".to_string(),
            )),
            (None, _) => Err(ConversionError::ResultInterpretation(
                "Currency exchange service did not return any quotes".to_string(),
            )),
        }
    }
}
