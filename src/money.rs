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

//! Money scale and rounding.
//!
//! Every amount that is persisted or returned goes through
//! [`MoneySettings::normalize`], so two amounts compare equal exactly when
//! they are equal at the configured scale.
//!
//! # Example
//!
//! ```
//! use account_app_rs::{MoneySettings, RoundingMode};
//! use rust_decimal_macros::dec;
//!
//! let money = MoneySettings::new(2, RoundingMode::HalfUp);
//! assert_eq!(money.normalize(dec!(1.005)).to_string(), "1.01");
//! assert_eq!(money.normalize(dec!(7)).to_string(), "7.00");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Largest scale a [`Decimal`] can carry.
pub const MAX_SCALE: u32 = 28;

/// Rounding modes, named the way money settings are usually written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundingMode {
    Up,
    Down,
    Ceiling,
    Floor,
    HalfUp,
    HalfDown,
    HalfEven,
}

impl RoundingMode {
    pub fn strategy(self) -> RoundingStrategy {
        match self {
            Self::Up => RoundingStrategy::AwayFromZero,
            Self::Down => RoundingStrategy::ToZero,
            Self::Ceiling => RoundingStrategy::ToPositiveInfinity,
            Self::Floor => RoundingStrategy::ToNegativeInfinity,
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Self::HalfDown => RoundingStrategy::MidpointTowardZero,
            Self::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// Fixed scale and rounding mode applied to all monetary amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneySettings {
    pub scale: u32,
    pub rounding_mode: RoundingMode,
}

impl MoneySettings {
    pub const fn new(scale: u32, rounding_mode: RoundingMode) -> Self {
        Self {
            scale,
            rounding_mode,
        }
    }

    /// Returns `true` if `amount` has no more fractional digits than the
    /// scale. Trailing zeros count: `1.50` has two fractional digits.
    pub fn fits_scale(&self, amount: Decimal) -> bool {
        amount.scale() <= self.scale
    }

    /// Rounds `amount` with the rounding mode and pads it to exactly
    /// `scale` fractional digits.
    ///
    /// Values too large to carry `scale` digits keep a smaller scale; use
    /// [`MoneySettings::checked_normalize`] for anything that gets persisted.
    pub fn normalize(&self, amount: Decimal) -> Decimal {
        let mut normalized = amount.round_dp_with_strategy(self.scale, self.rounding_mode.strategy());
        normalized.rescale(self.scale);
        normalized
    }

    /// Like [`MoneySettings::normalize`], but returns `None` when `amount`
    /// cannot be represented with exactly `scale` fractional digits.
    pub fn checked_normalize(&self, amount: Decimal) -> Option<Decimal> {
        let normalized = self.normalize(amount);
        (normalized.scale() == self.scale).then_some(normalized)
    }

    /// Divides `amount` by `divisor` and normalizes the quotient.
    ///
    /// Returns `None` for a zero divisor or a quotient that overflows or
    /// does not fit the scale.
    pub fn divide(&self, amount: Decimal, divisor: Decimal) -> Option<Decimal> {
        amount
            .checked_div(divisor)
            .and_then(|quotient| self.checked_normalize(quotient))
    }
}

impl Default for MoneySettings {
    fn default() -> Self {
        Self::new(10, RoundingMode::HalfUp)
    }
}
