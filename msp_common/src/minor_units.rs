use std::{
    fmt::Display,
    iter::Sum,
    ops::Mul,
};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::newtype_ops;

pub const EURO_CURRENCY_CODE: &str = "EUR";

//--------------------------------------     MinorUnits       ---------------------------------------------------------
/// A currency amount in the smallest denomination of its currency (e.g. euro cents).
///
/// All amounts that cross the wire to MultiSafepay, and all persisted payment amounts, are expressed in minor units.
/// Prices coming from the order itself are decimal major units and are converted with [`MinorUnits::from_major`].
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MinorUnits(i64);

newtype_ops!(MinorUnits; Add::add, Sub::sub; AddAssign::add_assign, SubAssign::sub_assign; Neg::neg);

impl Mul<i64> for MinorUnits {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for MinorUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |total, x| total + x)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in minor units: {0}")]
pub struct MinorUnitsConversionError(String);

impl From<i64> for MinorUnits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for MinorUnits {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for MinorUnits {}

impl TryFrom<Decimal> for MinorUnits {
    type Error = MinorUnitsConversionError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_major(value)
    }
}

impl Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.to_major())
    }
}

impl MinorUnits {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Converts a major-unit amount to minor units, i.e. `round(major × 100)`. Midpoints round away from zero.
    pub fn from_major(major: Decimal) -> Result<Self, MinorUnitsConversionError> {
        let scaled = major * Decimal::ONE_HUNDRED;
        scaled
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
            .ok_or_else(|| MinorUnitsConversionError(format!("{major} is out of range")))
    }

    pub fn to_major(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}
