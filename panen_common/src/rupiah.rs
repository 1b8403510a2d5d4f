use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const RUPIAH_CURRENCY_CODE: &str = "IDR";

//--------------------------------------       Rupiah        ---------------------------------------------------------
/// An amount of Indonesian rupiah. The rupiah has no minor unit in practice, so amounts are whole numbers.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Rupiah(i64);

op!(binary Rupiah, Add, add);
op!(binary Rupiah, Sub, sub);
op!(inplace Rupiah, AddAssign, add_assign);
op!(inplace Rupiah, SubAssign, sub_assign);
op!(unary Rupiah, Neg, neg);

impl Mul<i64> for Rupiah {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in rupiah: {0}")]
pub struct RupiahConversionError(String);

impl From<i64> for Rupiah {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Rupiah {
    type Error = RupiahConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(RupiahConversionError(format!("Value {value} is too large to convert to Rupiah")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl TryFrom<f64> for Rupiah {
    type Error = RupiahConversionError;

    /// JSON numbers arrive as floats. Only whole, finite amounts are accepted.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
            return Err(RupiahConversionError(format!("{value} is not a whole rupiah amount")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(value as i64))
    }
}

/// Formats with dot thousands separators, e.g. `Rp 240.000`. Do not use this for gateway signatures; use
/// [`Rupiah::value`] instead.
impl Display for Rupiah {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}Rp {grouped}")
    }
}

impl Rupiah {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}
