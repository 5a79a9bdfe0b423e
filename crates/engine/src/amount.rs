use std::{fmt, ops::Mul, str::FromStr};

use bigdecimal::{BigDecimal, Zero};
use sea_orm::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::EngineError;

/// Arbitrary-precision decimal used for purchase quantities and prices.
///
/// Values travel as strings (JSON and SQL parameters) and are stored as the
/// canonical text produced by `Display`, so reading a stored value back yields
/// the same number digit for digit. Parsing accepts any sign; purchases reject
/// non-positive amounts with [`Amount::is_positive`].
///
/// ```rust
/// use engine::Amount;
///
/// let quantity: Amount = "2.53".parse().unwrap();
/// let price: Amount = "2.09".parse().unwrap();
/// assert_eq!((&quantity * &price).to_string(), "5.2877");
/// assert!("two".parse::<Amount>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(BigDecimal);

impl Amount {
    pub fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > BigDecimal::zero()
    }
}

impl From<BigDecimal> for Amount {
    fn from(value: BigDecimal) -> Self {
        Self(value)
    }
}

impl FromStr for Amount {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidAmount("empty amount".to_string()));
        }
        BigDecimal::from_str(trimmed)
            .map(Self)
            .map_err(|_| EngineError::InvalidAmount(format!("not a decimal number: {trimmed}")))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Strip trailing fractional zeros but never turn "100" into "1E+2".
        let normalized = self.0.normalized();
        let (_, scale) = normalized.as_bigint_and_exponent();
        if scale < 0 {
            write!(f, "{}", normalized.with_scale(0))
        } else {
            write!(f, "{normalized}")
        }
    }
}

impl Mul for &Amount {
    type Output = Amount;

    fn mul(self, rhs: &Amount) -> Amount {
        Amount(&self.0 * &rhs.0)
    }
}

impl From<Amount> for Value {
    fn from(value: Amount) -> Self {
        Value::from(value.to_string())
    }
}

impl From<&Amount> for Value {
    fn from(value: &Amount) -> Self {
        Value::from(value.to_string())
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
