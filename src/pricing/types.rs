//! Pricing domain types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a product in the catalog and at the price backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors produced when parsing a price amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price '{0}' is not a decimal amount")]
    Malformed(String),

    #[error("price '{0}' has more than two fractional digits")]
    Precision(String),

    #[error("price '{0}' is negative")]
    Negative(String),

    #[error("price '{0}' is out of range")]
    Overflow(String),
}

/// A non-negative monetary amount with two fractional digits.
///
/// Stored in minor units so arithmetic and comparison are exact. Serialized as a
/// decimal string (`"12.34"`); deserialization also accepts plain JSON/TOML numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PriceRepr", into = "String")]
pub struct Price {
    cents: u64,
}

impl Price {
    pub const fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    pub const fn cents(&self) -> u64 {
        self.cents
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.starts_with('-') {
            return Err(PriceError::Negative(s.to_string()));
        }

        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (text, ""),
        };

        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !is_digits(whole) || !is_digits(fraction) {
            return Err(PriceError::Malformed(s.to_string()));
        }
        if fraction.len() > 2 {
            return Err(PriceError::Precision(s.to_string()));
        }

        let whole: u64 = whole
            .parse()
            .map_err(|_| PriceError::Overflow(s.to_string()))?;
        let fraction: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().unwrap_or_default() * 10,
            _ => fraction.parse().unwrap_or_default(),
        };

        whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .map(Price::from_cents)
            .ok_or_else(|| PriceError::Overflow(s.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceRepr {
    Text(String),
    Integer(u64),
    Float(f64),
}

impl TryFrom<PriceRepr> for Price {
    type Error = PriceError;

    fn try_from(repr: PriceRepr) -> Result<Self, Self::Error> {
        match repr {
            PriceRepr::Text(text) => text.parse(),
            PriceRepr::Integer(whole) => whole
                .checked_mul(100)
                .map(Price::from_cents)
                .ok_or_else(|| PriceError::Overflow(whole.to_string())),
            // Display of an f64 is its shortest exact decimal, never exponent form.
            PriceRepr::Float(value) => value.to_string().parse(),
        }
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.to_string()
    }
}

/// A catalog product. `price` is the stored price served when the live lookup fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
}

/// Where a served price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Fetched from the price backend.
    Live,
    /// The product's stored price, substituted after a failed or short-circuited lookup.
    Fallback,
}

/// A price answer for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub product_id: ProductId,
    pub price: Price,
    pub source: PriceSource,
}
