//! Price Quote Types
//!
//! Domain types for a set of asset quotes in the shape the upstream price
//! source serves them: `{ "bitcoin": { "usd": 50000 }, ... }`.
//!
//! # Ordering
//!
//! Key order is preserved end to end. The order in which a payload lists
//! its assets is the order the JSON endpoint echoes them back and the order
//! in which the chart draws its bars. Both [`Quote`] and [`PriceQuoteSet`]
//! are therefore backed by vectors rather than hash maps, with hand-written
//! serde impls that read and write JSON objects.
//!
//! # Prices
//!
//! Prices are kept as the JSON numbers the upstream sent, so an integer
//! price is echoed back as an integer. They become `f64` only when a chart
//! series is built.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;

// =============================================================================
// Types
// =============================================================================

/// Upstream identifier of an asset (`"bitcoin"`, `"shiba-inu"`).
pub type AssetId = String;

/// Lowercase currency code a price is quoted in (`"usd"`).
pub type CurrencyCode = String;

/// A price exactly as the upstream wrote it.
pub type Price = Number;

/// Prices of a single asset, keyed by currency code.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Quote {
    prices: Vec<(CurrencyCode, Price)>,
}

impl Quote {
    /// Create an empty quote.
    #[must_use]
    pub const fn new() -> Self {
        Self { prices: Vec::new() }
    }

    /// Add or replace the price in `currency`.
    #[must_use]
    pub fn with_price(
        mut self,
        currency: impl Into<CurrencyCode>,
        price: impl Into<Price>,
    ) -> Self {
        self.set_price(currency, price);
        self
    }

    /// Set the price in `currency`, keeping the position of an existing entry.
    pub fn set_price(&mut self, currency: impl Into<CurrencyCode>, price: impl Into<Price>) {
        let currency = currency.into();
        let price = price.into();
        match self.prices.iter_mut().find(|(code, _)| *code == currency) {
            Some(entry) => entry.1 = price,
            None => self.prices.push((currency, price)),
        }
    }

    /// Price in the given currency as upstream wrote it, if quoted.
    #[must_use]
    pub fn raw_price(&self, currency: &str) -> Option<&Price> {
        self.prices
            .iter()
            .find(|(code, _)| code == currency)
            .map(|(_, price)| price)
    }

    /// Price in the given currency, if quoted.
    #[must_use]
    pub fn price(&self, currency: &str) -> Option<f64> {
        self.raw_price(currency).and_then(Number::as_f64)
    }

    /// Currencies this quote carries, in payload order.
    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.prices.iter().map(|(code, _)| code.as_str())
    }

    /// Whether the quote carries no prices at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Ordered mapping from asset to quote.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceQuoteSet {
    quotes: Vec<(AssetId, Quote)>,
}

impl PriceQuoteSet {
    /// Create an empty quote set.
    #[must_use]
    pub const fn new() -> Self {
        Self { quotes: Vec::new() }
    }

    /// Insert a quote. Re-inserting an asset replaces its quote in place.
    pub fn insert(&mut self, asset: impl Into<AssetId>, quote: Quote) {
        let asset = asset.into();
        match self.quotes.iter_mut().find(|(id, _)| *id == asset) {
            Some(entry) => entry.1 = quote,
            None => self.quotes.push((asset, quote)),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_quote(mut self, asset: impl Into<AssetId>, quote: Quote) -> Self {
        self.insert(asset, quote);
        self
    }

    /// Quote for an asset.
    #[must_use]
    pub fn get(&self, asset: &str) -> Option<&Quote> {
        self.quotes
            .iter()
            .find(|(id, _)| id == asset)
            .map(|(_, quote)| quote)
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Whether the set holds no assets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Iterate `(asset, quote)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Quote)> {
        self.quotes.iter().map(|(id, quote)| (id.as_str(), quote))
    }

    /// Asset identifiers in insertion order.
    pub fn asset_ids(&self) -> impl Iterator<Item = &str> {
        self.quotes.iter().map(|(id, _)| id.as_str())
    }

    /// First asset that has no price in `currency`.
    #[must_use]
    pub fn first_missing_price(&self, currency: &str) -> Option<&str> {
        self.iter()
            .find(|(_, quote)| quote.price(currency).is_none())
            .map(|(id, _)| id)
    }

    /// Label and value sequences for one currency, in insertion order.
    ///
    /// Assets without a price in `currency` are left out.
    #[must_use]
    pub fn series(&self, currency: &str) -> ChartSeries {
        let mut series = ChartSeries {
            currency: currency.to_string(),
            labels: Vec::with_capacity(self.len()),
            values: Vec::with_capacity(self.len()),
        };
        for (asset, quote) in self.iter() {
            if let Some(price) = quote.price(currency) {
                series.labels.push(asset.to_string());
                series.values.push(price);
            }
        }
        series
    }
}

/// Parallel label/value sequences used to draw a bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    /// Currency the values are quoted in.
    pub currency: CurrencyCode,
    /// Asset identifiers (x axis).
    pub labels: Vec<String>,
    /// Prices (y axis).
    pub values: Vec<f64>,
}

impl ChartSeries {
    /// Number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the series has no bars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Largest value, or zero for an empty series.
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for Quote {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.prices.len()))?;
        for (currency, price) in &self.prices {
            map.serialize_entry(currency, price)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Quote {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuoteVisitor;

        impl<'de> Visitor<'de> for QuoteVisitor {
            type Value = Quote;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping currency codes to prices")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Quote, A::Error> {
                let mut quote = Quote::new();
                while let Some((currency, price)) = access.next_entry::<CurrencyCode, Price>()? {
                    quote.set_price(currency, price);
                }
                Ok(quote)
            }
        }

        deserializer.deserialize_map(QuoteVisitor)
    }
}

impl Serialize for PriceQuoteSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.quotes.len()))?;
        for (asset, quote) in &self.quotes {
            map.serialize_entry(asset, quote)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PriceQuoteSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuoteSetVisitor;

        impl<'de> Visitor<'de> for QuoteSetVisitor {
            type Value = PriceQuoteSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping asset ids to quotes")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> Result<PriceQuoteSet, A::Error> {
                let mut set = PriceQuoteSet::new();
                while let Some((asset, quote)) = access.next_entry::<AssetId, Quote>()? {
                    set.insert(asset, quote);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(QuoteSetVisitor)
    }
}

// =============================================================================
// Tests
// =============================================================================
