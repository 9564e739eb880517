use serde::{Deserialize, Serialize};

/// Availability states a listing card can advertise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    Available,
    Limited,
    Unavailable,
    PreOrder,
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "AVAILABLE"),
            Self::Limited => write!(f, "LIMITED"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::PreOrder => write!(f, "PRE_ORDER"),
        }
    }
}

/// Classified stock status of one product.
///
/// At most one of `items_left_on_stock` / `estimated_delivery_days` is populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StockInfo {
    pub availability: Availability,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub items_left_on_stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub estimated_delivery_days: Option<u32>,
}

impl StockInfo {
    pub const fn new(availability: Availability) -> Self {
        Self {
            availability,
            items_left_on_stock: None,
            estimated_delivery_days: None,
        }
    }

    pub const fn with_items_left(mut self, items: Option<u32>) -> Self {
        self.items_left_on_stock = items;
        self
    }

    pub const fn with_delivery_days(mut self, days: Option<u32>) -> Self {
        self.estimated_delivery_days = days;
        self
    }
}

/// Product basic information from listing pages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub title: String,
    pub url: Option<String>,
    /// Current price in major currency units
    pub price: f64,
    /// Strikethrough price, only when the listing shows a discount
    pub old_price: Option<f64>,
    pub stock_info: Option<StockInfo>,
}

impl Product {
    /// Discount in major units when an old price is shown above the current one
    pub fn discount(&self) -> Option<f64> {
        self.old_price
            .filter(|old| *old > self.price)
            .map(|old| old - self.price)
    }
}
