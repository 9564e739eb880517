//! Listing layout locators
//!
//! Centralized CSS selectors for the listing grid and its footer. Scoped
//! selectors are evaluated below the card located by `card`.

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the 1-based slot position in `card`
pub const INDEX_PLACEHOLDER: &str = "{index}";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListingSelectors {
    /// Footer label holding `"<start>-<end> din <total> de produse"`
    pub pagination_label: String,

    /// Card root at a grid position, with an `{index}` placeholder
    pub card: String,

    /// Card attribute carrying the product title
    pub title_attribute: String,

    /// Link/price region inside the card
    pub link_region: String,

    /// Product anchor inside the link region
    pub product_url: String,

    /// Anchor attribute carrying the product URL
    pub url_attribute: String,

    /// Strikethrough price inside the link region
    pub old_price: String,

    /// Current price inside the link region
    pub new_price: String,

    /// Stock status label inside the link region
    pub stock_status: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            pagination_label:
                ".listing-panel > .listing-panel-footer > .row > .col-lg-3 > .control-label"
                    .to_string(),
            card: ".card-item:nth-child({index})".to_string(),
            title_attribute: "data-name".to_string(),
            link_region: ".card-section-wrapper".to_string(),
            product_url: ".card-section-top .js-product-url".to_string(),
            url_attribute: "href".to_string(),
            old_price: ".card-section-btm .product-old-price".to_string(),
            new_price: ".card-section-btm .product-new-price".to_string(),
            stock_status: ".card-section-btm .product-stock-status".to_string(),
        }
    }
}

impl ListingSelectors {
    /// Card selector for 1-based slot `index`
    pub fn card_at(&self, index: u32) -> String {
        self.card.replace(INDEX_PLACEHOLDER, &index.to_string())
    }
}
