//! Listing-page fixtures shared by the integration tests
//!
//! Builds HTML in the target site's listing layout: a grid of `.card-item`
//! slots and the footer pagination label.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::Path;

use catalog_crawler::AppConfig;
use catalog_crawler::domain::Category;
use catalog_crawler::infrastructure::config::Engine;

#[derive(Debug, Clone)]
pub struct CardFixture {
    pub title: String,
    pub href: Option<String>,
    pub price: String,
    pub old_price: Option<String>,
    pub stock: Option<String>,
}

impl CardFixture {
    /// Price is given as `(major, minor)` and rendered the way the site does,
    /// with the minor units in a superscript
    pub fn new(title: &str, major: &str, minor: u32) -> Self {
        Self {
            title: title.to_string(),
            href: Some(format!("/{}/pd/D{}/", slug(title), minor)),
            price: format!("{major}<sup>{minor:02}</sup> <span>Lei</span>"),
            old_price: None,
            stock: Some("În stoc".to_string()),
        }
    }

    pub fn old_price(mut self, major: &str, minor: u32) -> Self {
        self.old_price = Some(format!("<s>{major}<sup>{minor:02}</sup> Lei</s>"));
        self
    }

    pub fn stock(mut self, text: Option<&str>) -> Self {
        self.stock = text.map(str::to_string);
        self
    }
}

#[derive(Debug, Clone)]
pub enum Slot {
    Product(CardFixture),
    /// Promotional tile occupying a grid position
    Ad,
}

fn slug(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

/// Products `first..=last` named `{prefix} {n}`, priced `{n}9,99 Lei`
pub fn numbered(prefix: &str, first: u32, last: u32) -> Vec<Slot> {
    (first..=last)
        .map(|n| Slot::Product(CardFixture::new(&format!("{prefix} {n}"), &format!("{n}9"), 99)))
        .collect()
}

pub fn listing_page(label: Option<&str>, slots: &[Slot]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html><html><head><title>Listing</title></head><body>\n\
         <div class=\"listing-panel\">\n<div class=\"card-collection\">\n",
    );

    for slot in slots {
        match slot {
            Slot::Ad => html.push_str(
                "<div class=\"card-item card-promo\"><a href=\"/campanie\">Oferte</a></div>\n",
            ),
            Slot::Product(card) => {
                let link = card.href.as_ref().map_or_else(String::new, |href| {
                    format!("<a class=\"js-product-url\" href=\"{href}\">{}</a>", card.title)
                });
                let old = card.old_price.as_ref().map_or_else(String::new, |old| {
                    format!("<p class=\"product-old-price\">{old}</p>")
                });
                let stock = card.stock.as_ref().map_or_else(String::new, |stock| {
                    format!("<p class=\"product-stock-status\">{stock}</p>")
                });
                let _ = write!(
                    html,
                    "<div class=\"card-item\" data-name=\"{title}\">\
                       <div class=\"card-section-wrapper\">\
                         <div class=\"card-section-top\">{link}</div>\
                         <div class=\"card-section-btm\">{old}\
                           <p class=\"product-new-price\">{price}</p>{stock}\
                         </div>\
                       </div>\
                     </div>\n",
                    title = card.title,
                    price = card.price,
                );
            }
        }
    }

    html.push_str("</div>\n<div class=\"listing-panel-footer\"><div class=\"row\">");
    if let Some(label) = label {
        let _ = write!(
            html,
            "<div class=\"col-lg-3\"><span class=\"control-label\">{label}</span></div>"
        );
    }
    html.push_str("</div></div>\n</div></body></html>\n");
    html
}

/// Save `html` where the snapshot engine looks for `key` (a URL path)
pub fn write_snapshot(root: &Path, key: &str, html: &str) {
    let path = root.join(format!("{key}.html"));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, html).unwrap();
}

/// Config crawling `categories` from snapshots, exporting to `output`
pub fn snapshot_config(snapshots: &Path, output: &Path, categories: &[&str]) -> AppConfig {
    let mut config = AppConfig::default();
    config.browser.engine = Engine::Snapshot;
    config.browser.snapshot_dir = Some(snapshots.to_path_buf());
    config.output.directory = output.to_path_buf();
    config.output.pretty = false;
    config.crawl.categories = categories
        .iter()
        .map(|c| Category::new(*c).unwrap())
        .collect();
    config
}
