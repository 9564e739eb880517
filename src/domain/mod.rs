//! Domain module - Core business logic and entities
//!
//! Pure, I/O-free pieces of the crawler: the product model, listing URL scheme,
//! pagination arithmetic and the price / stock-status text parsers.

pub mod category;
pub mod events;
pub mod pagination;
pub mod price;
pub mod product;
pub mod stock_status;

// Re-export commonly used items
pub use category::{Category, CategoryError};
pub use events::SchedulerEvent;
pub use pagination::{PaginationInfo, PaginationLabelError};
pub use price::{PriceParseError, parse_old_price, parse_price};
pub use product::{Availability, Product, StockInfo};
pub use stock_status::parse_stock_status;
