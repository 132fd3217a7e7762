pub mod browser;
pub mod offer_page;
pub mod traits;
pub mod types;

pub use browser::ActionLogementBrowserScraper;
pub use offer_page::parse_offer_page;
pub use traits::ListingSource;
pub use types::SearchParams;
