//! Action Logement rental scout: scrape offers, parse their feature lists,
//! attach commute times and write a Markdown report.

pub mod commute;
pub mod config;
pub mod extraction;
pub mod models;
pub mod report;
pub mod scrapers;
