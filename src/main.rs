use logement_scout::commute::{merge_commute_times, CommuteLookup, CommuteService};
use logement_scout::config::Config;
use logement_scout::models::ListingRecord;
use logement_scout::report::{self, REPORT_PATH};
use logement_scout::scrapers::{ActionLogementBrowserScraper, ListingSource, SearchParams};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LISTINGS_PATH: &str = "scraped_listings.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "logement_scout=info".into()),
        )
        .init();

    info!("🏠 Logement Scout - Action Logement Browser Scraper");
    info!("====================================================");

    let config = Config::from_env()?;
    let commute = CommuteService::from_config(&config)?;

    // Create browser scraper
    let scraper = ActionLogementBrowserScraper::new(
        config.portal.clone(),
        config.headless,
        SearchParams::default(),
    )?;

    info!("Starting browser-based scrape from {}...", scraper.source_name());
    let raw_listings = scraper.scrape().await?;

    let mut records: Vec<ListingRecord> = raw_listings
        .into_iter()
        .map(ListingRecord::from_raw)
        .collect();
    info!("✅ Scraped {} offers", records.len());

    let addresses: Vec<String> = records.iter().map(|r| r.address.clone()).collect();
    let minutes = commute.commute_times(&addresses).await;
    merge_commute_times(&mut records, &minutes);
    info!("Added commute times to offers.");

    report::log_table(&records);

    let markdown = report::render_markdown(&records, &config.travel_time.workplace.label);
    report::write_report(REPORT_PATH, &markdown).await?;

    let json = serde_json::to_string_pretty(&records)?;
    tokio::fs::write(LISTINGS_PATH, json).await?;
    info!("💾 Saved all offers to {}", LISTINGS_PATH);

    Ok(())
}
