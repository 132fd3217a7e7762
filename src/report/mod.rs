use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::models::ListingRecord;

pub const REPORT_PATH: &str = "housing_offers.md";

const PORTAL_URL: &str = "https://logement-actionlogement.fr";
const MAPS_SEARCH_URL: &str = "https://www.google.com/maps?q=";
const MAPS_DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/?api=1";

/// Addresses in first-seen order, each once
pub fn unique_addresses(records: &[ListingRecord]) -> Vec<&str> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| r.address.as_str())
        .filter(|address| seen.insert(*address))
        .collect()
}

fn elevator_label(has_elevator: Option<bool>) -> &'static str {
    match has_elevator {
        Some(true) => "true",
        Some(false) => "false",
        None => "N/A",
    }
}

fn commute_label(record: &ListingRecord) -> String {
    record
        .commute_time
        .map(|c| c.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Walking route from the workplace through every listed address
fn route_section(records: &[ListingRecord], origin: &str) -> Option<String> {
    let addresses = unique_addresses(records);
    let (destination, waypoints) = addresses.split_first()?;

    let waypoints = waypoints
        .iter()
        .map(|address| urlencoding::encode(address).into_owned())
        .collect::<Vec<_>>()
        .join("|");
    let link = format!(
        "{}&origin={}&destination={}&travelmode=walking&waypoints={}",
        MAPS_DIRECTIONS_URL,
        urlencoding::encode(origin),
        urlencoding::encode(destination),
        waypoints
    );

    Some(format!(
        "\n## Google Maps Routes: [{} places](<{}>)\n\n",
        addresses.len(),
        link
    ))
}

fn offers_table(records: &[ListingRecord]) -> String {
    let mut table = String::from("| Adresse | Size | Commute Time | Price | Elevator | Floor |\n");
    table.push_str("|---------|------|---------|-------|----------|----------|\n");

    for record in records {
        table.push_str(&format!(
            "| [{}]({}{}) | {} m² | {} | {}€ | {} | {} |\n",
            record.address,
            MAPS_SEARCH_URL,
            urlencoding::encode(&record.address),
            record.size,
            commute_label(record),
            record.price,
            elevator_label(record.has_elevator),
            record.floor
        ));
    }

    table
}

/// Markdown report: title, route link, then one table row per listing
pub fn render_markdown(records: &[ListingRecord], workplace_label: &str) -> String {
    let mut markdown = format!("# [Action Logement Offers]({})\n", PORTAL_URL);
    if let Some(route) = route_section(records, workplace_label) {
        markdown.push_str(&route);
    } else {
        markdown.push('\n');
    }
    markdown.push_str(&offers_table(records));
    markdown
}

pub async fn write_report(path: impl AsRef<Path>, content: &str) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!("💾 Saved report to {}", path.display());
    Ok(())
}

/// One log line per listing with every derived field
pub fn log_table(records: &[ListingRecord]) {
    info!("All Action Logement rentals ({} offers):", records.len());
    for (i, r) in records.iter().enumerate() {
        info!(
            "{}. {} | {} m² | {}€ | commute {} | DPE {} | GES {} | elevator {} | \
             {} bedrooms | floor {} | new {} | concierge {} | heating {} | \
             hot water {} | cold water {} | other: {}",
            i + 1,
            r.address,
            r.size,
            r.price,
            commute_label(r),
            r.energy_rating.as_deref().unwrap_or("N/A"),
            r.emission_rating.as_deref().unwrap_or("N/A"),
            elevator_label(r.has_elevator),
            r.bedroom_count,
            r.floor,
            r.is_new_building,
            r.concierge_included,
            r.heating_included,
            r.hot_water_included,
            r.cold_water_included,
            r.features.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommuteTime, RawListing};

    fn record(address: &str, features: &[&str], commute: Option<CommuteTime>) -> ListingRecord {
        let mut record = ListingRecord::from_raw(RawListing {
            reference: None,
            address: address.to_string(),
            size: 45.0,
            price: 1020.5,
            energy_rating: None,
            emission_rating: None,
            description: None,
            features: features.iter().map(|f| f.to_string()).collect(),
        });
        record.commute_time = commute;
        record
    }

    #[test]
    fn test_unique_addresses_first_seen_order() {
        let records = vec![
            record("B", &[], None),
            record("A", &[], None),
            record("B", &[], None),
            record("C", &[], None),
        ];
        assert_eq!(unique_addresses(&records), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_route_link_encodes_and_dedupes() {
        let records = vec![
            record("3 Rue A, Paris", &[], None),
            record("5 Rue B, Paris", &[], None),
            record("3 Rue A, Paris", &[], None),
            record("7 Rue C, Paris", &[], None),
        ];
        let markdown = render_markdown(&records, "EPEX SPOT Paris");

        assert!(markdown
            .starts_with("# [Action Logement Offers](https://logement-actionlogement.fr)\n"));
        assert!(markdown.contains("[3 places]"));
        assert!(markdown.contains("origin=EPEX%20SPOT%20Paris"));
        assert!(markdown.contains("destination=3%20Rue%20A%2C%20Paris"));
        assert!(markdown.contains("waypoints=5%20Rue%20B%2C%20Paris|7%20Rue%20C%2C%20Paris>"));
    }

    #[test]
    fn test_table_rows() {
        let records = vec![
            record("1 Rue X", &["floor 2", "elevator"], Some(CommuteTime::Minutes(22))),
            record("2 Rue Y", &[], Some(CommuteTime::Unknown)),
        ];
        let markdown = render_markdown(&records, "Work");

        assert!(markdown.contains(
            "| [1 Rue X](https://www.google.com/maps?q=1%20Rue%20X) \
             | 45 m² | 22m | 1020.5€ | true | 2 |"
        ));
        assert!(markdown.contains(
            "| [2 Rue Y](https://www.google.com/maps?q=2%20Rue%20Y) \
             | 45 m² | >10m walk or >70 | 1020.5€ | N/A | -1 |"
        ));
    }

    #[test]
    fn test_empty_report_has_no_route() {
        let markdown = render_markdown(&[], "Work");
        assert!(!markdown.contains("Google Maps Routes"));
        assert!(markdown.contains("| Adresse |"));
    }

    #[tokio::test]
    async fn test_write_report() {
        let path = std::env::temp_dir()
            .join(format!("logement_scout_report_{}.md", std::process::id()));
        write_report(&path, "# hello\n").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "# hello\n");
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
