use anyhow::{bail, Result};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use crate::models::{RawListing, UNPARSED};

static LODGING_INFO: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.als-lodging-information").unwrap());
static REFERENCE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p.reference").unwrap());
static ADDRESS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p.address").unwrap());
static LOCATION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p.location").unwrap());
static PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("fa-offer-apply p.price > span.amount").unwrap());
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("fa-description").unwrap());
static FEATURES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul.features-list > li > span.text").unwrap());
static DIAGNOSTICS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("fa-heating-diagnostic > div.dpe-item").unwrap());
static DIAGNOSTIC_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.dpe-label").unwrap());
static DIAGNOSTIC_VALUE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());

/// Element text with runs of whitespace collapsed to one space
fn text(element: ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(root: ElementRef, selector: &Selector) -> Option<String> {
    root.select(selector)
        .next()
        .map(text)
        .filter(|t| !t.is_empty())
}

/// Leading decimal number of `raw`, ignoring spaces used as thousand separators.
///
/// "1 020,50" → 1020.5, "45 m²" → 45. Anything unreadable is `UNPARSED`.
pub fn parse_amount(raw: &str) -> f64 {
    let numeric: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    numeric.replace(',', ".").parse().unwrap_or(UNPARSED)
}

/// Leading integer of the results counter, e.g. "12 offres" → 12
pub fn parse_offer_count(raw: &str) -> usize {
    raw.split_whitespace()
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// Extract the raw listing fields from a captured offer page
pub fn parse_offer_page(html: &str) -> Result<RawListing> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let Some(street) = first_text(root, &ADDRESS) else {
        bail!("Offer page has no address");
    };
    let address = match first_text(root, &LOCATION) {
        Some(location) => format!("{}, {}", street, location),
        None => street,
    };

    // "Appartement T2 - 45 m²": size is the last dash-separated part
    let size = first_text(root, &LODGING_INFO)
        .and_then(|info| info.rsplit('-').next().map(parse_amount))
        .unwrap_or(UNPARSED);

    let price = first_text(root, &PRICE)
        .and_then(|p| p.split('€').next().map(parse_amount))
        .unwrap_or(UNPARSED);

    let description = root
        .select(&DESCRIPTION)
        .map(text)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    let features: Vec<String> = root
        .select(&FEATURES)
        .map(text)
        .filter(|f| !f.is_empty())
        .collect();

    let mut energy_rating = None;
    let mut emission_rating = None;
    for item in root.select(&DIAGNOSTICS) {
        let Some(value) = first_text(item, &DIAGNOSTIC_VALUE) else {
            continue;
        };
        // "Non soumis" / "Non communiqué"
        if value.contains("Non") {
            continue;
        }
        let label = first_text(item, &DIAGNOSTIC_LABEL).unwrap_or_default();
        if label.contains("DPE") {
            energy_rating = Some(value);
        } else {
            emission_rating = Some(value);
        }
    }

    debug!("Parsed offer at {} with {} features", address, features.len());

    Ok(RawListing {
        reference: first_text(root, &REFERENCE),
        address,
        size,
        price,
        energy_rating,
        emission_rating,
        description: (!description.is_empty()).then_some(description),
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFER_PAGE: &str = r#"
        <html><body>
          <div class="offer-infos">
            <div class="als-lodging-information">Appartement T2 - 45,5 m²</div>
            <p class="reference">Réf. 2024-00123</p>
            <p class="address">12 RUE D ALESIA</p>
            <p class="location">Paris 14e Arrondissement (75014)</p>
            <fa-description><p>Bel appartement lumineux.</p></fa-description>
            <fa-description><p>Proche métro.</p></fa-description>
            <ul class="features-list">
              <li><span class="icon"></span><span class="text">Etage 3</span></li>
              <li><span class="icon"></span><span class="text"> Ascenseur </span></li>
              <li><span class="icon"></span><span class="text">Cave</span></li>
            </ul>
            <fa-heating-diagnostic>
              <div class="dpe-item"><p class="dpe-label">DPE</p><span>C</span></div>
              <div class="dpe-item"><p class="dpe-label">GES</p><span>Non soumis</span></div>
            </fa-heating-diagnostic>
          </div>
          <fa-offer-apply>
            <p class="price"><span class="amount">1&nbsp;020 €</span></p>
          </fa-offer-apply>
        </body></html>
    "#;

    #[test]
    fn test_parse_offer_page() {
        let raw = parse_offer_page(OFFER_PAGE).unwrap();

        assert_eq!(raw.reference.as_deref(), Some("Réf. 2024-00123"));
        assert_eq!(raw.address, "12 RUE D ALESIA, Paris 14e Arrondissement (75014)");
        assert_eq!(raw.size, 45.5);
        assert_eq!(raw.price, 1020.0);
        assert_eq!(raw.description.as_deref(), Some("Bel appartement lumineux.\nProche métro."));
        assert_eq!(raw.features, vec!["Etage 3", "Ascenseur", "Cave"]);
        assert_eq!(raw.energy_rating.as_deref(), Some("C"));
        assert_eq!(raw.emission_rating, None);
    }

    #[test]
    fn test_missing_address_is_an_error() {
        let html = r#"<html><body><p class="location">Paris</p></body></html>"#;
        assert!(parse_offer_page(html).is_err());
    }

    #[test]
    fn test_missing_numbers_use_placeholder() {
        let html = r#"<html><body><p class="address">1 Rue X</p>
            <div class="als-lodging-information">Studio</div></body></html>"#;
        let raw = parse_offer_page(html).unwrap();

        assert_eq!(raw.address, "1 Rue X");
        assert_eq!(raw.size, UNPARSED);
        assert_eq!(raw.price, UNPARSED);
        assert_eq!(raw.description, None);
        assert!(raw.features.is_empty());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 45 m²"), 45.0);
        assert_eq!(parse_amount("1\u{a0}020,50 "), 1020.5);
        assert_eq!(parse_amount("n/a"), UNPARSED);
    }

    #[test]
    fn test_parse_offer_count() {
        assert_eq!(parse_offer_count("12 offres"), 12);
        assert_eq!(parse_offer_count(""), 0);
    }
}
