use crate::config::PortalCredentials;
use crate::models::RawListing;
use crate::scrapers::offer_page::{parse_offer_count, parse_offer_page};
use crate::scrapers::traits::ListingSource;
use crate::scrapers::types::SearchParams;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const PORTAL_URL: &str = "https://logement-actionlogement.fr";
const RESULT_ROWS: &str = "fa-offer-search-result > div:nth-child(2) > div";
const OFFER_DETAILS: &str = "div.offer-infos";
const SEARCH_RESULTS: &str = "fa-offer-search-result";
const OFFER_COUNT: &str = "#total-offers-amount > p.offers-total";
const RADIUS_INPUT: &str = r#"input[name="closeable-item-radius-values"]"#;
const RENTAL_TYPE_INPUT: &str =
    r#"[aria-label="Type de location"], input[placeholder="Type de location"]"#;
const EMAIL_INPUT: &str = r#"input[type="email"], input[name="username"]"#;
const PASSWORD_INPUT: &str = r#"input[type="password"]"#;

const LOADER_GONE: &str = "document.querySelector('div.loader') === null";

const PAGE_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser-based scraper for Action Logement using headless Chrome
#[derive(Clone)]
pub struct ActionLogementBrowserScraper {
    browser: Browser,
    credentials: PortalCredentials,
    params: SearchParams,
}

impl ActionLogementBrowserScraper {
    /// Launch Chrome and prepare a scraper for the given account
    pub fn new(
        credentials: PortalCredentials,
        headless: bool,
        params: SearchParams,
    ) -> Result<Self> {
        info!("Launching {} Chrome...", if headless { "headless" } else { "visible" });

        let options = LaunchOptions::default_builder()
            .headless(headless)
            .window_size(Some((1280, 1024)))
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        Ok(Self {
            browser,
            credentials,
            params,
        })
    }

    /// Log in, run the search and capture every offer on the results page.
    ///
    /// Blocking: drives the browser synchronously.
    pub fn scrape_offers(&self) -> Result<Vec<RawListing>> {
        let tab = self.browser.new_tab()?;
        tab.set_default_timeout(PAGE_TIMEOUT);

        info!("Opening {}...", PORTAL_URL);
        tab.navigate_to(PORTAL_URL)?;
        tab.wait_until_navigated()?;

        self.login(&tab)?;
        self.search(&tab)?;

        let total = tab
            .wait_for_element(OFFER_COUNT)
            .and_then(|el| el.get_inner_text())
            .map(|text| parse_offer_count(text.trim()))
            .unwrap_or(0);
        let rows = count_elements(&tab, RESULT_ROWS)?;
        info!("Total offers found: {} ({} rows on page)", total, rows);
        if rows != total {
            // Only the first results page is visited
            warn!("Offer count {} differs from visible rows {}", total, rows);
        }

        let mut listings = Vec::with_capacity(rows);
        for index in 0..rows {
            info!("Checking offer no {} out of {}", index + 1, rows);
            let attempt = self.capture_offer(&tab, index);
            match attempt.listing {
                Ok(listing) => listings.push(listing),
                Err(e) => warn!("Skipped offer {}: {:#}", index + 1, e),
            }

            let on_offer_page = is_present(&tab, OFFER_DETAILS).unwrap_or(false);
            let on_results_page = is_present(&tab, SEARCH_RESULTS).unwrap_or(false);
            if !should_go_back(attempt.clicked, on_offer_page, on_results_page) {
                continue;
            }
            if let Err(e) = return_to_results(&tab) {
                warn!(
                    "Could not return to search results, stopping after {} offers: {:#}",
                    listings.len(),
                    e
                );
                break;
            }
        }

        info!("Successfully scraped {} offers", listings.len());
        Ok(listings)
    }

    fn login(&self, tab: &Tab) -> Result<()> {
        info!("Logging in as {}", self.credentials.email);
        click_by_text(tab, "button", "Se connecter")?;

        let email = tab.wait_for_element(EMAIL_INPUT)?;
        email.click()?;
        email.type_into(&self.credentials.email)?;
        click_by_text(tab, "button", "Continue")?;

        let password = tab.wait_for_element(PASSWORD_INPUT)?;
        password.click()?;
        password.type_into(&self.credentials.password)?;
        click_by_text(tab, "button", "Continue")?;

        tab.wait_until_navigated()?;
        Ok(())
    }

    fn search(&self, tab: &Tab) -> Result<()> {
        wait_for_condition(
            tab,
            "Array.from(document.querySelectorAll('a'))\
             .some(a => a.textContent.trim() === 'Rechercher un logement')",
            PAGE_TIMEOUT,
        )?;
        click_by_text(tab, "a", "Rechercher un logement")?;

        tab.wait_for_element(RADIUS_INPUT)?.click()?;
        click_by_text(tab, "*", &self.params.radius)?;

        tab.wait_for_element(RENTAL_TYPE_INPUT)?.click()?;
        check_option(tab, &self.params.rental_type)?;

        click_by_text(tab, "button", "Lancer la recherche")?;
        tab.wait_for_element(SEARCH_RESULTS)?;
        wait_for_condition(tab, LOADER_GONE, PAGE_TIMEOUT)?;
        debug!("Search results loaded");
        Ok(())
    }

    fn capture_offer(&self, tab: &Tab, index: usize) -> RowAttempt {
        let clicked = match click_row(tab, index) {
            Ok(clicked) => clicked,
            Err(e) => {
                return RowAttempt {
                    clicked: false,
                    listing: Err(e),
                }
            }
        };
        if !clicked {
            return RowAttempt {
                clicked,
                listing: Err(anyhow!("result row {} disappeared", index)),
            };
        }

        let listing = tab
            .wait_for_element(OFFER_DETAILS)
            .and_then(|_| tab.get_content())
            .and_then(|html| parse_offer_page(&html));
        RowAttempt { clicked, listing }
    }
}

/// Outcome of opening one result row
struct RowAttempt {
    /// The row was found and clicked, so the tab may have left the results
    clicked: bool,
    listing: Result<RawListing>,
}

/// Go back only when a click actually took the tab away from the results list
fn should_go_back(clicked: bool, on_offer_page: bool, on_results_page: bool) -> bool {
    clicked && (on_offer_page || !on_results_page)
}

fn return_to_results(tab: &Tab) -> Result<()> {
    tab.evaluate("history.back()", false)?;
    tab.wait_for_element(SEARCH_RESULTS)?;
    wait_for_condition(tab, LOADER_GONE, PAGE_TIMEOUT)
}

fn click_row(tab: &Tab, index: usize) -> Result<bool> {
    let script = format!(
        "(() => {{ const row = document.querySelectorAll({})[{}]; \
         if (!row) return false; row.click(); return true; }})()",
        js_string(RESULT_ROWS)?,
        index
    );
    Ok(tab.evaluate(&script, false)?.value == Some(Value::Bool(true)))
}

fn is_present(tab: &Tab, selector: &str) -> Result<bool> {
    let script = format!("document.querySelector({}) !== null", js_string(selector)?);
    Ok(tab.evaluate(&script, false)?.value == Some(Value::Bool(true)))
}

#[async_trait]
impl ListingSource for ActionLogementBrowserScraper {
    async fn scrape(&self) -> Result<Vec<RawListing>> {
        let scraper = self.clone();
        tokio::task::spawn_blocking(move || scraper.scrape_offers())
            .await
            .context("Browser scrape task panicked")?
    }

    fn source_name(&self) -> &'static str {
        "Action Logement"
    }
}

fn js_string(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn count_elements(tab: &Tab, selector: &str) -> Result<usize> {
    let result = tab.evaluate(
        &format!("document.querySelectorAll({}).length", js_string(selector)?),
        false,
    )?;
    Ok(result.value.and_then(|v| v.as_u64()).unwrap_or(0) as usize)
}

/// Click the innermost element matching `selector` whose text is exactly `text`
fn click_by_text(tab: &Tab, selector: &str, text: &str) -> Result<()> {
    let script = format!(
        "(() => {{ const m = Array.from(document.querySelectorAll({})) \
         .filter(e => e.textContent.trim() === {}); \
         if (m.length === 0) return false; m[m.length - 1].click(); return true; }})()",
        js_string(selector)?,
        js_string(text)?
    );
    let result = tab.evaluate(&script, false)?;
    if result.value != Some(Value::Bool(true)) {
        bail!("No {} element with text {:?}", selector, text);
    }
    Ok(())
}

/// Tick the checkbox of the dropdown option labelled `label`
fn check_option(tab: &Tab, label: &str) -> Result<()> {
    let script = format!(
        "(() => {{ const opt = Array.from(document.querySelectorAll('[role=\"option\"]')) \
         .find(o => o.textContent.includes({})); \
         if (!opt) return false; const box = opt.querySelector('input[type=\"checkbox\"]') || opt; \
         if (!box.checked) box.click(); return true; }})()",
        js_string(label)?
    );
    let result = tab.evaluate(&script, false)?;
    if result.value != Some(Value::Bool(true)) {
        bail!("No option {:?}", label);
    }
    Ok(())
}

/// Poll a boolean JS expression until it holds
fn wait_for_condition(tab: &Tab, expression: &str, timeout: Duration) -> Result<()> {
    let start = Instant::now();
    loop {
        if tab.evaluate(expression, false)?.value == Some(Value::Bool(true)) {
            return Ok(());
        }
        if start.elapsed() > timeout {
            bail!("Timed out waiting for `{}`", expression);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
