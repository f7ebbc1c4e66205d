//! Advent calendar scraper.
//!
//! The calendar page lists one block per day. A block may be empty, reserved
//! (author only), titled but unpublished, or published with a link to the
//! post. The same post sometimes shows up twice after the calendar has been
//! re-edited, with either a different URL slug or a temporarily blank URL, so
//! entries are deduplicated on two independent keys: the URL, and the
//! `(author, title)` pair.

use crate::config::{CalendarMarkers, DashboardConfig};
use crate::error::DashboardError;
use crate::models::CalendarEntry;
use crate::scrapers::CalendarSource;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("`a` is a valid selector"));

/// Compiled form of [`CalendarMarkers`].
#[derive(Debug)]
pub struct SlotSelectors {
    slot: Selector,
    author: Selector,
    title: Selector,
}

impl SlotSelectors {
    pub fn compile(markers: &CalendarMarkers) -> Result<Self, DashboardError> {
        Ok(Self {
            slot: parse_selector(&markers.slot)?,
            author: parse_selector(&markers.author)?,
            title: parse_selector(&markers.title)?,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector, DashboardError> {
    Selector::parse(css)
        .map_err(|e| DashboardError::Parse(format!("invalid marker selector `{css}`: {e}")))
}

/// Build the HTTP client used for the calendar page.
pub fn build_client(config: &DashboardConfig) -> Result<reqwest::Client, DashboardError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .map_err(|e| DashboardError::Config(format!("invalid user_agent: {e}")))?,
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.accept_language)
            .map_err(|e| DashboardError::Config(format!("invalid accept_language: {e}")))?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.fetch_timeout())
        .build()
        .map_err(|e| DashboardError::Config(format!("failed to build HTTP client: {e}")))
}

/// Scrapes the configured calendar page.
#[derive(Debug, Clone)]
pub struct CalendarScraper {
    client: reqwest::Client,
    url: String,
    markers: CalendarMarkers,
}

impl CalendarScraper {
    pub fn new(config: &DashboardConfig) -> Result<Self, DashboardError> {
        Ok(Self {
            client: build_client(config)?,
            url: config.calendar_url.clone(),
            markers: config.markers.clone(),
        })
    }
}

impl CalendarSource for CalendarScraper {
    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    async fn fetch_entries(&self) -> Result<Vec<CalendarEntry>, DashboardError> {
        let html = fetch_page(&self.client, &self.url).await?;
        let selectors = SlotSelectors::compile(&self.markers)?;
        Ok(extract_entries(&html, &selectors))
    }
}

async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String, DashboardError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| DashboardError::Fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DashboardError::Fetch(format!("{url} returned HTTP {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| DashboardError::Fetch(e.to_string()))?;
    info!(bytes = body.len(), %status, "Fetched calendar page");
    debug!(preview = %truncate_for_log(&body, 300), "Calendar page body");
    Ok(body)
}

/// Extract entries from a calendar document, in document order.
///
/// Blank slots are skipped and duplicates are dropped, first occurrence wins.
///
/// # Arguments
///
/// * `html` - The calendar page body
/// * `selectors` - Compiled slot, author and title markers
///
/// # Returns
///
/// One [`CalendarEntry`] per non-blank, non-duplicate slot. An author's
/// leading `@` is stripped and `url` is the first link under the title, or
/// empty.
///
/// # Examples
///
/// ```ignore
/// let selectors = SlotSelectors::compile(&CalendarMarkers::default())?;
/// let entries = extract_entries(&body, &selectors);
/// ```
pub fn extract_entries(html: &str, selectors: &SlotSelectors) -> Vec<CalendarEntry> {
    let document = Html::parse_document(html);
    let mut dedup = Deduplicator::default();
    let mut entries = Vec::new();
    let mut slots = 0usize;
    let mut blank = 0usize;
    let mut duplicates = 0usize;

    for slot in document.select(&selectors.slot) {
        slots += 1;
        let candidate = read_slot(slot, selectors);
        if candidate.is_blank() {
            blank += 1;
            continue;
        }
        if dedup.admit(&candidate) {
            entries.push(candidate);
        } else {
            duplicates += 1;
            debug!(author = %candidate.author, title = %candidate.title, url = %candidate.url, "Dropped duplicate entry");
        }
    }

    info!(
        slots,
        blank,
        duplicates,
        kept = entries.len(),
        "Extracted calendar entries"
    );
    entries
}

fn read_slot(slot: ElementRef<'_>, selectors: &SlotSelectors) -> CalendarEntry {
    let author = slot
        .select(&selectors.author)
        .next()
        .map(|a| {
            let text = element_text(a);
            text.strip_prefix('@').map(str::to_string).unwrap_or(text)
        })
        .unwrap_or_default();

    let title_el = slot.select(&selectors.title).next();
    let title = title_el.map(element_text).unwrap_or_default();
    let url = title_el
        .and_then(|el| el.select(&LINK_SELECTOR).next())
        .and_then(|a| a.value().attr("href"))
        .unwrap_or_default()
        .to_string();

    CalendarEntry::new(author, title, url)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Per-scrape record of the keys seen so far.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen_urls: HashSet<String>,
    seen_pairs: HashSet<(String, String)>,
}

impl Deduplicator {
    /// Returns `true` if `entry` is new. Both keys are checked and recorded
    /// on every call, so an entry rejected on one key still registers the
    /// other.
    pub fn admit(&mut self, entry: &CalendarEntry) -> bool {
        let mut duplicate = false;

        if !entry.url.is_empty() && !self.seen_urls.insert(entry.url.clone()) {
            duplicate = true;
        }

        if entry.is_filled()
            && !self
                .seen_pairs
                .insert((entry.author.clone(), entry.title.clone()))
        {
            duplicate = true;
        }

        !duplicate
    }
}
