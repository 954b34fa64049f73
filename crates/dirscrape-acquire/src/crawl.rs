use crate::detail;
use crate::error::{AcquireError, ErrorKind};
use crate::fetch::PageSource;
use crate::html::Page;
use crate::index::{IndexEnumerator, IndexPage};
use crate::listing;
use crate::output;
use chrono::NaiveDate;
use dirscrape_model::{CrawlConfig, DetailRecord, DuplicatePolicy, FailurePolicy, ListingRecord};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Which half of the two-level crawl a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Index,
    Detail,
}

/// A step that contributed no records because it failed.
#[derive(Debug, Clone)]
pub struct StepFailure {
    pub stage: Stage,
    pub url: String,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub index_pages: usize,
    pub empty_partitions: usize,
    pub duplicates_dropped: usize,
    pub details: usize,
}

/// Everything one run produced, including what it had to skip.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub listings: Vec<ListingRecord>,
    pub records: Vec<DetailRecord>,
    pub stats: CrawlStats,
    pub failures: Vec<StepFailure>,
}

/// Drives index pages → listings → detail pages → records, strictly one
/// request at a time.
pub struct Crawler<S> {
    config: CrawlConfig,
    source: S,
    requests: usize,
}

impl<S: PageSource> Crawler<S> {
    pub fn new(config: CrawlConfig, source: S) -> Self {
        Self {
            config,
            source,
            requests: 0,
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Full run: every index page, then every listed detail page.
    pub async fn run(&mut self) -> Result<CrawlReport, AcquireError> {
        let mut report = self.crawl_listings().await?;
        self.crawl_details(&mut report).await?;
        tracing::info!(
            listings = report.listings.len(),
            records = report.records.len(),
            failures = report.failures.len(),
            "Crawl finished"
        );
        Ok(report)
    }

    /// Full run, then write the records to the dated output file for `date`.
    pub async fn run_and_save(&mut self, date: NaiveDate) -> Result<(CrawlReport, PathBuf), AcquireError> {
        let report = self.run().await?;
        let path = output::output_path(&self.config.output_dir, &self.config.label, date, self.config.format);
        output::save(&report.records, &path, self.config.format)?;
        Ok((report, path))
    }

    /// Index stage only: collect listings from every partition, then apply
    /// the duplicate policy.
    pub async fn crawl_listings(&mut self) -> Result<CrawlReport, AcquireError> {
        let mut report = CrawlReport::default();
        let index = IndexEnumerator::from_config(&self.config);
        tracing::info!(pages = index.len(), base = %self.config.index_base, "Enumerating index");

        for page in index.iter() {
            report.stats.index_pages += 1;
            match self.extract_listings(&page).await {
                Ok(found) => {
                    tracing::info!(key = %page.key, listings = found.len(), "Index page");
                    report.listings.extend(found);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    // No container usually means nobody is listed under this key.
                    tracing::warn!(url = %page.url, "Could not find list of organisations");
                    report.stats.empty_partitions += 1;
                    record_failure(&mut report, Stage::Index, &page.url, &e);
                }
                Err(e) => self.handle_failure(&mut report, Stage::Index, &page.url, e)?,
            }
        }

        if self.config.duplicates == DuplicatePolicy::DedupByUrl {
            self.dedup_listings(&mut report);
        }
        tracing::info!(listings = report.listings.len(), "Collected listings");
        Ok(report)
    }

    /// Detail stage: one record per listing in `report.listings`.
    pub async fn crawl_details(&mut self, report: &mut CrawlReport) -> Result<(), AcquireError> {
        let listings = report.listings.clone();
        for (n, item) in listings.iter().enumerate() {
            match self.extract_detail(item).await {
                Ok(record) => {
                    tracing::debug!(n, name = %item.name, fields = record.field_count(), "Detail page");
                    report.records.push(record);
                    report.stats.details += 1;
                }
                Err(e) => {
                    let url = detail::resolve_link(&self.config.site_base, &item.relative_link)
                        .unwrap_or_else(|_| item.relative_link.clone());
                    self.handle_failure(report, Stage::Detail, &url, e)?;
                }
            }
        }
        Ok(())
    }

    /// Fetch one index page and read its listings.
    pub async fn extract_listings(&mut self, page: &IndexPage) -> Result<Vec<ListingRecord>, AcquireError> {
        let html = self.fetch(&page.url).await?;
        listing::parse_listings(&page.url, &html, &self.config.listing_selector)
    }

    /// Fetch one listing's detail page and read it into a record.
    pub async fn extract_detail(&mut self, item: &ListingRecord) -> Result<DetailRecord, AcquireError> {
        let url = detail::resolve_link(&self.config.site_base, &item.relative_link)?;
        let html = self.fetch(&url).await?;
        let page = Page::parse(&url, &html);
        detail::extract_detail(&page, &self.config.detail_selector, item)
    }

    async fn fetch(&mut self, url: &str) -> Result<String, AcquireError> {
        if self.requests > 0 && self.config.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
        }
        self.requests += 1;

        tracing::debug!(url = %url, "Fetching");
        let html = self.source.fetch(url).await?;
        tracing::debug!(url = %url, bytes = html.len(), "Received HTML");

        if let Some(dir) = &self.config.cache_html {
            output::cache_html(dir, url, &html)?;
        }
        Ok(html)
    }

    /// Skip or abort according to the configured policy. Local failures
    /// (filesystem, bad selector, bad headers) would hit every step, so they
    /// always abort.
    fn handle_failure(
        &self,
        report: &mut CrawlReport,
        stage: Stage,
        url: &str,
        error: AcquireError,
    ) -> Result<(), AcquireError> {
        let abort = error.kind() == ErrorKind::Local || self.config.on_error == FailurePolicy::Abort;
        if abort {
            tracing::error!(stage = ?stage, url = %url, error = %error, "Aborting crawl");
            return Err(error);
        }
        tracing::warn!(stage = ?stage, url = %url, error = %error, "Skipping step");
        record_failure(report, stage, url, &error);
        Ok(())
    }

    fn dedup_listings(&self, report: &mut CrawlReport) {
        let mut seen = HashSet::new();
        let before = report.listings.len();
        report.listings.retain(|item| {
            let key = detail::resolve_link(&self.config.site_base, &item.relative_link)
                .unwrap_or_else(|_| item.relative_link.clone());
            let fresh = seen.insert(key);
            if !fresh {
                tracing::debug!(name = %item.name, link = %item.relative_link, "Dropping duplicate listing");
            }
            fresh
        });
        report.stats.duplicates_dropped = before - report.listings.len();
    }
}

fn record_failure(report: &mut CrawlReport, stage: Stage, url: &str, error: &AcquireError) {
    report.failures.push(StepFailure {
        stage,
        url: url.to_string(),
        kind: error.kind(),
        message: error.to_string(),
    });
}
