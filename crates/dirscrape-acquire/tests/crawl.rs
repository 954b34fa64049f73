// tests/crawl.rs
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use dirscrape_acquire::{output, AcquireError, Crawler, PageSource};
use dirscrape_model::{CrawlConfig, OutputFormat};

struct StaticSite(HashMap<&'static str, &'static str>);

#[async_trait]
impl PageSource for StaticSite {
    async fn fetch(&self, url: &str) -> Result<String, AcquireError> {
        self.0
            .get(url)
            .map(|html| html.to_string())
            .ok_or_else(|| AcquireError::HttpStatus {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
    }
}

const INDEX_L: &str = r#"
<html><body>
<main>
  <h1>Library locations and opening hours: L</h1>
  <ul class="list list--record">
    <li class="list__item"><a class="list__link" href="/directory_record/1/leith-library">Leith Library</a></li>
    <li class="list__item"><a class="list__link" href="/directory_record/2/leith-walk-hub">Leith Walk Hub</a></li>
  </ul>
</main>
</body></html>
"#;

const LEITH_LIBRARY: &str = r#"
<html><body>
<dl class="list list--definition definition">
  <dt>Address</dt>
  <dd>
    28-30 Ferry Road<br>
    Edinburgh
  </dd>
  <dt>Telephone</dt>
  <dd>0131 529 5517</dd>
</dl>
</body></html>
"#;

const LEITH_WALK: &str = r#"
<html><body>
<dl class="list list--definition definition">
  <dt>Address</dt>
  <dd>Leith Walk</dd>
</dl>
</body></html>
"#;

fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("dirscrape_e2e_{name}"));
    let _ = fs::remove_dir_all(&p);
    p
}

fn site() -> StaticSite {
    StaticSite(HashMap::from([
        ("https://www.example.gov.uk/directory/1/a-to-z/L", INDEX_L),
        ("https://www.example.gov.uk/directory_record/1/leith-library", LEITH_LIBRARY),
        ("https://www.example.gov.uk/directory_record/2/leith-walk-hub", LEITH_WALK),
    ]))
}

fn config(out: PathBuf) -> CrawlConfig {
    let mut config = CrawlConfig::new(
        "example-libraries",
        "https://www.example.gov.uk/directory/1/a-to-z/",
        "https://www.example.gov.uk",
    );
    config.partition_keys = vec!["K".into(), "L".into()];
    config.output_dir = out;
    config
}

#[tokio::test]
async fn crawl_writes_dated_json_file() {
    let dir = tmp_dir("json");
    let date = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
    let mut crawler = Crawler::new(config(dir.clone()), site());

    let (report, path) = crawler.run_and_save(date).await.unwrap();
    assert_eq!(path, dir.join("example-libraries-2024-06-05.json"));
    // "K" has no index page at all: skipped, not fatal.
    assert_eq!(report.failures.len(), 1);

    let records = output::load(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("Address"), Some("28-30 Ferry Road\nEdinburgh"));
    assert_eq!(records[0].get("Telephone"), Some("0131 529 5517"));
    assert_eq!(records[0].org_name(), Some("Leith Library"));
    assert_eq!(
        records[0].org_url(),
        Some("https://www.example.gov.uk/directory_record/1/leith-library")
    );
    assert_eq!(records[1].field_count(), 1);
}

#[tokio::test]
async fn crawl_writes_csv_when_configured() {
    let dir = tmp_dir("csv");
    let date = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
    let mut config = config(dir.clone());
    config.format = OutputFormat::Csv;
    let mut crawler = Crawler::new(config, site());

    let (_, path) = crawler.run_and_save(date).await.unwrap();
    assert!(path.to_string_lossy().ends_with("example-libraries-2024-06-05.csv"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Address,Telephone,org_name,org_url\n"));
    assert_eq!(text.lines().filter(|l| l.contains("leith")).count(), 2);
}

#[tokio::test]
async fn run_with_no_listings_writes_empty_array() {
    let dir = tmp_dir("empty");
    let date = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
    let mut config = config(dir.clone());
    config.partition_keys = vec!["Q".into()];
    let mut crawler = Crawler::new(config, site());

    let (report, path) = crawler.run_and_save(date).await.unwrap();
    assert!(report.records.is_empty());
    assert_eq!(fs::read_to_string(path).unwrap(), "[]");
}

#[tokio::test]
async fn raw_pages_are_cached_when_configured() {
    let dir = tmp_dir("cache");
    let mut config = config(dir.join("out"));
    config.partition_keys = vec!["L".into()];
    config.cache_html = Some(dir.join("html"));
    let mut crawler = Crawler::new(config, site());

    crawler.run().await.unwrap();
    let cached = fs::read_dir(dir.join("html")).unwrap().count();
    assert_eq!(cached, 3);
}
