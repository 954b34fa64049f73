pub mod crawl;
pub mod detail;
pub mod error;
pub mod fetch;
pub mod html;
pub mod index;
pub mod listing;
pub mod normalize;
pub mod output;

pub use crawl::{CrawlReport, CrawlStats, Crawler, Stage, StepFailure};
pub use error::{AcquireError, ErrorKind};
pub use fetch::{HttpFetcher, PageSource};
pub use index::{IndexEnumerator, IndexPage};
