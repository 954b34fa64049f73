use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dirscrape_acquire::{output, Crawler, HttpFetcher};
use dirscrape_model::{CrawlConfig, DuplicatePolicy, FailurePolicy, OutputFormat, Preset};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dirscrape")]
#[command(about = "Crawl A-to-Z organisation directories into dated JSON/CSV files")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_HASH"), ")"))]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long, global = true)]
    utc: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl every index page and every listed detail page, then save the records
    Crawl {
        #[command(flatten)]
        target: Target,

        /// Output directory (overrides the config)
        #[arg(short = 'O', long)]
        output_dir: Option<PathBuf>,

        /// Output format (overrides the config)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Drop listings whose detail address was already seen under another key
        #[arg(long)]
        dedup: bool,

        /// Stop at the first failed page instead of skipping it
        #[arg(long)]
        abort_on_error: bool,

        /// Pause between requests, in milliseconds (overrides the config)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Keep a raw copy of every fetched page in this directory
        #[arg(long)]
        cache_html: Option<PathBuf>,
    },

    /// Crawl index pages only and write the listings as JSON
    Listings {
        #[command(flatten)]
        target: Target,

        /// Output file for the listing array
        #[arg(short, long, default_value = "listings.json")]
        output: PathBuf,
    },

    /// Check a saved JSON output file
    Validate {
        /// Path to the output file
        file: String,
    },

    /// Print a built-in target's configuration as JSON
    Preset {
        #[arg(value_enum)]
        preset: PresetArg,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Built-in target
    #[arg(short, long, value_enum)]
    preset: Option<PresetArg>,

    /// JSON config file describing the target site
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum PresetArg {
    /// City of Edinburgh Council libraries (directory 10199)
    LibrarySpaces,
    /// City of Edinburgh Council warm and welcoming spaces (directory 10258)
    WarmSpaces,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::LibrarySpaces => Preset::LibrarySpaces,
            PresetArg::WarmSpaces => Preset::WarmSpaces,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FormatArg {
    Json,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

impl Target {
    fn load(&self) -> Result<CrawlConfig> {
        match (&self.config, self.preset) {
            (Some(path), _) => CrawlConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display())),
            (None, Some(preset)) => Ok(Preset::from(preset).config()),
            (None, None) => anyhow::bail!("Either --preset or --config is required"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Map log level, suppressing noisy HTML-parsing crates at debug/trace
    let level = match cli.log_level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug,selectors=warn,html5ever=warn",
        LogLevel::Trace => "trace,selectors=warn,html5ever=warn",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Timestamp format: 2024-06-05 19:44:09.123 +01:00
    let time_format = "%Y-%m-%d %H:%M:%S%.3f %:z";

    if cli.utc {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::new(time_format.to_string()))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(time_format.to_string()))
            .init();
    }

    match cli.command {
        Commands::Crawl {
            target,
            output_dir,
            format,
            dedup,
            abort_on_error,
            delay_ms,
            cache_html,
        } => {
            let mut config = target.load()?;
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(format) = format {
                config.format = format.into();
            }
            if dedup {
                config.duplicates = DuplicatePolicy::DedupByUrl;
            }
            if abort_on_error {
                config.on_error = FailurePolicy::Abort;
            }
            if let Some(ms) = delay_ms {
                config.delay_ms = ms;
            }
            if cache_html.is_some() {
                config.cache_html = cache_html;
            }

            tracing::info!(label = %config.label, index = %config.index_base, "Crawling directory");
            let fetcher = HttpFetcher::new(&config.headers)?;
            let mut crawler = Crawler::new(config, fetcher);
            let today = run_date();
            let (report, path) = crawler.run_and_save(today).await?;

            for failure in &report.failures {
                tracing::warn!(stage = ?failure.stage, kind = ?failure.kind, url = %failure.url, "{}", failure.message);
            }
            tracing::info!(
                index_pages = report.stats.index_pages,
                empty_partitions = report.stats.empty_partitions,
                listings = report.listings.len(),
                duplicates_dropped = report.stats.duplicates_dropped,
                records = report.records.len(),
                failures = report.failures.len(),
                path = %path.display(),
                "Done"
            );
        }
        Commands::Listings { target, output: out } => {
            let config = target.load()?;
            tracing::info!(label = %config.label, index = %config.index_base, "Collecting listings");
            let fetcher = HttpFetcher::new(&config.headers)?;
            let mut crawler = Crawler::new(config, fetcher);
            let report = crawler.crawl_listings().await?;
            output::save_listings(&report.listings, &out)?;
        }
        Commands::Validate { file } => {
            tracing::info!(file = %file, "Validating");
            let errors = dirscrape_validate::validate(&file)?;
            if !errors.is_empty() {
                anyhow::bail!("{} validation errors in {file}", errors.len());
            }
        }
        Commands::Preset { preset } => {
            let config = Preset::from(preset).config();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// The run date used in output file names, in local time.
fn run_date() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
