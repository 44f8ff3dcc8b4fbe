use car_market_scout::config::Config;
use car_market_scout::report::{ReportAggregator, ReportRenderer, ReportWindow};
use car_market_scout::scrapers::{
    ChromeRenderer, CrawlController, HttpRenderer, PageExtractor, PageRenderer,
};
use car_market_scout::storage::{self, SnapshotStore};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "car-market-scout")]
#[command(about = "Vehicle listing crawler and bilingual market reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl result pages and save a deduplicated snapshot
    Crawl(CrawlArgs),
    /// Build EN and AR reports from the latest snapshot
    Report,
    /// Crawl, then report
    Run(CrawlArgs),
}

#[derive(clap::Args, Debug)]
struct CrawlArgs {
    /// Page rendering engine
    #[arg(long, value_enum, default_value_t = Engine::Chrome)]
    engine: Engine,

    /// Override MAX_PAGES
    #[arg(long)]
    max_pages: Option<u32>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Engine {
    Chrome,
    Http,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "❌ Run failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;

    match cli.command {
        Command::Crawl(args) => crawl(&mut config, args).await,
        Command::Report => report(&config).await,
        Command::Run(args) => {
            crawl(&mut config, args).await?;
            report(&config).await
        }
    }
}

async fn crawl(config: &mut Config, args: CrawlArgs) -> anyhow::Result<()> {
    if let Some(max_pages) = args.max_pages {
        config.crawl.max_pages = max_pages;
        config.crawl.validate()?;
    }

    let selectors = config.selectors()?;
    let extractor = PageExtractor::new(
        selectors.clone(),
        config.crawl.base_url.clone(),
        Utc::now().year(),
    );

    info!("🚗 Car Market Scout - crawling {}", config.crawl.base_url);

    let outcome = match args.engine {
        Engine::Chrome => {
            let renderer = ChromeRenderer::new(config.headless, selectors.consent_buttons.clone());
            crawl_with(renderer, extractor, config).await
        }
        Engine::Http => crawl_with(HttpRenderer::new(), extractor, config).await,
    };

    if outcome.termination.is_failure() {
        warn!(reason = ?outcome.termination, "Crawl stopped early");
    }

    let store = SnapshotStore::new(&config.data_dir, &config.snapshot_prefix);
    store.save_crawl(outcome, Utc::now()).await?;
    Ok(())
}

async fn crawl_with<R: PageRenderer>(
    renderer: R,
    extractor: PageExtractor,
    config: &Config,
) -> car_market_scout::scrapers::CrawlOutcome {
    CrawlController::new(renderer, extractor, config.crawl.clone())
        .run()
        .await
}

async fn report(config: &Config) -> anyhow::Result<()> {
    let store = SnapshotStore::new(&config.data_dir, &config.snapshot_prefix);
    let snapshot = store.load_latest().await?;

    let window = ReportWindow::ending_at(snapshot.captured_at);
    let stats = ReportAggregator::new(&config.crawl.recency_sentinel)
        .aggregate(&snapshot.records, window);

    let renderer = ReportRenderer::new(
        &config.report_source,
        &config.report_region,
        &config.report_currency,
    );
    let documents = renderer.render_all(&stats, Utc::now());
    storage::write_reports(&config.reports_dir, &documents).await?;

    info!(listings = stats.total, "📊 Reports generated");
    Ok(())
}
