use alerter::TelegramAlerter;
use analytics::{DealAnalyticsEngine, FilterCriteria, PriceBuckets};
use anyhow::Context;
use api_client::{DealScoreQuery, HttpMarketClient, MarketDataClient, SignalQuery};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use configuration::Config;
use core_types::{
    AlertDirection, PriceAlert, PricedItem, QualityTier, Signal, SignalLevel, SortKey, Watchlist,
};
use indicatif::ProgressBar;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use store::PreferenceRepository;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// The main entry point for the cardscope market-intelligence CLI.
#[tokio::main]
async fn main() {
    // Load environment variables (API token, Telegram secrets) from .env.
    dotenvy::dotenv().ok();

    // Keep the guard alive so buffered log lines are flushed on exit.
    let _guard = init_tracing();

    let cli = Cli::parse();

    let config = match configuration::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, config).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Routes log output to a daily-rolling file so stdout stays clean for the
/// rendered tables.
fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", "cardscope.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    guard
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Market intelligence for the collectibles card market: scored deals,
/// movers, distributions, signals, watchlist and price alerts.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Profile whose watchlist and price alerts are used.
    #[arg(long, default_value = "local", global = true)]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the dashboard overview: key metrics, top deals, recent signals.
    Overview,
    /// Browse the scored deal list with filters and sorting.
    Deals(DealsArgs),
    /// Show the items priced furthest below and above their market average.
    Movers(MoversArgs),
    /// Show market statistics: averages, price/score histograms, sets.
    Insights,
    /// Show ranked market signals.
    Signals(SignalsArgs),
    /// Manage the watchlist.
    #[command(subcommand)]
    Watch(WatchCommand),
    /// Manage price alerts and evaluate them against live prices.
    #[command(subcommand)]
    Alert(AlertCommand),
}

#[derive(Parser)]
struct DealsArgs {
    /// Case-insensitive search over card and set names.
    #[arg(long, default_value = "")]
    search: String,

    /// Minimum deal score (inclusive).
    #[arg(long, default_value_t = 0)]
    min_score: u8,

    /// Maximum deal score (inclusive).
    #[arg(long, default_value_t = 100)]
    max_score: u8,

    /// Minimum price (inclusive).
    #[arg(long, default_value_t = Decimal::ZERO)]
    min_price: Decimal,

    /// Maximum price (inclusive).
    #[arg(long)]
    max_price: Option<Decimal>,

    /// Ordering: score-desc, price-asc, price-desc or savings-desc. An
    /// unknown key keeps the snapshot order.
    #[arg(long, default_value = "score-desc")]
    sort: String,

    /// Restrict the list to watchlisted items.
    #[arg(long)]
    watchlist: bool,

    /// Maximum number of rows to display.
    #[arg(long, default_value_t = 25)]
    limit: usize,
}

#[derive(Parser)]
struct MoversArgs {
    /// Maximum number of rows per direction.
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

#[derive(Parser)]
struct SignalsArgs {
    /// Keep only signals of this level: high, medium or low.
    #[arg(long)]
    level: Option<String>,

    /// Keep only signals of this type (e.g. "undervalued").
    #[arg(long = "type")]
    signal_type: Option<String>,
}

#[derive(Subcommand)]
enum WatchCommand {
    /// Flip watchlist membership for an item id.
    Toggle { id: i64 },
    /// Remove an item id from the watchlist.
    Remove { id: i64 },
    /// Show the watchlisted deals with their aggregates.
    List,
    /// Empty the watchlist.
    Clear,
}

#[derive(Subcommand)]
enum AlertCommand {
    /// Create a price alert.
    Add {
        /// Substring matched against card names, case-insensitively.
        pattern: String,
        /// Target price the live price is compared against.
        target: Decimal,
        /// Trigger direction: "below" or "above" the target.
        #[arg(default_value = "below")]
        direction: String,
    },
    /// Delete a price alert by id.
    Remove { id: Uuid },
    /// List the stored alert rules.
    List,
    /// Evaluate every alert against live prices.
    Check {
        /// Also send a Telegram notification for triggered alerts.
        #[arg(long)]
        notify: bool,
    },
}

// ==============================================================================
// Command Dispatch
// ==============================================================================

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let engine = DealAnalyticsEngine::new(PriceBuckets::new(
        config.analytics.price_bucket_edges.clone(),
    )?);

    let token = std::env::var("CARDSCOPE_API_TOKEN").ok();
    let client = HttpMarketClient::new(&config.api, token.as_deref())?;

    let pool = store::connect(&config.store.database_path).await?;
    let repo = PreferenceRepository::new(pool);
    tracing::info!(
        base_url = %config.api.base_url,
        store = %config.store.database_path,
        "cardscope initialized"
    );

    match cli.command {
        Commands::Overview => handle_overview(&config, &engine, &client).await,
        Commands::Deals(args) => {
            handle_deals(args, &config, &engine, &client, &repo, &cli.user).await
        }
        Commands::Movers(args) => handle_movers(args, &config, &engine, &client).await,
        Commands::Insights => handle_insights(&config, &engine, &client).await,
        Commands::Signals(args) => handle_signals(args, &config, &engine, &client).await,
        Commands::Watch(command) => {
            handle_watch(command, &config, &engine, &client, &repo, &cli.user).await
        }
        Commands::Alert(command) => {
            handle_alert(command, &config, &engine, &client, &repo, &cli.user).await
        }
    }
}

/// Runs `future` behind a terminal spinner.
async fn with_spinner<F, T>(message: &str, future: F) -> T
where
    F: Future<Output = T>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = future.await;
    spinner.finish_and_clear();
    result
}

fn deal_query(config: &Config) -> DealScoreQuery {
    DealScoreQuery {
        limit: Some(config.api.snapshot_limit),
        min_score: Some(config.analytics.default_min_score),
    }
}

fn signal_query(config: &Config) -> SignalQuery {
    SignalQuery {
        limit: Some(config.api.snapshot_limit),
        ..SignalQuery::default()
    }
}

async fn fetch_items(
    config: &Config,
    client: &HttpMarketClient,
) -> anyhow::Result<Vec<PricedItem>> {
    with_spinner(
        "Fetching deal scores...",
        client.fetch_deal_scores(&deal_query(config)),
    )
    .await
    .context("market data unavailable (deal score fetch failed)")
}

async fn fetch_signals(
    config: &Config,
    client: &HttpMarketClient,
) -> anyhow::Result<Vec<Signal>> {
    with_spinner(
        "Fetching signals...",
        client.fetch_signals(&signal_query(config)),
    )
    .await
    .context("market data unavailable (signal fetch failed)")
}

// ==============================================================================
// Command Handlers
// ==============================================================================

async fn handle_overview(
    config: &Config,
    engine: &DealAnalyticsEngine,
    client: &HttpMarketClient,
) -> anyhow::Result<()> {
    let snapshot = with_spinner(
        "Fetching market snapshot...",
        client.fetch_snapshot(&deal_query(config), &signal_query(config)),
    )
    .await
    .context("market data unavailable (snapshot fetch failed)")?;

    let dist = engine.compute_distributions(&snapshot.items);
    let counts = engine.level_counts(&snapshot.signals);

    println!("Market overview ({})", snapshot.fetched_at.format("%Y-%m-%d %H:%M UTC"));
    println!("  Tracked deals:    {}", snapshot.items.len());
    println!("  Avg deal score:   {}", dist.average_score.round_dp(0));
    println!("  Excellent deals:  {}", dist.score_buckets.excellent);
    println!(
        "  Active signals:   {} ({} high / {} medium / {} low)",
        snapshot.signals.len(),
        counts.high,
        counts.medium,
        counts.low
    );
    println!();

    let top = engine.filter_and_sort(
        &snapshot.items,
        &FilterCriteria::default(),
        Some(SortKey::ScoreDesc),
    );
    println!("Top deals");
    print_deals_table(top.iter().take(5), &Watchlist::new());

    let recent = engine.rank_signals(&snapshot.signals);
    if !recent.is_empty() {
        println!("Recent signals");
        print_signals_table(recent.iter().take(3));
    }

    Ok(())
}

async fn handle_deals(
    args: DealsArgs,
    config: &Config,
    engine: &DealAnalyticsEngine,
    client: &HttpMarketClient,
    repo: &PreferenceRepository,
    user: &str,
) -> anyhow::Result<()> {
    let items = fetch_items(config, client).await?;
    let watchlist = repo.load_watchlist(user).await?;

    let restrict_to: Option<HashSet<i64>> = if args.watchlist {
        Some(watchlist.ids().clone())
    } else {
        None
    };

    let criteria = FilterCriteria {
        search: args.search,
        min_score: args.min_score,
        max_score: args.max_score,
        min_price: args.min_price,
        max_price: args.max_price.unwrap_or(Decimal::MAX),
        restrict_to,
    };

    let sort = SortKey::parse(&args.sort);
    if sort.is_none() {
        println!("Unknown sort key '{}'; keeping snapshot order.", args.sort);
    }

    let deals = engine.filter_and_sort(&items, &criteria, sort);
    println!(
        "Showing {} of {} deals",
        deals.len().min(args.limit),
        deals.len()
    );
    print_deals_table(deals.iter().take(args.limit), &watchlist);

    Ok(())
}

async fn handle_movers(
    args: MoversArgs,
    config: &Config,
    engine: &DealAnalyticsEngine,
    client: &HttpMarketClient,
) -> anyhow::Result<()> {
    let items = fetch_items(config, client).await?;
    let movers = engine.compute_movers(&items);

    println!("Priced below market average");
    print_movers_table(movers.below_average.iter().take(args.limit));
    println!("Priced above market average");
    print_movers_table(movers.above_average.iter().take(args.limit));

    Ok(())
}

async fn handle_insights(
    config: &Config,
    engine: &DealAnalyticsEngine,
    client: &HttpMarketClient,
) -> anyhow::Result<()> {
    let items = fetch_items(config, client).await?;
    let dist = engine.compute_distributions(&items);
    let total = items.len();

    println!("Market insights ({total} tracked products)");
    println!("  Average price: {}", dist.average_price.round_dp(2));
    println!("  Average score: {}", dist.average_score.round_dp(1));
    println!();

    let mut prices = new_table(vec!["Price range", "Count", "Share"]);
    for bucket in &dist.price_buckets {
        prices.add_row(vec![
            bucket.to_string(),
            bucket.count.to_string(),
            share(bucket.count, total),
        ]);
    }
    println!("Price distribution");
    println!("{prices}");

    let mut scores = new_table(vec!["Quality", "Count", "Share"]);
    for tier in QualityTier::ALL {
        let count = dist.score_buckets.get(tier);
        scores.add_row(vec![tier.to_string(), count.to_string(), share(count, total)]);
    }
    println!("Deal quality");
    println!("{scores}");

    let mut sets = new_table(vec!["Set", "Count", "Avg score", "Avg price"]);
    for aggregate in &dist.set_aggregates {
        sets.add_row(vec![
            aggregate.set.clone(),
            aggregate.count.to_string(),
            aggregate.average_score.round_dp(1).to_string(),
            aggregate.average_price.round_dp(2).to_string(),
        ]);
    }
    println!("Sets by activity");
    println!("{sets}");

    Ok(())
}

async fn handle_signals(
    args: SignalsArgs,
    config: &Config,
    engine: &DealAnalyticsEngine,
    client: &HttpMarketClient,
) -> anyhow::Result<()> {
    let level = match &args.level {
        Some(value) => Some(
            SignalLevel::parse(value)
                .with_context(|| format!("unknown signal level '{value}'"))?,
        ),
        None => None,
    };

    let signals = fetch_signals(config, client).await?;
    let filtered = engine.filter_signals(&signals, level, args.signal_type.as_deref());
    let counts = engine.level_counts(&filtered);
    let ranked = engine.rank_signals(&filtered);

    println!(
        "{} signals ({} high / {} medium / {} low)",
        ranked.len(),
        counts.high,
        counts.medium,
        counts.low
    );
    print_signals_table(ranked.iter());

    Ok(())
}

async fn handle_watch(
    command: WatchCommand,
    config: &Config,
    engine: &DealAnalyticsEngine,
    client: &HttpMarketClient,
    repo: &PreferenceRepository,
    user: &str,
) -> anyhow::Result<()> {
    match command {
        WatchCommand::Toggle { id } => {
            if repo.toggle_watch(user, id).await? {
                println!("Item {id} added to the watchlist.");
            } else {
                println!("Item {id} removed from the watchlist.");
            }
        }
        WatchCommand::Remove { id } => {
            let mut watchlist = repo.load_watchlist(user).await?;
            if watchlist.remove(id) {
                repo.save_watchlist(user, &watchlist).await?;
                println!("Item {id} removed from the watchlist.");
            } else {
                println!("Item {id} was not on the watchlist.");
            }
        }
        WatchCommand::List => {
            let watchlist = repo.load_watchlist(user).await?;
            if watchlist.is_empty() {
                println!("The watchlist is empty.");
                return Ok(());
            }

            let items = fetch_items(config, client).await?;
            let criteria = FilterCriteria {
                restrict_to: Some(watchlist.ids().clone()),
                ..FilterCriteria::default()
            };
            let watched = engine.filter_and_sort(&items, &criteria, Some(SortKey::ScoreDesc));

            // Ids that no longer resolve against the snapshot are dropped
            // silently, so the aggregates cover visible rows only.
            let total_value: Decimal = watched.iter().map(|item| item.current_price).sum();
            let dist = engine.compute_distributions(&watched);

            println!(
                "{} watched deals | avg score {} | total value {}",
                watched.len(),
                dist.average_score.round_dp(0),
                total_value.round_dp(2)
            );
            print_deals_table(watched.iter(), &watchlist);
        }
        WatchCommand::Clear => {
            repo.delete_blob(user, store::WATCHLIST_KEY).await?;
            println!("Watchlist cleared.");
        }
    }

    Ok(())
}

async fn handle_alert(
    command: AlertCommand,
    config: &Config,
    engine: &DealAnalyticsEngine,
    client: &HttpMarketClient,
    repo: &PreferenceRepository,
    user: &str,
) -> anyhow::Result<()> {
    match command {
        AlertCommand::Add {
            pattern,
            target,
            direction,
        } => {
            let direction = parse_direction(&direction)?;
            let alert = PriceAlert::new(pattern, target, direction)?;
            let id = alert.id;
            repo.add_alert(user, alert).await?;
            println!("Alert {id} created.");
        }
        AlertCommand::Remove { id } => {
            if repo.remove_alert(user, id).await? {
                println!("Alert {id} removed.");
            } else {
                println!("No alert with id {id}.");
            }
        }
        AlertCommand::List => {
            let alerts = repo.load_alerts(user).await?;
            if alerts.is_empty() {
                println!("No price alerts configured.");
                return Ok(());
            }

            let mut table = new_table(vec!["Id", "Pattern", "Direction", "Target", "Created"]);
            for alert in &alerts {
                table.add_row(vec![
                    alert.id.to_string(),
                    alert.product_name_pattern.clone(),
                    alert.direction.to_string(),
                    alert.target_price.round_dp(2).to_string(),
                    alert.created_at.format("%Y-%m-%d").to_string(),
                ]);
            }
            println!("{table}");
        }
        AlertCommand::Check { notify } => {
            let alerts = repo.load_alerts(user).await?;
            if alerts.is_empty() {
                println!("No price alerts configured.");
                return Ok(());
            }

            let items = fetch_items(config, client).await?;
            let evaluated = engine.evaluate_alerts(&alerts, &items);

            let mut table = new_table(vec![
                "Pattern", "Direction", "Target", "Matched", "Current", "Triggered",
            ]);
            for entry in &evaluated {
                table.add_row(vec![
                    entry.alert.product_name_pattern.clone(),
                    entry.alert.direction.to_string(),
                    entry.alert.target_price.round_dp(2).to_string(),
                    entry.matched_name.clone().unwrap_or_else(|| "-".to_string()),
                    entry
                        .current_price
                        .map(|price| price.round_dp(2).to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    if entry.triggered { "yes" } else { "no" }.to_string(),
                ]);
            }
            println!("{table}");

            if notify {
                match config.telegram.as_ref().and_then(TelegramAlerter::new) {
                    Some(telegram) => telegram.notify_triggered(&evaluated).await?,
                    None => println!("Telegram is not configured; skipping notification."),
                }
            }
        }
    }

    Ok(())
}

// ==============================================================================
// Table Rendering
// ==============================================================================

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_deals_table<'a>(
    items: impl Iterator<Item = &'a PricedItem>,
    watchlist: &Watchlist,
) {
    let mut table = new_table(vec![
        "Id", "Name", "Set", "Price", "Mkt avg", "Savings", "Score", "Quality", "Watch",
    ]);

    for item in items {
        let savings = match item.market_delta_pct() {
            Some(_) => format!(
                "{}%",
                (item.savings_fraction() * Decimal::ONE_HUNDRED).round_dp(1)
            ),
            None => "-".to_string(),
        };

        table.add_row(vec![
            item.id.to_string(),
            item.name.clone(),
            item.set.clone().unwrap_or_else(|| "-".to_string()),
            item.current_price.round_dp(2).to_string(),
            item.market_avg_price
                .map(|avg| avg.round_dp(2).to_string())
                .unwrap_or_else(|| "-".to_string()),
            savings,
            item.deal_score.to_string(),
            QualityTier::of(item.deal_score).to_string(),
            if watchlist.contains(item.id) { "*" } else { "" }.to_string(),
        ]);
    }

    println!("{table}");
}

fn print_movers_table<'a>(ranked: impl Iterator<Item = &'a analytics::RankedItem>) {
    let mut table = new_table(vec!["Id", "Name", "Price", "Mkt avg", "Delta"]);

    for entry in ranked {
        table.add_row(vec![
            entry.item.id.to_string(),
            entry.item.name.clone(),
            entry.item.current_price.round_dp(2).to_string(),
            entry
                .item
                .market_avg_price
                .map(|avg| avg.round_dp(2).to_string())
                .unwrap_or_else(|| "-".to_string()),
            format!("{}%", entry.delta_pct.round_dp(1)),
        ]);
    }

    println!("{table}");
}

fn print_signals_table<'a>(signals: impl Iterator<Item = &'a Signal>) {
    let mut table = new_table(vec!["Level", "Type", "Product", "Price", "Detected"]);

    for signal in signals {
        table.add_row(vec![
            signal.signal_level.to_string(),
            signal.signal_type.clone(),
            signal.product_name.clone(),
            signal
                .current_price
                .map(|price| price.round_dp(2).to_string())
                .unwrap_or_else(|| "-".to_string()),
            signal.detected_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }

    println!("{table}");
}

fn share(count: usize, total: usize) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    format!("{}%", count * 100 / total)
}

fn parse_direction(value: &str) -> anyhow::Result<AlertDirection> {
    match value.to_ascii_lowercase().as_str() {
        "below" => Ok(AlertDirection::Below),
        "above" => Ok(AlertDirection::Above),
        other => anyhow::bail!("unknown alert direction '{other}' (expected below/above)"),
    }
}
