mod render;

use analytics::{
    calendar_span, summarize, AnalyticsError, EventPrices, EventStudyEngine, NamedInterval,
    StudyParameters,
};
use anyhow::{bail, Context};
use api_client::{MarketDataClient, YahooClient};
use clap::{Parser, Subcommand};
use configuration::{Config, OutputFormat};
use core_types::{Event, PriceSeries};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use render::{AggregateReport, Renderer, SingleEventReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the Aftershock event-study tool.
#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install the log subscriber: {e}");
    }

    // Parse command-line arguments
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AnalyticsError>() {
                Some(AnalyticsError::AllEventsSkipped { skipped }) => {
                    eprintln!("No usable events.");
                    for event in skipped {
                        eprintln!("  {}: {}", event.label, event.reason);
                    }
                }
                _ => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Measures how industry ETFs moved against the market around natural disasters.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides `output.format` from the configuration.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the configured events and industries.
    Events,
    /// Study a single event: prices, abnormal returns and CAR.
    Single(SingleArgs),
    /// Average CAR across several events into CAAR.
    Aggregate(AggregateArgs),
}

#[derive(Parser)]
struct SingleArgs {
    /// The event label, exactly as configured.
    #[arg(long)]
    event: String,

    /// Industry to include (repeatable). Defaults to the first configured industry.
    #[arg(long = "industry")]
    industries: Vec<String>,

    /// Show raw closes instead of prices rebased to 100 at T.
    #[arg(long)]
    no_normalize: bool,
}

#[derive(Parser)]
struct AggregateArgs {
    /// Event label to include (repeatable). Defaults to every configured event.
    #[arg(long = "event", conflicts_with = "category")]
    events: Vec<String>,

    /// Aggregate only the events of one disaster type, e.g. "Hurricanes".
    #[arg(long)]
    category: Option<String>,

    /// Industry to include (repeatable). Defaults to the first configured industry.
    #[arg(long = "industry")]
    industries: Vec<String>,

    /// Also show the CAR of each contributing event.
    #[arg(long)]
    per_event: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = configuration::load_config_from(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let format = cli.format.unwrap_or(config.output.format);

    match cli.command {
        Commands::Events => handle_events(&config),
        Commands::Single(args) => {
            let client = YahooClient::new()?;
            handle_single(args, &config, format, &client).await
        }
        Commands::Aggregate(args) => {
            let client = YahooClient::new()?;
            handle_aggregate(args, &config, format, &client).await
        }
    }
}

fn handle_events(config: &Config) -> anyhow::Result<()> {
    let universe = config.universe();
    let renderer = Renderer::new(&universe, config.output.decimals);
    println!("{}", renderer.events(&config.events));
    println!("{}", renderer.industries());
    Ok(())
}

async fn handle_single(
    args: SingleArgs,
    config: &Config,
    format: OutputFormat,
    client: &dyn MarketDataClient,
) -> anyhow::Result<()> {
    let event = lookup_event(config, &args.event)?;
    let universe = config.universe();
    let instruments = universe.resolve(&industry_selection(config, args.industries))?;

    let inputs = fetch_events(
        client,
        std::slice::from_ref(event),
        &universe.fetch_symbols(&instruments),
        config.study.radius,
    )
    .await?;
    let prices = inputs.into_iter().next().map(|i| i.prices).unwrap_or_default();

    let engine = EventStudyEngine::new(study_parameters(config));
    let study = engine.single_event(event, &prices, &instruments, &universe.benchmark)?;
    if !study.is_usable() {
        bail!("insufficient data around '{}'", event.label);
    }
    let summary = summarize(&study.car, &intervals(config));
    let normalized = !args.no_normalize;

    match format {
        OutputFormat::Json => {
            let report = SingleEventReport::new(&study, &summary, normalized);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            let renderer = Renderer::new(&universe, config.output.decimals);
            println!("{} (T = {})", event.label, study.anchor_date);
            if let Some(shortfall) = &study.warning {
                println!("{}", renderer.shortfall(shortfall));
            }
            let prices = if normalized { &study.normalized_prices } else { &study.prices };
            println!("{}", renderer.matrix(prices));
            println!("Cumulative abnormal return (percentage points)");
            println!("{}", renderer.matrix(&study.car));
            println!("{}", renderer.summary(&summary));
        }
    }
    Ok(())
}

async fn handle_aggregate(
    args: AggregateArgs,
    config: &Config,
    format: OutputFormat,
    client: &dyn MarketDataClient,
) -> anyhow::Result<()> {
    let events = event_selection(config, &args.events, args.category.as_deref())?;
    let universe = config.universe();
    let instruments = universe.resolve(&industry_selection(config, args.industries))?;

    let inputs = fetch_events(
        client,
        &events,
        &universe.fetch_symbols(&instruments),
        config.study.radius,
    )
    .await?;

    let engine = EventStudyEngine::new(study_parameters(config));
    let study = engine.aggregate(&inputs, &instruments, &universe.benchmark)?;
    let summary = summarize(&study.caar, &intervals(config));

    match format {
        OutputFormat::Json => {
            let report = AggregateReport {
                study: &study,
                summary: &summary,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            let renderer = Renderer::new(&universe, config.output.decimals);
            println!(
                "Cumulative average abnormal return over {} events (percentage points)",
                study.event_count()
            );
            println!("{}", renderer.caar(&study));
            if args.per_event {
                for symbol in &instruments {
                    println!("{}", renderer.per_event(&study.per_event, symbol));
                }
            }
            println!("{}", renderer.summary(&summary));
            if !study.skipped.is_empty() {
                println!("{}", renderer.skipped(&study.skipped));
            }
        }
    }
    Ok(())
}

/// Fetches prices for every event concurrently.
///
/// A failed fetch is logged and handed to the engine as an empty series.
async fn fetch_events(
    client: &dyn MarketDataClient,
    events: &[Event],
    symbols: &[String],
    radius: usize,
) -> anyhow::Result<Vec<EventPrices>> {
    // Set up the progress bar
    let progress_bar = ProgressBar::new(events.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let tasks = events.iter().map(|event| {
        let pb = progress_bar.clone();
        async move {
            let (start, end) = calendar_span(event.date, radius);
            pb.set_message(format!("Fetching {}...", event.label));
            let prices = match client.fetch_closes(symbols, start, end).await {
                Ok(prices) => prices,
                Err(e) => {
                    tracing::warn!(event = %event.label, error = %e, "Fetch failed, continuing without prices.");
                    PriceSeries::empty()
                }
            };
            pb.inc(1);
            EventPrices::new(event.clone(), prices)
        }
    });

    // Wait for all concurrent fetches to complete
    let inputs = join_all(tasks).await;
    progress_bar.finish_with_message("Fetch complete!");
    Ok(inputs)
}

fn lookup_event<'a>(config: &'a Config, label: &str) -> anyhow::Result<&'a Event> {
    config
        .event(label)
        .with_context(|| format!("unknown event '{label}', run `aftershock events` to list them"))
}

/// The events to aggregate, without repeats, in the order they were given.
///
/// A category selects its configured events. No labels and no category
/// selects every configured event.
fn event_selection(
    config: &Config,
    labels: &[String],
    category: Option<&str>,
) -> anyhow::Result<Vec<Event>> {
    if let Some(category) = category {
        let events: Vec<Event> = config.events_in(category).into_iter().cloned().collect();
        if events.is_empty() {
            bail!(
                "no events in category '{category}', known categories: {}",
                config.categories().join(", ")
            );
        }
        return Ok(events);
    }
    if labels.is_empty() {
        return Ok(config.events.clone());
    }

    let mut events: Vec<Event> = Vec::with_capacity(labels.len());
    for label in labels {
        let event = lookup_event(config, label)?;
        if !events.iter().any(|e| e.label == event.label) {
            events.push(event.clone());
        }
    }
    Ok(events)
}

/// The requested industries without repeats, or the first configured one.
fn industry_selection(config: &Config, requested: Vec<String>) -> Vec<String> {
    if requested.is_empty() {
        return config.industries.iter().take(1).map(|i| i.name.clone()).collect();
    }
    let mut selection: Vec<String> = Vec::with_capacity(requested.len());
    for name in requested {
        if !selection.contains(&name) {
            selection.push(name);
        }
    }
    selection
}

fn study_parameters(config: &Config) -> StudyParameters {
    StudyParameters {
        radius: config.study.radius,
        scale: config.study.scale,
    }
}

fn intervals(config: &Config) -> Vec<NamedInterval> {
    config
        .intervals
        .iter()
        .map(|i| NamedInterval::span(i.name.clone(), i.from, i.to))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::StaticClient;
    use chrono::{Datelike, Days, NaiveDate, Weekday};

    const CONFIG: &str = r#"
benchmark = "SPY"

[[industries]]
name = "Electric Utilities"
symbol = "XLU"

[[industries]]
name = "Oil & Gas"
symbol = "XLE"

[[events]]
label = "Middle"
date = "2021-08-02"
category = "Hurricanes"

[[events]]
label = "Too early"
date = "2021-06-03"
category = "Hurricanes"

[[events]]
label = "Late"
date = "2021-08-09"
category = "Flooding"
"#;

    fn config() -> Config {
        configuration::parse_config(CONFIG).expect("valid config")
    }

    fn client() -> StaticClient {
        let mut dates = Vec::new();
        let mut day = NaiveDate::from_ymd_opt(2021, 6, 1).expect("valid date");
        while dates.len() < 90 {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                dates.push(day);
            }
            day = day + Days::new(1);
        }
        let n = dates.len();
        let xlu: Vec<f64> = (0..n).map(|i| 100.0 * 1.01f64.powi(i as i32)).collect();
        let xle: Vec<f64> = (0..n).map(|i| 100.0 * 0.99f64.powi(i as i32)).collect();
        let series = PriceSeries::new(
            dates,
            vec!["XLU".to_string(), "XLE".to_string(), "SPY".to_string()],
            vec![xlu, xle, vec![400.0; n]],
        )
        .expect("valid series");
        StaticClient::new(series)
    }

    #[test]
    fn defaults_to_the_first_industry() {
        let config = config();
        assert_eq!(industry_selection(&config, vec![]), vec!["Electric Utilities".to_string()]);
        assert_eq!(
            industry_selection(&config, vec!["Oil & Gas".to_string(), "Oil & Gas".to_string()]),
            vec!["Oil & Gas".to_string()]
        );
    }

    #[test]
    fn unknown_events_are_reported() {
        let err = lookup_event(&config(), "Nope").expect_err("must fail");
        assert!(err.to_string().contains("unknown event 'Nope'"));
    }

    #[test]
    fn repeated_event_labels_are_selected_once() {
        let config = config();
        let labels = vec!["Middle".to_string(), "Late".to_string(), "Middle".to_string()];
        let events = event_selection(&config, &labels, None).expect("known events");
        let selected: Vec<&str> = events.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(selected, vec!["Middle", "Late"]);
    }

    #[test]
    fn category_selects_its_events() {
        let config = config();
        let events = event_selection(&config, &[], Some("hurricanes")).expect("known category");
        let selected: Vec<&str> = events.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(selected, vec!["Middle", "Too early"]);

        let err = event_selection(&config, &[], Some("Wildfires")).expect_err("must fail");
        assert!(err.to_string().contains("Hurricanes, Flooding"));
    }

    #[test]
    fn no_selection_means_every_event() {
        let events = event_selection(&config(), &[], None).expect("all events");
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn fetches_prices_for_every_event() {
        let config = config();
        let symbols = vec!["XLU".to_string(), "SPY".to_string()];
        let inputs = fetch_events(&client(), &config.events, &symbols, 20)
            .await
            .expect("fetched");

        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[0].event.label, "Middle");
        assert!(!inputs[0].prices.is_empty());
        assert_eq!(inputs[0].prices.symbols(), symbols.as_slice());
    }

    #[tokio::test]
    async fn aggregate_skips_events_without_a_full_window() {
        let config = config();
        let events = event_selection(&config, &[], Some("Hurricanes")).expect("known category");
        let instruments = vec!["XLU".to_string()];
        let symbols = config.universe().fetch_symbols(&instruments);
        let inputs = fetch_events(&client(), &events, &symbols, config.study.radius)
            .await
            .expect("fetched");

        let study = EventStudyEngine::new(study_parameters(&config))
            .aggregate(&inputs, &instruments, &config.benchmark)
            .expect("aggregate");
        assert_eq!(study.event_count(), 1);
        assert_eq!(study.per_event[0].label, "Middle");
        assert_eq!(study.skipped.len(), 1);
        assert!(study.was_skipped("Too early"));
    }

    #[tokio::test]
    async fn aggregate_command_runs_end_to_end() {
        let config = config();
        let args = AggregateArgs {
            events: vec![],
            category: None,
            industries: vec!["Electric Utilities".to_string()],
            per_event: false,
        };
        handle_aggregate(args, &config, OutputFormat::Json, &client())
            .await
            .expect("aggregate");
    }

    #[tokio::test]
    async fn single_event_runs_end_to_end() {
        let config = config();
        let args = SingleArgs {
            event: "Middle".to_string(),
            industries: vec![],
            no_normalize: false,
        };
        handle_single(args, &config, OutputFormat::Table, &client())
            .await
            .expect("single");
    }

    #[tokio::test]
    async fn all_skipped_events_surface_as_analytics_errors() {
        let config = config();
        let args = AggregateArgs {
            events: vec!["Too early".to_string()],
            category: None,
            industries: vec![],
            per_event: true,
        };
        let err = handle_aggregate(args, &config, OutputFormat::Table, &client())
            .await
            .expect_err("must fail");
        assert!(matches!(
            err.downcast_ref::<AnalyticsError>(),
            Some(AnalyticsError::AllEventsSkipped { .. })
        ));
    }
}
