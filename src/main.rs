//! litellm-latency - measure chat completion latency through a LiteLLM gateway
//!
//! Sends prompts, streams the reply and reports time to first token, total time
//! and token throughput per model.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use litellm_latency::core::metrics::{Aggregate, HistoryStats, LatencyStats};
use litellm_latency::core::streaming::short_model_name;
use litellm_latency::sdk::ClientConfig;
use litellm_latency::utils::init_logging;
use litellm_latency::{
    ChatRequest, HistoryEntry, LatencyClient, MetricsSummary, RequestOutcome, StreamEvent,
    StreamStatus,
};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "litellm-latency")]
#[command(about = "Measure chat completion latency through a LiteLLM gateway")]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(long, global = true, env = "LITELLM_LATENCY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt and print its metrics
    Send {
        /// Model value, e.g. openai/gpt-4o (defaults to the first catalog entry)
        #[arg(short, long)]
        model: Option<String>,

        /// Request a single JSON response instead of a stream
        #[arg(long)]
        no_stream: bool,

        /// Prompt text
        prompt: String,
    },
    /// Run one prompt against several models and compare them
    Compare {
        /// Comma-separated model values
        #[arg(short, long, value_delimiter = ',', required = true)]
        models: Vec<String>,

        /// How many rounds to run
        #[arg(long, default_value_t = 1)]
        repeat: u32,

        /// Request single JSON responses instead of streams
        #[arg(long)]
        no_stream: bool,

        /// Prompt text
        prompt: String,
    },
    /// List the configured provider/model catalog
    Models {
        /// Only show this provider
        provider: Option<String>,
    },
}

#[derive(Serialize)]
struct OutcomeReport<'a> {
    model: &'a str,
    status: &'a StreamStatus,
    text: &'a str,
    metrics: MetricsSummary,
}

impl<'a> OutcomeReport<'a> {
    fn new(outcome: &'a RequestOutcome) -> Self {
        Self {
            model: &outcome.model,
            status: &outcome.status,
            text: outcome.text(),
            metrics: outcome.summary(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging(cli.log_level.as_deref(), cli.log_json) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Models { provider } => {
            list_models(&config, provider.as_deref(), cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Send {
            model,
            no_stream,
            prompt,
        } => {
            let model = match model {
                Some(model) => model,
                None => config
                    .catalog
                    .values()
                    .next()
                    .map(str::to_string)
                    .context("No model given and the catalog is empty")?,
            };
            let stream = config.stream && !no_stream;
            let client = LatencyClient::new(config)?;
            send(&client, model, prompt, stream, cli.json).await
        }
        Commands::Compare {
            models,
            repeat,
            no_stream,
            prompt,
        } => {
            if repeat == 0 {
                bail!("--repeat must be at least 1");
            }
            let stream = config.stream && !no_stream;
            let client = LatencyClient::new(config)?;
            compare(&client, &models, repeat, prompt, stream, cli.json).await
        }
    }
}

/// Token cancelled on the first Ctrl-C
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling request");
            child.cancel();
        }
    });
    token
}

async fn send(
    client: &LatencyClient,
    model: String,
    prompt: String,
    stream: bool,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let cancel = cancel_on_ctrl_c();
    let mut stdout = std::io::stdout();

    let outcome = client
        .send_with(ChatRequest::new(model, prompt, stream), cancel, |event| {
            if json {
                return;
            }
            if let StreamEvent::TextDelta { content } = event {
                let _ = write!(stdout, "{}", content);
                let _ = stdout.flush();
            }
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&OutcomeReport::new(&outcome))?);
    } else {
        println!();
        print_metrics_panel(&outcome);
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn compare(
    client: &LatencyClient,
    models: &[String],
    repeat: u32,
    prompt: String,
    stream: bool,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let cancel = cancel_on_ctrl_c();
    let mut history = client.new_history();
    let mut outcomes = Vec::new();

    for round in 1..=repeat {
        debug!("Comparison round {}/{}", round, repeat);
        let results = client
            .compare(&prompt, models, stream, cancel.clone())
            .await?;
        outcomes.extend(results);
        if cancel.is_cancelled() {
            break;
        }
    }

    // Stats cover every successful run; the bounded history only keeps the latest ones.
    let entries: Vec<HistoryEntry> = outcomes
        .iter()
        .filter_map(|outcome| outcome.clone().into_history_entry())
        .collect();
    let stats = HistoryStats::from_entries(&entries);
    for entry in entries {
        history.record(entry);
    }

    if json {
        #[derive(Serialize)]
        struct CompareReport<'a> {
            runs: Vec<OutcomeReport<'a>>,
            stats: Option<HistoryStats>,
            recent: Vec<&'a HistoryEntry>,
        }
        let report = CompareReport {
            runs: outcomes.iter().map(OutcomeReport::new).collect(),
            stats,
            recent: history.iter().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_comparison_table(client, &outcomes);
        if let Some(stats) = &stats {
            print_stats(stats);
        }
    }

    Ok(if outcomes.iter().all(RequestOutcome::is_success) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn list_models(config: &ClientConfig, provider: Option<&str>, json: bool) -> anyhow::Result<()> {
    let providers: Vec<_> = match provider {
        Some(name) => {
            let models = config.catalog.models_for(name)?;
            vec![(name.to_string(), models.to_vec())]
        }
        None => config
            .catalog
            .providers()
            .iter()
            .map(|p| (p.provider.clone(), p.models.clone()))
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&providers)?);
        return Ok(());
    }

    for (provider, models) in providers {
        println!("{}", provider);
        for model in models {
            println!("  {:<22} {}", model.name, model.value);
        }
    }
    Ok(())
}

fn fmt_ms(ms: Option<u64>) -> String {
    ms.map(|ms| format!("{} ms", ms)).unwrap_or_else(|| "-".to_string())
}

fn fmt_count(count: Option<u32>) -> String {
    count.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_metrics_panel(outcome: &RequestOutcome) {
    let summary = outcome.summary();

    println!("--------------------------------");
    println!("Model:             {}", outcome.model);
    match &outcome.status {
        StreamStatus::Failed { message } => {
            println!("Status:            failed ({})", message)
        }
        status if status.is_terminal() => println!("Status:            {}", status_label(status)),
        _ => println!("Status:            incomplete"),
    }
    println!("TTFT:              {}", fmt_ms(summary.ttft_ms));
    println!("Total time:        {}", fmt_ms(summary.total_time_ms));
    println!("Generation time:   {}", fmt_ms(summary.generation_time_ms));
    println!("Prompt tokens:     {}", fmt_count(summary.prompt_tokens));
    println!("Completion tokens: {}", fmt_count(summary.completion_tokens));
    println!("Total tokens:      {}", fmt_count(summary.total_tokens));
    if let Some(tps) = summary.tokens_per_second {
        println!("Tokens/s:          {:.1}", tps);
    }
    if let Some(model_used) = &summary.model_used {
        println!("Model used:        {}", model_used);
    }
    if let Some(target) = &summary.fallback_target {
        println!("Fallback to:       {}", target);
    }
}

fn status_label(status: &StreamStatus) -> &'static str {
    match status {
        StreamStatus::Streaming => "streaming",
        StreamStatus::Completed => "completed",
        StreamStatus::Failed { .. } => "failed",
        StreamStatus::Cancelled => "cancelled",
    }
}

fn print_comparison_table(client: &LatencyClient, outcomes: &[RequestOutcome]) {
    println!(
        "{:<24} {:>10} {:>10} {:>8} {:>8}  {}",
        "MODEL", "TTFT", "TOTAL", "TOKENS", "TOK/S", "STATUS"
    );
    for outcome in outcomes {
        let summary = outcome.summary();
        let status = match outcome.error_message() {
            Some(message) => format!("failed: {}", message),
            None => status_label(&outcome.status).to_string(),
        };
        let status = match &summary.fallback_target {
            Some(target) => format!("{} (fallback to {})", status, short_model_name(target)),
            None => status,
        };
        println!(
            "{:<24} {:>10} {:>10} {:>8} {:>8}  {}",
            client.config().catalog.short_name(&outcome.model),
            fmt_ms(summary.ttft_ms),
            fmt_ms(summary.total_time_ms),
            fmt_count(summary.total_tokens),
            summary
                .tokens_per_second
                .map(|tps| format!("{:.1}", tps))
                .unwrap_or_else(|| "-".to_string()),
            status
        );
    }
}

fn print_stats_row(label: &str, stats: &LatencyStats) {
    let fmt = |agg: &Option<Aggregate>| match agg {
        Some(a) => format!(
            "mean {:.0} / median {:.0} / min {:.0} / max {:.0} ms",
            a.mean, a.median, a.min, a.max
        ),
        None => "-".to_string(),
    };
    println!("{} ({} requests)", label, stats.requests);
    println!("  TTFT:  {}", fmt(&stats.ttft));
    println!("  Total: {}", fmt(&stats.total_time));
}

fn print_stats(stats: &HistoryStats) {
    println!();
    for (model, model_stats) in &stats.by_model {
        print_stats_row(model, model_stats);
    }
    if stats.by_model.len() > 1 {
        print_stats_row("All models", &stats.overall);
    }
}
