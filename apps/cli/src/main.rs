use std::{
    io::Write,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};

use tubeseek_core::{
    ErrorKind, JsonFileTranscripts, Library, Provider, SearchOutcome, Settings, Strategy,
    TubeseekError, VideoSummary, format_hits_readable, format_segments_with_timestamps,
    load_settings, settings_path,
};

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Copy, ValueEnum)]
enum CliProvider {
    Anthropic,
    Grok,
    Openai,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Anthropic => Provider::Anthropic,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliStrategy {
    Lexical,
    Semantic,
}

impl From<CliStrategy> for Strategy {
    fn from(cli: CliStrategy) -> Self {
        match cli {
            CliStrategy::Lexical => Strategy::Lexical,
            CliStrategy::Semantic => Strategy::Semantic,
        }
    }
}

#[derive(Parser)]
#[command(name = "tubeseek")]
#[command(about = "Load YouTube transcripts and find the moments that match your query")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Read the transcript from a JSON file of {start, duration, text} instead of YouTube
    #[arg(long, global = true)]
    transcript: Option<PathBuf>,

    /// AI provider for semantic search
    #[arg(short, long, global = true)]
    provider: Option<CliProvider>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, clap::Args)]
struct SearchArgs {
    /// Ranking strategy (defaults to the configured one)
    #[arg(short, long)]
    strategy: Option<CliStrategy>,

    /// Maximum number of results
    #[arg(short = 'n', long)]
    top: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch and segment a video's transcript
    Load {
        /// Video URL or id
        url: String,
    },
    /// Search a video's transcript
    Search {
        /// Video URL or id
        url: String,

        /// Search query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        #[command(flatten)]
        args: SearchArgs,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print every segment with its timestamp
    Segments {
        /// Video URL or id
        url: String,
    },
    /// Load a video once and answer queries from stdin
    Repl {
        /// Video URL or id
        url: String,

        #[command(flatten)]
        args: SearchArgs,
    },
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

async fn load_video(library: &Library, url: &str) -> Result<VideoSummary> {
    let step_start = Instant::now();
    let spinner = create_spinner("Fetching transcript...");
    match library.load(url).await {
        Ok(summary) => {
            spinner.finish_with_message(format!(
                "{} Transcript loaded ({} segments) {}",
                style("✓").green().bold(),
                summary.segment_count,
                style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
            ));
            Ok(summary)
        }
        Err(e) => {
            spinner.finish_and_clear();
            Err(e.into())
        }
    }
}

async fn run_search(
    library: &Library,
    video_id: &str,
    query: &str,
    strategy: Strategy,
    top_n: usize,
) -> Result<SearchOutcome> {
    let step_start = Instant::now();
    let spinner = create_spinner(&format!("Searching ({})...", strategy));
    let outcome = library.search(video_id, query, strategy, top_n).await;
    match &outcome {
        Ok(outcome) => spinner.finish_with_message(format!(
            "{} {} result(s) {}",
            style("✓").green().bold(),
            outcome.hits().len(),
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        )),
        Err(_) => spinner.finish_and_clear(),
    }
    Ok(outcome?)
}

fn print_outcome(outcome: &SearchOutcome) {
    println!("{}", style("─".repeat(60)).dim());
    if outcome.is_empty() {
        println!("{}", style("No matches found").yellow());
        return;
    }
    print!("{}", format_hits_readable(outcome));
}

async fn repl(
    library: &Library,
    video_id: &str,
    mut strategy: Strategy,
    top_n: usize,
) -> Result<()> {
    println!(
        "{}",
        style("Type a query, /lexical or /semantic to switch strategy, /quit to exit").dim()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style(format!("[{}] ›", strategy)).cyan());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/lexical" => strategy = Strategy::Lexical,
            "/semantic" => strategy = Strategy::Semantic,
            query => match run_search(library, video_id, query, strategy, top_n).await {
                Ok(outcome) => print_outcome(&outcome),
                Err(e) => eprintln!("{} {}", style("Error:").red().bold(), e),
            },
        }
    }

    Ok(())
}

fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<TubeseekError>().map(TubeseekError::kind) {
        Some(ErrorKind::InvalidInput) => 2,
        _ => 1,
    }
}

async fn run(cli: Cli, settings: Settings) -> Result<()> {
    let mut library = Library::from_settings(&settings);
    if let Some(path) = &cli.transcript {
        library = library.with_transcripts(Arc::new(JsonFileTranscripts::new(path)));
    }

    let strategy_for = |args: &SearchArgs| {
        args.strategy
            .map(Strategy::from)
            .unwrap_or(settings.search.strategy)
    };
    let top_for = |args: &SearchArgs| args.top.unwrap_or(settings.search.top_n);

    println!(
        "\n{}  {}\n",
        style("tubeseek").cyan().bold(),
        style("Transcript Search").dim()
    );

    match cli.command {
        Command::Load { url } => {
            let summary = load_video(&library, &url).await?;
            println!(
                "{} {} {}",
                style("Video:").dim(),
                style(&summary.video_id).yellow(),
                if summary.cached {
                    style("(cached)").dim().to_string()
                } else {
                    String::new()
                }
            );
            println!(
                "{} {}",
                style("Thumbnail:").dim(),
                style(&summary.thumbnail).cyan()
            );
        }
        Command::Search {
            url,
            query,
            args,
            json,
        } => {
            let summary = load_video(&library, &url).await?;
            let query = query.join(" ");
            let outcome = run_search(
                &library,
                &summary.video_id,
                &query,
                strategy_for(&args),
                top_for(&args),
            )
            .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(outcome.hits())?);
            } else {
                print_outcome(&outcome);
            }
        }
        Command::Segments { url } => {
            let summary = load_video(&library, &url).await?;
            let video = library.segments(&summary.video_id)?;
            println!("{}", style("─".repeat(60)).dim());
            println!("{}", format_segments_with_timestamps(&video.segments));
        }
        Command::Repl { url, args } => {
            let summary = load_video(&library, &url).await?;
            repl(
                &library,
                &summary.video_id,
                strategy_for(&args),
                top_for(&args),
            )
            .await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };
    if let Some(provider) = cli.provider {
        settings.ranking.provider = provider.into();
    }
    tracing::debug!(path = %settings_path().display(), ?settings, "settings resolved");

    if let Err(e) = run(cli, settings).await {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(exit_code(&e));
    }

    Ok(())
}
