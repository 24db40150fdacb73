//! Stocklens CLI
//!
//! Fetches a snapshot of financial data for a ticker, renders the numeric
//! metrics, and prints an AI-generated assessment below them.
//!
//! # Usage
//!
//! ```bash
//! export FMP_API_KEY="..."
//! export OPENAI_API_KEY="..."
//!
//! # One-shot analysis
//! stocklens AAPL
//!
//! # Interactive session
//! stocklens
//! ```

mod render;

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use stocklens_core::{AnalysisEngine, AnalysisSession, LensConfig, LensError};
use stocklens_llm::providers::{OpenAiConfig, OpenAiProvider};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stocklens")]
#[command(about = "AI-powered stock snapshot analysis", long_about = None)]
struct Args {
    /// Ticker symbol to analyze; omit to start an interactive session
    ticker: Option<String>,

    /// Override the completion model
    #[arg(long)]
    model: Option<String>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,stocklens_core=info")),
        )
        .init();
}

fn print_banner() {
    println!(
        r"
╔══════════════════════════════════════════════╗
║                  stocklens                   ║
║                                              ║
║  Enter a ticker symbol (e.g. AAPL) to run    ║
║  an analysis. A new entry supersedes any     ║
║  analysis still in flight.                   ║
║                                              ║
║  exit - leave the session                    ║
╚══════════════════════════════════════════════╝
"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    // Both credentials are required up front; a missing key is fatal before
    // any network call is attempted.
    let mut config = LensConfig::from_env()?;
    if let Some(model) = args.model {
        config.model = model;
    }
    let config = Arc::new(config);

    let openai_config =
        OpenAiConfig::from_env()?.with_timeout(config.completion_timeout.as_secs());
    let provider = Arc::new(OpenAiProvider::with_config(openai_config)?);

    let engine = Arc::new(AnalysisEngine::new(Arc::clone(&config), provider)?);
    info!(model = %config.model, "engine ready");

    match args.ticker {
        Some(symbol) => run_once(&engine, &symbol).await,
        None => run_repl(engine).await,
    }
}

async fn run_once(engine: &AnalysisEngine, symbol: &str) -> anyhow::Result<()> {
    match engine.analyze(symbol).await {
        Ok(analysis) => {
            println!("{}", render::format_analysis(&analysis));
            Ok(())
        }
        Err(LensError::TickerNotFound(symbol)) => {
            eprintln!(
                "No data found for {symbol}. Please check the ticker symbol and try again."
            );
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

async fn run_repl(engine: Arc<AnalysisEngine>) -> anyhow::Result<()> {
    print_banner();

    let session = AnalysisSession::new(engine);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("ticker> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                // EOF
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("Goodbye!");
            break;
        }

        match session.analyze(input).await {
            Ok(analysis) => println!("{}\n", render::format_analysis(&analysis)),
            Err(LensError::TickerNotFound(symbol)) => {
                eprintln!("No data found for {symbol}. Please check the ticker symbol and try again.\n");
            }
            Err(err) => eprintln!("Error: {err}\n"),
        }
    }

    Ok(())
}
