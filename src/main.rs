//! meeting-scribe CLI entrypoint
//!
//! No flags: one invocation performs one scan-and-drain cycle and prints
//! the marker-prefixed JSON report as its final stdout line. Per-task
//! failures never change the exit code; a scheduler can fire this on an
//! interval and let the run lock sort out overlaps.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use meeting_scribe::adapters::{MinutesSummarizer, WhisperTranscriber};
use meeting_scribe::{logging, Config, Coordinator};

/// meeting-scribe - media-to-minutes pipeline runner
#[derive(Parser, Debug)]
#[command(name = "meeting-scribe")]
#[command(version, about, long_about = None)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a .env beside the deployment.
    dotenv::dotenv().ok();

    let _cli = Cli::parse();

    let config = Config::load()?;
    logging::init(&config.log_path)?;

    info!("meeting-scribe starting");

    let transcriber = WhisperTranscriber::new(config.whisper.clone());
    let summarizer = MinutesSummarizer::new(config.llm.clone());
    let coordinator = Coordinator::new(config, Box::new(transcriber), Box::new(summarizer));

    let report = coordinator.run().await?;

    // The downstream consumer scrapes this line; it must be last on stdout.
    let line = report.to_stdout_line();
    info!("{}", line);
    println!("\n{}", line);

    Ok(())
}
