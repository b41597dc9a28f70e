use anyhow::Context;
use clap::Parser;
use colored::*;
use station_spread::cli::{
    args::Args,
    commands::{self, RunSummary},
};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    let args = Args::parse();

    match run(args) {
        Ok(summary) if summary.has_failures() => {
            eprintln!(
                "{} {} region(s) failed",
                "Warning:".bright_yellow(),
                summary.failures.len()
            );
            process::exit(2);
        }
        Ok(_) => process::exit(0),
        Err(error) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), error);
            process::exit(1);
        }
    }
}

fn run(args: Args) -> anyhow::Result<RunSummary> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

    runtime.block_on(async {
        // Cancellation token shared with every region task for graceful shutdown
        let cancellation_token = CancellationToken::new();

        let signal_token = cancellation_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nReceived CTRL+C, stopping after the current year of each region...");
                signal_token.cancel();
            }
        });

        let summary = commands::run(args, cancellation_token)
            .await
            .context("Station spread analysis failed")?;
        Ok(summary)
    })
}
