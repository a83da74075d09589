//! Trial Runner CLI
//!
//! Scenario → scripted navigation session → experiment log / CSV / report

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "trial_runner")]
#[command(about = "Replay scripted navigation trials", long_about = None)]
struct Cli {
    /// Log level filter (e.g. "info", "nav_core=debug")
    #[arg(long, global = true, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Run every trial in a scenario file
    Run {
        /// Scenario file (.json, .yaml, .yml)
        #[arg(long)]
        scenario: PathBuf,

        /// Write one CSV row per trial
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the session report as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the experiment log lines
        #[arg(long, default_value = "false")]
        print_log: bool,
    },

    /// Validate a scenario file without running it
    Check {
        #[arg(long)]
        scenario: PathBuf,
    },

    /// Print the JSON schema of scenario files
    Schema {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&cli.log))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { scenario, csv, report, print_log } => {
            println!("🧭 Running scenario...");
            println!("   Input:  {}", scenario.display());

            let loaded = trial_runner::Scenario::load(&scenario)?;
            println!("   Trials: {}", loaded.trials.len());
            println!("   Frames: {}", loaded.frame_count());

            let session = trial_runner::run_scenario(&loaded)?;
            print_summary(&session);

            if print_log {
                println!();
                for line in &session.log_lines {
                    println!("{}", line);
                }
            }

            if let Some(csv_path) = csv {
                let rows = trial_runner::write_csv(&csv_path, &session)?;
                println!("\n📄 CSV saved to: {} ({} rows)", csv_path.display(), rows);
            }

            if let Some(report_path) = report {
                trial_runner::write_report(&report_path, &session)?;
                println!("\n📄 Report saved to: {}", report_path.display());
            }
        }

        Commands::Check { scenario } => {
            let loaded = trial_runner::Scenario::load(&scenario)?;
            println!(
                "✅ {} is valid ({} destinations, {} trials, {} frames)",
                scenario.display(),
                loaded.destinations.len(),
                loaded.trials.len(),
                loaded.frame_count()
            );
        }

        Commands::Schema { out } => {
            let schema = schemars::schema_for!(trial_runner::Scenario);
            let json = serde_json::to_string_pretty(&schema)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("📄 Schema saved to: {}", path.display());
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_summary(session: &trial_runner::SessionReport) {
    println!("\n✅ Session complete!");
    for (i, trial) in session.trials.iter().enumerate() {
        let outcome = format!("{:?}", trial.outcome);
        match &trial.record {
            Some(r) => println!(
                "   #{:<3} {:<10} {:<16} optimal {:>8.2}  actual {:>8.2}  excess {:>8.2}  {:>6.2}s",
                i + 1,
                outcome,
                r.target_name,
                r.optimal_path,
                r.actual_path,
                r.excess_path,
                r.route_duration
            ),
            None => println!("   #{:<3} {}", i + 1, outcome),
        }
    }
    println!("   Checksum: {}", session.checksum);
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("trial_runner CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
