use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use podreport_export::{ExportOutcome, ReportExporter};
use podreport_k8s::collect_inventory;

mod config;

use config::{FileConfig, Settings};

/// podreport - Export every pod in a Kubernetes cluster to a CSV report
#[derive(Parser, Debug)]
#[command(name = "podreport")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Kubernetes context name (defaults to the kubeconfig's current context)
    #[arg(long, value_name = "CONTEXT")]
    context: Option<String>,

    /// Path to the kubeconfig file
    #[arg(long, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Destination of the CSV report [default: pods_report.csv]
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Number of objects to request per list call
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    page_size: Option<u32>,

    /// Path to a config file (defaults to <config dir>/podreport/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let file = FileConfig::load(args.config.as_deref())?;
    let settings = Settings::resolve(
        file,
        args.kubeconfig,
        args.context,
        args.output,
        args.page_size,
    );
    tracing::debug!(?settings, "Resolved settings");

    let inventory = collect_inventory(&settings.kube).await?;
    if !inventory.has_context() {
        println!("Cannot find any context in kube-config file.");
    }

    match ReportExporter::new(settings.output).export(&inventory.pods)? {
        ExportOutcome::Empty => println!("No pods to export"),
        ExportOutcome::Written { rows, path } => {
            println!("\nExported {} pods to {}", rows, path.display());
        }
    }

    Ok(())
}
