mod analysis;
mod config;
mod issue;
mod pipeline;
mod report;
mod web;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

/// Issue Triage — fetches a GitHub issue, asks an AI model to classify it,
/// and shows the result as a web dashboard or a terminal report.
#[derive(Parser, Debug)]
#[command(name = "issue-triage", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web dashboard
    Serve {
        /// Listen address (overrides [server] bind in .issue-triage.toml)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Triage one issue and print the report
    Analyze {
        /// Repository URL (e.g., https://github.com/org/repo) or org/repo
        repo_url: String,

        /// Issue number within the repository
        issue_number: u64,

        /// Page of the recent issues list to include
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Optional output file path for markdown report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = config::Config::load()?;

    match cli.command {
        Command::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| config.bind_address().to_string());
            web::serve(&config, &addr).await?;
        }
        Command::Analyze {
            repo_url,
            issue_number,
            page,
            output,
        } => {
            let _main_span = info_span!("issue_analyze", repo_url = %repo_url, issue = issue_number).entered();

            let github = issue::GitHubClient::from_config(&config)?;
            let analyzer = analysis::analyzer_from_config(&config)?;

            let dashboard = pipeline::run(&github, &analyzer, &repo_url, issue_number, page)
                .await
                .map_err(|view| view.error)?;

            info!("generating report");
            report::output(&dashboard, output.as_deref())?;
            info!(issue_type = %dashboard.analysis.issue_type, priority = dashboard.analysis.priority_score, "done");
        }
    }

    Ok(())
}
