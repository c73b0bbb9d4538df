//! Signage control panel
//!
//! Terminal front end for the slide-management API served by `signaged`.

mod panel;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::Input;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use signage_common::ErrorCode;
use signage_common::config::env::EnvParser;
use signage_common::config::load_config;

use crate::panel::{
    ConsoleView, HttpSlideApi, RemoveOutcome, SelectFailurePolicy, SelectOutcome, SlideApi,
    SlidePanel,
};

#[derive(Parser)]
#[command(name = "signage")]
#[command(author, version, about = "Signage control panel")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "SIGNAGE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Base URL of the signage daemon
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive control panel
    Panel {
        /// Keep the previous selection when showing a slide fails
        #[arg(long)]
        keep_selection: bool,
    },

    /// Show the markup of a slide
    Show { id: String },

    /// Remove a slide
    Rm {
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// List slide ids
    List,

    /// Print the API error code catalog
    Errors {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct CatalogEntry {
    code: u8,
    name: &'static str,
    short: &'static str,
    long: &'static str,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let mut env = EnvParser::new();
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(env.get_log_level("LOG_LEVEL", "warn").value)
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    for e in env.errors() {
        warn!("{}", e);
    }

    let loaded = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let server_url = cli.server.unwrap_or(loaded.config.client.server_url);
    debug!(server = %server_url, "Using signage daemon");

    match cli.command {
        Commands::Errors { json } => print_catalog(json),
        Commands::List => {
            let api = HttpSlideApi::new(server_url);
            let ids = api.list_slides().await?;
            ConsoleView::new(true).set_slide_buttons(ids);
            Ok(())
        }
        Commands::Show { id } => {
            let panel = SlidePanel::new(HttpSlideApi::new(server_url), ConsoleView::new(true));
            match panel.select(&id).await {
                SelectOutcome::Shown => Ok(()),
                SelectOutcome::Failed(e) => Err(e).context(format!("Failed to show slide '{id}'")),
                SelectOutcome::Superseded => Ok(()),
            }
        }
        Commands::Rm { id, yes } => {
            let panel = SlidePanel::new(HttpSlideApi::new(server_url), ConsoleView::new(yes));
            if let SelectOutcome::Failed(e) = panel.select(&id).await {
                return Err(e).context(format!("Failed to load slide '{id}'"));
            }
            report_remove(panel.remove().await)
        }
        Commands::Panel { keep_selection } => {
            let policy = if keep_selection {
                SelectFailurePolicy::KeepSelection
            } else {
                SelectFailurePolicy::ClearSelection
            };
            run_panel(SlidePanel::with_policy(
                HttpSlideApi::new(server_url),
                ConsoleView::new(false),
                policy,
            ))
            .await
        }
    }
}

fn print_catalog(json: bool) -> Result<()> {
    let entries: Vec<CatalogEntry> = ErrorCode::all()
        .iter()
        .map(|code| CatalogEntry {
            code: code.code_number(),
            name: code.name(),
            short: code.short(),
            long: code.long(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in entries {
        println!(
            "{:>3}  {:<28} {}",
            entry.code,
            style(entry.name).bold(),
            entry.short
        );
    }
    Ok(())
}

fn report_remove(outcome: RemoveOutcome) -> Result<()> {
    match outcome {
        RemoveOutcome::Removed(id) => {
            println!("{} Removed slide '{}'", style("✓").green(), id);
            Ok(())
        }
        RemoveOutcome::Cancelled => {
            println!("Cancelled");
            Ok(())
        }
        RemoveOutcome::NothingSelected => Ok(()),
        RemoveOutcome::Failed(e) => Err(e).context("Failed to remove slide"),
    }
}

async fn refresh_buttons(panel: &SlidePanel<HttpSlideApi, ConsoleView>) {
    match panel.api().list_slides().await {
        Ok(ids) => panel.view().set_slide_buttons(ids),
        Err(e) => warn!("Failed to list slides: {}", e),
    }
}

const PANEL_HELP: &str = "Commands: select <id> | rm | new | list | help | quit";

async fn run_panel(panel: SlidePanel<HttpSlideApi, ConsoleView>) -> Result<()> {
    println!(
        "{} connected to {}",
        style("signage panel").bold(),
        panel.api().base_url()
    );
    println!("{PANEL_HELP}");
    refresh_buttons(&panel).await;

    loop {
        let prompt = match panel.selected().id() {
            Some(id) => format!("signage [{id}]"),
            None => "signage".to_string(),
        };
        let line: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .context("Failed to read command")?;

        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (None, _) => {}
            (Some("select" | "show"), Some(id)) => {
                if let SelectOutcome::Failed(e) = panel.select(id).await {
                    let code = e.code().unwrap_or(ErrorCode::Internal);
                    eprintln!("{} {} ({})", style("error:").red().bold(), e, code.name());
                }
            }
            (Some("select" | "show"), None) => println!("Usage: select <id>"),
            (Some("rm"), _) => {
                if let Err(e) = report_remove(panel.remove().await) {
                    eprintln!("{} {:#}", style("error:").red().bold(), e);
                }
            }
            (Some("new"), _) => panel.create(),
            (Some("list"), _) => refresh_buttons(&panel).await,
            (Some("help"), _) => println!("{PANEL_HELP}"),
            (Some("quit" | "exit"), _) => break,
            (Some(other), _) => println!("Unknown command '{other}'. {PANEL_HELP}"),
        }
    }
    Ok(())
}
