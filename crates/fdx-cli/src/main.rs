//! 🚀 fdx-cli — the front door, the bouncer, the maitre d' of forkdex.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 This binary crate is the thin CLI wrapper that loads config,
//! sets up logging, and then lets the real code do the heavy lifting.
//! Like a manager. 🦆

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fdx", about = "Load OpenStreetMap eateries into a search index, then find them again")]
struct Cli {
    /// 🔧 TOML config. If it isn't there, FDX_* env vars have to carry the whole show.
    #[arg(long, short, global = true, env = "FDX_CONFIG", default_value = "fdx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the payload, transform it, and bulk load the index
    Ingest,
    /// Find establishments by cuisine, optionally within one postcode
    Search {
        #[arg(long)]
        cuisine: String,
        #[arg(long)]
        postcode: Option<String>,
    },
}

/// 🚀 main() — where it all begins. The "I pressed F5 and held my breath" moment.
///
/// 🔧 Steps:
/// 1. Init tracing (so we can see what goes wrong, and when)
/// 2. Parse args
/// 3. Load config (the moment of truth)
/// 4. Run the thing (send it and pray 🙏)
/// 5. Handle errors (cry, then exit 1)
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let app_config = load_app_config(&cli.config);

    let result = match cli.command {
        Command::Ingest => ingest(app_config).await,
        Command::Search { cuisine, postcode } => match app_config {
            Ok(app_config) => search(app_config, &cuisine, postcode.as_deref()).await,
            Err(err) => Err(err),
        },
    };

    if let Err(err) = result {
        report_error(&err);
        std::process::exit(1);
    }

    // ✅ If we got here, everything worked. Pop the champagne. 🍾
}

/// 🔧 Find the config file (or don't) and load it, env vars included.
fn load_app_config(config_file: &Path) -> Result<fdx::app_config::AppConfig> {
    // 🔒 Validate the config file exists before we get too emotionally attached
    let config_file_which_is_validated_to_exist = match config_file.try_exists().with_context(|| {
        format!(
            "💀 Couldn't even check whether the configuration file exists. \
             Permissions, maybe? Was checking here: '{}'",
            config_file.display()
        )
    })? {
        true => Some(config_file),
        false => None, // 💤 not there. env vars only.
    };

    fdx::app_config::load_config(config_file_which_is_validated_to_exist)
        .context("💀 In fdx-cli, we couldn't load the config. Take a look at the file and the FDX_* env vars, make sure nothing obvious is missing")
}

/// 🍽️ Run the ingest and print the run outcome JSON, 200 or 500. A config that never
/// loaded is a failed run like any other.
async fn ingest(app_config: Result<fdx::app_config::AppConfig>) -> Result<()> {
    let result = run_ingest_with(app_config).await;
    if let Ok(report) = &result {
        eprintln!("{}", fdx::render_run_summary(report));
    }
    // 🧾 the structured outcome goes to stdout for whoever invoked us; the chain goes to the logs
    println!("{}", outcome_json(&result)?);
    result.map(|_| ())
}

async fn run_ingest_with(app_config: Result<fdx::app_config::AppConfig>) -> Result<fdx::RunReport> {
    fdx::run_ingest(app_config?).await
}

fn outcome_json(result: &Result<fdx::RunReport>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&fdx::RunOutcome::from_result(result))?)
}

async fn search(
    app_config: fdx::app_config::AppConfig,
    cuisine: &str,
    postcode: Option<&str>,
) -> Result<()> {
    let response = fdx::run_search(app_config, cuisine, postcode).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// 🧅 Peel the onion of sadness, one layer at a time, and sniff for connection problems.
fn report_error(err: &anyhow::Error) {
    error!("💀 error: {}", err);
    let mut the_vibes_are_giving_connection_issues = false;
    for cause in err.chain().skip(1) {
        error!("⚠️  cause: {}", cause);
        let cause_str = cause.to_string();
        if cause_str.contains("error sending request")
            || cause_str.contains("connection refused")
            || cause_str.contains("Connection refused")
            || cause_str.contains("tcp connect error")
            || cause_str.contains("dns error")
        {
            the_vibes_are_giving_connection_issues = true;
        }
    }

    if the_vibes_are_giving_connection_issues {
        error!(
            "🔧 hint: looks like a service isn't reachable. \
            Double-check that the search cluster (or the Overpass endpoint) is actually running \
            and that engine_config.OpenSearch.url points at it. If you're using Docker, try \
            `docker ps` to see what's up. Even servers need a nudge sometimes. ☕"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn the_one_where_clap_agrees_with_itself() {
        Cli::command().debug_assert();
    }

    #[test]
    fn the_one_where_search_takes_a_cuisine_and_maybe_a_postcode() {
        let cli = Cli::parse_from(["fdx", "--config", "custom.toml", "search", "--cuisine", "pizza", "--postcode", "94110"]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        match cli.command {
            Command::Search { cuisine, postcode } => {
                assert_eq!(cuisine, "pizza");
                assert_eq!(postcode.as_deref(), Some("94110"));
            }
            Command::Ingest => panic!("💀 expected search, got ingest"),
        }
    }

    #[test]
    fn the_one_where_search_without_a_cuisine_is_refused() {
        assert!(Cli::try_parse_from(["fdx", "search"]).is_err());
    }

    #[tokio::test]
    async fn the_one_where_a_config_that_never_loads_still_answers_with_a_500() -> Result<()> {
        let nowhere = PathBuf::from("/definitely/not/a/real/place/fdx.toml");
        let app_config = load_app_config(&nowhere);
        assert!(app_config.is_err(), "no file and no engine_config env var should not load");

        let result = run_ingest_with(app_config).await;
        let wire: serde_json::Value = serde_json::from_str(&outcome_json(&result)?)?;

        assert_eq!(wire["statusCode"], 500);
        let error = wire["error"].as_str().unwrap_or_default();
        assert!(error.contains("couldn't load the config"), "{error}");
        assert!(error.contains("engine_config"), "{error}");
        Ok(())
    }
}
