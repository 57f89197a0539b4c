//! `hr-policy`: draft country-specific HR policies from official sources.

mod catalog;
mod export;
mod interactive;
mod progress;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use console::style;
use policy_pipeline::{browser::find_chrome_binary, PipelineConfig, PolicyRequest};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::export::ExportFormat;
use crate::session::Session;

#[derive(Parser)]
#[command(name = "hr-policy")]
#[command(about = "Draft country-specific HR policies grounded in official sources")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Show debug logs from the pipeline
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a policy without prompts
    Generate(GenerateArgs),
    /// List the built-in policy types and countries
    Catalog,
    /// Check credentials and the browser installation
    Doctor,
}

#[derive(Args)]
struct GenerateArgs {
    /// Country the policy applies to
    #[arg(long)]
    country: String,

    /// Policy type, e.g. "Remote Work Policy"
    #[arg(long)]
    policy: String,

    /// State or province within the country
    #[arg(long)]
    region: Option<String>,

    /// Directory to write the policy into
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// File format to write
    #[arg(long, value_enum, default_value_t = ExportFormat::Md)]
    format: ExportFormat,

    /// Print the policy to stdout
    #[arg(long)]
    print: bool,

    /// Skip writing files
    #[arg(long)]
    no_save: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Command::Generate(args)) => generate(args).await,
        Some(Command::Catalog) => {
            print_catalog();
            Ok(())
        }
        Some(Command::Doctor) => doctor(),
        None => {
            let config = load_config()?;
            let session = Session::new(&config, false)?;
            interactive::run(&session).await
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,policy_pipeline=debug,chromiumoxide=warn"
    } else {
        "warn,chromiumoxide=off"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config() -> Result<PipelineConfig> {
    PipelineConfig::from_env()
        .context("Failed to load configuration. Set TAVILY_API_KEY and GEMINI_API_KEY in your environment or .env file")
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let config = load_config()?;
    let session = Session::new(&config, args.quiet)?;

    let mut request = PolicyRequest::new(&args.country, &args.policy)?;
    if let Some(region) = &args.region {
        request = request.with_region(region)?;
    }

    let policy = match session.generate(&request).await {
        Ok(policy) => policy,
        Err(e) => {
            session::print_failure(&e);
            return Err(e.into());
        }
    };

    if args.print {
        println!("{}", policy.content);
    }

    if !args.no_save {
        for path in export::save(&policy, &args.out_dir, args.format)? {
            eprintln!("{} {}", "✓ Saved".bright_green(), path.display());
        }
    }

    if !args.quiet {
        session::print_disclaimer();
    }
    Ok(())
}

fn print_catalog() {
    for category in catalog::POLICY_CATEGORIES {
        println!("{}", style(category.name).bold());
        for policy in category.policies {
            println!("  {}", policy);
        }
    }
    println!();
    println!("{}", style("Countries").bold());
    for country in catalog::POPULAR_COUNTRIES {
        if catalog::is_federal(country) {
            println!("  {} {}", country, style("(accepts --region)").dim());
        } else {
            println!("  {}", country);
        }
    }
}

fn doctor() -> Result<()> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let mut healthy = true;

    for key in ["TAVILY_API_KEY", "GEMINI_API_KEY"] {
        let set = std::env::var(key).is_ok_and(|v| !v.trim().is_empty());
        report(key, set, if set { "set" } else { "not set" });
        healthy &= set;
    }

    match PipelineConfig::from_env() {
        Ok(config) => {
            report("configuration", true, &format!("model {}", config.gemini_model));
        }
        Err(e) => {
            report("configuration", false, &e.to_string());
            healthy = false;
        }
    }

    let chrome_bin = std::env::var("CHROME_BIN").ok().map(PathBuf::from);
    match find_chrome_binary(chrome_bin.as_deref()) {
        Some(path) => report("browser", true, &path.display().to_string()),
        None => {
            report(
                "browser",
                false,
                "no Chrome or Chromium found (set CHROME_BIN)",
            );
            healthy = false;
        }
    }

    if !healthy {
        anyhow::bail!("environment is not ready");
    }
    println!();
    println!("{}", "Ready to draft policies.".bright_green().bold());
    Ok(())
}

fn report(name: &str, ok: bool, detail: &str) {
    let marker = if ok { "✓".bright_green() } else { "✗".bright_red() };
    println!("{} {:<16} {}", marker, name, style(detail).dim());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_args() {
        let cli = Cli::try_parse_from([
            "hr-policy",
            "generate",
            "--country",
            "Canada",
            "--policy",
            "Overtime Policy",
            "--region",
            "Ontario",
            "--format",
            "both",
            "--no-save",
        ])
        .unwrap();

        let Some(Command::Generate(args)) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.country, "Canada");
        assert_eq!(args.region.as_deref(), Some("Ontario"));
        assert_eq!(args.format, ExportFormat::Both);
        assert!(args.no_save);
        assert_eq!(args.out_dir, PathBuf::from("."));
    }

    #[test]
    fn test_no_subcommand_is_interactive() {
        let cli = Cli::try_parse_from(["hr-policy", "-v"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.verbose);
    }

    #[test]
    fn test_generate_requires_country() {
        assert!(Cli::try_parse_from(["hr-policy", "generate", "--policy", "Overtime Policy"]).is_err());
    }
}
