//! Menu-driven flow used when no subcommand is given.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use policy_pipeline::{PolicyDocument, PolicyRequest};

use crate::catalog::{self, POLICY_CATEGORIES, POPULAR_COUNTRIES};
use crate::export::{self, ExportFormat};
use crate::session::{self, Session};

pub async fn run(session: &Session) -> Result<()> {
    let term = Term::stdout();
    let theme = ColorfulTheme::default();

    print_banner(&term)?;

    loop {
        let policy_type = choose_policy(&theme, &term)?;
        let (country, region) = choose_location(&theme, &term)?;

        let request = match PolicyRequest::new(&country, &policy_type)
            .and_then(|r| r.with_region(region.as_deref().unwrap_or_default()))
        {
            Ok(request) => request,
            Err(e) => {
                session::print_failure(&e);
                continue;
            }
        };

        let proceed = Confirm::with_theme(&theme)
            .with_prompt(format!(
                "Generate a {} for {}?",
                request.policy_type(),
                request.location()
            ))
            .default(true)
            .interact_on(&term)?;

        if proceed {
            match session.generate(&request).await {
                Ok(policy) => {
                    session::print_policy(&policy);
                    offer_export(&theme, &term, &policy)?;
                    session::print_tips();
                }
                Err(e) => session::print_failure(&e),
            }
        }

        println!();
        let again = Confirm::with_theme(&theme)
            .with_prompt("Draft another policy?")
            .default(false)
            .interact_on(&term)?;
        if !again {
            break;
        }
    }

    session::print_disclaimer();
    println!("{}", "👋 Goodbye!".bright_blue());
    Ok(())
}

fn print_banner(term: &Term) -> Result<()> {
    term.clear_screen()?;
    println!(
        "{}",
        "╔════════════════════════════════════════╗".bright_cyan()
    );
    println!(
        "{}",
        "║        HR Policy Drafting Tool         ║".bright_cyan()
    );
    println!(
        "{}",
        "╚════════════════════════════════════════╝".bright_cyan()
    );
    println!();
    println!(
        "{}",
        style("Drafts country-specific HR policies from official sources.").dim()
    );
    println!();
    Ok(())
}

fn choose_policy(theme: &ColorfulTheme, term: &Term) -> Result<String> {
    loop {
        let mut options: Vec<&str> = POLICY_CATEGORIES.iter().map(|c| c.name).collect();
        options.push("✏️  Custom policy type");

        let category = Select::with_theme(theme)
            .with_prompt("Which kind of policy?")
            .items(&options)
            .default(0)
            .interact_on(term)?;

        let Some(category) = POLICY_CATEGORIES.get(category) else {
            return Ok(Input::<String>::with_theme(theme)
                .with_prompt("Policy type")
                .validate_with(|input: &String| -> Result<(), &str> {
                    if input.trim().is_empty() {
                        Err("Please enter a policy type")
                    } else {
                        Ok(())
                    }
                })
                .interact_text_on(term)?
                .trim()
                .to_string());
        };

        let mut policies: Vec<&str> = category.policies.to_vec();
        policies.push("← Back");

        let choice = Select::with_theme(theme)
            .with_prompt(category.name)
            .items(&policies)
            .default(0)
            .interact_on(term)?;

        if let Some(policy) = category.policies.get(choice) {
            return Ok(policy.to_string());
        }
    }
}

fn choose_location(theme: &ColorfulTheme, term: &Term) -> Result<(String, Option<String>)> {
    let mut options: Vec<&str> = POPULAR_COUNTRIES.to_vec();
    options.push("🌍 Other country");

    let choice = Select::with_theme(theme)
        .with_prompt("Which country?")
        .items(&options)
        .default(0)
        .interact_on(term)?;

    let country = match POPULAR_COUNTRIES.get(choice) {
        Some(country) => country.to_string(),
        None => Input::<String>::with_theme(theme)
            .with_prompt("Country")
            .validate_with(|input: &String| -> Result<(), &str> {
                if input.trim().is_empty() {
                    Err("Please enter a country")
                } else {
                    Ok(())
                }
            })
            .interact_text_on(term)?
            .trim()
            .to_string(),
    };

    if !catalog::is_federal(&country) {
        return Ok((country, None));
    }

    let region: String = Input::with_theme(theme)
        .with_prompt(format!(
            "Specific {} (optional, press Enter to skip)",
            catalog::region_label(&country)
        ))
        .allow_empty(true)
        .interact_text_on(term)?;
    let region = region.trim();

    Ok((country, (!region.is_empty()).then(|| region.to_string())))
}

fn offer_export(theme: &ColorfulTheme, term: &Term, policy: &PolicyDocument) -> Result<()> {
    let options = [
        "📝 Save as Markdown (.md)",
        "📄 Save as text (.txt)",
        "💾 Save both",
        "⏭  Don't save",
    ];

    let format = match Select::with_theme(theme)
        .with_prompt("Save this policy?")
        .items(&options)
        .default(0)
        .interact_on(term)?
    {
        0 => ExportFormat::Md,
        1 => ExportFormat::Txt,
        2 => ExportFormat::Both,
        _ => return Ok(()),
    };

    let dir: String = Input::with_theme(theme)
        .with_prompt("Output directory")
        .default(".".to_string())
        .interact_text_on(term)?;

    match export::save(policy, &PathBuf::from(dir.trim()), format) {
        Ok(paths) => {
            for path in paths {
                println!("{} {}", "✓ Saved".bright_green(), path.display());
            }
        }
        Err(e) => println!("{} {:#}", "✗ Could not save:".bright_red(), e),
    }
    println!();
    Ok(())
}
