//! Running the pipeline from the terminal and presenting the result.

use colored::Colorize;
use console::style;
use policy_pipeline::{
    CancellationToken, PipelineConfig, PipelineError, PolicyDocument, PolicyPipeline,
    PolicyRequest,
};

use crate::progress::TerminalProgress;

pub const DISCLAIMER: &str = "This tool generates draft policies for reference only. \
Always consult with qualified legal professionals before implementing any HR policies. \
Policies should be reviewed and customized for your specific organizational needs and local regulations.";

pub const IMPLEMENTATION_TIPS: &[&str] = &[
    "Review the draft with legal counsel familiar with local employment law",
    "Customize it to your organization's size, industry and culture",
    "Train managers on how to apply the policy",
    "Set up a schedule for regular policy reviews",
    "Communicate changes clearly to all employees",
];

pub struct Session {
    pipeline: PolicyPipeline,
    quiet: bool,
}

impl Session {
    pub fn new(config: &PipelineConfig, quiet: bool) -> Result<Self, PipelineError> {
        Ok(Self {
            pipeline: PolicyPipeline::from_config(config)?,
            quiet,
        })
    }

    /// Run one request. Ctrl-C cancels the run instead of killing the process.
    pub async fn generate(&self, request: &PolicyRequest) -> Result<PolicyDocument, PipelineError> {
        let cancel = CancellationToken::new();
        let listener = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        if !self.quiet {
            eprintln!();
            eprintln!(
                "{} {} for {}",
                "Drafting".bright_green().bold(),
                style(request.policy_type()).bold(),
                style(request.location()).bold()
            );
        }

        let progress = TerminalProgress::new(self.quiet);
        let result = self.pipeline.run_with(request, &progress, cancel).await;
        listener.abort();
        result
    }
}

pub fn print_failure(error: &PipelineError) {
    eprintln!();
    eprintln!("{} {}", "✗".bright_red().bold(), error.to_string().red());
    eprintln!("  {}", style(error.user_hint()).yellow());
}

pub fn print_policy(policy: &PolicyDocument) {
    println!();
    println!("{}", "═".repeat(60).bright_cyan());
    println!("{}", style(&policy.title).bold());
    println!(
        "{}",
        style(format!(
            "{} · {} · {}",
            policy.location,
            policy.effective_date.format("%Y-%m-%d"),
            policy.model
        ))
        .dim()
    );
    println!("{}", "═".repeat(60).bright_cyan());
    println!();
    println!("{}", policy.content);
    println!();

    if !policy.sources.is_empty() {
        println!("{}", style("Sources consulted").bold());
        for (i, source) in policy.sources.iter().enumerate() {
            println!("  {}. {}", i + 1, style(source).cyan());
        }
        println!();
    }
}

pub fn print_disclaimer() {
    eprintln!();
    eprintln!("{} {}", "⚠".bright_yellow(), style(DISCLAIMER).yellow());
}

pub fn print_tips() {
    println!("{}", style("Implementation tips").bold());
    for tip in IMPLEMENTATION_TIPS {
        println!("  • {}", tip);
    }
}
