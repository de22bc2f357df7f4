use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use roster_core::scenario::{Scenario, ScenarioRunner};
use roster_core::{
    AgentError, ChatMessage, Config, Role, StopReason, create_provider, get_config_path,
    save_config,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "roster - a tool-calling agent over a plain-text roster file", long_about = None)]
struct Cli {
    /// Records file to operate on (defaults to the configured one)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Replaces the built-in request of the chosen command
    #[arg(short, long, global = true)]
    message: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add short profession comments to records that lack one
    Annotate,
    /// Annotate, rejecting records whose age is not a number
    Validate,
    /// Ask about the notes file, then save a new fact to it
    Remember,
    /// Send a free-form request with every tool available
    Ask { request: String },
    /// Print the effective configuration
    Config {
        /// Also save it to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("{} {:#}", style("❌ Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roster=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default()?;
    if let Some(file) = cli.file {
        config.records_path = file;
    }

    let (scenario, requests) = match cli.command {
        Commands::Config { write } => {
            print!("{}", config.to_toml()?);
            if write {
                let path = get_config_path();
                save_config(&config, &path)?;
                println!("{} {}", style("✓ Saved to").green(), path.display());
            }
            return Ok(());
        }
        Commands::Ask { request } => (Scenario::Ask, vec![cli.message.unwrap_or(request)]),
        Commands::Annotate => (Scenario::Annotate, requests_for(Scenario::Annotate, cli.message)),
        Commands::Validate => (Scenario::Validate, requests_for(Scenario::Validate, cli.message)),
        Commands::Remember => (Scenario::Remember, requests_for(Scenario::Remember, cli.message)),
    };

    let provider = create_provider(&config)?;
    println!(
        "{} {} via {} on {}",
        style("🗂  roster").bold(),
        style(format!("{:?}", scenario).to_lowercase()).cyan(),
        provider.name(),
        config.records_path.display()
    );

    let runner = ScenarioRunner::new(provider, config).with_observer(Arc::new(print_message));

    for request in requests {
        let report = runner.run(scenario, &request).await.map_err(fatal)?;

        match report.stop {
            StopReason::Completed => {}
            StopReason::IterationLimit => {
                println!("{}", style("⚠ Stopped at the iteration limit").yellow())
            }
            StopReason::DecideTimeout => {
                println!("{}", style("⚠ The model did not answer in time").yellow())
            }
        }

        println!(
            "\n{}\n{}\n",
            style("Final answer:").green().bold(),
            report.final_answer()
        );
    }

    Ok(())
}

fn requests_for(scenario: Scenario, message: Option<String>) -> Vec<String> {
    match message {
        Some(message) => vec![message],
        None => scenario
            .default_requests()
            .iter()
            .map(|r| r.to_string())
            .collect(),
    }
}

fn fatal(e: AgentError) -> anyhow::Error {
    anyhow::Error::new(e).context("Agent run aborted")
}

fn print_message(message: &ChatMessage) {
    match message.role {
        Role::System => {}
        Role::User => println!("\n{} {}", style("👤 user:").bold(), message.content),
        Role::Assistant => {
            if message.is_error() {
                println!("{} {}", style("🤖 assistant:").red().bold(), message.content);
            } else if !message.content.is_empty() {
                println!("{} {}", style("🤖 assistant:").cyan().bold(), message.content);
            }
            for call in &message.tool_calls {
                println!(
                    "{} {}({})",
                    style("🔧 call").magenta(),
                    style(&call.name).magenta().bold(),
                    call.arguments
                );
            }
        }
        Role::Tool => {
            let name = message.name.as_deref().unwrap_or("tool");
            match message.error {
                Some(kind) => println!(
                    "{} {}",
                    style(format!("✗ {} [{}]:", name, kind)).red(),
                    message.content
                ),
                None => println!("{} {}", style(format!("✓ {}:", name)).green(), message.content),
            }
        }
    }
}
