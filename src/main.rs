use anyhow::{Result, bail};
use clap::Parser;
use colored::*;
use tracing_subscriber::EnvFilter;

use dream_architect::build_session;
use dream_architect::config::Config;
use dream_architect::orchestrator::{Display, RequestOutcome};
use dream_architect::personas::find_preset;
use dream_architect::session::Session;
use dream_architect::terminal::render_display;

/// Ask a mentor persona for a five-year growth roadmap
#[derive(Debug, Parser)]
#[command(name = "dream-architect", version, about)]
struct Cli {
    /// Preset persona id (MUSK, KHAN, FEIFEI, HINTON)
    #[arg(long, conflicts_with = "custom")]
    persona: Option<String>,

    /// Invite any mentor by name instead of a preset
    #[arg(long)]
    custom: Option<String>,

    /// Your age
    #[arg(long)]
    age: Option<String>,

    /// 男孩, 女孩, 学生, or free text
    #[arg(long)]
    gender: Option<String>,

    /// What you want to become
    #[arg(long)]
    dream: Option<String>,

    /// List preset personas and exit
    #[arg(long)]
    list: bool,

    /// Print the result as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the plan
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load();
    let mut session = build_session(&config)?;

    if cli.list {
        for p in session.presets() {
            println!("{:<8} {} - {}", p.id.bold(), p.name, p.title.bright_black());
        }
        return Ok(());
    }

    if let Some(age) = cli.age {
        session.set_age(age);
    }
    if let Some(gender) = cli.gender {
        session.set_gender(gender);
    }
    if let Some(dream) = cli.dream {
        session.set_dream(dream);
    }

    let outcome = match (cli.custom.as_deref(), cli.persona.as_deref()) {
        (Some(name), _) => {
            if name.trim().is_empty() {
                bail!("custom mentor name must not be blank");
            }
            print_caption(&session, name);
            session.submit_custom(name).await
        }
        (None, Some(id)) => {
            let Some(preset) = find_preset(session.presets(), id) else {
                bail!("unknown persona '{}', try --list", id);
            };
            print_caption(&session, &preset.name.clone());
            // Selecting the start-up persona is not a change, so request it directly
            match session.select_preset(id).await? {
                Some(outcome) => Some(outcome),
                None => Some(session.start().await),
            }
        }
        (None, None) => {
            print_caption(&session, &session.selected().name.clone());
            Some(session.start().await)
        }
    };
    if outcome == Some(RequestOutcome::Cached) {
        tracing::debug!("Served plan from cache");
    }

    let persona = session.selected().clone();
    let rendered = session
        .display(|display| match display {
            Display::Ready(result) if cli.json => {
                serde_json::to_string_pretty(result).map_err(anyhow::Error::from)
            }
            Display::Failed(message) => Err(anyhow::anyhow!(message.to_string())),
            other => Ok(render_display(&persona, other, &session.loading_caption())),
        })
        .await?;

    println!("{rendered}");
    Ok(())
}

fn print_caption(session: &Session, persona_name: &str) {
    let (_, detail) = session.loading_caption();
    eprintln!("{}", format!("Connecting to {persona_name}...").bright_blue());
    eprintln!("{}", detail.bright_black());
}
