// ABOUTME: `promptroute` binary: routes prompts and inspects profiles from the command line
// ABOUTME: Loads layered configuration, reloads the profile directory, then runs one command

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use promptroute_api::{ProfileSummary, ProfileWatcher, PromptRouteService, ReloadResponse};
use promptroute_core::{ConfigManager, LoggingConfig, MetadataOverrides, PromptRouteConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, Registry};

#[derive(Parser)]
#[command(
    name = "promptroute",
    version,
    author,
    about = "PromptRoute - route prompts to instruction profiles",
    long_about = "PromptRoute classifies a prompt with deterministic keyword tables and selects the best matching instruction profile from a directory of markdown documents."
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[arg(long, global = true, help = "Configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        env = "PROMPTROUTE_PROFILES_DIR",
        help = "Profile directory (overrides configuration)"
    )]
    profiles_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Print JSON instead of human-readable output")]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Route a prompt to the best matching profile")]
    Route {
        #[arg(help = "Prompt text")]
        prompt: String,

        #[arg(long, help = "Override the detected intent")]
        intent: Option<String>,

        #[arg(long, help = "Override the detected domain")]
        domain: Option<String>,

        #[arg(long, value_delimiter = ',', help = "Override detected topics (comma separated)")]
        topics: Option<Vec<String>>,

        #[arg(long, help = "Audience hint")]
        audience: Option<String>,

        #[arg(long, help = "Priority hint")]
        priority: Option<String>,

        #[arg(long, help = "Print the selected profile's instructions")]
        instructions: bool,
    },

    #[command(about = "Show the metadata detected for a prompt")]
    Analyze {
        #[arg(help = "Prompt text")]
        prompt: String,
    },

    #[command(about = "List loaded profiles")]
    List,

    #[command(about = "Reload the profile directory and report per-file errors")]
    Reload,

    #[command(about = "Print a profile's checklist")]
    Checklist {
        #[arg(help = "Profile name")]
        name: String,
    },

    #[command(about = "Print a profile in full")]
    Show {
        #[arg(help = "Profile name")]
        name: String,
    },

    #[command(about = "Show the metadata registry summary")]
    Registry,

    #[command(about = "Find profiles by capability or domain")]
    Find {
        #[arg(long, conflicts_with = "domain", help = "Capability, e.g. brainstorming")]
        capability: Option<String>,

        #[arg(long, help = "Domain, e.g. marketing")]
        domain: Option<String>,
    },

    #[command(about = "Watch the profile directory and hot-reload on changes")]
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::load_from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ConfigManager::load().context("Failed to load configuration")?,
    };
    let mut config: PromptRouteConfig = manager.into_config();
    if let Some(dir) = &cli.profiles_dir {
        config.loader.profiles_dir = dir.clone();
    }

    init_tracing(&config.logging, cli.verbose);

    let service = Arc::new(PromptRouteService::new(config));
    let reload = service.reload().await;

    match cli.command {
        Commands::Reload => {
            if cli.json {
                print_json(&reload)?;
            } else {
                print_reload(&reload);
            }
            if !reload.success {
                bail!("reload did not load any profiles");
            }
        }
        Commands::Route {
            prompt,
            intent,
            domain,
            topics,
            audience,
            priority,
            instructions,
        } => {
            let overrides = MetadataOverrides {
                intent,
                domain,
                topics,
                audience,
                priority,
                ..Default::default()
            };
            let overrides = (!overrides.is_empty()).then_some(overrides);
            match service.route(&prompt, overrides.as_ref()) {
                Ok(response) if cli.json => print_json(&response)?,
                Ok(response) => {
                    println!("{} {}", "Profile:".bold(), response.profile.green().bold());
                    println!("  Score:       {}", response.score);
                    println!("  Confidence:  {:.1}%", response.confidence_pct);
                    if response.complexity_adjusted {
                        println!(
                            "  Adjusted:    {} {} {}",
                            response.original_profile.yellow(),
                            "->".dimmed(),
                            response.profile
                        );
                    }
                    if response.used_fallback {
                        println!("  {}", "No profile matched; used fallback".yellow());
                    }
                    println!(
                        "  Metadata:    intent={} domain={} complexity={} sensitivity={}",
                        response.metadata.intent,
                        response.metadata.domain.as_deref().unwrap_or("-"),
                        response.metadata.complexity,
                        response.metadata.sensitivity
                    );
                    if instructions {
                        println!("\n{}", response.instructions);
                    }
                }
                Err(failure) if cli.json => {
                    print_json(&failure)?;
                    std::process::exit(1);
                }
                Err(failure) => bail!("{} ({})", failure.message, failure.error),
            }
        }
        Commands::Analyze { prompt } => {
            print_json(&service.analyze(&prompt))?;
        }
        Commands::List => {
            let profiles = service.list_profiles();
            if cli.json {
                print_json(&profiles)?;
            } else {
                print_profiles(&profiles);
            }
        }
        Commands::Checklist { name } => {
            let checklist = service.get_checklist(&name)?;
            if cli.json {
                print_json(&checklist)?;
            } else {
                println!("{} ({} items)", checklist.profile.bold(), checklist.count);
                for item in &checklist.items {
                    println!("  - [ ] {}", item);
                }
            }
        }
        Commands::Show { name } => {
            let profile = service.get_profile(&name)?;
            if cli.json {
                print_json(&profile)?;
            } else {
                println!("{} [{}]", profile.name.green().bold(), profile.complexity_tier);
                if let Some(parent) = &profile.extends {
                    println!("  extends {}", parent.cyan());
                }
                println!("  {}", profile.short_description());
                println!("\n{}", profile.instructions);
            }
        }
        Commands::Registry => {
            let summary = service.get_registry_summary();
            if cli.json {
                print_json(&summary)?;
            } else {
                println!("{}", "Registry".green().bold());
                println!("  Profiles:       {}", summary.total_profiles);
                for (tier, count) in &summary.tiers {
                    println!("  Tier {:<10} {}", tier, count);
                }
                println!("  Fallbacks:      {}", summary.fallback_profiles);
                println!("  With extends:   {}", summary.profiles_with_extends);
                println!("  Checklist items: {}", summary.total_checklist_items);
                println!(
                    "  Capabilities:   {}",
                    summary.capabilities.iter().cloned().collect::<Vec<_>>().join(", ")
                );
                println!(
                    "  Domains:        {}",
                    summary.domains.iter().cloned().collect::<Vec<_>>().join(", ")
                );
            }
        }
        Commands::Find { capability, domain } => {
            let found = match (capability, domain) {
                (Some(capability), _) => service.find_by_capability(&capability),
                (None, Some(domain)) => service.find_by_domain(&domain),
                (None, None) => bail!("pass --capability or --domain"),
            };
            if cli.json {
                print_json(&found)?;
            } else {
                print_profiles(&found);
            }
        }
        Commands::Watch => {
            print_reload(&reload);
            let handle = ProfileWatcher::new(Arc::clone(&service))
                .spawn()
                .context("Failed to start profile watcher")?;
            info!("Press Ctrl+C to stop watching");
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl+C")?;
            handle.stop();
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match logging.format.as_str() {
        "json" => {
            let subscriber = Registry::default().with(env_filter).with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            );
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        "compact" => {
            let subscriber = Registry::default().with(env_filter).with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            );
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        _ => {
            let subscriber = Registry::default()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
            tracing::subscriber::set_global_default(subscriber).ok();
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

fn print_reload(reload: &ReloadResponse) {
    let status = if reload.success {
        "OK".green().bold()
    } else {
        "FAILED".red().bold()
    };
    println!(
        "{} loaded {} profiles (generation {}, {}ms)",
        status, reload.profiles_loaded, reload.generation, reload.duration_ms
    );
    for name in &reload.profile_names {
        println!("  {} {}", "+".green(), name);
    }
    for issue in &reload.errors {
        println!("  {} {}: {}", "!".red(), issue.file.yellow(), issue.message);
    }
}

fn print_profiles(profiles: &[ProfileSummary]) {
    if profiles.is_empty() {
        println!("{}", "No profiles".yellow());
        return;
    }
    for profile in profiles {
        let mut tags = vec![profile.complexity_tier.to_string()];
        if profile.is_fallback {
            tags.push("fallback".to_string());
        }
        if let Some(parent) = &profile.extends {
            tags.push(format!("extends {}", parent));
        }
        println!(
            "{} [{}]\n    {}",
            profile.name.green().bold(),
            tags.join(", "),
            profile.description
        );
        if !profile.capabilities.is_empty() {
            println!("    capabilities: {}", profile.capabilities.join(", ").cyan());
        }
    }
}
