//! CLI mode
//!
//! One-shot campaign commands. With the in-memory store there is no other
//! process to pick up queued jobs, so they are drained here before exiting.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use std::path::Path;

use crate::cli::{Commands, ConfigCommands};
use crate::config::StaticConfig;
use crate::jobs::drain;
use crate::runtime::{AppContext, lifetime};
use crate::storage::StorageFactory;

pub async fn run_cli(command: Commands, config: &StaticConfig) -> Result<()> {
    match command {
        Commands::Send { campaign_id } => {
            let ctx = lifetime::startup::prepare_context(config).await?;
            let summary = ctx.campaigns.send(&campaign_id).await?;
            println!(
                "{} Campaign {} is sending to {} recipients",
                "✓".green().bold(),
                summary.campaign_id.cyan(),
                summary.recipients
            );
            drain_if_local(&ctx).await?;
        }
        Commands::Pause { campaign_id } => {
            let ctx = lifetime::startup::prepare_context(config).await?;
            let change = ctx.campaigns.pause(&campaign_id).await?;
            println!(
                "{} Campaign {} paused (was {})",
                "✓".green().bold(),
                campaign_id.cyan(),
                change.previous
            );
        }
        Commands::Resume { campaign_id } => {
            let ctx = lifetime::startup::prepare_context(config).await?;
            let change = ctx.campaigns.resume(&campaign_id).await?;
            println!(
                "{} Campaign {} resumed (was {})",
                "✓".green().bold(),
                campaign_id.cyan(),
                change.previous
            );
            drain_if_local(&ctx).await?;
        }
        Commands::Status { campaign_id, json } => {
            let ctx = lifetime::startup::prepare_context(config).await?;
            let progress = ctx.campaigns.progress(&campaign_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&progress)?);
            } else {
                println!("{}: {}", "Campaign".bold(), progress.campaign_id.cyan());
                println!("  status:     {}", progress.status.to_string().yellow());
                println!(
                    "  sent:       {} / ~{}",
                    progress.emails_sent, progress.estimated_recipients
                );
                println!("  queued:     {}", progress.remaining);
                println!("  in flight:  {}", progress.inflight);
            }
        }
        Commands::Estimate { campaign_id } => {
            let ctx = lifetime::startup::prepare_context(config).await?;
            let count = ctx.campaigns.estimate(&campaign_id).await?;
            println!("{} distinct recipients", count.to_string().bold());
        }
        Commands::Migrate => {
            let storage = StorageFactory::create(config)
                .await
                .context("Failed to run migrations")?;
            println!(
                "{} Migrations applied ({})",
                "✓".green().bold(),
                storage.backend_name()
            );
        }
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => {
            let path = output_path.unwrap_or_else(|| "config.example.toml".to_string());
            if Path::new(&path).exists() && !force {
                bail!("{} already exists, use --force to overwrite", path);
            }
            StaticConfig::default()
                .save_to_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path, e))?;
            println!("{} Sample configuration written to {}", "✓".green().bold(), path);
        }
        Commands::Serve | Commands::Worker { .. } => {
            bail!("serve and worker are long-running modes, not CLI commands")
        }
    }
    Ok(())
}

async fn drain_if_local(ctx: &AppContext) -> Result<()> {
    if ctx.store.backend_name() != "memory" {
        return Ok(());
    }
    let handled = drain(ctx.jobs.as_ref(), ctx).await?;
    println!("  processed {} queued job(s) locally", handled);
    Ok(())
}
