use crate::cli::commands::{Cli, Commands};
use crate::collector::Collector;
use crate::composer::Composer;
use crate::config::Config;
use crate::error::PlatformError;
use crate::executor::Executor;
use crate::llm::{Completion, OpenAiCompletion};
use crate::platform::{HttpPlatform, Platform};
use crate::profile::Analyzer;
use crate::scheduler::{Scheduler, SchedulerOptions};
use crate::store::{EngagementStore, InteractionKind, SqliteStore};
use anyhow::{bail, Context, Result};
use chrono::Duration;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const DB_FILE: &str = "mimus.db";

struct Deps {
    store: Arc<dyn EngagementStore>,
    platform: Arc<dyn Platform>,
    llm: Arc<dyn Completion>,
}

fn build_deps(config: &Config) -> Result<Deps> {
    let store = SqliteStore::new(&config.workspace_dir.join(DB_FILE))?;
    let platform = HttpPlatform::new(
        &config.platform.base_url,
        config.platform.token.as_deref(),
    );
    let llm = OpenAiCompletion::new(
        &config.llm.base_url,
        config.llm.api_key.as_deref(),
        &config.llm.model,
    );

    Ok(Deps {
        store: Arc::new(store),
        platform: Arc::new(platform),
        llm: Arc::new(llm),
    })
}

/// Verify platform credentials; failure here aborts startup.
async fn verify_startup(platform: &Arc<dyn Platform>) -> Result<()> {
    if !platform.verify_credentials().await? {
        return Err(PlatformError::Credentials.into());
    }
    Ok(())
}

/// Collect the account's history and build (or rebuild) the profile.
async fn run_analysis(config: &Config, deps: &Deps) -> Result<()> {
    let account = deps
        .platform
        .account(&config.bot.username)
        .await?
        .with_context(|| format!("account @{} not found", config.bot.username))?;

    let collector = Collector::new(
        Arc::clone(&deps.platform),
        Arc::clone(&deps.store),
        config.analysis.corpus_posts,
    );
    let collected = collector.collect(&account).await?;
    if collected == 0 {
        bail!("no activity collected for @{}", config.bot.username);
    }

    let analyzer = Analyzer::new(Arc::clone(&deps.store), Arc::clone(&deps.llm));
    let profile = analyzer.analyze(account.bio.as_deref().unwrap_or("")).await?;
    for (dimension, value) in profile.dimensions() {
        tracing::info!(
            dimension,
            score = value.score,
            confidence = value.confidence,
            "profile dimension"
        );
    }
    Ok(())
}

async fn run_bot(config: Config, dry_run_flag: bool, lite_flag: bool) -> Result<()> {
    config.validate()?;
    let deps = build_deps(&config)?;
    verify_startup(&deps.platform).await?;

    let analyzer = Analyzer::new(Arc::clone(&deps.store), Arc::clone(&deps.llm));
    if !analyzer.has_profile()? {
        tracing::info!("no personality profile found, running initial analysis");
        run_analysis(&config, &deps).await?;
    }

    let dry_run = dry_run_flag || config.bot.dry_run;
    let lite_mode = lite_flag || config.bot.lite_mode;
    if dry_run {
        tracing::info!("dry-run mode: actions will be decided and logged, not sent");
    }

    let composer = Composer::new(
        Arc::clone(&deps.llm),
        config.llm.temperature,
        config.llm.max_tokens,
    );
    let executor = Executor::new(
        Arc::clone(&deps.store),
        Arc::clone(&deps.platform),
        composer,
        config.rate_limits,
        dry_run,
    );
    let scheduler = Scheduler::new(
        Arc::clone(&deps.store),
        Arc::clone(&deps.platform),
        executor,
        SchedulerOptions {
            cycle_interval_minutes: config.schedule.cycle_interval_minutes,
            timeline_batch: config.schedule.timeline_batch,
            mentions_batch: config.schedule.mentions_batch,
            retention_days: config.retention.days,
            lite_mode,
        },
    );

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping at next cycle boundary");
            signal_token.cancel();
        }
    });

    scheduler.run(cancel).await
}

async fn run_analyze(config: Config, force: bool) -> Result<()> {
    config.validate()?;
    let deps = build_deps(&config)?;
    verify_startup(&deps.platform).await?;

    let analyzer = Analyzer::new(Arc::clone(&deps.store), Arc::clone(&deps.llm));
    if analyzer.has_profile()? && !force {
        tracing::info!("profile already exists; rerun with --force to re-analyze");
        return Ok(());
    }

    run_analysis(&config, &deps).await
}

fn run_status(config: &Config) -> Result<()> {
    let store = SqliteStore::new(&config.workspace_dir.join(DB_FILE))?;

    match store.load_profile()? {
        Some(profile) => {
            println!("Personality profile:");
            for (dimension, value) in profile.dimensions() {
                println!(
                    "  {dimension:<22} score {:.2}  confidence {:.2}",
                    value.score, value.confidence
                );
            }
        }
        None => println!("No personality profile yet. Run `mimus analyze` first."),
    }

    let records = store.recent_interactions(Duration::hours(24))?;
    println!("\nInteractions in the last 24h: {}", records.len());
    for kind in [
        InteractionKind::Like,
        InteractionKind::Reply,
        InteractionKind::Repost,
    ] {
        let count = records.iter().filter(|r| r.kind == kind).count();
        println!("  {:<8} {count}", kind.as_str());
    }
    for record in records.iter().take(10) {
        println!(
            "  {} {} on {} ({})",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record.kind.as_str(),
            record.post_id,
            if record.success { "ok" } else { "failed" }
        );
    }
    Ok(())
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Run { dry_run, lite } => run_bot(config, dry_run, lite).await,
        Commands::Analyze { force } => run_analyze(config, force).await,
        Commands::Status => run_status(&config),
    }
}
