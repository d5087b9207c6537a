//! esmodels command-line tool
//!
//! Inspects, syncs, and deploys search index models stored as YAML.

use anyhow::{Context, Result};
use clap::Parser;
use esmodels::cli::diff::{DiffArgs, render_diff};
use esmodels::cli::force_merge::ForceMergeArgs;
use esmodels::cli::init_index::{InitIndexArgs, confirm_delete, render_outcome};
use esmodels::cli::select::{SelectArgs, render_select};
use esmodels::cli::show::{ShowArgs, render_show};
use esmodels::cli::sync::{SyncArgs, render_outcomes};
use esmodels::cli::{Cli, Command, open_cache, pipeline_builder};
use esmodels::config::{Config, ConfigLoader, ConfigPaths};
use esmodels::logging;
use esmodels::service::{ElasticsearchClient, force_merge_and_wait, init_index};
use esmodels::sync::run_sync;
use std::time::Duration;
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log, cli.verbose)?;

    let loader = ConfigLoader::load_with(ConfigPaths::discover(), cli.config.as_deref(), |key| {
        std::env::var(key).ok()
    })?;
    for (tier, path) in loader.sources() {
        debug!("Config tier {}: {}", tier, path.display());
    }
    let mut config = loader.into_config();
    if let Some(models_dir) = &cli.models_dir {
        config.models_dir = models_dir.clone();
    }
    info!("Models dir: {}", config.models_dir.display());

    match cli.command {
        Command::Show(args) => run_show(&config, args),
        Command::Select(args) => run_select(&config, args),
        Command::Diff(args) => run_diff(&config, args),
        Command::Sync(args) => run_sync_command(&config, args),
        Command::InitIndex(args) => run_init_index(&config, args),
        Command::ForceMerge(args) => run_force_merge(&config, args),
    }
}

fn run_show(config: &Config, args: ShowArgs) -> Result<()> {
    let mut cache = open_cache(config);
    let models = cache.models(!args.no_vestigial)?;
    print!("{}", render_show(&models, &args)?);
    Ok(())
}

fn run_select(config: &Config, args: SelectArgs) -> Result<()> {
    let mut cache = open_cache(config);
    let models = cache.models(true)?;
    print!("{}", render_select(&models, &args)?);
    Ok(())
}

fn run_diff(config: &Config, args: DiffArgs) -> Result<()> {
    let mut cache = open_cache(config);
    let builder = pipeline_builder(config)?;
    let outcomes = run_sync(&mut cache, &builder, &args.sync_request())?;
    print!("{}", render_diff(&outcomes, args.format)?);
    Ok(())
}

fn run_sync_command(config: &Config, args: SyncArgs) -> Result<()> {
    let mut cache = open_cache(config);
    let builder = pipeline_builder(config)?;
    let outcomes = run_sync(&mut cache, &builder, &args.sync_request())
        .with_context(|| format!("Sync of {} failed", config.models_dir.display()))?;
    print!("{}", render_outcomes(&outcomes));
    Ok(())
}

fn run_init_index(config: &Config, args: InitIndexArgs) -> Result<()> {
    let client = ElasticsearchClient::new(&args.service.resolve(&config.elasticsearch))?;
    info!("Index service: {}", client.base_url());

    let mut cache = open_cache(config);
    let models = cache.models(false)?;

    let stdin = std::io::stdin();
    let mut confirm = |index: &str| confirm_delete(index, &mut stdin.lock(), &mut std::io::stdout());
    let outcome = init_index(&models, &client, &args.init_request(), &mut confirm)?;
    print!("{}", render_outcome(&outcome));
    Ok(())
}

fn run_force_merge(config: &Config, args: ForceMergeArgs) -> Result<()> {
    let es = args.service.resolve(&config.elasticsearch);
    let client = ElasticsearchClient::new(&es)?;
    force_merge_and_wait(
        &client,
        &args.indices,
        args.max_segments,
        Duration::from_secs(es.poll_interval_seconds),
    )?;
    Ok(())
}
