//! partsync CLI entry point.

mod cli;

use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};

use cli::{Cli, Command, OutputArgs, OutputFormat};
use partsync_engine::{
    ActionOutcome, ActionParams, RecordedStep, Recording, ReplayTransport, SyncConfig,
    SyncContext,
};
use partsync_model::outline::{render_outline, render_subtree, subtree_to_json, tree_to_json};
use partsync_model::{PartTree, PropertyValue, ROOT_REF_CHAIN};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    match cli.command {
        Command::Replay { recording, output } => replay(config, &recording, &output).await,
        Command::Inspect { deltas, output } => inspect(config, &deltas, &output).await,
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<SyncConfig> {
    let mut config = match &cli.config {
        Some(path) => SyncConfig::load(path)?,
        None => {
            let cwd = std::env::current_dir().context("failed to read working directory")?;
            SyncConfig::discover(&cwd)
        }
    };
    if let Some(key) = &cli.design_key {
        config.design_key = Some(key.trim().into());
    }
    Ok(config)
}

async fn replay(config: SyncConfig, path: &Path, output: &OutputArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let recording = Recording::from_json(&text)
        .with_context(|| format!("invalid recording {}", path.display()))?;
    let ctx = SyncContext::new(config, ReplayTransport::new(&recording));
    ctx.load_model()
        .await
        .context("failed to load the recorded model")?;

    for (index, step) in recording.steps.iter().enumerate() {
        let step_no = index + 1;
        let outcome = match step {
            RecordedStep::SetProperty {
                ref_chain,
                name,
                value,
                ..
            } => ctx
                .update_property(ref_chain.as_str(), name, PropertyValue::from_json(value))
                .await
                .map(|()| None),
            RecordedStep::ExecuteAction {
                ref_chain,
                name,
                params,
                ..
            } => ctx
                .execute_action(ActionParams {
                    ref_chain: ref_chain.clone(),
                    name: name.clone(),
                    params: params.clone(),
                })
                .await
                .map(Some),
        };
        match outcome {
            Ok(Some(ActionOutcome::Downloaded { url })) => {
                info!("Step {step_no}: artifact {url}");
            }
            Ok(Some(ActionOutcome::Message { title, body })) => {
                info!("Step {step_no}: {title}: {body}");
            }
            Ok(_) => {}
            Err(err) => warn!("Step {step_no} failed: {err}"),
        }
    }
    if ctx.viewer().pending() > 0 {
        warn!(
            "{} recorded answers were never requested",
            ctx.viewer().pending()
        );
    }
    info!(
        "Replayed {} steps; model is {}",
        recording.steps.len(),
        if ctx.is_dirty() { "dirty" } else { "clean" }
    );
    print_tree(&ctx.snapshot(), output)
}

async fn inspect(
    config: SyncConfig,
    paths: &[std::path::PathBuf],
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let Some((initial, rest)) = paths.split_first() else {
        bail!("no model data files given");
    };
    let ctx = SyncContext::new(
        config,
        ReplayTransport::new(&Recording::model_only(read_json(initial)?)),
    );
    ctx.load_model()
        .await
        .with_context(|| format!("failed to load {}", initial.display()))?;
    for path in rest {
        let report = ctx
            .apply_model_data(read_json(path)?)
            .with_context(|| format!("failed to merge {}", path.display()))?;
        info!(
            "{}: {} inserted, {} updated, {} removed",
            path.display(),
            report.inserted.len(),
            report.updated.len(),
            report.removed.len()
        );
    }
    print_tree(&ctx.snapshot(), output)
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn print_tree(tree: &PartTree, output: &OutputArgs) -> anyhow::Result<()> {
    let part = output.part.as_deref();
    if let Some(ref_chain) = part {
        if !tree.contains(ref_chain) {
            bail!("unknown part '{ref_chain}'");
        }
    }
    match output.format {
        OutputFormat::Tree => {
            let text = match part {
                Some(ref_chain) => render_subtree(tree, ref_chain).unwrap_or_default(),
                None => render_outline(tree),
            };
            print!("{text}");
        }
        OutputFormat::Messages => {
            for message in tree.all_messages(part.unwrap_or(ROOT_REF_CHAIN)) {
                println!("{}: {}", message.severity.as_str(), message.text);
            }
        }
        OutputFormat::Json => {
            let value = match part {
                Some(ref_chain) => subtree_to_json(tree, ref_chain).unwrap_or(Value::Null),
                None => tree_to_json(tree),
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}
