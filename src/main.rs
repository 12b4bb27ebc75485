//! Command-line interface for the changeset workload generator.
//!
//! # Usage Examples
//!
//! ```bash
//! # Default workload: 10 rounds, 20 created per round, 2 s between pushes
//! changeset-loadgen
//!
//! # Faster, smaller sequence tagged only at the end
//! changeset-loadgen --rounds 5 --created-per-round 6 \
//!   --push-delay-ms 100 --tag-policy sequence-end
//!
//! # Target identity and retry policy via environment
//! LOADGEN_PROJECT=perf LOADGEN_DATABASE=model-1 \
//!   LOADGEN_SYNC_ATTEMPTS=5 changeset-loadgen
//! ```

use anyhow::Context;
use changeset_loadgen::testing::in_memory_collaborators;
use changeset_loadgen::{ChangesetGenerator, GeneratorOpts};
use clap::Parser;
use loadgen_core::RunContext;

#[derive(Parser)]
#[command(name = "changeset-loadgen")]
#[command(about = "Generates synthetic changeset workloads against a versioned model hub")]
struct Cli {
    #[command(flatten)]
    opts: GeneratorOpts,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let plan = cli.opts.plan().context("invalid workload parameters")?;
    let identity = cli.opts.identity();

    let (replica, hub) = in_memory_collaborators(&identity);
    let mut generator = ChangesetGenerator::new(
        replica.clone(),
        hub.clone(),
        identity,
        cli.opts.generator_options(),
    );

    let ctx = RunContext::new();
    let summary = generator
        .generate(&ctx, &plan)
        .await
        .context("changeset generation failed")?;

    tracing::info!(
        rounds = summary.rounds.len(),
        versions = summary.tagged_versions.len(),
        live_elements = replica.live_elements(),
        "run complete"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
