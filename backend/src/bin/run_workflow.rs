//! Run one sale-preparation workflow in-process
//!
//! Seeds an in-memory store with the demo listings, prepares a workflow,
//! prints the merged plan, approves it and prints the execution outcome.
//!
//! Usage: `run_workflow [DISCOUNT_PERCENT] [CONTEXT]`
//!
//! Uses Gemini for the announcement when `GEMINI_API_KEY` is set, the
//! template otherwise.

use anyhow::{bail, Context};
use listing_orchestrator::config::Config;
use listing_orchestrator::orchestrator::constants::DEFAULT_ACTOR;
use listing_orchestrator::orchestrator::specialists::GenerationMode;
use listing_orchestrator::orchestrator::state::WorkflowStatus;
use listing_orchestrator::state::{workflows, AppState, PrepareOptions};
use listing_orchestrator::store::{
    demo_items, seed, InMemoryItemStore, ItemStore, StoreContext,
};
use std::env;
use std::sync::Arc;
use tokio::sync::RwLock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let discount_percent: u8 = match args.next() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid discount percent: {}", raw))?,
        None => 20,
    };
    let context = args.next();

    let config = Config::from_env();
    let ctx = StoreContext::new(DEFAULT_ACTOR);

    let store = Arc::new(InMemoryItemStore::new());
    let count = seed(store.as_ref(), &ctx, demo_items()).await?;
    println!("Seeded {} demo items", count);

    let generation = if config.generation.api_key.is_some() {
        GenerationMode::Llm
    } else {
        GenerationMode::Template
    };
    let state = Arc::new(RwLock::new(AppState::with_api_key(
        store.clone(),
        config.orchestrator_config(),
        config.generation.api_key.clone(),
    )));

    let id = workflows::prepare(
        &state,
        PrepareOptions {
            discount_percent,
            context,
            generation,
            store_ctx: ctx.clone(),
        },
    )
    .await?;
    println!("Workflow {} preparing ({}% off)...", id, discount_percent);

    let handle = state.read().await.handle(id)?;
    let Some(ready) = handle.wait_for_status(WorkflowStatus::Ready).await else {
        bail!("Workflow {} stopped before its plan was ready", id);
    };

    for (specialist, result) in &ready.results {
        println!(
            "  {:<16} confidence {:.2}  {}",
            specialist.as_str(),
            result.confidence,
            result.summary
        );
    }
    println!("\nPlan:\n{}", serde_json::to_string_pretty(&ready.plan)?);

    workflows::execute(&state, id).await?;
    let Some(done) = handle.wait_for_status(WorkflowStatus::Done).await else {
        bail!("Workflow {} stopped before execution finished", id);
    };
    println!(
        "\nExecution outcome:\n{}",
        serde_json::to_string_pretty(&done.execution_results)?
    );

    println!("\nListings after execution:");
    for item in store.list(&ctx).await? {
        println!(
            "  {:<28} {:>10} {}",
            item.title,
            item.price.map(|p| format!("{:.2}", p)).unwrap_or_default(),
            item.status.as_str()
        );
    }

    Ok(())
}
