// crates/presscli/src/main.rs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use presscore::{ExecutionEvent, LogStatus, Node, NodeKind, RunState, Services, WorkflowDocument};
use pressnodes::{GatewayConfig, HttpGateway};
use pressruntime::{FlowRuntime, GraphStore, RuntimeConfig};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "press")]
#[command(about = "Content workflow engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow document
    Run {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Base URL of the collaborator gateway
        #[arg(short, long, default_value = "http://localhost:8080/api")]
        gateway: String,

        /// Abort any single node that runs longer than this
        #[arg(long)]
        node_timeout_secs: Option<u64>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a workflow document
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List available node kinds
    Kinds,

    /// Create an example workflow document
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            gateway,
            node_timeout_secs,
            verbose,
        } => {
            let level = if verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            };
            tracing_subscriber::fmt().with_max_level(level).init();

            run_workflow(file, gateway, node_timeout_secs.map(Duration::from_secs)).await?;
        }

        Commands::Validate { file } => {
            validate_workflow(file)?;
        }

        Commands::Kinds => {
            list_kinds();
        }

        Commands::Init { output } => {
            create_example_workflow(output)?;
        }
    }

    Ok(())
}

fn load_store(file: &PathBuf) -> Result<GraphStore> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document = WorkflowDocument::from_json(&json)
        .with_context(|| format!("Invalid workflow document {}", file.display()))?;

    let mut store = GraphStore::new();
    store.deserialize(document);
    Ok(store)
}

fn status_marker(status: LogStatus) -> &'static str {
    match status {
        LogStatus::Running => "⚡",
        LogStatus::Completed => "✅",
        LogStatus::Error => "❌",
        LogStatus::Skipped => "⏭️ ",
    }
}

async fn run_workflow(file: PathBuf, gateway: String, node_timeout: Option<Duration>) -> Result<()> {
    println!("🚀 Loading workflow from: {}", file.display());
    let store = load_store(&file)?;
    println!("   Nodes: {}", store.len());
    println!();

    let gateway = HttpGateway::new(GatewayConfig::new(gateway))?;
    let registry = pressnodes::registry_with(Services::from_shared(Arc::new(gateway)));
    let runtime = FlowRuntime::with_registry(
        Arc::new(registry),
        RuntimeConfig {
            node_timeout,
            ..RuntimeConfig::default()
        },
    );

    let mut events = runtime.subscribe_events();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::RunStarted { node_count, .. } => {
                    println!("▶️  Run started ({} nodes)", node_count);
                }
                ExecutionEvent::Log { entry, .. } => {
                    println!(
                        "  {} [{}] {}",
                        status_marker(entry.status),
                        entry.label,
                        entry.message
                    );
                }
                ExecutionEvent::RunFinished {
                    state, duration_ms, ..
                } => {
                    println!("🏁 Run finished as {:?} in {}ms", state, duration_ms);
                    break;
                }
            }
        }
    });

    let runner = runtime.runner(&store);
    let handle = runner.handle();
    let stop_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("⏹️  Stopping run...");
            handle.stop();
        }
    });

    let report = runner.run().await?;
    stop_task.abort();
    let _ = event_task.await;

    println!();
    println!("📊 Execution Summary:");
    println!("   Run ID: {}", report.run_id);
    println!("   Executed: {} node visits", report.executed);

    if !report.outputs.is_empty() {
        println!();
        println!("📤 Outputs:");
        for (node_id, payload) in &report.outputs {
            println!("   Node {}:", node_id);
            for key in payload.keys() {
                if let Some(value) = payload.get(key) {
                    println!("     {}: {}", key, value);
                }
            }
        }
    }

    match (report.state, report.error) {
        (RunState::Completed, _) => Ok(()),
        (_, Some(error)) => bail!(error),
        (state, None) => bail!("Run ended as {:?}", state),
    }
}

fn validate_workflow(file: PathBuf) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());
    let store = load_store(&file)?;

    if store.is_empty() {
        bail!("Workflow has no nodes");
    }
    if !store.has_trigger() {
        bail!("Workflow has no trigger node");
    }

    println!("✅ Workflow is valid:");
    println!("   Nodes: {}", store.len());

    for node in store.nodes() {
        if let NodeKind::Custom(kind) = &node.kind {
            println!(
                "⚠️  Node '{}' has unknown kind '{}' and will pass its input through",
                node.display_label(),
                kind
            );
        }
        for target in &node.connected {
            if store.get(target).is_none() {
                println!(
                    "⚠️  Node '{}' connects to missing node {}",
                    node.display_label(),
                    target
                );
            }
        }
    }

    for cycle in store.find_cycles() {
        let ids: Vec<String> = cycle.iter().map(|id| id.to_string()).collect();
        println!(
            "⚠️  Cycle between nodes [{}]; revisits will be skipped",
            ids.join(", ")
        );
    }

    Ok(())
}

fn list_kinds() {
    println!("📦 Available Node Kinds:");
    println!();

    for spec in presscore::kind::catalog() {
        println!("  • {} ({})", spec.kind, spec.category);
        println!("    {}: {}", spec.label, spec.description);
    }
}

fn create_example_workflow(output: PathBuf) -> Result<()> {
    let mut scraper = Node::new(NodeKind::ContentScraper).with_id("scrape");
    scraper
        .config
        .insert("urls".to_string(), json!(["https://example.com/article"]));

    let mut email = Node::new(NodeKind::EmailNotifier).with_id("notify");
    email
        .config
        .insert("recipient".to_string(), json!("editor@example.com"));

    let chain = vec![
        Node::new(NodeKind::Trigger).with_id("start"),
        scraper,
        Node::new(NodeKind::AiContentProcessor).with_id("rewrite"),
        Node::new(NodeKind::Translator).with_id("translate"),
        Node::new(NodeKind::Publisher).with_id("publish"),
        email,
    ];

    let mut store = GraphStore::new();
    for (i, node) in chain.into_iter().enumerate() {
        store.insert(node.with_position(100.0 + 220.0 * i as f64, 150.0));
    }
    let ids: Vec<_> = store.nodes().iter().map(|n| n.id.clone()).collect();
    for pair in ids.windows(2) {
        store.connect(&pair[0], &pair[1]);
    }

    let json = store.to_json()?;
    std::fs::write(&output, json)?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!(
        "  press run --file {} --gateway http://localhost:8080/api",
        output.display()
    );

    Ok(())
}
