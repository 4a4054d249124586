//! Terminal client for workflow builder workflows: validate, run once, or chat.

mod api;
mod chat;
mod context;
mod source;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use server_core::domains::workflows::WorkflowGraph;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::api::ServerApi;
use crate::context::AppContext;
use crate::source::WorkflowSource;

#[derive(Parser)]
#[command(name = "workflow", about = "Validate, run, and chat with saved workflows")]
struct Cli {
    /// Workflow builder server
    #[arg(
        long,
        env = "WORKFLOW_SERVER_URL",
        default_value = "http://localhost:8080",
        global = true
    )]
    server: String,

    /// Bearer token sent with chat requests
    #[arg(long, env = "WORKFLOW_CHAT_KEY", global = true)]
    key: Option<String>,

    /// Only print results
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List saved workflows
    List,
    /// Check a workflow for missing or unconnected components
    Validate(SourceArgs),
    /// Run a workflow once on a single input
    Run {
        #[command(flatten)]
        source: SourceArgs,
        /// Question to send through the workflow
        input: String,
    },
    /// Chat interactively through a workflow
    Chat {
        #[command(flatten)]
        source: SourceArgs,
        /// Document to pass as knowledge base context (repeatable).
        /// Defaults to the documents attached to a saved workflow.
        #[arg(long = "doc")]
        documents: Vec<Uuid>,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Saved workflow id
    #[arg(long, conflicts_with = "file")]
    id: Option<Uuid>,
    /// Workflow JSON exported from the builder
    #[arg(long)]
    file: Option<std::path::PathBuf>,
}

impl SourceArgs {
    fn source(&self) -> WorkflowSource {
        match (&self.file, self.id) {
            (Some(path), _) => WorkflowSource::File(path.clone()),
            (None, Some(id)) => WorkflowSource::Saved(id),
            (None, None) => WorkflowSource::Pick,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::new(cli.quiet);
    let api = ServerApi::new(&cli.server);

    match cli.command {
        Command::List => list(&ctx, &api).await,
        Command::Validate(args) => {
            let loaded = args.source().load(&api).await?;
            validate(&ctx, &loaded.graph)
        }
        Command::Run { source, input } => {
            let loaded = source.source().load(&api).await?;
            run(&ctx, &api, &loaded.graph, &input).await
        }
        Command::Chat { source, documents } => {
            let loaded = source.source().load(&api).await?;
            let documents = match (documents.is_empty(), loaded.id) {
                (true, Some(id)) => api
                    .documents(id)
                    .await
                    .context("Failed to list workflow documents")?
                    .into_iter()
                    .map(|d| d.id)
                    .collect(),
                _ => documents,
            };
            chat::run(&ctx, &api, cli.key, loaded, documents).await
        }
    }
}

async fn list(ctx: &AppContext, api: &ServerApi) -> Result<()> {
    let workflows = api.workflows().await.context("Failed to list workflows")?;
    if workflows.is_empty() {
        ctx.print_warning("No saved workflows");
        return Ok(());
    }
    for workflow in workflows {
        println!(
            "{}  {}  ({} nodes, updated {})",
            workflow.id,
            console::style(&workflow.name).bold(),
            workflow.nodes.len(),
            workflow.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn validate(ctx: &AppContext, graph: &WorkflowGraph) -> Result<()> {
    let errors = graph.validate();
    if errors.is_empty() {
        ctx.print_success("Workflow is valid");
        return Ok(());
    }
    for error in &errors {
        ctx.print_error(error);
    }
    anyhow::bail!("workflow has {} problem(s)", errors.len())
}

async fn run(ctx: &AppContext, api: &ServerApi, graph: &WorkflowGraph, input: &str) -> Result<()> {
    ctx.print_info("Running workflow...");
    let result = api.execute(graph, input).await?;
    ctx.print_header(&format!("Answer ({})", result.model));
    println!("{}", result.output);
    Ok(())
}
