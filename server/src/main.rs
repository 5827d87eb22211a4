use anyhow::{Context, Result};
use axum::Router;
use clap::{Parser, ValueEnum};
use docs_core::{DocumentStore, SearchConfig, SearchEngine};
use server::{build_app, AppContext, McpServer};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Transport {
    /// MCP JSON-RPC over stdin/stdout
    Stdio,
    /// HTTP search API plus MCP at POST /mcp
    Http,
}

#[derive(Parser)]
#[command(name = "paynow-docs-server", version, about = "Search PayNow Component documentation over MCP")]
struct Args {
    /// Corpus file or directory
    #[arg(long, env = "PAYNOW_DOCS_CORPUS", default_value = "./docs")]
    corpus: PathBuf,
    #[arg(long, env = "PAYNOW_DOCS_TRANSPORT", value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,
    /// Host to bind (http transport)
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind (http transport)
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Results returned per tool call
    #[arg(long, default_value_t = 10)]
    top_k: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries JSON-RPC, logs go to stderr.
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let args = Args::parse();

    let store = DocumentStore::load(&args.corpus)
        .with_context(|| format!("loading corpus from {}", args.corpus.display()))?;
    let config = SearchConfig::default().with_default_top_k(args.top_k);
    if config.default_top_k != args.top_k {
        tracing::warn!(requested = args.top_k, using = config.default_top_k, "top-k out of range, clamped");
    }
    let engine = SearchEngine::with_config(store, config).context("building search index")?;
    let stats = engine.stats();
    tracing::info!(documents = stats.documents, terms = stats.terms, "engine ready");
    let ctx = AppContext::new(engine);

    match args.transport {
        Transport::Stdio => McpServer::new(ctx).serve_stdio().await?,
        Transport::Http => {
            let app: Router = build_app(ctx);
            let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
            let listener = TcpListener::bind(addr).await?;
            tracing::info!(%addr, "server listening");
            axum::serve(listener, app).await?;
        }
    }
    Ok(())
}
