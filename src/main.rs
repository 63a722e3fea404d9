use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tokio::net::TcpListener;
use tracing::info;

use doc_chat::agents::{FileUploadAgent, ReplyAgent, UploadedDocument};
use doc_chat::middleware::create_token;
use doc_chat::session::DEFAULT_TEMPERATURE;
use doc_chat::utils::init_logger;
use doc_chat::{create_router, AppState, Config};

#[derive(Parser)]
#[command(name = "doc-chat", version, about = "Chat with an uploaded document")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web service
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Address to bind (overrides HOST)
        #[arg(long)]
        host: Option<String>,
    },
    /// Answer one question about a local file
    Ask {
        /// Document to read (.json, .txt, .doc, .docx)
        #[arg(long)]
        file: PathBuf,
        /// MIME type; inferred from the extension when omitted
        #[arg(long)]
        mime: Option<String>,
        /// Question to ask
        #[arg(long)]
        query: String,
        /// Verbosity, 0.0 to 1.0
        #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f32,
        /// Seed for phrase selection
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print a signed token for the given JSON claims
    Token {
        /// Claims object, e.g. '{"userId":"123"}'
        #[arg(long)]
        claims: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port, host } => serve(port, host).await,
        Command::Ask {
            file,
            mime,
            query,
            temperature,
            seed,
        } => ask(file, mime, query, temperature, seed).await,
        Command::Token { claims } => token(&claims),
    }
}

async fn serve(port: Option<u16>, host: Option<String>) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }
    info!("Configuration loaded: {:?}", config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config);
    let app = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn ask(
    file: PathBuf,
    mime: Option<String>,
    query: String,
    temperature: f32,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    if query.trim().is_empty() {
        bail!("Query must not be blank");
    }

    let data = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file.file_name().and_then(|name| name.to_str());
    let doc = UploadedDocument::from_part(filename, mime.as_deref(), data);

    info!(filename = %doc.filename, content_type = %doc.content_type, "Extracting document");
    let text = FileUploadAgent::process_file(doc).await?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let reply = ReplyAgent::generate_response(&text, query.trim(), temperature, &mut rng);

    println!("{}", reply);
    Ok(())
}

fn token(claims: &str) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let payload: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(claims).context("Claims must be a JSON object")?;

    let token = create_token(payload, &config.auth.secret)?;
    println!("{}", token);
    Ok(())
}
