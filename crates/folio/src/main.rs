use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "folio", about = "Folio portfolio CMS server and admin CLI", version)]
struct Cli {
    /// Folio server URL (default: http://localhost:8000 or $FOLIO_SERVER)
    #[arg(long, env = "FOLIO_SERVER", default_value = "http://localhost:8000")]
    server: String,

    /// Bearer session token for admin commands ($FOLIO_TOKEN)
    #[arg(long, env = "FOLIO_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Folio HTTP server
    Serve {
        /// Port to listen on (default: $FOLIO_PORT or 8000)
        #[arg(long, env = "FOLIO_PORT", default_value = "8000")]
        port: u16,
        /// Host to bind (default: $FOLIO_HOST or 0.0.0.0)
        #[arg(long, env = "FOLIO_HOST", default_value = "0.0.0.0")]
        host: String,
    },
    /// Check server health
    Health,
    /// Log in and print a session token
    Login {
        /// Admin username
        username: String,
        /// Admin password
        password: String,
    },
    /// Create a config backup on the server
    Backup,
    /// List contact messages
    Messages,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FOLIO_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host } => cmd_serve(host, port).await,

        Commands::Health => cmd_health(&cli.server).await,

        Commands::Login { username, password } => {
            cmd_login(&cli.server, &username, &password).await
        }

        Commands::Backup => {
            let token = require_token(&cli.token)?;
            cmd_backup(&cli.server, &token).await
        }

        Commands::Messages => {
            let token = require_token(&cli.token)?;
            cmd_messages(&cli.server, &token).await
        }
    }
}

// ── Command implementations ───────────────────────────────────────────────────

async fn cmd_serve(host: String, port: u16) -> Result<()> {
    let cfg = folio_server::ServerConfig {
        host,
        port,
        ..Default::default()
    };
    folio_server::run(cfg).await
}

async fn cmd_health(server: &str) -> Result<()> {
    let resp = Client::new()
        .get(format!("{}/api/health", server.trim_end_matches('/')))
        .send()
        .await
        .context("HTTP request failed")?;

    let status = resp.status();
    let json: Value = resp.json().await.context("parse response")?;
    if status.is_success() {
        println!(
            "{} (version {})",
            json["status"].as_str().unwrap_or("unknown"),
            json["version"].as_str().unwrap_or("?")
        );
        Ok(())
    } else {
        anyhow::bail!("server returned {status}");
    }
}

async fn cmd_login(server: &str, username: &str, password: &str) -> Result<()> {
    let resp = Client::new()
        .post(format!("{}/api/auth/login", server.trim_end_matches('/')))
        .json(&serde_json::json!({"username": username, "password": password}))
        .send()
        .await
        .context("HTTP request failed")?;

    let status = resp.status();
    let json: Value = resp.json().await.context("parse response")?;
    if status.is_success() {
        println!("{}", json["token"].as_str().unwrap_or(""));
        Ok(())
    } else {
        anyhow::bail!(
            "login failed: {}",
            json["error"].as_str().unwrap_or("unknown error")
        );
    }
}

async fn cmd_backup(server: &str, token: &str) -> Result<()> {
    let resp = Client::new()
        .post(format!("{}/api/backup", server.trim_end_matches('/')))
        .bearer_auth(token)
        .send()
        .await
        .context("HTTP request failed")?;

    let status = resp.status();
    let json: Value = resp.json().await.context("parse response")?;
    if status.is_success() {
        println!("✓ backup written: {}", json["file"].as_str().unwrap_or(""));
        Ok(())
    } else {
        anyhow::bail!(
            "server returned {status}: {}",
            json["error"].as_str().unwrap_or("")
        );
    }
}

async fn cmd_messages(server: &str, token: &str) -> Result<()> {
    let resp = Client::new()
        .get(format!("{}/api/messages", server.trim_end_matches('/')))
        .bearer_auth(token)
        .send()
        .await
        .context("HTTP request failed")?;

    if !resp.status().is_success() {
        let status = resp.status();
        anyhow::bail!("server returned {status}");
    }

    let messages: Vec<Value> = resp.json().await.context("parse messages")?;
    if messages.is_empty() {
        println!("(no messages)");
        return Ok(());
    }
    for m in &messages {
        let flag = if m["read"].as_bool().unwrap_or(false) {
            " "
        } else {
            "*"
        };
        println!(
            "{flag} [{}] {} {} <{}> {}",
            m["timestamp"].as_str().unwrap_or(""),
            m["firstName"].as_str().unwrap_or(""),
            m["lastName"].as_str().unwrap_or(""),
            m["email"].as_str().unwrap_or(""),
            m["subject"].as_str().unwrap_or(""),
        );
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn require_token(token: &Option<String>) -> Result<String> {
    token
        .clone()
        .context("--token / FOLIO_TOKEN is required for this command")
}
