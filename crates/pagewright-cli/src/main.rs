//! pagewright CLI: relay server, terminal chat and diagnostics

use clap::{Parser, Subcommand};
use pagewright_engine::{
    extract, ChatBackend, ChatMessage, ChatSession, Config, FileSurface, PreviewRenderer,
    RelayClient, TurnOutcome,
};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Chat your way to a website, previewed live
#[derive(Parser)]
#[command(name = "pagewright")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file (environment variables still override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay between clients and the generation backend
    Serve {
        /// Listen address, e.g. 127.0.0.1:3000
        #[arg(long)]
        bind: Option<String>,

        /// Generation backend base address
        #[arg(long)]
        backend_url: Option<String>,
    },

    /// Open the terminal chat (default when no command specified)
    Chat {
        /// Relay base address
        #[arg(long)]
        relay_url: Option<String>,

        /// File the preview is written to
        #[arg(long)]
        preview: Option<PathBuf>,
    },

    /// Send one message and print the reply
    Ask {
        /// Message to send
        message: String,

        /// Relay base address
        #[arg(long)]
        relay_url: Option<String>,

        /// File the preview is written to
        #[arg(long)]
        preview: Option<PathBuf>,

        /// Wait for the whole reply instead of streaming it
        #[arg(long)]
        buffered: bool,
    },

    /// Print configuration and check the relay
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Log file for the terminal chat, which owns the screen.
const CHAT_LOG_FILE: &str = "pagewright.log";

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");

    match cli.command {
        None => cmd_chat(&rt, config, None, None),
        Some(Commands::Chat { relay_url, preview }) => cmd_chat(&rt, config, relay_url, preview),
        Some(Commands::Serve { bind, backend_url }) => {
            cmd_serve(&rt, config, bind, backend_url);
        }
        Some(Commands::Ask {
            message,
            relay_url,
            preview,
            buffered,
        }) => {
            cmd_ask(&rt, config, &message, relay_url, preview, buffered);
        }
        Some(Commands::Doctor { json }) => {
            init_tracing("warn");
            rt.block_on(cmd_doctor(&config, json));
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config, pagewright_engine::ConfigError> {
    let base = match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    Ok(base.with_overrides(|key| std::env::var(key).ok()))
}

/// Log to stderr, filtered by `RUST_LOG` (default `default_level`).
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Log to a file so the terminal chat's screen stays clean.
fn init_file_tracing() {
    let path = std::env::temp_dir().join(CHAT_LOG_FILE);
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        // Without a log file, stay silent rather than draw over the UI.
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

fn cmd_serve(
    rt: &tokio::runtime::Runtime,
    mut config: Config,
    bind: Option<String>,
    backend_url: Option<String>,
) {
    init_tracing("info");
    if let Some(bind) = bind {
        config.bind = bind;
    }
    if let Some(url) = backend_url {
        config.backend_url = url;
    }
    if let Err(e) = rt.block_on(pagewright_relay::run(&config)) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_chat(
    rt: &tokio::runtime::Runtime,
    mut config: Config,
    relay_url: Option<String>,
    preview: Option<PathBuf>,
) {
    init_file_tracing();
    if let Some(url) = relay_url {
        config.relay_url = url;
    }
    if let Some(path) = preview {
        config.preview_path = path;
    }
    if let Err(e) = rt.block_on(pagewright_tui::run_tui(&config)) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_ask(
    rt: &tokio::runtime::Runtime,
    mut config: Config,
    message: &str,
    relay_url: Option<String>,
    preview: Option<PathBuf>,
    buffered: bool,
) {
    init_tracing("warn");
    if let Some(url) = relay_url {
        config.relay_url = url;
    }
    if let Some(path) = preview {
        config.preview_path = path;
    }

    let client = RelayClient::new(&config.relay_url);
    let surface = FileSurface::new(&config.preview_path);

    let ok = if buffered {
        rt.block_on(ask_buffered(client, surface, message))
    } else {
        rt.block_on(ask_streamed(client, surface, message))
    };
    if !ok {
        std::process::exit(1);
    }
}

/// One streamed turn. Returns whether it succeeded.
async fn ask_streamed(client: RelayClient, surface: FileSurface, message: &str) -> bool {
    let preview = surface.path().to_path_buf();
    let session = ChatSession::new(client, surface);
    match session.send(message).await {
        Ok(TurnOutcome::Completed { reply, extraction }) => {
            println!("{reply}");
            if !extraction.is_none() {
                eprintln!(
                    "Preview ({}) written to {}",
                    extraction.confidence.label(),
                    preview.display()
                );
            }
            true
        }
        Ok(TurnOutcome::Failed(e)) => {
            eprintln!("Error: {e}");
            false
        }
        Err(e) => {
            eprintln!("Error: {e}");
            false
        }
    }
}

/// One buffered turn. Returns whether it succeeded.
async fn ask_buffered(client: RelayClient, surface: FileSurface, message: &str) -> bool {
    if message.trim().is_empty() {
        eprintln!("Error: message is empty");
        return false;
    }
    let preview = surface.path().to_path_buf();
    let history = [ChatMessage::greeting(), ChatMessage::user(message)];
    let reply = match client.complete(&history).await {
        Ok(reply) => reply,
        Err(e) => {
            eprintln!("Error: {e}");
            return false;
        }
    };
    println!("{}", reply.content);

    let extraction = extract(&reply.content);
    if let Some(html) = extraction.html.as_deref() {
        let renderer = PreviewRenderer::new(surface);
        match renderer.update(html) {
            Ok(_) => eprintln!(
                "Preview ({}) written to {}",
                extraction.confidence.label(),
                preview.display()
            ),
            Err(e) => eprintln!("Warning: {e}"),
        }
    }
    true
}

async fn cmd_doctor(config: &Config, json: bool) {
    let client = RelayClient::new(&config.relay_url);
    let health = client.health().await;

    if json {
        let report = serde_json::json!({
            "version": pagewright_engine::engine_version(),
            "config": config,
            "relay": {
                "url": client.base_url(),
                "healthy": health.is_ok(),
                "error": health.as_ref().err().map(ToString::to_string),
            },
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).expect("failed to serialize")
        );
        return;
    }

    println!("pagewright {}\n", pagewright_engine::engine_version());
    println!("  Backend:  {}", config.backend_url);
    println!("  Bind:     {}", config.bind);
    println!("  Relay:    {}", config.relay_url);
    println!("  Preview:  {}", config.preview_path.display());
    println!();
    match health {
        Ok(()) => println!("Relay is reachable"),
        Err(e) => println!("Relay is not reachable: {e}"),
    }
}
