//! CLI entry point for `inbound-drop`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};

use inbound_drop::config::{self, Config};
use inbound_drop::extract::{extract_attachments, ExtractionStrategy};
use inbound_drop::parser::form::WebhookRequest;
use inbound_drop::store::{LocalStore, MemoryStore, ObjectStore};
use inbound_drop::webhook::{self, WebhookOutcome};

#[derive(Parser)]
#[command(
    name = "inbound-drop",
    version,
    about = "Receive Inbound Parse webhooks and drop email attachments into client storage"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to $INBOUND_DROP_CONFIG or the user config dir)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a captured webhook request through the full pipeline
    Replay {
        /// File holding the raw request body
        body: PathBuf,
        /// The request's Content-Type header
        #[arg(short = 't', long)]
        content_type: String,
        /// Keep objects in memory instead of writing to the storage root
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show the recognized fields and attachments of a captured request
    Inspect {
        body: PathBuf,
        #[arg(short = 't', long)]
        content_type: String,
        #[arg(long)]
        json: bool,
    },
    /// List the configured clients
    Clients {
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Completions and man pages need neither config nor logging
    match cli.command {
        Commands::Completions { shell } => return cmd_completions(shell),
        Commands::Manpage => return cmd_manpage(),
        _ => {}
    }

    let config = config::load_config(cli.config.as_deref())?;

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Replay {
            body,
            content_type,
            dry_run,
            json,
        } => cmd_replay(&config, &body, &content_type, dry_run, json),
        Commands::Inspect {
            body,
            content_type,
            json,
        } => cmd_inspect(&body, &content_type, json),
        Commands::Clients { json } => cmd_clients(&config, json),
        Commands::Completions { .. } | Commands::Manpage => Ok(()),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::log_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::daily(&log_dir, "inbound-drop.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn read_request(body: &Path, content_type: &str) -> anyhow::Result<WebhookRequest> {
    if !body.exists() {
        anyhow::bail!("Request body not found: {}", body.display());
    }
    let bytes = std::fs::read(body)?;
    Ok(WebhookRequest::new(content_type, bytes))
}

/// Run the pipeline on a captured request and print the HTTP answer.
fn cmd_replay(
    config: &Config,
    body: &Path,
    content_type: &str,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let request = read_request(body, content_type)?;
    let timestamp = chrono::Utc::now().timestamp();

    let memory;
    let local;
    let store: &dyn ObjectStore = if dry_run {
        memory = MemoryStore::new();
        &memory
    } else {
        local = LocalStore::open(&config.storage.root, &config.storage.bucket)?;
        &local
    };

    let outcome = webhook::handle(&request, config, store, timestamp);
    let response = outcome.response();
    let stored: &[String] = match &outcome {
        WebhookOutcome::Stored { paths, .. } => paths,
        _ => &[],
    };

    if json {
        let value = serde_json::json!({
            "status": response.status,
            "body": response.body,
            "outcome": outcome_label(&outcome),
            "timestamp": timestamp,
            "stored": stored,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{} {:?}", response.status, response.body);
        println!("  outcome: {}", outcome_label(&outcome));
        for path in stored {
            println!("  stored:  {}/{}", config.storage.bucket, path);
        }
    }

    Ok(())
}

fn outcome_label(outcome: &WebhookOutcome) -> &'static str {
    match outcome {
        WebhookOutcome::Stored { .. } => "stored",
        WebhookOutcome::NoAttachments { .. } => "no-attachments",
        WebhookOutcome::RejectedContentTypes { .. } => "rejected-content-types",
        WebhookOutcome::ExtractionFailed { .. } => "extraction-failed",
        WebhookOutcome::StorageFailed { .. } => "storage-failed",
        WebhookOutcome::Forbidden { .. } => "forbidden",
    }
}

/// Print the recognized fields and extracted attachments, without
/// authorization or storage.
fn cmd_inspect(body: &Path, content_type: &str, json: bool) -> anyhow::Result<()> {
    let request = read_request(body, content_type)?;
    let payload = request.parse();
    let strategy = ExtractionStrategy::select(&payload);
    let attachments = extract_attachments(&payload)?;

    if json {
        let fields: serde_json::Map<String, serde_json::Value> = payload
            .key_values()
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(v.as_str())))
            .collect();
        let value = serde_json::json!({
            "fields": fields,
            "strategy": strategy.map(|s| format!("{s:?}")),
            "attachments": attachments,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!();
    println!("  Fields:");
    for (key, value) in payload.key_values() {
        let preview: String = value.chars().take(60).collect();
        println!("    {:<16} {}", key.as_str(), preview.replace(['\r', '\n'], " "));
    }
    println!();
    match strategy {
        Some(s) => println!("  Strategy: {s:?}"),
        None => println!("  Strategy: none"),
    }
    println!("  Attachments: {}", attachments.len());
    for a in &attachments {
        println!(
            "    {:<40} {:<30} {}",
            a.file_name,
            a.content_type,
            humansize::format_size(a.size(), humansize::BINARY)
        );
    }
    println!();

    Ok(())
}

/// List the client table.
fn cmd_clients(config: &Config, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&config.clients)?);
        return Ok(());
    }

    println!();
    println!("  Domain: {}", config.inbound.email_domain);
    println!("  Bucket: {}", config.storage.bucket);
    println!();
    if config.clients.is_empty() {
        println!("  No clients configured; every sender is refused.");
    }
    for (local_part, client) in &config.clients {
        let types: Vec<&str> = client
            .allowed_content_types
            .iter()
            .map(String::as_str)
            .collect();
        println!(
            "  {:<20} -> {:<24} [{}]",
            format!("{local_part}@{}", config.inbound.email_domain),
            client.storage_prefix,
            types.join(", ")
        );
    }
    println!();

    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "inbound-drop", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
