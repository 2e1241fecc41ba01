//! nn: command-line client for the nn-stack server.
//!
//! Point it at a server with `--api-url` or `NN_STACK_API_URL`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use common::contract::{CreateUserInput, UpdateTodoInput, UpdateUserInput};
use console::style;
use dialoguer::Confirm;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uploader::{
    FileHandle, FileStatus, HttpTransfer, MimePattern, Notice, QueryCache, RpcClient,
    SuccessPolicy, UploadPolicy, UploadQueue,
};

#[derive(Parser)]
#[command(name = "nn", version, about = "nn-stack command-line client")]
struct Cli {
    /// Base URL of the server
    #[arg(
        long,
        global = true,
        env = "NN_STACK_API_URL",
        default_value = "http://127.0.0.1:4000"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the server and each of its bindings
    Health,
    /// User operations
    Users {
        #[command(subcommand)]
        sub: UserCommands,
    },
    /// Todo operations
    Todos {
        #[command(subcommand)]
        sub: TodoCommands,
    },
    /// List the planet catalogue
    Planets,
    /// Upload files straight to object storage
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Keep uploaded files listed as successful instead of dropping them
        #[arg(long)]
        retain: bool,
        /// Largest accepted file in bytes
        #[arg(long)]
        max_size: Option<u64>,
        /// Accepted MIME patterns, e.g. `image/*`
        #[arg(long, value_delimiter = ',')]
        accept: Vec<MimePattern>,
    },
    /// List stored objects
    List,
    /// Delete a stored object
    Delete {
        /// Object key
        key: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    List,
    Create {
        name: String,
        email: String,
    },
    /// Change a user's name or email
    Update {
        id: i32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Delete {
        id: i32,
    },
}

#[derive(Subcommand)]
enum TodoCommands {
    List,
    Create {
        text: String,
    },
    Update {
        id: i32,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        completed: Option<bool>,
    },
    Delete {
        id: i32,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::Success(m) => eprintln!("{} {}", style("✔").green(), m),
        Notice::Error(m) => eprintln!("{} {}", style("✘").red(), m),
    }
}

fn drain_notices(rx: &mut broadcast::Receiver<Notice>) {
    while let Ok(notice) = rx.try_recv() {
        print_notice(&notice);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let client = RpcClient::new(&cli.api_url).context("Failed to create API client")?;

    match cli.command {
        Commands::Health => health(&client).await,
        Commands::Users { sub } => users(&client, sub).await,
        Commands::Todos { sub } => todos(&client, sub).await,
        Commands::Planets => print_json(&client.list_planets().await?),
        Commands::Upload {
            files,
            retain,
            max_size,
            accept,
        } => {
            let mut policy = UploadPolicy::default();
            if retain {
                policy.on_success = SuccessPolicy::Retain;
            }
            if let Some(max_size) = max_size {
                policy.max_file_size = max_size;
            }
            if !accept.is_empty() {
                policy.accept = accept;
            }
            upload(client, policy, files).await
        }
        Commands::List => print_json(&client.list_objects().await?),
        Commands::Delete { key, yes } => delete(client, key, yes).await,
    }
}

async fn health(client: &RpcClient) -> anyhow::Result<()> {
    let checks = [
        ("connection", client.health_connection().await),
        ("kv", client.health_kv().await),
        ("db", client.health_db().await),
        ("r2", client.health_r2().await),
    ];

    for (name, result) in checks {
        match result {
            Ok(status) => println!("{:<12} {}", name, style(status).green()),
            Err(e) => println!("{:<12} {}", name, style(e).red()),
        }
    }
    Ok(())
}

async fn users(client: &RpcClient, sub: UserCommands) -> anyhow::Result<()> {
    match sub {
        UserCommands::List => print_json(&client.get_users().await?),
        UserCommands::Create { name, email } => {
            print_json(&client.create_user(&CreateUserInput { name, email }).await?)
        }
        UserCommands::Update { id, name, email } => {
            if name.is_none() && email.is_none() {
                bail!("Nothing to update: pass --name or --email");
            }
            print_json(&client.update_user(&UpdateUserInput { id, name, email }).await?)
        }
        UserCommands::Delete { id } => print_json(&client.delete_user(id).await?),
    }
}

async fn todos(client: &RpcClient, sub: TodoCommands) -> anyhow::Result<()> {
    match sub {
        TodoCommands::List => print_json(&client.get_todos().await?),
        TodoCommands::Create { text } => print_json(&client.create_todo(text).await?),
        TodoCommands::Update {
            id,
            text,
            completed,
        } => print_json(
            &client
                .update_todo(&UpdateTodoInput {
                    id,
                    text,
                    completed,
                })
                .await?,
        ),
        TodoCommands::Delete { id } => print_json(&client.delete_todo(id).await?),
    }
}

fn build_queue(client: RpcClient, policy: UploadPolicy) -> anyhow::Result<UploadQueue> {
    let client = Arc::new(client);
    let transfer = HttpTransfer::new().context("Failed to create upload client")?;
    Ok(UploadQueue::new(
        client.clone(),
        client,
        Arc::new(transfer),
        Arc::new(QueryCache::new()),
    )
    .with_policy(policy))
}

async fn upload(client: RpcClient, policy: UploadPolicy, paths: Vec<PathBuf>) -> anyhow::Result<()> {
    let queue = Arc::new(build_queue(client, policy)?);
    let mut notices = queue.subscribe();

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let file = FileHandle::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(file);
    }

    let outcome = queue.enqueue(files);
    drain_notices(&mut notices);
    if outcome.accepted.is_empty() {
        bail!("No file was accepted for upload");
    }

    let batch = tokio::spawn({
        let queue = queue.clone();
        async move { queue.start_upload().await }
    });

    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    while !batch.is_finished() {
        ticker.tick().await;
        for file in queue.files() {
            if file.status == FileStatus::Uploading {
                eprintln!("{} {:>3}% {}", style("↑").cyan(), file.progress, file.name);
            }
        }
        drain_notices(&mut notices);
    }

    let report = batch.await.context("Upload task panicked")?;
    drain_notices(&mut notices);
    let report = report?;

    eprintln!(
        "{} uploaded, {} failed",
        style(report.succeeded).green(),
        style(report.failed).red()
    );
    if let Some(objects) = queue.stored_objects() {
        print_json(&objects)?;
    }
    if report.failed > 0 {
        bail!("{} of {} upload(s) failed", report.failed, report.attempted);
    }
    Ok(())
}

async fn delete(client: RpcClient, key: String, yes: bool) -> anyhow::Result<()> {
    let queue = build_queue(client, UploadPolicy::default())?;
    let mut notices = queue.subscribe();

    queue.request_delete(key.clone());
    let confirmed = yes
        || Confirm::new()
            .with_prompt(format!("Delete {key}? This cannot be undone"))
            .default(false)
            .interact()?;
    if !confirmed {
        queue.cancel_delete();
        eprintln!("Cancelled");
        return Ok(());
    }

    let result = queue.confirm_delete().await;
    drain_notices(&mut notices);
    result?;
    Ok(())
}
