//! Dataroom document server

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod config;
mod db;
mod drive;
mod storage;

use config::Config;

#[derive(Parser)]
#[command(name = "dataroom")]
#[command(about = "Dataroom document server daemon", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server (runs in background)
    Serve {
        /// Run in foreground (don't daemonize)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the server
    Down,
    /// Show server status
    Status,
    /// Run database migrations
    Migrate,
    /// User management
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        /// Email address
        #[arg(long)]
        email: String,
    },
    /// List all users
    List,
}

fn pid_file() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dataroom.pid")
}

fn is_server_running() -> Option<u32> {
    let pid_path = pid_file();
    if pid_path.exists() {
        if let Ok(pid_str) = fs::read_to_string(&pid_path) {
            if let Ok(pid) = pid_str.trim().parse::<u32>() {
                #[cfg(unix)]
                {
                    let result = Command::new("kill")
                        .args(["-0", &pid.to_string()])
                        .stdout(Stdio::null())
                        .stderr(Stdio::null())
                        .status();
                    if result.map(|s| s.success()).unwrap_or(false) {
                        return Some(pid);
                    }
                }
                #[cfg(not(unix))]
                {
                    return Some(pid);
                }
            }
        }
        // Stale pid file, remove it
        let _ = fs::remove_file(&pid_path);
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't need full init
    match &cli.command {
        Commands::Down => {
            return stop_server();
        }
        Commands::Status => {
            return show_status();
        }
        Commands::Serve { foreground } if !foreground => {
            return start_daemon();
        }
        _ => {}
    }

    // Initialize logging for foreground commands
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dataroom=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve { foreground: _ } => {
            // Running in foreground mode
            run_server(config).await?;
        }
        Commands::Down => unreachable!(),
        Commands::Status => unreachable!(),
        Commands::Migrate => {
            run_migrations(&config).await?;
        }
        Commands::User { command } => match command {
            UserCommands::Create { email } => {
                create_user(&config, &email).await?;
            }
            UserCommands::List => {
                list_users(&config).await?;
            }
        },
    }

    Ok(())
}

fn start_daemon() -> anyhow::Result<()> {
    // Check if already running
    if let Some(pid) = is_server_running() {
        println!("dataroom already running (pid {})", pid);
        return Ok(());
    }

    let exe = std::env::current_exe()?;

    // Spawn detached process with --foreground flag
    let child = Command::new(&exe)
        .args(["serve", "--foreground"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let pid = child.id();

    let pid_path = pid_file();
    if let Some(parent) = pid_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&pid_path, pid.to_string())?;

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    println!("dataroom serving on localhost:{}", config.rest_port);
    println!("pid: {}", pid);

    Ok(())
}

fn stop_server() -> anyhow::Result<()> {
    if let Some(pid) = is_server_running() {
        #[cfg(unix)]
        {
            Command::new("kill").args([&pid.to_string()]).status()?;
        }
        #[cfg(not(unix))]
        {
            Command::new("taskkill")
                .args(["/PID", &pid.to_string(), "/F"])
                .status()?;
        }

        let _ = fs::remove_file(pid_file());
        println!("dataroom stopped");
    } else {
        println!("dataroom not running");
    }
    Ok(())
}

fn show_status() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    if let Some(pid) = is_server_running() {
        println!("dataroom running");
        println!("  pid: {}", pid);
        println!("  rest: localhost:{}", config.rest_port);
    } else {
        println!("dataroom not running");
    }
    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    // Save PID for foreground mode too
    let pid_path = pid_file();
    if let Some(parent) = pid_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&pid_path, std::process::id().to_string())?;

    let db_pool = db::create_pool(&config.database_url).await?;

    // Auto-run migrations on startup (idempotent)
    tracing::info!("checking database migrations...");
    if let Err(e) = db::run_migrations(&db_pool).await {
        let err_str = e.to_string();
        if !err_str.contains("already exists") {
            tracing::warn!("migration warning: {}", err_str);
        }
    }

    let blob_store = storage::BlobStore::new(&config.blob_storage_path)?;

    let app_state = api::AppState::new(db_pool, blob_store, config.clone());

    let rest_addr = format!("0.0.0.0:{}", config.rest_port).parse()?;
    tracing::info!("REST listening on {}", rest_addr);
    api::rest::serve(rest_addr, app_state).await?;

    // Cleanup PID file
    let _ = fs::remove_file(pid_file());

    Ok(())
}

async fn run_migrations(config: &Config) -> anyhow::Result<()> {
    println!("running migrations...");
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    println!("migrations complete");
    Ok(())
}

async fn create_user(config: &Config, email: &str) -> anyhow::Result<()> {
    use std::io::{self, Write};

    if !email.contains('@') {
        anyhow::bail!("Invalid email address");
    }

    // Always prompt for the password interactively
    print!("Password: ");
    io::stdout().flush()?;

    let password = tokio::task::spawn_blocking(|| -> anyhow::Result<String> {
        let pass = rpassword::read_password()?;
        Ok(pass)
    })
    .await??;

    print!("Confirm password: ");
    io::stdout().flush()?;

    let confirm = tokio::task::spawn_blocking(|| -> anyhow::Result<String> {
        let pass = rpassword::read_password()?;
        Ok(pass)
    })
    .await??;

    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    if password.len() < 8 {
        anyhow::bail!("Password must be at least 8 characters");
    }

    println!("Connecting to database...");

    let pool = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        db::create_pool(&config.database_url),
    )
    .await
    .map_err(|_| anyhow::anyhow!("Database connection timed out. Is PostgreSQL running?"))??;

    println!("Hashing password...");
    let password_hash = auth::hash_password(&password)?;

    println!("Creating user in database...");
    let user = db::users::create_user(&pool, email, &password_hash).await?;

    println!("User created: {} ({})", user.id, user.email);

    Ok(())
}

async fn list_users(config: &Config) -> anyhow::Result<()> {
    let pool = db::create_pool(&config.database_url).await?;
    let users = db::users::list_users(&pool).await?;

    if users.is_empty() {
        println!("no users");
    } else {
        let stats = db::get_stats(&pool).await?;
        for user in users {
            println!("{} - {}", user.id, user.email);
        }
        println!(
            "{} users, {} documents in {} folders ({} bytes)",
            stats.total_users, stats.total_documents, stats.total_folders, stats.total_document_bytes
        );
    }

    Ok(())
}
