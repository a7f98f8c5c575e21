//! `qrschool` command-line interface.

use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use qrschool_auth::{FileTokenStore, SessionProvider};
use qrschool_config::{ApiConfig, StorageConfig, SyncConfig};
use qrschool_models::{LoginRequest, QrPayload, Role};
use tracing::{info, warn};

use crate::client::{ApiClient, WsFeed};
use crate::notify::LogNotifier;
use crate::sync::{ChannelState, RetryPolicy, SyncController, SyncSnapshot, SyncStage, load_once};
use crate::view::WeekView;

#[derive(Parser)]
#[command(name = "qrschool")]
#[command(about = "QRSchool student client - attendance and schedule from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session tokens
    Login {
        #[arg(short = 'u', long)]
        username: Option<String>,

        /// student, parent or teacher
        #[arg(short = 'r', long, default_value = "student")]
        role: Role,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the QR payload and this week's attendance
    Week {
        /// Any day of the week to show (YYYY-MM-DD); defaults to today
        #[arg(short = 'd', long)]
        date: Option<NaiveDate>,
    },
    /// Follow attendance updates live until Ctrl-C
    Watch,
}

type Session = SessionProvider<FileTokenStore, ApiClient>;

/// Clients and configuration shared by every command.
pub struct App {
    pub api: Arc<ApiClient>,
    pub session: Arc<Session>,
    pub api_config: ApiConfig,
    pub sync_config: SyncConfig,
}

impl App {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_config = ApiConfig::from_env();
        let sync_config = SyncConfig::from_env();
        let storage = StorageConfig::from_env();

        let api = Arc::new(ApiClient::new(&api_config)?);
        let session = Arc::new(SessionProvider::new(
            FileTokenStore::from_config(&storage),
            Arc::clone(&api),
            sync_config.token_leeway(),
        ));
        Ok(Self {
            api,
            session,
            api_config,
            sync_config,
        })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let app = App::from_env()?;
    match cli.command {
        Commands::Login {
            username,
            role,
            password,
        } => handle_login(&app, username, role, password).await,
        Commands::Logout => handle_logout(&app).await,
        Commands::Week { date } => handle_week(&app, date).await,
        Commands::Watch => handle_watch(app).await,
    }
}

async fn handle_login(
    app: &App,
    username: Option<String>,
    role: Role,
    password: Option<String>,
) -> anyhow::Result<()> {
    let username = match username {
        Some(username) => username,
        None => Input::new()
            .with_prompt("Username")
            .interact_text()
            .context("Failed to read username")?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };

    let response = app
        .session
        .login(LoginRequest {
            username: username.clone(),
            password,
            role,
        })
        .await?;

    println!("\n✅ Signed in as {username}");
    if let Some(role) = response.role {
        println!("   Role: {role}");
    }
    Ok(())
}

async fn handle_logout(app: &App) -> anyhow::Result<()> {
    app.session.logout().await?;
    println!("✅ Session cleared");
    Ok(())
}

async fn handle_week(app: &App, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let policy = RetryPolicy::from_config(&app.sync_config);
    let data = load_once(&*app.api, &*app.session, &policy)
        .await
        .context("Could not load attendance; run `qrschool login` if the session expired")?;

    println!("{} ({})", data.profile.name, data.profile.student_id);
    match data.profile.qr_payload() {
        QrPayload::Stored(reference) => println!("QR code: {reference}"),
        QrPayload::Generated(text) => println!("QR payload:\n{text}"),
    }
    println!();

    let today = date.unwrap_or_else(|| Local::now().date_naive());
    print!("{}", WeekView::build(today, &data.schedule, &data.attendance));
    Ok(())
}

async fn handle_watch(app: App) -> anyhow::Result<()> {
    let feed = WsFeed::new(&app.api_config)?;
    let controller = SyncController::new(
        app.api,
        app.session,
        feed,
        LogNotifier,
        app.sync_config,
    );
    let handle = controller.spawn();
    let mut updates = handle.subscribe();
    let mut last = handle.snapshot();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Ctrl-C handler failed, stopping");
                }
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = updates.borrow_and_update().clone();
                report(&last, &current);
                last = current;
                if last.stage.is_terminal() {
                    break;
                }
            }
        }
    }

    let last = handle.shutdown().await;
    match last.stage {
        SyncStage::AuthFailed => bail!("Sign in required: run `qrschool login`"),
        SyncStage::Failed => bail!(
            "{}",
            last.error.unwrap_or_else(|| "Attendance sync failed".into())
        ),
        _ => Ok(()),
    }
}

fn report(previous: &SyncSnapshot, current: &SyncSnapshot) {
    if previous.stage != current.stage {
        info!(stage = %current.stage, "Sync stage");
    }
    if previous.realtime != current.realtime {
        match current.realtime {
            ChannelState::Open => info!("Live attendance updates connected"),
            ChannelState::Closed => warn!(
                warning = current.realtime_warning.as_deref().unwrap_or_default(),
                "Live attendance updates stopped"
            ),
            state => info!(?state, "Realtime channel"),
        }
    }
    if previous.version != current.version || previous.attendance.len() != current.attendance.len() {
        info!(
            version = current.version,
            entries = current.attendance.len(),
            "Attendance updated"
        );
    }
}
