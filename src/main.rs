use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use face_attendance::nats::{spawn_marked_publisher, spawn_recognition_listener, FaceResolver};
use face_attendance::{
    create_router, AppState, AttendanceSession, ChannelObserver, Config, CsvAttendanceStore,
    EncodingStore, Identity, LoggingObserver, MarkOutcome, NatsClient, SessionConfig, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "face-attendance")]
#[command(about = "Face attendance bookkeeping service")]
struct Args {
    /// Config file (without extension)
    #[arg(short, long, default_value = "config/face-attendance")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API and, if configured, the NATS recognition bridge
    Serve,
    /// Print the attendance sheet for a day (default: today)
    Report {
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// List days that have an attendance sheet
    Days,
    /// Mark an identity by hand
    Mark { identity: String },
    /// Summarize a face encoding store (default: the configured one)
    Encodings { path: Option<PathBuf> },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Loaded config: {}", cfg.service.name);

    match args.command {
        Command::Serve => serve(cfg).await,
        Command::Report { date } => report(&cfg, date),
        Command::Days => days(&cfg),
        Command::Mark { identity } => mark(&cfg, &identity),
        Command::Encodings { path } => encodings(&cfg, path),
    }
}

fn open_session(cfg: &Config, session_config: SessionConfig) -> Result<AttendanceSession> {
    let store = CsvAttendanceStore::new(cfg.store_config())?;
    let mut session =
        AttendanceSession::new(session_config, Box::new(store), Box::new(SystemClock))?;
    session.add_observer(Box::new(LoggingObserver));
    Ok(session)
}

async fn serve(cfg: Config) -> Result<()> {
    let mut session = open_session(&cfg, SessionConfig::default())?;
    let session_id = session.session_id().to_string();

    info!("Attendance sheet: {}", session.destination().display());

    let mut tasks = Vec::new();

    let nats = match &cfg.nats.url {
        Some(url) => Some(Arc::new(NatsClient::connect(url, session_id.clone()).await?)),
        None => {
            warn!("No NATS url configured; recognition events only arrive over HTTP");
            None
        }
    };

    if let Some(client) = &nats {
        let (observer, records) = ChannelObserver::new();
        session.add_observer(Box::new(observer));
        tasks.push(spawn_marked_publisher(
            Arc::clone(client),
            cfg.nats.marked_subject.clone(),
            records,
        ));
    }

    let session = Arc::new(Mutex::new(session));

    if let Some(client) = &nats {
        let subscriber = client
            .subscribe_recognitions(&cfg.nats.recognized_subject)
            .await?;
        let resolver = load_resolver(&cfg).map(Arc::new);
        tasks.push(spawn_recognition_listener(
            subscriber,
            Arc::clone(&session),
            resolver,
        ));
    }

    let app = create_router(AppState::new(session));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown requested");
        })
        .await?;

    for task in tasks {
        task.abort();
    }

    Ok(())
}

/// Encodings for faces the recognizer sends unlabeled; optional
fn load_resolver(cfg: &Config) -> Option<FaceResolver> {
    let path = cfg.encodings_path();
    match EncodingStore::load(&path) {
        Ok(store) => {
            info!(
                "Matching unlabeled faces against {} encodings (tolerance {}, {:?})",
                store.len(),
                cfg.recognition.tolerance,
                cfg.recognition.match_policy
            );
            Some(FaceResolver::new(store, cfg.matcher()))
        }
        Err(e) => {
            warn!("Unlabeled faces will count as unknown: {}", e);
            None
        }
    }
}

fn report(cfg: &Config, date: Option<NaiveDate>) -> Result<()> {
    let session = open_session(cfg, SessionConfig::default())?;
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let records = session.records_for(date)?;

    println!("Attendance for {} ({} present)", date, records.len());
    for record in records {
        println!("{:<24} {}", record.identity, record.time);
    }

    Ok(())
}

fn days(cfg: &Config) -> Result<()> {
    let session = open_session(cfg, SessionConfig::default())?;

    for day in session.available_days()? {
        println!("{}", day);
    }

    Ok(())
}

fn mark(cfg: &Config, identity: &str) -> Result<()> {
    let mut session = open_session(cfg, SessionConfig::default())?;
    let identity = Identity::new(identity)?;

    match session.on_recognized(&identity)? {
        MarkOutcome::Marked(record) => println!("Marked {} at {}", record.identity, record.time),
        _ => println!("{} is already marked for {}", identity, session.current_date()),
    }

    Ok(())
}

fn encodings(cfg: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| cfg.encodings_path());
    let store = EncodingStore::load(&path)
        .with_context(|| format!("Failed to load encodings from {}", path.display()))?;

    println!(
        "{} encodings, dimension {}",
        store.len(),
        store.dimension().map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    );
    for (name, count) in store.identities() {
        println!("{:<24} {}", name, count);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodings_path_is_optional() {
        let args = Args::try_parse_from(["face-attendance", "encodings", "/tmp/known.json"]).unwrap();
        match args.command {
            Command::Encodings { path } => assert_eq!(path, Some(PathBuf::from("/tmp/known.json"))),
            _ => panic!("expected encodings command"),
        }

        let args = Args::try_parse_from(["face-attendance", "encodings"]).unwrap();
        assert!(matches!(args.command, Command::Encodings { path: None }));
    }
}
