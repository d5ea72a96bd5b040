use std::sync::Arc;

use goalpath_core::events::{BroadcastEventSink, DomainEvent};
use goalpath_core::goals::GoalStore;
use goalpath_storage_remote::{AuthClient, RestClient, RestGoalRepository, SessionManager};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, Credentials};

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct AppState {
    pub session: Arc<SessionManager>,
    pub store: GoalStore,
    pub events: Arc<BroadcastEventSink>,
}

pub fn init_tracing() {
    let log_format = std::env::var("GOALPATH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so stdout stays machine-readable.
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let auth = AuthClient::new(&config.remote)?;
    let session = Arc::new(SessionManager::new(auth));

    let client = RestClient::new(&config.remote, session.clone())?;
    let repository = Arc::new(RestGoalRepository::new(client));
    let events = Arc::new(BroadcastEventSink::new(EVENT_CHANNEL_CAPACITY));

    let store = GoalStore::new(repository, session.clone(), events.clone());
    tracing::debug!("Goal store ready (table {})", config.remote.goals_table);

    Ok(AppState {
        session,
        store,
        events,
    })
}

pub async fn sign_in(state: &AppState, credentials: Option<&Credentials>) -> anyhow::Result<()> {
    let session = match credentials {
        Some(Credentials::Password { email, password }) => {
            state.session.sign_in(email, password).await?
        }
        Some(Credentials::RefreshToken(token)) => state.session.restore(token).await?,
        None => anyhow::bail!(
            "No credentials configured; set GOALPATH_EMAIL and GOALPATH_PASSWORD or GOALPATH_REFRESH_TOKEN"
        ),
    };
    tracing::info!("Signed in as {}", session.email.as_deref().unwrap_or(&session.user_id));
    Ok(())
}

/// Logs every domain event the store emits until the sink is dropped.
pub fn spawn_event_logger(events: &BroadcastEventSink) -> tokio::task::JoinHandle<()> {
    let mut receiver = events.subscribe();
    tracing::debug!("Event subscribers: {}", events.subscriber_count());
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event logger skipped {} event(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn log_event(event: &DomainEvent) {
    match event {
        DomainEvent::GoalsLoadFailed { message } => {
            tracing::warn!("Goals failed to load: {}", message)
        }
        DomainEvent::GoalCompleted { goal_id, .. } => {
            tracing::info!("Goal {} completed", goal_id)
        }
        other => tracing::debug!("Domain event: {:?}", other),
    }
}
