//! Attendance Service
//!
//! Owns the live attendance sessions, one slot per class. Each slot has at
//! most one ticker task; starting over or cancelling aborts it before the
//! slot changes hands.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::Instrument;

use crate::attendance_span;
use crate::logging;
use crate::models::attendance_session::{
    AttendanceResult, AttendanceSession, AttendanceSessionError, BroadcastStatus,
    DistributionMode, QrPayload, SessionPhase,
};
use crate::models::class_record::ClassRecord;
use crate::services::scan_simulator::{tick_session, ScanSimulator, ScanSource, SimulatorConfig};
use crate::services::time_provider::{SystemTimeProvider, TimeProvider};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle notifications for anyone watching sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum SessionEvent {
    Started {
        class_id: String,
        session_id: String,
    },
    Ticked {
        class_id: String,
        session_id: String,
        remaining_seconds: u32,
        scanned_count: u32,
    },
    Finalized(AttendanceResult),
    Cancelled {
        class_id: String,
        session_id: String,
    },
}

/// Session state for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub session_id: String,
    pub short_id: String,
    pub class_id: String,
    pub class_name: String,
    pub phase: SessionPhase,
    pub finalized: bool,
    pub total_enrolled: u32,
    pub duration_seconds: u32,
    pub remaining_seconds: u32,
    pub scanned_count: u32,
    pub progress_percentage: f64,
    pub mode: DistributionMode,
    pub broadcast_status: Option<BroadcastStatus>,
    pub connected_students: u32,
    pub started_at: DateTime<Utc>,
    pub result: Option<AttendanceResult>,
}

impl From<&AttendanceSession> for SessionState {
    fn from(session: &AttendanceSession) -> Self {
        Self {
            session_id: session.session_id.clone(),
            short_id: session.short_id().to_string(),
            class_id: session.class_id.clone(),
            class_name: session.class_name.clone(),
            phase: session.phase,
            finalized: session.is_finalized(),
            total_enrolled: session.total_enrolled,
            duration_seconds: session.duration_seconds,
            remaining_seconds: session.remaining_seconds,
            scanned_count: session.scanned_count,
            progress_percentage: session.progress() * 100.0,
            mode: session.mode,
            broadcast_status: session.broadcast_status,
            connected_students: session.connected_students,
            started_at: session.started_at,
            result: session.result.clone(),
        }
    }
}

struct SessionSlot {
    session: AttendanceSession,
    ticker: Option<JoinHandle<()>>,
}

impl SessionSlot {
    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// Attendance service for running timed sessions
#[derive(Clone)]
pub struct AttendanceService {
    /// Current session per class id
    slots: Arc<RwLock<HashMap<String, SessionSlot>>>,

    /// Randomness shared by every session
    source: Arc<Mutex<Box<dyn ScanSource>>>,

    time_provider: Arc<dyn TimeProvider>,

    config: SimulatorConfig,

    tick_period: Duration,

    events: broadcast::Sender<SessionEvent>,
}

impl AttendanceService {
    /// Create a service using the system clock and a PRNG seeded per config
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_parts(
            config,
            Box::new(ScanSimulator::new(config)),
            Arc::new(SystemTimeProvider),
        )
    }

    /// Create a service with injected randomness and clock
    pub fn with_parts(
        config: SimulatorConfig,
        source: Box<dyn ScanSource>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            source: Arc::new(Mutex::new(source)),
            time_provider,
            config,
            tick_period: Duration::from_secs(1),
            events,
        }
    }

    /// Override the one-second tick period
    #[must_use]
    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    /// Receive session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Start a fresh session for a class, replacing any existing one
    pub async fn start(
        &self,
        class: &ClassRecord,
        mode: DistributionMode,
    ) -> Result<SessionState, AttendanceServiceError> {
        if !class.is_active() {
            return Err(AttendanceServiceError::ClassInactive(class.id.clone()));
        }

        let now = self.time_provider.now_utc();
        let suffix = self.source.lock().await.session_suffix();
        let session_id = AttendanceSession::make_session_id(now, &suffix);

        let mut session = AttendanceSession::new(
            session_id.clone(),
            class,
            mode,
            self.config.duration_seconds,
            now,
        )
        .with_broadcast_reach(self.config.broadcast_reach_percent);
        session.begin()?;
        session.validate()?;

        let state = SessionState::from(&session);

        let mut slots = self.slots.write().await;
        if let Some(mut previous) = slots.remove(&class.id) {
            previous.stop_ticker();
            if previous.session.is_counting() {
                logging::log_session_cancelled(&previous.session.session_id, &class.id, "replaced");
                let _ = self.events.send(SessionEvent::Cancelled {
                    class_id: class.id.clone(),
                    session_id: previous.session.session_id,
                });
            }
        }

        let ticker = self.spawn_ticker(class.id.clone(), session_id.clone());
        slots.insert(
            class.id.clone(),
            SessionSlot {
                session,
                ticker: Some(ticker),
            },
        );
        drop(slots);

        logging::log_session_started(
            &session_id,
            &class.id,
            mode,
            self.config.duration_seconds,
            class.students,
        );
        let _ = self.events.send(SessionEvent::Started {
            class_id: class.id.clone(),
            session_id,
        });

        Ok(state)
    }

    /// Advance the class's session by one second.
    ///
    /// The ticker calls this on its own; it is public for callers that drive
    /// the countdown by hand. A finalized session is returned unchanged.
    pub async fn tick(&self, class_id: &str) -> Result<SessionState, AttendanceServiceError> {
        let session_id = self
            .slots
            .read()
            .await
            .get(class_id)
            .map(|slot| slot.session.session_id.clone())
            .ok_or_else(|| AttendanceServiceError::NoSession(class_id.to_string()))?;

        self.advance_slot(class_id, &session_id).await;

        self.get(class_id)
            .await
            .ok_or_else(|| AttendanceServiceError::NoSession(class_id.to_string()))
    }

    /// Current state of the class's session
    pub async fn get(&self, class_id: &str) -> Option<SessionState> {
        let slots = self.slots.read().await;
        slots.get(class_id).map(|slot| SessionState::from(&slot.session))
    }

    /// Final tally, once the session has finished
    pub async fn result(&self, class_id: &str) -> Option<AttendanceResult> {
        let slots = self.slots.read().await;
        slots.get(class_id).and_then(|slot| slot.session.result.clone())
    }

    /// QR data for the class's session
    pub async fn qr_payload(&self, class_id: &str) -> Option<QrPayload> {
        let slots = self.slots.read().await;
        slots.get(class_id).map(|slot| slot.session.qr_payload())
    }

    /// States of every session still counting down
    pub async fn active_sessions(&self) -> Vec<SessionState> {
        let slots = self.slots.read().await;
        let mut active: Vec<SessionState> = slots
            .values()
            .filter(|slot| slot.session.is_counting())
            .map(|slot| SessionState::from(&slot.session))
            .collect();
        active.sort_by(|a, b| a.class_id.cmp(&b.class_id));
        active
    }

    /// Whether a ticker task is attached to the class's slot
    pub async fn has_ticker(&self, class_id: &str) -> bool {
        let slots = self.slots.read().await;
        slots
            .get(class_id)
            .and_then(|slot| slot.ticker.as_ref())
            .is_some_and(|ticker| !ticker.is_finished())
    }

    /// Stop the ticker and discard the class's session
    pub async fn cancel(&self, class_id: &str) -> Result<SessionState, AttendanceServiceError> {
        let mut slot = self
            .slots
            .write()
            .await
            .remove(class_id)
            .ok_or_else(|| AttendanceServiceError::NoSession(class_id.to_string()))?;

        slot.stop_ticker();
        logging::log_session_cancelled(&slot.session.session_id, class_id, "closed");
        let _ = self.events.send(SessionEvent::Cancelled {
            class_id: class_id.to_string(),
            session_id: slot.session.session_id.clone(),
        });

        Ok(SessionState::from(&slot.session))
    }

    /// Abort every ticker, leaving sessions readable
    pub async fn shutdown(&self) {
        let mut slots = self.slots.write().await;
        for slot in slots.values_mut() {
            slot.stop_ticker();
        }
    }

    fn spawn_ticker(&self, class_id: String, session_id: String) -> JoinHandle<()> {
        let service = self.clone();
        let period = self.tick_period;
        let span = attendance_span!("ticker", session_id);
        span.record("class_id", class_id.as_str());

        tokio::spawn(
            async move {
                let mut interval = interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    interval.tick().await;
                    if !service.advance_slot(&class_id, &session_id).await {
                        break;
                    }
                }
            }
            .instrument(span),
        )
    }

    /// One step for `session_id` in the class's slot. Returns whether the
    /// session is still counting afterwards.
    async fn advance_slot(&self, class_id: &str, session_id: &str) -> bool {
        let now = self.time_provider.now_utc();
        let mut slots = self.slots.write().await;

        let Some(slot) = slots.get_mut(class_id) else {
            return false;
        };

        // A stale ticker must never touch a newer session
        if slot.session.session_id != session_id {
            return false;
        }

        let outcome = {
            let mut source = self.source.lock().await;
            tick_session(&mut slot.session, source.as_mut(), now)
        };

        if let Some(result) = outcome {
            // Detach rather than abort: this may be the ticker itself
            slot.ticker = None;
            logging::log_session_finalized(&result);
            let _ = self.events.send(SessionEvent::Finalized(result));
            return false;
        }

        if !slot.session.is_counting() {
            return false;
        }

        logging::log_session_tick(
            session_id,
            slot.session.remaining_seconds,
            slot.session.scanned_count,
        );
        let _ = self.events.send(SessionEvent::Ticked {
            class_id: class_id.to_string(),
            session_id: session_id.to_string(),
            remaining_seconds: slot.session.remaining_seconds,
            scanned_count: slot.session.scanned_count,
        });

        true
    }
}

/// Attendance service errors
#[derive(Debug, thiserror::Error)]
pub enum AttendanceServiceError {
    #[error("Class {0} is not active")]
    ClassInactive(String),

    #[error("No attendance session for class {0}")]
    NoSession(String),

    #[error("Attendance session error: {0}")]
    Session(#[from] AttendanceSessionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::class_record::{default_classes, ClassStatus};

    fn service() -> AttendanceService {
        let config = SimulatorConfig {
            seed: Some(5),
            ..SimulatorConfig::default()
        };
        AttendanceService::new(config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_creates_counting_session() {
        let service = service();
        let class = &default_classes()[0];

        let state = service.start(class, DistributionMode::Projector).await.unwrap();
        assert_eq!(state.phase, SessionPhase::Counting);
        assert_eq!(state.remaining_seconds, 10);
        assert_eq!(state.scanned_count, 0);
        assert!(state.session_id.starts_with("SESSION_"));
        assert_eq!(state.short_id.len(), 8);
        assert!(service.has_ticker("cs101").await);
    }

    #[tokio::test]
    async fn test_inactive_class_rejected() {
        let service = service();
        let mut class = default_classes().remove(1);
        class.status = ClassStatus::Inactive;

        let result = service.start(&class, DistributionMode::Projector).await;
        assert!(matches!(result, Err(AttendanceServiceError::ClassInactive(_))));
        assert!(service.get("ds201").await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_without_session() {
        let service = service();
        assert!(matches!(
            service.cancel("cs101").await,
            Err(AttendanceServiceError::NoSession(_))
        ));
        assert!(matches!(
            service.tick("cs101").await,
            Err(AttendanceServiceError::NoSession(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_tickers() {
        let service = service();
        let class = &default_classes()[2];
        service.start(class, DistributionMode::Broadcast).await.unwrap();

        service.shutdown().await;
        assert!(!service.has_ticker("alg301").await);
        assert!(service.get("alg301").await.is_some());
    }
}
