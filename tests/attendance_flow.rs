//! Attendance session lifecycle tests
//!
//! Ticker-driven tests run on tokio's paused clock so every second is exact.

use std::sync::Arc;
use std::time::Duration;

use eduerp_attendance::models::attendance_session::{DistributionMode, SessionPhase};
use eduerp_attendance::models::class_record::{default_classes, ClassRecord};
use eduerp_attendance::services::{
    AttendanceService, MockTimeProvider, ScanSimulator, ScanSource, SessionEvent, SimulatorConfig,
};
use tokio::sync::broadcast::error::TryRecvError;

/// Always scans the same number per tick and reports a fixed present count
struct FixedScanSource {
    per_tick: u32,
    present: u32,
    next_suffix: u32,
}

impl ScanSource for FixedScanSource {
    fn scan_increment(&mut self) -> u32 {
        self.per_tick
    }

    fn present_count(&mut self, total: u32) -> u32 {
        self.present.min(total)
    }

    fn session_suffix(&mut self) -> String {
        self.next_suffix += 1;
        format!("fixed{:04}", self.next_suffix)
    }
}

fn seeded_service(seed: u64) -> AttendanceService {
    AttendanceService::new(SimulatorConfig {
        seed: Some(seed),
        ..SimulatorConfig::default()
    })
}

/// Service whose ticker never fires during a test, for driving ticks by hand
fn manual_service(source: Box<dyn ScanSource>) -> AttendanceService {
    let clock = MockTimeProvider::at(2024, 1, 24, 10, 0, 0).unwrap();
    AttendanceService::with_parts(SimulatorConfig::default(), source, Arc::new(clock))
        .with_tick_period(Duration::from_secs(24 * 3600))
}

fn cs101() -> ClassRecord {
    default_classes().remove(0)
}

fn drain(events: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => seen.push(event),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            Err(TryRecvError::Lagged(_)) => continue,
        }
    }
    seen
}

#[tokio::test(start_paused = true)]
async fn test_session_finalizes_after_ten_seconds() {
    let service = seeded_service(1);
    let mut events = service.subscribe();

    service.start(&cs101(), DistributionMode::Projector).await.unwrap();

    tokio::time::sleep(Duration::from_millis(9_500)).await;
    let state = service.get("cs101").await.unwrap();
    assert_eq!(state.remaining_seconds, 1);
    assert_eq!(state.phase, SessionPhase::Counting);
    assert!(!state.finalized);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let state = service.get("cs101").await.unwrap();
    assert!(state.finalized);
    assert_eq!(state.remaining_seconds, 0);
    assert!(!service.has_ticker("cs101").await);

    let result = state.result.clone().expect("finalized session has a result");
    assert!((35..=44).contains(&result.present));
    assert_eq!(result.absent, 45 - result.present);
    assert!((result.rate - f64::from(result.present) / 45.0).abs() < f64::EPSILON);
    assert_eq!(service.result("cs101").await, Some(result.clone()));

    // Nothing moves after expiry
    tokio::time::sleep(Duration::from_secs(30)).await;
    let later = service.get("cs101").await.unwrap();
    assert_eq!(later.scanned_count, state.scanned_count);
    assert_eq!(later.result, Some(result));

    let seen = drain(&mut events);
    assert!(matches!(seen.first(), Some(SessionEvent::Started { .. })));
    assert!(matches!(seen.last(), Some(SessionEvent::Finalized(_))));
    let ticks = seen
        .iter()
        .filter(|event| matches!(event, SessionEvent::Ticked { .. }))
        .count();
    assert_eq!(ticks, 9);
}

#[tokio::test(start_paused = true)]
async fn test_scanned_count_never_decreases() {
    let service = seeded_service(17);
    let mut events = service.subscribe();

    service.start(&cs101(), DistributionMode::Projector).await.unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;

    let mut last = 0;
    for event in drain(&mut events) {
        if let SessionEvent::Ticked { scanned_count, .. } = event {
            assert!(scanned_count >= last);
            assert!(scanned_count <= 45);
            last = scanned_count;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_restart_replaces_timer() {
    let service = seeded_service(2);
    let mut events = service.subscribe();

    let first = service.start(&cs101(), DistributionMode::Projector).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(service.get("cs101").await.unwrap().remaining_seconds, 7);

    let second = service.start(&cs101(), DistributionMode::Projector).await.unwrap();
    assert_ne!(first.session_id, second.session_id);
    assert_eq!(second.remaining_seconds, 10);
    assert_eq!(second.scanned_count, 0);

    // Only one ticker: five seconds take exactly five seconds off
    tokio::time::sleep(Duration::from_millis(5_500)).await;
    let state = service.get("cs101").await.unwrap();
    assert_eq!(state.session_id, second.session_id);
    assert_eq!(state.remaining_seconds, 5);

    tokio::time::sleep(Duration::from_secs(5)).await;
    let result = service.result("cs101").await.expect("second session finished");
    assert_eq!(result.session_id, second.session_id);

    let seen = drain(&mut events);
    assert!(seen.iter().any(|event| matches!(
        event,
        SessionEvent::Cancelled { session_id, .. } if *session_id == first.session_id
    )));
    assert!(!seen.iter().any(|event| matches!(
        event,
        SessionEvent::Ticked { session_id, remaining_seconds, .. }
            if *session_id == first.session_id && *remaining_seconds < 7
    )));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_timer() {
    let service = seeded_service(3);
    service.start(&cs101(), DistributionMode::Broadcast).await.unwrap();

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    let cancelled = service.cancel("cs101").await.unwrap();
    assert_eq!(cancelled.remaining_seconds, 8);
    assert!(!service.has_ticker("cs101").await);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(service.get("cs101").await.is_none());
    assert!(service.active_sessions().await.is_empty());

    let fresh = service.start(&cs101(), DistributionMode::Projector).await.unwrap();
    assert_eq!(fresh.remaining_seconds, 10);
}

#[tokio::test(start_paused = true)]
async fn test_sessions_for_different_classes_run_side_by_side() {
    let service = seeded_service(4);
    let classes = default_classes();

    service.start(&classes[0], DistributionMode::Projector).await.unwrap();
    tokio::time::sleep(Duration::from_secs(4)).await;
    service.start(&classes[1], DistributionMode::Broadcast).await.unwrap();

    assert_eq!(service.active_sessions().await.len(), 2);

    tokio::time::sleep(Duration::from_millis(6_500)).await;
    assert!(service.get("cs101").await.unwrap().finalized);
    let ds201 = service.get("ds201").await.unwrap();
    assert_eq!(ds201.remaining_seconds, 4);
    assert_eq!(ds201.connected_students, 30);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(service.active_sessions().await.is_empty());
}

#[tokio::test]
async fn test_manual_ticks_with_fixed_source() {
    let service = manual_service(Box::new(FixedScanSource {
        per_tick: 2,
        present: 40,
        next_suffix: 0,
    }));

    let state = service.start(&cs101(), DistributionMode::Projector).await.unwrap();
    assert_eq!(state.session_id, "SESSION_1706090400000_fixed0001");
    assert_eq!(state.short_id, "ixed0001");

    for second in 1..=9 {
        let state = service.tick("cs101").await.unwrap();
        assert_eq!(state.remaining_seconds, 10 - second);
        assert_eq!(state.scanned_count, 2 * second);
    }

    let done = service.tick("cs101").await.unwrap();
    assert!(done.finalized);
    let result = done.result.unwrap();
    assert_eq!(result.present, 40);
    assert_eq!(result.absent, 5);
    assert_eq!(result.scanned_count, 20);

    let after = service.tick("cs101").await.unwrap();
    assert_eq!(after.scanned_count, 20);
    assert_eq!(after.result.unwrap(), result);
}

#[tokio::test]
async fn test_scans_capped_at_enrollment() {
    let service = manual_service(Box::new(FixedScanSource {
        per_tick: 2,
        present: 40,
        next_suffix: 0,
    }));
    let tiny = ClassRecord {
        id: "sem900".to_string(),
        subject: "Graduate Seminar".to_string(),
        code: "SEM900".to_string(),
        students: 5,
        ..cs101()
    };

    service.start(&tiny, DistributionMode::Projector).await.unwrap();
    let mut state = None;
    for _ in 0..10 {
        state = Some(service.tick("sem900").await.unwrap());
    }

    let state = state.unwrap();
    assert_eq!(state.scanned_count, 5);
    let result = state.result.unwrap();
    assert_eq!(result.present, 5);
    assert_eq!(result.absent, 0);
    assert_eq!(result.rate, 1.0);
}

#[tokio::test]
async fn test_tally_always_balances() {
    for seed in 0..25 {
        let config = SimulatorConfig::default();
        let service = manual_service(Box::new(ScanSimulator::seeded(config, seed)));

        for class in default_classes() {
            service.start(&class, DistributionMode::Projector).await.unwrap();
            for _ in 0..10 {
                service.tick(&class.id).await.unwrap();
            }

            let result = service.result(&class.id).await.unwrap();
            assert_eq!(result.present + result.absent, class.students, "seed {seed}");
            assert!(result.present <= 44);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_broadcast_to_huge_roster_finalizes() {
    let service = seeded_service(5);
    let lecture = ClassRecord {
        id: "mooc100".to_string(),
        subject: "Open Lecture".to_string(),
        code: "MOOC100".to_string(),
        students: 60_000_000,
        ..cs101()
    };

    service.start(&lecture, DistributionMode::Broadcast).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10_500)).await;

    let state = service.get("mooc100").await.unwrap();
    assert!(state.finalized);
    assert_eq!(state.connected_students, 48_000_000);

    let result = service.result("mooc100").await.expect("broadcast session finished");
    assert_eq!(result.present + result.absent, 60_000_000);
    assert!(!service.has_ticker("mooc100").await);
}
