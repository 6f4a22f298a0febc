//! Integration tests for fluxrig-telemetry.

use std::fs;

use fluxrig_telemetry::bus::EventBus;
use fluxrig_telemetry::events::{EventKind, OrchestrationEvent};
use fluxrig_telemetry::sinks::{EventSink, LogFileSink, VecSink};

fn failure(message: &str) -> EventKind {
    EventKind::Failure {
        operation: "solve".into(),
        attempt: 1,
        message: message.into(),
        recoverable: true,
    }
}

// ─── Bus Tests ────────────────────────────────────────────────

#[test]
fn emit_and_flush() {
    let sink = VecSink::new();
    let mut bus = EventBus::new().with_sink(Box::new(sink.clone()));

    bus.record(EventKind::Separator);
    bus.record(EventKind::CallBegin {
        operation: "torque".into(),
        detail: String::new(),
    });
    assert!(sink.events().is_empty());

    bus.flush();
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].sequence, 0);
    assert_eq!(events[1].sequence, 1);
}

#[test]
fn disabled_bus_drops_events() {
    let sink = VecSink::new();
    let mut bus = EventBus::new().with_sink(Box::new(sink.clone()));
    bus.set_enabled(false);
    bus.record(EventKind::Separator);
    bus.flush();
    assert!(sink.events().is_empty());
}

#[test]
fn multiple_sinks() {
    let a = VecSink::new();
    let b = VecSink::new();
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(a.clone()));
    bus.add_sink(Box::new(b.clone()));
    assert_eq!(bus.sink_count(), 2);

    bus.record(failure("boom"));
    bus.shutdown();
    assert_eq!(a.failure_count(), 1);
    assert_eq!(b.failure_count(), 1);
}

// ─── Event Tests ──────────────────────────────────────────────

#[test]
fn failure_line_carries_tag() {
    let line = failure("engine gone").log_line();
    assert!(line.starts_with("Ошибка: "));
    assert!(line.contains("engine gone"));
    assert!(failure("x").is_failure());
}

#[test]
fn call_lines() {
    let bare = EventKind::CallBegin {
        operation: "solve".into(),
        detail: String::new(),
    };
    assert_eq!(bare.log_line(), "solve()");
    let with_args = EventKind::CallBegin {
        operation: "set_phase_current".into(),
        detail: "phase=1, current=5".into(),
    };
    assert_eq!(with_args.log_line(), "set_phase_current: phase=1, current=5");
    assert!(!with_args.is_failure());
}

#[test]
fn event_serialization() {
    let event = OrchestrationEvent::new(
        5,
        EventKind::Measurement {
            quantity: "torque".into(),
            value: 1.25,
        },
    );
    let json = serde_json::to_string(&event).unwrap();
    let recovered: OrchestrationEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered.sequence, 5);
    assert!(json.contains("Measurement"));
}

// ─── Log File Tests ───────────────────────────────────────────

#[test]
fn log_file_appends_timestamped_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.txt");
    fs::write(&path, "previous run\n").unwrap();

    let mut sink = LogFileSink::open(&path).unwrap();
    sink.handle(&OrchestrationEvent::new(0, EventKind::Separator));
    sink.handle(&OrchestrationEvent::new(1, failure("rpc down")));
    sink.finalize();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "previous run");
    for line in &lines[1..] {
        let (stamp, _) = line.split_at(8);
        let parts: Vec<&str> = stamp.split(':').collect();
        assert_eq!(parts.len(), 3, "bad timestamp in {line:?}");
        assert!(parts.iter().all(|p| p.len() == 2 && p.parse::<u8>().is_ok()));
        assert_eq!(&line[8..9], " ");
    }
    assert!(lines[2].contains("Ошибка: solve: rpc down"));
}
