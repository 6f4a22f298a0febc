//! Integration tests for fluxrig-types.

use fluxrig_types::{FluxrigError, LabelKind, LabelScheme, MagnetId, PhaseId};

// ─── ID Tests ──────────────────────────────────────────────────

#[test]
fn phase_id_rejects_zero() {
    assert!(PhaseId::new(0).is_err());
    let p = PhaseId::new(3).unwrap();
    assert_eq!(p.number(), 3);
    assert_eq!(p.index(), 2);
}

#[test]
fn phase_range_is_one_based() {
    let numbers: Vec<u32> = PhaseId::range(3).map(PhaseId::number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(PhaseId::range(0).count(), 0);
}

#[test]
fn phase_id_deserialization_validates() {
    let ok: PhaseId = serde_json::from_str("2").unwrap();
    assert_eq!(ok.number(), 2);
    assert!(serde_json::from_str::<PhaseId>("0").is_err());
}

#[test]
fn magnet_id_from_index() {
    assert_eq!(MagnetId::from_index(0), MagnetId(1));
    assert_eq!(MagnetId(4).index(), 3);
}

// ─── Label Tests ───────────────────────────────────────────────

#[test]
fn latin_label_names() {
    let labels = LabelScheme::latin();
    let p = PhaseId::new(2).unwrap();
    assert_eq!(labels.phase_plus(p), "PHASE_2+");
    assert_eq!(labels.phase_minus(p), "PHASE_2-");
    assert_eq!(labels.magnet(MagnetId(7)), "MAGNET_7");
}

#[test]
fn cyrillic_label_names() {
    let labels = LabelScheme::cyrillic();
    let p = PhaseId::new(1).unwrap();
    assert_eq!(labels.phase_minus(p), "ФАЗА_1-");
    assert_eq!(labels.magnet(MagnetId(1)), "МАГНИТ_1");
    assert_eq!(labels.airgap_edge, "КОНТУР");
}

#[test]
fn parse_magnet_label() {
    let labels = LabelScheme::latin();
    assert_eq!(labels.parse_magnet("MAGNET_12"), Some(MagnetId(12)));
    assert_eq!(labels.parse_magnet("MAGNET_0"), None);
    assert_eq!(labels.parse_magnet("PHASE_1+"), None);
    assert_eq!(labels.parse_magnet("MAGNET_x"), None);
}

#[test]
fn parse_magnet_rejects_non_canonical_digits() {
    let labels = LabelScheme::latin();
    assert_eq!(labels.parse_magnet("MAGNET_01"), None);
    assert_eq!(labels.parse_magnet("MAGNET_+3"), None);
    assert_eq!(labels.parse_magnet("MAGNET_007"), None);
    for n in [1, 9, 10, 256] {
        let id = MagnetId(n);
        assert_eq!(labels.parse_magnet(&labels.magnet(id)), Some(id));
    }
}

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn recoverable_classification() {
    assert!(FluxrigError::ConnectionLost("rpc".into()).is_recoverable());
    assert!(FluxrigError::Automation("bad call".into()).is_recoverable());
    assert!(FluxrigError::missing_block("PHASE_1+").is_recoverable());
    assert!(FluxrigError::SolveTimeout { seconds: 1.0 }.is_recoverable());
    assert!(!FluxrigError::PreconditionViolated("x".into()).is_recoverable());
    assert!(!FluxrigError::InvalidConfig("x".into()).is_recoverable());
}

#[test]
fn label_miss_matches_kind() {
    let err = FluxrigError::missing_block("MAGNET_3");
    assert!(err.is_label_miss(LabelKind::Block));
    assert!(!err.is_label_miss(LabelKind::Edge));
    assert!(err.to_string().contains("MAGNET_3"));
}

#[test]
fn retries_exhausted_display() {
    let err = FluxrigError::RetriesExhausted {
        operation: "torque".into(),
        attempts: 4,
        last: Box::new(FluxrigError::ConnectionLost("engine gone".into())),
    };
    let msg = err.to_string();
    assert!(msg.contains("torque"));
    assert!(msg.contains('4'));
    assert!(msg.contains("engine gone"));
    assert!(!err.is_recoverable());
}
