use notewell_core::error::CoreError;
use notewell_core::models::session::SessionStatus;

#[test]
fn happy_path_is_allowed() {
    let path = [
        SessionStatus::Pending,
        SessionStatus::Transcribing,
        SessionStatus::Transcribed,
        SessionStatus::Mapping,
        SessionStatus::GapsDetected,
        SessionStatus::Completing,
        SessionStatus::Completed,
    ];
    for pair in path.windows(2) {
        assert!(
            pair[0].can_transition(pair[1]),
            "{} -> {} should be allowed",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn clean_detection_skips_gaps_detected() {
    assert!(SessionStatus::Mapping.can_transition(SessionStatus::Completing));
}

#[test]
fn redetection_can_reopen_a_completing_session() {
    assert!(SessionStatus::Completing.can_transition(SessionStatus::GapsDetected));
}

#[test]
fn terminal_states_never_move() {
    for from in [SessionStatus::Completed, SessionStatus::Failed] {
        assert!(from.is_terminal());
        assert!(from.valid_next_states().is_empty());
        for to in SessionStatus::ALL {
            assert!(!from.can_transition(to), "{from} -> {to} should be rejected");
        }
    }
}

#[test]
fn every_live_state_can_fail() {
    for from in SessionStatus::ALL.into_iter().filter(|s| !s.is_terminal()) {
        assert!(from.can_transition(SessionStatus::Failed));
    }
}

#[test]
fn skipping_ahead_is_rejected() {
    assert!(!SessionStatus::Pending.can_transition(SessionStatus::Mapping));
    assert!(!SessionStatus::Mapping.can_transition(SessionStatus::Completed));
    assert!(!SessionStatus::GapsDetected.can_transition(SessionStatus::Completed));
    assert!(!SessionStatus::GapsDetected.can_transition(SessionStatus::Mapping));
}

#[test]
fn transition_reports_both_ends() {
    let err = SessionStatus::GapsDetected
        .transition(SessionStatus::Completed)
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::InvalidTransition {
            from: SessionStatus::GapsDetected,
            to: SessionStatus::Completed,
        }
    ));
    assert_eq!(
        err.to_string(),
        "invalid session transition from gaps_detected to completed"
    );

    assert_eq!(
        SessionStatus::GapsDetected.transition(SessionStatus::Completing).unwrap(),
        SessionStatus::Completing
    );
}

#[test]
fn next_states_of_mapping() {
    assert_eq!(
        SessionStatus::Mapping.valid_next_states(),
        vec![
            SessionStatus::GapsDetected,
            SessionStatus::Completing,
            SessionStatus::Failed,
        ]
    );
}

#[test]
fn detection_is_accepted_only_after_mapping() {
    let accepting: Vec<_> = SessionStatus::ALL
        .into_iter()
        .filter(|s| s.accepts_detection())
        .collect();
    assert_eq!(
        accepting,
        vec![
            SessionStatus::Mapping,
            SessionStatus::GapsDetected,
            SessionStatus::Completing,
        ]
    );
}

#[test]
fn wire_names_are_snake_case() {
    let json = serde_json::to_string(&SessionStatus::GapsDetected).unwrap();
    assert_eq!(json, "\"gaps_detected\"");
    let parsed: SessionStatus = serde_json::from_str("\"completing\"").unwrap();
    assert_eq!(parsed, SessionStatus::Completing);
}
