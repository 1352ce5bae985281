//! Assembly session lifecycle tests.

use serde_json::{json, Value};

use gearforge_core::{BalanceRecord, MemoryCatalog, Part};

use crate::error::SessionError;
use crate::session::{AssemblySession, SessionState};
use crate::test_utils::{balance, part, StubCodec};

fn slot_rules() -> Value {
    json!({
        "pairs": {
            "p1": {"key": "barrel", "value": {"partcount": {"min": 1, "max": 2}}},
        }
    })
}

fn test_balance() -> BalanceRecord {
    balance(
        &["body", "grip", "barrel", "body_ele", "scope"],
        slot_rules(),
        json!([]),
    )
}

/// Body offers two parts, grip exactly one, barrel two, the element slot two
/// under the parent type, and scope none at all.
fn catalog() -> MemoryCatalog {
    MemoryCatalog::new().with_parts(vec![
        part(10, "body", "bor_sr", &["heavy"], &[], &[]),
        part(11, "body", "bor_sr", &[], &[], &["stray"]),
        part(20, "grip", "bor_sr", &[], &[], &[]),
        part(30, "barrel", "bor_sr", &["stray"], &[], &[]),
        part(31, "barrel", "bor_sr", &[], &[], &[]),
        part(40, "body_ele", "bor", &[], &[], &[]),
        part(41, "body_ele", "bor", &[], &[], &[]),
    ])
}

#[tokio::test]
async fn test_initialize_hides_empty_slots_and_auto_selects() {
    let catalog = catalog();
    let session = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(
        session.active_slots(),
        ["body", "grip", "barrel", "body_ele"]
    );
    // Sole grip candidate picked up front; nothing else pre-filled.
    assert_eq!(session.selections("grip").len(), 1);
    assert_eq!(session.selections("grip")[0].serial_index, 20);
    assert!(session.selections("body").is_empty());
    assert!(session.selections("scope").is_empty());
}

#[tokio::test]
async fn test_trial_session_never_auto_selects() {
    let catalog = catalog();
    let session = AssemblySession::trial(test_balance(), &catalog)
        .await
        .unwrap();
    assert!(session.selections("grip").is_empty());
}

#[tokio::test]
async fn test_initialize_fails_with_no_buildable_slots() {
    let catalog = MemoryCatalog::new();
    let err = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NoBuildableSlots(_)));
}

#[tokio::test]
async fn test_select_parts_replaces_whole_list() {
    let catalog = catalog();
    let mut session = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap();
    session.select_parts("body", &[10], &catalog).await.unwrap();
    session.select_parts("body", &[11], &catalog).await.unwrap();
    assert_eq!(session.selections("body").len(), 1);
    assert_eq!(session.selections("body")[0].serial_index, 11);
    session.select_parts("body", &[], &catalog).await.unwrap();
    assert!(session.selections("body").is_empty());
}

#[tokio::test]
async fn test_select_parts_rejects_over_max() {
    let catalog = catalog();
    let mut session = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap();
    // Barrel allows a pair, body only one.
    session
        .select_parts("barrel", &[30, 31], &catalog)
        .await
        .unwrap();
    let err = session
        .select_parts("body", &[10, 11], &catalog)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::TooManySelections { given: 2, max: 1, .. }
    ));
    assert!(session.selections("body").is_empty());
}

#[tokio::test]
async fn test_select_parts_unknown_slot_and_ids() {
    let catalog = catalog();
    let mut session = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap();
    assert!(matches!(
        session.select_parts("stock", &[1], &catalog).await,
        Err(SessionError::UnknownSlot(_))
    ));
    // Id 40 exists but under the parent type, not the body slot.
    let err = session
        .select_parts("body", &[40], &catalog)
        .await
        .unwrap_err();
    match err {
        SessionError::UnknownPartIds { slot, ids } => {
            assert_eq!(slot, "body");
            assert_eq!(ids, vec![40]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_slot_status_reflects_cross_slot_exclusions() {
    let catalog = catalog();
    let mut session = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap();
    session
        .select_parts("barrel", &[30], &catalog)
        .await
        .unwrap();
    // Barrel 30 adds "stray"; body 11 excludes it and locks.
    let statuses = session.slot_status("body", &catalog).await.unwrap();
    let by_id = |id: u32| statuses.iter().find(|s| s.part.serial_index == id).unwrap();
    assert!(by_id(10).is_valid());
    assert!(!by_id(11).is_valid());
}

#[tokio::test]
async fn test_parent_scoped_slot_status_strips_stats() {
    let catalog = MemoryCatalog::new().with_parts(vec![
        part(10, "body", "bor_sr", &[], &[], &[]),
        Part {
            stats: Some("+5% armor".to_string()),
            ..part(40, "body_ele", "bor", &[], &[], &[])
        },
    ]);
    let session = AssemblySession::trial(test_balance(), &catalog)
        .await
        .unwrap();
    let statuses = session.slot_status("body_ele", &catalog).await.unwrap();
    assert_eq!(statuses.len(), 1);
    assert!(statuses[0].part.stats.is_none());
}

#[tokio::test]
async fn test_advance_skips_forced_slots() {
    let catalog = catalog();
    let mut session = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap();
    assert_eq!(session.current_slot(), Some("body"));
    // Grip has one candidate only; the cursor jumps past it to barrel.
    let landed = session
        .advance_to_next_meaningful_slot(&catalog)
        .await
        .unwrap();
    assert_eq!(landed.as_deref(), Some("barrel"));
    assert_eq!(session.current_slot(), Some("barrel"));
    let landed = session
        .advance_to_next_meaningful_slot(&catalog)
        .await
        .unwrap();
    assert_eq!(landed.as_deref(), Some("body_ele"));
    let landed = session
        .advance_to_next_meaningful_slot(&catalog)
        .await
        .unwrap();
    assert_eq!(landed, None);
    assert_eq!(session.current_slot(), None);
}

#[tokio::test]
async fn test_advance_never_mutates_selections() {
    let catalog = catalog();
    let mut session = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap();
    session.select_parts("body", &[10], &catalog).await.unwrap();
    session
        .advance_to_next_meaningful_slot(&catalog)
        .await
        .unwrap();
    assert_eq!(session.selections("body")[0].serial_index, 10);
    assert_eq!(session.selections("grip")[0].serial_index, 20);
}

#[tokio::test]
async fn test_slot_placeholder_shows_cardinality() {
    let catalog = catalog();
    let session = AssemblySession::trial(test_balance(), &catalog)
        .await
        .unwrap();
    assert_eq!(
        session.slot_placeholder("barrel"),
        "Select barrel to add [1-2]"
    );
    assert_eq!(session.slot_placeholder("body"), "Select body to add [1-1]");
}

#[tokio::test]
async fn test_finalize_encodes_selections_in_slot_order() {
    let catalog = catalog();
    let mut session = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap();
    session.select_parts("body", &[10], &catalog).await.unwrap();
    session
        .select_parts("barrel", &[30], &catalog)
        .await
        .unwrap();
    session
        .select_parts("body_ele", &[40], &catalog)
        .await
        .unwrap();

    let (codec, encoded) = StubCodec::client("");
    let serial = session.finalize(&codec).await.unwrap();
    assert_eq!(serial, "@Ugtest");
    assert_eq!(session.state(), SessionState::Finalized);

    let sent = encoded.lock().unwrap();
    assert_eq!(sent.len(), 1);
    // Header is fixed apart from the random skin nonce; the token section
    // follows balance slot order with the element as a keyed group.
    assert!(sent[0].starts_with("41, 0, 1, 50| 2, "), "got: {}", sent[0]);
    assert!(sent[0].ends_with("||{10} {20} {30} {1:40}|"), "got: {}", sent[0]);
}

#[tokio::test]
async fn test_finalize_honors_level() {
    let catalog = catalog();
    let mut session = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap();
    session.set_level(7);
    let (codec, encoded) = StubCodec::client("");
    session.finalize(&codec).await.unwrap();
    assert!(encoded.lock().unwrap()[0].starts_with("41, 0, 1, 7|"));
}

#[tokio::test]
async fn test_set_level_clamps_to_range() {
    let catalog = catalog();
    let mut session = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap();
    session.set_level(0);
    let (codec, encoded) = StubCodec::client("");
    session.finalize(&codec).await.unwrap();
    assert!(encoded.lock().unwrap()[0].starts_with("41, 0, 1, 1|"));

    let mut session = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap();
    session.set_level(9999);
    let (codec, encoded) = StubCodec::client("");
    session.finalize(&codec).await.unwrap();
    assert!(encoded.lock().unwrap()[0].starts_with("41, 0, 1, 50|"));
}

#[tokio::test]
async fn test_terminal_states_freeze_the_session() {
    let catalog = catalog();
    let mut session = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap();
    session.cancel();
    assert_eq!(session.state(), SessionState::Cancelled);
    // Terminal states stick; a later timeout does not overwrite.
    session.time_out();
    assert_eq!(session.state(), SessionState::Cancelled);

    assert!(matches!(
        session.select_parts("body", &[10], &catalog).await,
        Err(SessionError::Closed)
    ));
    let (codec, encoded) = StubCodec::client("");
    assert!(matches!(
        session.finalize(&codec).await,
        Err(SessionError::Closed)
    ));
    assert!(encoded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_finalized_session_rejects_further_edits() {
    let catalog = catalog();
    let mut session = AssemblySession::initialize(test_balance(), &catalog)
        .await
        .unwrap();
    let (codec, _) = StubCodec::client("");
    session.finalize(&codec).await.unwrap();
    assert!(matches!(
        session.select_parts("body", &[10], &catalog).await,
        Err(SessionError::Closed)
    ));
}
