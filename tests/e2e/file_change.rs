//! E2E tests for external file changes: suppression, debounce and prompts

use crate::common::harness::{ReadOnlyPathsFs, RecordingElevatedWriter, SessionHarness};
use jellypie::app::{ReloadResponse, RemovedResponse};
use jellypie::services::async_bridge::{AsyncMessage, FileEventKind};
use jellypie::services::reconciler::{ChangeKind, EventDecision, ReconcileState};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEBOUNCE: Duration = Duration::from_millis(300);

#[test]
fn test_event_soon_after_own_save_is_suppressed() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("notes.txt", "a\n");
    let key = harness.open_new(&path);
    assert!(harness.save(key));
    let saved = Instant::now();

    let early = harness.session.handle_file_event_at(
        &path,
        FileEventKind::Changed,
        saved + Duration::from_millis(500),
    );
    assert_eq!(early, Some(EventDecision::Suppressed));
    assert_eq!(harness.session.reconciler().state(key), ReconcileState::Idle);

    let late = harness.session.handle_file_event_at(
        &path,
        FileEventKind::Changed,
        saved + Duration::from_millis(2000),
    );
    assert_eq!(late, Some(EventDecision::Scheduled));
    assert_eq!(
        harness.session.reconciler().state(key),
        ReconcileState::EventPending
    );
}

#[test]
fn test_one_timer_per_tab() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("notes.txt", "a\n");
    harness.open_new(&path);
    let now = Instant::now();

    let first = harness
        .session
        .handle_file_event_at(&path, FileEventKind::Changed, now);
    let second = harness.session.handle_file_event_at(
        &path,
        FileEventKind::Renamed,
        now + Duration::from_millis(100),
    );

    assert_eq!(first, Some(EventDecision::Scheduled));
    assert_eq!(second, Some(EventDecision::AlreadyPending));
    assert_eq!(harness.session.next_deadline(), Some(now + DEBOUNCE));
}

#[test]
fn test_changed_file_reloads_on_confirmation() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("notes.txt", "old\n");
    let key = harness.open_new(&path);
    harness.type_text("local edit ");
    std::fs::write(&path, "new from disk\n").unwrap();
    harness.dialogs.reload_answers.push_back(ReloadResponse::Reload);

    let now = Instant::now();
    harness
        .session
        .handle_file_event_at(&path, FileEventKind::Changed, now);

    harness.pump_at(now + Duration::from_millis(100));
    assert!(harness.dialogs.reload_prompts.is_empty(), "still debouncing");

    harness.pump_at(now + DEBOUNCE);
    assert_eq!(harness.dialogs.reload_prompts, vec!["notes.txt"]);
    assert_eq!(harness.text(key), "new from disk\n");
    assert!(!harness.session.tab(key).unwrap().is_modified());
    assert_eq!(harness.session.reconciler().state(key), ReconcileState::Idle);
}

#[test]
fn test_cancelled_reload_keeps_buffer() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("notes.txt", "old\n");
    let key = harness.open_new(&path);
    std::fs::write(&path, "new\n").unwrap();
    harness.dialogs.reload_answers.push_back(ReloadResponse::Cancel);

    let now = Instant::now();
    harness
        .session
        .handle_file_event_at(&path, FileEventKind::Changed, now);
    harness.pump_at(now + DEBOUNCE);

    assert_eq!(harness.dialogs.reload_prompts.len(), 1);
    assert_eq!(harness.text(key), "old\n");

    // A later event starts a fresh timer
    let later = now + Duration::from_secs(1);
    assert_eq!(
        harness
            .session
            .handle_file_event_at(&path, FileEventKind::Changed, later),
        Some(EventDecision::Scheduled)
    );
}

#[test]
fn test_removed_file_offers_save_as() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("gone.todo", "keep me\n");
    let key = harness.open_new(&path);
    std::fs::remove_file(&path).unwrap();
    harness.dialogs.removed_answers.push_back(RemovedResponse::SaveAs);
    harness
        .dialogs
        .save_paths
        .push_back(Some(harness.dir().join("gone.todo")));

    let now = Instant::now();
    harness
        .session
        .handle_file_event_at(&path, FileEventKind::Deleted, now);
    harness.pump_at(now + DEBOUNCE);

    assert_eq!(harness.dialogs.removed_prompts, vec!["gone.todo"]);
    assert_eq!(harness.dialogs.save_suggestions, vec!["gone.todo"]);
    assert!(harness.dialogs.reload_prompts.is_empty());
    assert_eq!(harness.read_file("gone.todo"), "keep me\n");
    assert!(!harness.session.tab(key).unwrap().is_modified());
}

#[test]
fn test_background_tab_prompt_waits_until_activated() {
    let mut harness = SessionHarness::new().unwrap();
    let a = harness.write_file("a.txt", "a\n");
    let b = harness.write_file("b.txt", "b\n");
    let key_a = harness.open_new(&a);
    harness.open_new(&b);
    std::fs::write(&a, "a changed\n").unwrap();
    harness.dialogs.reload_answers.push_back(ReloadResponse::Reload);

    let now = Instant::now();
    harness
        .session
        .handle_file_event_at(&a, FileEventKind::Changed, now);
    harness.pump_at(now + DEBOUNCE);

    assert!(harness.dialogs.reload_prompts.is_empty());
    assert_eq!(
        harness.session.reconciler().pending_reload(key_a),
        Some(ChangeKind::Changed)
    );

    harness
        .session
        .switch_active_tab(key_a, &mut harness.dialogs);

    assert_eq!(harness.dialogs.reload_prompts, vec!["a.txt"]);
    assert_eq!(harness.text(key_a), "a changed\n");
    assert_eq!(harness.session.reconciler().pending_reload(key_a), None);
}

#[test]
fn test_background_removal_is_classified_when_timer_fires() {
    let mut harness = SessionHarness::new().unwrap();
    let a = harness.write_file("a.txt", "a\n");
    let b = harness.write_file("b.txt", "b\n");
    let key_a = harness.open_new(&a);
    harness.open_new(&b);

    let now = Instant::now();
    harness
        .session
        .handle_file_event_at(&a, FileEventKind::Changed, now);
    std::fs::remove_file(&a).unwrap();
    harness.pump_at(now + DEBOUNCE);

    assert_eq!(
        harness.session.reconciler().pending_reload(key_a),
        Some(ChangeKind::Removed)
    );
}

#[test]
fn test_events_for_unknown_or_closed_paths_are_ignored() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("a.txt", "a\n");
    let key = harness.open_new(&path);
    let stranger = harness.write_file("other.txt", "x\n");
    let now = Instant::now();

    assert_eq!(
        harness
            .session
            .handle_file_event_at(&stranger, FileEventKind::Changed, now),
        None
    );

    harness.session.close_tab(key, &mut harness.dialogs);
    assert_eq!(
        harness
            .session
            .handle_file_event_at(&path, FileEventKind::Changed, now),
        None
    );
}

#[test]
fn test_closing_tab_drops_pending_timer() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("a.txt", "a\n");
    let key = harness.open_new(&path);
    let now = Instant::now();
    harness
        .session
        .handle_file_event_at(&path, FileEventKind::Changed, now);

    harness.session.close_tab(key, &mut harness.dialogs);
    harness.pump_at(now + DEBOUNCE);

    assert!(harness.dialogs.reload_prompts.is_empty());
    assert_eq!(harness.session.next_deadline(), None);
}

#[test]
fn test_watcher_messages_go_through_the_main_loop() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("a.txt", "a\n");
    let key = harness.open_new(&path);
    std::fs::write(&path, "b\n").unwrap();
    harness.dialogs.reload_answers.push_back(ReloadResponse::Reload);

    harness
        .session
        .async_sender()
        .send(AsyncMessage::FileEvent {
            path: path.clone(),
            kind: FileEventKind::Changed,
            observed_at: Instant::now(),
        })
        .unwrap();
    harness.pump();
    assert_eq!(
        harness.session.reconciler().state(key),
        ReconcileState::EventPending
    );

    harness.pump_at(Instant::now() + DEBOUNCE);
    assert_eq!(harness.text(key), "b\n");
}

#[test]
fn test_queued_event_uses_observation_time() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("n.txt", "a\n");
    let key = harness.open_new(&path);
    assert!(harness.save(key));
    let saved = Instant::now();

    // Seen right after our own save, but drained much later
    harness
        .session
        .async_sender()
        .send(AsyncMessage::FileEvent {
            path: path.clone(),
            kind: FileEventKind::Changed,
            observed_at: saved,
        })
        .unwrap();
    harness.pump_at(saved + Duration::from_millis(2000));
    harness.pump_at(saved + Duration::from_millis(4000));

    assert!(harness.dialogs.reload_prompts.is_empty());
    assert_eq!(harness.session.reconciler().state(key), ReconcileState::Idle);
}

#[test]
fn test_debounce_runs_from_observation_time() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("n.txt", "a\n");
    let key = harness.open_new(&path);
    std::fs::write(&path, "b\n").unwrap();
    harness.dialogs.reload_answers.push_back(ReloadResponse::Reload);
    let observed = Instant::now();

    harness
        .session
        .async_sender()
        .send(AsyncMessage::FileEvent {
            path: path.clone(),
            kind: FileEventKind::Changed,
            observed_at: observed,
        })
        .unwrap();
    // Drained after the debounce already elapsed: the timer fires in the same pass
    harness.pump_at(observed + DEBOUNCE);

    assert_eq!(harness.dialogs.reload_prompts, vec!["n.txt"]);
    assert_eq!(harness.text(key), "b\n");
}

#[test]
fn test_removed_admin_file_suggests_plain_file_name() {
    let harness = SessionHarness::new().unwrap();
    let path = harness.write_file("hosts", "127.0.0.1\n");
    let fs = ReadOnlyPathsFs {
        denied: vec![path.clone()],
    };
    let mut harness = harness
        .with_filesystem(Arc::new(fs))
        .with_elevated_writer(Box::new(RecordingElevatedWriter::default()));
    let key = harness.open_new(&path);
    assert!(harness.save(key));
    assert_eq!(harness.label(key), "hosts [Admin]");

    std::fs::remove_file(&path).unwrap();
    harness.dialogs.removed_answers.push_back(RemovedResponse::SaveAs);
    let now = Instant::now() + Duration::from_secs(5);
    harness
        .session
        .handle_file_event_at(&path, FileEventKind::Deleted, now);
    harness.pump_at(now + DEBOUNCE);

    assert_eq!(harness.dialogs.removed_prompts, vec!["hosts [Admin]"]);
    assert_eq!(harness.dialogs.save_suggestions, vec!["hosts"]);
}

/// Pump in real time until `done` holds or two seconds pass
fn pump_until(harness: &mut SessionHarness, done: impl Fn(&SessionHarness) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        harness.pump();
        if done(harness) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn test_os_watcher_reports_external_write() {
    let mut harness = SessionHarness::with_config(|config| config.watch_files = true).unwrap();
    let path = harness.write_file("w.txt", "before\n");
    let key = harness.open_new(&path);
    harness.dialogs.reload_answers.push_back(ReloadResponse::Reload);

    std::fs::write(&path, "external\n").unwrap();

    assert!(pump_until(&mut harness, |h| !h.dialogs.reload_prompts.is_empty()));
    assert_eq!(harness.dialogs.reload_prompts, vec!["w.txt"]);
    assert_eq!(harness.text(key), "external\n");
}

#[test]
fn test_os_watcher_ignores_own_save() {
    let mut harness = SessionHarness::with_config(|config| config.watch_files = true).unwrap();
    let path = harness.write_file("w.txt", "before\n");
    let key = harness.open_new(&path);
    harness.type_text("mine ");

    assert!(harness.save(key));

    // Give the watcher time to deliver whatever the save produced
    let prompted = pump_until(&mut harness, |h| !h.dialogs.reload_prompts.is_empty());
    assert!(!prompted);
    assert_eq!(harness.session.reconciler().state(key), ReconcileState::Idle);
    assert_eq!(harness.read_file("w.txt"), "mine before\n");
}
