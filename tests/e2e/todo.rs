//! E2E tests for to-do editing: mark done and inline formatting

use crate::common::harness::SessionHarness;
use chrono::{NaiveDate, NaiveDateTime};

fn timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

#[test]
fn test_mark_done_single_item() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("notes.todo", "buy milk\n");
    let key = harness.open_new(&path);

    assert!(harness.session.mark_done_at(timestamp()));

    assert_eq!(harness.text(key), "✓ buy milk [2024-05-01 09:30]\n");
    assert!(harness.session.tab(key).unwrap().is_modified());
}

#[test]
fn test_mark_done_moves_line_to_end() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("notes.todo", "wash car\nbuy milk\nwalk dog\n");
    let key = harness.open_new(&path);
    harness.place_cursor("wash car\nbuy".len());

    assert!(harness.session.mark_done_at(timestamp()));

    assert_eq!(
        harness.text(key),
        "wash car\nwalk dog\n✓ buy milk [2024-05-01 09:30]\n"
    );
}

#[test]
fn test_mark_done_is_one_undo_step() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("notes.todo", "a\nb\nc\n");
    let key = harness.open_new(&path);
    harness.place_cursor(2);

    harness.session.mark_done_at(timestamp());
    let buffer = &mut harness.session.tab_mut(key).unwrap().buffer;
    assert!(buffer.undo());

    assert_eq!(buffer.text(), "a\nb\nc\n");
    assert!(!buffer.can_undo());
}

#[test]
fn test_mark_done_last_line_without_newline() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("notes.todo", "first\nlast");
    let key = harness.open_new(&path);
    harness.place_cursor("first\n".len());

    assert!(harness.session.mark_done_at(timestamp()));

    assert_eq!(harness.text(key), "first\n✓ last [2024-05-01 09:30]\n");
}

#[test]
fn test_mark_done_adds_separator_newline() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("notes.todo", "todo\ntail");
    let key = harness.open_new(&path);
    harness.place_cursor(0);

    assert!(harness.session.mark_done_at(timestamp()));

    assert_eq!(harness.text(key), "tail\n✓ todo [2024-05-01 09:30]\n");
}

#[test]
fn test_mark_done_skips_blank_lines() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("notes.todo", "a\n   \nb\n");
    let key = harness.open_new(&path);
    harness.place_cursor(3);

    assert!(!harness.session.mark_done_at(timestamp()));

    assert_eq!(harness.text(key), "a\n   \nb\n");
    assert!(!harness.session.tab(key).unwrap().is_modified());
}

#[test]
fn test_format_wraps_selection() {
    let mut harness = SessionHarness::new().unwrap();
    let key = harness.new_tab();
    harness.type_text("make it bold");
    harness.select(8, 12);

    assert!(harness.session.format_bold());

    assert_eq!(harness.text(key), "make it **bold**");
}

#[test]
fn test_format_without_selection_inserts_pair() {
    let mut harness = SessionHarness::new().unwrap();
    let key = harness.new_tab();
    harness.type_text("ab");
    harness.place_cursor(1);

    assert!(harness.session.format_italic());
    assert_eq!(harness.text(key), "a**b");
    assert_eq!(harness.session.tab(key).unwrap().buffer.cursor(), 2);

    harness.type_text("x");
    assert_eq!(harness.text(key), "a*x*b");
}

#[test]
fn test_format_monospace() {
    let mut harness = SessionHarness::new().unwrap();
    let key = harness.new_tab();
    harness.type_text("cargo");
    harness.select(0, 5);

    harness.session.format_monospace();

    assert_eq!(harness.text(key), "`cargo`");
}

#[test]
fn test_go_to_line() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("notes.todo", "one\ntwo\nthree\n");
    let key = harness.open_new(&path);

    assert_eq!(harness.session.show_goto_line().as_deref(), Some("1"));
    assert_eq!(harness.session.go_to_line("3"), Some(3));
    assert_eq!(harness.session.tab(key).unwrap().buffer.cursor(), 8);
    assert!(!harness.session.tab(key).unwrap().goto.visible);

    // Clamped to the last line (the empty one after the final newline)
    assert_eq!(harness.session.go_to_line("99"), Some(4));
    assert_eq!(harness.session.go_to_line("0"), Some(1));
    assert_eq!(harness.session.go_to_line("two"), None);
    assert_eq!(harness.session.tab(key).unwrap().buffer.cursor(), 0);
}

#[test]
fn test_goto_and_find_bars_are_exclusive() {
    let mut harness = SessionHarness::new().unwrap();
    let key = harness.new_tab();

    harness.session.show_find_bar();
    harness.session.show_goto_line();
    let tab = harness.session.tab(key).unwrap();
    assert!(tab.goto.visible);
    assert!(!tab.find_bar_visible);

    harness.session.show_find_bar();
    let tab = harness.session.tab(key).unwrap();
    assert!(!tab.goto.visible);
    assert!(tab.find_bar_visible);

    harness.session.escape();
    let tab = harness.session.tab(key).unwrap();
    assert!(!tab.goto.visible);
    assert!(!tab.find_bar_visible);
}
