//! E2E tests for typed input: auto-closed pairs, overwrite mode, bookmarks
//! and the status line

use crate::common::harness::SessionHarness;
use jellypie::input::commands::{Action, Dispatch};
use jellypie::input::keybindings::{parse_accelerator, Keymap};

#[test]
fn test_opening_bracket_inserts_pair() {
    let mut harness = SessionHarness::new().unwrap();
    let key = harness.new_tab();

    assert!(harness.session.type_text("("));
    assert_eq!(harness.text(key), "()");
    assert_eq!(harness.session.tab(key).unwrap().buffer.cursor(), 1);

    assert!(harness.session.type_text("x"));
    assert_eq!(harness.text(key), "(x)");

    let pairs = [
        ("\"", "\"\""),
        ("[", "[]"),
        ("`", "``"),
        ("{", "{}"),
        ("<", "<>"),
        ("'", "''"),
    ];
    for (open, expected) in pairs {
        let key = harness.new_tab();
        harness.session.type_text(open);
        assert_eq!(harness.text(key), expected);
    }
}

#[test]
fn test_pair_is_one_undo_step() {
    let mut harness = SessionHarness::new().unwrap();
    let key = harness.new_tab();
    harness.session.type_text("[");

    let buffer = &mut harness.session.tab_mut(key).unwrap().buffer;
    assert!(buffer.undo());
    assert_eq!(buffer.text(), "");
}

#[test]
fn test_typing_replaces_selection() {
    let mut harness = SessionHarness::new().unwrap();
    let key = harness.new_tab();
    harness.type_text("red car");
    harness.select(0, 3);

    harness.session.type_text("blue");

    assert_eq!(harness.text(key), "blue car");
    assert_eq!(harness.session.tab(key).unwrap().buffer.cursor(), 4);
}

#[test]
fn test_overwrite_mode_replaces_up_to_line_end() {
    let mut harness = SessionHarness::new().unwrap();
    let key = harness.new_tab();
    harness.type_text("abcdef\nxyz");
    harness.place_cursor(1);

    assert_eq!(harness.session.toggle_overwrite(), Some(true));
    harness.session.type_text("XY");
    assert_eq!(harness.text(key), "aXYdef\nxyz");
    assert_eq!(harness.session.tab(key).unwrap().buffer.cursor(), 3);

    // At the end of the line nothing is left to replace
    harness.place_cursor(6);
    harness.session.type_text("QR");
    assert_eq!(harness.text(key), "aXYdefQR\nxyz");

    assert_eq!(harness.session.toggle_overwrite(), Some(false));
    harness.place_cursor(0);
    harness.session.type_text("_");
    assert_eq!(harness.text(key), "_aXYdefQR\nxyz");
}

#[test]
fn test_overwrite_is_per_tab() {
    let mut harness = SessionHarness::new().unwrap();
    let first = harness.new_tab();
    harness.session.toggle_overwrite();
    let second = harness.new_tab();

    assert!(!harness.session.tab(second).unwrap().overwrite);
    assert!(harness.session.tab(first).unwrap().overwrite);
}

#[test]
fn test_status_line_reports_position_mode_and_type() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("notes.txt", "héllo\nworld\n");
    harness.open_new(&path);

    harness.place_cursor("hé".len());
    assert_eq!(
        harness.session.status_line().as_deref(),
        Some("1:3     INS     PLAIN")
    );

    harness.place_cursor("héllo\nwo".len());
    harness.session.toggle_overwrite();
    assert_eq!(
        harness.session.status_line().as_deref(),
        Some("2:3     OVR     PLAIN")
    );
}

#[test]
fn test_bookmarks_toggle_and_follow_edits() {
    let mut harness = SessionHarness::new().unwrap();
    let path = harness.write_file("list.todo", "one\ntwo\nthree\n");
    let key = harness.open_new(&path);

    assert_eq!(harness.session.toggle_bookmark(2), Some(true));
    harness.place_cursor("one\ntwo\nth".len());
    assert_eq!(
        harness.session.dispatch(Action::ToggleBookmark, &mut harness.dialogs),
        Dispatch::Handled
    );
    assert_eq!(harness.session.tab(key).unwrap().buffer.bookmarked_lines(), vec![1, 2]);

    harness.place_cursor(0);
    harness.type_text("zero\n");
    assert_eq!(harness.session.tab(key).unwrap().buffer.bookmarked_lines(), vec![2, 3]);

    assert_eq!(harness.session.toggle_bookmark(3), Some(false));
    assert_eq!(harness.session.tab(key).unwrap().buffer.bookmarked_lines(), vec![3]);
    assert_eq!(harness.session.toggle_bookmark(0), None);
    assert_eq!(harness.session.toggle_bookmark(99), None);
}

#[test]
fn test_insert_key_toggles_overwrite() {
    let mut harness = SessionHarness::new().unwrap();
    let key = harness.new_tab();
    let keymap = Keymap::from_config(harness.session.config());

    let action = keymap
        .resolve(&parse_accelerator("Insert").unwrap())
        .unwrap();
    assert_eq!(action, Action::ToggleOverwrite);
    harness.session.dispatch(action, &mut harness.dialogs);

    assert!(harness.session.tab(key).unwrap().overwrite);
}

#[test]
fn test_typing_ignored_while_loading() {
    let mut harness = SessionHarness::with_config(|config| {
        config.large_file_threshold_bytes = 16;
    })
    .unwrap();
    let path = harness.write_file("big.txt", &"line\n".repeat(20_000));
    let key = harness.open_new(&path);

    assert!(!harness.session.type_text("x"));
    assert_eq!(harness.session.status_line(), None);

    harness.wait_until_loaded(key);
    assert!(harness.session.type_text("x"));
    assert!(harness.text(key).starts_with("xline\n"));
}
