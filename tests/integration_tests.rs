// Integration tests - key presses through the session, handoff and target file

mod common;

use common::fixtures::TestFixture;
use common::harness::PromptHarness;
use common::tracing::init_tracing_from_env;
use crossterm::event::{KeyCode, KeyModifiers};
use jot::app::external_editor::HandoffError;
use jot::app::target::{self, Destination};
use jot::app::Flow;
use jot::input::action::EditMode;

#[test]
fn test_enter_inserts_newline_and_ctrl_n_accepts() {
    init_tracing_from_env();
    let mut h = PromptHarness::emacs("", 0);
    h.type_keys("first");
    h.enter();
    h.type_keys("second");
    assert_eq!(h.last_flow, Flow::Continue);

    h.ctrl('n');
    assert_eq!(h.last_flow, Flow::Accept);
    assert_eq!(h.into_text(), "first\nsecond");
}

#[test]
fn test_ctrl_d_deletes_then_accepts_at_end() {
    let mut h = PromptHarness::emacs("ab", 1);
    h.ctrl('d');
    assert_eq!(h.text(), "a");
    assert_eq!(h.last_flow, Flow::Continue);

    h.ctrl('d');
    assert_eq!(h.last_flow, Flow::Accept);
    assert_eq!(h.text(), "a");
}

#[test]
fn test_up_down_keep_column() {
    let mut h = PromptHarness::emacs("one\ntwo\nthree", 6);
    h.key(KeyCode::Up, KeyModifiers::NONE);
    assert_eq!(h.cursor(), 2);
    h.key(KeyCode::Down, KeyModifiers::NONE);
    h.key(KeyCode::Down, KeyModifiers::NONE);
    assert_eq!(h.cursor(), 10);

    h.key(KeyCode::Down, KeyModifiers::NONE);
    assert_eq!(h.cursor(), 10);
    assert_eq!(h.bells, 1);
}

#[test]
fn test_line_start_and_end_stay_on_current_line() {
    let mut h = PromptHarness::emacs("abc\ndef\nghi", 5);
    h.ctrl('a');
    assert_eq!(h.cursor(), 4);
    h.ctrl('e');
    assert_eq!(h.cursor(), 7);
    h.key(KeyCode::Home, KeyModifiers::NONE);
    assert_eq!(h.cursor(), 4);
}

#[test]
fn test_emacs_kills_and_yank() {
    let mut h = PromptHarness::emacs("a\nb\nc", 2);
    h.ctrl('x');
    h.ctrl('k');
    assert_eq!(h.text(), "a\nc");
    assert_eq!(h.cursor(), 2);

    h.ctrl('y');
    assert_eq!(h.text(), "a\nb\nc");

    let mut h = PromptHarness::emacs("hello world\nnext", 6);
    h.ctrl('u');
    assert_eq!(h.text(), "world\nnext");
    assert_eq!(h.cursor(), 0);
    h.ctrl('k');
    assert_eq!(h.text(), "\nnext");
}

#[test]
fn test_emacs_buffer_motion_and_numeric_argument() {
    let mut h = PromptHarness::emacs("a\nb\nc", 0);
    h.alt('>');
    assert_eq!(h.cursor(), 5);
    h.alt('2');
    h.ctrl('p');
    assert_eq!(h.cursor(), 1);
    h.alt('<');
    assert_eq!(h.cursor(), 0);
}

#[test]
fn test_backspace_removes_whole_grapheme() {
    let mut h = PromptHarness::emacs("xe\u{301}", 4);
    h.key(KeyCode::Backspace, KeyModifiers::NONE);
    assert_eq!(h.text(), "x");
    h.key(KeyCode::Tab, KeyModifiers::NONE);
    assert_eq!(h.text(), "x\t");
}

#[test]
fn test_paste_is_inserted_with_unix_newlines() {
    let mut h = PromptHarness::emacs("", 0);
    h.paste("one\r\ntwo\rthree");
    assert_eq!(h.text(), "one\ntwo\nthree");
}

#[test]
fn test_ctrl_c_interrupts() {
    let mut h = PromptHarness::emacs("draft", 5);
    h.ctrl('c');
    assert_eq!(h.last_flow, Flow::Interrupt);
}

#[test]
fn test_vi_delete_lines_with_count() {
    let mut h = PromptHarness::vi_command("a\nb\nc", 0);
    assert_eq!(h.mode(), EditMode::ViCommand);
    assert_eq!(h.cursor(), 0);
    h.type_keys("2dd");
    assert_eq!(h.text(), "c");
}

#[test]
fn test_vi_join() {
    let mut h = PromptHarness::vi_command("abc\n  def", 0);
    h.type_keys("J");
    assert_eq!(h.text(), "abc def");
    assert_eq!(h.cursor(), 0);

    let mut h = PromptHarness::vi_command("a\nb\nc\nd", 0);
    h.type_keys("3J");
    assert_eq!(h.text(), "a b c d");
    assert_eq!(h.bells, 0);

    h.type_keys("J");
    assert_eq!(h.text(), "a b c d");
    assert_eq!(h.bells, 1);
}

#[test]
fn test_vi_goto_line() {
    let text = "first\n  second\nthird";
    let mut h = PromptHarness::vi_command(text, 0);
    h.type_keys("G");
    assert_eq!(h.cursor(), text.find("third").unwrap());
    h.type_keys("gg");
    assert_eq!(h.cursor(), 0);
    h.type_keys("2G");
    assert_eq!(h.cursor(), text.find("second").unwrap());
}

#[test]
fn test_vi_delete_to_end_of_line_with_count() {
    let mut h = PromptHarness::vi_command("ab\ncd\nef", 1);
    h.type_keys("2D");
    assert_eq!(h.text(), "a\nef");
}

#[test]
fn test_vi_open_lines() {
    let mut h = PromptHarness::vi_command("abc", 0);
    h.type_keys("o");
    assert_eq!(h.mode(), EditMode::ViInsert);
    h.type_keys("x");
    assert_eq!(h.text(), "abc\nx");

    let mut h = PromptHarness::vi_command("abc", 0);
    h.type_keys("O");
    h.type_keys("x");
    assert_eq!(h.text(), "x\nabc");
}

#[test]
fn test_vi_enter_moves_to_next_line_first_nonblank() {
    let mut h = PromptHarness::vi_command("a\n  b", 0);
    h.enter();
    assert_eq!(h.cursor(), 4);
    h.enter();
    assert_eq!(h.cursor(), 4);
    assert_eq!(h.bells, 1);
}

#[test]
fn test_vi_unbound_key_rings_bell() {
    let mut h = PromptHarness::vi_command("abc", 1);
    h.type_keys("z");
    assert_eq!(h.bells, 1);
    assert_eq!(h.text(), "abc");

    h.type_keys("dz");
    assert_eq!(h.bells, 2);
    h.type_keys("x");
    assert_eq!(h.text(), "ac");
}

#[test]
fn test_external_editor_round_trip() {
    let scratch = tempfile::tempdir().unwrap();
    let mut h = PromptHarness::with_shell_editor("x", "printf y >>", scratch.path());
    h.ctrl('x');
    h.ctrl('e');

    assert_eq!(h.text(), "xy");
    assert_eq!(h.cursor(), 2);
    assert_eq!(h.terminal.released, 1);
    assert_eq!(h.terminal.reacquired, 1);
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn test_failed_editor_leaves_buffer_and_target_untouched() {
    let fixture = TestFixture::new("msg.txt", "committed").unwrap();
    let initial = target::load_initial(Some(&fixture.path), false).unwrap();
    let mut h = PromptHarness::with_shell_editor(&initial, "exit 1;:", &fixture.dir());

    h.ctrl('x');
    let err = h
        .try_key(KeyCode::Char('e'), KeyModifiers::CONTROL)
        .unwrap_err();

    assert!(matches!(err, HandoffError::ExitStatus(1)));
    assert_eq!(h.text(), "committed");
    assert_eq!(fixture.read_content().unwrap(), "committed");
    // only the target itself is left in the directory
    assert_eq!(fixture.entries().unwrap(), 1);
}

#[test]
fn test_edit_file_end_to_end() {
    let fixture = TestFixture::new("msg.txt", "old subject\nbody").unwrap();
    let initial = target::load_initial(Some(&fixture.path), false).unwrap();

    let mut h = PromptHarness::emacs(&initial, 0);
    h.ctrl('k');
    h.type_keys("new subject");
    h.ctrl('n');
    assert_eq!(h.last_flow, Flow::Accept);

    target::write_result(&Destination::File(fixture.path.clone()), &h.into_text()).unwrap();
    assert_eq!(fixture.read_content().unwrap(), "new subject\nbody");
}

#[test]
fn test_start_empty_ignores_existing_content() {
    let fixture = TestFixture::new("msg.txt", "previous").unwrap();
    let initial = target::load_initial(Some(&fixture.path), true).unwrap();
    assert_eq!(initial, "");

    let mut h = PromptHarness::emacs(&initial, 0);
    h.type_keys("fresh");
    h.ctrl('d');
    assert_eq!(h.last_flow, Flow::Accept);

    target::write_result(&Destination::File(fixture.path.clone()), &h.into_text()).unwrap();
    assert_eq!(fixture.read_content().unwrap(), "fresh");
}

#[test]
fn test_missing_target_file_starts_empty_and_is_created() {
    let fixture = TestFixture::missing("new.txt").unwrap();
    let initial = target::load_initial(Some(&fixture.path), false).unwrap();
    assert_eq!(initial, "");

    target::write_result(&Destination::File(fixture.path.clone()), "created").unwrap();
    assert_eq!(fixture.read_content().unwrap(), "created");
}
