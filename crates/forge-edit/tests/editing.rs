//! End-to-end editing behavior through the `TextEdit` facade.

use forge_edit::{SearchFlags, Signal, TextEdit, TextPos};
use pretty_assertions::assert_eq;

#[test]
fn coalesced_typing_undoes_in_one_step() {
    let mut editor = TextEdit::new();
    editor.insert_text_at_cursor("a");
    editor.insert_text_at_cursor("b");
    editor.insert_text_at_cursor("c");
    assert_eq!(editor.text(), "abc");

    assert!(editor.undo());
    assert_eq!(editor.text(), "");
    assert_eq!(editor.cursor(), TextPos::new(0, 0));
    assert!(!editor.undo());
}

#[test]
fn complex_operation_reverts_as_one_step() {
    let mut editor = TextEdit::new();
    editor.set_text("hello");
    let baseline = editor.version();

    editor.begin_complex_operation();
    editor.select(TextPos::new(0, 0), TextPos::new(0, 5));
    editor.remove_selection();
    editor.insert_text_at_cursor("world");
    editor.end_complex_operation();
    assert_eq!(editor.text(), "world");

    assert!(editor.undo());
    assert_eq!(editor.text(), "hello");
    assert_eq!(editor.cursor(), TextPos::new(0, 5));
    assert_eq!(editor.version(), baseline);

    assert!(editor.redo());
    assert_eq!(editor.text(), "world");
}

#[test]
fn full_undo_chain_reaches_the_empty_document() {
    let mut editor = TextEdit::new();
    editor.insert_text_at_cursor("fn main() {\n");
    editor.insert_text_at_cursor("    body\n");
    editor.insert_text_at_cursor("}");
    editor.set_cursor(TextPos::new(1, 4));
    editor.select(TextPos::new(1, 4), TextPos::new(1, 8));
    editor.remove_selection();
    let final_text = editor.text();

    let mut undos = 0;
    while editor.undo() {
        undos += 1;
        assert!(undos < 100);
    }
    assert_eq!(editor.text(), "");

    let mut redos = 0;
    while editor.redo() {
        redos += 1;
        assert!(redos < 100);
    }
    assert_eq!(editor.text(), final_text);
    assert_eq!(undos, redos);
}

#[test]
fn version_strictly_increases_per_edit() {
    let mut editor = TextEdit::new();
    let v0 = editor.version();
    editor.insert_text_at_cursor("a");
    let v1 = editor.version();
    assert!(v1 > v0);
    editor.backspace();
    let v2 = editor.version();
    assert!(v2 > v1);

    editor.undo();
    assert_eq!(editor.version(), v1);
    editor.redo();
    assert_eq!(editor.version(), v2);
}

#[test]
fn saved_version_flags_unsaved_changes() {
    let mut editor = TextEdit::new();
    editor.set_text("content");
    editor.tag_saved_version();
    assert!(!editor.has_unsaved_changes());
    editor.insert_text_at_cursor("!");
    assert!(editor.has_unsaved_changes());
    editor.undo();
    assert!(!editor.has_unsaved_changes());
}

#[test]
fn multiline_insert_and_remove_round_trip() {
    let mut editor = TextEdit::new();
    editor.set_text("alpha\nbeta\ngamma");
    editor.set_cursor(TextPos::new(1, 2));
    editor.insert_text_at_cursor("X\nY");
    assert_eq!(editor.text(), "alpha\nbeX\nYta\ngamma");
    assert_eq!(editor.cursor(), TextPos::new(2, 1));

    editor.undo();
    assert_eq!(editor.text(), "alpha\nbeta\ngamma");
}

#[test]
fn backspace_joins_lines() {
    let mut editor = TextEdit::new();
    editor.set_text("one\ntwo");
    editor.set_cursor(TextPos::new(1, 0));
    editor.backspace();
    assert_eq!(editor.text(), "onetwo");
    assert_eq!(editor.cursor(), TextPos::new(0, 3));
}

#[test]
fn delete_at_line_end_joins_lines() {
    let mut editor = TextEdit::new();
    editor.set_text("one\ntwo");
    editor.set_cursor(TextPos::new(0, 3));
    editor.delete_char();
    assert_eq!(editor.text(), "onetwo");
}

#[test]
fn readonly_blocks_every_mutation() {
    let mut editor = TextEdit::new();
    editor.set_text("locked");
    editor.set_readonly(true);

    editor.insert_text_at_cursor("x");
    editor.backspace();
    editor.delete_char();
    editor.paste();
    editor.cut();
    assert!(!editor.undo());
    assert_eq!(editor.text(), "locked");
}

#[test]
fn cut_copy_paste_round_trip() {
    let mut editor = TextEdit::new();
    editor.set_text("hello world");
    editor.select(TextPos::new(0, 0), TextPos::new(0, 5));
    editor.cut();
    assert_eq!(editor.text(), " world");

    editor.set_cursor(TextPos::new(0, 6));
    editor.paste();
    assert_eq!(editor.text(), " worldhello");
}

#[test]
fn copy_without_selection_takes_the_line() {
    let mut editor = TextEdit::new();
    editor.set_text("first\nsecond");
    editor.set_cursor(TextPos::new(0, 3));
    editor.cut();
    assert_eq!(editor.text(), "second");
    editor.set_cursor(TextPos::new(0, 6));
    editor.paste();
    assert_eq!(editor.text(), "secondfirst\n");
}

#[test]
fn swap_lines_is_one_undo_step() {
    let mut editor = TextEdit::new();
    editor.set_text("aaa\nbbb\nccc");
    editor.swap_lines(0, 2);
    assert_eq!(editor.text(), "ccc\nbbb\naaa");
    editor.undo();
    assert_eq!(editor.text(), "aaa\nbbb\nccc");
}

#[test]
fn indent_right_and_left_cover_the_selection() {
    let mut editor = TextEdit::new();
    editor.set_text("one\ntwo\nthree");
    editor.select(TextPos::new(0, 1), TextPos::new(1, 2));
    editor.indent_right();
    assert_eq!(editor.text(), "\tone\n\ttwo\nthree");
    editor.indent_left();
    assert_eq!(editor.text(), "one\ntwo\nthree");
}

#[test]
fn search_wraps_and_honors_flags() {
    let mut editor = TextEdit::new();
    editor.set_text("Fox box\nfox trot\nfoxtrot");

    // Case-insensitive forward from the start.
    assert_eq!(
        editor.search("fox", SearchFlags::empty(), TextPos::new(0, 0)),
        Some(TextPos::new(0, 0))
    );
    // Case-sensitive skips the capitalized match.
    assert_eq!(
        editor.search("fox", SearchFlags::MATCH_CASE, TextPos::new(0, 0)),
        Some(TextPos::new(1, 0))
    );
    // Whole words skip "foxtrot".
    assert_eq!(
        editor.search(
            "fox",
            SearchFlags::MATCH_CASE | SearchFlags::WHOLE_WORDS,
            TextPos::new(1, 1),
        ),
        Some(TextPos::new(1, 0)),
        "wraps around the document"
    );
    // Backwards from line 1 finds the match above.
    assert_eq!(
        editor.search("box", SearchFlags::BACKWARDS, TextPos::new(1, 0)),
        Some(TextPos::new(0, 4))
    );
    assert_eq!(editor.search("missing", SearchFlags::empty(), TextPos::new(0, 0)), None);
}

#[test]
fn signals_are_debounced_per_frame() {
    let mut editor = TextEdit::new();
    editor.insert_text_at_cursor("a");
    editor.insert_text_at_cursor("b");
    editor.set_cursor(TextPos::new(0, 0));
    editor.set_cursor(TextPos::new(0, 1));

    let signals = editor.step(0.016);
    let text_changed = signals.iter().filter(|s| **s == Signal::TextChanged).count();
    let cursor_changed = signals
        .iter()
        .filter(|s| **s == Signal::CursorChanged)
        .count();
    assert_eq!(text_changed, 1);
    assert_eq!(cursor_changed, 1);

    // A quiet frame emits nothing.
    assert!(editor.step(0.016).is_empty());
}

#[test]
fn breakpoint_toggle_emits_a_signal() {
    let mut editor = TextEdit::new();
    editor.set_text("a\nb");
    editor.toggle_breakpoint(1);
    assert_eq!(editor.breakpoints(), vec![1]);
    let signals = editor.step(0.016);
    assert!(signals.contains(&Signal::BreakpointToggled(1)));
    editor.toggle_breakpoint(1);
    assert!(editor.breakpoints().is_empty());
}
