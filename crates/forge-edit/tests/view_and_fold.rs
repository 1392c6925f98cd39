//! Wrap, fold, and viewport behavior through the `TextEdit` facade.

use forge_edit::{FontMetrics, TextEdit, TextPos};
use pretty_assertions::assert_eq;

fn editor_with(text: &str) -> TextEdit {
    let mut editor = TextEdit::new();
    editor.set_font_metrics(FontMetrics::new(10, 20));
    editor.set_text(text);
    editor
}

#[test]
fn wrap_prefers_space_boundaries() {
    let mut editor = editor_with("aa bb cc dd");
    editor.set_wrap_enabled(true);
    editor.set_wrap_at(65);
    assert_eq!(editor.wrap_rows(0), vec!["aa bb ".to_owned(), "cc dd".to_owned()]);
}

#[test]
fn wrap_rows_always_concatenate_to_the_line() {
    let mut editor = editor_with("the quick brown fox jumps over the lazy dog");
    editor.set_wrap_enabled(true);
    for wrap_at in [40, 65, 90, 200] {
        editor.set_wrap_at(wrap_at);
        for line in 0..editor.line_count() {
            let rows = editor.wrap_rows(line);
            assert_eq!(rows.concat(), editor.line(line), "wrap_at {wrap_at}");
        }
    }
}

#[test]
fn fold_cascade_hides_the_indented_block() {
    let mut editor = editor_with("def f():\n  a\n  b\nc");
    editor.set_hiding_enabled(true);
    assert!(editor.can_fold(0));

    editor.fold_line(0);
    assert!(!editor.is_line_hidden(0));
    assert!(editor.is_line_hidden(1));
    assert!(editor.is_line_hidden(2));
    assert!(!editor.is_line_hidden(3));
    assert!(editor.is_folded(0));

    editor.unfold_line(0);
    for line in 0..4 {
        assert!(!editor.is_line_hidden(line), "line {line}");
    }
}

#[test]
fn fold_unfold_restores_nested_hidden_state() {
    let mut editor = editor_with("a:\n  b:\n    c\n  d\ne");
    editor.set_hiding_enabled(true);
    let before: Vec<bool> = (0..5).map(|l| editor.is_line_hidden(l)).collect();
    editor.fold_line(0);
    editor.unfold_line(0);
    let after: Vec<bool> = (0..5).map(|l| editor.is_line_hidden(l)).collect();
    assert_eq!(before, after);
}

#[test]
fn folding_pulls_the_cursor_to_the_anchor() {
    let mut editor = editor_with("def f():\n  a\n  b\nc");
    editor.set_hiding_enabled(true);
    editor.set_cursor(TextPos::new(2, 1));
    editor.fold_line(0);
    assert_eq!(editor.cursor(), TextPos::new(0, 8));
}

#[test]
fn folding_clips_a_straddling_selection() {
    let mut editor = editor_with("def f():\n  a\n  b\nc");
    editor.set_hiding_enabled(true);
    editor.select(TextPos::new(1, 0), TextPos::new(3, 1));
    editor.fold_line(0);
    let (from, to) = editor.selection_range().expect("selection survives");
    assert_eq!(from, TextPos::new(0, 8));
    assert_eq!(to, TextPos::new(3, 1));
}

#[test]
fn folding_drops_a_fully_hidden_selection() {
    let mut editor = editor_with("def f():\n  a\n  b\nc");
    editor.set_hiding_enabled(true);
    editor.select(TextPos::new(1, 0), TextPos::new(2, 2));
    editor.fold_line(0);
    assert!(editor.selection_range().is_none());
}

#[test]
fn cursor_skips_hidden_lines() {
    let mut editor = editor_with("def f():\n  a\n  b\nc");
    editor.set_hiding_enabled(true);
    editor.fold_line(0);
    // Landing on a hidden line resolves to the fold anchor above.
    editor.set_cursor(TextPos::new(2, 0));
    assert_eq!(editor.cursor().line, 0);
}

#[test]
fn selection_stays_normalized_under_mutations() {
    let mut editor = editor_with("one\ntwo\nthree");
    editor.select(TextPos::new(2, 3), TextPos::new(0, 1));
    let (from, to) = editor.selection_range().unwrap();
    assert!(from <= to);

    editor.select(TextPos::new(1, 2), TextPos::new(1, 0));
    let (from, to) = editor.selection_range().unwrap();
    assert!(from <= to);
    assert_eq!((from, to), (TextPos::new(1, 0), TextPos::new(1, 2)));
}

#[test]
fn viewport_follows_the_cursor() {
    let text = (0..50).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
    let mut editor = editor_with(&text);
    editor.viewport().set_visible_rows(10);
    editor.set_cursor(TextPos::new(30, 0));
    let first = editor.viewport().v_scroll() as usize;
    assert!(first <= 30 && 30 < first + 10, "first visible row {first}");
}

#[test]
fn scrolling_clamps_to_the_document() {
    let mut editor = editor_with("a\nb\nc\nd\ne");
    editor.viewport().set_visible_rows(3);
    editor.scroll_to_row(100.0);
    assert_eq!(editor.viewport().v_scroll(), 2.0);
}
