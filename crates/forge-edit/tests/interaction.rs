//! Input routing through `TextEdit::handle_event`: key precedence,
//! typing modes, completion, and mouse selection.

use forge_edit::{
    ButtonMask, CompletionKind, CompletionOption, InputEvent, KeyEvent, Keycode, Modifiers,
    MouseButton, MouseButtonEvent, MouseMotionEvent, Point, Signal, TextEdit, TextPos,
};
use pretty_assertions::assert_eq;

fn key(keycode: Keycode) -> InputEvent {
    InputEvent::Key(KeyEvent::pressed(keycode))
}

fn key_mod(keycode: Keycode, modifiers: Modifiers) -> InputEvent {
    InputEvent::Key(KeyEvent::pressed(keycode).with_modifiers(modifiers))
}

fn left_click(x: f32, y: f32, clicks: u8) -> InputEvent {
    let mut ev = MouseButtonEvent::left_press(Point::new(x, y));
    ev.clicks = clicks;
    InputEvent::MouseButton(ev)
}

fn left_release(x: f32, y: f32, modifiers: Modifiers) -> InputEvent {
    InputEvent::MouseButton(MouseButtonEvent {
        button: MouseButton::Left,
        position: Point::new(x, y),
        pressed: false,
        clicks: 0,
        factor: 1.0,
        modifiers,
    })
}

fn left_drag(x: f32, y: f32) -> InputEvent {
    InputEvent::MouseMotion(MouseMotionEvent {
        position: Point::new(x, y),
        delta: Point::default(),
        mask: ButtonMask::LEFT,
    })
}

#[test]
fn typed_characters_insert_through_key_events() {
    let mut editor = TextEdit::new();
    assert!(editor.handle_event(key(Keycode::Char('h'))));
    assert!(editor.handle_event(key(Keycode::Char('i'))));
    assert_eq!(editor.text(), "hi");
}

#[test]
fn shift_arrows_extend_then_a_bare_move_drops() {
    let mut editor = TextEdit::new();
    editor.set_text("hello");
    editor.handle_event(key_mod(Keycode::Right, Modifiers::SHIFT));
    editor.handle_event(key_mod(Keycode::Right, Modifiers::SHIFT));
    assert_eq!(
        editor.selection_range(),
        Some((TextPos::new(0, 0), TextPos::new(0, 2)))
    );
    assert_eq!(editor.cursor(), TextPos::new(0, 2));

    // A plain left collapses onto the selection start.
    editor.handle_event(key(Keycode::Left));
    assert!(editor.selection_range().is_none());
    assert_eq!(editor.cursor(), TextPos::new(0, 0));
}

#[test]
fn ctrl_arrows_hop_words() {
    let mut editor = TextEdit::new();
    editor.set_text("foo bar baz");
    editor.handle_event(key_mod(Keycode::Right, Modifiers::CTRL));
    assert_eq!(editor.cursor(), TextPos::new(0, 4));
    editor.handle_event(key_mod(Keycode::Right, Modifiers::CTRL));
    assert_eq!(editor.cursor(), TextPos::new(0, 8));
    editor.handle_event(key_mod(Keycode::Left, Modifiers::CTRL));
    assert_eq!(editor.cursor(), TextPos::new(0, 4));
}

#[test]
fn ctrl_backspace_deletes_the_previous_word() {
    let mut editor = TextEdit::new();
    editor.set_text("foo bar baz");
    editor.set_cursor(TextPos::new(0, 11));
    editor.handle_event(key_mod(Keycode::Backspace, Modifiers::CTRL));
    assert_eq!(editor.text(), "foo bar ");
    assert_eq!(editor.cursor(), TextPos::new(0, 8));
}

#[test]
fn ctrl_z_undoes_through_the_key_path() {
    let mut editor = TextEdit::new();
    editor.handle_event(key(Keycode::Char('a')));
    editor.handle_event(key(Keycode::Char('b')));
    editor.handle_event(key_mod(Keycode::Char('z'), Modifiers::CTRL));
    assert_eq!(editor.text(), "");
    editor.handle_event(key_mod(Keycode::Char('y'), Modifiers::CTRL));
    assert_eq!(editor.text(), "ab");
}

#[test]
fn escape_clears_the_selection_then_propagates() {
    let mut editor = TextEdit::new();
    editor.set_text("hello");
    editor.select(TextPos::new(0, 1), TextPos::new(0, 4));
    assert!(editor.handle_event(key(Keycode::Escape)));
    assert!(editor.selection_range().is_none());
    // Nothing left to clear: the host gets the key back.
    assert!(!editor.handle_event(key(Keycode::Escape)));
}

#[test]
fn auto_brace_pairs_and_skips_the_closer() {
    let mut editor = TextEdit::new();
    editor.set_auto_brace(true);
    editor.handle_event(key(Keycode::Char('(')));
    assert_eq!(editor.text(), "()");
    assert_eq!(editor.cursor(), TextPos::new(0, 1));

    // Typing the closer steps over the pending one.
    editor.handle_event(key(Keycode::Char(')')));
    assert_eq!(editor.text(), "()");
    assert_eq!(editor.cursor(), TextPos::new(0, 2));
}

#[test]
fn overwrite_mode_replaces_in_place_as_one_step() {
    let mut editor = TextEdit::new();
    editor.set_text("abc");
    editor.handle_event(key(Keycode::Insert));
    editor.handle_event(key(Keycode::Char('x')));
    assert_eq!(editor.text(), "xbc");
    assert_eq!(editor.cursor(), TextPos::new(0, 1));
    editor.undo();
    assert_eq!(editor.text(), "abc");
}

#[test]
fn auto_indent_copies_leading_whitespace() {
    let mut editor = TextEdit::new();
    editor.set_auto_indent(true);
    editor.set_text("    code");
    editor.set_cursor(TextPos::new(0, 8));
    editor.handle_event(key(Keycode::Enter));
    assert_eq!(editor.text(), "    code\n    ");
    assert_eq!(editor.cursor(), TextPos::new(1, 4));
}

#[test]
fn completion_keys_take_precedence_over_navigation() {
    let mut editor = TextEdit::new();
    editor.set_text("ab\nsecond");
    editor.set_cursor(TextPos::new(0, 2));
    editor.begin_completion(vec![
        CompletionOption::new(CompletionKind::Variable, "abc"),
        CompletionOption::new(CompletionKind::Variable, "abd"),
    ]);
    assert!(editor.completion_active());

    // Down moves the popup highlight, not the caret.
    editor.handle_event(key(Keycode::Down));
    assert_eq!(editor.cursor(), TextPos::new(0, 2));
    assert_eq!(editor.completion_current().unwrap().display, "abd");

    editor.handle_event(key(Keycode::Enter));
    assert_eq!(editor.line(0), "abd");
    assert_eq!(editor.cursor(), TextPos::new(0, 3));
    assert!(!editor.completion_active());
}

#[test]
fn escape_cancels_completion_without_editing() {
    let mut editor = TextEdit::new();
    editor.set_text("ab");
    editor.set_cursor(TextPos::new(0, 2));
    editor.begin_completion(vec![
        CompletionOption::new(CompletionKind::Variable, "abc"),
        CompletionOption::new(CompletionKind::Variable, "abd"),
    ]);
    editor.handle_event(key(Keycode::Escape));
    assert!(!editor.completion_active());
    assert_eq!(editor.text(), "ab");
}

#[test]
fn confirming_a_function_lands_between_parens() {
    let mut editor = TextEdit::new();
    editor.set_auto_brace(true);
    editor.set_text("pri");
    editor.set_cursor(TextPos::new(0, 3));
    editor.begin_completion(vec![CompletionOption::new(CompletionKind::Function, "print")]);
    assert!(editor.completion_active());

    editor.handle_event(key(Keycode::Tab));
    assert_eq!(editor.text(), "print()");
    assert_eq!(editor.cursor(), TextPos::new(0, 6));

    editor.undo();
    assert_eq!(editor.text(), "pri");
}

#[test]
fn confirming_before_a_closing_quote_drops_the_duplicate() {
    let mut editor = TextEdit::new();
    editor.set_text("\"res\"");
    editor.set_cursor(TextPos::new(0, 4));
    editor.begin_completion(vec![CompletionOption::new(
        CompletionKind::FilePath,
        "resource\"",
    )]);
    editor.confirm_completion();
    assert_eq!(editor.text(), "\"resource\"");
    assert_eq!(editor.cursor(), TextPos::new(0, 10));
}

#[test]
fn typing_a_trigger_prefix_requests_completion() {
    let mut editor = TextEdit::new();
    editor.completion().set_trigger_prefixes(vec![".".into()]);
    editor.set_text("node");
    editor.set_cursor(TextPos::new(0, 4));
    editor.handle_event(key(Keycode::Char('.')));
    assert!(editor.step(0.016).contains(&Signal::RequestCompletion));
}

#[test]
fn click_places_the_caret() {
    let mut editor = TextEdit::new();
    editor.set_text("hello world\nsecond");
    editor.handle_event(left_click(52.0, 5.0, 1));
    assert_eq!(editor.cursor(), TextPos::new(0, 5));
    editor.handle_event(left_click(5.0, 25.0, 1));
    assert_eq!(editor.cursor(), TextPos::new(1, 0));
}

#[test]
fn double_click_selects_the_word_and_drag_extends_by_words() {
    let mut editor = TextEdit::new();
    editor.set_text("foo bar baz");
    editor.handle_event(left_click(50.0, 5.0, 2));
    assert_eq!(
        editor.selection_range(),
        Some((TextPos::new(0, 4), TextPos::new(0, 7)))
    );

    editor.handle_event(left_drag(95.0, 5.0));
    assert_eq!(
        editor.selection_range(),
        Some((TextPos::new(0, 4), TextPos::new(0, 11)))
    );
    assert_eq!(editor.cursor(), TextPos::new(0, 11));
}

#[test]
fn triple_click_selects_the_line() {
    let mut editor = TextEdit::new();
    editor.set_text("one\ntwo\nthree");
    editor.handle_event(left_click(5.0, 5.0, 3));
    assert_eq!(
        editor.selection_range(),
        Some((TextPos::new(0, 0), TextPos::new(1, 0)))
    );
}

#[test]
fn dragging_the_selection_moves_its_text() {
    let mut editor = TextEdit::new();
    editor.set_text("hello world");
    editor.select(TextPos::new(0, 0), TextPos::new(0, 5));

    editor.handle_event(left_click(25.0, 5.0, 1));
    editor.handle_event(left_drag(85.0, 5.0));
    editor.handle_event(left_release(85.0, 5.0, Modifiers::empty()));
    assert_eq!(editor.text(), " wohellorld");
    assert_eq!(
        editor.selection_range(),
        Some((TextPos::new(0, 3), TextPos::new(0, 8)))
    );

    // The whole move undoes as one step.
    editor.undo();
    assert_eq!(editor.text(), "hello world");
}

#[test]
fn ctrl_drag_copies_instead_of_moving() {
    let mut editor = TextEdit::new();
    editor.set_text("hello world");
    editor.select(TextPos::new(0, 0), TextPos::new(0, 5));

    editor.handle_event(left_click(25.0, 5.0, 1));
    editor.handle_event(left_drag(85.0, 5.0));
    editor.handle_event(left_release(85.0, 5.0, Modifiers::CTRL));
    assert_eq!(editor.text(), "hello wohellorld");
}

#[test]
fn wheel_scrolls_three_rows_per_notch() {
    let mut editor = TextEdit::new();
    let text = (0..20).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
    editor.set_text(&text);
    editor.viewport().set_visible_rows(5);

    editor.handle_event(InputEvent::MouseButton(MouseButtonEvent {
        button: MouseButton::WheelDown,
        position: Point::default(),
        pressed: true,
        clicks: 0,
        factor: 1.0,
        modifiers: Modifiers::empty(),
    }));
    assert_eq!(editor.viewport().v_scroll(), 3.0);
}

#[test]
fn caret_blink_toggles_with_the_frame_clock() {
    let mut editor = TextEdit::new();
    editor.set_caret_blink(Some(0.1));
    assert!(editor.caret_visible());
    editor.step(0.06);
    assert!(editor.caret_visible());
    editor.step(0.06);
    assert!(!editor.caret_visible());

    // Typing makes the caret visible again immediately.
    editor.handle_event(key(Keycode::Char('a')));
    assert!(editor.caret_visible());
}
