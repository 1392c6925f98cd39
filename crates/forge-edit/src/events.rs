//! Input event shapes delivered by the host shell.

use bitflags::bitflags;

bitflags! {
    /// Modifier keys held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        /// Shift.
        const SHIFT = 1 << 0;
        /// Control.
        const CTRL = 1 << 1;
        /// Alt.
        const ALT = 1 << 2;
        /// Meta / Command.
        const META = 1 << 3;
    }
}

bitflags! {
    /// Mouse buttons held during a motion event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ButtonMask: u8 {
        /// Left button held.
        const LEFT = 1 << 0;
        /// Right button held.
        const RIGHT = 1 << 1;
        /// Middle button held.
        const MIDDLE = 1 << 2;
    }
}

/// A point in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal pixels from the left edge.
    pub x: f32,
    /// Vertical pixels from the top edge.
    pub y: f32,
}

impl Point {
    /// Point at `(x, y)`.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Physical key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keycode {
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Backspace.
    Backspace,
    /// Delete.
    Delete,
    /// Enter / Return.
    Enter,
    /// Tab.
    Tab,
    /// Escape.
    Escape,
    /// Insert.
    Insert,
    /// A printable key, identified by its base character.
    Char(char),
}

/// A key press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Which key.
    pub keycode: Keycode,
    /// Held modifiers.
    pub modifiers: Modifiers,
    /// Press (`true`) or release.
    pub pressed: bool,
    /// Auto-repeat of a held key.
    pub echo: bool,
    /// The character this press produces, if printable.
    pub unicode: Option<char>,
}

impl KeyEvent {
    /// A plain press of `keycode`.
    pub fn pressed(keycode: Keycode) -> Self {
        let unicode = match keycode {
            Keycode::Char(c) => Some(c),
            _ => None,
        };
        Self {
            keycode,
            modifiers: Modifiers::empty(),
            pressed: true,
            echo: false,
            unicode,
        }
    }

    /// The same press with `modifiers` held.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        if self.modifiers.intersects(Modifiers::CTRL | Modifiers::META) {
            self.unicode = None;
        }
        self
    }

    /// Whether Ctrl or Meta is held (the shortcut modifier).
    pub fn command(&self) -> bool {
        self.modifiers.intersects(Modifiers::CTRL | Modifiers::META)
    }
}

/// Mouse button identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Left button.
    Left,
    /// Right button.
    Right,
    /// Middle button.
    Middle,
    /// Wheel up notch.
    WheelUp,
    /// Wheel down notch.
    WheelDown,
}

/// A mouse button press or release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseButtonEvent {
    /// Which button.
    pub button: MouseButton,
    /// Pointer position.
    pub position: Point,
    /// Press (`true`) or release.
    pub pressed: bool,
    /// Click count: 2 = double click, 3 = triple.
    pub clicks: u8,
    /// Scroll magnitude for wheel buttons, 1.0 per notch.
    pub factor: f32,
    /// Held modifiers.
    pub modifiers: Modifiers,
}

impl MouseButtonEvent {
    /// A single left-click press at `position`.
    pub fn left_press(position: Point) -> Self {
        Self {
            button: MouseButton::Left,
            position,
            pressed: true,
            clicks: 1,
            factor: 1.0,
            modifiers: Modifiers::empty(),
        }
    }
}

/// Pointer motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseMotionEvent {
    /// Pointer position.
    pub position: Point,
    /// Motion since the previous event.
    pub delta: Point,
    /// Buttons held during the motion.
    pub mask: ButtonMask,
}

/// A two-finger pan gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanEvent {
    /// Pan amount in pixels.
    pub delta: Point,
}

/// Any input event the editor consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Keyboard.
    Key(KeyEvent),
    /// Mouse button.
    MouseButton(MouseButtonEvent),
    /// Mouse motion.
    MouseMotion(MouseMotionEvent),
    /// Pan gesture.
    Pan(PanEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_press_carries_unicode() {
        let ev = KeyEvent::pressed(Keycode::Char('a'));
        assert_eq!(ev.unicode, Some('a'));
        assert!(!ev.command());
    }

    #[test]
    fn command_press_suppresses_unicode() {
        let ev = KeyEvent::pressed(Keycode::Char('c')).with_modifiers(Modifiers::CTRL);
        assert_eq!(ev.unicode, None);
        assert!(ev.command());
    }
}
