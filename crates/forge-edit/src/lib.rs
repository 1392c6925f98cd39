#![warn(missing_docs)]
//! `forge-edit` - headless interactive code-editor core.
//!
//! One [`TextEdit`] owns the whole editing state: the line store, the
//! region colorizer and highlight cache, the soft-wrap and fold models,
//! cursor and selection, the transactional undo log, the viewport
//! scroller, and the completion engine. Hosts feed it input events,
//! call [`TextEdit::step`] once per frame, and render from the queries
//! it exposes; it draws nothing itself.
//!
//! ```
//! use forge_edit::{TextEdit, Signal};
//!
//! let mut editor = TextEdit::new();
//! editor.insert_text_at_cursor("hello");
//! editor.undo();
//! assert_eq!(editor.text(), "");
//! assert!(editor.step(0.016).contains(&Signal::TextChanged));
//! ```

mod clipboard;
mod colorizer;
mod completion;
mod cursor;
mod editor;
mod events;
mod folding;
mod highlight;
mod input;
mod layout;
mod line_store;
mod metrics;
mod undo;
mod viewport;

pub use clipboard::{Clipboard, InMemoryClipboard};
pub use colorizer::{ColorRegion, RegionColorizer, RegionError};
pub use completion::{CompletionEngine, CompletionKind, CompletionOption};
pub use cursor::{
    next_word_column, prev_word_column, word_range_at, Cursor, Selection, SelectionMode,
};
pub use editor::{EditorHost, NullHost, SearchFlags, Signal, TextEdit};
pub use events::{
    ButtonMask, InputEvent, KeyEvent, Keycode, Modifiers, MouseButton, MouseButtonEvent,
    MouseMotionEvent, PanEvent, Point,
};
pub use folding::FoldModel;
pub use highlight::{Color, HighlightCache, HighlighterFn, HighlighterInfo, LineColorMap};
pub use layout::WrapModel;
pub use line_store::{Line, LineFlags, LineStore, TextPos};
pub use metrics::FontMetrics;
pub use undo::{OpKind, TextOperation, UndoLog, DEFAULT_MAX_UNDO_STEPS};
pub use viewport::ViewportScroller;
