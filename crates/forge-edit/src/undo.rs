//! Transactional undo/redo log of insert/remove operations.
//!
//! Operations record what changed and where; the log never touches the
//! document itself. [`UndoLog::undo`] and [`UndoLog::redo`] return the
//! operations to apply, in application order, so the editor facade owns
//! the single write path into the line store.
//!
//! Consecutive typing coalesces into one operation, as does backspacing.
//! `begin_complex_operation`/`end_complex_operation` bracket a chain that
//! undoes and redoes as one step.

use tracing::trace;

use crate::line_store::TextPos;

/// What an operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Text was inserted at `from`, ending at `to`.
    Insert,
    /// The range `from..to` was removed.
    Remove,
}

/// One recorded edit.
#[derive(Debug, Clone)]
pub struct TextOperation {
    /// Insert or remove.
    pub kind: OpKind,
    /// Range start.
    pub from: TextPos,
    /// Range end.
    pub to: TextPos,
    /// The inserted or removed text.
    pub text: String,
    /// Document version before this operation.
    pub prev_version: u64,
    /// Document version after this operation.
    pub version: u64,
    /// First operation of a complex chain.
    pub chain_forward: bool,
    /// Last operation of a complex chain.
    pub chain_backward: bool,
}

/// Bounded operation log with a redo suffix.
pub struct UndoLog {
    ops: Vec<TextOperation>,
    // Index of the first redo op; ops[..pos] are undoable.
    pos: usize,
    current: Option<TextOperation>,
    version: u64,
    doc_version: u64,
    saved_version: u64,
    next_is_complex: bool,
    enabled: bool,
    max_steps: usize,
}

/// Default bound on stored undo steps.
pub const DEFAULT_MAX_UNDO_STEPS: usize = 1024;

impl UndoLog {
    /// Empty log.
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            pos: 0,
            current: None,
            version: 0,
            doc_version: 0,
            saved_version: 0,
            next_is_complex: false,
            enabled: true,
            max_steps: DEFAULT_MAX_UNDO_STEPS,
        }
    }

    /// Enable or disable recording. Disabling clears the history.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear_history();
        }
    }

    /// Bound the stored steps; oldest entries are discarded past it.
    pub fn set_max_steps(&mut self, max_steps: usize) {
        self.max_steps = max_steps.max(1);
    }

    /// Current document version.
    pub fn version(&self) -> u64 {
        self.doc_version
    }

    /// Mark the current version as the on-disk state.
    pub fn tag_saved_version(&mut self) {
        self.saved_version = self.doc_version;
    }

    /// The last tagged on-disk version.
    pub fn saved_version(&self) -> u64 {
        self.saved_version
    }

    /// Whether the document matches the last tagged save.
    pub fn is_saved(&self) -> bool {
        self.doc_version == self.saved_version
    }

    /// Whether an undo step is available.
    pub fn has_undo(&self) -> bool {
        self.pos > 0 || self.current.is_some()
    }

    /// Whether a redo step is available.
    pub fn has_redo(&self) -> bool {
        self.current.is_none() && self.pos < self.ops.len()
    }

    /// Drop all history. Versions keep advancing from where they are.
    pub fn clear_history(&mut self) {
        self.ops.clear();
        self.pos = 0;
        self.current = None;
        self.next_is_complex = false;
    }

    /// Begin a chain that undoes/redoes as one step.
    pub fn begin_complex_operation(&mut self) {
        self.push_current();
        self.next_is_complex = true;
    }

    /// Close the chain opened by `begin_complex_operation`.
    pub fn end_complex_operation(&mut self) {
        self.push_current();
        let Some(last) = self.ops.last_mut() else {
            return;
        };
        if last.chain_forward {
            // Single-op chain; no bracket needed.
            last.chain_forward = false;
            return;
        }
        last.chain_backward = true;
    }

    /// Record an insertion of `text` spanning `from..to`.
    pub fn record_insert(&mut self, from: TextPos, to: TextPos, text: &str) {
        self.version += 1;
        self.doc_version = self.version;
        if !self.enabled {
            return;
        }
        self.clear_redo();

        let mut op = TextOperation {
            kind: OpKind::Insert,
            from,
            to,
            text: text.to_owned(),
            prev_version: 0,
            version: self.version,
            chain_forward: false,
            chain_backward: false,
        };
        if self.next_is_complex {
            op.chain_forward = true;
            self.next_is_complex = false;
        } else if let Some(current) = &mut self.current
            && current.kind == OpKind::Insert
            && current.to == from
        {
            // Typing continues the current op.
            current.text.push_str(text);
            current.to = to;
            current.version = op.version;
            return;
        }
        op.prev_version = self.version - 1;
        self.push_current();
        self.current = Some(op);
    }

    /// Record a removal of `text`, which occupied `from..to`.
    pub fn record_remove(&mut self, from: TextPos, to: TextPos, text: String) {
        self.version += 1;
        self.doc_version = self.version;
        if !self.enabled {
            return;
        }
        self.clear_redo();

        let mut op = TextOperation {
            kind: OpKind::Remove,
            from,
            to,
            text,
            prev_version: 0,
            version: self.version,
            chain_forward: false,
            chain_backward: false,
        };
        if self.next_is_complex {
            op.chain_forward = true;
            self.next_is_complex = false;
        } else if let Some(current) = &mut self.current
            && current.kind == OpKind::Remove
            && current.from == to
        {
            // Backspacing continues the current op.
            op.text.push_str(&current.text);
            current.text = op.text;
            current.from = from;
            current.version = op.version;
            return;
        }
        op.prev_version = self.version - 1;
        self.push_current();
        self.current = Some(op);
    }

    /// Take one undo step.
    ///
    /// Returns the operations to invert, in application order, and moves
    /// the document version to the step's `prev_version`. `None` when
    /// there is nothing to undo.
    pub fn undo(&mut self) -> Option<Vec<TextOperation>> {
        self.push_current();
        if self.pos == 0 {
            return None;
        }
        self.pos -= 1;
        let mut steps = vec![self.ops[self.pos].clone()];
        if self.ops[self.pos].chain_backward {
            while self.pos > 0 {
                self.pos -= 1;
                steps.push(self.ops[self.pos].clone());
                if self.ops[self.pos].chain_forward {
                    break;
                }
            }
        }
        self.doc_version = steps.last().map(|op| op.prev_version).unwrap_or(0);
        trace!(target: "forge_edit::undo", ops = steps.len(), version = self.doc_version, "undo");
        Some(steps)
    }

    /// Take one redo step; mirror of [`UndoLog::undo`].
    pub fn redo(&mut self) -> Option<Vec<TextOperation>> {
        self.push_current();
        if self.pos >= self.ops.len() {
            return None;
        }
        let mut steps = vec![self.ops[self.pos].clone()];
        self.pos += 1;
        if steps[0].chain_forward {
            while self.pos < self.ops.len() {
                let op = self.ops[self.pos].clone();
                self.pos += 1;
                let last = op.chain_backward;
                steps.push(op);
                if last {
                    break;
                }
            }
        }
        self.doc_version = steps.last().map(|op| op.version).unwrap_or(self.doc_version);
        trace!(target: "forge_edit::undo", ops = steps.len(), version = self.doc_version, "redo");
        Some(steps)
    }

    /// Flush the in-progress coalescing op onto the stack.
    pub fn push_current(&mut self) {
        let Some(op) = self.current.take() else {
            return;
        };
        self.ops.truncate(self.pos);
        self.ops.push(op);
        self.pos = self.ops.len();
        self.discard_oldest();
    }

    fn clear_redo(&mut self) {
        if self.current.is_none() {
            self.ops.truncate(self.pos);
        }
    }

    fn discard_oldest(&mut self) {
        // Never split a chain: drop whole steps from the front.
        while self.ops.len() > self.max_steps {
            let mut drop = 1;
            if self.ops[0].chain_forward {
                while drop < self.ops.len() && !self.ops[drop - 1].chain_backward {
                    drop += 1;
                }
            }
            self.ops.drain(..drop);
            self.pos = self.pos.saturating_sub(drop);
        }
    }
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new()
    }
}
