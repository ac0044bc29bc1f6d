//! Parameter checkpoints with undo/redo.
//!
//! Each checkpoint stores the complete [`EffectParams`] that were committed,
//! so undo never replays deltas: it restores the previous snapshot and the
//! pipeline re-renders from the pristine source.

use std::collections::VecDeque;

use retouch_ops::params::change_label;
use retouch_ops::{EffectParams, ParamChange};

/// One committed parameter change.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// `field=value, ...` summary of what changed.
    pub label: String,
    /// Full parameter state after the change.
    pub params: EffectParams,
    /// Individual changed fields.
    pub changes: Vec<ParamChange>,
}

impl Checkpoint {
    /// Creates a checkpoint, deriving the label from `changes`.
    pub fn new(params: EffectParams, changes: Vec<ParamChange>) -> Self {
        Self {
            label: change_label(&changes),
            params,
            changes,
        }
    }
}

/// Bounded undo/redo stacks of checkpoints.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Checkpoint>,
    redo_stack: VecDeque<Checkpoint>,
    limit: usize,
    /// State below the oldest retained checkpoint.
    base: EffectParams,
}

impl Default for History {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// Creates an empty history keeping at most `limit` checkpoints.
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            limit: limit.max(1),
            base: EffectParams::default(),
        }
    }

    /// Records a checkpoint and clears the redo stack.
    pub fn push(&mut self, checkpoint: Checkpoint) {
        self.redo_stack.clear();
        self.undo_stack.push_back(checkpoint);
        while self.undo_stack.len() > self.limit {
            if let Some(evicted) = self.undo_stack.pop_front() {
                self.base = evicted.params;
            }
        }
    }

    /// Steps back one checkpoint, returning the params to restore.
    pub fn undo(&mut self) -> Option<EffectParams> {
        let cp = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(cp);
        Some(self.current())
    }

    /// Re-applies the last undone checkpoint, returning its params.
    pub fn redo(&mut self) -> Option<EffectParams> {
        let cp = self.redo_stack.pop_back()?;
        let params = cp.params.clone();
        self.undo_stack.push_back(cp);
        Some(params)
    }

    /// Params [`Self::undo`] would restore, without moving.
    pub fn peek_undo(&self) -> Option<EffectParams> {
        match self.undo_stack.len() {
            0 => None,
            1 => Some(self.base.clone()),
            n => Some(self.undo_stack[n - 2].params.clone()),
        }
    }

    /// Params [`Self::redo`] would re-apply, without moving.
    pub fn peek_redo(&self) -> Option<EffectParams> {
        self.redo_stack.back().map(|cp| cp.params.clone())
    }

    /// Params at the current position.
    pub fn current(&self) -> EffectParams {
        self.undo_stack
            .back()
            .map_or_else(|| self.base.clone(), |cp| cp.params.clone())
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the checkpoint [`Self::undo`] would revert.
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|cp| cp.label.as_str())
    }

    /// Label of the checkpoint [`Self::redo`] would re-apply.
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|cp| cp.label.as_str())
    }

    /// Retained checkpoints, oldest first.
    pub fn checkpoints(&self) -> impl Iterator<Item = &Checkpoint> {
        self.undo_stack.iter()
    }

    /// Number of undoable checkpoints.
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// Drops everything and resets the base to defaults.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.base = EffectParams::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_blur(blur: u32) -> Checkpoint {
        let params = EffectParams {
            blur,
            ..Default::default()
        };
        let changes = EffectParams::default().diff(&params);
        Checkpoint::new(params, changes)
    }

    #[test]
    fn test_label() {
        assert_eq!(with_blur(4).label, "blur=4");
    }

    #[test]
    fn test_undo_redo() {
        let mut h = History::new(10);
        h.push(with_blur(1));
        h.push(with_blur(2));
        assert_eq!(h.undo().map(|p| p.blur), Some(1));
        assert_eq!(h.undo().map(|p| p.blur), Some(0));
        assert!(h.undo().is_none());
        assert_eq!(h.redo().map(|p| p.blur), Some(1));
        assert!(h.can_redo());

        h.push(with_blur(7));
        assert!(!h.can_redo());
        assert_eq!(h.current().blur, 7);
    }

    #[test]
    fn test_peek_matches_move() {
        let mut h = History::new(10);
        assert!(h.peek_undo().is_none());
        h.push(with_blur(1));
        h.push(with_blur(2));
        assert_eq!(h.peek_undo().map(|p| p.blur), Some(1));
        assert_eq!(h.len(), 2);
        assert_eq!(h.peek_undo(), h.undo());
        assert_eq!(h.peek_undo().map(|p| p.blur), Some(0));
        assert_eq!(h.peek_redo().map(|p| p.blur), Some(2));
        assert_eq!(h.peek_redo(), h.redo());
        assert!(h.peek_redo().is_none());
    }

    #[test]
    fn test_limit_moves_base() {
        let mut h = History::new(2);
        for b in 1..=4 {
            h.push(with_blur(b));
        }
        assert_eq!(h.len(), 2);
        h.undo();
        assert_eq!(h.undo().map(|p| p.blur), Some(2));
        assert!(!h.can_undo());
    }

    #[test]
    fn test_descriptions() {
        let mut h = History::default();
        assert!(h.undo_description().is_none());
        h.push(with_blur(3));
        assert_eq!(h.undo_description(), Some("blur=3"));
        h.undo();
        assert_eq!(h.redo_description(), Some("blur=3"));
    }
}
