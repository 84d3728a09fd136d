//! Undo/redo history
//!
//! [`CommandHistory`] is a two-stack undo/redo engine over any
//! [`Reversible`] command. Commands are recorded *after* their forward
//! action has been applied by the caller; the history itself never performs
//! the forward action on `record`.
//!
//! History is linear: recording a new command discards everything that
//! could have been redone.

use std::collections::VecDeque;

/// Default number of undo steps kept
pub const DEFAULT_MAX_DEPTH: usize = 500;

/// A command that can be replayed in both directions against a target
pub trait Reversible {
    /// The state the command mutates
    type Target;

    /// Revert the command's effect
    fn undo(&self, target: &mut Self::Target);

    /// Re-apply the command's effect
    fn redo(&self, target: &mut Self::Target);

    /// Short human-readable label, e.g. for an "Undo add node" menu entry
    fn label(&self) -> String {
        String::from("edit")
    }
}

/// Two-stack undo/redo history
#[derive(Debug, Clone)]
pub struct CommandHistory<C> {
    undo_stack: VecDeque<C>,
    redo_stack: Vec<C>,
    /// Maximum undo depth (0 = unlimited)
    max_depth: usize,
}

impl<C> Default for CommandHistory<C> {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }
}

impl<C: Reversible> CommandHistory<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an already-applied command. Clears the redo stack.
    pub fn record(&mut self, command: C) {
        self.redo_stack.clear();
        self.undo_stack.push_back(command);
        if self.max_depth > 0 {
            while self.undo_stack.len() > self.max_depth {
                self.undo_stack.pop_front();
            }
        }
    }

    /// Undo the most recent command. Returns false when there is nothing to undo.
    pub fn undo(&mut self, target: &mut C::Target) -> bool {
        let Some(command) = self.undo_stack.pop_back() else {
            return false;
        };
        tracing::debug!("Undo {}", command.label());
        command.undo(target);
        self.redo_stack.push(command);
        true
    }

    /// Redo the most recently undone command. Returns false when there is nothing to redo.
    pub fn redo(&mut self, target: &mut C::Target) -> bool {
        let Some(command) = self.redo_stack.pop() else {
            return false;
        };
        tracing::debug!("Redo {}", command.label());
        command.redo(target);
        self.undo_stack.push_back(command);
        true
    }
}

impl<C> CommandHistory<C> {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Command that `undo` would revert next
    pub fn peek_undo(&self) -> Option<&C> {
        self.undo_stack.back()
    }

    /// Command that `redo` would re-apply next
    pub fn peek_redo(&self) -> Option<&C> {
        self.redo_stack.last()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Change the depth limit, discarding the oldest entries if needed
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
        if max_depth > 0 {
            while self.undo_stack.len() > max_depth {
                self.undo_stack.pop_front();
            }
        }
    }

    /// Forget all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Adds its amount to a counter; undo subtracts it
    #[derive(Debug, Clone, PartialEq)]
    struct Add(i64);

    impl Reversible for Add {
        type Target = i64;

        fn undo(&self, target: &mut i64) {
            *target -= self.0;
        }

        fn redo(&self, target: &mut i64) {
            *target += self.0;
        }
    }

    fn apply(history: &mut CommandHistory<Add>, target: &mut i64, amount: i64) {
        *target += amount;
        history.record(Add(amount));
    }

    #[test]
    fn test_empty_history_is_noop() {
        let mut history = CommandHistory::<Add>::new();
        let mut value = 3;
        assert!(!history.undo(&mut value));
        assert!(!history.redo(&mut value));
        assert_eq!(value, 3);
    }

    #[test]
    fn test_undo_redo() {
        let mut history = CommandHistory::new();
        let mut value = 0;
        apply(&mut history, &mut value, 5);
        apply(&mut history, &mut value, 7);

        assert!(history.undo(&mut value));
        assert_eq!(value, 5);
        assert!(history.can_redo());

        assert!(history.redo(&mut value));
        assert_eq!(value, 12);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = CommandHistory::new();
        let mut value = 0;
        apply(&mut history, &mut value, 1);
        apply(&mut history, &mut value, 2);

        history.undo(&mut value);
        history.undo(&mut value);
        apply(&mut history, &mut value, 10);

        assert!(!history.redo(&mut value));
        assert_eq!(history.redo_len(), 0);
        assert_eq!(value, 10);
    }

    #[test]
    fn test_max_depth_discards_oldest() {
        let mut history = CommandHistory::with_max_depth(2);
        let mut value = 0;
        for amount in [1, 2, 3] {
            apply(&mut history, &mut value, amount);
        }

        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.peek_undo(), Some(&Add(3)));
        history.undo(&mut value);
        history.undo(&mut value);
        assert!(!history.undo(&mut value));
        assert_eq!(value, 1);
    }

    #[test]
    fn test_unlimited_depth() {
        let mut history = CommandHistory::with_max_depth(0);
        let mut value = 0;
        for _ in 0..1000 {
            apply(&mut history, &mut value, 1);
        }
        assert_eq!(history.undo_len(), 1000);

        history.set_max_depth(10);
        assert_eq!(history.undo_len(), 10);
    }

    #[test]
    fn test_clear() {
        let mut history = CommandHistory::new();
        let mut value = 0;
        apply(&mut history, &mut value, 1);
        history.undo(&mut value);
        apply(&mut history, &mut value, 2);
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
