//! Snapshot-based linear undo.

use crate::scene::SceneData;

/// Maximum number of snapshots to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Stack of full scene snapshots. The top is always the live state; the
/// bottom entry is the floor undo cannot go below.
#[derive(Debug, Clone, Default)]
pub struct History {
    snapshots: Vec<SceneData>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything and start over from `baseline`.
    pub fn reset(&mut self, baseline: SceneData) {
        self.snapshots.clear();
        self.snapshots.push(baseline);
    }

    /// Record a committed state.
    pub fn push(&mut self, snapshot: SceneData) {
        self.snapshots.push(snapshot);

        // Limit history size
        if self.snapshots.len() > MAX_UNDO_HISTORY {
            self.snapshots.remove(0);
        }
        log::debug!("History push ({} snapshots)", self.snapshots.len());
    }

    /// Whether undo would do anything.
    pub fn can_undo(&self) -> bool {
        self.snapshots.len() >= 2
    }

    /// Pop the latest snapshot and return the one now on top, or `None` at
    /// the floor.
    pub fn undo(&mut self) -> Option<&SceneData> {
        if !self.can_undo() {
            return None;
        }
        self.snapshots.pop();
        self.snapshots.last()
    }

    /// The snapshot matching the live state.
    pub fn current(&self) -> Option<&SceneData> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(scale: f64) -> SceneData {
        SceneData {
            symbol_scale: scale,
            ..SceneData::default()
        }
    }

    #[test]
    fn test_undo_returns_previous_state() {
        let mut history = History::new();
        history.reset(data(1.0));
        history.push(data(2.0));
        history.push(data(3.0));

        assert_eq!(history.undo().map(|d| d.symbol_scale), Some(2.0));
        assert_eq!(history.undo().map(|d| d.symbol_scale), Some(1.0));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_undo_floor() {
        let mut history = History::new();
        assert!(history.undo().is_none());

        history.reset(data(1.0));
        assert!(!history.can_undo());
        assert!(history.undo().is_none());
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().map(|d| d.symbol_scale), Some(1.0));
    }

    #[test]
    fn test_reset_discards_history() {
        let mut history = History::new();
        history.reset(data(1.0));
        history.push(data(2.0));
        history.reset(data(5.0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().map(|d| d.symbol_scale), Some(5.0));
    }

    #[test]
    fn test_history_is_capped() {
        let mut history = History::new();
        history.reset(data(0.0));
        for i in 1..=MAX_UNDO_HISTORY + 10 {
            history.push(data(i as f64));
        }
        assert_eq!(history.len(), MAX_UNDO_HISTORY);
        assert_eq!(history.current().map(|d| d.symbol_scale), Some((MAX_UNDO_HISTORY + 10) as f64));
    }
}
