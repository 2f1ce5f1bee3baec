//! Ephemeral per-run session state.
//!
//! Nothing here is persisted; a new [`SessionState`] is created each time
//! the tutor starts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::ItemKind;

/// How the session picks learning items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PracticeMode {
    /// Focus on a single cluster until it is mastered.
    Blocked,
    /// Mix all eligible items.
    #[default]
    Interleaved,
}

/// Runtime state of one practice session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    /// Current practice mode.
    pub mode: PracticeMode,
    /// Cluster tag being drilled while blocked.
    pub active_cluster: Option<String>,
    /// Target share of learning items in a composed queue.
    pub learning_ratio: f64,
    /// Exercises issued since the topic menu was last shown.
    pub exercises_since_menu: u32,
    /// Kind of the most recently served item.
    pub last_kind: Option<ItemKind>,
    /// Whether the topic menu has been shown this session.
    pub menu_seen: bool,
    /// When the session started.
    pub started_at: DateTime<Utc>,
}

impl SessionState {
    /// New interleaved session with the given learning ratio.
    pub fn new(learning_ratio: f64) -> Self {
        Self {
            mode: PracticeMode::Interleaved,
            active_cluster: None,
            learning_ratio: learning_ratio.clamp(0.0, 1.0),
            exercises_since_menu: 0,
            last_kind: None,
            menu_seen: false,
            started_at: Utc::now(),
        }
    }

    /// Switch to blocked practice on `cluster`.
    pub fn block_on(&mut self, cluster: impl Into<String>) {
        self.mode = PracticeMode::Blocked;
        self.active_cluster = Some(cluster.into());
        self.menu_seen = true;
        self.exercises_since_menu = 0;
    }

    /// Leave blocked practice. The topic menu becomes due again.
    pub fn revert_to_interleaved(&mut self) {
        self.mode = PracticeMode::Interleaved;
        self.active_cluster = None;
        self.menu_seen = false;
    }

    /// Whether the session is drilling a cluster.
    pub fn is_blocked(&self) -> bool {
        self.mode == PracticeMode::Blocked && self.active_cluster.is_some()
    }

    /// Note that an exercise on an item of `kind` was issued.
    pub fn record_exercise(&mut self, kind: ItemKind) {
        self.exercises_since_menu += 1;
        self.last_kind = Some(kind);
    }

    /// Whether the topic menu should be offered again.
    ///
    /// The menu is shown at session start and then every `interval`
    /// exercises, but never while blocked.
    pub fn menu_due(&self, interval: u32) -> bool {
        if self.is_blocked() {
            return false;
        }
        !self.menu_seen || self.exercises_since_menu >= interval.max(1)
    }

    /// Reset the menu counter after the menu was shown.
    pub fn menu_shown(&mut self) {
        self.menu_seen = true;
        self.exercises_since_menu = 0;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(0.7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_interleaved() {
        let session = SessionState::default();
        assert_eq!(session.mode, PracticeMode::Interleaved);
        assert!(session.active_cluster.is_none());
        assert!((session.learning_ratio - 0.7).abs() < f64::EPSILON);
        assert!(!session.is_blocked());
    }

    #[test]
    fn test_ratio_is_clamped() {
        assert_eq!(SessionState::new(1.4).learning_ratio, 1.0);
        assert_eq!(SessionState::new(-0.2).learning_ratio, 0.0);
    }

    #[test]
    fn test_block_and_revert() {
        let mut session = SessionState::default();
        session.block_on("cluster:pronouns");
        assert!(session.is_blocked());
        assert_eq!(session.active_cluster.as_deref(), Some("cluster:pronouns"));

        session.revert_to_interleaved();
        assert!(!session.is_blocked());
        assert!(session.active_cluster.is_none());
    }

    #[test]
    fn test_menu_cadence() {
        let mut session = SessionState::default();
        assert!(session.menu_due(3));

        session.menu_shown();
        assert!(!session.menu_due(3));
        session.record_exercise(ItemKind::Vocabulary);
        session.record_exercise(ItemKind::Grammar);
        assert!(!session.menu_due(3));
        assert_eq!(session.last_kind, Some(ItemKind::Grammar));

        session.record_exercise(ItemKind::Vocabulary);
        assert!(session.menu_due(3));
    }

    #[test]
    fn test_menu_never_due_while_blocked() {
        let mut session = SessionState::default();
        session.block_on("cluster:pronouns");
        assert!(!session.menu_due(1));
    }
}
