//! Run state machine.

use std::fmt;

use serde::Serialize;

/// Where a sync run is in its lifecycle.
///
/// ```text
/// idle -> listing -> reconciling -> transferring
///      -> (re-listing -> reconciling -> transferring)*
///      -> indexing -> done
/// ```
///
/// Any non-terminal state may move to `Failed`. A failed run never reaches
/// `Indexing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunState {
    Idle,
    Listing,
    Reconciling,
    Transferring,
    ReListing,
    Indexing,
    Done,
    Failed,
}

impl RunState {
    /// Returns `true` once the run has finished, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        if next == Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Idle, Listing)
                | (Listing, Reconciling)
                | (Reconciling, Transferring)
                | (Transferring, Reconciling)
                | (Transferring, ReListing)
                | (Transferring, Indexing)
                | (Transferring, Done)
                | (ReListing, Reconciling)
                | (ReListing, Indexing)
                | (ReListing, Done)
                | (Indexing, Done)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Listing => "listing",
            Self::Reconciling => "reconciling",
            Self::Transferring => "transferring",
            Self::ReListing => "re-listing",
            Self::Indexing => "indexing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_path_is_legal() {
        use RunState::*;
        let path = [
            Idle,
            Listing,
            Reconciling,
            Transferring,
            ReListing,
            Reconciling,
            Transferring,
            Indexing,
            Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn failure_skips_indexing() {
        assert!(RunState::Transferring.can_transition_to(RunState::Failed));
        assert!(!RunState::Failed.can_transition_to(RunState::Indexing));
        assert!(!RunState::Done.can_transition_to(RunState::Failed));
    }

    #[test]
    fn listing_cannot_jump_to_indexing() {
        assert!(!RunState::Listing.can_transition_to(RunState::Indexing));
        assert!(!RunState::Idle.can_transition_to(RunState::Transferring));
    }
}
