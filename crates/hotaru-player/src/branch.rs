//! Conditional branch tracking.
//!
//! Scripts nest `[if]` / `[else]` / `[endif]` freely, and lines inside a
//! false arm must be skipped without unbalancing the nesting. The tracker
//! keeps one frame per open conditional; a line is skipped while any frame
//! is false. Structural lines are fed to the tracker even inside skipped
//! regions, which is what keeps opens and closes paired.

use tracing::warn;

/// Stack of open conditional frames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchTracker {
    stack: Vec<bool>,
    current_result: Option<bool>,
}

impl BranchTracker {
    /// Open a frame with an evaluated condition result.
    pub fn open(&mut self, result: bool) {
        self.stack.push(result);
        self.current_result = Some(result);
    }

    /// Open a frame for a conditional that sits inside a skipped region.
    ///
    /// The frame still counts toward balance so the matching `[endif]`
    /// pops the right thing, but a conditional that never executed must
    /// not retarget the selection gate, so `current_result` is left
    /// alone.
    pub fn open_skipped(&mut self, result: bool) {
        self.stack.push(result);
    }

    /// Swap which arm of the innermost conditional executes.
    ///
    /// An `[else]` outside any conditional is a script error the player
    /// tolerates: logged, ignored.
    pub fn alternate(&mut self) {
        match self.stack.last_mut() {
            Some(top) => *top = !*top,
            None => warn!("[else] outside any conditional; ignored"),
        }
    }

    /// Close the innermost frame.
    ///
    /// An `[endif]` outside any conditional is logged and ignored.
    pub fn close(&mut self) {
        if self.stack.pop().is_none() {
            warn!("[endif] outside any conditional; ignored");
        }
    }

    /// True while the current line sits in a false arm at any depth.
    pub fn should_skip(&self) -> bool {
        self.stack.iter().any(|frame| !frame)
    }

    /// Result of the most recently evaluated condition.
    ///
    /// Deliberately sticky: neither `[else]` nor `[endif]` updates it, so
    /// a choice candidate queued right after a closed false conditional is
    /// still suppressed. Scripts rely on that to gate `[selection]` lines
    /// on the last `[if]` they passed.
    pub fn current_result(&self) -> Option<bool> {
        self.current_result
    }

    /// Number of open frames.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_tracker_never_skips() {
        let tracker = BranchTracker::default();
        assert!(!tracker.should_skip());
        assert_eq!(tracker.current_result(), None);
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn any_false_frame_skips() {
        let mut tracker = BranchTracker::default();
        tracker.open(true);
        tracker.open(false);
        tracker.open(true);
        assert!(tracker.should_skip());
        tracker.close();
        assert!(tracker.should_skip());
        tracker.close();
        assert!(!tracker.should_skip());
    }

    #[test]
    fn alternate_inverts_the_top_frame() {
        let mut tracker = BranchTracker::default();
        tracker.open(false);
        assert!(tracker.should_skip());
        tracker.alternate();
        assert!(!tracker.should_skip());
        // A stray second [else] flips back; the validator flags these.
        tracker.alternate();
        assert!(tracker.should_skip());
    }

    #[test]
    fn alternate_only_touches_the_innermost_frame() {
        let mut tracker = BranchTracker::default();
        tracker.open(true);
        tracker.open(false);
        tracker.alternate();
        assert!(!tracker.should_skip());
        tracker.close();
        assert!(!tracker.should_skip());
        assert_eq!(tracker.depth(), 1);
    }

    #[test]
    fn unmatched_close_and_alternate_are_no_ops() {
        let mut tracker = BranchTracker::default();
        tracker.close();
        tracker.alternate();
        assert_eq!(tracker.depth(), 0);
        assert!(!tracker.should_skip());
    }

    #[test]
    fn current_result_is_sticky() {
        let mut tracker = BranchTracker::default();
        tracker.open(false);
        assert_eq!(tracker.current_result(), Some(false));
        tracker.alternate();
        assert_eq!(tracker.current_result(), Some(false));
        tracker.close();
        assert_eq!(tracker.current_result(), Some(false));
        tracker.open(true);
        assert_eq!(tracker.current_result(), Some(true));
    }

    #[test]
    fn skipped_frames_do_not_move_the_gate() {
        let mut tracker = BranchTracker::default();
        tracker.open(false);
        tracker.open_skipped(true);
        assert_eq!(tracker.depth(), 2);
        assert!(tracker.should_skip());
        assert_eq!(tracker.current_result(), Some(false));
        tracker.close();
        tracker.close();
        assert_eq!(tracker.current_result(), Some(false));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Open(bool),
        Alternate,
        Close,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<bool>().prop_map(Op::Open),
            Just(Op::Alternate),
            Just(Op::Close),
        ]
    }

    proptest! {
        // Arbitrary structural sequences, balanced or not, never panic,
        // and tracked depth matches a reference count where unmatched
        // closes are no-ops. Closing every open frame always drains the
        // stack completely.
        #[test]
        fn structural_sequences_balance(ops in proptest::collection::vec(op(), 0..64)) {
            let mut tracker = BranchTracker::default();
            let mut depth: usize = 0;
            for op in &ops {
                match op {
                    Op::Open(result) => {
                        tracker.open(*result);
                        depth += 1;
                    }
                    Op::Alternate => tracker.alternate(),
                    Op::Close => {
                        tracker.close();
                        depth = depth.saturating_sub(1);
                    }
                }
            }
            prop_assert_eq!(tracker.depth(), depth);
            for _ in 0..depth {
                tracker.close();
            }
            prop_assert_eq!(tracker.depth(), 0);
            prop_assert!(!tracker.should_skip());
        }
    }
}
