//! Snapshot buffer and time-reversal navigation.
//!
//! [`HistoryManager`] mediates between live simulation and replay
//! viewing. While `Live`, the owning session mutates the live grid and
//! periodically records snapshots; while `Navigating`, reads are served
//! from the snapshot under the cursor and the live grid sits untouched
//! in the stash.
//!
//! The one unconditional operation is [`reset_to_initial`]: whatever
//! state navigation is in, a reset returns the manager to `Live` and
//! drops the stash *before* the caller applies the domain reset. Reads
//! during navigation come from the buffer, so a reset that left the
//! cursor in place would be silently shadowed by the next
//! navigation-dependent read — that ordering is the invariant this type
//! exists to protect.
//!
//! [`reset_to_initial`]: HistoryManager::reset_to_initial

use silt_core::{Grid, StepId};

use crate::error::HistoryError;

/// A full grid copy captured at a snapshot boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// The timestep the grid was at when captured.
    pub step: StepId,
    /// Deep copy of the grid.
    pub grid: Grid,
}

/// Where reads are currently served from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cursor {
    /// Reads and writes go to the live grid.
    Live,
    /// Reads are served from `buffer[index]`; the live grid is stashed.
    At(usize),
}

/// Ordered snapshot buffer with a navigation cursor.
///
/// Invariants, checked in debug builds after every operation:
/// - the stash holds a grid iff the cursor is not `Live`;
/// - `Cursor::At(i)` implies `i < buffer.len()`.
#[derive(Debug)]
pub struct HistoryManager {
    buffer: Vec<Snapshot>,
    cursor: Cursor,
    stashed_live: Option<Grid>,
    dirty: bool,
    max_snapshots: usize,
}

impl HistoryManager {
    /// Default bound on retained snapshots.
    pub const DEFAULT_MAX_SNAPSHOTS: usize = 256;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_MAX_SNAPSHOTS)
    }

    /// Create a manager retaining at most `max_snapshots` snapshots;
    /// the oldest is evicted first.
    ///
    /// # Panics
    ///
    /// Panics if `max_snapshots` is zero.
    pub fn with_capacity(max_snapshots: usize) -> Self {
        assert!(max_snapshots > 0, "history capacity must be at least 1");
        Self {
            buffer: Vec::new(),
            cursor: Cursor::Live,
            stashed_live: None,
            dirty: false,
            max_snapshots,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn is_navigating(&self) -> bool {
        self.cursor != Cursor::Live
    }

    /// Whether a live grid is stashed (true iff navigating).
    pub fn has_stash(&self) -> bool {
        self.stashed_live.is_some()
    }

    /// Whether mutations have been applied since the last snapshot.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Retained snapshots, oldest first.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.buffer
    }

    /// Note that a mutating command touched the live state.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Capture a snapshot of `live` if anything changed since the last
    /// one. Called before any operation that needs a consistent snapshot
    /// boundary, and periodically during live stepping.
    pub fn record_if_dirty(&mut self, live: &Grid) {
        if !self.dirty {
            return;
        }
        if self.buffer.len() == self.max_snapshots {
            // Eviction only ever happens while Live (recording is a
            // live-mode operation), so no cursor index is invalidated.
            self.buffer.remove(0);
        }
        self.buffer.push(Snapshot {
            step: live.step(),
            grid: live.clone(),
        });
        self.dirty = false;
        self.check_invariants();
    }

    /// Enter replay viewing at the most recent snapshot.
    ///
    /// Records a final snapshot if the live state is dirty, then stashes
    /// the live grid. A no-op when the buffer is empty (there is nothing
    /// to view). Legal only from `Live`.
    pub fn begin_navigation(&mut self, live: &Grid) -> Result<(), HistoryError> {
        if self.is_navigating() {
            return Err(HistoryError::AlreadyNavigating);
        }
        self.record_if_dirty(live);
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.stashed_live = Some(live.clone());
        self.cursor = Cursor::At(self.buffer.len() - 1);
        self.check_invariants();
        Ok(())
    }

    /// Move the cursor by `delta` snapshots, clamped to the buffer.
    /// Returns the new index. Legal only while navigating.
    pub fn navigate(&mut self, delta: i64) -> Result<usize, HistoryError> {
        let index = match self.cursor {
            Cursor::Live => return Err(HistoryError::NotNavigating),
            Cursor::At(i) => i,
        };
        let last = self.buffer.len() as i64 - 1;
        let next = (index as i64 + delta).clamp(0, last) as usize;
        self.cursor = Cursor::At(next);
        self.check_invariants();
        Ok(next)
    }

    /// Leave replay viewing, returning the stashed live grid so the
    /// session can restore it without loss. Legal only while navigating.
    pub fn resume_live(&mut self) -> Result<Grid, HistoryError> {
        if !self.is_navigating() {
            return Err(HistoryError::NotNavigating);
        }
        let live = self
            .stashed_live
            .take()
            .expect("navigating implies a stashed live grid");
        self.cursor = Cursor::Live;
        self.check_invariants();
        Ok(live)
    }

    /// Unconditionally return to `Live`, discarding any in-progress
    /// navigation, and mark the state dirty for the caller's domain
    /// reset.
    ///
    /// This must run *before* the live grid is rebuilt: while
    /// navigating, reads are served from the buffer, so a reset applied
    /// to the live grid under a still-set cursor would be shadowed by
    /// the next read.
    pub fn reset_to_initial(&mut self) {
        self.cursor = Cursor::Live;
        self.stashed_live = None;
        self.dirty = true;
        self.check_invariants();
    }

    /// The grid reads are currently served from: the snapshot under the
    /// cursor while navigating, the live grid otherwise.
    pub fn viewed<'a>(&'a self, live: &'a Grid) -> &'a Grid {
        match self.cursor {
            Cursor::Live => live,
            Cursor::At(i) => &self.buffer[i].grid,
        }
    }

    fn check_invariants(&self) {
        debug_assert_eq!(
            self.stashed_live.is_some(),
            self.cursor != Cursor::Live,
            "stash must exist exactly while navigating"
        );
        if let Cursor::At(i) = self.cursor {
            debug_assert!(i < self.buffer.len(), "cursor index out of buffer");
        }
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silt_core::Material;
    use silt_test_utils::empty_grid;

    fn grid_with_marker(fill: f32) -> Grid {
        let mut grid = empty_grid(4, 4);
        grid.set_cell(0, 0, Material::Dirt, fill).unwrap();
        grid
    }

    #[test]
    fn starts_live_and_clean() {
        let history = HistoryManager::new();
        assert_eq!(history.cursor(), Cursor::Live);
        assert!(!history.has_stash());
        assert!(!history.is_dirty());
        assert!(history.is_empty());
    }

    #[test]
    fn record_if_dirty_is_a_noop_when_clean() {
        let mut history = HistoryManager::new();
        history.record_if_dirty(&empty_grid(4, 4));
        assert!(history.is_empty());
    }

    #[test]
    fn record_if_dirty_captures_and_clears_flag() {
        let mut history = HistoryManager::new();
        history.mark_dirty();
        history.record_if_dirty(&grid_with_marker(0.5));
        assert_eq!(history.len(), 1);
        assert!(!history.is_dirty());
    }

    #[test]
    fn begin_navigation_on_empty_buffer_is_a_noop() {
        let mut history = HistoryManager::new();
        history.begin_navigation(&empty_grid(4, 4)).unwrap();
        assert_eq!(history.cursor(), Cursor::Live);
        assert!(!history.has_stash());
    }

    #[test]
    fn begin_navigation_points_at_most_recent_snapshot() {
        let mut history = HistoryManager::new();
        for fill in [0.2, 0.4, 0.6] {
            history.mark_dirty();
            history.record_if_dirty(&grid_with_marker(fill));
        }
        history.begin_navigation(&grid_with_marker(0.8)).unwrap();
        assert_eq!(history.cursor(), Cursor::At(2));
        assert!(history.has_stash());
    }

    #[test]
    fn begin_navigation_records_pending_dirty_state() {
        let mut history = HistoryManager::new();
        history.mark_dirty();
        history.begin_navigation(&grid_with_marker(0.3)).unwrap();
        // The dirty live state became the snapshot being viewed.
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), Cursor::At(0));
    }

    #[test]
    fn begin_navigation_twice_is_rejected() {
        let mut history = HistoryManager::new();
        history.mark_dirty();
        history.begin_navigation(&grid_with_marker(0.3)).unwrap();
        assert_eq!(
            history.begin_navigation(&grid_with_marker(0.3)),
            Err(HistoryError::AlreadyNavigating)
        );
    }

    #[test]
    fn navigate_clamps_to_buffer_bounds() {
        let mut history = HistoryManager::new();
        for fill in [0.1, 0.2, 0.3] {
            history.mark_dirty();
            history.record_if_dirty(&grid_with_marker(fill));
        }
        let live = grid_with_marker(0.9);
        history.begin_navigation(&live).unwrap();
        assert_eq!(history.navigate(-10).unwrap(), 0);
        assert_eq!(history.navigate(1).unwrap(), 1);
        assert_eq!(history.navigate(100).unwrap(), 2);
    }

    #[test]
    fn navigate_while_live_is_rejected() {
        let mut history = HistoryManager::new();
        assert_eq!(history.navigate(-1), Err(HistoryError::NotNavigating));
    }

    #[test]
    fn viewed_serves_snapshot_while_navigating() {
        let mut history = HistoryManager::new();
        let old = grid_with_marker(0.2);
        history.mark_dirty();
        history.record_if_dirty(&old);
        let live = grid_with_marker(0.9);
        history.begin_navigation(&live).unwrap();
        assert_eq!(
            history.viewed(&live).cell(0, 0).unwrap().fill,
            0.2,
            "reads while navigating must come from the snapshot"
        );
        history.resume_live().unwrap();
        assert_eq!(history.viewed(&live).cell(0, 0).unwrap().fill, 0.9);
    }

    #[test]
    fn resume_live_returns_the_stashed_grid() {
        let mut history = HistoryManager::new();
        history.mark_dirty();
        history.record_if_dirty(&grid_with_marker(0.2));
        let live = grid_with_marker(0.9);
        history.begin_navigation(&live).unwrap();
        let restored = history.resume_live().unwrap();
        assert_eq!(restored, live);
        assert_eq!(history.cursor(), Cursor::Live);
        assert!(!history.has_stash());
    }

    #[test]
    fn resume_live_while_live_is_rejected() {
        let mut history = HistoryManager::new();
        assert!(history.resume_live().is_err());
    }

    #[test]
    fn reset_from_live_returns_to_live_and_marks_dirty() {
        let mut history = HistoryManager::new();
        history.reset_to_initial();
        assert_eq!(history.cursor(), Cursor::Live);
        assert!(!history.has_stash());
        assert!(history.is_dirty());
    }

    #[test]
    fn reset_while_navigating_discards_navigation() {
        let mut history = HistoryManager::new();
        for fill in [0.1, 0.2, 0.3] {
            history.mark_dirty();
            history.record_if_dirty(&grid_with_marker(fill));
        }
        history.begin_navigation(&grid_with_marker(0.9)).unwrap();
        history.navigate(-2).unwrap();

        history.reset_to_initial();
        assert_eq!(history.cursor(), Cursor::Live);
        assert!(!history.has_stash());
        assert!(history.is_dirty());
    }

    #[test]
    fn eviction_drops_the_oldest_snapshot() {
        let mut history = HistoryManager::with_capacity(2);
        for fill in [0.1, 0.2, 0.3] {
            history.mark_dirty();
            history.record_if_dirty(&grid_with_marker(fill));
        }
        assert_eq!(history.len(), 2);
        assert_eq!(history.snapshots()[0].grid.cell(0, 0).unwrap().fill, 0.2);
        assert_eq!(history.snapshots()[1].grid.cell(0, 0).unwrap().fill, 0.3);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        /// Arbitrary operation against a history manager.
        #[derive(Clone, Copy, Debug)]
        enum Op {
            MarkDirty,
            Record,
            Begin,
            Navigate(i64),
            Resume,
            Reset,
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::MarkDirty),
                Just(Op::Record),
                Just(Op::Begin),
                (-5i64..5).prop_map(Op::Navigate),
                Just(Op::Resume),
                Just(Op::Reset),
            ]
        }

        proptest! {
            /// The regression-critical invariant: whatever sequence of
            /// operations preceded it, a reset leaves the manager Live
            /// with no stash.
            #[test]
            fn reset_always_lands_live(ops in prop::collection::vec(arb_op(), 0..32)) {
                let mut history = HistoryManager::with_capacity(8);
                let live = grid_with_marker(0.5);
                for op in ops {
                    match op {
                        Op::MarkDirty => history.mark_dirty(),
                        Op::Record => history.record_if_dirty(&live),
                        Op::Begin => { let _ = history.begin_navigation(&live); }
                        Op::Navigate(d) => { let _ = history.navigate(d); }
                        Op::Resume => { let _ = history.resume_live(); }
                        Op::Reset => history.reset_to_initial(),
                    }
                }
                history.reset_to_initial();
                prop_assert_eq!(history.cursor(), Cursor::Live);
                prop_assert!(!history.has_stash());
            }

            /// The stash exists exactly while navigating, for any
            /// operation sequence.
            #[test]
            fn stash_tracks_cursor(ops in prop::collection::vec(arb_op(), 0..32)) {
                let mut history = HistoryManager::with_capacity(8);
                let live = grid_with_marker(0.5);
                for op in ops {
                    match op {
                        Op::MarkDirty => history.mark_dirty(),
                        Op::Record => history.record_if_dirty(&live),
                        Op::Begin => { let _ = history.begin_navigation(&live); }
                        Op::Navigate(d) => { let _ = history.navigate(d); }
                        Op::Resume => { let _ = history.resume_live(); }
                        Op::Reset => history.reset_to_initial(),
                    }
                    prop_assert_eq!(history.has_stash(), history.is_navigating());
                }
            }
        }
    }
}
