//! Deciding when a cell activation should open the cell viewer.
//!
//! Mouse clicks arrive as a stream of "select" events, and the cursor moving
//! onto a cell arrives as a "highlight". A click on a cell that was already
//! highlighted for a while is a deliberate activation; a click that merely
//! moved the cursor there is not, unless it is quickly followed by a second
//! click on the same cell. Keyboard confirmation bypasses the heuristic.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Source of "now". Swapped out in tests.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Position of a cell in the full result, not the visible page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectPolicy {
    /// Minimum time a cell must stay highlighted before a select on it counts.
    pub debounce: Duration,
    /// Two selects on the same cell within this window count as activation.
    pub double_activation: Duration,
}

impl Default for InspectPolicy {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            double_activation: Duration::from_millis(500),
        }
    }
}

pub struct CellInspector<C: Clock = SystemClock> {
    clock: C,
    policy: InspectPolicy,
    last_highlight: Option<(CellRef, Instant)>,
    last_select: Option<(CellRef, Instant)>,
}

impl CellInspector<SystemClock> {
    pub fn new(policy: InspectPolicy) -> Self {
        Self::with_clock(policy, SystemClock)
    }
}

impl<C: Clock> CellInspector<C> {
    pub fn with_clock(policy: InspectPolicy, clock: C) -> Self {
        Self {
            clock,
            policy,
            last_highlight: None,
            last_select: None,
        }
    }

    pub fn policy(&self) -> InspectPolicy {
        self.policy
    }

    /// The cursor moved onto `cell`.
    pub fn highlight(&mut self, cell: CellRef) {
        self.last_highlight = Some((cell, self.clock.now()));
    }

    /// A pointer activation on `cell`. Returns true when the viewer should
    /// open.
    pub fn select(&mut self, cell: CellRef) -> bool {
        let now = self.clock.now();

        if let Some((highlighted, at)) = self.last_highlight {
            if highlighted == cell && now.duration_since(at) > self.policy.debounce {
                self.last_select = Some((cell, now));
                return true;
            }
        }

        if let Some((selected, at)) = self.last_select {
            if selected == cell && now.duration_since(at) < self.policy.double_activation {
                self.last_select = None;
                return true;
            }
        }

        self.last_select = Some((cell, now));
        false
    }

    /// An explicit keyboard confirmation. Always opens the viewer.
    pub fn confirm(&mut self, cell: CellRef) -> bool {
        self.last_select = Some((cell, self.clock.now()));
        true
    }

    /// Forget pending state, e.g. after the underlying rows were replaced.
    pub fn clear(&mut self) {
        self.last_highlight = None;
        self.last_select = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inspector(clock: &ManualClock) -> CellInspector<&ManualClock> {
        CellInspector::with_clock(InspectPolicy::default(), clock)
    }

    const A: CellRef = CellRef { row: 0, col: 0 };
    const B: CellRef = CellRef { row: 1, col: 2 };

    #[test]
    fn test_select_after_settled_highlight_triggers() {
        let clock = ManualClock::new();
        let mut ins = inspector(&clock);
        ins.highlight(A);
        clock.advance(Duration::from_millis(150));
        assert!(ins.select(A));
    }

    #[test]
    fn test_select_right_after_highlight_does_not_trigger() {
        let clock = ManualClock::new();
        let mut ins = inspector(&clock);
        ins.highlight(A);
        clock.advance(Duration::from_millis(20));
        assert!(!ins.select(A));
    }

    #[test]
    fn test_double_select_triggers() {
        let clock = ManualClock::new();
        let mut ins = inspector(&clock);
        assert!(!ins.select(A));
        clock.advance(Duration::from_millis(300));
        assert!(ins.select(A));
    }

    #[test]
    fn test_slow_double_select_does_not_trigger() {
        let clock = ManualClock::new();
        let mut ins = inspector(&clock);
        assert!(!ins.select(A));
        clock.advance(Duration::from_millis(600));
        assert!(!ins.select(A));
    }

    #[test]
    fn test_select_other_cell_does_not_trigger() {
        let clock = ManualClock::new();
        let mut ins = inspector(&clock);
        ins.highlight(A);
        clock.advance(Duration::from_millis(150));
        assert!(!ins.select(B));
    }

    #[test]
    fn test_double_activation_is_consumed() {
        let clock = ManualClock::new();
        let mut ins = inspector(&clock);
        assert!(!ins.select(A));
        clock.advance(Duration::from_millis(100));
        assert!(ins.select(A));
        clock.advance(Duration::from_millis(100));
        assert!(!ins.select(A));
    }

    #[test]
    fn test_confirm_always_triggers() {
        let clock = ManualClock::new();
        let mut ins = inspector(&clock);
        ins.highlight(A);
        assert!(ins.confirm(A));
        assert!(ins.confirm(B));
    }

    #[test]
    fn test_custom_policy() {
        let clock = ManualClock::new();
        let policy = InspectPolicy {
            debounce: Duration::from_millis(10),
            double_activation: Duration::from_millis(50),
        };
        let mut ins = CellInspector::with_clock(policy, &clock);
        ins.highlight(A);
        clock.advance(Duration::from_millis(20));
        assert!(ins.select(A));

        let mut ins = CellInspector::with_clock(policy, &clock);
        assert!(!ins.select(B));
        clock.advance(Duration::from_millis(100));
        assert!(!ins.select(B));
    }

    #[test]
    fn test_clear_forgets_pending() {
        let clock = ManualClock::new();
        let mut ins = inspector(&clock);
        ins.select(A);
        ins.clear();
        clock.advance(Duration::from_millis(10));
        assert!(!ins.select(A));
    }
}
