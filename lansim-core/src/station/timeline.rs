use std::{collections::VecDeque, time::Duration};

/// The ordered sequence of pending transmission-attempt times for one
/// station.
///
/// The front entry is the *head*: the next time this station will try
/// to put a frame on the bus. Entries behind the head are inert until
/// they become the head. An empty timeline means the station has no
/// more work — that is the normal end-of-run state, not an error.
///
/// Two invariants hold at all times:
///
/// - entries are ascending;
/// - a head time never moves backward — it is only ever raised
///   ([`bump_head_to`](Timeline::bump_head_to)) or removed
///   ([`pop_head`](Timeline::pop_head)).
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: VecDeque<Duration>,
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the head time, if any.
    #[inline]
    pub fn peek(&self) -> Option<Duration> {
        self.entries.front().copied()
    }

    /// Removes and returns the head time (the attempt either succeeded
    /// or the packet was dropped).
    pub fn pop_head(&mut self) -> Option<Duration> {
        self.entries.pop_front()
    }

    /// Appends an arrival time. Only used to populate the timeline:
    /// arrival streams are generated cumulatively, so pushes arrive in
    /// ascending order already.
    pub fn push(&mut self, time: Duration) {
        debug_assert!(
            self.entries.back().is_none_or(|last| *last <= time),
            "arrival times must be pushed in ascending order"
        );
        self.entries.push_back(time);
    }

    /// Raises the head to `time` in place. A lower `time` leaves the
    /// head untouched: head times never move backward.
    ///
    /// A raised head can overtake the arrivals queued behind it; those
    /// entries are raised to the head value as they are passed, keeping
    /// the timeline ascending. The walk stops at the first entry that
    /// is already in order.
    pub fn bump_head_to(&mut self, time: Duration) {
        let Some(head) = self.entries.front_mut() else {
            return;
        };
        if time > *head {
            *head = time;
        }

        for i in 1..self.entries.len() {
            if self.entries[i] < self.entries[i - 1] {
                self.entries[i] = self.entries[i - 1];
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn empty() {
        let mut timeline = Timeline::new();

        assert!(timeline.is_empty());
        assert_eq!(timeline.len(), 0);
        assert_eq!(timeline.peek(), None);
        assert_eq!(timeline.pop_head(), None);

        // bumping an empty timeline is a no-op, not an error
        timeline.bump_head_to(MS);
        assert!(timeline.is_empty());
    }

    #[test]
    fn pop_in_order() {
        let mut timeline = Timeline::new();
        timeline.push(MS);
        timeline.push(2 * MS);
        timeline.push(4 * MS);

        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.peek(), Some(MS));
        assert_eq!(timeline.pop_head(), Some(MS));
        assert_eq!(timeline.pop_head(), Some(2 * MS));
        assert_eq!(timeline.pop_head(), Some(4 * MS));
        assert_eq!(timeline.pop_head(), None);
    }

    #[test]
    fn bump_raises_head() {
        let mut timeline = Timeline::new();
        timeline.push(MS);
        timeline.push(10 * MS);

        timeline.bump_head_to(3 * MS);
        assert_eq!(timeline.peek(), Some(3 * MS));
        // the tail entry was already in order and is untouched
        assert_eq!(timeline.pop_head(), Some(3 * MS));
        assert_eq!(timeline.peek(), Some(10 * MS));
    }

    #[test]
    fn bump_never_lowers_head() {
        let mut timeline = Timeline::new();
        timeline.push(5 * MS);

        timeline.bump_head_to(2 * MS);
        assert_eq!(timeline.peek(), Some(5 * MS));
    }

    #[test]
    fn bump_carries_overtaken_tail_forward() {
        let mut timeline = Timeline::new();
        timeline.push(MS);
        timeline.push(2 * MS);
        timeline.push(3 * MS);
        timeline.push(20 * MS);

        timeline.bump_head_to(8 * MS);

        // every overtaken entry is raised to the new head value
        assert_eq!(timeline.pop_head(), Some(8 * MS));
        assert_eq!(timeline.pop_head(), Some(8 * MS));
        assert_eq!(timeline.pop_head(), Some(8 * MS));
        assert_eq!(timeline.pop_head(), Some(20 * MS));
    }

    #[test]
    fn bump_to_equal_time_is_noop() {
        let mut timeline = Timeline::new();
        timeline.push(5 * MS);

        timeline.bump_head_to(5 * MS);
        assert_eq!(timeline.peek(), Some(5 * MS));
    }
}
