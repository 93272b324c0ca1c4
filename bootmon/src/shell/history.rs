// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command history.

use super::Line;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Number of remembered lines. Once full, the oldest entry is overwritten.
pub const HISTORY_DEPTH: usize = 8;

/// Outcome of browsing one step towards newer entries.
#[derive(Debug, PartialEq, Eq)]
pub enum Recalled {
    /// Not browsing; nothing changes.
    Inactive,

    /// Browsing stepped past the newest entry; the line is cleared and browsing ends.
    Cleared,

    /// The cursor moved onto this entry.
    Entry(Line),
}

/// Fixed-depth ring of previously accepted command lines with a browsing cursor.
pub struct HistoryRing {
    entries: [Line; HISTORY_DEPTH],
    head: usize,
    count: usize,

    /// `None` means "not browsing".
    cursor: Option<usize>,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl HistoryRing {
    /// Create an instance.
    pub const fn new() -> Self {
        const EMPTY: Line = Line::new();

        Self {
            entries: [EMPTY; HISTORY_DEPTH],
            head: 0,
            count: 0,
            cursor: None,
        }
    }

    /// Store an accepted line and end any active browsing. Empty lines are not recorded.
    pub fn record(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }

        self.entries[self.head].clear();
        // Cannot fail; slots and the line buffer share the same capacity.
        let _ = self.entries[self.head].push_str(line);

        self.head = (self.head + 1) % HISTORY_DEPTH;
        if self.count < HISTORY_DEPTH {
            self.count += 1;
        }

        self.cursor = None;
    }

    /// Step to the next-older entry and return a copy of it.
    ///
    /// Starts at the most recent entry when not yet browsing. Clamps at the oldest valid entry;
    /// repeated calls there keep returning it rather than wrapping around to the newest.
    pub fn recall_previous(&mut self) -> Option<Line> {
        if self.count == 0 {
            return None;
        }

        let next = match self.cursor {
            None => (self.head + HISTORY_DEPTH - 1) % HISTORY_DEPTH,
            Some(current) => {
                let oldest = (self.head + HISTORY_DEPTH - self.count) % HISTORY_DEPTH;
                if current == oldest {
                    current
                } else {
                    (current + HISTORY_DEPTH - 1) % HISTORY_DEPTH
                }
            }
        };

        self.cursor = Some(next);
        Some(self.entries[next].clone())
    }

    /// Step to the next-newer entry.
    ///
    /// Advancing from the newest entry reaches the insertion point, which ends browsing and
    /// reports [`Recalled::Cleared`].
    pub fn recall_next(&mut self) -> Recalled {
        let Some(current) = self.cursor else {
            return Recalled::Inactive;
        };

        let next = (current + 1) % HISTORY_DEPTH;
        if next == self.head {
            self.cursor = None;
            return Recalled::Cleared;
        }

        self.cursor = Some(next);
        Recalled::Entry(self.entries[next].clone())
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded(lines: &[&str]) -> HistoryRing {
        let mut ring = HistoryRing::new();
        for line in lines {
            ring.record(line);
        }
        ring
    }

    #[test]
    fn round_trip_record_then_recall() {
        let mut ring = recorded(&["load_sd 10 896"]);

        let entry = ring.recall_previous().unwrap();
        assert_eq!(entry.as_str(), "load_sd 10 896");
    }

    #[test]
    fn empty_lines_are_not_recorded() {
        let mut ring = recorded(&[""]);

        assert_eq!(ring.recall_previous(), None);
    }

    #[test]
    fn previous_clamps_at_the_oldest_entry() {
        let mut ring = recorded(&["one", "two", "three"]);

        // Browse past the oldest entry by a wide margin.
        for _ in 0..10 {
            ring.recall_previous();
        }

        // Still clamped at the oldest; no wrap-around to the newest.
        assert_eq!(ring.recall_previous().unwrap().as_str(), "one");
    }

    #[test]
    fn next_past_the_newest_clears_and_ends_browsing() {
        let mut ring = recorded(&["one", "two"]);

        ring.recall_previous(); // "two"
        assert_eq!(ring.recall_next(), Recalled::Cleared);

        // Browsing has ended.
        assert_eq!(ring.recall_next(), Recalled::Inactive);
    }

    #[test]
    fn next_without_browsing_is_inert() {
        let mut ring = recorded(&["one"]);

        assert_eq!(ring.recall_next(), Recalled::Inactive);
    }

    #[test]
    fn browsing_walks_older_then_newer() {
        let mut ring = recorded(&["one", "two", "three"]);

        assert_eq!(ring.recall_previous().unwrap().as_str(), "three");
        assert_eq!(ring.recall_previous().unwrap().as_str(), "two");

        match ring.recall_next() {
            Recalled::Entry(entry) => assert_eq!(entry.as_str(), "three"),
            other => panic!("unexpected recall outcome: {:?}", other),
        }
    }

    #[test]
    fn overflow_overwrites_the_oldest_entry() {
        let labels = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];
        let mut ring = recorded(&labels);

        // Depth is 8; "a" and "b" have been overwritten. The oldest reachable entry is "c".
        for _ in 0..20 {
            ring.recall_previous();
        }
        assert_eq!(ring.recall_previous().unwrap().as_str(), "c");
    }

    #[test]
    fn record_resets_the_browsing_cursor() {
        let mut ring = recorded(&["one", "two"]);

        ring.recall_previous();
        ring.record("three");

        // Cursor was reset; previous starts at the newest entry again.
        assert_eq!(ring.recall_previous().unwrap().as_str(), "three");
    }
}
