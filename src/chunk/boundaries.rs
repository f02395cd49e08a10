//! Break point detection for chunking

/// Priority levels for break points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BreakPriority {
    /// After any whitespace character (lowest)
    Whitespace = 1,
    /// After a blank line
    Paragraph = 2,
}

/// A potential chunk end, as an exclusive character index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakPoint {
    pub position: usize,
    pub priority: BreakPriority,
}

impl BreakPoint {
    pub fn new(position: usize, priority: BreakPriority) -> Self {
        Self { position, priority }
    }
}

/// Classify the chunk end `end` (exclusive) for a chunk starting at `start`.
fn classify(chars: &[char], start: usize, end: usize) -> Option<BreakPriority> {
    let last = *chars.get(end.checked_sub(1)?)?;
    if last == '\n' && end >= start + 2 && chars[end - 2] == '\n' {
        Some(BreakPriority::Paragraph)
    } else if last.is_whitespace() {
        Some(BreakPriority::Whitespace)
    } else {
        None
    }
}

/// Find the best chunk end in `lo..=hi`.
///
/// Higher priority wins; among equal priorities the latest position wins, so
/// chunks stay as close to the size limit as possible.
pub fn best_break(chars: &[char], start: usize, lo: usize, hi: usize) -> Option<BreakPoint> {
    (lo..=hi)
        .filter_map(|end| classify(chars, start, end).map(|p| BreakPoint::new(end, p)))
        .max_by_key(|p| p.priority)
}
