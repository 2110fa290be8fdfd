//! Spatial navigation between value fields
//!
//! Fields are compared by their on-screen position. Up and down look for the
//! nearest field (squared distance) strictly above or below; left and right
//! stay on the same row and step to the horizontally adjacent field.

/// On-screen position of a field, in terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldPos
{
    pub x: i32,
    pub y: i32,
}

impl FieldPos
{
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self
    {
        Self { x, y }
    }

    /// Squared Euclidean distance to `other`.
    #[must_use]
    pub fn dist_sqr(self, other: FieldPos) -> i64
    {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }
}

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction
{
    Up,
    Down,
    Left,
    Right,
}

impl Direction
{
    /// Neighbor of `current` in this direction among `candidates`.
    pub fn neighbor<T, I>(self, candidates: I, current: FieldPos) -> Option<T>
    where
        I: IntoIterator<Item = (T, FieldPos)>,
    {
        match self {
            Direction::Up => up(candidates, current),
            Direction::Down => down(candidates, current),
            Direction::Left => left(candidates, current),
            Direction::Right => right(candidates, current),
        }
    }
}

/// Walk `candidates` and keep every one `is_better` prefers over the best so far.
///
/// `is_better(candidate, best, current)` sees `None` for `best` until a first
/// candidate was accepted. Ties keep the earlier candidate.
fn best_neighbor<T, I, F>(candidates: I, current: FieldPos, is_better: F) -> Option<T>
where
    I: IntoIterator<Item = (T, FieldPos)>,
    F: Fn(FieldPos, Option<FieldPos>, FieldPos) -> bool,
{
    let mut best: Option<(T, FieldPos)> = None;
    for (id, pos) in candidates {
        if is_better(pos, best.as_ref().map(|(_, p)| *p), current) {
            best = Some((id, pos));
        }
    }
    best.map(|(id, _)| id)
}

/// Nearest field strictly above `current`.
///
/// ## Example
///
/// ```rust
/// use regview_ui::navigation::{up, FieldPos};
///
/// let fields = [("a", FieldPos::new(0, -10)), ("b", FieldPos::new(30, -1))];
/// assert_eq!(up(fields, FieldPos::new(0, 0)), Some("a"));
/// assert_eq!(up(fields, FieldPos::new(0, -10)), None);
/// ```
pub fn up<T, I>(candidates: I, current: FieldPos) -> Option<T>
where
    I: IntoIterator<Item = (T, FieldPos)>,
{
    best_neighbor(candidates, current, |pos, best, cur| {
        pos.y < cur.y && best.is_none_or(|best| pos.dist_sqr(cur) < best.dist_sqr(cur))
    })
}

/// Nearest field strictly below `current`.
pub fn down<T, I>(candidates: I, current: FieldPos) -> Option<T>
where
    I: IntoIterator<Item = (T, FieldPos)>,
{
    best_neighbor(candidates, current, |pos, best, cur| {
        pos.y > cur.y && best.is_none_or(|best| pos.dist_sqr(cur) < best.dist_sqr(cur))
    })
}

/// Adjacent field to the left on the same row.
///
/// Narrows by x only: a candidate replaces the best so far when it lies
/// between it and `current`.
pub fn left<T, I>(candidates: I, current: FieldPos) -> Option<T>
where
    I: IntoIterator<Item = (T, FieldPos)>,
{
    best_neighbor(candidates, current, |pos, best, cur| {
        pos.y == cur.y && pos.x < cur.x && best.is_none_or(|best| best.x < pos.x)
    })
}

/// Adjacent field to the right on the same row.
pub fn right<T, I>(candidates: I, current: FieldPos) -> Option<T>
where
    I: IntoIterator<Item = (T, FieldPos)>,
{
    best_neighbor(candidates, current, |pos, best, cur| {
        pos.y == cur.y && pos.x > cur.x && best.is_none_or(|best| best.x > pos.x)
    })
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn cross() -> Vec<(&'static str, FieldPos)>
    {
        vec![
            ("self", FieldPos::new(0, 0)),
            ("up", FieldPos::new(0, -10)),
            ("down", FieldPos::new(0, 10)),
            ("left", FieldPos::new(-10, 0)),
            ("right", FieldPos::new(10, 0)),
        ]
    }

    #[test]
    fn test_cross_neighbors()
    {
        let origin = FieldPos::new(0, 0);
        assert_eq!(up(cross(), origin), Some("up"));
        assert_eq!(down(cross(), origin), Some("down"));
        assert_eq!(left(cross(), origin), Some("left"));
        assert_eq!(right(cross(), origin), Some("right"));
    }

    #[test]
    fn test_no_field_above()
    {
        let fields = vec![("self", FieldPos::new(0, 0)), ("beside", FieldPos::new(5, 0)), ("below", FieldPos::new(0, 3))];
        assert_eq!(up(fields, FieldPos::new(0, 0)), None);
    }

    #[test]
    fn test_up_prefers_nearest_and_first_on_tie()
    {
        let fields = vec![
            ("far", FieldPos::new(0, -5)),
            ("tie_a", FieldPos::new(-2, -1)),
            ("tie_b", FieldPos::new(2, -1)),
        ];
        assert_eq!(up(fields, FieldPos::new(0, 0)), Some("tie_a"));
    }

    #[test]
    fn test_left_right_need_same_row()
    {
        let fields = vec![("above_left", FieldPos::new(-1, -1)), ("below_right", FieldPos::new(1, 1))];
        assert_eq!(left(fields.clone(), FieldPos::new(0, 0)), None);
        assert_eq!(right(fields, FieldPos::new(0, 0)), None);
    }

    #[test]
    fn test_left_narrows_to_adjacent()
    {
        let fields = vec![
            ("a", FieldPos::new(0, 2)),
            ("c", FieldPos::new(20, 2)),
            ("b", FieldPos::new(10, 2)),
            ("d", FieldPos::new(30, 2)),
        ];
        let current = FieldPos::new(30, 2);
        assert_eq!(left(fields.clone(), current), Some("c"));
        assert_eq!(right(fields.clone(), FieldPos::new(0, 2)), Some("b"));
        assert_eq!(Direction::Right.neighbor(fields, current), None);
    }
}
