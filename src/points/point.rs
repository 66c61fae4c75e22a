use crate::timing::{Position, Second};

/// Opaque index of a point inside a [`PointSet`]. The one-past-the-end
/// value acts as a sentinel, like [`PointSet::end`].
///
/// [`PointSet`]: super::PointSet
/// [`PointSet::end`]: super::PointSet::end
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointIdx(pub(crate) usize);

impl PointIdx {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }

    /// The next index. Stepping past the sentinel is a caller bug and is
    /// caught by the accessors.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// One scoring event: a note head or a sustain tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub position: Position,
    pub hit_window_start: Position,
    pub hit_window_end: Position,
    /// For drums, the start of the fill that ends on this point.
    pub fill_start: Option<Second>,
    /// Score with the combo multiplier applied.
    pub value: u32,
    /// Score before the combo multiplier.
    pub base_value: u32,
    pub is_hold_point: bool,
    pub is_sp_granting_note: bool,
    pub is_unison_sp_ender: bool,
}
