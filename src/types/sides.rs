//! Direction and boundary-face types with named fields.
//!
//! Provides strongly-typed identifiers for the three grid directions and
//! the six tile faces, eliminating the need to remember array index
//! conventions like `bc[0] = inner x1`.

use std::fmt;

/// A grid coordinate direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The x1 (i) direction.
    X1,
    /// The x2 (j) direction.
    X2,
    /// The x3 (k) direction.
    X3,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::X1 => write!(f, "x1"),
            Direction::X2 => write!(f, "x2"),
            Direction::X3 => write!(f, "x3"),
        }
    }
}

/// One of the six faces of a grid tile.
///
/// "Inner" is the low-coordinate side of a direction, "outer" the high
/// side, matching the `ix1`/`ox1` boundary-key naming.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundarySide {
    InnerX1,
    OuterX1,
    InnerX2,
    OuterX2,
    InnerX3,
    OuterX3,
}

impl BoundarySide {
    /// The direction this face is normal to.
    pub fn direction(self) -> Direction {
        match self {
            BoundarySide::InnerX1 | BoundarySide::OuterX1 => Direction::X1,
            BoundarySide::InnerX2 | BoundarySide::OuterX2 => Direction::X2,
            BoundarySide::InnerX3 | BoundarySide::OuterX3 => Direction::X3,
        }
    }

    /// Whether this is the low-coordinate face of its direction.
    pub fn is_inner(self) -> bool {
        matches!(
            self,
            BoundarySide::InnerX1 | BoundarySide::InnerX2 | BoundarySide::InnerX3
        )
    }
}

impl fmt::Display for BoundarySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BoundarySide::InnerX1 => "ix1",
            BoundarySide::OuterX1 => "ox1",
            BoundarySide::InnerX2 => "ix2",
            BoundarySide::OuterX2 => "ox2",
            BoundarySide::InnerX3 => "ix3",
            BoundarySide::OuterX3 => "ox3",
        };
        write!(f, "{}", name)
    }
}

/// Per-face values with named fields for each of the six tile faces.
///
/// # Example
///
/// ```
/// use ctu_rs::types::FaceBoundaries;
///
/// let flags = FaceBoundaries::uniform(4);
/// assert_eq!(flags.ix1, 4);
/// assert_eq!(flags.ox3, 4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceBoundaries<T> {
    /// Inner x1 face (x1 = min)
    pub ix1: T,
    /// Outer x1 face (x1 = max)
    pub ox1: T,
    /// Inner x2 face
    pub ix2: T,
    /// Outer x2 face
    pub ox2: T,
    /// Inner x3 face
    pub ix3: T,
    /// Outer x3 face
    pub ox3: T,
}

impl<T> FaceBoundaries<T> {
    /// Create with explicit named values, ordered (ix1, ox1, ix2, ox2, ix3, ox3).
    pub fn new(ix1: T, ox1: T, ix2: T, ox2: T, ix3: T, ox3: T) -> Self {
        Self {
            ix1,
            ox1,
            ix2,
            ox2,
            ix3,
            ox3,
        }
    }

    /// Create with the same value on all six faces.
    pub fn uniform(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            ix1: value.clone(),
            ox1: value.clone(),
            ix2: value.clone(),
            ox2: value.clone(),
            ix3: value.clone(),
            ox3: value,
        }
    }

    /// Map a function over all faces.
    pub fn map<U, F>(self, mut f: F) -> FaceBoundaries<U>
    where
        F: FnMut(T) -> U,
    {
        FaceBoundaries {
            ix1: f(self.ix1),
            ox1: f(self.ox1),
            ix2: f(self.ix2),
            ox2: f(self.ox2),
            ix3: f(self.ix3),
            ox3: f(self.ox3),
        }
    }

    /// Get a reference to the value on a face.
    pub fn get(&self, side: BoundarySide) -> &T {
        match side {
            BoundarySide::InnerX1 => &self.ix1,
            BoundarySide::OuterX1 => &self.ox1,
            BoundarySide::InnerX2 => &self.ix2,
            BoundarySide::OuterX2 => &self.ox2,
            BoundarySide::InnerX3 => &self.ix3,
            BoundarySide::OuterX3 => &self.ox3,
        }
    }

    /// Get a mutable reference to the value on a face.
    pub fn get_mut(&mut self, side: BoundarySide) -> &mut T {
        match side {
            BoundarySide::InnerX1 => &mut self.ix1,
            BoundarySide::OuterX1 => &mut self.ox1,
            BoundarySide::InnerX2 => &mut self.ix2,
            BoundarySide::OuterX2 => &mut self.ox2,
            BoundarySide::InnerX3 => &mut self.ix3,
            BoundarySide::OuterX3 => &mut self.ox3,
        }
    }

    /// Iterate over faces paired with their side identifier.
    pub fn iter(&self) -> impl Iterator<Item = (BoundarySide, &T)> {
        [
            (BoundarySide::InnerX1, &self.ix1),
            (BoundarySide::OuterX1, &self.ox1),
            (BoundarySide::InnerX2, &self.ix2),
            (BoundarySide::OuterX2, &self.ox2),
            (BoundarySide::InnerX3, &self.ix3),
            (BoundarySide::OuterX3, &self.ox3),
        ]
        .into_iter()
    }
}

impl<T: Default> Default for FaceBoundaries<T> {
    fn default() -> Self {
        Self {
            ix1: T::default(),
            ox1: T::default(),
            ix2: T::default(),
            ox2: T::default(),
            ix3: T::default(),
            ox3: T::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_boundaries_named_access() {
        let b = FaceBoundaries::new(1, 2, 3, 4, 5, 6);
        assert_eq!(*b.get(BoundarySide::InnerX1), 1);
        assert_eq!(*b.get(BoundarySide::OuterX2), 4);
        assert_eq!(*b.get(BoundarySide::OuterX3), 6);
    }

    #[test]
    fn test_face_boundaries_map() {
        let b = FaceBoundaries::uniform(2).map(|v: i32| v * 10);
        assert_eq!(b.ix2, 20);
        assert_eq!(b.ox1, 20);
    }

    #[test]
    fn test_side_direction() {
        assert_eq!(BoundarySide::InnerX2.direction(), Direction::X2);
        assert!(BoundarySide::InnerX3.is_inner());
        assert!(!BoundarySide::OuterX1.is_inner());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(BoundarySide::InnerX1.to_string(), "ix1");
        assert_eq!(BoundarySide::OuterX3.to_string(), "ox3");
        assert_eq!(Direction::X2.to_string(), "x2");
    }
}
