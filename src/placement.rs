//! Absolute-coordinate placement reports.

use crate::solid::SolidId;
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A placed solid reported in coordinates absolute to the root container.
///
/// Positions stored on solids themselves are relative to the level or nested
/// sub-container that holds them; [`Container::placements`] flattens the
/// whole tree into these.
///
/// [`Container::placements`]: crate::Container::placements
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    /// Identity of the placed solid, if it has one.
    pub id: Option<SolidId>,

    /// Position of the solid's corner (x, y, z) within the root container.
    pub position: Vector3<f64>,

    /// Dimensions as placed (width, length, height); width and length
    /// reflect any vertical-axis rotation applied during packing.
    pub dimensions: Vector3<f64>,
}

impl Placement {
    /// Returns the far corner (position + dimensions).
    pub fn max_corner(&self) -> Vector3<f64> {
        self.position + self.dimensions
    }

    /// Returns true if the two placements occupy intersecting volumes.
    pub fn intersects(&self, other: &Placement) -> bool {
        let a_max = self.max_corner();
        let b_max = other.max_corner();
        (0..3).all(|i| self.position[i] < b_max[i] && other.position[i] < a_max[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(pos: [f64; 3], dims: [f64; 3]) -> Placement {
        Placement {
            id: None,
            position: Vector3::from(pos),
            dimensions: Vector3::from(dims),
        }
    }

    #[test]
    fn test_intersects() {
        let a = placement([0.0, 0.0, 0.0], [4.0, 4.0, 4.0]);
        let b = placement([2.0, 2.0, 2.0], [4.0, 4.0, 4.0]);
        let c = placement([4.0, 0.0, 0.0], [4.0, 4.0, 4.0]);

        assert!(a.intersects(&b));
        // Shared face only; half-open extents do not intersect.
        assert!(!a.intersects(&c));
    }
}
