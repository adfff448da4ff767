//! Solid geometry and the packable capability contract.

use crate::error::{Error, Result};
use nalgebra::{Vector2, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier used to address a packed solid for later removal.
pub type SolidId = String;

/// Capability contract for box types offered to the packing engine.
///
/// Width and length are the footprint extents (x and y), height is the
/// vertical extent. Position coordinates are unset until the engine places
/// the solid. The description is an opaque pass-through with no packing
/// effect. Callers with their own box type implement this and convert via
/// [`Solid::from_packable`].
pub trait Packable {
    /// Returns the footprint extent along the x axis.
    fn width(&self) -> f64;

    /// Sets the footprint extent along the x axis.
    fn set_width(&mut self, width: f64);

    /// Returns the footprint extent along the y axis.
    fn length(&self) -> f64;

    /// Sets the footprint extent along the y axis.
    fn set_length(&mut self, length: f64);

    /// Returns the vertical extent.
    fn height(&self) -> f64;

    /// Sets the vertical extent.
    fn set_height(&mut self, height: f64);

    /// Returns the placed x coordinate, if any.
    fn x(&self) -> Option<f64>;

    /// Sets the placed x coordinate.
    fn set_x(&mut self, x: f64);

    /// Returns the placed y coordinate, if any.
    fn y(&self) -> Option<f64>;

    /// Sets the placed y coordinate.
    fn set_y(&mut self, y: f64);

    /// Returns the stable identity used for later removal, if any.
    fn id(&self) -> Option<&str>;

    /// Returns the opaque description, if any.
    fn description(&self) -> Option<&str>;

    /// Returns true if `other` fits within this footprint in either of the
    /// two vertical-axis orientations.
    ///
    /// Footprint-only; height compatibility is the caller's responsibility.
    fn can_contain_footprint<O: Packable + ?Sized>(&self, other: &O) -> bool {
        let (w, l) = (self.width(), self.length());
        let (ow, ol) = (other.width(), other.length());
        (w >= ow && l >= ol) || (w >= ol && l >= ow)
    }
}

/// An axis-aligned rectangular solid.
///
/// The engine also reuses `Solid` internally as a 2D free-rectangle
/// descriptor, in which case the height field is zero and unused and a
/// missing position means "origin undefined, treated as (0, 0)".
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Solid {
    /// Dimensions (width, length, height).
    dimensions: Vector3<f64>,

    /// Placement coordinates within the owning level, once placed.
    position: Option<Vector2<f64>>,

    /// Stable identity, used for later removal.
    id: Option<SolidId>,

    /// Opaque caller metadata; no packing effect.
    description: Option<String>,
}

impl Solid {
    /// Creates a new solid with the given dimensions.
    ///
    /// All dimensions must be greater than zero. The solid is stored in
    /// standard orientation (width >= length); the two footprint extents may
    /// therefore be swapped relative to the arguments. This is the rotation
    /// about the vertical axis the engine is allowed to apply anyway.
    pub fn new(width: f64, length: f64, height: f64) -> Result<Self> {
        if width <= 0.0 || length <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidDimensions(format!(
                "all dimensions must be greater than zero: {width}, {length}, {height}"
            )));
        }

        let mut solid = Self {
            dimensions: Vector3::new(width, length, height),
            position: None,
            id: None,
            description: None,
        };
        solid.apply_standard_orientation();
        Ok(solid)
    }

    /// Creates a solid from any packable value, carrying over identity,
    /// description and any already-assigned position.
    pub fn from_packable<P: Packable + ?Sized>(packable: &P) -> Result<Self> {
        let mut solid = Self::new(packable.width(), packable.length(), packable.height())?;
        solid.id = packable.id().map(str::to_owned);
        solid.description = packable.description().map(str::to_owned);
        if let (Some(x), Some(y)) = (packable.x(), packable.y()) {
            solid.position = Some(Vector2::new(x, y));
        }
        Ok(solid)
    }

    /// Creates a 2D free-rectangle descriptor. Height is zero and unused;
    /// width and length keep their axis meaning and are never reordered.
    pub(crate) fn area(width: f64, length: f64) -> Self {
        Self {
            dimensions: Vector3::new(width, length, 0.0),
            position: None,
            id: None,
            description: None,
        }
    }

    /// Pins an area descriptor to a corner offset within its parent.
    pub(crate) fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Vector2::new(x, y));
        self
    }

    /// Sets the identity.
    pub fn with_id(mut self, id: impl Into<SolidId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the dimensions (width, length, height).
    pub fn dimensions(&self) -> &Vector3<f64> {
        &self.dimensions
    }

    /// Returns the footprint area (width x length).
    pub fn footprint_area(&self) -> f64 {
        self.dimensions.x * self.dimensions.y
    }

    /// Returns the volume.
    pub fn volume(&self) -> f64 {
        self.dimensions.x * self.dimensions.y * self.dimensions.z
    }

    /// Rotates the solid about the vertical axis, swapping width and length.
    ///
    /// Used only before placement; positions are never adjusted.
    pub fn rotate_z(&mut self) {
        self.dimensions.swap_rows(0, 1);
    }

    /// Rotates into standard orientation (width >= length) if necessary.
    pub fn apply_standard_orientation(&mut self) {
        if self.dimensions.x < self.dimensions.y {
            self.rotate_z();
        }
    }
}

impl Packable for Solid {
    fn width(&self) -> f64 {
        self.dimensions.x
    }

    fn set_width(&mut self, width: f64) {
        self.dimensions.x = width;
    }

    fn length(&self) -> f64 {
        self.dimensions.y
    }

    fn set_length(&mut self, length: f64) {
        self.dimensions.y = length;
    }

    fn height(&self) -> f64 {
        self.dimensions.z
    }

    fn set_height(&mut self, height: f64) {
        self.dimensions.z = height;
    }

    fn x(&self) -> Option<f64> {
        self.position.map(|p| p.x)
    }

    fn set_x(&mut self, x: f64) {
        let mut position = self.position.unwrap_or_else(Vector2::zeros);
        position.x = x;
        self.position = Some(position);
    }

    fn y(&self) -> Option<f64> {
        self.position.map(|p| p.y)
    }

    fn set_y(&mut self, y: f64) {
        let mut position = self.position.unwrap_or_else(Vector2::zeros);
        position.y = y;
        self.position = Some(position);
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_orientation_on_construction() {
        let solid = Solid::new(3.0, 7.0, 2.0).unwrap();
        assert_eq!(solid.width(), 7.0);
        assert_eq!(solid.length(), 3.0);
        assert_eq!(solid.height(), 2.0);
    }

    #[test]
    fn test_validation() {
        assert!(Solid::new(1.0, 1.0, 1.0).is_ok());
        assert!(Solid::new(0.0, 1.0, 1.0).is_err());
        assert!(Solid::new(1.0, -2.0, 1.0).is_err());
        assert!(Solid::new(1.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_rotate_z() {
        let mut solid = Solid::new(7.0, 3.0, 2.0).unwrap();
        solid.rotate_z();
        assert_eq!(solid.width(), 3.0);
        assert_eq!(solid.length(), 7.0);
        assert_eq!(solid.height(), 2.0);
    }

    #[test]
    fn test_volume() {
        let solid = Solid::new(10.0, 20.0, 30.0).unwrap();
        assert_relative_eq!(solid.volume(), 6000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_can_contain_footprint_either_orientation() {
        let area = Solid::area(5.0, 10.0);
        let fits_direct = Solid::new(4.0, 4.0, 1.0).unwrap();
        let fits_rotated = Solid::area(4.0, 6.0);
        let too_big = Solid::area(6.0, 6.0);

        assert!(area.can_contain_footprint(&fits_direct));
        assert!(area.can_contain_footprint(&fits_rotated));
        assert!(!area.can_contain_footprint(&too_big));
    }

    #[test]
    fn test_exact_footprint_match_fits() {
        let area = Solid::area(5.0, 5.0);
        let exact = Solid::new(5.0, 5.0, 1.0).unwrap();
        assert!(area.can_contain_footprint(&exact));
    }

    #[test]
    fn test_position_assignment() {
        let mut solid = Solid::new(2.0, 2.0, 2.0).unwrap();
        assert_eq!(solid.x(), None);
        solid.set_x(3.0);
        solid.set_y(4.0);
        assert_eq!(solid.x(), Some(3.0));
        assert_eq!(solid.y(), Some(4.0));
    }

    #[test]
    fn test_from_packable_carries_metadata() {
        let original = Solid::new(2.0, 3.0, 4.0)
            .unwrap()
            .with_id("crate-1")
            .with_description("glassware");

        let copy = Solid::from_packable(&original).unwrap();
        assert_eq!(copy.id(), Some("crate-1"));
        assert_eq!(copy.description(), Some("glassware"));
        assert_eq!(copy.width(), 3.0);
        assert_eq!(copy.length(), 2.0);
    }
}
