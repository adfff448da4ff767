//! The 3D container: a stack of packing levels.

use std::collections::HashMap;
use std::mem;

use nalgebra::Vector3;

use crate::error::{Error, Result};
use crate::level::Level;
use crate::placement::Placement;
use crate::solid::Solid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 3D rectangular volume that packs solids into a stack of horizontal
/// levels.
///
/// Solids are offered to already-completed levels first (filling gaps in
/// earlier, shorter levels before growing the stack), then to the open top
/// level; a refused top level with contents is frozen and replaced by a
/// fresh one. Containers also appear *inside* levels as nested sub-volumes
/// carved from leftover footprint and headroom, packed recursively by the
/// same algorithm.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Container {
    /// Dimensions (width, length, height). Immutable after construction.
    dimensions: Vector3<f64>,

    /// Corner offset within the parent level for nested sub-containers;
    /// zero for a root container.
    origin: Vector3<f64>,

    /// Completed levels, in the order they were frozen.
    lower_levels: Vec<Level>,

    /// The open level new solids stack onto.
    top_level: Level,

    /// Human-readable description; no packing effect.
    description: Option<String>,

    /// Free-form caller annotations; no packing effect.
    attributes: HashMap<String, String>,
}

impl Container {
    /// Creates an empty container with the given dimensions.
    ///
    /// All dimensions must be greater than zero.
    pub fn new(width: f64, length: f64, height: f64) -> Result<Self> {
        if width <= 0.0 || length <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidDimensions(format!(
                "all container dimensions must be greater than zero: {width}, {length}, {height}"
            )));
        }
        Ok(Self::build(width, length, height, Vector3::zeros()))
    }

    /// Creates a nested sub-container at a corner offset within its parent
    /// level. Dimensions come from an existing solid or free rectangle, so
    /// they are already validated.
    pub(crate) fn nested(width: f64, length: f64, height: f64, origin: Vector3<f64>) -> Self {
        Self::build(width, length, height, origin)
    }

    fn build(width: f64, length: f64, height: f64, origin: Vector3<f64>) -> Self {
        Self {
            dimensions: Vector3::new(width, length, height),
            origin,
            lower_levels: Vec::new(),
            top_level: Level::with_footprint(width, length),
            description: None,
            attributes: HashMap::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the footprint extent along the x axis.
    pub fn width(&self) -> f64 {
        self.dimensions.x
    }

    /// Returns the footprint extent along the y axis.
    pub fn length(&self) -> f64 {
        self.dimensions.y
    }

    /// Returns the vertical capacity.
    pub fn height(&self) -> f64 {
        self.dimensions.z
    }

    /// Returns the dimensions (width, length, height).
    pub fn dimensions(&self) -> &Vector3<f64> {
        &self.dimensions
    }

    /// Returns the corner offset within the parent level; zero for a root
    /// container.
    pub(crate) fn origin(&self) -> Vector3<f64> {
        self.origin
    }

    /// Returns the description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Attempts to place a solid in this container.
    ///
    /// Returns `Ok(true)` when the solid was placed and the total occupied
    /// height still fits the container, `Ok(false)` otherwise. The height
    /// check runs *after* insertion: a solid can be physically placed even
    /// when this call reports failure, so a `false` result with a grown
    /// [`contents_count`](Self::contents_count) means "the container is now
    /// over-capacity", not "nothing was placed". The engine provides no
    /// automatic rollback; callers wanting to undo give the solid an
    /// identity and call [`remove_solid`](Self::remove_solid).
    pub fn add_solid(&mut self, solid: Solid) -> Result<bool> {
        match self.try_add(solid)? {
            Some(_rejected) => Ok(false),
            None => Ok(self.contents_total_height() <= self.height()),
        }
    }

    /// Placement without the height verdict: `Ok(None)` when placed,
    /// `Ok(Some(solid))` handing the solid back when no level can take it.
    fn try_add(&mut self, solid: Solid) -> Result<Option<Solid>> {
        let mut solid = solid;
        for level in &mut self.lower_levels {
            match level.add_solid(solid)? {
                None => return Ok(None),
                Some(returned) => solid = returned,
            }
        }

        match self.top_level.add_solid(solid)? {
            None => Ok(None),
            Some(returned) => {
                if self.top_level.contents_count() == 0 {
                    // The footprint itself cannot take this solid under any
                    // stacking.
                    return Ok(Some(returned));
                }

                self.add_new_level();
                self.top_level.add_solid(returned)
            }
        }
    }

    /// Height-gated insertion used when a level delegates to its nested
    /// sub-containers: the placement commits only if the occupied height
    /// stays within this container's capacity, otherwise the solid is handed
    /// back untouched and the container is left unchanged.
    ///
    /// The attempt runs on a clone because a placement can raise a lower
    /// level's max height as a side effect; there is no cheaper way to know
    /// the resulting height without performing the insertion.
    pub(crate) fn add_within_height(&mut self, solid: Solid) -> Result<Option<Solid>> {
        let snapshot = solid.clone();
        let mut trial = self.clone();
        match trial.try_add(solid)? {
            Some(rejected) => Ok(Some(rejected)),
            None if trial.contents_total_height() <= trial.height() => {
                *self = trial;
                Ok(None)
            }
            None => Ok(Some(snapshot)),
        }
    }

    /// Removes a solid by identity from whichever level holds it, directly
    /// or in a nested sub-container. The owning level repacks on success.
    pub fn remove_solid(&mut self, id: &str) -> Result<bool> {
        for level in &mut self.lower_levels {
            if level.remove_solid(id)? {
                return Ok(true);
            }
        }
        self.top_level.remove_solid(id)
    }

    /// Freezes the open top level and starts a fresh one sized to the
    /// container's footprint.
    pub fn add_new_level(&mut self) {
        let fresh = Level::with_footprint(self.width(), self.length());
        let frozen = mem::replace(&mut self.top_level, fresh);
        self.lower_levels.push(frozen);
    }

    /// Sorts completed levels by ascending max height. Never invoked
    /// automatically; placement order over completed levels follows whatever
    /// order the caller has established.
    pub fn sort_lower_levels(&mut self) {
        self.lower_levels
            .sort_by(|a, b| a.contents_max_height().total_cmp(&b.contents_max_height()));
    }

    /// Returns all levels, completed ones first, the open top level last.
    pub fn levels(&self) -> Vec<&Level> {
        let mut levels: Vec<&Level> = self.lower_levels.iter().collect();
        levels.push(&self.top_level);
        levels
    }

    /// Returns how many solids this container holds across all levels.
    pub fn contents_count(&self) -> usize {
        self.levels().iter().map(|level| level.contents_count()).sum()
    }

    /// Returns every solid held in this container, level by level.
    pub fn contents(&self) -> Vec<&Solid> {
        self.levels()
            .iter()
            .flat_map(|level| level.contents())
            .collect()
    }

    /// Returns the total occupied height: the sum of every level's max
    /// height, computed from the levels' current state.
    pub fn contents_total_height(&self) -> f64 {
        self.levels()
            .iter()
            .map(|level| level.contents_max_height())
            .sum()
    }

    /// Returns every held solid as a placement in coordinates relative to
    /// this container's own corner, flattening nested sub-containers.
    pub fn placements(&self) -> Vec<Placement> {
        let mut out = Vec::new();
        self.collect_placements(Vector3::zeros(), &mut out);
        out
    }

    /// Appends placements with `origin` as this container's absolute corner.
    pub(crate) fn collect_placements(&self, origin: Vector3<f64>, out: &mut Vec<Placement>) {
        let mut base = origin;
        for level in &self.lower_levels {
            level.collect_placements(base, out);
            base.z += level.contents_max_height();
        }
        self.top_level.collect_placements(base, out);
    }

    /// Drains every solid held in this container, level by level.
    pub(crate) fn into_contents(self) -> Vec<Solid> {
        let mut contents: Vec<Solid> = Vec::new();
        for level in self.lower_levels {
            contents.extend(level.into_contents());
        }
        contents.extend(self.top_level.into_contents());
        contents
    }

    /// Empties the container back to its initial state.
    pub fn reset(&mut self) {
        self.lower_levels.clear();
        self.top_level = Level::with_footprint(self.width(), self.length());
    }

    /// Returns the annotation stored under `key`, if any.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Stores a free-form annotation. No packing effect.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Returns all annotations.
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: f64, l: f64, h: f64) -> Solid {
        Solid::new(w, l, h).unwrap()
    }

    #[test]
    fn test_construction_validation() {
        assert!(Container::new(10.0, 10.0, 10.0).is_ok());
        assert!(Container::new(0.0, 10.0, 10.0).is_err());
        assert!(Container::new(10.0, -1.0, 10.0).is_err());
        assert!(Container::new(10.0, 10.0, 0.0).is_err());
    }

    #[test]
    fn test_refusal_keeps_container_empty() {
        let mut container = Container::new(5.0, 5.0, 5.0).unwrap();
        assert!(!container.add_solid(solid(6.0, 6.0, 1.0)).unwrap());
        assert_eq!(container.contents_count(), 0);
        assert_eq!(container.levels().len(), 1);
    }

    #[test]
    fn test_stacking_opens_new_level() {
        let mut container = Container::new(5.0, 5.0, 10.0).unwrap();
        assert!(container.add_solid(solid(5.0, 5.0, 4.0)).unwrap());
        assert!(container.add_solid(solid(5.0, 5.0, 4.0)).unwrap());

        assert_eq!(container.levels().len(), 2);
        assert_eq!(container.contents_total_height(), 8.0);
    }

    #[test]
    fn test_over_height_places_but_reports_failure() {
        let mut container = Container::new(5.0, 5.0, 4.0).unwrap();
        assert!(container.add_solid(solid(5.0, 5.0, 3.0)).unwrap());
        assert!(!container.add_solid(solid(5.0, 5.0, 3.0)).unwrap());

        // Placed despite the failure report.
        assert_eq!(container.contents_count(), 2);
        assert_eq!(container.contents_total_height(), 6.0);
    }

    #[test]
    fn test_gap_filling_prefers_completed_levels() {
        let mut container = Container::new(10.0, 10.0, 12.0).unwrap();
        assert!(container.add_solid(solid(4.0, 4.0, 4.0)).unwrap());
        // Too large for the first level's leftovers; opens a second level.
        assert!(container.add_solid(solid(10.0, 10.0, 5.0)).unwrap());
        assert_eq!(container.levels().len(), 2);

        // Fits in the first level's leftover footprint, not on top.
        assert!(container
            .add_solid(solid(4.0, 4.0, 3.0).with_id("gap"))
            .unwrap());
        assert_eq!(container.contents_count(), 3);
        assert_eq!(container.contents_total_height(), 9.0);

        let placements = container.placements();
        let gap = placements
            .iter()
            .find(|p| p.id.as_deref() == Some("gap"))
            .unwrap();
        assert_eq!(gap.position.z, 0.0);
    }

    #[test]
    fn test_sort_lower_levels() {
        let mut container = Container::new(10.0, 10.0, 30.0).unwrap();
        assert!(container.add_solid(solid(10.0, 10.0, 5.0)).unwrap());
        assert!(container.add_solid(solid(10.0, 10.0, 2.0)).unwrap());
        assert!(container.add_solid(solid(10.0, 10.0, 7.0)).unwrap());

        container.sort_lower_levels();
        let heights: Vec<f64> = container
            .levels()
            .iter()
            .map(|level| level.contents_max_height())
            .collect();
        assert_eq!(heights, vec![2.0, 5.0, 7.0]);
    }

    #[test]
    fn test_remove_solid_and_re_add() {
        let mut container = Container::new(10.0, 10.0, 10.0).unwrap();
        for id in ["a", "b", "c"] {
            assert!(container.add_solid(solid(4.0, 4.0, 2.0).with_id(id)).unwrap());
        }
        assert_eq!(container.contents_count(), 3);

        assert!(container.remove_solid("b").unwrap());
        assert_eq!(container.contents_count(), 2);
        assert!(!container.remove_solid("b").unwrap());

        assert!(container.add_solid(solid(4.0, 4.0, 2.0).with_id("b")).unwrap());
        assert_eq!(container.contents_count(), 3);
    }

    #[test]
    fn test_reset() {
        let mut container = Container::new(10.0, 10.0, 10.0).unwrap();
        assert!(container.add_solid(solid(10.0, 10.0, 4.0)).unwrap());
        assert!(container.add_solid(solid(10.0, 10.0, 4.0)).unwrap());

        container.reset();
        assert_eq!(container.contents_count(), 0);
        assert_eq!(container.levels().len(), 1);
        assert_eq!(container.contents_total_height(), 0.0);
    }

    #[test]
    fn test_description_and_attributes() {
        let mut container = Container::new(5.0, 5.0, 5.0)
            .unwrap()
            .with_description("pallet A");
        container.set_attribute("dock", "7");

        assert_eq!(container.description(), Some("pallet A"));
        assert_eq!(container.attribute("dock"), Some("7"));
        assert!(container.attribute("missing").is_none());
    }
}
