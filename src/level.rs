//! The 2D layer packer: free-rectangle splitting and nested sub-volumes.

use std::collections::HashMap;
use std::mem;

use nalgebra::Vector3;

use crate::container::Container;
use crate::error::{Error, Result};
use crate::placement::Placement;
use crate::solid::{Packable, Solid};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Placement state of a level.
///
/// A level starts out placing solids directly into free rectangles. Once
/// direct space is exhausted it converts the remaining footprint and the
/// headroom above shorter solids into nested sub-containers and delegates to
/// them. The two modes are mutually exclusive; the transition is one-way for
/// the level's lifetime until a repack resets it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
enum LevelState {
    /// Free rectangles available for direct placement, sorted smallest
    /// footprint first.
    Spaces(Vec<Solid>),

    /// Nested sub-containers carved from leftover footprint and headroom,
    /// sorted smallest footprint first.
    Containers(Vec<Container>),
}

/// A horizontal packing layer spanning a container's full footprint at one
/// height band.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Level {
    width: f64,
    length: f64,

    /// Tallest solid held so far, directly or within any nested
    /// sub-container. Monotonically non-decreasing until a repack.
    contents_max_height: f64,

    /// Directly placed solids, in insertion order.
    packed: Vec<Solid>,

    state: LevelState,

    /// Free-form caller annotations; no packing effect.
    attributes: HashMap<String, String>,
}

impl Level {
    /// Creates an empty level with the given footprint.
    pub fn new(width: f64, length: f64) -> Result<Self> {
        if width <= 0.0 || length <= 0.0 {
            return Err(Error::InvalidDimensions(format!(
                "level footprint extents must be greater than zero: {width}, {length}"
            )));
        }
        Ok(Self::with_footprint(width, length))
    }

    /// Non-validating factory for footprints already checked by the owning
    /// container.
    pub(crate) fn with_footprint(width: f64, length: f64) -> Self {
        Self {
            width,
            length,
            contents_max_height: 0.0,
            packed: Vec::new(),
            state: LevelState::Spaces(vec![Solid::area(width, length)]),
            attributes: HashMap::new(),
        }
    }

    /// Returns the footprint extent along the x axis.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Returns the footprint extent along the y axis.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Returns the height of the tallest solid held anywhere on this level.
    pub fn contents_max_height(&self) -> f64 {
        self.contents_max_height
    }

    /// Returns the remaining free rectangles; empty once the level has
    /// converted to nested sub-containers.
    pub fn spaces(&self) -> &[Solid] {
        match &self.state {
            LevelState::Spaces(spaces) => spaces,
            LevelState::Containers(_) => &[],
        }
    }

    /// Returns the nested sub-containers; empty while the level still places
    /// solids directly.
    pub fn sub_containers(&self) -> &[Container] {
        match &self.state {
            LevelState::Spaces(_) => &[],
            LevelState::Containers(containers) => containers,
        }
    }

    /// Attempts to place a solid on this level.
    ///
    /// Returns `Ok(None)` when the solid was placed, or `Ok(Some(solid))`
    /// handing the solid back untouched when it cannot fit anywhere on the
    /// level.
    pub fn add_solid(&mut self, solid: Solid) -> Result<Option<Solid>> {
        match &mut self.state {
            LevelState::Containers(containers) => {
                let mut solid = solid;
                for container in containers.iter_mut() {
                    match container.add_within_height(solid)? {
                        None => return Ok(None),
                        Some(returned) => solid = returned,
                    }
                }
                Ok(Some(solid))
            }
            LevelState::Spaces(_) => self.add_to_spaces(solid),
        }
    }

    /// Removes a solid by identity, searching this level and every nested
    /// sub-container below it.
    ///
    /// On success the level repacks from scratch: all held solids are
    /// flattened, the level resets to a single full-footprint free rectangle
    /// and every solid is reinserted in its prior relative order. Placement
    /// coordinates may change as a result. A solid that no longer fits during
    /// the repack is dropped with a warning, leaving the level
    /// self-consistent.
    pub fn remove_solid(&mut self, id: &str) -> Result<bool> {
        if let Some(index) = self.packed.iter().position(|s| s.id() == Some(id)) {
            self.packed.remove(index);
            self.repack()?;
            return Ok(true);
        }

        let mut found = false;
        if let LevelState::Containers(containers) = &mut self.state {
            for container in containers.iter_mut() {
                if container.remove_solid(id)? {
                    found = true;
                    break;
                }
            }
        }

        if found {
            self.repack()?;
        }
        Ok(found)
    }

    /// Returns how many solids this level holds, including solids inside
    /// nested sub-containers.
    pub fn contents_count(&self) -> usize {
        let nested: usize = match &self.state {
            LevelState::Spaces(_) => 0,
            LevelState::Containers(containers) => {
                containers.iter().map(Container::contents_count).sum()
            }
        };
        self.packed.len() + nested
    }

    /// Returns every solid held on this level, direct placements first, then
    /// nested sub-containers in their sorted order.
    pub fn contents(&self) -> Vec<&Solid> {
        let mut contents: Vec<&Solid> = self.packed.iter().collect();
        if let LevelState::Containers(containers) = &self.state {
            for container in containers {
                contents.extend(container.contents());
            }
        }
        contents
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

    /// Drains every solid held on this level, in the same order as
    /// [`Level::contents`].
    pub(crate) fn into_contents(self) -> Vec<Solid> {
        let mut contents = self.packed;
        if let LevelState::Containers(containers) = self.state {
            for container in containers {
                contents.extend(container.into_contents());
            }
        }
        contents
    }

    /// Appends absolute-coordinate placements for everything on this level.
    /// `origin` is the level's own corner within the root container.
    pub(crate) fn collect_placements(&self, origin: Vector3<f64>, out: &mut Vec<Placement>) {
        for solid in &self.packed {
            out.push(Placement {
                id: solid.id().map(str::to_owned),
                position: origin
                    + Vector3::new(solid.x().unwrap_or(0.0), solid.y().unwrap_or(0.0), 0.0),
                dimensions: *solid.dimensions(),
            });
        }
        if let LevelState::Containers(containers) = &self.state {
            for container in containers {
                container.collect_placements(origin + container.origin(), out);
            }
        }
    }

    /// Space-mode placement: first-fit scan of the sorted free rectangles,
    /// converting to container mode once direct space is exhausted.
    fn add_to_spaces(&mut self, mut solid: Solid) -> Result<Option<Solid>> {
        let Some(index) = self.smallest_viable_space(&solid) else {
            if self.packed.is_empty() {
                // Nothing placed yet, so the footprint itself cannot take
                // this solid under any stacking.
                return Ok(Some(solid));
            }

            self.init_containers();
            if self.sub_containers().is_empty() {
                return Ok(Some(solid));
            }
            return self.add_solid(solid);
        };

        // Standard orientation (width >= length) keeps the split's rotation
        // heuristic safe. Applied only once placement is certain; a rejected
        // solid goes back with the caller's orientation intact.
        solid.apply_standard_orientation();

        self.contents_max_height = self.contents_max_height.max(solid.height());
        self.place_in_space(solid, index)?;
        Ok(None)
    }

    /// Returns the index of the first free rectangle that can take the
    /// solid's footprint. Spaces are kept sorted by ascending width, ties by
    /// ascending length, so the first hit is the smallest viable space.
    fn smallest_viable_space(&self, solid: &Solid) -> Option<usize> {
        match &self.state {
            LevelState::Spaces(spaces) => spaces
                .iter()
                .position(|space| space.can_contain_footprint(solid)),
            LevelState::Containers(_) => None,
        }
    }

    /// Places the solid into the free rectangle at `index`, replacing the
    /// rectangle with the 0-2 remainders of the guillotine split.
    fn place_in_space(&mut self, mut solid: Solid, index: usize) -> Result<()> {
        let LevelState::Spaces(spaces) = &mut self.state else {
            return Err(Error::Internal(
                "direct placement attempted in container mode".into(),
            ));
        };

        let space = spaces.remove(index);
        let remainders = split_space(&mut solid, &space)?;
        spaces.extend(remainders);
        sort_smallest_footprint_first(spaces, |s| (s.width(), s.length()));

        solid.set_x(space.x().unwrap_or(0.0));
        solid.set_y(space.y().unwrap_or(0.0));
        self.packed.push(solid);
        Ok(())
    }

    /// Converts the level to container mode, permanently discarding direct
    /// placement: the headroom above every shorter packed solid and every
    /// remaining free rectangle becomes a nested sub-container.
    fn init_containers(&mut self) {
        let max_height = self.contents_max_height;
        let mut containers = Vec::new();

        for solid in &self.packed {
            let headroom = max_height - solid.height();
            if headroom > 0.0 {
                containers.push(Container::nested(
                    solid.width(),
                    solid.length(),
                    headroom,
                    Vector3::new(
                        solid.x().unwrap_or(0.0),
                        solid.y().unwrap_or(0.0),
                        solid.height(),
                    ),
                ));
            }
        }

        if let LevelState::Spaces(spaces) = &self.state {
            for space in spaces {
                containers.push(Container::nested(
                    space.width(),
                    space.length(),
                    max_height,
                    Vector3::new(space.x().unwrap_or(0.0), space.y().unwrap_or(0.0), 0.0),
                ));
            }
        }

        sort_smallest_footprint_first(&mut containers, |c| (c.width(), c.length()));
        log::debug!(
            "level {}x{} converted to {} nested sub-container(s)",
            self.width,
            self.length,
            containers.len()
        );
        self.state = LevelState::Containers(containers);
    }

    /// Flattens all held solids and reinserts them from scratch in their
    /// prior relative order.
    fn repack(&mut self) -> Result<()> {
        let full_footprint = LevelState::Spaces(vec![Solid::area(self.width, self.length)]);
        let state = mem::replace(&mut self.state, full_footprint);

        let mut items = mem::take(&mut self.packed);
        if let LevelState::Containers(containers) = state {
            for container in containers {
                items.extend(container.into_contents());
            }
        }
        self.contents_max_height = 0.0;

        for solid in items {
            if let Some(dropped) = self.add_solid(solid)? {
                log::warn!(
                    "repack dropped a {}x{}x{} solid (id: {:?}) that no longer fits",
                    dropped.width(),
                    dropped.length(),
                    dropped.height(),
                    dropped.id()
                );
            }
        }
        Ok(())
    }
}

/// Sorts by ascending width, ties broken by ascending length.
fn sort_smallest_footprint_first<T>(items: &mut [T], footprint: impl Fn(&T) -> (f64, f64)) {
    items.sort_by(|a, b| {
        let (aw, al) = footprint(a);
        let (bw, bl) = footprint(b);
        aw.total_cmp(&bw).then(al.total_cmp(&bl))
    });
}

/// Guillotine split: places `item` into a corner of `area` and returns the
/// 0-2 rectangles tiling the leftover, positioned relative to the area's own
/// corner offset.
///
/// The item is rotated about the vertical axis when its width fits against
/// the area's length; aligning the item's longer edge with the area's longer
/// edge leaves one larger contiguous remainder instead of two slivers. The
/// caller must have verified the footprint fits.
fn split_space(item: &mut Solid, area: &Solid) -> Result<Vec<Solid>> {
    if !area.can_contain_footprint(item) {
        return Err(Error::Internal(format!(
            "split requested for a {}x{} item in a {}x{} space",
            item.width(),
            item.length(),
            area.width(),
            area.length()
        )));
    }

    if item.width() <= area.length() {
        item.rotate_z();
    }

    let width_diff = area.width() - item.width();
    let length_diff = area.length() - item.length();
    let x = area.x().unwrap_or(0.0);
    let y = area.y().unwrap_or(0.0);

    // Exact fill leaves no remainder; zero-area rectangles are never created.
    if width_diff == 0.0 && length_diff == 0.0 {
        return Ok(Vec::new());
    }

    if width_diff == 0.0 {
        return Ok(vec![
            Solid::area(item.width(), length_diff).at(x, y + item.length())
        ]);
    }

    if length_diff == 0.0 {
        return Ok(vec![
            Solid::area(width_diff, item.length()).at(x + item.width(), y)
        ]);
    }

    // L-shaped leftover: a full-width strip past the item's length, and a
    // strip beside the item spanning its length.
    Ok(vec![
        Solid::area(area.width(), length_diff).at(x, y + item.length()),
        Solid::area(width_diff, item.length()).at(x + item.width(), y),
    ])
}
