//! # layerpack
//!
//! Deterministic, in-memory 3D rectangular bin packing.
//!
//! Solids are packed greedily into a container level by level: each level is
//! a 2D packer that places footprints into its smallest viable free
//! rectangle, splitting the leftover guillotine-style. Once a level's direct
//! space runs out, its unused footprint and the headroom above shorter
//! solids become nested sub-containers packed recursively by the same
//! algorithm; when a level refuses a solid outright, the container freezes
//! it and opens a new one on top.
//!
//! This is a greedy heuristic, not an exact solver: it aims for density, not
//! optimality. Solids always rest upright; only rotation about the vertical
//! axis (swapping width and length) is applied.
//!
//! ## Core components
//!
//! - [`Solid`]: an axis-aligned rectangular solid, with the [`Packable`]
//!   capability contract for caller-supplied box types
//! - [`Level`]: a horizontal 2D packing layer with free-rectangle splitting
//! - [`Container`]: a 3D volume stacking levels, also used recursively as
//!   the nested sub-volume type
//! - [`Placement`]: flattened absolute-coordinate reporting
//!
//! ## Example
//!
//! ```
//! use layerpack::{Container, Solid};
//!
//! let mut container = Container::new(10.0, 10.0, 10.0)?;
//! assert!(container.add_solid(Solid::new(4.0, 4.0, 2.0)?.with_id("a"))?);
//! assert!(container.add_solid(Solid::new(4.0, 4.0, 2.0)?.with_id("b"))?);
//! assert_eq!(container.contents_count(), 2);
//!
//! container.remove_solid("a")?;
//! assert_eq!(container.contents_count(), 1);
//! # Ok::<(), layerpack::Error>(())
//! ```
//!
//! ## Feature flags
//!
//! - `serde`: enable serialization/deserialization of packing state

pub mod container;
pub mod error;
pub mod level;
pub mod placement;
pub mod solid;

// Re-exports
pub use container::Container;
pub use error::{Error, Result};
pub use level::Level;
pub use placement::Placement;
pub use solid::{Packable, Solid, SolidId};
