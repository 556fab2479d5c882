//! Layered footprint simplification for voxelized building models.
//!
//! A [`building::VoxelBuilding`] is a stack of horizontal slices. The
//! [`operations::layering`] pass groups similar slices into a tree of
//! layers, and [`operations::arbitration`] simplifies each layer's footprint
//! by running several [`operations::simplify`] strategies and keeping the
//! cheapest valid result.

pub mod building;
pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;

pub use error::{MassingError, Result};
