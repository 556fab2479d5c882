pub mod pline;
pub mod polygon;

pub use pline::{Pline, PlineVertex};
pub use polygon::Polygon;
