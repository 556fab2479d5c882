mod cost;
mod overlap;

pub use cost::{combined_cost, layer_cost, select_references, CalculateCost};
pub use overlap::{overlaps, Iou};
