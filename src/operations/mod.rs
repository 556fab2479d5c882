pub mod arbitration;
pub mod layering;
pub mod query;
pub mod simplify;
