pub mod fill;
pub mod missing;
