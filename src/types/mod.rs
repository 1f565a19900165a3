pub mod dataset;
pub mod observation;
pub mod resolution;
pub mod station;
