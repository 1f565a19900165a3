pub mod coverage;
pub mod directory;
pub mod error;
pub mod ranking;
