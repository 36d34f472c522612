//! Deterministic mapping from a normalised history to 3D positions and colours.

pub mod hash;
pub mod palette;
pub mod prepared;
pub mod spatializer;

pub use prepared::{BranchPath, PreparedCommit, PreparedHistory};
pub use spatializer::prepare_history;
