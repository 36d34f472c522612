//! Getting commit histories into the running galaxy.
//!
//! The bundled demo arrives through the asset server. Files named on the
//! command line or dropped on the window are read on the IO task pool.

/// Demo history asset, load reporting and handing prepared histories to the runtime.
pub mod history_loader;

/// Background reads of history files from disk.
pub mod file_import;
