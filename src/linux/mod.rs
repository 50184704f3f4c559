//! Linux backend
//!
//! Memory is accessed through `/proc/<pid>/mem`, regions are described by
//! `/proc/<pid>/maps`.

pub mod maps;
pub mod procfs;

pub use maps::MapsEntry;
pub use procfs::{list_processes, ProcFiles};
