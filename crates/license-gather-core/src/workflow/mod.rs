//! License check workflows

mod check;
mod classifier;
pub mod manifest;
mod scan;

pub use check::*;
pub use classifier::*;
pub use manifest::{Dependency, DependencyManifest, DEFAULT_MANIFEST};
pub use scan::*;
