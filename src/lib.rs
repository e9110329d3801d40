//! Dependency-ordered addon discovery, resolution and finalization.
//!

pub use addons_core::*;
pub use addons_layers;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use addons_core::prelude::*;
    pub use addons_layers::{CycleError, Layers};
}
