// bond/mod.rs
// Discrete tethers: formation, hazard-driven breakage, and the registry that owns them

mod formation;
mod instance;
mod registry;
mod tether;

pub use formation::*;
pub use instance::*;
pub use registry::*;
pub use tether::*;
