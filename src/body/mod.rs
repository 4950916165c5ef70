// body/mod.rs
// Re-exports for the body module

mod mesh;
mod patch;
mod types;

pub use mesh::*;
pub use patch::*;
pub use types::*;
