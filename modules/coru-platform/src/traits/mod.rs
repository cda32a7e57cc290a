//! Platform trait definitions

pub mod arch;

// Re-export for convenience
pub use arch::{Arch, Entry};
