//! Top-level facade crate for tariffgate.
//!
//! Re-exports core types and the engine library so hosts can depend on a single crate.

pub mod core {
    pub use tariffgate_core::*;
}

pub mod engine {
    pub use tariffgate_engine::*;
}
