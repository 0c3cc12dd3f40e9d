//! Shared primitives for the Easel canvas core: geometry and the
//! deterministic timer scheduler every component is driven by.

pub mod geometry;
pub mod scheduler;

pub use geometry::*;
pub use scheduler::*;
