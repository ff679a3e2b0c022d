//! Configuration helpers shared by floe components.

mod vars;

pub use vars::{InterpolationResult, interpolate};
