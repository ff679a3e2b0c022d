//! Internal metric events.
//!
//! Components describe what happened with small event structs and hand them to
//! [`emit!`]. Each event logs at trace level and records a `metrics` counter or
//! histogram. The CLI installs no exporter; a process embedding floe may
//! install its own recorder to collect them.
//!
//! - `events`: Internal event types and the `InternalEvent` trait

pub mod events;

/// Emit an internal event.
///
/// This macro calls the `InternalEvent::emit()` method on the given event.
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::metrics::events::InternalEvent::emit($event)
    };
}

// Re-export the macro at crate root
pub use emit;
