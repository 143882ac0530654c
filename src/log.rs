//! Logging shims for input diagnostics.
//!
//! Suspicious but non-fatal input (duplicate state labels, tips without
//! states, non-bifurcating nodes) is reported through these macros. With
//! the `tracing` feature they forward to `tracing`; without it they
//! compile away entirely.

#[cfg(feature = "tracing")]
pub use tracing::{debug, warn};

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub use crate::{debug, warn};
