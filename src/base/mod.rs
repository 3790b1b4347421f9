//! Small platform-service shims the rest of the crate builds on:
//! logging init and a monotonic idle-reap clock.

pub mod tick;

pub use self::tick::Tick;

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialise the adapter's logging.
///
/// This should be called before any other function this crate provides.
/// It may be called more than once; only the first call has an effect.
pub fn init_log() {
    INIT.call_once(|| {
        env_logger::try_init().ok();
    });
}
