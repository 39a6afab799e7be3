//! Operator cancellation and hardware-safe shutdown.

use rig_common::hal::driver::ActuatorDriver;
use rig_common::hal::driver::HalError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Shared stop request, set from the interrupt handler and polled by the
/// motion loops.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Stop the drive output, then release relay and converter lines.
///
/// Both steps are attempted; the first failure is returned.
pub fn safe_stop(driver: &mut dyn ActuatorDriver) -> Result<(), HalError> {
    let stopped = driver.stop();
    if let Err(e) = &stopped {
        warn!(driver = driver.name(), "stop failed during shutdown: {e}");
    }
    let released = driver.release();
    if let Err(e) = &released {
        warn!(driver = driver.name(), "release failed during shutdown: {e}");
    }
    info!(driver = driver.name(), "actuator stopped and released");
    stopped.and(released)
}
