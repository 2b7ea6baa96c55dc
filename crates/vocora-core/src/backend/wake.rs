//! Wake-word detector interface (§6).

use crate::error::Result;

/// Stateful wake-word detector. `reset` is called after each activation so
/// the detector's internal rolling buffer doesn't immediately re-trigger.
pub trait WakeDetector: Send + Sync {
    fn load(&mut self) -> Result<()>;
    fn unload(&mut self);

    /// Feed one capture chunk; returns `true` on detection.
    fn detect(&mut self, chunk: &[i16]) -> bool;

    fn reset(&mut self);
}
