//! Build-time configuration and the runtime tunables derived from it.
//!
//! `build.rs` turns `nexell-vr.toml` (or the file named by `NX_VR_CONFIG`)
//! into the constants of [`defaults`].

use core::time::Duration;

use crate::{board::NxBoard, poll::Poll};

/// How the GPU reset line is released at the end of power-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetRelease {
    /// Set the reset bit only.
    Set,
    /// Clear the reset bit, then set it.
    Pulse,
}

#[allow(missing_docs)]
pub mod defaults {
    use super::ResetRelease;

    include!(concat!(env!("OUT_DIR"), "/config.rs"));
}

/// Runtime power management settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmConfig {
    /// Delay after each power transition step. Zero skips it.
    pub settle_delay: Duration,
    /// Budget for the domain power acknowledgement.
    pub ack_poll: Poll,
    /// Budget for each low-power interconnect wait.
    pub lpi_poll: Poll,
    /// How power-up releases the GPU reset.
    pub reset_release: ResetRelease,
    /// System memory the GPU driver may use.
    pub shared_mem_size: usize,
    /// Reserved framebuffer `(start, size)` passed to the GPU driver.
    pub fb_reserved: Option<(usize, usize)>,
    /// Idle time before the host suspends the device.
    pub autosuspend_delay: Duration,
}

impl PmConfig {
    /// Board named by the build configuration, if its sequencer is built.
    pub fn configured_board() -> Option<NxBoard> {
        defaults::BOARD
            .parse::<NxBoard>()
            .ok()
            .filter(|b| b.is_built())
    }
}

impl Default for PmConfig {
    fn default() -> Self {
        let interval = Duration::from_micros(defaults::POLL_INTERVAL_US);
        Self {
            settle_delay: Duration::from_millis(defaults::SETTLE_DELAY_MS),
            ack_poll: Poll::within(Duration::from_millis(defaults::ACK_TIMEOUT_MS), interval),
            lpi_poll: Poll::within(Duration::from_millis(defaults::LPI_TIMEOUT_MS), interval),
            reset_release: defaults::RESET_RELEASE,
            shared_mem_size: defaults::SHARED_MEM_SIZE,
            fb_reserved: defaults::FB_RESERVED,
            autosuspend_delay: Duration::from_millis(defaults::AUTOSUSPEND_DELAY_MS),
        }
    }
}
