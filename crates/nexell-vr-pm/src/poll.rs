//! Bounded acknowledgement polling.

use core::time::Duration;

use crate::{
    err::{PmError, PmResult},
    hal::RegisterIo,
};

/// Polling budget for one acknowledgement wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poll {
    /// Delay between two reads. Zero spins.
    pub interval: Duration,
    /// Maximum number of reads before giving up.
    pub max_reads: u32,
}

impl Poll {
    /// A budget of `timeout` split into reads every `interval`.
    ///
    /// A zero `interval` has no notion of elapsed time and spins for
    /// `u32::MAX` reads.
    pub const fn within(timeout: Duration, interval: Duration) -> Self {
        if interval.is_zero() {
            return Self::spin(u32::MAX);
        }
        let n = timeout.as_nanos() / interval.as_nanos();
        let max_reads = if n > u32::MAX as u128 {
            u32::MAX
        } else {
            n as u32
        };
        Self {
            interval,
            // Always read at least once, and once more after the last delay.
            max_reads: max_reads.saturating_add(1),
        }
    }

    /// Spins without delaying for at most `max_reads` reads.
    pub const fn spin(max_reads: u32) -> Self {
        Self {
            interval: Duration::ZERO,
            max_reads,
        }
    }
}

/// Reads `offset` until `(value & mask) == expect`.
///
/// Returns the number of reads it took. Fails with
/// [`PmError::Timeout`] naming `what` once the budget is spent.
pub fn wait_bits<IO: RegisterIo>(
    io: &mut IO,
    handle: IO::Handle,
    offset: usize,
    mask: u32,
    expect: u32,
    poll: Poll,
    what: &'static str,
) -> PmResult<u32> {
    for n in 1..=poll.max_reads {
        let value = io.read(handle, offset);
        trace!("wait {what}: read {value:#010x}");
        if value & mask == expect {
            return Ok(n);
        }
        if n < poll.max_reads && !poll.interval.is_zero() {
            io.delay(poll.interval);
        }
    }
    warn!("gave up waiting for {what} after {} reads", poll.max_reads);
    Err(PmError::Timeout(what))
}
