use core::fmt;

use memory_addr::PhysAddr;

use crate::regs::RegBlock;

/// The error type for power sequencing and registration failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmError {
    /// A register window could not be mapped.
    MapFailed {
        /// Block whose window failed, `None` for a raw physical access.
        block: Option<RegBlock>,
        /// Physical base of the window.
        paddr: PhysAddr,
    },
    /// A sequencing step needs a block that is not mapped.
    NotMapped(RegBlock),
    /// The hardware did not acknowledge within the polling budget.
    Timeout(&'static str),
    /// Invalid parameter/argument.
    InvalidParam,
    /// An entity already exists.
    AlreadyExists,
    /// The host driver framework rejected a request.
    Bus(i32),
}

impl fmt::Display for PmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PmError::MapFailed {
                block: Some(block),
                paddr,
            } => write!(f, "failed to map {block:?} at {:#x}", paddr.as_usize()),
            PmError::MapFailed { block: None, paddr } => {
                write!(f, "failed to map {:#x}", paddr.as_usize())
            }
            PmError::NotMapped(block) => write!(f, "{block:?} is not mapped"),
            PmError::Timeout(what) => write!(f, "timed out waiting for {what}"),
            PmError::InvalidParam => write!(f, "Invalid parameter"),
            PmError::AlreadyExists => write!(f, "Entity already exists"),
            PmError::Bus(code) => write!(f, "platform bus error {code}"),
        }
    }
}

/// A specialized `Result` type for power management operations.
pub type PmResult<T = ()> = Result<T, PmError>;
