//! Power sequencing for the Mali-400 GPU on Nexell S5P4418/S5P6818 SoCs.
//!
//! [`VrPlatform`] owns the register mappings and drives the SoC power
//! domain up and down. [`device_register`] powers the GPU and hands the
//! `mali-utgard` device record to the host driver framework, whose runtime
//! PM then calls back into [`VrDevice`].

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate log;

mod board;
mod config;
mod device;
mod err;
mod hal;
mod maps;
mod platform;
mod poll;
pub mod regs;

#[cfg(test)]
mod sim;

pub use board::{NxBoard, PowerAck, PowerSequence, Steps};
#[cfg(feature = "s5p4418")]
pub use board::S5p4418;
#[cfg(feature = "s5p6818")]
pub use board::S5p6818;
pub use config::{PmConfig, ResetRelease, defaults};
pub use device::{
    MALI_DMA_MASK, MALI_GPU_NAME, MALI_IRQ, MALI400_MP2_PMU_RESOURCES, MaliGpuData,
    PlatformBus, PlatformDevice, Resource, ResourceKind, VrDevice, device_register,
    device_unregister,
};
pub use err::{PmError, PmResult};
pub use hal::{KernelIo, Mmio, MmioRegion, RegisterIo};
pub use maps::RegisterMaps;
pub use platform::VrPlatform;
pub use poll::{Poll, wait_bits};
