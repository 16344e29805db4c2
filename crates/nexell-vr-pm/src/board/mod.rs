//! Chip variants and the power sequencing steps they are built from.

use core::{fmt, str::FromStr};

use crate::{
    config::{PmConfig, ResetRelease},
    err::{PmError, PmResult},
    hal::RegisterIo,
    maps::RegisterMaps,
    poll::{self, Poll},
    regs::*,
};

#[cfg(feature = "s5p4418")]
mod s5p4418;
#[cfg(feature = "s5p6818")]
mod s5p6818;

#[cfg(feature = "s5p4418")]
pub use s5p4418::S5p4418;
#[cfg(feature = "s5p6818")]
pub use s5p6818::S5p6818;

/// Nexell SoC hosting the Mali-400 GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NxBoard {
    /// Quad-core Cortex-A9, Mali-400 MP2.
    S5p4418,
    /// Octa-core Cortex-A53, Mali-400 MP4 behind a low-power interconnect.
    S5p6818,
}

cfg_if::cfg_if! {
    if #[cfg(all(feature = "s5p4418", feature = "s5p6818"))] {
        const BUILT: &[NxBoard] = &[NxBoard::S5p4418, NxBoard::S5p6818];
    } else if #[cfg(feature = "s5p4418")] {
        const BUILT: &[NxBoard] = &[NxBoard::S5p4418];
    } else if #[cfg(feature = "s5p6818")] {
        const BUILT: &[NxBoard] = &[NxBoard::S5p6818];
    } else {
        const BUILT: &[NxBoard] = &[];
    }
}

impl NxBoard {
    /// Boards whose sequencer is compiled in.
    pub fn built() -> &'static [NxBoard] {
        BUILT
    }

    /// Whether this board's sequencer is compiled in.
    pub fn is_built(self) -> bool {
        BUILT.contains(&self)
    }

    pub const fn name(self) -> &'static str {
        match self {
            NxBoard::S5p4418 => "s5p4418",
            NxBoard::S5p6818 => "s5p6818",
        }
    }

    /// Matches a device tree compatible string such as `"nexell,s5p6818"`.
    pub fn from_compatible(compatible: &str) -> Option<Self> {
        match compatible {
            "nexell,s5p4418" => Some(NxBoard::S5p4418),
            "nexell,s5p6818" => Some(NxBoard::S5p6818),
            _ => None,
        }
    }

    /// Returns the first board matched by a list of compatible strings.
    pub fn from_compatibles<'a>(compatibles: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        compatibles.into_iter().find_map(Self::from_compatible)
    }

    /// Sub-units energized at the end of power-up.
    pub const fn sub_units(self) -> SubUnits {
        match self {
            NxBoard::S5p4418 => SubUnits::GP
                .union(SubUnits::L2C)
                .union(SubUnits::PP0)
                .union(SubUnits::PP1),
            NxBoard::S5p6818 => SubUnits::all(),
        }
    }

    pub(crate) fn power_down<IO: RegisterIo>(self, steps: &mut Steps<'_, IO>) -> PmResult {
        match self {
            #[cfg(feature = "s5p4418")]
            NxBoard::S5p4418 => S5p4418::power_down(steps),
            #[cfg(feature = "s5p6818")]
            NxBoard::S5p6818 => S5p6818::power_down(steps),
            #[allow(unreachable_patterns)]
            _ => {
                unsupported(Some(self), "power down");
                Ok(())
            }
        }
    }

    pub(crate) fn power_up<IO: RegisterIo>(self, steps: &mut Steps<'_, IO>) -> PmResult {
        match self {
            #[cfg(feature = "s5p4418")]
            NxBoard::S5p4418 => S5p4418::power_up(steps),
            #[cfg(feature = "s5p6818")]
            NxBoard::S5p6818 => S5p6818::power_up(steps),
            #[allow(unreachable_patterns)]
            _ => {
                unsupported(Some(self), "power up");
                Ok(())
            }
        }
    }
}

impl fmt::Display for NxBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NxBoard {
    type Err = PmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s5p4418" => Ok(NxBoard::S5p4418),
            "s5p6818" => Ok(NxBoard::S5p6818),
            other => Self::from_compatible(other).ok_or(PmError::InvalidParam),
        }
    }
}

/// Logs the banner for a board without a usable sequencer.
pub(crate) fn unsupported(board: Option<NxBoard>, what: &str) {
    error!("=============================================================");
    match board {
        Some(board) => error!("ERROR!!! {board} support is not built, skipping {what}"),
        None => error!("ERROR!!! No supported platform, skipping {what}"),
    }
    error!("=============================================================");
}

/// A chip variant's power sequencing protocol.
pub trait PowerSequence {
    /// Sub-units energized at the end of power-up.
    const SUB_UNITS: SubUnits;

    /// Drives the GPU from active to isolated, gated and held in reset.
    fn power_down<IO: RegisterIo>(steps: &mut Steps<'_, IO>) -> PmResult;

    /// Drives the GPU from gated and reset back to active.
    fn power_up<IO: RegisterIo>(steps: &mut Steps<'_, IO>) -> PmResult;
}

/// Which way the domain is expected to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAck {
    Down,
    Up,
}

/// Register-level building blocks shared by every variant.
pub struct Steps<'a, IO: RegisterIo> {
    maps: &'a mut RegisterMaps<IO>,
    config: &'a PmConfig,
}

impl<'a, IO: RegisterIo> Steps<'a, IO> {
    pub(crate) fn new(maps: &'a mut RegisterMaps<IO>, config: &'a PmConfig) -> Self {
        Self { maps, config }
    }

    pub fn config(&self) -> &PmConfig {
        self.config
    }

    /// Read-modify-write: clears `clear`, then sets `set`.
    pub fn modify(&mut self, block: RegBlock, offset: usize, clear: u32, set: u32) -> PmResult {
        let handle = self.maps.handle(block)?;
        let io = self.maps.io();
        let value = io.read(handle, offset);
        io.write(handle, offset, (value & !clear) | set);
        Ok(())
    }

    pub fn write(&mut self, block: RegBlock, offset: usize, value: u32) -> PmResult {
        let handle = self.maps.handle(block)?;
        self.maps.io().write(handle, offset, value);
        Ok(())
    }

    /// Polls until `(value & mask) == expect`.
    pub fn wait(
        &mut self,
        block: RegBlock,
        offset: usize,
        mask: u32,
        expect: u32,
        poll: Poll,
        what: &'static str,
    ) -> PmResult<u32> {
        let handle = self.maps.handle(block)?;
        poll::wait_bits(self.maps.io(), handle, offset, mask, expect, poll, what)
    }

    /// Fixed settle delay after a power transition step.
    pub fn settle(&mut self) {
        let delay = self.config.settle_delay;
        if !delay.is_zero() {
            self.maps.io().delay(delay);
        }
    }

    pub fn assert_reset(&mut self) -> PmResult {
        debug!("assert GPU reset");
        self.modify(RegBlock::Reset, RESET_GPU_WORD, RESET_GPU_BIT, 0)
    }

    /// Releases the GPU reset according to the configured strategy.
    pub fn release_reset(&mut self) -> PmResult {
        debug!("release GPU reset ({:?})", self.config.reset_release);
        let handle = self.maps.handle(RegBlock::Reset)?;
        let pulse = self.config.reset_release == ResetRelease::Pulse;
        let io = self.maps.io();
        let value = io.read(handle, RESET_GPU_WORD);
        if pulse {
            io.write(handle, RESET_GPU_WORD, value & !RESET_GPU_BIT);
        }
        io.write(handle, RESET_GPU_WORD, value | RESET_GPU_BIT);
        Ok(())
    }

    pub fn gate_clocks(&mut self) -> PmResult {
        debug!("disable GPU clocks");
        self.modify(RegBlock::ClockGate, 0, ClockGate::all().bits(), 0)
    }

    pub fn ungate_clocks(&mut self) -> PmResult {
        debug!("enable GPU clocks");
        self.modify(RegBlock::ClockGate, 0, 0, ClockGate::all().bits())
    }

    /// Arms the power gate for the next domain transition.
    pub fn ready_power_gate(&mut self) -> PmResult {
        debug!("ready power gate");
        self.write(RegBlock::PowerGate, 0, POWER_GATE_READY)
    }

    pub fn isolate(&mut self) -> PmResult {
        debug!("isolate GPU domain");
        self.modify(RegBlock::PmuIsolate, ISOLATE_ENABLE, ISOLATE_BIT, 0)
    }

    pub fn deisolate(&mut self) -> PmResult {
        debug!("release GPU domain isolation");
        self.modify(RegBlock::PmuIsolate, ISOLATE_ENABLE, 0, ISOLATE_BIT)
    }

    pub fn precharge(&mut self, down: bool) -> PmResult {
        debug!("pre-charge {}", if down { "down" } else { "up" });
        if down {
            self.modify(RegBlock::PmuIsolate, ISOLATE_PRECHARGE, 0, ISOLATE_BIT)
        } else {
            self.modify(RegBlock::PmuIsolate, ISOLATE_PRECHARGE, ISOLATE_BIT, 0)
        }
    }

    pub fn power_switch(&mut self, down: bool) -> PmResult {
        debug!("power {}", if down { "down" } else { "up" });
        if down {
            self.modify(RegBlock::PmuIsolate, ISOLATE_POWER_DOWN, 0, ISOLATE_BIT)
        } else {
            self.modify(RegBlock::PmuIsolate, ISOLATE_POWER_DOWN, ISOLATE_BIT, 0)
        }
    }

    /// Waits for the domain power acknowledgement.
    pub fn wait_power_ack(&mut self, ack: PowerAck) -> PmResult {
        let poll = self.config.ack_poll;
        let (expect, what) = match ack {
            PowerAck::Down => (ISOLATE_BIT, "power-down ack"),
            PowerAck::Up => (0, "power-up ack"),
        };
        let reads = self.wait(RegBlock::PmuIsolate, ISOLATE_ACK, ISOLATE_BIT, expect, poll, what)?;
        debug!("{what} after {reads} reads");
        Ok(())
    }

    /// Silences the Mali PMU interrupt during the transition.
    pub fn mask_gpu_irq(&mut self) -> PmResult {
        debug!("mask Mali PMU interrupt");
        self.write(RegBlock::MaliPmu, MALI_PMU_INT_MASK, 0)
    }

    pub fn energize(&mut self, units: SubUnits) -> PmResult {
        debug!("energize {units:?}");
        self.write(RegBlock::MaliPmu, MALI_PMU_POWER_UP, units.bits())
    }
}
