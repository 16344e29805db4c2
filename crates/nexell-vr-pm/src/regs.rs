//! Register windows touched by the GPU power sequence and their bit layout.
//!
//! Physical addresses come from the S5P4418/S5P6818 memory map. The LPI
//! status/request words only exist in the S5P6818 table.

use bitflags::bitflags;
use memory_addr::PhysAddr;

use crate::board::NxBoard;

/// Symbolic identifier of a register block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegBlock {
    /// Mali-400 internal power management unit.
    MaliPmu,
    /// SoC PMU isolation / pre-charge / power-down / ack words.
    PmuIsolate,
    /// Domain power gate.
    PowerGate,
    /// GPU clock gate.
    ClockGate,
    /// IP reset controller.
    Reset,
    /// Low-power interconnect status (S5P6818).
    LpiActive,
    /// Low-power interconnect request (S5P6818).
    LpiReq,
}

impl RegBlock {
    /// Number of distinct blocks, i.e. slots in a mapping table.
    pub const COUNT: usize = 7;

    /// Slot index of this block in a mapping table.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A physical register window: base address and byte size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegWindow {
    pub block: RegBlock,
    pub paddr: PhysAddr,
    pub size: usize,
}

impl RegWindow {
    const fn new(block: RegBlock, paddr: usize, size: usize) -> Self {
        Self {
            block,
            paddr: PhysAddr::from_usize(paddr),
            size,
        }
    }
}

const MALI_PMU: RegWindow = RegWindow::new(RegBlock::MaliPmu, 0xC007_0000 + 0x2000, 0x10);
const PMU_ISOLATE: RegWindow = RegWindow::new(RegBlock::PmuIsolate, 0xC001_0D00, 0x10);
const POWER_GATE: RegWindow = RegWindow::new(RegBlock::PowerGate, 0xC001_0800, 0x4);
const CLOCK_GATE: RegWindow = RegWindow::new(RegBlock::ClockGate, 0xC00C_3000, 0x4);
const RESET: RegWindow = RegWindow::new(RegBlock::Reset, 0xC001_2000, 0xC);
const LPI_ACTIVE: RegWindow = RegWindow::new(RegBlock::LpiActive, 0xC001_120C, 0x4);
const LPI_REQ: RegWindow = RegWindow::new(RegBlock::LpiReq, 0xC001_1114, 0x4);

static S5P4418_WINDOWS: [RegWindow; 5] = [MALI_PMU, PMU_ISOLATE, POWER_GATE, CLOCK_GATE, RESET];

static S5P6818_WINDOWS: [RegWindow; 7] = [
    MALI_PMU,
    PMU_ISOLATE,
    POWER_GATE,
    CLOCK_GATE,
    RESET,
    LPI_ACTIVE,
    LPI_REQ,
];

/// Returns the ordered register window table for `board`.
pub fn windows(board: NxBoard) -> &'static [RegWindow] {
    match board {
        NxBoard::S5p4418 => &S5P4418_WINDOWS,
        NxBoard::S5p6818 => &S5P6818_WINDOWS,
    }
}

/// Base of the whole Mali-400 register space.
pub const MALI_BASE: usize = 0xC007_0000;

/// Mali PMU: power-up request, written with the [`SubUnits`] to energize.
pub const MALI_PMU_POWER_UP: usize = 0x0;
/// Mali PMU: interrupt mask.
pub const MALI_PMU_INT_MASK: usize = 0xC;

/// Reset controller word holding the GPU reset line.
pub const RESET_GPU_WORD: usize = 0x8;
/// GPU reset bit, active low (bit 65 of the reset vector).
pub const RESET_GPU_BIT: u32 = 1 << 1;

/// Isolation enable, active low: set = signals pass, clear = isolated.
pub const ISOLATE_ENABLE: usize = 0x0;
pub const ISOLATE_PRECHARGE: usize = 0x4;
pub const ISOLATE_POWER_DOWN: usize = 0x8;
/// Power-down acknowledgement: 1 = domain down, 0 = domain up.
pub const ISOLATE_ACK: usize = 0xC;
/// The single control/status bit in every isolation word.
pub const ISOLATE_BIT: u32 = 1 << 0;

/// Value written to the power gate to request the domain transition.
pub const POWER_GATE_READY: u32 = 0x1;

bitflags! {
    /// GPU clock enables.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClockGate: u32 {
        const PCLK = 1 << 0;
        const BCLK = 1 << 1;
    }
}

bitflags! {
    /// Low-power interconnect status word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LpiStatus: u32 {
        const PBUS_ACTIVE = 1 << 12;
        const PBUS_ACK = 1 << 13;
        const MBUS_ACTIVE = 1 << 20;
        const MBUS_ACK = 1 << 21;
    }
}

bitflags! {
    /// Low-power interconnect request word (CSYSREQ lines).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LpiRequest: u32 {
        const MBUS_CSYSREQ = 1 << 1;
        const PBUS_CSYSREQ = 1 << 2;
    }
}

bitflags! {
    /// Mali-400 sub-units powered through the Mali PMU.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SubUnits: u32 {
        /// Geometry processor.
        const GP = 1 << 0;
        /// L2 cache.
        const L2C = 1 << 1;
        const PP0 = 1 << 2;
        const PP1 = 1 << 3;
        const PP2 = 1 << 4;
        const PP3 = 1 << 5;
    }
}
