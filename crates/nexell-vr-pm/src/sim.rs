//! Register-level simulator of the GPU power domain, for tests.
//!
//! Models just enough of the SoC for the sequencers to make progress: the
//! power-down ack follows the power-down request, and the LPI status word
//! reports both ports active with acks mirroring the request lines.
//!
//! Every access resolves to a physical address, so a register reached
//! through its window and the same word reached through a raw page mapping
//! are one storage cell.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc, time::Duration};

use memory_addr::PhysAddr;

use crate::{
    board::NxBoard,
    config::PmConfig,
    hal::RegisterIo,
    platform::VrPlatform,
    regs::*,
};

/// One observable bus event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Map(RegBlock),
    Unmap(RegBlock),
    MapRaw { paddr: PhysAddr, size: usize },
    UnmapRaw(PhysAddr),
    Read {
        block: RegBlock,
        offset: usize,
        value: u32,
    },
    Write {
        block: RegBlock,
        offset: usize,
        value: u32,
    },
    RawRead { paddr: PhysAddr, value: u32 },
    RawWrite { paddr: PhysAddr, value: u32 },
    Delay(Duration),
}

impl Access {
    /// Whether this event maps, unmaps, reads or writes `block`.
    pub fn touches(&self, block: RegBlock) -> bool {
        match self {
            Access::Map(b) | Access::Unmap(b) => *b == block,
            Access::Read { block: b, .. } | Access::Write { block: b, .. } => *b == block,
            _ => false,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Access::Write { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimHandle {
    Block(RegBlock),
    Raw(PhysAddr),
}

struct State {
    board: NxBoard,
    mem: BTreeMap<usize, u32>,
    log: Vec<Access>,
    live: Vec<SimHandle>,
    fail_map: Option<RegBlock>,
    fail_raw: bool,
    hold_ack: u32,
    hold_lpi: u32,
}

/// Physical address of a register word. The S5P6818 table is a superset of
/// the S5P4418 one with identical addresses.
fn reg_addr(block: RegBlock, offset: usize) -> usize {
    windows(NxBoard::S5p6818)[block.index()].paddr.as_usize() + offset
}

impl State {
    fn reg(&self, block: RegBlock, offset: usize) -> u32 {
        self.mem.get(&reg_addr(block, offset)).copied().unwrap_or(0)
    }

    fn lpi_status(&self) -> u32 {
        let req = LpiRequest::from_bits_truncate(self.reg(RegBlock::LpiReq, 0));
        let mut status = LpiStatus::PBUS_ACTIVE | LpiStatus::MBUS_ACTIVE;
        status.set(LpiStatus::PBUS_ACK, req.contains(LpiRequest::PBUS_CSYSREQ));
        status.set(LpiStatus::MBUS_ACK, req.contains(LpiRequest::MBUS_CSYSREQ));
        status.bits()
    }

    /// Value the bus would return at `paddr`.
    fn peek(&self, paddr: usize) -> u32 {
        if paddr == reg_addr(RegBlock::LpiActive, 0) {
            self.lpi_status()
        } else {
            self.mem.get(&paddr).copied().unwrap_or(0)
        }
    }

    /// Stores `value` at `paddr`, applying the hardware's side effects.
    fn poke(&mut self, paddr: usize, value: u32) {
        self.mem.insert(paddr, value);
        if paddr == reg_addr(RegBlock::PmuIsolate, ISOLATE_POWER_DOWN) {
            self.mem.insert(
                reg_addr(RegBlock::PmuIsolate, ISOLATE_ACK),
                value & ISOLATE_BIT,
            );
        }
    }
}

/// Shared handle on a simulated register file. Clones see the same state.
#[derive(Clone)]
pub struct SimIo(Rc<RefCell<State>>);

impl SimIo {
    /// All registers zero.
    pub fn new(board: NxBoard) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self(Rc::new(RefCell::new(State {
            board,
            mem: BTreeMap::new(),
            log: Vec::new(),
            live: Vec::new(),
            fail_map: None,
            fail_raw: false,
            hold_ack: 0,
            hold_lpi: 0,
        })))
    }

    /// The GPU powered, clocked and out of reset.
    pub fn active(board: NxBoard) -> Self {
        let io = Self::new(board);
        io.set(RegBlock::PmuIsolate, ISOLATE_ENABLE, ISOLATE_BIT);
        io.set(RegBlock::PmuIsolate, ISOLATE_PRECHARGE, 0);
        io.set(RegBlock::PmuIsolate, ISOLATE_POWER_DOWN, 0);
        io.set(RegBlock::PmuIsolate, ISOLATE_ACK, 0);
        io.set(RegBlock::ClockGate, 0, ClockGate::all().bits());
        io.set(RegBlock::Reset, RESET_GPU_WORD, RESET_GPU_BIT);
        io.set(RegBlock::PowerGate, 0, POWER_GATE_READY);
        io.set(RegBlock::LpiReq, 0, LpiRequest::all().bits());
        io
    }

    /// The GPU isolated, powered down and held in reset.
    pub fn gated(board: NxBoard) -> Self {
        let io = Self::new(board);
        io.set(RegBlock::PmuIsolate, ISOLATE_ENABLE, 0);
        io.set(RegBlock::PmuIsolate, ISOLATE_PRECHARGE, ISOLATE_BIT);
        io.set(RegBlock::PmuIsolate, ISOLATE_POWER_DOWN, ISOLATE_BIT);
        io.set(RegBlock::PmuIsolate, ISOLATE_ACK, ISOLATE_BIT);
        io.set(RegBlock::ClockGate, 0, 0);
        io.set(RegBlock::Reset, RESET_GPU_WORD, 0);
        io.set(RegBlock::LpiReq, 0, 0);
        io
    }

    /// Maps a block's window through [`RegisterIo::map`].
    pub fn map_block(&mut self, block: RegBlock) -> SimHandle {
        let board = self.0.borrow().board;
        let window = windows(board)[block.index()];
        self.map(window.paddr, window.size).unwrap()
    }

    /// Sets a register without logging an access.
    pub fn set(&self, block: RegBlock, offset: usize, value: u32) {
        self.0.borrow_mut().mem.insert(reg_addr(block, offset), value);
    }

    /// Current register value, without logging an access.
    pub fn get(&self, block: RegBlock, offset: usize) -> u32 {
        self.0.borrow().peek(reg_addr(block, offset))
    }

    /// Sets the word at a physical address without logging an access.
    pub fn set_phys(&self, paddr: usize, value: u32) {
        self.0.borrow_mut().mem.insert(paddr, value);
    }

    /// Current word at a physical address, without logging an access.
    pub fn get_phys(&self, paddr: usize) -> u32 {
        self.0.borrow().peek(paddr)
    }

    /// The next `n` power ack reads return the opposite of the stored bit.
    pub fn hold_ack(&self, n: u32) {
        self.0.borrow_mut().hold_ack = n;
    }

    /// The next `n` LPI status reads report both ports inactive with stale
    /// acks.
    pub fn hold_lpi(&self, n: u32) {
        self.0.borrow_mut().hold_lpi = n;
    }

    /// Mapping `block` fails from now on.
    pub fn fail_map(&self, block: RegBlock) {
        self.0.borrow_mut().fail_map = Some(block);
    }

    pub fn fail_map_none(&self) {
        self.0.borrow_mut().fail_map = None;
    }

    /// Mapping anything outside the register windows fails from now on.
    pub fn fail_raw_maps(&self) {
        self.0.borrow_mut().fail_raw = true;
    }

    pub fn clear_log(&self) {
        self.0.borrow_mut().log.clear();
    }

    pub fn log(&self) -> Vec<Access> {
        self.0.borrow().log.clone()
    }

    /// Register writes in order, as `(block, offset, value)`.
    pub fn writes(&self) -> Vec<(RegBlock, usize, u32)> {
        self.0
            .borrow()
            .log
            .iter()
            .filter_map(|a| match *a {
                Access::Write {
                    block,
                    offset,
                    value,
                } => Some((block, offset, value)),
                _ => None,
            })
            .collect()
    }

    pub fn reads_of(&self, block: RegBlock, offset: usize) -> usize {
        self.count(|a| matches!(*a, Access::Read { block: b, offset: o, .. } if b == block && o == offset))
    }

    pub fn map_count(&self, block: RegBlock) -> usize {
        self.count(|a| *a == Access::Map(block))
    }

    pub fn unmap_count(&self, block: RegBlock) -> usize {
        self.count(|a| *a == Access::Unmap(block))
    }

    /// Map and unmap events of any kind, as `(maps, unmaps)`.
    pub fn mapping_events(&self) -> (usize, usize) {
        (
            self.count(|a| matches!(a, Access::Map(_) | Access::MapRaw { .. })),
            self.count(|a| matches!(a, Access::Unmap(_) | Access::UnmapRaw(_))),
        )
    }

    /// Mappings currently held, register windows and raw pages alike.
    pub fn live_mappings(&self) -> usize {
        self.0.borrow().live.len()
    }

    fn count(&self, f: impl Fn(&Access) -> bool) -> usize {
        self.0.borrow().log.iter().filter(|a| f(a)).count()
    }
}

impl RegisterIo for SimIo {
    type Handle = SimHandle;

    fn map(&mut self, paddr: PhysAddr, size: usize) -> Option<SimHandle> {
        let mut st = self.0.borrow_mut();
        let window = windows(st.board)
            .iter()
            .find(|w| w.paddr == paddr && w.size == size)
            .copied();
        let handle = match window {
            Some(w) => {
                if st.fail_map == Some(w.block) {
                    return None;
                }
                st.log.push(Access::Map(w.block));
                SimHandle::Block(w.block)
            }
            None => {
                if st.fail_raw {
                    return None;
                }
                st.log.push(Access::MapRaw { paddr, size });
                SimHandle::Raw(paddr)
            }
        };
        st.live.push(handle);
        Some(handle)
    }

    fn unmap(&mut self, handle: SimHandle) {
        let mut st = self.0.borrow_mut();
        let pos = st
            .live
            .iter()
            .position(|h| *h == handle)
            .unwrap_or_else(|| panic!("unmap of {handle:?}, which is not mapped"));
        st.live.remove(pos);
        st.log.push(match handle {
            SimHandle::Block(block) => Access::Unmap(block),
            SimHandle::Raw(paddr) => Access::UnmapRaw(paddr),
        });
    }

    fn read(&mut self, handle: SimHandle, offset: usize) -> u32 {
        let mut st = self.0.borrow_mut();
        let (block, value) = match handle {
            SimHandle::Raw(base) => {
                let paddr = base + offset;
                let value = st.peek(paddr.as_usize());
                st.log.push(Access::RawRead { paddr, value });
                return value;
            }
            SimHandle::Block(RegBlock::PmuIsolate) if offset == ISOLATE_ACK && st.hold_ack > 0 => {
                st.hold_ack -= 1;
                let value = st.reg(RegBlock::PmuIsolate, ISOLATE_ACK) ^ ISOLATE_BIT;
                (RegBlock::PmuIsolate, value)
            }
            SimHandle::Block(RegBlock::LpiActive) if st.hold_lpi > 0 => {
                st.hold_lpi -= 1;
                let acks = (LpiStatus::PBUS_ACK | LpiStatus::MBUS_ACK).bits();
                let value = (st.lpi_status() & acks) ^ acks;
                (RegBlock::LpiActive, value)
            }
            SimHandle::Block(block) => (block, st.peek(reg_addr(block, offset))),
        };
        st.log.push(Access::Read {
            block,
            offset,
            value,
        });
        value
    }

    fn write(&mut self, handle: SimHandle, offset: usize, value: u32) {
        let mut st = self.0.borrow_mut();
        match handle {
            SimHandle::Raw(base) => {
                let paddr = base + offset;
                st.poke(paddr.as_usize(), value);
                st.log.push(Access::RawWrite { paddr, value });
            }
            SimHandle::Block(block) => {
                st.poke(reg_addr(block, offset), value);
                st.log.push(Access::Write {
                    block,
                    offset,
                    value,
                });
            }
        }
    }

    fn delay(&mut self, duration: Duration) {
        self.0.borrow_mut().log.push(Access::Delay(duration));
    }
}

/// A platform for `board` over `io` with every window mapped and the
/// default configuration. Nothing is powered.
pub(crate) fn mapped(io: SimIo, board: NxBoard) -> VrPlatform<SimIo> {
    let mut platform = VrPlatform::new(io, Some(board), PmConfig::default());
    platform.map_registers().unwrap();
    platform
}
