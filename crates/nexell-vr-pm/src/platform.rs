//! The owning context: register mappings, board selection and settings.

use memory_addr::{MemoryAddr, PhysAddr};

use crate::{
    board::{self, NxBoard, Steps},
    config::PmConfig,
    err::{PmError, PmResult},
    hal::RegisterIo,
    maps::RegisterMaps,
    regs::{RegWindow, windows},
};

/// Granule of the raw diagnostic mappings.
const RAW_PAGE: usize = 0x2000;

/// GPU power management for one SoC.
pub struct VrPlatform<IO: RegisterIo> {
    board: Option<NxBoard>,
    maps: RegisterMaps<IO>,
    config: PmConfig,
}

impl<IO: RegisterIo> VrPlatform<IO> {
    /// Creates the context. `None` or a board whose sequencer is not built
    /// gets an empty mapping table and no-op sequencing.
    pub fn new(io: IO, board: Option<NxBoard>, config: PmConfig) -> Self {
        let table: &'static [RegWindow] = match board {
            Some(b) if b.is_built() => windows(b),
            _ => &[],
        };
        Self {
            board,
            maps: RegisterMaps::new(io, table),
            config,
        }
    }

    pub fn board(&self) -> Option<NxBoard> {
        self.board
    }

    pub fn config(&self) -> &PmConfig {
        &self.config
    }

    pub fn maps(&self) -> &RegisterMaps<IO> {
        &self.maps
    }

    /// Maps the board's register windows.
    pub fn map_registers(&mut self) -> PmResult {
        self.maps.build_maps()
    }

    /// Maps the registers, then powers the GPU up for the first time.
    pub fn platform_init(&mut self) -> PmResult {
        self.map_registers()?;
        self.power_up_first()?;
        match self.board {
            Some(board) => info!("Mali-400 power control loaded for {board}"),
            None => info!("Mali-400 power control loaded without a board"),
        }
        Ok(())
    }

    /// Powers the GPU down and releases every mapping.
    ///
    /// Mappings are released even when power-down fails; the power-down
    /// error is returned afterwards.
    pub fn platform_deinit(&mut self) -> PmResult {
        let res = self.power_down_all();
        if let Err(e) = &res {
            warn!("power down on deinit failed: {e}");
        }
        self.maps.release_maps();
        res
    }

    pub fn power_down_all(&mut self) -> PmResult {
        debug!("GPU power down");
        match self.board {
            Some(board) => board.power_down(&mut Steps::new(&mut self.maps, &self.config)),
            None => {
                board::unsupported(None, "power down");
                Ok(())
            }
        }
    }

    pub fn power_up_all(&mut self) -> PmResult {
        debug!("GPU power up");
        match self.board {
            Some(board) => board.power_up(&mut Steps::new(&mut self.maps, &self.config)),
            None => {
                board::unsupported(None, "power up");
                Ok(())
            }
        }
    }

    /// The power-up run once at load time.
    pub fn power_up_first(&mut self) -> PmResult {
        info!("GPU first power up");
        self.power_up_all()
    }

    /// Reads the 32-bit word at `paddr` through a temporary mapping.
    pub fn read_phys(&mut self, paddr: PhysAddr) -> PmResult<u32> {
        let value = self.with_raw(paddr, |io, handle, offset| io.read(handle, offset))?;
        trace!("read_phys {:#x} = {value:#010x}", paddr.as_usize());
        Ok(value)
    }

    /// Writes the 32-bit word at `paddr` through a temporary mapping.
    pub fn write_phys(&mut self, paddr: PhysAddr, value: u32) -> PmResult {
        trace!("write_phys {:#x} = {value:#010x}", paddr.as_usize());
        self.with_raw(paddr, |io, handle, offset| io.write(handle, offset, value))
    }

    fn with_raw<T>(
        &mut self,
        paddr: PhysAddr,
        f: impl FnOnce(&mut IO, IO::Handle, usize) -> T,
    ) -> PmResult<T> {
        if !paddr.is_aligned(4usize) {
            return Err(PmError::InvalidParam);
        }
        let page = paddr.align_down(RAW_PAGE);
        let offset = paddr.align_offset(RAW_PAGE);
        let io = self.maps.io();
        let handle = io.map(page, offset + 4).ok_or_else(|| {
            error!("can't map {:#x}", page.as_usize());
            PmError::MapFailed {
                block: None,
                paddr: page,
            }
        })?;
        let ret = f(&mut *io, handle, offset);
        io.unmap(handle);
        Ok(ret)
    }
}
