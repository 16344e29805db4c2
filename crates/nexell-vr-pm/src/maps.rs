//! The register mapping table shared by every sequencing call.

use crate::{
    err::{PmError, PmResult},
    hal::RegisterIo,
    regs::{RegBlock, RegWindow},
};

/// Live mappings of a board's register windows.
///
/// Slots are indexed by [`RegBlock`]; a block outside the board's table
/// simply stays unmapped. Mappings are released on drop.
pub struct RegisterMaps<IO: RegisterIo> {
    io: IO,
    windows: &'static [RegWindow],
    slots: [Option<IO::Handle>; RegBlock::COUNT],
}

impl<IO: RegisterIo> RegisterMaps<IO> {
    /// Creates an empty table for `windows`. Nothing is mapped yet.
    pub fn new(io: IO, windows: &'static [RegWindow]) -> Self {
        Self {
            io,
            windows,
            slots: [None; RegBlock::COUNT],
        }
    }

    /// Maps every window in table order.
    ///
    /// Stops at the first failure and keeps what was already mapped; a
    /// later [`RegisterMaps::release_maps`] cleans those up. Slots that are
    /// already live are left alone, so this can be retried.
    pub fn build_maps(&mut self) -> PmResult {
        for window in self.windows {
            let slot = &mut self.slots[window.block.index()];
            if slot.is_some() {
                continue;
            }
            match self.io.map(window.paddr, window.size) {
                Some(handle) => {
                    trace!(
                        "mapped {:?} [{:#x}, +{:#x})",
                        window.block,
                        window.paddr.as_usize(),
                        window.size
                    );
                    *slot = Some(handle);
                }
                None => {
                    error!(
                        "can't map {:?} at {:#x}, size {:#x}",
                        window.block,
                        window.paddr.as_usize(),
                        window.size
                    );
                    return Err(PmError::MapFailed {
                        block: Some(window.block),
                        paddr: window.paddr,
                    });
                }
            }
        }
        Ok(())
    }

    /// Unmaps every live slot in table order.
    ///
    /// A block whose mapping never succeeded has no handle and is not
    /// passed to [`RegisterIo::unmap`]; every block that was mapped is
    /// unmapped exactly once, however often this runs.
    pub fn release_maps(&mut self) {
        for window in self.windows {
            if let Some(handle) = self.slots[window.block.index()].take() {
                trace!("unmap {:?}", window.block);
                self.io.unmap(handle);
            }
        }
    }

    pub fn is_mapped(&self, block: RegBlock) -> bool {
        self.slots[block.index()].is_some()
    }

    /// Whether every window of the table is mapped.
    pub fn is_complete(&self) -> bool {
        self.windows.iter().all(|w| self.is_mapped(w.block))
    }

    pub fn windows(&self) -> &'static [RegWindow] {
        self.windows
    }

    /// Handle of a mapped block.
    pub fn handle(&self, block: RegBlock) -> PmResult<IO::Handle> {
        self.slots[block.index()].ok_or(PmError::NotMapped(block))
    }

    pub fn io(&mut self) -> &mut IO {
        &mut self.io
    }
}

impl<IO: RegisterIo> Drop for RegisterMaps<IO> {
    fn drop(&mut self) {
        self.release_maps();
    }
}
