//! Register access capability used by every sequencing step.

use core::{marker::PhantomData, ptr::NonNull, time::Duration};

use memory_addr::PhysAddr;

/// Maps physical register windows and performs 32-bit accesses on them.
///
/// All sequencing goes through this trait so the same code drives real
/// silicon (via [`Mmio`]) and a register simulator.
pub trait RegisterIo {
    /// Handle of a live mapping.
    type Handle: Copy;

    /// Makes `size` bytes at `paddr` accessible. Returns `None` on failure.
    fn map(&mut self, paddr: PhysAddr, size: usize) -> Option<Self::Handle>;

    /// Releases a mapping obtained from [`RegisterIo::map`].
    fn unmap(&mut self, handle: Self::Handle);

    /// Reads the 32-bit word at byte `offset` of the mapping.
    fn read(&mut self, handle: Self::Handle, offset: usize) -> u32;

    /// Writes the 32-bit word at byte `offset` of the mapping.
    fn write(&mut self, handle: Self::Handle, offset: usize, value: u32);

    /// Blocks the calling thread for `duration`.
    fn delay(&mut self, duration: Duration);
}

/// Kernel services backing [`Mmio`].
pub trait KernelIo {
    /// Maps a physical range as uncached device memory.
    fn iomap(paddr: PhysAddr, size: usize) -> Option<NonNull<u8>>;

    /// Unmaps a range returned by [`KernelIo::iomap`].
    fn iounmap(vaddr: NonNull<u8>, size: usize);

    /// Busy-waits for `duration`.
    fn busy_wait(duration: Duration);
}

/// A live device-memory mapping.
#[derive(Debug, Clone, Copy)]
pub struct MmioRegion {
    base: NonNull<u8>,
    size: usize,
}

unsafe impl Send for MmioRegion {}

impl MmioRegion {
    fn word(&self, offset: usize) -> *mut u32 {
        debug_assert!(offset % 4 == 0 && offset + 4 <= self.size);
        // SAFETY: offset is within the mapped window.
        unsafe { self.base.as_ptr().add(offset).cast() }
    }
}

/// [`RegisterIo`] over real device memory.
pub struct Mmio<K> {
    _kernel: PhantomData<K>,
}

impl<K: KernelIo> Mmio<K> {
    /// Register access through `K`'s mapping services.
    pub const fn new() -> Self {
        Self {
            _kernel: PhantomData,
        }
    }
}

impl<K: KernelIo> Default for Mmio<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: KernelIo> RegisterIo for Mmio<K> {
    type Handle = MmioRegion;

    fn map(&mut self, paddr: PhysAddr, size: usize) -> Option<MmioRegion> {
        K::iomap(paddr, size).map(|base| MmioRegion { base, size })
    }

    fn unmap(&mut self, handle: MmioRegion) {
        K::iounmap(handle.base, handle.size);
    }

    fn read(&mut self, handle: MmioRegion, offset: usize) -> u32 {
        // SAFETY: `handle` is a live device mapping and callers only pass
        // word offsets inside the window it was mapped with.
        unsafe { handle.word(offset).read_volatile() }
    }

    fn write(&mut self, handle: MmioRegion, offset: usize, value: u32) {
        // SAFETY: as for `read`.
        unsafe { handle.word(offset).write_volatile(value) }
    }

    fn delay(&mut self, duration: Duration) {
        K::busy_wait(duration);
    }
}
