//! Mali-400 platform device record and its registration with the host
//! driver framework.

use core::time::Duration;

use spin::Mutex;

use crate::{
    config::PmConfig,
    err::{PmError, PmResult},
    hal::RegisterIo,
    platform::VrPlatform,
    regs::MALI_BASE,
};

/// Name the Mali Utgard driver binds to.
pub const MALI_GPU_NAME: &str = "mali-utgard";
/// Interrupt line shared by every Mali-400 unit.
pub const MALI_IRQ: usize = 40;
/// 32-bit coherent DMA.
pub const MALI_DMA_MASK: u64 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Mem,
    Irq,
}

/// An inclusive `[start, end]` memory or interrupt range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub name: &'static str,
    pub kind: ResourceKind,
    pub start: usize,
    pub end: usize,
}

impl Resource {
    const fn mem(name: &'static str, offset: usize, size: usize) -> Self {
        Self {
            name,
            kind: ResourceKind::Mem,
            start: MALI_BASE + offset,
            end: MALI_BASE + offset + size - 1,
        }
    }

    const fn irq(name: &'static str) -> Self {
        Self {
            name,
            kind: ResourceKind::Irq,
            start: MALI_IRQ,
            end: MALI_IRQ,
        }
    }
}

/// Mali-400 MP2 with PMU.
pub static MALI400_MP2_PMU_RESOURCES: [Resource; 14] = [
    Resource::mem("Mali_L2", 0x1000, 0x200),
    Resource::mem("Mali_GP", 0x0000, 0x100),
    Resource::irq("Mali_GP_IRQ"),
    Resource::mem("Mali_GP_MMU", 0x3000, 0x100),
    Resource::irq("Mali_GP_MMU_IRQ"),
    Resource::mem("Mali_PP0", 0x8000, 0x1100),
    Resource::irq("Mali_PP0_IRQ"),
    Resource::mem("Mali_PP0_MMU", 0x4000, 0x100),
    Resource::irq("Mali_PP0_MMU_IRQ"),
    Resource::mem("Mali_PP1", 0xA000, 0x1100),
    Resource::irq("Mali_PP1_IRQ"),
    Resource::mem("Mali_PP1_MMU", 0x5000, 0x100),
    Resource::irq("Mali_PP1_MMU_IRQ"),
    Resource::mem("Mali_PMU", 0x2000, 0x100),
];

/// Auxiliary data handed to the GPU driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaliGpuData {
    pub shared_mem_size: usize,
    /// Zero when no framebuffer is reserved.
    pub fb_start: usize,
    pub fb_size: usize,
}

impl MaliGpuData {
    pub fn from_config(config: &PmConfig) -> Self {
        let (fb_start, fb_size) = config.fb_reserved.unwrap_or((0, 0));
        Self {
            shared_mem_size: config.shared_mem_size,
            fb_start,
            fb_size,
        }
    }
}

/// The device record handed to the host bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDevice {
    pub name: &'static str,
    pub id: i32,
    pub dma_mask: u64,
    pub resources: &'static [Resource],
    pub data: Option<MaliGpuData>,
}

impl PlatformDevice {
    pub const fn new(name: &'static str, id: i32) -> Self {
        Self {
            name,
            id,
            dma_mask: MALI_DMA_MASK,
            resources: &[],
            data: None,
        }
    }

    pub fn add_resources(&mut self, resources: &'static [Resource]) -> PmResult {
        if resources.is_empty() {
            return Err(PmError::InvalidParam);
        }
        if !self.resources.is_empty() {
            return Err(PmError::AlreadyExists);
        }
        self.resources = resources;
        Ok(())
    }

    pub fn add_data(&mut self, data: MaliGpuData) -> PmResult {
        if data.shared_mem_size == 0 {
            return Err(PmError::InvalidParam);
        }
        if self.data.is_some() {
            return Err(PmError::AlreadyExists);
        }
        self.data = Some(data);
        Ok(())
    }

    pub fn irqs(&self) -> impl Iterator<Item = usize> + '_ {
        self.resources
            .iter()
            .filter(|r| r.kind == ResourceKind::Irq)
            .map(|r| r.start)
    }
}

/// The host driver framework, as far as this driver needs it.
pub trait PlatformBus {
    /// Takes ownership of a device record.
    fn register(&mut self, dev: PlatformDevice) -> PmResult;

    /// Withdraws a record. Returns `None` if it was never registered.
    fn unregister(&mut self, name: &str, id: i32) -> Option<PlatformDevice>;

    /// Turns on runtime PM with auto-suspend after `autosuspend` idle.
    fn enable_runtime_pm(&mut self, name: &str, id: i32, autosuspend: Duration);
}

/// A registered GPU whose power the host runtime PM drives.
pub struct VrDevice<IO: RegisterIo> {
    name: &'static str,
    id: i32,
    platform: Mutex<VrPlatform<IO>>,
}

impl<IO: RegisterIo> VrDevice<IO> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn runtime_suspend(&self) -> PmResult {
        self.platform.lock().power_down_all()
    }

    pub fn runtime_resume(&self) -> PmResult {
        self.platform.lock().power_up_all()
    }

    /// Runs `f` with the platform locked.
    pub fn with_platform<T>(&self, f: impl FnOnce(&mut VrPlatform<IO>) -> T) -> T {
        f(&mut self.platform.lock())
    }
}

/// Powers the GPU up and registers it with `bus`.
///
/// If the record cannot be built or the bus rejects it, the record is
/// dropped and the GPU stays powered.
pub fn device_register<B, IO>(bus: &mut B, mut platform: VrPlatform<IO>) -> PmResult<VrDevice<IO>>
where
    B: PlatformBus,
    IO: RegisterIo,
{
    platform.platform_init()?;

    let mut dev = PlatformDevice::new(MALI_GPU_NAME, 0);
    let attached = dev
        .add_resources(&MALI400_MP2_PMU_RESOURCES)
        .and_then(|_| dev.add_data(MaliGpuData::from_config(platform.config())))
        .and_then(|_| bus.register(dev));
    if let Err(e) = attached {
        error!("failed to register {MALI_GPU_NAME}: {e}");
        warn!("GPU is left powered up");
        return Err(e);
    }

    let autosuspend = platform.config().autosuspend_delay;
    bus.enable_runtime_pm(MALI_GPU_NAME, 0, autosuspend);
    info!("{MALI_GPU_NAME}.0 registered, autosuspend {autosuspend:?}");

    Ok(VrDevice {
        name: MALI_GPU_NAME,
        id: 0,
        platform: Mutex::new(platform),
    })
}

/// Withdraws the device from `bus`, then powers the GPU down and unmaps
/// its registers.
pub fn device_unregister<B, IO>(bus: &mut B, dev: VrDevice<IO>) -> PmResult
where
    B: PlatformBus,
    IO: RegisterIo,
{
    if bus.unregister(dev.name, dev.id).is_none() {
        warn!("{}.{} was not registered", dev.name, dev.id);
    }
    let mut platform = dev.platform.into_inner();
    platform.platform_deinit()
}
