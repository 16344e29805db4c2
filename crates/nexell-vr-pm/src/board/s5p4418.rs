//! S5P4418: no interconnect handshake, Mali-400 MP2.

use super::{PowerAck, PowerSequence, Steps};
use crate::{NxBoard, err::PmResult, hal::RegisterIo, regs::SubUnits};

/// Power sequencer for the S5P4418.
pub struct S5p4418;

impl PowerSequence for S5p4418 {
    const SUB_UNITS: SubUnits = NxBoard::S5p4418.sub_units();

    fn power_down<IO: RegisterIo>(steps: &mut Steps<'_, IO>) -> PmResult {
        steps.assert_reset()?;
        steps.gate_clocks()?;
        steps.ready_power_gate()?;
        steps.isolate()?;
        steps.precharge(true)?;
        steps.settle();
        steps.power_switch(true)?;
        steps.settle();
        steps.wait_power_ack(PowerAck::Down)
    }

    fn power_up<IO: RegisterIo>(steps: &mut Steps<'_, IO>) -> PmResult {
        steps.ready_power_gate()?;
        steps.precharge(false)?;
        steps.power_switch(false)?;
        steps.settle();
        steps.deisolate()?;
        steps.settle();
        steps.wait_power_ack(PowerAck::Up)?;
        steps.ungate_clocks()?;
        steps.release_reset()?;
        steps.settle();
        steps.mask_gpu_irq()?;
        steps.energize(Self::SUB_UNITS)
    }
}
