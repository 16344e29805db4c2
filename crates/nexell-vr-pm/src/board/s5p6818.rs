//! S5P6818: the GPU sits behind a low-power interconnect (LPI) whose PBUS
//! and MBUS ports must be quiesced before reset and re-requested after.

use super::{PowerAck, PowerSequence, Steps};
use crate::{
    NxBoard,
    err::PmResult,
    hal::RegisterIo,
    regs::{LpiRequest, LpiStatus, RegBlock, SubUnits},
};

/// Power sequencer for the S5P6818.
pub struct S5p6818;

struct LpiPort {
    name: &'static str,
    active: LpiStatus,
    ack: LpiStatus,
    req: LpiRequest,
    wait_active: &'static str,
    wait_ack_low: &'static str,
    wait_ack_high: &'static str,
}

/// PBUS is always handled before MBUS.
const LPI_PORTS: [LpiPort; 2] = [
    LpiPort {
        name: "PBUS",
        active: LpiStatus::PBUS_ACTIVE,
        ack: LpiStatus::PBUS_ACK,
        req: LpiRequest::PBUS_CSYSREQ,
        wait_active: "PBUS LPI active",
        wait_ack_low: "PBUS LPI ack low",
        wait_ack_high: "PBUS LPI ack high",
    },
    LpiPort {
        name: "MBUS",
        active: LpiStatus::MBUS_ACTIVE,
        ack: LpiStatus::MBUS_ACK,
        req: LpiRequest::MBUS_CSYSREQ,
        wait_active: "MBUS LPI active",
        wait_ack_low: "MBUS LPI ack low",
        wait_ack_high: "MBUS LPI ack high",
    },
];

/// Drops the CSYSREQ of every port once it reports active, then waits for
/// the interconnect to acknowledge.
fn lpi_enter_reset<IO: RegisterIo>(steps: &mut Steps<'_, IO>) -> PmResult {
    let poll = steps.config().lpi_poll;
    for port in &LPI_PORTS {
        debug!("{}: enter LPI", port.name);
        let active = port.active.bits();
        steps.wait(RegBlock::LpiActive, 0, active, active, poll, port.wait_active)?;
        steps.modify(RegBlock::LpiReq, 0, port.req.bits(), 0)?;
        steps.wait(RegBlock::LpiActive, 0, port.ack.bits(), 0, poll, port.wait_ack_low)?;
    }
    Ok(())
}

/// Raises the CSYSREQ of every port and waits for its acknowledgement.
fn lpi_leave_reset<IO: RegisterIo>(steps: &mut Steps<'_, IO>) -> PmResult {
    let poll = steps.config().lpi_poll;
    for port in &LPI_PORTS {
        debug!("{}: leave LPI", port.name);
        let ack = port.ack.bits();
        steps.modify(RegBlock::LpiReq, 0, 0, port.req.bits())?;
        steps.wait(RegBlock::LpiActive, 0, ack, ack, poll, port.wait_ack_high)?;
    }
    Ok(())
}

impl PowerSequence for S5p6818 {
    const SUB_UNITS: SubUnits = NxBoard::S5p6818.sub_units();

    fn power_down<IO: RegisterIo>(steps: &mut Steps<'_, IO>) -> PmResult {
        lpi_enter_reset(steps)?;
        steps.assert_reset()?;
        steps.settle();
        steps.gate_clocks()?;
        steps.settle();
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
        lpi_leave_reset(steps)?;
        steps.release_reset()?;
        steps.settle();
        steps.mask_gpu_irq()?;
        steps.energize(Self::SUB_UNITS)
    }
}
