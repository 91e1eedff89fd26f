use std::sync::Arc;

use ioio_core::error::Result;
use ioio_core::resource_state::IcspState;

use crate::board::Session;

/// The board's ICSP master, used to bring a target PIC into low-voltage
/// programming mode and shift SIX/REGOUT instructions.
pub struct IcspMaster {
    session: Arc<Session>,
    state: Arc<IcspState>,
}

impl IcspMaster {
    pub(crate) fn new(session: Arc<Session>, state: Arc<IcspState>) -> Self {
        IcspMaster { session, state }
    }

    /// Sends a 24-bit SIX instruction.
    pub fn six(&self, instruction: u32) -> Result<()> {
        self.session.icsp_six(instruction)
    }

    /// Requests the next VISI register read, blocking for the result.
    pub fn regout(&self) -> Result<u16> {
        self.session.icsp_regout(&self.state)
    }
}

impl Drop for IcspMaster {
    fn drop(&mut self) {
        self.session.close_icsp();
    }
}
