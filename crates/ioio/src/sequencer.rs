use std::sync::Arc;

use ioio_core::codec::encode::SequencerAction;
use ioio_core::codec::SequencerEvent;
use ioio_core::error::Result;
use ioio_core::resource_state::SequencerState;

use crate::board::Session;

/// The board's cue sequencer.
pub struct Sequencer {
    session: Arc<Session>,
    state: Arc<SequencerState>,
    generation: u64,
}

impl Sequencer {
    pub(crate) fn new(session: Arc<Session>, state: Arc<SequencerState>) -> Self {
        Sequencer {
            session,
            state,
            generation: 0,
        }
    }

    /// Pushes one cue onto the queue.
    pub fn push(&self, duration: u16, cue_bytes: &[u8]) -> Result<()> {
        self.session.sequencer_push(duration, cue_bytes)
    }

    /// Issues a control action (start/stop/pause/manual).
    pub fn control(&self, action: SequencerAction<'_>) -> Result<()> {
        self.session.sequencer_control(action)
    }

    /// Blocks for the next sequencer event.
    pub fn wait_for_next_event(&mut self) -> Result<SequencerEvent> {
        let (event, generation) = self.state.wait_for_next_event(self.generation)?;
        self.generation = generation;
        Ok(event)
    }

    /// Free cue slots remaining in the queue.
    pub fn free_slots(&self) -> Result<u8> {
        self.state.free_slots()
    }

    /// Whether the sequencer is currently paused.
    pub fn is_paused(&self) -> Result<bool> {
        self.state.is_paused()
    }

    /// Whether the sequencer has stalled on an empty queue mid-playback.
    pub fn is_stalled(&self) -> Result<bool> {
        self.state.is_stalled()
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.session.close_sequencer();
    }
}
