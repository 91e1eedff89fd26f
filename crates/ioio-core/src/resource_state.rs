//! Per-resource state (C6): the blocking, condvar-backed state objects that
//! facade methods wait on.
//!
//! Rust has no equivalent to interrupting a blocked thread from outside it.
//! Every wait here is therefore modelled as a loop over three conditions —
//! the predicate the caller wants, whether the session has disconnected,
//! and an [`AtomicBool`] interrupt flag — woken by
//! [`Cancellable::notify_all`] on every state change and by
//! [`Cancellable::interrupt`] specifically to cancel one blocked caller (§5).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use heapless::Deque;

use crate::codec::{SequencerEvent, TwiTransactionOutcome};
use crate::error::{IoioError, Result};

/// Shared plumbing every per-resource state object embeds: the condvar used
/// to wake blocked waiters, and the interrupt/disconnect/soft-reset flags
/// they check.
pub struct Cancellable {
    condvar: Condvar,
    interrupted: AtomicBool,
    disconnected: AtomicBool,
    soft_reset: AtomicBool,
}

impl Cancellable {
    /// Creates a fresh, non-interrupted, connected waiter.
    #[must_use]
    pub fn new() -> Self {
        Cancellable {
            condvar: Condvar::new(),
            interrupted: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
            soft_reset: AtomicBool::new(false),
        }
    }

    /// Wakes every thread blocked in [`wait_while`](Self::wait_while) on
    /// this object, without changing the interrupt or disconnect flags.
    /// Call after mutating the guarded state so waiters re-check their
    /// predicate.
    pub fn notify_all(&self) {
        self.condvar.notify_all();
    }

    /// Marks this resource's session as disconnected and wakes every
    /// waiter; they observe [`IoioError::ConnectionLost`].
    pub fn mark_disconnected(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    /// Marks this resource as implicitly closed by a device-initiated
    /// `SOFT_RESET` (§4.3, §9 "soft reset semantics"): the session stays
    /// CONNECTED, but this particular resource is gone and its descriptor
    /// has already been returned to the resource manager by the time
    /// waiters observe [`IoioError::IllegalState`] — distinct from
    /// [`mark_disconnected`](Self::mark_disconnected), which tears down the
    /// whole session.
    pub fn mark_soft_reset(&self) {
        self.soft_reset.store(true, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    /// Cancels exactly the intent of one blocked waiter: sets the interrupt
    /// flag and wakes every waiter on this object. A waiter that observes
    /// the flag returns [`IoioError::Interrupted`]; the flag is cleared by
    /// the same call that observes it, so later waits are unaffected.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    /// Blocks on `guard`'s condvar until `predicate(&guard)` holds, the
    /// session disconnects, this resource is soft-reset away, or this
    /// waiter is interrupted — whichever comes first.
    pub fn wait_while<'a, T>(
        &self,
        mut guard: MutexGuard<'a, T>,
        mut predicate: impl FnMut(&T) -> bool,
    ) -> Result<MutexGuard<'a, T>> {
        loop {
            if self.disconnected.load(Ordering::SeqCst) {
                return Err(IoioError::ConnectionLost);
            }
            if self.soft_reset.load(Ordering::SeqCst) {
                return Err(IoioError::IllegalState);
            }
            if self.interrupted.swap(false, Ordering::SeqCst) {
                return Err(IoioError::Interrupted);
            }
            if !predicate(&guard) {
                return Ok(guard);
            }
            guard = self
                .condvar
                .wait(guard)
                .map_err(|_| IoioError::ConnectionLost)?;
        }
    }

    /// As [`wait_while`](Self::wait_while), but gives up and returns
    /// [`IoioError::IllegalState`] if `deadline` passes before the predicate
    /// clears (used for the caller-supplied timeouts on blocking reads).
    pub fn wait_while_until<'a, T>(
        &self,
        mut guard: MutexGuard<'a, T>,
        mut predicate: impl FnMut(&T) -> bool,
        deadline: Instant,
    ) -> Result<MutexGuard<'a, T>> {
        loop {
            if self.disconnected.load(Ordering::SeqCst) {
                return Err(IoioError::ConnectionLost);
            }
            if self.soft_reset.load(Ordering::SeqCst) {
                return Err(IoioError::IllegalState);
            }
            if self.interrupted.swap(false, Ordering::SeqCst) {
                return Err(IoioError::Interrupted);
            }
            if !predicate(&guard) {
                return Ok(guard);
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Err(IoioError::IllegalState);
            };
            let (new_guard, timeout) = self
                .condvar
                .wait_timeout(guard, remaining)
                .map_err(|_| IoioError::ConnectionLost)?;
            guard = new_guard;
            if timeout.timed_out() && !predicate(&guard) {
                return Ok(guard);
            }
        }
    }
}

impl Default for Cancellable {
    fn default() -> Self {
        Self::new()
    }
}

/// State for a single digital input pin: the last level reported by
/// `REPORT_DIGITAL_IN_STATUS`, and whether change-notify is armed.
pub struct PinInputState {
    cancel: Cancellable,
    inner: Mutex<PinInputInner>,
}

struct PinInputInner {
    level: bool,
    generation: u64,
}

impl PinInputState {
    /// Creates a pin input state with an unknown initial level.
    #[must_use]
    pub fn new() -> Self {
        PinInputState {
            cancel: Cancellable::new(),
            inner: Mutex::new(PinInputInner {
                level: false,
                generation: 0,
            }),
        }
    }

    /// Records a newly reported level and wakes anyone waiting on a change.
    pub fn on_status(&self, level: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.level = level;
            inner.generation = inner.generation.wrapping_add(1);
        }
        self.cancel.notify_all();
    }

    /// The most recently reported level, without blocking.
    pub fn read(&self) -> Result<bool> {
        let inner = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        Ok(inner.level)
    }

    /// Blocks until a level different from `generation`'s has been reported,
    /// returning the new level and the generation it arrived at.
    pub fn wait_for_change(&self, since_generation: u64) -> Result<(bool, u64)> {
        let guard = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        let guard = self
            .cancel
            .wait_while(guard, |inner| inner.generation == since_generation)?;
        Ok((guard.level, guard.generation))
    }

    /// The interrupt/disconnect plumbing shared with the dispatcher and the
    /// session, for `mark_disconnected`/`interrupt`.
    #[must_use]
    pub fn cancellable(&self) -> &Cancellable {
        &self.cancel
    }
}

impl Default for PinInputState {
    fn default() -> Self {
        Self::new()
    }
}

/// State for a duplex byte stream peripheral (UART, SPI response data): an
/// inbound FIFO plus a count of bytes the firmware still has queued to send.
pub struct StreamState {
    cancel: Cancellable,
    inner: Mutex<StreamInner>,
}

struct StreamInner {
    inbound: Deque<u8, 256>,
    tx_remaining: u16,
    open: bool,
}

impl StreamState {
    /// Creates a closed stream state with empty buffers.
    #[must_use]
    pub fn new() -> Self {
        StreamState {
            cancel: Cancellable::new(),
            inner: Mutex::new(StreamInner {
                inbound: Deque::new(),
                tx_remaining: 0,
                open: false,
            }),
        }
    }

    /// Appends inbound bytes from a `UART_DATA`/`SPI_DATA` event, dropping
    /// the oldest buffered bytes if the FIFO is full (the firmware-side
    /// buffer is bounded; a full host-side FIFO means the caller isn't
    /// draining fast enough).
    pub fn on_inbound(&self, bytes: &[u8]) {
        if let Ok(mut inner) = self.inner.lock() {
            for &b in bytes {
                if inner.inbound.is_full() {
                    inner.inbound.pop_front();
                }
                let _ = inner.inbound.push_back(b);
            }
        }
        self.cancel.notify_all();
    }

    /// Records the module open/closed status from a `*_STATUS` event.
    pub fn on_status(&self, open: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.open = open;
        }
        self.cancel.notify_all();
    }

    /// Records remaining-TX-bytes from a `*_REPORT_TX_STATUS` event.
    pub fn on_tx_status(&self, remaining: u16) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.tx_remaining = remaining;
        }
        self.cancel.notify_all();
    }

    /// Blocks until at least one inbound byte is available, then drains up
    /// to `buf.len()` bytes into it, returning the number read.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let guard = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        let mut guard = self
            .cancel
            .wait_while(guard, |inner| inner.inbound.is_empty())?;
        let mut count = 0;
        for slot in buf.iter_mut() {
            let Some(byte) = guard.inbound.pop_front() else {
                break;
            };
            *slot = byte;
            count = count.saturating_add(1);
        }
        Ok(count)
    }

    /// Blocks until the firmware reports it has fully drained its TX buffer
    /// for this module (used to implement flush-on-close semantics).
    pub fn wait_for_tx_drained(&self) -> Result<()> {
        let guard = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        let _guard = self
            .cancel
            .wait_while(guard, |inner| inner.tx_remaining > 0)?;
        Ok(())
    }

    /// The interrupt/disconnect plumbing shared with the dispatcher.
    #[must_use]
    pub fn cancellable(&self) -> &Cancellable {
        &self.cancel
    }
}

impl Default for StreamState {
    fn default() -> Self {
        Self::new()
    }
}

/// State for a single-shot request/response transaction (SPI master
/// request, I2C write-read): the caller blocks on [`wait_for_result`](Self::wait_for_result)
/// after issuing the request.
pub struct TransactionState<T> {
    cancel: Cancellable,
    inner: Mutex<Option<T>>,
}

impl<T> TransactionState<T> {
    /// Creates a transaction state with no pending result.
    #[must_use]
    pub fn new() -> Self {
        TransactionState {
            cancel: Cancellable::new(),
            inner: Mutex::new(None),
        }
    }

    /// Records the result of the single in-flight transaction and wakes the
    /// waiter.
    pub fn complete(&self, result: T) {
        if let Ok(mut inner) = self.inner.lock() {
            *inner = Some(result);
        }
        self.cancel.notify_all();
    }

    /// Blocks until [`complete`](Self::complete) is called, then returns
    /// (and clears) the result.
    pub fn wait_for_result(&self) -> Result<T> {
        let guard = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        let mut guard = self.cancel.wait_while(guard, |inner| inner.is_none())?;
        guard
            .take()
            .ok_or(IoioError::IllegalState)
    }

    /// The interrupt/disconnect plumbing shared with the dispatcher.
    #[must_use]
    pub fn cancellable(&self) -> &Cancellable {
        &self.cancel
    }
}

impl<T> Default for TransactionState<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// State for a 10-bit sampled input pin: analog-in readings and cap-sense
/// readings share this exact shape (§3: "analog pins: 10-bit-class last
/// reading + open flag"; §4.3 `CAPSENSE_REPORT` is the same width).
pub struct SampledInputState {
    cancel: Cancellable,
    inner: Mutex<SampledInner>,
}

struct SampledInner {
    value: u16,
    open: bool,
    generation: u64,
}

impl SampledInputState {
    /// Creates a closed sampled-input state with no reading yet.
    #[must_use]
    pub fn new() -> Self {
        SampledInputState {
            cancel: Cancellable::new(),
            inner: Mutex::new(SampledInner {
                value: 0,
                open: false,
                generation: 0,
            }),
        }
    }

    /// Records the open/closed transition inferred from a
    /// `REPORT_ANALOG_IN_FORMAT` symmetric-difference (analog) or an
    /// explicit enable/disable command echo (cap-sense).
    pub fn on_open(&self, open: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.open = open;
        }
        self.cancel.notify_all();
    }

    /// Records a newly reported 10-bit sample.
    pub fn on_sample(&self, value: u16) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.value = value;
            inner.generation = inner.generation.wrapping_add(1);
        }
        self.cancel.notify_all();
    }

    /// The most recently reported sample, without blocking.
    pub fn read(&self) -> Result<u16> {
        let inner = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        Ok(inner.value)
    }

    /// Blocks until a sample past `since_generation` arrives.
    pub fn wait_for_change(&self, since_generation: u64) -> Result<(u16, u64)> {
        let guard = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        let guard = self
            .cancel
            .wait_while(guard, |inner| inner.generation == since_generation)?;
        Ok((guard.value, guard.generation))
    }

    /// The interrupt/disconnect/soft-reset plumbing.
    #[must_use]
    pub fn cancellable(&self) -> &Cancellable {
        &self.cancel
    }
}

impl Default for SampledInputState {
    fn default() -> Self {
        Self::new()
    }
}

/// State for an input-capture channel (single or double): the last captured
/// value (1-4 raw bytes per `INCAP_REPORT`, §4.3) and its open/close status.
pub struct IncapState {
    cancel: Cancellable,
    inner: Mutex<IncapInner>,
}

struct IncapInner {
    value: heapless::Vec<u8, 4>,
    open: bool,
    generation: u64,
}

impl IncapState {
    /// Creates a closed input-capture state with no reading yet.
    #[must_use]
    pub fn new() -> Self {
        IncapState {
            cancel: Cancellable::new(),
            inner: Mutex::new(IncapInner {
                value: heapless::Vec::new(),
                open: false,
                generation: 0,
            }),
        }
    }

    /// Records the open/closed echo from `INCAP_STATUS`.
    pub fn on_status(&self, open: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.open = open;
        }
        self.cancel.notify_all();
    }

    /// Records a capture result from `INCAP_REPORT`.
    pub fn on_report(&self, value: &[u8]) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.value = heapless::Vec::from_slice(value).unwrap_or_default();
            inner.generation = inner.generation.wrapping_add(1);
        }
        self.cancel.notify_all();
    }

    /// Blocks until a capture past `since_generation` arrives.
    pub fn wait_for_capture(&self, since_generation: u64) -> Result<(heapless::Vec<u8, 4>, u64)> {
        let guard = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        let guard = self
            .cancel
            .wait_while(guard, |inner| inner.generation == since_generation)?;
        Ok((guard.value.clone(), guard.generation))
    }

    /// The interrupt/disconnect/soft-reset plumbing.
    #[must_use]
    pub fn cancellable(&self) -> &Cancellable {
        &self.cancel
    }
}

impl Default for IncapState {
    fn default() -> Self {
        Self::new()
    }
}

/// State for the ICSP master: a FIFO of VISI read results plus the RX
/// back-pressure counter (§3 "ICSP: a FIFO of VISI read results"; §4.3
/// `ICSP_RESULT`/`ICSP_REPORT_RX_STATUS`).
pub struct IcspState {
    cancel: Cancellable,
    inner: Mutex<IcspInner>,
}

struct IcspInner {
    visi_fifo: VecDeque<u16>,
    rx_remaining: u16,
    open: bool,
}

impl IcspState {
    /// Creates a closed ICSP state with an empty VISI FIFO.
    #[must_use]
    pub fn new() -> Self {
        IcspState {
            cancel: Cancellable::new(),
            inner: Mutex::new(IcspInner {
                visi_fifo: VecDeque::new(),
                rx_remaining: 0,
                open: false,
            }),
        }
    }

    /// Pushes a VISI read result from `ICSP_RESULT`.
    pub fn on_result(&self, visi: u16) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.visi_fifo.push_back(visi);
        }
        self.cancel.notify_all();
    }

    /// Records remaining-RX-bytes from `ICSP_REPORT_RX_STATUS`.
    pub fn on_rx_status(&self, remaining: u16) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.rx_remaining = remaining;
        }
        self.cancel.notify_all();
    }

    /// Records the open/closed echo from `ICSP_CONFIG`.
    pub fn on_config_echo(&self, open: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.open = open;
        }
        self.cancel.notify_all();
    }

    /// Blocks until a VISI result is available, then pops and returns it.
    pub fn wait_visi_result(&self) -> Result<u16> {
        let guard = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        let mut guard = self
            .cancel
            .wait_while(guard, |inner| inner.visi_fifo.is_empty())?;
        guard.visi_fifo.pop_front().ok_or(IoioError::IllegalState)
    }

    /// The interrupt/disconnect/soft-reset plumbing.
    #[must_use]
    pub fn cancellable(&self) -> &Cancellable {
        &self.cancel
    }
}

impl Default for IcspState {
    fn default() -> Self {
        Self::new()
    }
}

/// State for the cue sequencer: paused/stalled/closed flags, the firmware's
/// reported free cue-queue slot count, and an event cursor (§3, §4.3
/// `SEQUENCER_EVENT`).
pub struct SequencerState {
    cancel: Cancellable,
    inner: Mutex<SequencerInner>,
}

struct SequencerInner {
    paused: bool,
    stalled: bool,
    closed: bool,
    free_slots: u8,
    generation: u64,
    last_event: Option<SequencerEvent>,
}

impl SequencerState {
    /// Creates a sequencer state with no event observed yet.
    #[must_use]
    pub fn new() -> Self {
        SequencerState {
            cancel: Cancellable::new(),
            inner: Mutex::new(SequencerInner {
                paused: false,
                stalled: false,
                closed: true,
                free_slots: 0,
                generation: 0,
                last_event: None,
            }),
        }
    }

    /// Applies a `SEQUENCER_EVENT` and wakes waiters.
    pub fn on_event(&self, event: SequencerEvent) {
        if let Ok(mut inner) = self.inner.lock() {
            match event {
                SequencerEvent::Paused => inner.paused = true,
                SequencerEvent::Stalled => inner.stalled = true,
                SequencerEvent::Opened { free_slots } => {
                    inner.paused = false;
                    inner.stalled = false;
                    inner.closed = false;
                    inner.free_slots = free_slots;
                }
                SequencerEvent::NextCue => {
                    inner.paused = false;
                    inner.stalled = false;
                }
                SequencerEvent::Stopped { free_slots } => {
                    inner.paused = false;
                    inner.free_slots = free_slots;
                }
                SequencerEvent::Closed => inner.closed = true,
            }
            inner.generation = inner.generation.wrapping_add(1);
            inner.last_event = Some(event);
        }
        self.cancel.notify_all();
    }

    /// Blocks until an event past `since_generation` is applied.
    pub fn wait_for_next_event(&self, since_generation: u64) -> Result<(SequencerEvent, u64)> {
        let guard = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        let guard = self
            .cancel
            .wait_while(guard, |inner| inner.generation == since_generation)?;
        let event = guard.last_event.ok_or(IoioError::IllegalState)?;
        Ok((event, guard.generation))
    }

    /// The number of free cue-queue slots as of the last event.
    pub fn free_slots(&self) -> Result<u8> {
        let inner = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        Ok(inner.free_slots)
    }

    /// Whether the sequencer is currently paused.
    pub fn is_paused(&self) -> Result<bool> {
        let inner = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        Ok(inner.paused)
    }

    /// Whether the sequencer's cue queue has run dry while playing.
    pub fn is_stalled(&self) -> Result<bool> {
        let inner = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        Ok(inner.stalled)
    }

    /// The interrupt/disconnect/soft-reset plumbing.
    #[must_use]
    pub fn cancellable(&self) -> &Cancellable {
        &self.cancel
    }
}

impl Default for SequencerState {
    fn default() -> Self {
        Self::new()
    }
}

/// A FIFO of in-flight request/response slots, used by SPI and TWI master
/// transactions (§4.6: "SPI/TWI transactions are matched to responses
/// strictly in FIFO order per module; a response always belongs to the
/// request at the head of the pending queue").
pub struct PendingQueue<T> {
    cancel: Cancellable,
    inner: Mutex<VecDeque<Arc<Mutex<Option<T>>>>>,
}

/// A single request's completion slot, returned by
/// [`PendingQueue::push_request`] and consumed by
/// [`PendingQueue::wait_for`].
pub type PendingSlot<T> = Arc<Mutex<Option<T>>>;

impl<T> PendingQueue<T> {
    /// Creates an empty pending-request queue.
    #[must_use]
    pub fn new() -> Self {
        PendingQueue {
            cancel: Cancellable::new(),
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Registers a new in-flight request. The caller must issue the wire
    /// command for it (inside the same outgoing-channel batch, so a
    /// concurrent request from another thread cannot land on the wire
    /// between the two) before the device can possibly complete it out of
    /// order relative to this call.
    pub fn push_request(&self) -> Result<PendingSlot<T>> {
        let slot: PendingSlot<T> = Arc::new(Mutex::new(None));
        let mut inner = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        inner.push_back(Arc::clone(&slot));
        Ok(slot)
    }

    /// Completes the request at the head of the queue. Called by the
    /// dispatcher on a `*_RESULT`/`*_DATA` event for this module; firmware
    /// never reports out of order, so the head is always the right match.
    pub fn complete_head(&self, result: T) {
        let slot = match self.inner.lock() {
            Ok(mut inner) => inner.pop_front(),
            Err(_) => None,
        };
        if let Some(slot) = slot {
            if let Ok(mut guard) = slot.lock() {
                *guard = Some(result);
            }
        }
        self.cancel.notify_all();
    }

    /// Blocks until `slot` (as returned by
    /// [`push_request`](Self::push_request)) has been completed.
    pub fn wait_for(&self, slot: &PendingSlot<T>) -> Result<T> {
        let guard = slot.lock().map_err(|_| IoioError::ConnectionLost)?;
        let mut guard = self.cancel.wait_while(guard, |inner| inner.is_none())?;
        guard.take().ok_or(IoioError::IllegalState)
    }

    /// The interrupt/disconnect/soft-reset plumbing.
    #[must_use]
    pub fn cancellable(&self) -> &Cancellable {
        &self.cancel
    }
}

impl<T> Default for PendingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// State for an SPI master module: the stream's open/TX-status tracking
/// (shared shape with UART) plus a FIFO of in-flight `SPI_MASTER_REQUEST`
/// responses.
pub struct SpiState {
    /// Open flag and outstanding-TX byte counter, same shape as UART.
    pub stream: StreamState,
    /// In-flight requests awaiting their `SPI_DATA` response.
    pub pending: PendingQueue<SpiResponse>,
}

/// One completed SPI transaction's response bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiResponse {
    /// Slave-select pin used for the originating request.
    pub ss_pin: u8,
    /// Response bytes.
    pub data: heapless::Vec<u8, 64>,
}

impl SpiState {
    /// Creates a closed SPI module state.
    #[must_use]
    pub fn new() -> Self {
        SpiState {
            stream: StreamState::new(),
            pending: PendingQueue::new(),
        }
    }
}

impl Default for SpiState {
    fn default() -> Self {
        Self::new()
    }
}

/// State for a TWI/I2C master module: the stream's open/TX-status tracking
/// plus a FIFO of in-flight `I2C_WRITE_READ` transactions.
pub struct TwiState {
    /// Open flag and outstanding-TX byte counter, same shape as UART.
    pub stream: StreamState,
    /// In-flight transactions awaiting their `I2C_RESULT`.
    pub pending: PendingQueue<TwiTransactionOutcome>,
}

impl TwiState {
    /// Creates a closed TWI module state.
    #[must_use]
    pub fn new() -> Self {
        TwiState {
            stream: StreamState::new(),
            pending: PendingQueue::new(),
        }
    }
}

impl Default for TwiState {
    fn default() -> Self {
        Self::new()
    }
}

/// A duration-bounded variant of [`Cancellable::wait_while`] exposed for
/// facades that accept a caller timeout (e.g. `Uart::read_with_timeout`).
#[must_use]
pub fn deadline_from(timeout: Duration) -> Instant {
    Instant::now() + timeout
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration as StdDuration;

    #[test]
    fn pin_input_wait_for_change_blocks_until_status() {
        let state = Arc::new(PinInputState::new());
        let reader = Arc::clone(&state);
        let handle = thread::spawn(move || reader.wait_for_change(0));
        thread::sleep(StdDuration::from_millis(20));
        state.on_status(true);
        let (level, generation) = handle.join().expect("thread joins").expect("not interrupted");
        assert!(level);
        assert_eq!(generation, 1);
    }

    #[test]
    fn interrupt_wakes_a_blocked_waiter() {
        let state = Arc::new(PinInputState::new());
        let reader = Arc::clone(&state);
        let handle = thread::spawn(move || reader.wait_for_change(0));
        thread::sleep(StdDuration::from_millis(20));
        state.cancellable().interrupt();
        let result = handle.join().expect("thread joins");
        assert!(matches!(result, Err(IoioError::Interrupted)));
    }

    #[test]
    fn mark_disconnected_wakes_every_waiter_with_connection_lost() {
        let state = Arc::new(StreamState::new());
        let reader = Arc::clone(&state);
        let handle = thread::spawn(move || {
            let mut local = [0u8; 8];
            reader.read(&mut local)
        });
        thread::sleep(StdDuration::from_millis(20));
        state.cancellable().mark_disconnected();
        let result = handle.join().expect("thread joins");
        assert!(matches!(result, Err(IoioError::ConnectionLost)));
    }

    #[test]
    fn stream_state_drains_in_fifo_order() {
        let state = StreamState::new();
        state.on_inbound(&[1, 2, 3]);
        let mut buf = [0u8; 2];
        let read = state.read(&mut buf).expect("data already buffered");
        assert_eq!(read, 2);
        assert_eq!(buf, [1, 2]);
    }

    #[test]
    fn transaction_state_round_trips_a_result() {
        let state: TransactionState<u32> = TransactionState::new();
        state.complete(42);
        let result = state.wait_for_result().expect("result already completed");
        assert_eq!(result, 42);
    }

    #[test]
    fn soft_reset_yields_illegal_state_not_connection_lost() {
        let state = Arc::new(PinInputState::new());
        let reader = Arc::clone(&state);
        let handle = thread::spawn(move || reader.wait_for_change(0));
        thread::sleep(StdDuration::from_millis(20));
        state.cancellable().mark_soft_reset();
        let result = handle.join().expect("thread joins");
        assert!(matches!(result, Err(IoioError::IllegalState)));
    }

    #[test]
    fn sampled_input_tracks_open_flag_and_samples() {
        let state = SampledInputState::new();
        state.on_open(true);
        state.on_sample(512);
        assert_eq!(state.read().unwrap(), 512);
    }

    #[test]
    fn incap_report_replaces_value_and_bumps_generation() {
        let state = Arc::new(IncapState::new());
        state.on_status(true);
        let reader = Arc::clone(&state);
        let handle = thread::spawn(move || reader.wait_for_capture(0));
        thread::sleep(StdDuration::from_millis(20));
        state.on_report(&[0x01, 0x02]);
        let (value, generation) = handle.join().expect("thread joins").expect("not cancelled");
        assert_eq!(&value[..], &[0x01, 0x02]);
        assert_eq!(generation, 1);
    }

    #[test]
    fn icsp_visi_results_drain_in_fifo_order() {
        let state = IcspState::new();
        state.on_result(0x1234);
        state.on_result(0x5678);
        assert_eq!(state.wait_visi_result().unwrap(), 0x1234);
        assert_eq!(state.wait_visi_result().unwrap(), 0x5678);
    }

    #[test]
    fn sequencer_opened_then_stopped_tracks_free_slots() {
        let state = SequencerState::new();
        state.on_event(SequencerEvent::Opened { free_slots: 8 });
        assert_eq!(state.free_slots().unwrap(), 8);
        assert!(!state.is_paused().unwrap());
        state.on_event(SequencerEvent::Paused);
        assert!(state.is_paused().unwrap());
        state.on_event(SequencerEvent::Stopped { free_slots: 8 });
        assert!(!state.is_paused().unwrap());
        assert_eq!(state.free_slots().unwrap(), 8);
    }

    #[test]
    fn pending_queue_matches_responses_to_requests_in_fifo_order() {
        let queue: PendingQueue<u8> = PendingQueue::new();
        let first = queue.push_request().unwrap();
        let second = queue.push_request().unwrap();
        queue.complete_head(1);
        queue.complete_head(2);
        assert_eq!(queue.wait_for(&first).unwrap(), 1);
        assert_eq!(queue.wait_for(&second).unwrap(), 2);
    }
}
