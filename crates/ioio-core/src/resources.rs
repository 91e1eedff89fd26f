//! Resource manager (C4): pin ownership and per-kind instance id pools.
//!
//! A board exposes a fixed pin count and fixed per-peripheral-kind instance
//! pools (so many UART ids, so many PWM ids, …), sized by the board's
//! [`crate::capability::CapabilityTable`]. The resource manager is the one
//! place that hands those out and takes them back, so two facades can never
//! be told they both own pin 13.

use std::sync::Mutex;

use crate::capability::CapabilityTable;
use crate::error::{IoioError, Result};

/// Which instance pool a non-pin resource is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// PWM (OUTCOMPARE) channel.
    Outcompare,
    /// UART module.
    Uart,
    /// SPI module.
    Spi,
    /// I2C/TWI module.
    Twi,
    /// Single-edge input-capture channel.
    IncapSingle,
    /// Dual-edge (double) input-capture channel.
    IncapDouble,
    /// ICSP master (the board has exactly one).
    Icsp,
    /// Cue sequencer (the board has exactly one).
    Sequencer,
}

/// A claimed resource: a pin, or a pin plus an instance id from one of the
/// per-kind pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// A single claimed pin.
    Pin(u8),
    /// An instance from a per-kind pool.
    Instance(ResourceKind, u8),
}

struct Inner {
    pins: u64,
    outcompare: u64,
    uart: u64,
    spi: u64,
    twi: u64,
    incap: u64,
    icsp: bool,
    sequencer: bool,
}

/// Tracks which pins and peripheral instance ids are currently allocated.
///
/// INCAP_SINGLE and INCAP_DOUBLE share one underlying id pool: a double
/// capture consumes two adjacent single-capture ids (§3 data model), so
/// both draw from `incap`.
pub struct ResourceManager {
    capabilities: CapabilityTable,
    inner: Mutex<Inner>,
}

impl ResourceManager {
    /// Creates a resource manager with every pool empty, sized to `capabilities`.
    #[must_use]
    pub fn new(capabilities: CapabilityTable) -> Self {
        ResourceManager {
            capabilities,
            inner: Mutex::new(Inner {
                pins: 0,
                outcompare: 0,
                uart: 0,
                spi: 0,
                twi: 0,
                incap: 0,
                icsp: false,
                sequencer: false,
            }),
        }
    }

    /// This board's capability table.
    #[must_use]
    pub const fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    /// Claims `pin` for exclusive use. Fails with
    /// [`IoioError::OutOfResource`] if `pin` is out of range or already
    /// owned.
    pub fn claim_pin(&self, pin: u8) -> Result<()> {
        if pin >= self.capabilities.pin_count() {
            return Err(IoioError::OutOfResource);
        }
        let mut inner = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        let bit = bit_for(pin)?;
        if inner.pins & bit != 0 {
            return Err(IoioError::OutOfResource);
        }
        inner.pins |= bit;
        Ok(())
    }

    /// Releases a pin claimed with [`claim_pin`](Self::claim_pin). A no-op
    /// if the pin was not claimed.
    pub fn release_pin(&self, pin: u8) {
        if let Ok(mut inner) = self.inner.lock() {
            if let Ok(bit) = bit_for(pin) {
                inner.pins &= !bit;
            }
        }
    }

    /// Claims the lowest-numbered free instance id in `kind`'s pool. Fails
    /// with [`IoioError::OutOfResource`] if the pool is exhausted.
    pub fn claim_instance(&self, kind: ResourceKind) -> Result<u8> {
        let pool_size = self.pool_size(kind);
        let mut inner = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        match kind {
            ResourceKind::Icsp => {
                if inner.icsp {
                    return Err(IoioError::OutOfResource);
                }
                inner.icsp = true;
                return Ok(0);
            }
            ResourceKind::Sequencer => {
                if inner.sequencer {
                    return Err(IoioError::OutOfResource);
                }
                inner.sequencer = true;
                return Ok(0);
            }
            _ => {}
        }
        let mask = Self::pool_mut(&mut inner, kind);
        for id in 0..pool_size {
            let bit = bit_for(id)?;
            if *mask & bit == 0 {
                *mask |= bit;
                return Ok(id);
            }
        }
        Err(IoioError::OutOfResource)
    }

    /// Claims a pair of adjacent ids from the INCAP pool for an
    /// `IncapDouble`. Both ids are reserved atomically: either both are free
    /// or neither is claimed.
    pub fn claim_incap_double(&self) -> Result<(u8, u8)> {
        let pool_size = self.capabilities.incap_pool_size();
        let mut inner = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        let mut id = 0u8;
        while id.checked_add(1).is_some_and(|next| next < pool_size) {
            let low = bit_for(id)?;
            let high = bit_for(id + 1)?;
            if inner.incap & low == 0 && inner.incap & high == 0 {
                inner.incap |= low | high;
                return Ok((id, id + 1));
            }
            id = id.saturating_add(2);
        }
        Err(IoioError::OutOfResource)
    }

    /// Releases an instance id claimed with
    /// [`claim_instance`](Self::claim_instance).
    pub fn release_instance(&self, kind: ResourceKind, id: u8) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        match kind {
            ResourceKind::Icsp => inner.icsp = false,
            ResourceKind::Sequencer => inner.sequencer = false,
            _ => {
                if let Ok(bit) = bit_for(id) {
                    *Self::pool_mut(&mut inner, kind) &= !bit;
                }
            }
        }
    }

    /// Releases both ids claimed with
    /// [`claim_incap_double`](Self::claim_incap_double).
    pub fn release_incap_double(&self, low: u8, high: u8) {
        if let Ok(mut inner) = self.inner.lock() {
            if let (Ok(low_bit), Ok(high_bit)) = (bit_for(low), bit_for(high)) {
                inner.incap &= !(low_bit | high_bit);
            }
        }
    }

    fn pool_size(&self, kind: ResourceKind) -> u8 {
        match kind {
            ResourceKind::Outcompare => self.capabilities.outcompare_pool_size(),
            ResourceKind::Uart => self.capabilities.uart_pool_size(),
            ResourceKind::Spi => self.capabilities.spi_pool_size(),
            ResourceKind::Twi => 2, // number of fixed TWI pin pairs, not a free pool
            ResourceKind::IncapSingle | ResourceKind::IncapDouble => {
                self.capabilities.incap_pool_size()
            }
            ResourceKind::Icsp | ResourceKind::Sequencer => 1,
        }
    }

    fn pool_mut(inner: &mut Inner, kind: ResourceKind) -> &mut u64 {
        match kind {
            ResourceKind::Outcompare => &mut inner.outcompare,
            ResourceKind::Uart => &mut inner.uart,
            ResourceKind::Spi => &mut inner.spi,
            ResourceKind::Twi => &mut inner.twi,
            ResourceKind::IncapSingle | ResourceKind::IncapDouble => &mut inner.incap,
            ResourceKind::Icsp | ResourceKind::Sequencer => {
                // handled before this is reached; a zero-sized scratch mask.
                &mut inner.twi
            }
        }
    }
}

fn bit_for(id: u8) -> Result<u64> {
    1u64.checked_shl(u32::from(id))
        .ok_or(IoioError::OutOfResource)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::capability::BoardModel;

    fn manager() -> ResourceManager {
        let caps = BoardModel::from_hardware_id(b"IOIO0003")
            .capabilities()
            .expect("known board");
        ResourceManager::new(caps)
    }

    #[test]
    fn claiming_the_same_pin_twice_fails() {
        let mgr = manager();
        mgr.claim_pin(13).unwrap();
        assert!(matches!(mgr.claim_pin(13), Err(IoioError::OutOfResource)));
    }

    #[test]
    fn releasing_a_pin_frees_it_for_reuse() {
        let mgr = manager();
        mgr.claim_pin(13).unwrap();
        mgr.release_pin(13);
        mgr.claim_pin(13).unwrap();
    }

    #[test]
    fn pin_out_of_board_range_is_out_of_resource() {
        let mgr = manager();
        assert!(matches!(mgr.claim_pin(200), Err(IoioError::OutOfResource)));
    }

    #[test]
    fn instance_pool_exhausts_and_recovers() {
        let mgr = manager();
        let caps = mgr.capabilities();
        let size = caps.uart_pool_size();
        let mut ids = Vec::new();
        for _ in 0..size {
            ids.push(mgr.claim_instance(ResourceKind::Uart).unwrap());
        }
        assert!(matches!(
            mgr.claim_instance(ResourceKind::Uart),
            Err(IoioError::OutOfResource)
        ));
        mgr.release_instance(ResourceKind::Uart, ids[0]);
        mgr.claim_instance(ResourceKind::Uart).unwrap();
    }

    #[test]
    fn incap_double_claims_two_adjacent_ids_atomically() {
        let mgr = manager();
        mgr.claim_instance(ResourceKind::IncapSingle).unwrap(); // takes id 0
        let (low, high) = mgr.claim_incap_double().unwrap();
        assert_eq!((low, high), (2, 3));
        mgr.release_incap_double(low, high);
    }

    #[test]
    fn icsp_is_a_single_instance_resource() {
        let mgr = manager();
        mgr.claim_instance(ResourceKind::Icsp).unwrap();
        assert!(matches!(
            mgr.claim_instance(ResourceKind::Icsp),
            Err(IoioError::OutOfResource)
        ));
        mgr.release_instance(ResourceKind::Icsp, 0);
        mgr.claim_instance(ResourceKind::Icsp).unwrap();
    }
}
