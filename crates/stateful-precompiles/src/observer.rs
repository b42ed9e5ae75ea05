//! Observability hooks of the dispatcher.
//!
//! The dispatcher never logs on its own. Callers that want trace events or counters pass a
//! [`DispatchObserver`], which sees one [`DispatchEvent`] per dispatched call.

use alloc::string::ToString;
use alloy_primitives::{Address, Selector};
use auto_impl::auto_impl;
use core::sync::atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::CallStatus;

/// Summary of one dispatched call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchEvent {
    /// Address of the native contract.
    pub address: Address,
    /// Name of the native contract.
    pub contract: &'static str,
    /// Decoded selector. `None` if the call data was shorter than a selector.
    pub selector: Option<Selector>,
    /// Gas supplied by the caller.
    pub supplied_gas: u64,
    /// Gas left after the call.
    pub gas_remaining: u64,
    /// Terminal outcome.
    pub status: CallStatus,
}

impl DispatchEvent {
    /// Gas consumed by the call.
    pub const fn gas_used(&self) -> u64 {
        self.supplied_gas.saturating_sub(self.gas_remaining)
    }
}

/// Receives an event for every dispatched call.
///
/// Observers must not influence execution: they see the outcome after it is final.
#[auto_impl(&, Box, Arc)]
pub trait DispatchObserver {
    /// Called once the call's outcome is known.
    fn on_dispatch(&self, event: &DispatchEvent);
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {
    #[inline]
    fn on_dispatch(&self, _event: &DispatchEvent) {}
}

/// Observer that emits `tracing` events under the `stateful_precompiles` target.
///
/// Successful calls are traced at `TRACE`, failed calls at `DEBUG`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl DispatchObserver for TracingObserver {
    fn on_dispatch(&self, event: &DispatchEvent) {
        let selector = event.selector.map(|s| s.to_string()).unwrap_or_default();
        match event.status {
            CallStatus::Success => trace!(
                target: "stateful_precompiles",
                address = %event.address,
                contract = event.contract,
                %selector,
                gas_used = event.gas_used(),
                "Native contract call succeeded"
            ),
            status => debug!(
                target: "stateful_precompiles",
                address = %event.address,
                contract = event.contract,
                %selector,
                ?status,
                supplied_gas = event.supplied_gas,
                gas_remaining = event.gas_remaining,
                "Native contract call failed"
            ),
        }
    }
}

/// Observer counting calls per outcome.
#[derive(Debug, Default)]
pub struct DispatchCounters {
    success: AtomicU64,
    reverted: AtomicU64,
    out_of_gas: AtomicU64,
    gas_used: AtomicU64,
}

impl DispatchCounters {
    /// Returns the current counts.
    pub fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            success: self.success.load(Ordering::Relaxed),
            reverted: self.reverted.load(Ordering::Relaxed),
            out_of_gas: self.out_of_gas.load(Ordering::Relaxed),
            gas_used: self.gas_used.load(Ordering::Relaxed),
        }
    }
}

impl DispatchObserver for DispatchCounters {
    fn on_dispatch(&self, event: &DispatchEvent) {
        let counter = match event.status {
            CallStatus::Success => &self.success,
            CallStatus::Reverted => &self.reverted,
            CallStatus::OutOfGasHalt => &self.out_of_gas,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.gas_used.fetch_add(event.gas_used(), Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`DispatchCounters`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    /// Calls that succeeded.
    pub success: u64,
    /// Calls that reverted.
    pub reverted: u64,
    /// Calls that ran out of gas.
    pub out_of_gas: u64,
    /// Total gas consumed by all calls.
    pub gas_used: u64,
}

impl DispatchStats {
    /// Total number of calls.
    pub const fn total(&self) -> u64 {
        self.success.saturating_add(self.reverted).saturating_add(self.out_of_gas)
    }
}
