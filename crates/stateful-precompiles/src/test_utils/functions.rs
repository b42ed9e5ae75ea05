use alloy_primitives::Bytes;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use crate::{FunctionError, NativeFunction, PrecompileContext};

/// A function with a constant cost that always returns the same bytes.
#[derive(Clone, Debug)]
pub struct ConstantFunction {
    gas: u64,
    output: Bytes,
}

impl ConstantFunction {
    /// Creates a function costing `gas` and returning `output`.
    pub fn new(gas: u64, output: Bytes) -> Self {
        Self { gas, output }
    }
}

impl NativeFunction for ConstantFunction {
    fn required_gas(&self, _payload: &[u8]) -> u64 {
        self.gas
    }

    fn run(
        &self,
        _ctx: &mut PrecompileContext<'_>,
        _payload: &[u8],
    ) -> Result<Bytes, FunctionError> {
        Ok(self.output.clone())
    }
}

/// A function with a constant cost that always reverts with the same data.
#[derive(Clone, Debug)]
pub struct RevertingFunction {
    gas: u64,
    data: Bytes,
}

impl RevertingFunction {
    /// Creates a function costing `gas` and reverting with `data`.
    pub fn new(gas: u64, data: Bytes) -> Self {
        Self { gas, data }
    }
}

impl NativeFunction for RevertingFunction {
    fn required_gas(&self, _payload: &[u8]) -> u64 {
        self.gas
    }

    fn run(
        &self,
        _ctx: &mut PrecompileContext<'_>,
        _payload: &[u8],
    ) -> Result<Bytes, FunctionError> {
        Err(FunctionError::Revert(self.data.clone()))
    }
}

/// A function that records every payload it is priced and run with.
///
/// Its cost is `gas` per payload byte. Running it echoes the payload back. Register it behind an
/// `Arc` to inspect the recorded calls afterwards.
#[derive(Debug, Default)]
pub struct CountingFunction {
    gas_per_byte: u64,
    gas_queries: AtomicUsize,
    runs: AtomicUsize,
    payloads: Mutex<Vec<Bytes>>,
}

impl CountingFunction {
    /// Creates a function costing `gas_per_byte` for every payload byte.
    pub fn new(gas_per_byte: u64) -> Self {
        Self { gas_per_byte, ..Default::default() }
    }

    /// Number of times [`NativeFunction::required_gas`] was called.
    pub fn gas_queries(&self) -> usize {
        self.gas_queries.load(Ordering::SeqCst)
    }

    /// Number of times [`NativeFunction::run`] was called.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// Payloads passed to [`NativeFunction::required_gas`], in call order.
    pub fn priced_payloads(&self) -> Vec<Bytes> {
        self.payloads.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl NativeFunction for CountingFunction {
    fn required_gas(&self, payload: &[u8]) -> u64 {
        self.gas_queries.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut payloads) = self.payloads.lock() {
            payloads.push(Bytes::copy_from_slice(payload));
        }
        self.gas_per_byte.saturating_mul(payload.len() as u64)
    }

    fn run(
        &self,
        _ctx: &mut PrecompileContext<'_>,
        payload: &[u8],
    ) -> Result<Bytes, FunctionError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::copy_from_slice(payload))
    }
}
