//! The capability every native function implements.

use alloy_primitives::Bytes;
use auto_impl::auto_impl;
use core::fmt;

use crate::{PrecompileContext, WorldStateError};

/// Failure reported by a native function's own logic.
///
/// The dispatcher propagates it verbatim. Any state the function wrote before failing is
/// discarded by the engine, and the gas charged for the call is kept.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    /// The function reverted with the given ABI-encoded payload.
    #[error("execution reverted")]
    Revert(Bytes),
    /// The function attempted a state modification inside a static call.
    #[error("state modification in static call")]
    StaticCallViolation,
    /// The payload could not be decoded.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The world state could not be accessed.
    #[error(transparent)]
    State(#[from] WorldStateError),
}

impl FunctionError {
    /// Returns the bytes to hand back to the caller as revert data.
    pub fn revert_data(&self) -> Bytes {
        match self {
            Self::Revert(data) => data.clone(),
            _ => Bytes::new(),
        }
    }

    /// Whether the error is caused by the node's database rather than by the call.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::State(WorldStateError::Database(_)))
    }
}

/// A natively implemented function bound to one selector of a [`NativeContract`].
///
/// Implementations are shared between threads and between calls, so they hold no call-specific
/// state: everything a call changes goes through the [`PrecompileContext`].
///
/// [`NativeContract`]: crate::NativeContract
#[auto_impl(&, Box, Arc)]
pub trait NativeFunction: fmt::Debug + Send + Sync {
    /// Gas charged for executing the function with `payload`, i.e. the call data without the
    /// selector.
    ///
    /// Must depend on `payload` alone and return the same value on every node.
    fn required_gas(&self, payload: &[u8]) -> u64;

    /// Executes the function.
    ///
    /// For a fixed world state and payload the result must be identical on every node.
    fn run(&self, ctx: &mut PrecompileContext<'_>, payload: &[u8]) -> Result<Bytes, FunctionError>;
}

/// Signature of the gas function of an [`FnNativeFunction`].
pub type GasFn = fn(&[u8]) -> u64;

/// Signature of the run function of an [`FnNativeFunction`].
pub type RunFn = fn(&mut PrecompileContext<'_>, &[u8]) -> Result<Bytes, FunctionError>;

/// A [`NativeFunction`] made of two plain functions.
#[derive(Clone, Copy)]
pub struct FnNativeFunction {
    name: &'static str,
    gas: GasFn,
    run: RunFn,
}

impl FnNativeFunction {
    /// Creates a new function named `name`.
    pub const fn new(name: &'static str, gas: GasFn, run: RunFn) -> Self {
        Self { name, gas, run }
    }

    /// Creates a function charging `gas` for every call.
    pub const fn fixed(name: &'static str, gas: u64, run: RunFn) -> FixedGas<Self> {
        FixedGas { gas, inner: Self::new(name, no_gas, run) }
    }

    /// Returns the function name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

const fn no_gas(_payload: &[u8]) -> u64 {
    0
}

impl fmt::Debug for FnNativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnNativeFunction").field("name", &self.name).finish_non_exhaustive()
    }
}

impl NativeFunction for FnNativeFunction {
    fn required_gas(&self, payload: &[u8]) -> u64 {
        (self.gas)(payload)
    }

    fn run(&self, ctx: &mut PrecompileContext<'_>, payload: &[u8]) -> Result<Bytes, FunctionError> {
        (self.run)(ctx, payload)
    }
}

/// Wraps a function and overrides its gas cost with a constant.
#[derive(Clone, Copy, Debug)]
pub struct FixedGas<F> {
    gas: u64,
    inner: F,
}

impl<F> FixedGas<F> {
    /// Wraps `inner`, charging `gas` for every call.
    pub const fn new(gas: u64, inner: F) -> Self {
        Self { gas, inner }
    }

    /// Sets the constant gas cost.
    pub const fn with_gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }
}

impl<F: NativeFunction> NativeFunction for FixedGas<F> {
    fn required_gas(&self, _payload: &[u8]) -> u64 {
        self.gas
    }

    fn run(&self, ctx: &mut PrecompileContext<'_>, payload: &[u8]) -> Result<Bytes, FunctionError> {
        self.inner.run(ctx, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_utils::MemoryState, CallFrame};
    use alloy_primitives::{bytes, Address};
    use revm::context::BlockEnv;

    fn echo(_ctx: &mut PrecompileContext<'_>, payload: &[u8]) -> Result<Bytes, FunctionError> {
        Ok(Bytes::copy_from_slice(payload))
    }

    #[test]
    fn test_fn_native_function_delegates() {
        let f = FnNativeFunction::new("echo", |payload| payload.len() as u64 * 3, echo);
        assert_eq!(f.name(), "echo");
        assert_eq!(f.required_gas(&[1, 2, 3]), 9);

        let block = BlockEnv::default();
        let mut state = MemoryState::default();
        let mut ctx = PrecompileContext::with_state(
            &mut state,
            &block,
            CallFrame::new(Address::ZERO, Address::ZERO),
        );
        assert_eq!(f.run(&mut ctx, &[0xaa, 0xbb]).unwrap(), bytes!("aabb"));
    }

    #[test]
    fn test_fixed_gas_ignores_payload() {
        let f = FnNativeFunction::fixed("echo", 5000, echo);
        assert_eq!(f.required_gas(&[]), 5000);
        assert_eq!(f.required_gas(&[0u8; 1024]), 5000);
        assert_eq!(f.with_gas(0).required_gas(&[0u8; 32]), 0);
    }

    #[test]
    fn test_function_error_revert_data() {
        let data = bytes!("08c379a0");
        assert_eq!(FunctionError::Revert(data.clone()).revert_data(), data);
        assert!(FunctionError::StaticCallViolation.revert_data().is_empty());
        assert!(!FunctionError::InvalidInput("short").is_fatal());
    }
}
