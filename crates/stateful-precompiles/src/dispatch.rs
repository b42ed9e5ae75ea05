//! Dispatch of a call to a native contract.
//!
//! The order of the steps below is part of consensus. Gas is charged before the function body
//! runs and is never refunded by this layer, and no state is rolled back here: on error the
//! engine discards whatever the function wrote through its own journal checkpoint.

use alloy_primitives::{Bytes, Selector};
use serde::{Deserialize, Serialize};

use crate::{
    split_call_data, DispatchEvent, DispatchObserver, FunctionError, NativeContract,
    NoopObserver, PrecompileContext,
};

/// Terminal outcome of a call to a native contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallStatus {
    /// The function completed and its state changes may be committed.
    Success,
    /// The call failed. Unused gas goes back to the caller, state changes are discarded.
    Reverted,
    /// The call could not pay for the function. All supplied gas is consumed.
    OutOfGasHalt,
}

/// Why a call to a native contract failed.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The call data is shorter than a selector. No gas is charged.
    #[error("call data of {len} bytes is shorter than a selector")]
    MalformedInput {
        /// Length of the call data.
        len: usize,
    },
    /// No function is bound to the selector. No gas is charged.
    #[error("no native function for selector {selector}")]
    ExecutionReverted {
        /// The unknown selector.
        selector: Selector,
    },
    /// The supplied gas does not cover the function's cost. All supplied gas is consumed.
    #[error("out of gas: required {required}, supplied {supplied}")]
    OutOfGas {
        /// Gas the function asked for.
        required: u64,
        /// Gas the caller supplied.
        supplied: u64,
    },
    /// The function failed after its cost was charged.
    #[error(transparent)]
    Function(#[from] FunctionError),
}

impl DispatchError {
    /// Returns the terminal outcome this error leads to.
    pub const fn status(&self) -> CallStatus {
        match self {
            Self::OutOfGas { .. } => CallStatus::OutOfGasHalt,
            _ => CallStatus::Reverted,
        }
    }
}

/// Result of one dispatch: the output, the gas left to the caller and the error, if any.
#[derive(Debug)]
pub struct DispatchOutput {
    /// Bytes returned by the function. Empty on failure.
    pub output: Bytes,
    /// Gas left after the call.
    pub gas_remaining: u64,
    /// Set if the call failed.
    pub error: Option<DispatchError>,
}

impl DispatchOutput {
    fn success(output: Bytes, gas_remaining: u64) -> Self {
        Self { output, gas_remaining, error: None }
    }

    fn failure(error: DispatchError, gas_remaining: u64) -> Self {
        Self { output: Bytes::new(), gas_remaining, error: Some(error) }
    }

    /// Whether the call succeeded.
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns the terminal outcome of the call.
    pub const fn status(&self) -> CallStatus {
        match &self.error {
            None => CallStatus::Success,
            Some(err) => err.status(),
        }
    }

    /// Gas consumed out of `supplied_gas`.
    pub const fn gas_used(&self, supplied_gas: u64) -> u64 {
        supplied_gas.saturating_sub(self.gas_remaining)
    }

    /// Returns the revert payload reported by the function, or empty bytes.
    pub fn revert_data(&self) -> Bytes {
        match &self.error {
            Some(DispatchError::Function(err)) => err.revert_data(),
            _ => Bytes::new(),
        }
    }

    /// Converts into a `Result`, dropping the remaining gas.
    pub fn into_result(self) -> Result<Bytes, DispatchError> {
        match self.error {
            None => Ok(self.output),
            Some(err) => Err(err),
        }
    }
}

/// Dispatches `input` to `contract`.
///
/// See [`dispatch_with_observer`].
pub fn dispatch(
    ctx: &mut PrecompileContext<'_>,
    contract: &NativeContract,
    input: &[u8],
    supplied_gas: u64,
) -> DispatchOutput {
    dispatch_with_observer(ctx, contract, input, supplied_gas, &NoopObserver)
}

/// Dispatches `input` to `contract` and reports the outcome to `observer`.
///
/// 1. Call data shorter than a selector fails with [`DispatchError::MalformedInput`], keeping
///    all gas.
/// 2. A selector unknown to the contract fails with [`DispatchError::ExecutionReverted`],
///    keeping all gas.
/// 3. If the function's cost for the payload exceeds `supplied_gas`, the call fails with
///    [`DispatchError::OutOfGas`] and no gas is left.
/// 4. The cost is deducted.
/// 5. The function runs. Its output or error is returned with the gas left after step 4.
pub fn dispatch_with_observer<O>(
    ctx: &mut PrecompileContext<'_>,
    contract: &NativeContract,
    input: &[u8],
    supplied_gas: u64,
    observer: &O,
) -> DispatchOutput
where
    O: DispatchObserver + ?Sized,
{
    let (selector, output) = execute(ctx, contract, input, supplied_gas);
    observer.on_dispatch(&DispatchEvent {
        address: ctx.address(),
        contract: contract.name(),
        selector,
        supplied_gas,
        gas_remaining: output.gas_remaining,
        status: output.status(),
    });
    output
}

fn execute(
    ctx: &mut PrecompileContext<'_>,
    contract: &NativeContract,
    input: &[u8],
    supplied_gas: u64,
) -> (Option<Selector>, DispatchOutput) {
    let Some((selector, payload)) = split_call_data(input) else {
        let err = DispatchError::MalformedInput { len: input.len() };
        return (None, DispatchOutput::failure(err, supplied_gas));
    };

    let Some(function) = contract.get(&selector) else {
        return (
            Some(selector),
            DispatchOutput::failure(DispatchError::ExecutionReverted { selector }, supplied_gas),
        );
    };

    let required = function.required_gas(payload);
    let Some(gas_remaining) = supplied_gas.checked_sub(required) else {
        return (
            Some(selector),
            DispatchOutput::failure(
                DispatchError::OutOfGas { required, supplied: supplied_gas },
                0,
            ),
        );
    };

    let output = match function.run(ctx, payload) {
        Ok(output) => DispatchOutput::success(output, gas_remaining),
        Err(err) => DispatchOutput::failure(err.into(), gas_remaining),
    };
    (Some(selector), output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{ConstantFunction, MemoryState, RevertingFunction},
        CallFrame,
    };
    use alloy_primitives::{address, bytes, fixed_bytes, Address};
    use revm::context::BlockEnv;

    const NATIVE: Address = address!("0x6342000000000000000000000000000000000100");

    fn contract() -> NativeContract {
        NativeContract::builder("test")
            .function(fixed_bytes!("713e02da"), ConstantFunction::new(0, bytes!("c0ffee")))
            .unwrap()
            .function(fixed_bytes!("00000005"), ConstantFunction::new(5000, bytes!("")))
            .unwrap()
            .function(fixed_bytes!("000000ff"), RevertingFunction::new(700, bytes!("0badf00d")))
            .unwrap()
            .build()
    }

    fn run(input: &[u8], gas: u64) -> DispatchOutput {
        let block = BlockEnv::default();
        let mut state = MemoryState::default();
        let frame = CallFrame::new(NATIVE, Address::ZERO);
        let mut ctx = PrecompileContext::with_state(&mut state, &block, frame);
        dispatch(&mut ctx, &contract(), input, gas)
    }

    #[test]
    fn test_success_keeps_uncharged_gas() {
        let out = run(&bytes!("713e02da0102"), 21_000);
        assert!(out.is_success());
        assert_eq!(out.status(), CallStatus::Success);
        assert_eq!(out.output, bytes!("c0ffee"));
        assert_eq!(out.gas_remaining, 21_000);
        assert_eq!(out.gas_used(21_000), 0);
    }

    #[test]
    fn test_exact_budget_is_enough() {
        let out = run(&bytes!("00000005"), 5000);
        assert!(out.is_success());
        assert_eq!(out.gas_remaining, 0);
    }

    #[test]
    fn test_function_error_keeps_charge() {
        let out = run(&bytes!("000000ff"), 1000);
        assert_eq!(out.status(), CallStatus::Reverted);
        assert_eq!(out.gas_remaining, 300);
        assert!(out.output.is_empty());
        assert_eq!(out.revert_data(), bytes!("0badf00d"));
        assert!(matches!(
            out.into_result(),
            Err(DispatchError::Function(FunctionError::Revert(_)))
        ));
    }

    #[test]
    fn test_out_of_gas_error_fields() {
        let out = run(&bytes!("00000005"), 4999);
        assert_eq!(out.status(), CallStatus::OutOfGasHalt);
        assert_eq!(out.gas_remaining, 0);
        assert!(matches!(
            out.error,
            Some(DispatchError::OutOfGas { required: 5000, supplied: 4999 })
        ));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DispatchError::MalformedInput { len: 2 }.to_string(),
            "call data of 2 bytes is shorter than a selector"
        );
        assert_eq!(
            DispatchError::ExecutionReverted { selector: fixed_bytes!("deadbeef") }.to_string(),
            "no native function for selector 0xdeadbeef"
        );
    }
}
