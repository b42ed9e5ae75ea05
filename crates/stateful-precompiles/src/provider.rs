//! Precompile provider serving native contracts inside revm's call loop.

use alloc::{
    boxed::Box,
    string::{String, ToString},
    sync::Arc,
};
use alloy_primitives::{Address, Bytes};
use delegate::delegate;
use revm::{
    context::{Cfg, LocalContextTr},
    handler::PrecompileProvider,
    interpreter::{CallInput, Gas, InputsImpl, InstructionResult, InterpreterResult},
    Context, Database, Journal,
};

use crate::{
    dispatch_with_observer, CallFrame, DispatchError, DispatchObserver, NativeContractRegistry,
    NoopObserver, PrecompileContext,
};

/// A [`PrecompileProvider`] that resolves registry addresses to native contracts and everything
/// else to an inner provider.
///
/// Native contracts shadow inner precompiles bound to the same address.
#[derive(Clone, derive_more::Debug)]
pub struct NativePrecompiles<P> {
    inner: P,
    registry: Arc<NativeContractRegistry>,
    #[debug(skip)]
    observer: Arc<dyn DispatchObserver + Send + Sync>,
}

impl<P> NativePrecompiles<P> {
    /// Wraps `inner`, serving the contracts of `registry` in front of it.
    pub fn new(inner: P, registry: Arc<NativeContractRegistry>) -> Self {
        Self { inner, registry, observer: Arc::new(NoopObserver) }
    }

    /// Reports every native contract call to `observer`.
    pub fn with_observer(
        mut self,
        observer: impl DispatchObserver + Send + Sync + 'static,
    ) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Returns the registry of native contracts.
    pub fn registry(&self) -> &NativeContractRegistry {
        &self.registry
    }

    /// Returns the inner provider.
    pub const fn inner(&self) -> &P {
        &self.inner
    }
}

impl<BlockEnv, TxEnv, CfgEnv, DB, Chain, P>
    PrecompileProvider<Context<BlockEnv, TxEnv, CfgEnv, DB, Journal<DB>, Chain>>
    for NativePrecompiles<P>
where
    BlockEnv: revm::context::Block,
    TxEnv: revm::context::Transaction,
    CfgEnv: Cfg,
    DB: Database,
    DB::Error: Send + Sync + 'static,
    P: PrecompileProvider<
        Context<BlockEnv, TxEnv, CfgEnv, DB, Journal<DB>, Chain>,
        Output = InterpreterResult,
    >,
{
    type Output = InterpreterResult;

    delegate! {
        to self.inner {
            fn set_spec(&mut self, spec: CfgEnv::Spec) -> bool;
        }
    }

    fn run(
        &mut self,
        context: &mut Context<BlockEnv, TxEnv, CfgEnv, DB, Journal<DB>, Chain>,
        address: &Address,
        inputs: &InputsImpl,
        is_static: bool,
        gas_limit: u64,
    ) -> Result<Option<InterpreterResult>, String> {
        let Some(contract) = self.registry.get(address) else {
            return self.inner.run(context, address, inputs, is_static, gas_limit);
        };

        let mut result = InterpreterResult {
            result: InstructionResult::Return,
            gas: Gas::new(gas_limit),
            output: Bytes::new(),
        };

        let (local, journal, block) =
            (&context.local, &mut context.journaled_state, &context.block);

        let r;
        let input = match &inputs.input {
            CallInput::SharedBuffer(range) => {
                #[allow(clippy::option_if_let_else)]
                if let Some(slice) = local.shared_memory_buffer_slice(range.clone()) {
                    r = slice;
                    &*r
                } else {
                    &[]
                }
            }
            CallInput::Bytes(bytes) => bytes.as_ref(),
        };

        let frame = CallFrame {
            address: *address,
            caller: inputs.caller_address,
            value: inputs.call_value,
            is_static,
        };
        let mut ctx = PrecompileContext::new(journal, block, frame);
        let output = dispatch_with_observer(&mut ctx, contract, input, gas_limit, &*self.observer);

        match &output.error {
            None => {
                let charged = result.gas.record_cost(output.gas_used(gas_limit));
                debug_assert!(charged, "dispatch never charges more than the supplied gas");
                result.output = output.output;
            }
            Some(DispatchError::OutOfGas { .. }) => {
                result.gas.spend_all();
                result.result = InstructionResult::PrecompileOOG;
            }
            Some(DispatchError::Function(err)) if err.is_fatal() => return Err(err.to_string()),
            Some(_) => {
                let charged = result.gas.record_cost(output.gas_used(gas_limit));
                debug_assert!(charged, "dispatch never charges more than the supplied gas");
                result.result = InstructionResult::Revert;
                result.output = output.revert_data();
            }
        }

        Ok(Some(result))
    }

    fn warm_addresses(&self) -> Box<impl Iterator<Item = Address>> {
        Box::new(self.inner.warm_addresses().chain(self.registry.addresses().copied()))
    }

    fn contains(&self, address: &Address) -> bool {
        self.registry.contains(address) || self.inner.contains(address)
    }
}
