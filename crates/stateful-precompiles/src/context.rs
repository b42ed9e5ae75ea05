use alloc::boxed::Box;
use alloy_primitives::{Address, Bytes, Log, U256};
use revm::{
    context::{Block, JournalTr},
    primitives::{StorageKey, StorageValue},
    state::Bytecode,
    Database,
};

use crate::{JournalState, WorldState, WorldStateError};

/// The frame of the call currently being served by a native contract.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallFrame {
    /// Address of the native contract being executed. Native contracts keep their own storage
    /// under this address.
    pub address: Address,
    /// The immediate caller.
    pub caller: Address,
    /// Value transferred with the call.
    pub value: U256,
    /// Whether the call is executed in a static (read-only) frame.
    pub is_static: bool,
}

impl CallFrame {
    /// Creates a non-static frame for `address` called by `caller` without value.
    pub const fn new(address: Address, caller: Address) -> Self {
        Self { address, caller, value: U256::ZERO, is_static: false }
    }

    /// Sets the transferred value.
    pub const fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Marks the frame as static.
    pub const fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

/// Execution context handed to a native function for exactly one call.
///
/// It borrows the block environment and the journal of the executing transaction for `'a` and
/// therefore cannot outlive the call that created it. The context is neither `Send` nor `Sync`:
/// only the thread running the call may use it.
#[derive(derive_more::Debug)]
pub struct PrecompileContext<'a> {
    #[debug(skip)]
    block_env: &'a (dyn Block + 'a),
    #[debug(skip)]
    state: Box<dyn WorldState + 'a>,
    frame: CallFrame,
}

impl<'a> PrecompileContext<'a> {
    /// Creates a context over a revm journal.
    pub fn new<J>(journal: &'a mut J, block_env: &'a dyn Block, frame: CallFrame) -> Self
    where
        J: JournalTr,
        <J::Database as Database>::Error: core::error::Error + Send + Sync + 'static,
    {
        Self::with_state(JournalState::new(journal), block_env, frame)
    }

    /// Creates a context over an arbitrary [`WorldState`].
    pub fn with_state(
        state: impl WorldState + 'a,
        block_env: &'a dyn Block,
        frame: CallFrame,
    ) -> Self {
        Self { block_env, state: Box::new(state), frame }
    }

    /// Returns the block environment of the executing block.
    pub const fn block_env(&self) -> &(dyn Block + 'a) {
        self.block_env
    }

    /// Returns the current block number.
    pub fn block_number(&self) -> U256 {
        self.block_env.number()
    }

    /// Returns the current block timestamp.
    pub fn block_timestamp(&self) -> U256 {
        self.block_env.timestamp()
    }

    /// Returns the beneficiary of the current block.
    pub fn beneficiary(&self) -> Address {
        self.block_env.beneficiary()
    }

    /// Returns the frame of the current call.
    pub const fn frame(&self) -> &CallFrame {
        &self.frame
    }

    /// Returns the address of the native contract being executed.
    pub const fn address(&self) -> Address {
        self.frame.address
    }

    /// Returns the immediate caller.
    pub const fn caller(&self) -> Address {
        self.frame.caller
    }

    /// Returns the value transferred with the call.
    pub const fn value(&self) -> U256 {
        self.frame.value
    }

    /// Whether the call runs in a static frame.
    pub const fn is_static(&self) -> bool {
        self.frame.is_static
    }

    /// Returns the mutable world-state handle.
    pub fn state_mut(&mut self) -> &mut (dyn WorldState + 'a) {
        &mut *self.state
    }

    /// Returns the balance of `address`.
    pub fn balance(&mut self, address: Address) -> Result<U256, WorldStateError> {
        self.state.balance(address)
    }

    /// Returns the code deployed at `address`.
    pub fn code(&mut self, address: Address) -> Result<Bytes, WorldStateError> {
        self.state.code(address)
    }

    /// Reads a storage slot.
    pub fn sload(
        &mut self,
        address: Address,
        key: StorageKey,
    ) -> Result<StorageValue, WorldStateError> {
        self.state.sload(address, key)
    }

    /// Writes a storage slot.
    pub fn sstore(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), WorldStateError> {
        self.state.sstore(address, key, value)
    }

    /// Moves `value` wei between two accounts.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), WorldStateError> {
        self.state.transfer(from, to, value)
    }

    /// Replaces the code of `address`.
    pub fn set_code(&mut self, address: Address, code: Bytecode) -> Result<(), WorldStateError> {
        self.state.set_code(address, code)
    }

    /// Emits a log.
    pub fn log(&mut self, log: Log) {
        self.state.log(log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{block_env_with_beneficiary, MemoryState};
    use alloy_primitives::address;
    use revm::context::BlockEnv;

    const NATIVE: Address = address!("0x6342000000000000000000000000000000000100");
    const CALLER: Address = address!("0x2000000000000000000000000000000000000002");

    #[test]
    fn test_context_exposes_block_and_frame() {
        let block = BlockEnv {
            number: U256::from(1000),
            timestamp: U256::from(1_700_000_000u64),
            ..Default::default()
        };
        let mut state = MemoryState::default();
        let frame = CallFrame::new(NATIVE, CALLER).with_value(U256::from(5)).with_static(true);
        let ctx = PrecompileContext::with_state(&mut state, &block, frame);

        assert_eq!(ctx.block_number(), U256::from(1000));
        assert_eq!(ctx.block_timestamp(), U256::from(1_700_000_000u64));
        assert_eq!(ctx.address(), NATIVE);
        assert_eq!(ctx.caller(), CALLER);
        assert_eq!(ctx.value(), U256::from(5));
        assert!(ctx.is_static());
    }

    #[test]
    fn test_context_writes_land_in_state() {
        let block = BlockEnv::default();
        let mut state = MemoryState::default();
        {
            let mut ctx =
                PrecompileContext::with_state(&mut state, &block, CallFrame::new(NATIVE, CALLER));
            ctx.sstore(NATIVE, U256::from(3), U256::from(9)).unwrap();
            assert_eq!(ctx.sload(NATIVE, U256::from(3)).unwrap(), U256::from(9));
        }
        assert_eq!(state.storage(NATIVE, U256::from(3)), U256::from(9));
    }

    #[test]
    fn test_context_moves_balances() {
        let block = block_env_with_beneficiary(7, CALLER);
        let mut state =
            MemoryState::default().with_balance(NATIVE, U256::from(10)).with_nonce(NATIVE, 1);
        {
            let mut ctx =
                PrecompileContext::with_state(&mut state, &block, CallFrame::new(NATIVE, CALLER));
            assert_eq!(ctx.beneficiary(), CALLER);
            assert_eq!(ctx.state_mut().nonce(NATIVE).unwrap(), 1);

            let beneficiary = ctx.beneficiary();
            ctx.transfer(NATIVE, beneficiary, U256::from(4)).unwrap();
            assert!(matches!(
                ctx.transfer(NATIVE, beneficiary, U256::from(7)),
                Err(WorldStateError::Transfer { .. })
            ));
        }
        assert_eq!(state.balance_of(NATIVE), U256::from(6));
        assert_eq!(state.balance_of(CALLER), U256::from(4));
    }
}
