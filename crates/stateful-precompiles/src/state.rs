//! Mutable world-state handle exposed to native functions.
//!
//! Native functions never see the engine's journal type directly. They go through
//! [`WorldState`], a dyn-compatible view over balances, code, storage and logs. The engine
//! adapter wraps its journal in a [`JournalState`], which erases the database error type so that
//! every native function sees the same [`WorldStateError`].

use alloc::{boxed::Box, format, string::String};
use alloy_primitives::{Address, Bytes, Log, U256};
use core::error::Error;
use revm::{
    context::JournalTr,
    primitives::{StorageKey, StorageValue},
    state::Bytecode,
    Database,
};

/// Erased database error.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct ErasedError(Box<dyn Error + Send + Sync + 'static>);

impl ErasedError {
    /// Creates a new [`ErasedError`].
    pub fn new(error: impl Error + Send + Sync + 'static) -> Self {
        Self(Box::new(error))
    }
}

/// Errors returned by a [`WorldState`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum WorldStateError {
    /// The backing database failed to serve a read.
    #[error(transparent)]
    Database(ErasedError),
    /// A balance transfer could not be applied.
    #[error("transfer from {from} to {to} failed: {reason}")]
    Transfer {
        /// Account debited.
        from: Address,
        /// Account credited.
        to: Address,
        /// Why the journal refused the transfer.
        reason: String,
    },
}

impl WorldStateError {
    /// Creates a new [`WorldStateError::Database`].
    pub fn database(err: impl Error + Send + Sync + 'static) -> Self {
        Self::Database(ErasedError::new(err))
    }
}

/// dyn-compatible access to the mutable world state of the executing transaction.
///
/// All writes go to the engine's journal, so the engine can discard them when the call fails.
pub trait WorldState {
    /// Returns the balance of `address`.
    fn balance(&mut self, address: Address) -> Result<U256, WorldStateError>;

    /// Returns the nonce of `address`.
    fn nonce(&mut self, address: Address) -> Result<u64, WorldStateError>;

    /// Returns the original bytes of the code deployed at `address`.
    fn code(&mut self, address: Address) -> Result<Bytes, WorldStateError>;

    /// Reads storage slot `key` of `address`.
    fn sload(&mut self, address: Address, key: StorageKey)
        -> Result<StorageValue, WorldStateError>;

    /// Writes `value` to storage slot `key` of `address`.
    fn sstore(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), WorldStateError>;

    /// Moves `value` wei from `from` to `to`.
    fn transfer(&mut self, from: Address, to: Address, value: U256)
        -> Result<(), WorldStateError>;

    /// Replaces the code of `address`.
    fn set_code(&mut self, address: Address, code: Bytecode) -> Result<(), WorldStateError>;

    /// Appends a log to the transaction's logs.
    fn log(&mut self, log: Log);
}

/// [`WorldState`] backed by a revm journal.
#[derive(Debug)]
pub struct JournalState<'a, J>(&'a mut J);

impl<'a, J> JournalState<'a, J> {
    /// Wraps `journal`.
    pub fn new(journal: &'a mut J) -> Self {
        Self(journal)
    }
}

impl<J> WorldState for JournalState<'_, J>
where
    J: JournalTr,
    <J::Database as Database>::Error: Error + Send + Sync + 'static,
{
    fn balance(&mut self, address: Address) -> Result<U256, WorldStateError> {
        let account = self.0.load_account(address).map_err(WorldStateError::database)?;
        Ok(account.data.info.balance)
    }

    fn nonce(&mut self, address: Address) -> Result<u64, WorldStateError> {
        let account = self.0.load_account(address).map_err(WorldStateError::database)?;
        Ok(account.data.info.nonce)
    }

    fn code(&mut self, address: Address) -> Result<Bytes, WorldStateError> {
        let account = self.0.load_account_code(address).map_err(WorldStateError::database)?;
        Ok(account.data.info.code.as_ref().map(Bytecode::original_bytes).unwrap_or_default())
    }

    fn sload(
        &mut self,
        address: Address,
        key: StorageKey,
    ) -> Result<StorageValue, WorldStateError> {
        // The journal only serves storage of accounts it has already loaded.
        self.0.load_account(address).map_err(WorldStateError::database)?;
        let slot = self.0.sload(address, key).map_err(WorldStateError::database)?;
        Ok(slot.data)
    }

    fn sstore(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), WorldStateError> {
        self.0.load_account(address).map_err(WorldStateError::database)?;
        self.0.sstore(address, key, value).map_err(WorldStateError::database)?;
        Ok(())
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), WorldStateError> {
        match self.0.transfer(from, to, value).map_err(WorldStateError::database)? {
            None => Ok(()),
            Some(err) => Err(WorldStateError::Transfer { from, to, reason: format!("{err:?}") }),
        }
    }

    fn set_code(&mut self, address: Address, code: Bytecode) -> Result<(), WorldStateError> {
        self.0.load_account(address).map_err(WorldStateError::database)?;
        self.0.set_code(address, code);
        Ok(())
    }

    fn log(&mut self, log: Log) {
        self.0.log(log);
    }
}

impl<T: WorldState + ?Sized> WorldState for &mut T {
    fn balance(&mut self, address: Address) -> Result<U256, WorldStateError> {
        (**self).balance(address)
    }

    fn nonce(&mut self, address: Address) -> Result<u64, WorldStateError> {
        (**self).nonce(address)
    }

    fn code(&mut self, address: Address) -> Result<Bytes, WorldStateError> {
        (**self).code(address)
    }

    fn sload(
        &mut self,
        address: Address,
        key: StorageKey,
    ) -> Result<StorageValue, WorldStateError> {
        (**self).sload(address, key)
    }

    fn sstore(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), WorldStateError> {
        (**self).sstore(address, key, value)
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), WorldStateError> {
        (**self).transfer(from, to, value)
    }

    fn set_code(&mut self, address: Address, code: Bytecode) -> Result<(), WorldStateError> {
        (**self).set_code(address, code)
    }

    fn log(&mut self, log: Log) {
        (**self).log(log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, LogData};
    use revm::{
        context::Journal,
        database::{CacheDB, EmptyDB},
        state::AccountInfo,
    };

    const ALICE: Address = address!("0x1000000000000000000000000000000000000001");
    const BOB: Address = address!("0x1000000000000000000000000000000000000002");

    fn journal_with_alice(balance: u64) -> Journal<CacheDB<EmptyDB>> {
        let mut db = CacheDB::<EmptyDB>::default();
        db.insert_account_info(
            ALICE,
            AccountInfo { balance: U256::from(balance), nonce: 7, ..Default::default() },
        );
        Journal::new(db)
    }

    #[test]
    fn test_storage_roundtrip_through_journal() {
        let mut journal = journal_with_alice(0);
        let mut state = JournalState::new(&mut journal);

        assert_eq!(state.sload(ALICE, U256::from(1)).unwrap(), U256::ZERO);
        state.sstore(ALICE, U256::from(1), U256::from(42)).unwrap();
        assert_eq!(state.sload(ALICE, U256::from(1)).unwrap(), U256::from(42));
    }

    #[test]
    fn test_account_fields_through_journal() {
        let mut journal = journal_with_alice(100);
        let mut state = JournalState::new(&mut journal);

        assert_eq!(state.balance(ALICE).unwrap(), U256::from(100));
        assert_eq!(state.nonce(ALICE).unwrap(), 7);
        assert_eq!(state.balance(BOB).unwrap(), U256::ZERO);
        assert!(state.code(BOB).unwrap().is_empty());
    }

    #[test]
    fn test_transfer_through_journal() {
        let mut journal = journal_with_alice(100);
        let mut state = JournalState::new(&mut journal);

        state.transfer(ALICE, BOB, U256::from(60)).unwrap();
        assert_eq!(state.balance(ALICE).unwrap(), U256::from(40));
        assert_eq!(state.balance(BOB).unwrap(), U256::from(60));

        let err = state.transfer(ALICE, BOB, U256::from(41)).unwrap_err();
        assert!(
            matches!(&err, WorldStateError::Transfer { reason, .. } if reason == "OutOfFunds"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_set_code_and_log_through_journal() {
        let mut journal = journal_with_alice(0);
        {
            let mut state = JournalState::new(&mut journal);
            let code = Bytes::from_static(&[0x60, 0x00]);
            state.set_code(BOB, Bytecode::new_legacy(code.clone())).unwrap();
            assert_eq!(state.code(BOB).unwrap(), code);
            state.log(Log { address: BOB, data: LogData::default() });
        }
        assert_eq!(journal.inner.logs.len(), 1);
    }
}
