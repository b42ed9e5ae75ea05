use alloy_primitives::{map::HashMap, Address, Bytes, Log, B256, U256};
use revm::{
    database_interface::DBErrorMarker,
    primitives::{StorageKey, StorageValue},
    state::{AccountInfo, Bytecode},
    Database,
};

use crate::{WorldState, WorldStateError};

/// Error returned by a [`MemoryState`] built with [`MemoryState::failing`].
#[derive(Clone, Copy, Debug, Default, thiserror::Error)]
#[error("simulated database failure")]
pub struct SimulatedDatabaseError;

impl DBErrorMarker for SimulatedDatabaseError {}

/// A revm [`Database`] whose every read fails with [`SimulatedDatabaseError`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingDatabase;

impl Database for FailingDatabase {
    type Error = SimulatedDatabaseError;

    fn basic(&mut self, _address: Address) -> Result<Option<AccountInfo>, Self::Error> {
        Err(SimulatedDatabaseError)
    }

    fn code_by_hash(&mut self, _code_hash: B256) -> Result<Bytecode, Self::Error> {
        Err(SimulatedDatabaseError)
    }

    fn storage(
        &mut self,
        _address: Address,
        _index: StorageKey,
    ) -> Result<StorageValue, Self::Error> {
        Err(SimulatedDatabaseError)
    }

    fn block_hash(&mut self, _number: u64) -> Result<B256, Self::Error> {
        Err(SimulatedDatabaseError)
    }
}

#[derive(Clone, Debug, Default)]
struct MemoryAccount {
    balance: U256,
    nonce: u64,
    code: Option<Bytecode>,
}

/// An in-memory [`WorldState`] without a journal.
///
/// Writes are applied immediately and never rolled back.
#[derive(Clone, Debug, Default)]
pub struct MemoryState {
    accounts: HashMap<Address, MemoryAccount>,
    storage: HashMap<(Address, StorageKey), StorageValue>,
    logs: Vec<Log>,
    failing: bool,
}

impl MemoryState {
    /// Creates a state whose every read and write fails with a database error.
    pub fn failing() -> Self {
        Self { failing: true, ..Default::default() }
    }

    /// Sets the balance of `address`.
    pub fn with_balance(mut self, address: Address, balance: U256) -> Self {
        self.accounts.entry(address).or_default().balance = balance;
        self
    }

    /// Sets the nonce of `address`.
    pub fn with_nonce(mut self, address: Address, nonce: u64) -> Self {
        self.accounts.entry(address).or_default().nonce = nonce;
        self
    }

    /// Sets storage slot `key` of `address`.
    pub fn with_storage(mut self, address: Address, key: StorageKey, value: StorageValue) -> Self {
        self.storage.insert((address, key), value);
        self
    }

    /// Returns storage slot `key` of `address`, zero if never written.
    pub fn storage(&self, address: Address, key: StorageKey) -> StorageValue {
        self.storage.get(&(address, key)).copied().unwrap_or_default()
    }

    /// Returns the balance of `address`, zero for unknown accounts.
    pub fn balance_of(&self, address: Address) -> U256 {
        self.accounts.get(&address).map(|a| a.balance).unwrap_or_default()
    }

    /// Returns the logs emitted so far.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    fn check(&self) -> Result<(), WorldStateError> {
        if self.failing {
            return Err(WorldStateError::database(SimulatedDatabaseError));
        }
        Ok(())
    }
}

impl WorldState for MemoryState {
    fn balance(&mut self, address: Address) -> Result<U256, WorldStateError> {
        self.check()?;
        Ok(self.balance_of(address))
    }

    fn nonce(&mut self, address: Address) -> Result<u64, WorldStateError> {
        self.check()?;
        Ok(self.accounts.get(&address).map(|a| a.nonce).unwrap_or_default())
    }

    fn code(&mut self, address: Address) -> Result<Bytes, WorldStateError> {
        self.check()?;
        Ok(self
            .accounts
            .get(&address)
            .and_then(|a| a.code.as_ref())
            .map(Bytecode::original_bytes)
            .unwrap_or_default())
    }

    fn sload(
        &mut self,
        address: Address,
        key: StorageKey,
    ) -> Result<StorageValue, WorldStateError> {
        self.check()?;
        Ok(self.storage(address, key))
    }

    fn sstore(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), WorldStateError> {
        self.check()?;
        self.storage.insert((address, key), value);
        Ok(())
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), WorldStateError> {
        self.check()?;
        let Some(remaining) = self.balance_of(from).checked_sub(value) else {
            return Err(WorldStateError::Transfer { from, to, reason: "OutOfFunds".to_string() });
        };
        self.accounts.entry(from).or_default().balance = remaining;
        let recipient = self.accounts.entry(to).or_default();
        recipient.balance = recipient.balance.saturating_add(value);
        Ok(())
    }

    fn set_code(&mut self, address: Address, code: Bytecode) -> Result<(), WorldStateError> {
        self.check()?;
        self.accounts.entry(address).or_default().code = Some(code);
        Ok(())
    }

    fn log(&mut self, log: Log) {
        self.logs.push(log);
    }
}
