//! Binding of addresses to native contracts.

use alloc::sync::Arc;
use alloy_primitives::{map::HashMap, Address, Selector};
use tracing::debug;

use crate::NativeContract;

/// Errors raised while assembling native contracts or the registry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two functions of one contract share a selector.
    #[error("selector {selector} is bound twice in native contract `{contract}`")]
    DuplicateSelector {
        /// Name of the contract being built.
        contract: &'static str,
        /// The colliding selector.
        selector: Selector,
    },
    /// Two contracts are bound to the same address.
    #[error("address {address} is already bound to native contract `{existing}`")]
    DuplicateAddress {
        /// The colliding address.
        address: Address,
        /// Name of the contract already bound to the address.
        existing: &'static str,
    },
}

/// Immutable mapping of addresses to native contracts.
///
/// The registry is assembled once through [`RegistryBuilder`] before the engine processes any
/// call, and has no mutating methods afterwards. Lookups therefore need no locking, and a single
/// registry can be shared between threads behind an [`Arc`].
#[derive(Clone, Debug, Default)]
pub struct NativeContractRegistry {
    contracts: HashMap<Address, Arc<NativeContract>>,
}

impl NativeContractRegistry {
    /// Starts building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Returns the native contract bound to `address`, if any.
    #[inline]
    pub fn get(&self, address: &Address) -> Option<&NativeContract> {
        self.contracts.get(address).map(|c| &**c)
    }

    /// Whether `address` resolves to a native contract.
    #[inline]
    pub fn contains(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }

    /// Returns an iterator over the bound addresses, in no particular order.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.contracts.keys()
    }

    /// Returns the number of bound contracts.
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Whether no contract is bound.
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

/// Builder of a [`NativeContractRegistry`]. Consumed by [`RegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    contracts: HashMap<Address, Arc<NativeContract>>,
}

impl RegistryBuilder {
    /// Binds `contract` to `address`.
    pub fn register(
        &mut self,
        address: Address,
        contract: impl Into<Arc<NativeContract>>,
    ) -> Result<&mut Self, RegistryError> {
        if let Some(existing) = self.contracts.get(&address) {
            return Err(RegistryError::DuplicateAddress { address, existing: existing.name() });
        }
        let contract = contract.into();
        debug!(
            target: "stateful_precompiles",
            %address,
            contract = contract.name(),
            functions = contract.len(),
            "Registering native contract"
        );
        self.contracts.insert(address, contract);
        Ok(self)
    }

    /// Builder-style version of [`register`](Self::register).
    pub fn with_contract(
        mut self,
        address: Address,
        contract: impl Into<Arc<NativeContract>>,
    ) -> Result<Self, RegistryError> {
        self.register(address, contract)?;
        Ok(self)
    }

    /// Freezes the registry.
    pub fn build(self) -> NativeContractRegistry {
        NativeContractRegistry { contracts: self.contracts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ConstantFunction;
    use alloy_primitives::{address, bytes, fixed_bytes};

    const FIRST: Address = address!("0x6342000000000000000000000000000000000101");
    const SECOND: Address = address!("0x6342000000000000000000000000000000000102");

    fn contract(name: &'static str) -> NativeContract {
        NativeContract::builder(name)
            .function(fixed_bytes!("00000001"), ConstantFunction::new(0, bytes!("")))
            .unwrap()
            .build()
    }

    #[test]
    fn test_lookup() {
        let registry = NativeContractRegistry::builder()
            .with_contract(FIRST, contract("first"))
            .unwrap()
            .with_contract(SECOND, contract("second"))
            .unwrap()
            .build();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(&FIRST).unwrap().name(), "first");
        assert_eq!(registry.get(&SECOND).unwrap().name(), "second");
        assert!(registry.get(&Address::ZERO).is_none());
        assert!(!registry.contains(&Address::ZERO));

        let mut addresses: Vec<_> = registry.addresses().copied().collect();
        addresses.sort_unstable();
        assert_eq!(addresses, vec![FIRST, SECOND]);
    }

    #[test]
    fn test_duplicate_address_is_rejected() {
        let mut builder = NativeContractRegistry::builder();
        builder.register(FIRST, contract("first")).unwrap();
        let err = builder.register(FIRST, contract("second")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateAddress { address: FIRST, existing: "first" });

        // The first binding is kept.
        assert_eq!(builder.build().get(&FIRST).unwrap().name(), "first");
    }

    #[test]
    fn test_shared_contract_instance() {
        let shared = Arc::new(contract("shared"));
        let registry = NativeContractRegistry::builder()
            .with_contract(FIRST, shared.clone())
            .unwrap()
            .with_contract(SECOND, shared.clone())
            .unwrap()
            .build();
        assert_eq!(Arc::strong_count(&shared), 3);
        assert_eq!(registry.get(&SECOND).unwrap().name(), "shared");
    }

    #[test]
    fn test_empty_registry() {
        let registry = NativeContractRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.get(&FIRST).is_none());
    }
}
