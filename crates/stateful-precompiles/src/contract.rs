use alloc::{sync::Arc, vec::Vec};
use alloy_primitives::{map::HashMap, Selector};
use core::fmt;

use crate::{constants::SELECTOR_LEN, NativeFunction, RegistryError};

/// Splits call data into its selector and the remaining payload.
///
/// Returns `None` if `input` is shorter than a selector.
#[inline]
pub fn split_call_data(input: &[u8]) -> Option<(Selector, &[u8])> {
    if input.len() < SELECTOR_LEN {
        return None;
    }
    let (selector, payload) = input.split_at(SELECTOR_LEN);
    Some((Selector::from_slice(selector), payload))
}

/// A native contract: an immutable table of functions keyed by selector.
///
/// The table is assembled once with [`NativeContract::builder`] and never changes afterwards.
#[derive(Clone)]
pub struct NativeContract {
    name: &'static str,
    functions: HashMap<Selector, Arc<dyn NativeFunction>>,
}

impl NativeContract {
    /// Starts building a contract named `name`.
    pub fn builder(name: &'static str) -> NativeContractBuilder {
        NativeContractBuilder { name, functions: HashMap::default() }
    }

    /// Returns the contract name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Looks up the function bound to `selector`.
    #[inline]
    pub fn get(&self, selector: &Selector) -> Option<&dyn NativeFunction> {
        self.functions.get(selector).map(|f| &**f)
    }

    /// Whether a function is bound to `selector`.
    pub fn contains(&self, selector: &Selector) -> bool {
        self.functions.contains_key(selector)
    }

    /// Returns an iterator over the registered selectors, in no particular order.
    pub fn selectors(&self) -> impl Iterator<Item = &Selector> {
        self.functions.keys()
    }

    /// Returns the number of functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the contract has no functions.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for NativeContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut selectors: Vec<_> = self.functions.keys().collect();
        selectors.sort_unstable();
        f.debug_struct("NativeContract")
            .field("name", &self.name)
            .field("selectors", &selectors)
            .finish()
    }
}

/// Builder of a [`NativeContract`].
#[derive(Debug)]
pub struct NativeContractBuilder {
    name: &'static str,
    functions: HashMap<Selector, Arc<dyn NativeFunction>>,
}

impl NativeContractBuilder {
    /// Binds `function` to `selector`.
    ///
    /// Fails if another function is already bound to the same selector.
    pub fn function(
        mut self,
        selector: impl Into<Selector>,
        function: impl NativeFunction + 'static,
    ) -> Result<Self, RegistryError> {
        let selector = selector.into();
        if self.functions.contains_key(&selector) {
            return Err(RegistryError::DuplicateSelector { contract: self.name, selector });
        }
        self.functions.insert(selector, Arc::new(function));
        Ok(self)
    }

    /// Freezes the table.
    pub fn build(self) -> NativeContract {
        NativeContract { name: self.name, functions: self.functions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ConstantFunction;
    use alloy_primitives::{bytes, fixed_bytes};

    #[test]
    fn test_split_call_data() {
        assert_eq!(split_call_data(&[]), None);
        assert_eq!(split_call_data(&[0x71, 0x3e, 0x02]), None);

        let (selector, payload) = split_call_data(&[0x71, 0x3e, 0x02, 0xda]).unwrap();
        assert_eq!(selector, fixed_bytes!("713e02da"));
        assert!(payload.is_empty());

        let (selector, payload) = split_call_data(&[0xde, 0xad, 0xbe, 0xef, 0x01, 0x02]).unwrap();
        assert_eq!(selector, fixed_bytes!("deadbeef"));
        assert_eq!(payload, &[0x01, 0x02]);
    }

    #[test]
    fn test_builder_registers_functions() {
        let contract = NativeContract::builder("test")
            .function(fixed_bytes!("00000001"), ConstantFunction::new(10, bytes!("01")))
            .unwrap()
            .function([0, 0, 0, 2], ConstantFunction::new(20, bytes!("02")))
            .unwrap()
            .build();

        assert_eq!(contract.name(), "test");
        assert_eq!(contract.len(), 2);
        assert!(contract.contains(&fixed_bytes!("00000002")));
        assert_eq!(contract.get(&fixed_bytes!("00000001")).unwrap().required_gas(&[]), 10);
        assert!(contract.get(&fixed_bytes!("00000003")).is_none());
    }

    #[test]
    fn test_builder_rejects_duplicate_selector() {
        let err = NativeContract::builder("test")
            .function(fixed_bytes!("713e02da"), ConstantFunction::new(0, bytes!("")))
            .unwrap()
            .function(fixed_bytes!("713e02da"), ConstantFunction::new(1, bytes!("")))
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::DuplicateSelector {
                contract: "test",
                selector: fixed_bytes!("713e02da")
            }
        );
    }

    #[test]
    fn test_empty_contract() {
        let contract = NativeContract::builder("empty").build();
        assert!(contract.is_empty());
        assert_eq!(contract.selectors().count(), 0);
    }
}
