//! The static runtime-API type registry (§4.B).
//!
//! Grounded on the original's `TYPE_REGISTRY["runtime_api"]` (a bundled
//! static dictionary naming each runtime trait's methods and parameter
//! order, consulted by `query_runtime_api` before a `state_call`). This
//! crate embeds the equivalent as a JSON asset at compile time rather than
//! constructing it at runtime, since the set of runtime traits this client
//! speaks to is fixed at build time.

use std::collections::HashMap;

use crate::error::MetadataError;

const EMBEDDED_REGISTRY: &str = include_str!("assets/runtime_apis.json");

/// A single method on a runtime API trait: just its declared parameter
/// names, in call order (this chain's runtime APIs take positional SCALE-
/// encoded tuples, so only the order/arity matters for encoding).
#[derive(Clone, Debug)]
pub struct RuntimeApiMethod {
    pub name: String,
    pub params: Vec<String>,
}

/// A runtime API trait, grouping its methods.
#[derive(Clone, Debug)]
pub struct RuntimeApiTrait {
    pub name: String,
    pub methods: HashMap<String, RuntimeApiMethod>,
}

/// The set of runtime API traits this client knows how to call via `state_call`.
#[derive(Clone, Debug)]
pub struct CustomTypeRegistry {
    traits: HashMap<String, RuntimeApiTrait>,
}

impl CustomTypeRegistry {
    /// Load the registry embedded in the binary at compile time.
    pub fn embedded() -> Self {
        Self::parse(EMBEDDED_REGISTRY).expect("embedded runtime API registry is valid JSON")
    }

    fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let parsed: HashMap<String, HashMap<String, Vec<String>>> = serde_json::from_str(raw)?;
        let traits = parsed
            .into_iter()
            .map(|(trait_name, methods)| {
                let methods = methods
                    .into_iter()
                    .map(|(method_name, params)| {
                        (
                            method_name.clone(),
                            RuntimeApiMethod {
                                name: method_name,
                                params,
                            },
                        )
                    })
                    .collect();
                (
                    trait_name.clone(),
                    RuntimeApiTrait {
                        name: trait_name,
                        methods,
                    },
                )
            })
            .collect();
        Ok(CustomTypeRegistry { traits })
    }

    /// Resolve a trait by name.
    pub fn runtime_trait(&self, name: &str) -> Result<&RuntimeApiTrait, MetadataError> {
        self.traits
            .get(name)
            .ok_or_else(|| MetadataError::RuntimeTraitNotFound(name.to_owned()))
    }

    /// Resolve a method within a named trait.
    pub fn runtime_method(
        &self,
        trait_name: &str,
        method_name: &str,
    ) -> Result<&RuntimeApiMethod, MetadataError> {
        let t = self.runtime_trait(trait_name)?;
        t.methods
            .get(method_name)
            .ok_or_else(|| MetadataError::RuntimeMethodNotFound(method_name.to_owned()))
    }

    /// The wire-level method name passed to `state_call`: `"{trait}_{method}"`.
    pub fn state_call_method(trait_name: &str, method_name: &str) -> String {
        format!("{trait_name}_{method_name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_registry_parses_and_resolves_known_methods() {
        let registry = CustomTypeRegistry::embedded();
        let method = registry
            .runtime_method("NeuronInfoRuntimeApi", "get_neuron")
            .unwrap();
        assert_eq!(method.params, vec!["netuid".to_owned(), "uid".to_owned()]);
    }

    #[test]
    fn unknown_trait_is_an_error() {
        let registry = CustomTypeRegistry::embedded();
        assert!(registry.runtime_trait("NotARuntimeApi").is_err());
    }

    #[test]
    fn state_call_method_name_format() {
        assert_eq!(
            CustomTypeRegistry::state_call_method("NeuronInfoRuntimeApi", "get_neurons"),
            "NeuronInfoRuntimeApi_get_neurons"
        );
    }
}
