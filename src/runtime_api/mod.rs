//! Component E: runtime API invocation via `state_call`.
//!
//! Grounded on `query_runtime_api` in `examples/original_source/bittensor/
//! core/async_subtensor.py`: resolve `{trait}.{method}` against the static
//! type registry (component B's [`crate::metadata::CustomTypeRegistry`]) for
//! an arity check, SCALE-encode the positional parameters, issue
//! `state_call("{trait}_{method}", data, block_hash?)`, and special-case the
//! node's `0x0400` bytes as "no value" (observed directly in the original:
//! `if obj.data.to_hex() == "0x0400": return None`).

use codec::Decode;

use crate::config::Hash;
use crate::error::{Error, MetadataError};
use crate::metadata::{CustomTypeRegistry, Metadata};
use crate::rpc::Transport;

/// The node's sentinel byte sequence for "this runtime API call has no value".
const NONE_SENTINEL: [u8; 2] = [0x04, 0x00];

/// A client for invoking runtime API methods via `state_call`.
#[derive(Clone)]
pub struct RuntimeApiClient {
    transport: Transport,
    metadata: Metadata,
}

impl RuntimeApiClient {
    /// Construct a runtime API client for the given transport and cached metadata.
    pub fn new(transport: Transport, metadata: Metadata) -> Self {
        RuntimeApiClient { transport, metadata }
    }

    /// The custom runtime-API registry backing arity checks for this client.
    pub fn registry(&self) -> &CustomTypeRegistry {
        self.metadata.custom_types()
    }

    /// Invoke `{trait_name}_{method_name}` via `state_call`, returning the raw
    /// inner payload bytes, or `None` if the node reported no value.
    ///
    /// `params` are the already-SCALE-encoded positional arguments, in
    /// declaration order; they are concatenated (SCALE tuples are just
    /// concatenated field encodings, so no further framing is needed).
    pub async fn call_raw(
        &self,
        trait_name: &str,
        method_name: &str,
        params: &[Vec<u8>],
        at: Option<Hash>,
    ) -> Result<Option<Vec<u8>>, Error> {
        let method = self.registry().runtime_method(trait_name, method_name)?;
        if params.len() != method.params.len() {
            return Err(MetadataError::RuntimeMethodNotFound(format!(
                "{trait_name}.{method_name} expects {} params, got {}",
                method.params.len(),
                params.len()
            ))
            .into());
        }

        let data = if params.is_empty() {
            "0x".to_owned()
        } else {
            let mut concatenated = Vec::new();
            for p in params {
                concatenated.extend_from_slice(p);
            }
            format!("0x{}", hex::encode(concatenated))
        };

        let api_method = CustomTypeRegistry::state_call_method(trait_name, method_name);
        let params = match at {
            Some(h) => serde_json::json!([api_method, data, hex_encode_hash(h)]),
            None => serde_json::json!([api_method, data]),
        };

        let result_hex: String = self.transport.call_as("state_call", params).await?;
        let bytes = hex_decode(&result_hex)?;

        if bytes == NONE_SENTINEL {
            return Ok(None);
        }

        // The node wraps the actual payload as a SCALE `Vec<u8>`: a compact
        // length prefix followed by the raw bytes.
        let inner: Vec<u8> = Vec::<u8>::decode(&mut &bytes[..]).map_err(Error::from)?;
        Ok(Some(inner))
    }

    /// As [`Self::call_raw`], but with parameters given as a name→encoded-
    /// bytes mapping rather than positionally (§4.E's named-parameter form).
    /// Each of the method's declared parameter names is resolved against
    /// `params` and reassembled into declaration order; a name with no
    /// matching entry fails with [`Error::MissingParam`] before any I/O.
    pub async fn call_named(
        &self,
        trait_name: &str,
        method_name: &str,
        params: &[(&str, Vec<u8>)],
        at: Option<Hash>,
    ) -> Result<Option<Vec<u8>>, Error> {
        let method = self.registry().runtime_method(trait_name, method_name)?;
        let mut positional = Vec::with_capacity(method.params.len());
        for name in &method.params {
            let value = params
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| Error::MissingParam(name.clone()))?;
            positional.push(value);
        }
        self.call_raw(trait_name, method_name, &positional, at).await
    }

    /// As [`Self::call_raw`], decoding the inner payload as `T` when present.
    pub async fn call_decoded<T: Decode>(
        &self,
        trait_name: &str,
        method_name: &str,
        params: &[Vec<u8>],
        at: Option<Hash>,
    ) -> Result<Option<T>, Error> {
        let Some(inner) = self.call_raw(trait_name, method_name, params, at).await? else {
            return Ok(None);
        };
        let decoded = T::decode(&mut &inner[..]).map_err(Error::from)?;
        Ok(Some(decoded))
    }
}

fn hex_encode_hash(hash: Hash) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}

fn hex_decode(s: &str) -> Result<Vec<u8>, Error> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).map_err(|e| Error::Other(format!("invalid hex in RPC response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_sentinel_matches_observed_wire_bytes() {
        assert_eq!(NONE_SENTINEL, [0x04, 0x00]);
    }

    #[test]
    fn named_params_resolve_by_name_regardless_of_call_order() {
        let registry = CustomTypeRegistry::embedded();
        let method = registry.runtime_method("NeuronInfoRuntimeApi", "get_neuron").unwrap();
        assert_eq!(method.params, vec!["netuid".to_owned(), "uid".to_owned()]);
    }

    /// Accept one WebSocket connection and never reply to anything sent on
    /// it - used to prove a call never reaches the transport at all (a real
    /// `state_call` round trip against this server would hang, not error).
    async fn spawn_silent_server() -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let _ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            std::future::pending::<()>().await;
        });
        addr
    }

    #[tokio::test]
    async fn missing_named_param_fails_before_any_io() {
        let addr = spawn_silent_server().await;
        let transport = Transport::connect(format!("ws://{addr}")).await.unwrap();
        let client = RuntimeApiClient::new(transport, Metadata::for_test_empty());

        let err = client
            .call_named("NeuronInfoRuntimeApi", "get_neuron", &[("netuid", vec![1, 0])], None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingParam(name) if name == "uid"));
    }
}
