//! Transaction construction and signing.

use crate::config::RelayConfig;
use crate::encoder::EncodedCallPayload;
use crate::traits::{ChainTransport, TransportError};
use crate::types::{CallDescription, CallParam, SignedTransaction, SigningIdentity};

/// Call parameter carrying the encoded proof.
pub const PROOF_PARAM: &str = "proof";
/// Call parameter carrying the encoded public inputs.
pub const PUBLIC_INPUTS_PARAM: &str = "public_inputs";
/// Call parameter carrying the encoded verification key.
pub const VK_PARAM: &str = "vk";

/// Errors raised while building or signing a transaction.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Call composition failed for {pallet}::{function}: {reason}")]
    CallCompositionFailed {
        pallet: String,
        function: String,
        reason: String,
    },

    #[error("Transport error: {0}")]
    TransportError(#[from] TransportError),
}

/// Builds the proof-verification call and signs it.
///
/// Performs no I/O of its own; composition and signing go through the
/// transport, and nothing is submitted here.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    pallet: String,
    function: String,
}

impl TransactionBuilder {
    pub fn new(pallet: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            pallet: pallet.into(),
            function: function.into(),
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.pallet.clone(), config.call.clone())
    }

    /// Describe the verification call for a payload.
    ///
    /// Parameters are `proof`, `public_inputs`, `vk`, in that order, each as
    /// a lowercase hex string.
    pub fn describe(&self, payload: &EncodedCallPayload) -> CallDescription {
        CallDescription {
            pallet: self.pallet.clone(),
            function: self.function.clone(),
            params: vec![
                CallParam {
                    name: PROOF_PARAM.to_string(),
                    value: payload.proof_hex(),
                },
                CallParam {
                    name: PUBLIC_INPUTS_PARAM.to_string(),
                    value: payload.public_inputs_hex(),
                },
                CallParam {
                    name: VK_PARAM.to_string(),
                    value: payload.verification_key_hex(),
                },
            ],
        }
    }

    /// Derive the signing identity for a secret URI.
    pub async fn derive_identity<T>(
        &self,
        transport: &T,
        uri: &str,
    ) -> Result<SigningIdentity, SigningError>
    where
        T: ChainTransport + ?Sized,
    {
        let identity = transport.derive_identity(uri).await.map_err(|e| match e {
            TransportError::KeyDerivation(reason) => SigningError::KeyDerivationFailed(reason),
            other => SigningError::TransportError(other),
        })?;

        tracing::info!("Loaded signing identity: {}", identity.address());
        Ok(identity)
    }

    /// Compose the verification call and sign it with `identity`.
    pub async fn build<T>(
        &self,
        transport: &T,
        payload: &EncodedCallPayload,
        identity: &SigningIdentity,
    ) -> Result<SignedTransaction, SigningError>
    where
        T: ChainTransport + ?Sized,
    {
        let description = self.describe(payload);

        tracing::debug!("Composing {}::{} call...", self.pallet, self.function);
        let composed = transport
            .compose_call(&description)
            .await
            .map_err(|e| match e {
                TransportError::UnknownCall {
                    pallet,
                    function,
                    reason,
                } => SigningError::CallCompositionFailed {
                    pallet,
                    function,
                    reason,
                },
                other => SigningError::TransportError(other),
            })?;
        tracing::debug!("Call data: {} bytes", composed.call_data.len());

        let signed = transport
            .sign(composed, identity)
            .await
            .map_err(|e| match e {
                TransportError::KeyDerivation(reason) => SigningError::KeyDerivationFailed(reason),
                other => SigningError::TransportError(other),
            })?;

        tracing::info!("Signed transaction {} ({} bytes)", signed.hash, signed.encoded.len());
        Ok(signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ProofArtifact, VerificationKey};
    use crate::encoder::PayloadEncoder;
    use crate::mock::MockTransport;

    fn payload() -> EncodedCallPayload {
        PayloadEncoder::encode(&ProofArtifact::mock(), &VerificationKey::sample()).unwrap()
    }

    #[test]
    fn test_describe_param_order() {
        let builder = TransactionBuilder::from_config(&RelayConfig::default());
        let call = builder.describe(&payload());

        assert_eq!(call.pallet, "SettlementStwoPallet");
        assert_eq!(call.function, "verify_proof");
        let names: Vec<_> = call.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["proof", "public_inputs", "vk"]);
        assert_eq!(call.param("public_inputs"), Some(hex::encode("[3,4,5]").as_str()));
    }

    #[tokio::test]
    async fn test_build_signs_composed_call() {
        let transport = MockTransport::new();
        let builder = TransactionBuilder::from_config(&RelayConfig::default());

        let identity = builder.derive_identity(&transport, "//Alice").await.unwrap();
        let signed = builder.build(&transport, &payload(), &identity).await.unwrap();

        assert_eq!(signed.signer, identity.address());
        assert_eq!(transport.composed_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_uri_fails_key_derivation() {
        let transport = MockTransport::new();
        let builder = TransactionBuilder::from_config(&RelayConfig::default());

        let result = builder.derive_identity(&transport, "not a key").await;
        assert!(matches!(result, Err(SigningError::KeyDerivationFailed(_))));
    }

    #[tokio::test]
    async fn test_unknown_pallet_fails_composition() {
        let transport = MockTransport::new();
        let builder = TransactionBuilder::new("MissingPallet", "verify_proof");

        let identity = builder.derive_identity(&transport, "//Bob").await.unwrap();
        let result = builder.build(&transport, &payload(), &identity).await;

        match result {
            Err(SigningError::CallCompositionFailed { pallet, .. }) => {
                assert_eq!(pallet, "MissingPallet");
            }
            other => panic!("expected CallCompositionFailed, got {other:?}"),
        }
    }
}
