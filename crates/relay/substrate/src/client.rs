//! Substrate chain transport over subxt.
//!
//! Calls and events are resolved dynamically against the connected node's
//! runtime metadata, so no generated runtime bindings are needed and the
//! pallet/call names stay configurable.

use std::str::FromStr;

use async_trait::async_trait;
use subxt::error::BlockError;
use subxt::events::Phase;
use subxt::ext::scale_value::Composite;
use subxt::tx::{DynamicPayload, SubmittableExtrinsic, TxStatus};
use subxt::{OnlineClient, PolkadotConfig};
use subxt_signer::SecretUri;
use subxt_signer::sr25519::Keypair;

use proof_relay_core::{
    BlockHash, BlockchainConfig, CallDescription, ChainEvent, ChainTransport, ComposedCall,
    InclusionStatus, SignedTransaction, SigningIdentity, TransportError,
};

use crate::config::SubstrateConfig;
use crate::utils::{
    account_to_ss58, block_hash_to_h256, composite_to_fields, h256_to_block_hash, h256_to_tx_hash,
    hex_param_to_value,
};

/// `ChainTransport` backed by a live Substrate node.
pub struct SubxtTransport {
    api: OnlineClient<PolkadotConfig>,
    config: SubstrateConfig,
}

impl SubxtTransport {
    /// Validate the configuration and connect to the node.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the node cannot be
    /// reached.
    pub async fn connect(config: SubstrateConfig) -> Result<Self, TransportError> {
        config
            .validate()
            .map_err(|e| TransportError::BackendError(format!("Invalid configuration: {}", e)))?;

        tracing::info!("Connecting to {} ({})...", config.rpc_url(), config.network_name());
        // Scheme already checked; plain ws to a remote host is accepted
        let api = OnlineClient::<PolkadotConfig>::from_insecure_url(&config.node_url)
            .await
            .map_err(network_error)?;

        let version = api.runtime_version();
        tracing::info!(
            "Connected to {} (spec version {})",
            config.node_url,
            version.spec_version
        );

        Ok(Self { api, config })
    }

    pub fn config(&self) -> &SubstrateConfig {
        &self.config
    }

    fn keypair(uri: &str) -> Result<Keypair, TransportError> {
        let secret =
            SecretUri::from_str(uri).map_err(|e| TransportError::KeyDerivation(e.to_string()))?;
        Keypair::from_uri(&secret).map_err(|e| TransportError::KeyDerivation(e.to_string()))
    }

    fn payload(call: &CallDescription) -> Result<DynamicPayload, TransportError> {
        let fields = call
            .params
            .iter()
            .map(|p| Ok((p.name.clone(), hex_param_to_value(&p.name, &p.value)?)))
            .collect::<Result<Vec<_>, TransportError>>()?;

        Ok(subxt::dynamic::tx(
            call.pallet.as_str(),
            call.function.as_str(),
            Composite::named(fields),
        ))
    }
}

#[async_trait]
impl ChainTransport for SubxtTransport {
    async fn derive_identity(&self, uri: &str) -> Result<SigningIdentity, TransportError> {
        let keypair = Self::keypair(uri)?;
        let account = keypair.public_key().to_account_id();
        let address = account_to_ss58(&account, self.config.ss58_prefix);
        Ok(SigningIdentity::new(uri, address))
    }

    async fn compose_call(&self, call: &CallDescription) -> Result<ComposedCall, TransportError> {
        let payload = Self::payload(call)?;
        let unknown = |e: subxt::Error| TransportError::UnknownCall {
            pallet: call.pallet.clone(),
            function: call.function.clone(),
            reason: e.to_string(),
        };

        self.api.tx().validate(&payload).map_err(unknown)?;
        let call_data = self.api.tx().call_data(&payload).map_err(unknown)?;

        Ok(ComposedCall {
            description: call.clone(),
            call_data,
        })
    }

    async fn sign(
        &self,
        call: ComposedCall,
        identity: &SigningIdentity,
    ) -> Result<SignedTransaction, TransportError> {
        let keypair = Self::keypair(identity.uri())?;
        let payload = Self::payload(&call.description)?;

        // Fetches the account nonce from the node
        let signed = self
            .api
            .tx()
            .create_signed(&payload, &keypair, Default::default())
            .await
            .map_err(network_error)?;

        Ok(SignedTransaction {
            hash: h256_to_tx_hash(signed.hash()),
            encoded: signed.encoded().to_vec(),
            signer: identity.address().to_string(),
        })
    }

    async fn submit_and_watch(
        &self,
        tx: &SignedTransaction,
    ) -> Result<InclusionStatus, TransportError> {
        let extrinsic = SubmittableExtrinsic::from_bytes(self.api.clone(), tx.encoded.clone());
        let mut progress = extrinsic.submit_and_watch().await.map_err(network_error)?;

        while let Some(status) = progress.next().await {
            match status.map_err(network_error)? {
                TxStatus::Validated => tracing::debug!("Transaction {} validated", tx.hash),
                TxStatus::Broadcasted { num_peers } => {
                    tracing::debug!("Transaction {} broadcast to {} peers", tx.hash, num_peers)
                }
                TxStatus::NoLongerInBestBlock => {
                    tracing::debug!("Transaction {} no longer in best block", tx.hash)
                }
                TxStatus::InBestBlock(in_block) | TxStatus::InFinalizedBlock(in_block) => {
                    let block_hash = h256_to_block_hash(in_block.block_hash());
                    let extrinsic_index = match in_block.fetch_events().await {
                        Ok(events) => Some(events.extrinsic_index()),
                        Err(e) => {
                            tracing::warn!(
                                "Could not locate transaction {} inside block {}: {}",
                                tx.hash,
                                block_hash,
                                e
                            );
                            None
                        }
                    };
                    return Ok(InclusionStatus::Included {
                        block_hash,
                        extrinsic_index,
                    });
                }
                TxStatus::Error { message } => {
                    return Ok(InclusionStatus::Rejected {
                        reason: format!("error: {}", message),
                    });
                }
                TxStatus::Invalid { message } => {
                    return Ok(InclusionStatus::Rejected {
                        reason: format!("invalid: {}", message),
                    });
                }
                TxStatus::Dropped { message } => {
                    return Ok(InclusionStatus::Rejected {
                        reason: format!("dropped: {}", message),
                    });
                }
            }
        }

        Ok(InclusionStatus::Rejected {
            reason: "status stream ended before inclusion".to_string(),
        })
    }

    async fn fetch_block_events(&self, block: &BlockHash) -> Result<Vec<ChainEvent>, TransportError> {
        let at = block_hash_to_h256(block)?;

        let block_ref = self.api.blocks().at(at).await.map_err(|e| match e {
            subxt::Error::Block(BlockError::NotFound(_)) => {
                TransportError::BlockNotFound(block.clone())
            }
            other => network_error(other),
        })?;
        let events = block_ref.events().await.map_err(network_error)?;

        let mut decoded = Vec::with_capacity(events.len() as usize);
        for event in events.iter() {
            let event = event.map_err(|e| TransportError::SerializationError(e.to_string()))?;

            let extrinsic_index = match event.phase() {
                Phase::ApplyExtrinsic(index) => Some(index),
                _ => None,
            };
            let fields = match event.field_values() {
                Ok(values) => composite_to_fields(&values),
                Err(e) => {
                    tracing::debug!(
                        "Undecodable fields in {}::{}: {}",
                        event.pallet_name(),
                        event.variant_name(),
                        e
                    );
                    Vec::new()
                }
            };

            decoded.push(ChainEvent {
                pallet: event.pallet_name().to_string(),
                variant: event.variant_name().to_string(),
                extrinsic_index,
                fields,
            });
        }

        Ok(decoded)
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        let latest = self.api.blocks().at_latest().await.map_err(network_error)?;
        tracing::debug!("Node healthy, best block #{}", latest.number());
        Ok(())
    }
}

fn network_error(e: subxt::Error) -> TransportError {
    TransportError::NetworkError(e.to_string())
}
