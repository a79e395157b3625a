//! Verification result extraction from block events.

use crate::config::RelayConfig;
use crate::traits::{ChainTransport, TransportError};
use crate::types::{
    BlockHash, ChainEvent, SubmissionReceipt, VerificationOutcome, VerificationReport,
};

/// Field holding the validity flag of the completion event.
pub const VALIDITY_FIELD: &str = "is_valid";
/// Field holding the parse-success flag of the parsing-diagnostic event.
pub const PARSED_FIELD: &str = "parsed";

/// Errors raised while looking up a block's events.
#[derive(Debug, thiserror::Error)]
pub enum EventLookupError {
    #[error("Failed to fetch events for block {block_hash}: {source}")]
    EventFetchFailed {
        block_hash: BlockHash,
        #[source]
        source: TransportError,
    },
}

/// Reads the verification outcome out of a block's event log.
#[derive(Debug, Clone)]
pub struct ResultExtractor {
    pallet: String,
    completion_event: String,
    parsing_event: String,
}

impl ResultExtractor {
    pub fn new(
        pallet: impl Into<String>,
        completion_event: impl Into<String>,
        parsing_event: impl Into<String>,
    ) -> Self {
        Self {
            pallet: pallet.into(),
            completion_event: completion_event.into(),
            parsing_event: parsing_event.into(),
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            config.pallet.clone(),
            config.completion_event.clone(),
            config.parsing_event.clone(),
        )
    }

    /// Classify a block's events.
    ///
    /// Only events of the verification pallet count, and only those of
    /// `extrinsic_index` when given. The first completion event decides the
    /// outcome; without one the outcome is `NotFound` whatever the parsing
    /// event says. Returns the outcome and the parse flag, if any.
    pub fn classify(
        &self,
        events: &[ChainEvent],
        extrinsic_index: Option<u32>,
    ) -> (VerificationOutcome, Option<bool>) {
        let mut outcome = None;
        let mut parsed = None;

        let relevant = events.iter().filter(|event| {
            event.pallet == self.pallet
                && extrinsic_index.is_none_or(|index| event.extrinsic_index == Some(index))
        });

        for event in relevant {
            if event.variant == self.completion_event && outcome.is_none() {
                outcome = Some(match event.flag(VALIDITY_FIELD).and_then(|v| v.as_bool()) {
                    Some(true) => VerificationOutcome::Valid,
                    Some(false) => VerificationOutcome::Invalid,
                    None => VerificationOutcome::ParsingFailed,
                });
            } else if event.variant == self.parsing_event && parsed.is_none() {
                parsed = event.flag(PARSED_FIELD).and_then(|v| v.as_bool());
            }
        }

        (outcome.unwrap_or(VerificationOutcome::NotFound), parsed)
    }

    /// Fetch the receipt's block events and classify them.
    pub async fn extract<T>(
        &self,
        transport: &T,
        receipt: &SubmissionReceipt,
    ) -> Result<VerificationReport, EventLookupError>
    where
        T: ChainTransport + ?Sized,
    {
        self.extract_at(transport, &receipt.block_hash, receipt.extrinsic_index)
            .await
    }

    /// Fetch and classify the events of an arbitrary, already known block.
    pub async fn extract_at<T>(
        &self,
        transport: &T,
        block_hash: &BlockHash,
        extrinsic_index: Option<u32>,
    ) -> Result<VerificationReport, EventLookupError>
    where
        T: ChainTransport + ?Sized,
    {
        tracing::info!("Checking events in block {}...", block_hash);

        let events = transport
            .fetch_block_events(block_hash)
            .await
            .map_err(|source| EventLookupError::EventFetchFailed {
                block_hash: block_hash.clone(),
                source,
            })?;
        tracing::debug!("Block {} has {} events", block_hash, events.len());

        let (outcome, parsed) = self.classify(&events, extrinsic_index);

        if let Some(parsed) = parsed {
            tracing::info!("Proof parsing: {}", if parsed { "SUCCESS" } else { "FAILED" });
        }
        match outcome {
            VerificationOutcome::NotFound => {
                tracing::warn!("No {} event found in block {}", self.completion_event, block_hash)
            }
            VerificationOutcome::ParsingFailed => tracing::warn!(
                "{} event in block {} has no readable validity flag",
                self.completion_event,
                block_hash
            ),
            _ => tracing::info!("Proof verification result: {}", outcome),
        }

        Ok(VerificationReport {
            outcome,
            parsed,
            block_hash: block_hash.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::types::{EventValue, TransactionHash};

    const PALLET: &str = "SettlementStwoPallet";

    fn extractor() -> ResultExtractor {
        ResultExtractor::from_config(&RelayConfig::default())
    }

    fn completion(valid: bool) -> ChainEvent {
        ChainEvent::new(PALLET, "ProofVerified").with_field("is_valid", EventValue::Bool(valid))
    }

    fn parsing(parsed: bool) -> ChainEvent {
        ChainEvent::new(PALLET, "DebugParsing").with_field("parsed", EventValue::Bool(parsed))
    }

    #[test]
    fn test_parsing_event_alone_is_not_found() {
        for flag in [true, false] {
            let (outcome, parsed) = extractor().classify(&[parsing(flag)], None);
            assert_eq!(outcome, VerificationOutcome::NotFound);
            assert_eq!(parsed, Some(flag));
        }
    }

    #[test]
    fn test_completion_flag_decides_regardless_of_parsing() {
        let cases = [
            (vec![completion(true)], VerificationOutcome::Valid),
            (vec![parsing(false), completion(true)], VerificationOutcome::Valid),
            (vec![parsing(true), completion(true)], VerificationOutcome::Valid),
            (vec![completion(false)], VerificationOutcome::Invalid),
            (vec![parsing(true), completion(false)], VerificationOutcome::Invalid),
            (vec![parsing(false), completion(false)], VerificationOutcome::Invalid),
        ];

        for (events, expected) in cases {
            let (outcome, _) = extractor().classify(&events, None);
            assert_eq!(outcome, expected, "events: {events:?}");
        }
    }

    #[test]
    fn test_unreadable_flag_is_parsing_failed() {
        let event = ChainEvent::new(PALLET, "ProofVerified")
            .with_field("is_valid", EventValue::Other("()".to_string()));
        let (outcome, _) = extractor().classify(&[event], None);
        assert_eq!(outcome, VerificationOutcome::ParsingFailed);

        let (outcome, _) = extractor().classify(&[ChainEvent::new(PALLET, "ProofVerified")], None);
        assert_eq!(outcome, VerificationOutcome::ParsingFailed);
    }

    #[test]
    fn test_completion_without_validity_field_is_parsing_failed() {
        let event = ChainEvent::new(PALLET, "ProofVerified")
            .with_field("success", EventValue::Bool(true));
        let (outcome, _) = extractor().classify(&[event], None);
        assert_eq!(outcome, VerificationOutcome::ParsingFailed);
    }

    #[test]
    fn test_other_pallets_ignored() {
        let foreign = ChainEvent::new("System", "ProofVerified")
            .with_field("is_valid", EventValue::Bool(true));
        let (outcome, _) = extractor().classify(&[foreign], None);
        assert_eq!(outcome, VerificationOutcome::NotFound);
    }

    #[test]
    fn test_extrinsic_index_scopes_scan() {
        let events = vec![
            completion(true).with_extrinsic_index(1),
            completion(false).with_extrinsic_index(2),
        ];

        assert_eq!(extractor().classify(&events, Some(2)).0, VerificationOutcome::Invalid);
        assert_eq!(extractor().classify(&events, Some(3)).0, VerificationOutcome::NotFound);
        // Without an index the first completion event wins
        assert_eq!(extractor().classify(&events, None).0, VerificationOutcome::Valid);
    }

    #[tokio::test]
    async fn test_extract_from_transport() {
        let block = BlockHash::from_bytes(vec![0xaa; 32]);
        let transport = MockTransport::new().with_block_events(
            block.clone(),
            vec![parsing(true).with_extrinsic_index(1), completion(true).with_extrinsic_index(1)],
        );
        let receipt = SubmissionReceipt {
            block_hash: block.clone(),
            tx_hash: TransactionHash::from_bytes(vec![1]),
            extrinsic_index: Some(1),
        };

        let report = extractor().extract(&transport, &receipt).await.unwrap();
        assert_eq!(report.outcome, VerificationOutcome::Valid);
        assert_eq!(report.parsed, Some(true));
        assert_eq!(report.block_hash, block);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_event_lookup_error() {
        let transport = MockTransport::new();
        let missing = BlockHash::from_bytes(vec![0x00; 32]);

        let err = extractor().extract_at(&transport, &missing, None).await.unwrap_err();
        let EventLookupError::EventFetchFailed { block_hash, source } = err;
        assert_eq!(block_hash, missing);
        assert!(matches!(source, TransportError::BlockNotFound(_)));
    }
}
