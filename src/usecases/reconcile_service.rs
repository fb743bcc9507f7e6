//! Reconciliation pipeline orchestrator: analyze -> stream -> (export).
//!
//! Phase 1 opens one generation request carrying both ledgers and drives a
//! chunk stream through the classifier. Progress narration is forwarded to
//! the caller immediately, in arrival order; at most one validated result
//! candidate is buffered ("last valid candidate wins") and emitted as the
//! single terminal event after the chunk stream ends. Export is a separate
//! explicit call (see `ExportService`).

use crate::domain::{
    classify_chunk, ChunkClass, DomainError, LedgerDocument, ReconcileEvent, ReconciliationRun,
};
use crate::ports::LedgerAnalystPort;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Default buffer between the generation adapter and the classifier loop.
/// Bounded channel provides backpressure: the adapter suspends on send when
/// the consumer lags.
pub const DEFAULT_CHUNK_QUEUE_SIZE: usize = 64;

enum StreamItem {
    Event(ReconcileEvent),
    Failed(DomainError),
}

/// Forward-only, single-pass event sequence for one reconciliation run.
///
/// Yields `Progress` events while analysis proceeds, then at most one
/// terminal `Result` event. A run that ends without a captured result
/// surfaces `DomainError::NoResult`; an upstream failure surfaces
/// `DomainError::Generation`. After the terminal item, `next_event`
/// returns `Ok(None)`.
pub struct ReconciliationStream {
    rx: mpsc::Receiver<StreamItem>,
}

impl ReconciliationStream {
    pub async fn next_event(&mut self) -> Result<Option<ReconcileEvent>, DomainError> {
        match self.rx.recv().await {
            Some(StreamItem::Event(event)) => Ok(Some(event)),
            Some(StreamItem::Failed(e)) => Err(e),
            None => Ok(None),
        }
    }
}

/// Orchestrator for the two-phase reconcile contract.
pub struct ReconcileService {
    analyst: Arc<dyn LedgerAnalystPort>,
    chunk_queue_size: usize,
}

impl ReconcileService {
    pub fn new(analyst: Arc<dyn LedgerAnalystPort>) -> Self {
        Self::with_chunk_queue(analyst, DEFAULT_CHUNK_QUEUE_SIZE)
    }

    pub fn with_chunk_queue(analyst: Arc<dyn LedgerAnalystPort>, chunk_queue_size: usize) -> Self {
        Self {
            analyst,
            chunk_queue_size: chunk_queue_size.max(1),
        }
    }

    /// Phase 1: start one reconciliation run over two ledgers.
    ///
    /// Returns immediately with the event stream; the generation request and
    /// the classifier loop run as background tasks. One run per stream —
    /// consume it once, strictly in order.
    pub fn analyze(
        &self,
        party_a: LedgerDocument,
        party_b: LedgerDocument,
    ) -> ReconciliationStream {
        info!(
            party_a_bytes = party_a.len(),
            party_b_bytes = party_b.len(),
            "starting reconciliation run"
        );

        let (chunk_tx, chunk_rx) = mpsc::channel(self.chunk_queue_size);
        let (event_tx, event_rx) = mpsc::channel(self.chunk_queue_size);

        let analyst = Arc::clone(&self.analyst);
        let generation = tokio::spawn(async move {
            analyst.reconcile(&party_a, &party_b, chunk_tx).await
        });

        tokio::spawn(drive_run(chunk_rx, generation, event_tx));

        ReconciliationStream { rx: event_rx }
    }
}

/// Classifier loop. Consumes raw chunks until the adapter drops its sender,
/// then joins the generation task to learn the outcome and emits the
/// terminal item. Terminal emission strictly after the loop guarantees no
/// progress event can follow it.
async fn drive_run(
    mut chunk_rx: mpsc::Receiver<String>,
    generation: tokio::task::JoinHandle<Result<(), DomainError>>,
    event_tx: mpsc::Sender<StreamItem>,
) {
    let mut run = ReconciliationRun::new();

    while let Some(chunk) = chunk_rx.recv().await {
        if chunk.is_empty() {
            continue;
        }
        match classify_chunk(&chunk) {
            ChunkClass::Progress(text) => {
                run.note_progress();
                if event_tx
                    .send(StreamItem::Event(ReconcileEvent::Progress(text)))
                    .await
                    .is_err()
                {
                    // Caller dropped the stream; stop consuming. The
                    // adapter winds down when its next send fails.
                    debug!("event stream dropped by caller, abandoning run");
                    return;
                }
            }
            ChunkClass::ResultCandidate(result) => {
                debug!(matches = result.matches.len(), "result candidate captured");
                run.capture(result);
            }
        }
    }

    let terminal = match generation.await {
        Ok(Ok(())) => match run.seal() {
            Some(result) => {
                info!(
                    progress = run.progress_forwarded(),
                    matches = result.matches.len(),
                    party_a = result.party_a_discrepancies.len(),
                    party_b = result.party_b_discrepancies.len(),
                    "reconciliation complete"
                );
                StreamItem::Event(ReconcileEvent::Result(result))
            }
            None => {
                warn!(
                    progress = run.progress_forwarded(),
                    "stream ended with no valid result"
                );
                StreamItem::Failed(DomainError::NoResult)
            }
        },
        Ok(Err(e)) => {
            run.seal_failed();
            warn!(error = %e, "generation call failed");
            StreamItem::Failed(e)
        }
        Err(join_err) => {
            run.seal_failed();
            StreamItem::Failed(DomainError::Generation(format!(
                "generation task aborted: {join_err}"
            )))
        }
    };

    let _ = event_tx.send(terminal).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PartyLabel, PriceEstimate, ReconciliationResult, TrendSummary};
    use std::time::Duration;

    const FINAL_JSON: &str = r#"{"summary":"2 matches","matches":[{"date":"2024-01-01","description":"Invoice 1","amount":500}],"partyADiscrepancies":[],"partyBDiscrepancies":[]}"#;
    const OTHER_JSON: &str = r#"{"summary":"revised","matches":[],"partyADiscrepancies":[],"partyBDiscrepancies":[]}"#;

    /// Analyst double: plays back a chunk script, then returns the scripted
    /// outcome.
    struct ScriptedAnalyst {
        chunks: Vec<&'static str>,
        fail_after: Option<&'static str>,
    }

    impl ScriptedAnalyst {
        fn ok(chunks: Vec<&'static str>) -> Self {
            Self {
                chunks,
                fail_after: None,
            }
        }

        fn failing(chunks: Vec<&'static str>, message: &'static str) -> Self {
            Self {
                chunks,
                fail_after: Some(message),
            }
        }
    }

    #[async_trait::async_trait]
    impl LedgerAnalystPort for ScriptedAnalyst {
        async fn reconcile(
            &self,
            _party_a: &LedgerDocument,
            _party_b: &LedgerDocument,
            chunk_tx: mpsc::Sender<String>,
        ) -> Result<(), DomainError> {
            for chunk in &self.chunks {
                tokio::time::sleep(Duration::from_millis(1)).await;
                if chunk_tx.send((*chunk).to_string()).await.is_err() {
                    break;
                }
            }
            match self.fail_after {
                Some(message) => Err(DomainError::Generation(message.to_string())),
                None => Ok(()),
            }
        }

        async fn estimate_price(
            &self,
            _product: &str,
            _history_csv: &str,
        ) -> Result<PriceEstimate, DomainError> {
            unreachable!("not used by these tests")
        }

        async fn summarize_trends(
            &self,
            _product: &str,
            _history_csv: &str,
        ) -> Result<TrendSummary, DomainError> {
            unreachable!("not used by these tests")
        }
    }

    fn docs() -> (LedgerDocument, LedgerDocument) {
        (
            LedgerDocument::new(PartyLabel::PartyA, "a.pdf", vec![1]),
            LedgerDocument::new(PartyLabel::PartyB, "b.pdf", vec![2]),
        )
    }

    /// Drain a stream into (progress texts, results, error).
    async fn drain(
        mut stream: ReconciliationStream,
    ) -> (Vec<String>, Vec<ReconciliationResult>, Option<DomainError>) {
        let mut progress = Vec::new();
        let mut results = Vec::new();
        loop {
            match stream.next_event().await {
                Ok(Some(ReconcileEvent::Progress(text))) => progress.push(text),
                Ok(Some(ReconcileEvent::Result(result))) => results.push(result),
                Ok(None) => return (progress, results, None),
                Err(e) => return (progress, results, Some(e)),
            }
        }
    }

    #[tokio::test]
    async fn scenario_a_progress_then_single_result() {
        let analyst = Arc::new(ScriptedAnalyst::ok(vec![
            "Starting analysis...",
            "Found 10 transactions.",
            FINAL_JSON,
        ]));
        let service = ReconcileService::new(analyst);
        let (a, b) = docs();

        let (progress, results, error) = drain(service.analyze(a, b)).await;

        assert_eq!(
            progress,
            vec!["Starting analysis...", "Found 10 transactions."]
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].summary, "2 matches");
        assert!(error.is_none());
    }

    #[tokio::test]
    async fn scenario_b_clean_end_without_result_is_distinct_error() {
        let analyst = Arc::new(ScriptedAnalyst::ok(vec![
            "Analyzing...",
            "No major findings.",
        ]));
        let service = ReconcileService::new(analyst);
        let (a, b) = docs();

        let (progress, results, error) = drain(service.analyze(a, b)).await;

        assert_eq!(progress, vec!["Analyzing...", "No major findings."]);
        assert!(results.is_empty());
        assert!(matches!(error, Some(DomainError::NoResult)));
    }

    #[tokio::test]
    async fn scenario_c_wrong_shape_json_forwarded_as_progress() {
        let chunk = r#"{"note": "partial, ignore"}"#;
        let analyst = Arc::new(ScriptedAnalyst::ok(vec![chunk]));
        let service = ReconcileService::new(analyst);
        let (a, b) = docs();

        let (progress, results, error) = drain(service.analyze(a, b)).await;

        assert_eq!(progress, vec![chunk]);
        assert!(results.is_empty());
        assert!(matches!(error, Some(DomainError::NoResult)));
    }

    #[tokio::test]
    async fn last_valid_candidate_wins() {
        let analyst = Arc::new(ScriptedAnalyst::ok(vec![
            "Drafting...",
            FINAL_JSON,
            "Refining totals...",
            OTHER_JSON,
        ]));
        let service = ReconcileService::new(analyst);
        let (a, b) = docs();

        let (progress, results, error) = drain(service.analyze(a, b)).await;

        // Candidates are buffered, not forwarded as progress.
        assert_eq!(progress, vec!["Drafting...", "Refining totals..."]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].summary, "revised");
        assert!(error.is_none());
    }

    #[tokio::test]
    async fn no_progress_after_terminal_and_at_most_one_result() {
        let analyst = Arc::new(ScriptedAnalyst::ok(vec![
            "one",
            FINAL_JSON,
            "two",
            OTHER_JSON,
            "three",
        ]));
        let service = ReconcileService::new(analyst);
        let (a, b) = docs();
        let mut stream = service.analyze(a, b);

        let mut saw_result = false;
        let mut progress_count = 0;
        while let Some(event) = stream.next_event().await.unwrap() {
            match event {
                ReconcileEvent::Progress(_) => {
                    assert!(!saw_result, "progress observed after terminal result");
                    progress_count += 1;
                }
                ReconcileEvent::Result(_) => {
                    assert!(!saw_result, "more than one terminal result");
                    saw_result = true;
                }
            }
        }
        assert!(saw_result);
        assert_eq!(progress_count, 3);
    }

    #[tokio::test]
    async fn upstream_failure_discards_captured_candidate() {
        let analyst = Arc::new(ScriptedAnalyst::failing(
            vec!["working...", FINAL_JSON],
            "connection reset",
        ));
        let service = ReconcileService::new(analyst);
        let (a, b) = docs();

        let (progress, results, error) = drain(service.analyze(a, b)).await;

        assert_eq!(progress, vec!["working..."]);
        assert!(results.is_empty(), "no partial result may be fabricated");
        match error {
            Some(DomainError::Generation(message)) => {
                assert!(message.contains("connection reset"))
            }
            other => panic!("expected Generation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_chunks_are_skipped() {
        let analyst = Arc::new(ScriptedAnalyst::ok(vec!["", "only progress", ""]));
        let service = ReconcileService::new(analyst);
        let (a, b) = docs();

        let (progress, _, _) = drain(service.analyze(a, b)).await;
        assert_eq!(progress, vec!["only progress"]);
    }

    #[tokio::test]
    async fn stream_is_exhausted_after_terminal_event() {
        let analyst = Arc::new(ScriptedAnalyst::ok(vec![FINAL_JSON]));
        let service = ReconcileService::new(analyst);
        let (a, b) = docs();
        let mut stream = service.analyze(a, b);

        assert!(matches!(
            stream.next_event().await,
            Ok(Some(ReconcileEvent::Result(_)))
        ));
        assert!(matches!(stream.next_event().await, Ok(None)));
        assert!(matches!(stream.next_event().await, Ok(None)));
    }
}
