//! Pipeline orchestrator
//!
//! Threads one [`QAState`] through Planner -> Retriever -> Summarizer ->
//! Verifier. Each stage reads the state and returns a single
//! [`StageUpdate`]; the orchestrator is the only writer and applies it.
//! A failing stage aborts the run and the caller gets the error, never a
//! partial state.

use crate::agent::{Planner, Retriever, Stage, Summarizer, Verifier};
use crate::errors::Result;
use crate::generation::GenerationCapability;
use crate::retrieval::RetrievalCapability;
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::{QAResponse, QAState};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Multi-stage question answering pipeline
pub struct QaPipeline {
    planner: Planner,
    retriever: Retriever,
    summarizer: Summarizer,
    verifier: Verifier,
    telemetry: TelemetryCollector,
}

impl QaPipeline {
    pub fn new(
        generator: Arc<dyn GenerationCapability>,
        retrieval: Arc<dyn RetrievalCapability>,
    ) -> Self {
        Self::with_telemetry(generator, retrieval, TelemetryCollector::new())
    }

    /// Build the pipeline recording into an existing collector
    pub fn with_telemetry(
        generator: Arc<dyn GenerationCapability>,
        retrieval: Arc<dyn RetrievalCapability>,
        telemetry: TelemetryCollector,
    ) -> Self {
        Self {
            planner: Planner::new(generator.clone()),
            retriever: Retriever::new(generator.clone(), retrieval, telemetry.clone()),
            summarizer: Summarizer::new(generator.clone()),
            verifier: Verifier::new(generator),
            telemetry,
        }
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    fn stages(&self) -> [&dyn Stage; 4] {
        [
            &self.planner,
            &self.retriever,
            &self.summarizer,
            &self.verifier,
        ]
    }

    /// Run every stage in order and return the completed state
    pub async fn run(&self, question: &str) -> Result<QAState> {
        let run_id = Uuid::new_v4();
        self.run_stages(question)
            .instrument(info_span!("qa_run", %run_id))
            .await
    }

    async fn run_stages(&self, question: &str) -> Result<QAState> {
        let run_start = Instant::now();
        let mut state = QAState::new(question);
        info!("Answering question: {}", question);

        for stage in self.stages() {
            let kind = stage.stage();
            let start = Instant::now();
            self.telemetry.record(TelemetryEvent::StageStarted {
                stage: kind,
                timestamp: start,
            });
            debug!("Stage {} started", kind);

            let update = stage.run(&state).await?;
            state.apply(update)?;

            let duration_ms = start.elapsed().as_millis() as u64;
            self.telemetry.record(TelemetryEvent::StageCompleted {
                stage: kind,
                duration_ms,
                timestamp: Instant::now(),
            });
            debug!("Stage {} completed in {} ms", kind, duration_ms);
        }

        info!(
            "Pipeline finished in {} ms",
            run_start.elapsed().as_millis()
        );
        Ok(state)
    }

    /// Answer plus the context it was grounded on
    pub async fn answer(&self, question: &str) -> Result<QAResponse> {
        self.run(question).await?.to_response()
    }
}
