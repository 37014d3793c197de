//! Telemetry for pipeline runs
//!
//! Collects stage timings and retrieval fan-out events so the CLI can print
//! a run summary. A collector lives as long as the process, so only counters
//! accumulate; the event log and stage timings are bounded.

use crate::types::PipelineStage;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Events kept in the log; older ones are dropped first
pub const MAX_RECENT_EVENTS: usize = 256;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    // Stage events
    StageStarted {
        stage: PipelineStage,
        timestamp: Instant,
    },
    StageCompleted {
        stage: PipelineStage,
        duration_ms: u64,
        timestamp: Instant,
    },

    // Retrieval fan-out events
    SubQuestionDispatch {
        count: usize,
        timestamp: Instant,
    },
    ToolDispatch {
        tool: String,
        call_count: usize,
        timestamp: Instant,
    },
    ToolCompleted {
        tool: String,
        duration_ms: u64,
        success: bool,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub stages_started: usize,
    pub stages_completed: usize,
    pub sub_questions_dispatched: usize,
    pub tools_executed: usize,
    pub tools_succeeded: usize,
    pub tools_failed: usize,
    /// Latest duration per stage, in pipeline order of first completion
    pub stage_durations_ms: Vec<(PipelineStage, u64)>,
}

impl TelemetryStats {
    fn record_stage_duration(&mut self, stage: PipelineStage, duration_ms: u64) {
        match self.stage_durations_ms.iter_mut().find(|(s, _)| *s == stage) {
            Some(entry) => entry.1 = duration_ms,
            None => self.stage_durations_ms.push((stage, duration_ms)),
        }
    }
}

/// Telemetry collector
///
/// Cheap to clone; clones share the same event log.
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<VecDeque<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

/// A panicked recorder must not take the collector down with it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_RECENT_EVENTS))),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = lock(&self.stats);
            match &event {
                TelemetryEvent::StageStarted { .. } => {
                    stats.stages_started += 1;
                }
                TelemetryEvent::StageCompleted {
                    stage, duration_ms, ..
                } => {
                    stats.stages_completed += 1;
                    stats.record_stage_duration(*stage, *duration_ms);
                }
                TelemetryEvent::SubQuestionDispatch { count, .. } => {
                    stats.sub_questions_dispatched += count;
                }
                TelemetryEvent::ToolDispatch { call_count, .. } => {
                    stats.tools_executed += call_count;
                }
                TelemetryEvent::ToolCompleted { success, .. } => {
                    if *success {
                        stats.tools_succeeded += 1;
                    } else {
                        stats.tools_failed += 1;
                    }
                }
            }
        }

        let mut events = lock(&self.events);
        if events.len() == MAX_RECENT_EVENTS {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Events currently retained in the log
    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Calculate tool success rate
    pub fn tool_success_rate(&self) -> f64 {
        let stats = lock(&self.stats);
        let total = stats.tools_succeeded + stats.tools_failed;
        if total == 0 {
            1.0
        } else {
            stats.tools_succeeded as f64 / total as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple telemetry display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: crate::cli::Verbosity,
}

impl TelemetryDisplay {
    pub fn new(collector: TelemetryCollector, verbosity: crate::cli::Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Display summary statistics
    pub fn display_summary(&self) {
        if !self.should_show_details() {
            return;
        }

        let stats = self.collector.get_stats();
        let elapsed = self.collector.elapsed();

        eprintln!("\n📊 Run Summary");
        eprintln!("─────────────────────────────────────");
        eprintln!("Duration:          {:?}", elapsed);
        for (stage, ms) in &stats.stage_durations_ms {
            eprintln!("{:<18} {} ms", format!("{}:", stage.display_name()), ms);
        }
        eprintln!("Sub-questions:     {}", stats.sub_questions_dispatched);
        eprintln!("Tool calls:        {}", stats.tools_executed);
        eprintln!("Events logged:     {}", self.collector.event_count());
        eprintln!(
            "Success rate:      {:.1}%",
            self.collector.tool_success_rate() * 100.0
        );
        eprintln!();
    }

    /// Check if should show detailed output
    pub fn should_show_details(&self) -> bool {
        self.verbosity.show_events()
    }
}
