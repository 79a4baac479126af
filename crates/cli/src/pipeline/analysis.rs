//! Periodic live-analysis cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use contracts::{SignalAnalyzer, StreamConfig};
use observability::RunningStats;
use window_store::WindowStore;

/// Counters shared between the analysis task and the final stats
#[derive(Debug, Default)]
pub(crate) struct AnalysisCounters {
    pub cycles: AtomicU64,
    pub failures: AtomicU64,
    pub durations_ms: Mutex<RunningStats>,
}

impl AnalysisCounters {
    pub fn durations(&self) -> RunningStats {
        self.durations_ms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Run analysis over every full user window at the configured interval
///
/// A failing analyzer call is logged and skipped; the previous cached result
/// stays visible. Stale-but-valid beats none on a live display.
pub(crate) async fn run_analysis_cycle(
    store: Arc<WindowStore>,
    analyzer: Arc<dyn SignalAnalyzer>,
    stream: StreamConfig,
    counters: Arc<AnalysisCounters>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(
        stream.analysis_interval_secs.max(0.01),
    ));
    let required = stream.analysis_window_samples();

    loop {
        ticker.tick().await;

        for user_id in store.user_ids() {
            observability::record_window_depth(&user_id, store.buffer_depth(&user_id));

            let Some(window) = store.read_window(&user_id, required) else {
                continue;
            };

            let call_start = Instant::now();
            match analyzer.analyze(&window, stream.sample_rate, &stream.channel_names) {
                Ok(result) => {
                    store.set_result(&user_id, result);
                    counters.cycles.fetch_add(1, Ordering::Relaxed);
                    debug!(user_id = %user_id, analyzer = analyzer.name(), "analysis cycle completed");
                }
                Err(e) => {
                    counters.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        user_id = %user_id,
                        analyzer = analyzer.name(),
                        error = %e,
                        "analysis failed, keeping previous result"
                    );
                }
            }
            counters
                .durations_ms
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(call_start.elapsed().as_secs_f64() * 1000.0);
        }
    }
}
