//! ## trafikk-telemetry::metrics
//! **Prometheus counters and histograms for simulation runs**

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub simulated_steps: IntCounter,
    pub completed_runs: IntCounter,
    pub invariant_failures: IntCounter,
    pub run_flow: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let simulated_steps =
            IntCounter::new("trafikk_steps_total", "Total simulated road updates")?;
        let completed_runs = IntCounter::new("trafikk_runs_total", "Completed simulation runs")?;
        let invariant_failures = IntCounter::new(
            "trafikk_invariant_failures_total",
            "Runs aborted on an invariant violation",
        )?;

        let run_flow = Histogram::with_opts(
            HistogramOpts::new("trafikk_run_flow", "Mean flow per measured run")
                .buckets(vec![0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.75, 1.0]),
        )?;

        registry.register(Box::new(simulated_steps.clone()))?;
        registry.register(Box::new(completed_runs.clone()))?;
        registry.register(Box::new(invariant_failures.clone()))?;
        registry.register(Box::new(run_flow.clone()))?;

        Ok(Self {
            registry,
            simulated_steps,
            completed_runs,
            invariant_failures,
            run_flow,
        })
    }

    /// Text exposition of every registered metric.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn record_run(&self, steps: usize) {
        self.simulated_steps.inc_by(steps as u64);
        self.completed_runs.inc();
    }

    pub fn record_flow(&self, flow: f64) {
        self.run_flow.observe(flow);
    }

    pub fn record_invariant_failure(&self) {
        self.invariant_failures.inc();
    }
}
