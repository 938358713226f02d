use prometheus::{
    histogram_opts, opts, Encoder, HistogramVec, IntCounterVec, Registry, TextEncoder,
};

/// Prometheus metrics for the faucet
#[derive(Clone)]
pub struct FaucetMetrics {
    registry: Registry,

    /// Faucet requests by endpoint and outcome
    pub requests_total: IntCounterVec,

    /// Client manager initialization attempts by resource and outcome
    pub client_init_total: IntCounterVec,

    /// Time spent signing and broadcasting, by endpoint
    pub submission_duration: HistogramVec,
}

impl FaucetMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            opts!("faucet_requests_total", "Faucet requests handled"),
            &["endpoint", "outcome"],
        )?;

        let client_init_total = IntCounterVec::new(
            opts!(
                "faucet_client_init_total",
                "Validator connection and wallet initialization attempts"
            ),
            &["resource", "outcome"],
        )?;

        let submission_duration = HistogramVec::new(
            histogram_opts!(
                "faucet_submission_duration_seconds",
                "Time spent signing and broadcasting faucet transactions"
            ),
            &["endpoint"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(client_init_total.clone()))?;
        registry.register(Box::new(submission_duration.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            client_init_total,
            submission_duration,
        })
    }

    pub fn record_request(&self, endpoint: &str, outcome: &str) {
        self.requests_total
            .with_label_values(&[endpoint, outcome])
            .inc();
    }

    pub fn record_init(&self, resource: &str, success: bool) {
        let outcome = if success { "ok" } else { "error" };
        self.client_init_total
            .with_label_values(&[resource, outcome])
            .inc();
    }

    /// Render all metrics in the text exposition format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
