use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub claims_total: IntCounterVec,
    pub completions_total: IntCounterVec,
    pub cancellations_total: IntCounterVec,
    pub nearby_query_latency_seconds: HistogramVec,
    pub nearby_results: Histogram,
    pub open_requests: IntGauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let claims_total = IntCounterVec::new(
            Opts::new("claims_total", "Claim attempts by outcome"),
            &["outcome"],
        )
        .expect("valid claims_total metric");

        let completions_total = IntCounterVec::new(
            Opts::new("completions_total", "Completion attempts by outcome"),
            &["outcome"],
        )
        .expect("valid completions_total metric");

        let cancellations_total = IntCounterVec::new(
            Opts::new("cancellations_total", "Cancellation attempts by outcome"),
            &["outcome"],
        )
        .expect("valid cancellations_total metric");

        let nearby_query_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "nearby_query_latency_seconds",
                "Latency of nearby-work lookups in seconds",
            ),
            &["outcome"],
        )
        .expect("valid nearby_query_latency_seconds metric");

        let nearby_results = Histogram::with_opts(
            HistogramOpts::new("nearby_results", "Open requests returned per lookup")
                .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        )
        .expect("valid nearby_results metric");

        let open_requests = IntGauge::new(
            "open_requests",
            "Pending requests that have not been claimed",
        )
        .expect("valid open_requests metric");

        registry
            .register(Box::new(claims_total.clone()))
            .expect("register claims_total");
        registry
            .register(Box::new(completions_total.clone()))
            .expect("register completions_total");
        registry
            .register(Box::new(cancellations_total.clone()))
            .expect("register cancellations_total");
        registry
            .register(Box::new(nearby_query_latency_seconds.clone()))
            .expect("register nearby_query_latency_seconds");
        registry
            .register(Box::new(nearby_results.clone()))
            .expect("register nearby_results");
        registry
            .register(Box::new(open_requests.clone()))
            .expect("register open_requests");

        Self {
            registry,
            claims_total,
            completions_total,
            cancellations_total,
            nearby_query_latency_seconds,
            nearby_results,
            open_requests,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
