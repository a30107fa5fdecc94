use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};
use warp::Filter;
use once_cell::sync::Lazy;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new("mcprobe_resolutions_total", "Address resolutions by how the target was found");
    let ctr = IntCounterVec::new(opts, &["via"]).expect("resolutions counter");
    REGISTRY.register(Box::new(ctr.clone())).expect("register resolutions counter");
    ctr
});

static PROBE_LATENCY: Lazy<GaugeVec> = Lazy::new(|| {
    let opts = Opts::new("mcprobe_probe_latency_milliseconds_current", "Last measured server ping in milliseconds");
    let gauge = GaugeVec::new(opts, &["target"]).expect("latency gauge");
    REGISTRY.register(Box::new(gauge.clone())).expect("register latency gauge");
    gauge
});

static PROBE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new("mcprobe_probe_failures_total", "Status probes that got no valid answer");
    let ctr = IntCounterVec::new(opts, &["target", "reason"]).expect("failures counter");
    REGISTRY.register(Box::new(ctr.clone())).expect("register failures counter");
    ctr
});

static API_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new("mcprobe_api_requests_total", "HTTP API requests by response status");
    let ctr = IntCounterVec::new(opts, &["status"]).expect("requests counter");
    REGISTRY.register(Box::new(ctr.clone())).expect("register requests counter");
    ctr
});

pub fn inc_resolution(via: &str) {
    RESOLUTIONS.with_label_values(&[via]).inc();
}

pub fn observe_latency(target: &str, latency_ms: f64) {
    PROBE_LATENCY.with_label_values(&[target]).set(latency_ms);
}

pub fn inc_probe_failure(target: &str, reason: &str) {
    PROBE_FAILURES.with_label_values(&[target, reason]).inc();
}

pub fn inc_api_request(status: u16) {
    API_REQUESTS.with_label_values(&[status.to_string().as_str()]).inc();
}

pub fn render() -> Result<(String, Vec<u8>), prometheus::Error> {
    let encoder = TextEncoder::new();
    let mf = REGISTRY.gather();
    let mut buf = Vec::new();
    encoder.encode(&mf, &mut buf)?;
    Ok((encoder.format_type().to_string(), buf))
}

pub fn metrics_route() -> impl Filter<Extract = (warp::http::Response<Vec<u8>>,), Error = warp::Rejection> + Clone {
    warp::path!("metrics").and(warp::get()).map(|| {
        let response = match render() {
            Ok((content_type, body)) => warp::http::Response::builder()
                .header("Content-Type", content_type)
                .body(body),
            Err(e) => {
                tracing::error!("encoding metrics failed: {:?}", e);
                warp::http::Response::builder()
                    .status(warp::http::StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Vec::new())
            }
        };
        response.unwrap_or_else(|_| warp::http::Response::new(Vec::new()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        inc_resolution("srv");
        observe_latency("mc.example.com:25565", 42.0);
        inc_probe_failure("down.example.com:25565", "timeout");
        inc_api_request(200);

        let (content_type, body) = render().unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(content_type.starts_with("text/plain"));
        assert!(text.contains("mcprobe_resolutions_total{via=\"srv\"}"));
        assert!(text.contains("mcprobe_probe_latency_milliseconds_current{target=\"mc.example.com:25565\"} 42"));
        assert!(text.contains("reason=\"timeout\""));
        assert!(text.contains("mcprobe_api_requests_total{status=\"200\"}"));
    }
}
