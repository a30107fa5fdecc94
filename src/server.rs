use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, warn};
use warp::Filter;
use warp::http::{Method, StatusCode};

use crate::catalog::Catalog;
use crate::metrics;
use crate::prober::StatusProbe;
use crate::report::StatusReport;
use crate::resolver::{Resolver, SrvLookup};

pub struct AppState<L, P> {
    pub resolver: Resolver<L>,
    pub probe: P,
    pub catalog: Catalog,
}

/// Handles `/api?<address>`: the whole raw query string is the address.
pub async fn handle_api<L: SrvLookup, P: StatusProbe>(
    state: &AppState<L, P>,
    method: &Method,
    raw_query: Option<&str>,
) -> (StatusCode, Value) {
    let (status, body) = api_response(state, method, raw_query).await;
    metrics::inc_api_request(status.as_u16());
    (status, body)
}

async fn api_response<L: SrvLookup, P: StatusProbe>(
    state: &AppState<L, P>,
    method: &Method,
    raw_query: Option<&str>,
) -> (StatusCode, Value) {
    if *method != Method::GET {
        return (StatusCode::METHOD_NOT_ALLOWED, json!({"error": "Method not allowed"}));
    }

    let Some(query) = raw_query.filter(|q| !q.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, json!({"error": "Missing server address"}));
    };
    // Form decoding: `+` is a space, `%2B` a literal plus.
    let address = match urlencoding::decode(&query.replace('+', " ")) {
        Ok(address) => address.into_owned(),
        Err(_) => return (StatusCode::BAD_REQUEST, json!({"error": "Invalid URL encoding"})),
    };

    let resolved = match state.resolver.resolve_detailed(&address).await {
        Ok(resolved) => resolved,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, json!({"error": state.catalog.describe(&e)}));
        }
    };
    metrics::inc_resolution(resolved.via.label());
    info!("api query {:?} resolved to {} via {}", address, resolved.target, resolved.via);

    let target = resolved.target;
    let label = target.to_string();
    match state.probe.probe(&target).await {
        Ok(status) => {
            metrics::observe_latency(&label, status.ping_ms as f64);
            (StatusCode::OK, json!(StatusReport::online(&target, &status)))
        }
        Err(e) => {
            warn!("status probe {} failed: {}", label, e);
            metrics::inc_probe_failure(&label, e.reason());
            (StatusCode::INTERNAL_SERVER_ERROR, json!(StatusReport::failed(&target, &e)))
        }
    }
}

pub async fn serve<L, P>(addr: SocketAddr, state: Arc<AppState<L, P>>, expose_metrics: bool)
where
    L: SrvLookup + Send + Sync + 'static,
    P: StatusProbe + Send + Sync + 'static,
{
    let raw_query = warp::query::raw()
        .map(Some)
        .or(warp::any().map(|| None::<String>))
        .unify();
    let with_state = warp::any().map(move || state.clone());

    let api = warp::path!("api")
        .and(warp::method())
        .and(raw_query)
        .and(with_state)
        .then(|method: Method, query: Option<String>, state: Arc<AppState<L, P>>| async move {
            let (status, body) = handle_api(&state, &method, query.as_deref()).await;
            warp::reply::with_status(warp::reply::json(&body), status)
        });

    if expose_metrics {
        warp::serve(api.or(metrics::metrics_route())).run(addr).await;
    } else {
        warp::serve(api).run(addr).await;
    }
}
