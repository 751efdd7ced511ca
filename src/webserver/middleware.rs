/// Webserver middleware
///
/// Request timing for instrumented routers: every completed request is
/// emitted to the monitor as an HTTP sample.
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::sync::Arc;
use std::time::Instant;

use crate::agent::Monitor;
use crate::dashboard::{HttpSample, SampleEvent};

/// Time one request and emit it as an [`HttpSample`]
pub async fn track_http(
    State(monitor): State<Arc<Monitor>>,
    request: Request,
    next: Next,
) -> Response {
    let time = chrono::Utc::now().timestamp_millis();
    let started = Instant::now();
    let method = request.method().to_string();
    let url = request.uri().path().to_string();

    let response = next.run(request).await;

    monitor.emit(SampleEvent::Http(HttpSample {
        time,
        url,
        duration: started.elapsed().as_secs_f64() * 1000.0,
        method,
        status_code: response.status().as_u16(),
    }));

    response
}

/// Layer [`track_http`] onto every route of `router`
pub fn instrument<S>(router: Router<S>, monitor: Arc<Monitor>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(monitor, track_http))
}
