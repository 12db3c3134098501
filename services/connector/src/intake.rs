//! HTTP intake
//!
//! Sensors deliver events as `POST /` with a JSON body. The endpoint is
//! deliberately strict about the envelope and tolerant about the payload:
//! a well-formed JSON body is always accepted with 200 whether or not any
//! mapping matches, while the wrong content type (415), an undecodable
//! body (400), a wrong method (405) or a wrong path (404) are rejected
//! before the pipeline is involved.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};

use crate::pipeline::EventPipeline;

/// Serve the intake endpoint until the server is shut down.
pub async fn serve(addr: SocketAddr, pipeline: Arc<EventPipeline>) -> hyper::Result<()> {
    let make_svc = make_service_fn(move |_conn| {
        let pipeline = Arc::clone(&pipeline);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let pipeline = Arc::clone(&pipeline);
                async move { Ok::<_, Infallible>(handle_request(req, pipeline).await) }
            }))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_svc);
    info!(%addr, "http intake listening");
    server.await
}

/// Route one request. Public for tests; `serve` is a thin wrapper.
pub async fn handle_request(
    req: Request<Body>,
    pipeline: Arc<EventPipeline>,
) -> Response<Body> {
    match (req.method(), req.uri().path()) {
        (&Method::POST, "/") => handle_event_post(req, pipeline).await,
        (&Method::POST, path) => {
            debug!(path, "request to unknown path");
            plain_response(StatusCode::NOT_FOUND, "Not Found")
        }
        (method, _) => {
            debug!(%method, "request with unsupported method");
            plain_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
        }
    }
}

async fn handle_event_post(req: Request<Body>, pipeline: Arc<EventPipeline>) -> Response<Body> {
    let is_json = req
        .headers()
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("application/json"))
        .unwrap_or(false);
    if !is_json {
        return plain_response(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported Media Type");
    }

    let body = match hyper::body::to_bytes(req.into_body()).await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            return plain_response(StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "request body is not valid json");
            return plain_response(StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    debug!(bytes = body.len(), "received sensor event");
    pipeline.handle_event(event).await;
    plain_response(StatusCode::OK, "OK")
}

fn plain_response(status: StatusCode, body: &'static str) -> Response<Body> {
    // Static bodies only; construction cannot fail.
    Response::builder()
        .status(status)
        .body(Body::from(body))
        .unwrap()
}
