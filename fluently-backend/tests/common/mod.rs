pub mod test_backend;

use fluently_core::{CachedResponse, Response, StatusCode};

pub fn snapshot(hash: &str, body: &'static str) -> CachedResponse {
    let response = Response::new(StatusCode::OK)
        .with_header("Content-Type", "application/json")
        .with_body(body);
    CachedResponse::capture(hash, &response)
}
