//! Request correlation.
//!
//! Every call gets a [`RequestId`]: the client's `x-request-id` metadata when it
//! is usable, otherwise a fresh UUID v4. The ID is stored in the request
//! extensions where the handler picks it up for logging and echoes it back.

use hashpool_tonic_core::types::{REQUEST_ID_HEADER, RequestId};
use tonic::{Request, Status, service::Interceptor};

#[derive(Clone, Copy, Debug, Default)]
pub struct RequestIdInterceptor;

impl Interceptor for RequestIdInterceptor {
    fn call(&mut self, mut req: Request<()>) -> Result<Request<()>, Status> {
        let id = RequestId::parse_or_generate(
            req.metadata()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok()),
        );
        req.extensions_mut().insert(id);
        Ok(req)
    }
}

/// Returns the ID attached by [`RequestIdInterceptor`], or a fresh one if the
/// request bypassed it.
pub fn request_id_of<T>(req: &Request<T>) -> RequestId {
    req.extensions()
        .get::<RequestId>()
        .cloned()
        .unwrap_or_else(RequestId::generate)
}
