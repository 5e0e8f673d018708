//! Thin client for the `hasher.HasherService` gRPC API.
//!
//! [`HashClient`] wraps the generated `HasherServiceClient` and takes care of
//! request-ID propagation: every call carries an `x-request-id` metadata entry,
//! either supplied by the caller or freshly generated, and the ID echoed by the
//! server is surfaced in the [`HashReply`].

use crate::common::{
    proto::{HashRequest, hasher_service_client::HasherServiceClient},
    types::{REQUEST_ID_HEADER, RequestId},
};
use core::time::Duration;
use tonic::{
    Request, Status,
    codec::CompressionEncoding,
    metadata::MetadataValue,
    transport::{Channel, Endpoint},
};

/// Result of a successful `CalculateHashes` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashReply {
    /// `hashes[i]` is the digest of the i-th input string.
    pub hashes: Vec<String>,
    /// Request ID echoed by the server, if it sent one back.
    pub request_id: Option<RequestId>,
}

#[derive(Clone, Debug)]
pub struct HashClient {
    inner: HasherServiceClient<Channel>,
}

impl HashClient {
    /// Connects to a server at `dst`, e.g. `"http://127.0.0.1:50051"`.
    pub async fn connect(dst: impl Into<String>) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(dst.into())?.connect().await?;
        Ok(Self::new(channel))
    }

    /// Wraps an already established channel.
    ///
    /// Response size is left unbounded since a large batch yields 64 bytes of
    /// hex per input string.
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: HasherServiceClient::new(channel)
                .max_decoding_message_size(usize::MAX)
                .max_encoding_message_size(usize::MAX),
        }
    }

    /// Compresses requests and accepts compressed responses with `encoding`.
    pub fn with_compression(mut self, encoding: CompressionEncoding) -> Self {
        self.inner = self
            .inner
            .send_compressed(encoding)
            .accept_compressed(encoding);
        self
    }

    /// Hashes `strings` remotely.
    ///
    /// When `request_id` is `None` a random ID is generated. `timeout`, when
    /// set, is sent as the gRPC deadline for the call.
    ///
    /// # Errors
    ///
    /// Returns the server's [`Status`], or `Status::internal` if the response
    /// does not hold exactly one digest per input.
    pub async fn calculate(
        &mut self,
        strings: Vec<String>,
        request_id: Option<RequestId>,
        timeout: Option<Duration>,
    ) -> Result<HashReply, Status> {
        let expected = strings.len();
        let request_id = request_id.unwrap_or_else(RequestId::generate);

        let mut request = Request::new(HashRequest { strings });
        let value = MetadataValue::try_from(request_id.as_str())
            .map_err(|_| Status::invalid_argument("request id is not valid metadata"))?;
        request.metadata_mut().insert(REQUEST_ID_HEADER, value);
        if let Some(timeout) = timeout {
            request.set_timeout(timeout);
        }

        let response = self.inner.calculate_hashes(request).await?;
        let echoed = response
            .metadata()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(RequestId::parse);
        let hashes = response.into_inner().hashes;

        if hashes.len() != expected {
            return Err(Status::internal(format!(
                "expected {expected} hashes, received {}",
                hashes.len()
            )));
        }

        Ok(HashReply {
            hashes,
            request_id: echoed,
        })
    }
}
