//! Transport primitives for collaborator calls.
//!
//! Every remote call a step makes goes through [`Transport`]. The crate ships
//! [`ReqwestTransport`] (feature `reqwest`); tests and embedders can provide their own
//! implementation to script or record traffic. [`handler`] turns raw responses into bodies,
//! enriched [`ServiceError`](crate::error::ServiceError)s, or retry directives.

pub mod handler;

pub use oauth2::{HttpRequest, HttpResponse};

// crates.io
use oauth2::http::{
	HeaderMap, Method, Request,
	header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER},
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	clock::Timestamp,
	error::{ParseError, TransportError, ValidationError},
};

/// Boxed future returned by [`Transport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send + Sync>>;

/// Abstraction over HTTP stacks capable of executing collaborator requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by
/// concurrent chain invocations behind an `Arc`.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and returns the full response, whatever its status.
	///
	/// Only failures to obtain a response are errors; HTTP error statuses are returned as
	/// responses so the collaborator handlers can classify them.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the collaborator, if available.
	pub status: Option<u16>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Collaborator endpoints answer directly, so a custom client should disable redirect following.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with redirects disabled.
	pub fn new() -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ValidationError::from)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(request.try_into()?).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Builds a JSON request with the standard `Accept`/`Content-Type` headers.
pub(crate) fn json_request<B>(
	step: &str,
	method: Method,
	url: &Url,
	headers: &[(&str, &str)],
	body: Option<&B>,
) -> Result<HttpRequest>
where
	B: ?Sized + Serialize,
{
	let mut builder =
		Request::builder().method(method).uri(url.as_str()).header(ACCEPT, "application/json");

	for (name, value) in headers {
		builder = builder.header(*name, *value);
	}

	let payload = match body {
		Some(body) => {
			builder = builder.header(CONTENT_TYPE, "application/json");

			serde_json::to_vec(body)
				.map_err(|source| ParseError::Encode { step: step.to_owned(), source })?
		},
		None => Vec::new(),
	};

	Ok(builder.body(payload).map_err(ValidationError::from)?)
}

/// Parses a `Retry-After` header given either as delay seconds or as an HTTP date.
///
/// HTTP dates are measured against `now`, normally the invocation's clock.
pub fn parse_retry_after(headers: &HeaderMap, now: Timestamp) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).ok()?));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - now.to_datetime()?;

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
