//! Chain-level error types shared across steps, the runner, and the document codec.

mod remediation;

pub use remediation::*;

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration or input problem; never retried.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// A response or persisted document could not be interpreted.
	#[error(transparent)]
	Parse(#[from] ParseError),
	/// A remote collaborator answered with a well-formed error.
	#[error(transparent)]
	Service(#[from] ServiceError),
	/// Transport failure (DNS, TCP, TLS, local socket).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// An interactive wait or a backoff sleep was cancelled.
	#[error("Step `{step}` was cancelled.")]
	Cancelled {
		/// Step or operation that was waiting.
		step: String,
	},
	/// The artifact of `step` expired and has no renewal credential.
	#[error("Step `{step}` has no renewal path; restart the chain from this step.")]
	RestartRequired {
		/// Step the caller must restart from.
		step: String,
	},
	/// Step identity attached by the chain runner.
	#[error("Step `{step}` failed: {source}")]
	Step {
		/// Name of the failing step.
		step: String,
		/// Underlying failure.
		#[source]
		source: Box<Error>,
	},
}
impl Error {
	/// Attaches the failing step's name unless the error already carries it.
	pub fn in_step(self, step: &str) -> Self {
		if matches!(&self, Self::Step { step: current, .. } if current == step) {
			return self;
		}

		Self::Step { step: step.to_owned(), source: Box::new(self) }
	}

	/// Returns the innermost step name recorded on this error.
	pub fn step(&self) -> Option<&str> {
		match self {
			Self::Step { step, source } => source.step().or(Some(step)),
			Self::Cancelled { step } | Self::RestartRequired { step } => Some(step),
			Self::Parse(parse) => parse.step(),
			_ => None,
		}
	}

	/// Strips runner context and returns the underlying failure.
	pub fn root(&self) -> &Error {
		match self {
			Self::Step { source, .. } => source.root(),
			other => other,
		}
	}

	/// Returns the enriched service error, if that is the underlying failure.
	pub fn service(&self) -> Option<&ServiceError> {
		match self.root() {
			Self::Service(service) => Some(service),
			_ => None,
		}
	}
}

/// Configuration and input validation failures.
#[derive(Debug, ThisError)]
pub enum ValidationError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// An endpoint or redirect URL cannot be parsed.
	#[error("The `{name}` URL is invalid.")]
	InvalidUrl {
		/// Configuration field name.
		name: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Redirect URI is unusable for interactive login.
	#[error("Redirect URI `{uri}` is invalid: {reason}.")]
	InvalidRedirect {
		/// Offending redirect URI.
		uri: String,
		/// Human-readable reason.
		reason: &'static str,
	},
	/// Client identifier is empty.
	#[error("Client id must not be empty.")]
	MissingClientId,

	/// A chain must contain at least one step.
	#[error("A chain must contain at least one step.")]
	EmptyChain,
	/// Step names must be non-empty.
	#[error("Step names must not be empty.")]
	EmptyStepName,
	/// Step names must be unique inside a chain.
	#[error("Step name `{name}` appears more than once in the chain.")]
	DuplicateStepName {
		/// Duplicated name.
		name: String,
	},
	/// A result chain does not match the step chain it is used with.
	#[error("Result chain depth {actual} does not match step chain depth {expected}.")]
	DepthMismatch {
		/// Step chain depth.
		expected: usize,
		/// Result chain depth.
		actual: usize,
	},
	/// A root step received a previous artifact, or the initial input is of the wrong kind.
	#[error("Step `{step}` requires {expected} as its initial input.")]
	UnexpectedInitialInput {
		/// Step name.
		step: String,
		/// Expected input description.
		expected: &'static str,
	},
	/// A non-root step received initial input, or an artifact of the wrong kind.
	#[error("Step `{step}` requires a `{expected}` artifact as its input.")]
	UnexpectedArtifact {
		/// Step name.
		step: String,
		/// Expected artifact kind.
		expected: &'static str,
	},
}
impl ValidationError {
	/// Wraps a transport's builder failure inside [`ValidationError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ValidationError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures interpreting a remote response or a persisted document.
#[derive(Debug, ThisError)]
pub enum ParseError {
	/// A collaborator response body did not match the expected shape.
	#[error("Step `{step}` received a malformed response.")]
	Response {
		/// Step or operation that issued the request.
		step: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A persisted document did not match the step's artifact shape.
	#[error("Step `{step}` cannot decode its persisted document.")]
	Document {
		/// Step whose document is malformed.
		step: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The nested document of an ancestor step is missing or not an object.
	#[error("Step `{step}` document lacks the nested `{key}` object.")]
	MissingAncestor {
		/// Step whose document lacks the nested object.
		step: String,
		/// Expected key (the previous step's name).
		key: String,
	},
	/// An artifact could not be encoded as a JSON object.
	#[error("Step `{step}` cannot encode its artifact.")]
	Encode {
		/// Step that failed to encode.
		step: String,
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// A required field is absent or out of range.
	#[error("Step `{step}` received an invalid `{field}` value.")]
	InvalidField {
		/// Step that received the value.
		step: String,
		/// Offending field.
		field: &'static str,
	},
	/// Binary payload was not valid base64.
	#[error("Step `{step}` received undecodable `{field}` bytes.")]
	Base64 {
		/// Step that received the value.
		step: String,
		/// Offending field.
		field: &'static str,
		/// Underlying decode failure.
		#[source]
		source: base64::DecodeError,
	},
	/// Timestamp text was not RFC 3339.
	#[error("Step `{step}` received an unparsable `{field}` timestamp.")]
	Timestamp {
		/// Step that received the value.
		step: String,
		/// Offending field.
		field: &'static str,
		/// Underlying parse failure.
		#[source]
		source: time::error::Parse,
	},
	/// The token endpoint produced a response the OAuth client could not classify.
	#[error("Step `{step}` received an unexpected response: {message}.")]
	Unexpected {
		/// Step that issued the request.
		step: String,
		/// Description from the OAuth client.
		message: String,
	},
}
impl ParseError {
	/// Returns the step that produced the parse failure.
	pub fn step(&self) -> Option<&str> {
		match self {
			Self::Response { step, .. }
			| Self::Document { step, .. }
			| Self::MissingAncestor { step, .. }
			| Self::Encode { step, .. }
			| Self::InvalidField { step, .. }
			| Self::Base64 { step, .. }
			| Self::Timestamp { step, .. }
			| Self::Unexpected { step, .. } => Some(step),
		}
	}
}

/// Well-formed error returned by a remote collaborator, enriched with remediation text.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{}", self.render())]
pub struct ServiceError {
	/// Collaborator that returned the error.
	pub collaborator: Collaborator,
	/// HTTP status code, when available.
	pub status: Option<u16>,
	/// Collaborator-specific numeric error code.
	pub code: Option<i64>,
	/// Collaborator-supplied reason.
	pub message: String,
	/// Remediation text for known codes.
	pub remediation: Option<&'static str>,
}
impl ServiceError {
	/// Creates an error without a domain code.
	pub fn new(collaborator: Collaborator, status: Option<u16>, message: impl Into<String>) -> Self {
		Self { collaborator, status, code: None, message: message.into(), remediation: None }
	}

	/// Attaches a domain code and looks up its remediation in the collaborator's own table.
	pub fn with_code(mut self, code: i64) -> Self {
		self.code = Some(code);
		self.remediation = remediation(self.collaborator, code);

		self
	}

	fn render(&self) -> String {
		let mut rendered = format!("{} request failed", self.collaborator);

		if let Some(status) = self.status {
			rendered.push_str(&format!(" with HTTP {status}"));
		}

		match (self.remediation, self.message.is_empty()) {
			(Some(remediation), true) => rendered.push_str(&format!(": {remediation}")),
			(Some(remediation), false) => rendered
				.push_str(&format!(": {remediation} (service said: {})", self.message)),
			(None, false) => rendered.push_str(&format!(": {}", self.message)),
			(None, true) => {},
		}
		if let Some(code) = self.code {
			rendered.push_str(&format!(", {} error code: {code}", self.collaborator.code_label()));
		}

		rendered
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling a remote collaborator.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure (HTTP transport or local redirect listener).
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
