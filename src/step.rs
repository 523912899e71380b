//! Step contract, the artifacts steps produce, and the per-invocation step context.
//!
//! A [`Step`] is a stateless, reusable transformation from the previous step's [`Artifact`] (or
//! the caller's [`InitialInput`] for the root) to a new artifact. Artifacts are immutable and
//! carry their own [`Expiry`]; steps decide how an expired artifact is renewed.

pub mod external_browser;
pub mod local_web_server;
pub mod mc_token;
pub mod msa_code;
pub mod msa_token;
pub mod player_certificates;
pub mod xbl_user_token;
pub mod xbl_xsts_token;

mod secret;

pub use external_browser::*;
pub use local_web_server::*;
pub use mc_token::*;
pub use msa_code::*;
pub use msa_token::*;
pub use player_certificates::*;
pub use secret::*;
pub use xbl_user_token::*;
pub use xbl_xsts_token::*;

// self
use crate::{
	_prelude::*,
	cancel::Cancellation,
	clock::{Clock, SystemClock, Timestamp},
	context::ApplicationContext,
	error::{ParseError, ValidationError},
	http::{HttpRequest, HttpResponse, Transport},
};

/// Persisted form of one step's artifact (plus its nested ancestors).
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Boxed future returned by [`Step`] operations.
pub type StepFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

macro_rules! def_artifacts {
	($($(#[$meta:meta])* $variant:ident => $kind:literal,)+) => {
		/// Immutable value produced by a step.
		#[derive(Clone, Debug, PartialEq, Eq)]
		pub enum Artifact {
			$($(#[$meta])* $variant($variant),)+
		}
		impl Artifact {
			/// Stable label of the artifact kind.
			pub const fn kind(&self) -> &'static str {
				match self {
					$(Self::$variant(_) => $kind,)+
				}
			}

			/// Returns when the artifact stops being usable.
			pub fn expiry(&self) -> Expiry {
				match self {
					$(Self::$variant(payload) => payload.expiry(),)+
				}
			}
		}
		$(
			impl From<$variant> for Artifact {
				fn from(payload: $variant) -> Self {
					Self::$variant(payload)
				}
			}
			impl ArtifactPayload for $variant {
				const KIND: &'static str = $kind;

				fn from_artifact(artifact: &Artifact) -> Option<&Self> {
					match artifact {
						Artifact::$variant(payload) => Some(payload),
						_ => None,
					}
				}
			}
		)+
	};
}
def_artifacts! {
	/// Authorization code obtained from the user or the local redirect.
	MsaCode => "msaCode",
	/// Interactive login session handed to the caller's browser callback.
	ExternalBrowser => "externalBrowser",
	/// Microsoft account access token.
	MsaToken => "msaToken",
	/// Xbox Live user token.
	XblUserToken => "xblUserToken",
	/// Xbox Live XSTS token for one relying party.
	XblXstsToken => "xblXstsToken",
	/// Minecraft services access token.
	McToken => "mcToken",
	/// Chat-signing key pair issued by Minecraft services.
	PlayerCertificates => "playerCertificates",
}
impl Artifact {
	/// Returns `true` when the artifact is no longer usable at `now`.
	pub fn is_expired_at(&self, now: Timestamp) -> bool {
		self.expiry().is_expired_at(now)
	}

	/// Returns the typed payload when the artifact is of kind `P`.
	pub fn payload<P>(&self) -> Option<&P>
	where
		P: ArtifactPayload,
	{
		P::from_artifact(self)
	}
}

/// Typed payload carried by an [`Artifact`] variant.
pub trait ArtifactPayload
where
	Self: Sized + Serialize + DeserializeOwned + Into<Artifact>,
{
	/// Stable label of the artifact kind.
	const KIND: &'static str;

	/// Borrows the payload out of `artifact` when the kinds match.
	fn from_artifact(artifact: &Artifact) -> Option<&Self>;
}

/// Validity window of an artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
	/// The artifact never expires on its own.
	Never,
	/// The artifact expires at the given instant.
	At(Timestamp),
}
impl Expiry {
	/// Returns `true` when the artifact is no longer usable at `now`.
	pub fn is_expired_at(self, now: Timestamp) -> bool {
		match self {
			Expiry::Never => false,
			Expiry::At(expires_at) => expires_at <= now,
		}
	}
}

/// External input consumed by a chain's root step.
#[derive(Clone, Debug)]
pub enum InitialInput {
	/// Authorization code the user obtained out of band.
	AuthorizationCode(AuthorizationCodeInput),
	/// Callback that presents the interactive login URL to the user.
	ExternalBrowser(BrowserCallback),
}

/// Authorization code supplied by the caller.
#[derive(Clone)]
pub struct AuthorizationCodeInput {
	/// Authorization code.
	pub code: String,
	/// Redirect URI the code was issued for; the context's redirect URI when `None`.
	pub redirect_uri: Option<String>,
	/// PKCE verifier matching the challenge of the authorize request, if one was sent.
	pub code_verifier: Option<String>,
}
impl AuthorizationCodeInput {
	/// Wraps a bare authorization code.
	pub fn new(code: impl Into<String>) -> Self {
		Self { code: code.into(), redirect_uri: None, code_verifier: None }
	}
}
impl Debug for AuthorizationCodeInput {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCodeInput")
			.field("code", &"<redacted>")
			.field("redirect_uri", &self.redirect_uri)
			.field("code_verifier", &self.code_verifier.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Caller hook receiving the interactive login session.
#[derive(Clone)]
pub struct BrowserCallback(Arc<dyn Fn(&ExternalBrowser) + Send + Sync>);
impl BrowserCallback {
	/// Wraps a closure, typically one that opens or prints the authentication URL.
	pub fn new<F>(callback: F) -> Self
	where
		F: 'static + Fn(&ExternalBrowser) + Send + Sync,
	{
		Self(Arc::new(callback))
	}

	/// Invokes the callback.
	pub fn notify(&self, session: &ExternalBrowser) {
		(self.0)(session)
	}
}
impl Debug for BrowserCallback {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("BrowserCallback(..)")
	}
}

/// Input handed to [`Step::apply`].
#[derive(Debug)]
pub enum StepInput<'a> {
	/// External input; only valid for a chain's root step.
	Initial(InitialInput),
	/// The previous step's artifact; only valid for non-root steps.
	Previous(&'a Artifact),
}

/// Capabilities and configuration available to every step of one invocation.
#[derive(Clone)]
pub struct StepContext {
	/// Client identity and endpoints.
	pub app: Arc<ApplicationContext>,
	/// Remote call capability.
	pub transport: Arc<dyn Transport>,
	/// Source of "now".
	pub clock: Arc<dyn Clock>,
	/// Cancellation handle for interactive waits and backoff sleeps.
	pub cancellation: Cancellation,
}
impl StepContext {
	/// Creates a context using the system clock and a fresh cancellation handle.
	pub fn new(app: impl Into<Arc<ApplicationContext>>, transport: Arc<dyn Transport>) -> Self {
		Self {
			app: app.into(),
			transport,
			clock: Arc::new(SystemClock),
			cancellation: Cancellation::new(),
		}
	}

	/// Creates a context backed by [`ReqwestTransport`](crate::http::ReqwestTransport).
	#[cfg(feature = "reqwest")]
	pub fn with_reqwest(app: impl Into<Arc<ApplicationContext>>) -> Result<Self> {
		Ok(Self::new(app, Arc::new(crate::http::ReqwestTransport::new()?)))
	}

	/// Replaces the clock.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Replaces the cancellation handle.
	pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
		self.cancellation = cancellation;

		self
	}

	/// Returns the current instant.
	pub fn now(&self) -> Timestamp {
		self.clock.now()
	}

	pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
		Ok(self.transport.execute(request).await?)
	}
}
impl Debug for StepContext {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StepContext")
			.field("app", &self.app)
			.field("clock", &self.clock)
			.field("cancellation", &self.cancellation)
			.finish_non_exhaustive()
	}
}

/// Named node of a chain.
///
/// Steps are stateless: everything they produce lives in the returned [`Artifact`], and
/// everything they need arrives through the [`StepContext`] and the [`StepInput`].
pub trait Step
where
	Self: 'static + Send + Sync,
{
	/// Name used for error context and as the nesting key in persisted documents.
	fn name(&self) -> &str;

	/// Derives a new artifact from the root input or the previous artifact.
	fn apply<'a>(&'a self, ctx: &'a StepContext, input: StepInput<'a>)
	-> StepFuture<'a, Artifact>;

	/// Renews `current` on top of its (valid) `ancestor`.
	///
	/// Returns `current` unchanged when it has not expired. Otherwise re-applies the step to the
	/// ancestor artifact; a root step (no ancestor) cannot renew and fails with
	/// [`Error::RestartRequired`]. Steps whose renewal credential lives in their own artifact
	/// override this.
	fn refresh<'a>(
		&'a self,
		ctx: &'a StepContext,
		current: &'a Artifact,
		ancestor: Option<&'a Artifact>,
	) -> StepFuture<'a, Artifact> {
		Box::pin(async move {
			if !current.is_expired_at(ctx.now()) {
				return Ok(current.clone());
			}

			match ancestor {
				Some(previous) => self.apply(ctx, StepInput::Previous(previous)).await,
				None => Err(Error::RestartRequired { step: self.name().to_owned() }),
			}
		})
	}

	/// Encodes this step's artifact (without ancestors).
	fn to_document(&self, artifact: &Artifact) -> Result<Document>;

	/// Decodes this step's artifact (ignoring nested ancestors).
	fn parse_document(&self, document: &Document) -> Result<Artifact>;
}

/// Borrows the previous artifact as payload `P`, rejecting initial input and other kinds.
pub(crate) fn previous<'a, P>(step: &str, input: StepInput<'a>) -> Result<&'a P>
where
	P: ArtifactPayload,
{
	match input {
		StepInput::Previous(artifact) => P::from_artifact(artifact),
		StepInput::Initial(_) => None,
	}
	.ok_or_else(|| {
		ValidationError::UnexpectedArtifact { step: step.to_owned(), expected: P::KIND }.into()
	})
}

/// Serializes payload `P` out of `artifact`.
pub(crate) fn encode_document<P>(step: &str, artifact: &Artifact) -> Result<Document>
where
	P: ArtifactPayload,
{
	let payload = P::from_artifact(artifact).ok_or_else(|| ValidationError::UnexpectedArtifact {
		step: step.to_owned(),
		expected: P::KIND,
	})?;

	match serde_json::to_value(payload)
		.map_err(|source| ParseError::Encode { step: step.to_owned(), source })?
	{
		serde_json::Value::Object(document) => Ok(document),
		_ => Err(ParseError::InvalidField { step: step.to_owned(), field: "document" }.into()),
	}
}

/// Deserializes payload `P` from `document`, reporting the failing path.
pub(crate) fn decode_document<P>(step: &str, document: &Document) -> Result<Artifact>
where
	P: ArtifactPayload,
{
	let value = serde_json::Value::Object(document.clone());
	let payload: P = serde_path_to_error::deserialize(value)
		.map_err(|source| ParseError::Document { step: step.to_owned(), source })?;

	Ok(payload.into())
}

/// Expiry `expires_in` seconds after `now`, rejecting non-positive lifetimes.
pub(crate) fn expire_after(step: &str, now: Timestamp, expires_in: i64) -> Result<Timestamp> {
	if expires_in <= 0 {
		return Err(
			ParseError::InvalidField { step: step.to_owned(), field: "expires_in" }.into()
		);
	}

	Ok(now.saturating_add(Duration::seconds(expires_in)))
}


#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn expiry_boundary_counts_as_expired() {
		let at = Timestamp::from_epoch_millis(10_000);

		assert!(!Expiry::At(at).is_expired_at(Timestamp::from_epoch_millis(9_999)));
		assert!(Expiry::At(at).is_expired_at(at));
		assert!(!Expiry::Never.is_expired_at(Timestamp::from_epoch_millis(i64::MAX)));
	}

	#[test]
	fn previous_rejects_wrong_kind() {
		let code = Artifact::from(MsaCode::new("code"));
		let err = previous::<MsaToken>("xblUserToken", StepInput::Previous(&code))
			.expect_err("An authorization code is not an MSA token.");

		assert!(matches!(
			err,
			Error::Validation(ValidationError::UnexpectedArtifact { expected: "msaToken", .. })
		));
	}

	#[test]
	fn malformed_document_names_step_and_path() {
		let mut document = Document::new();

		document.insert("expireTimeMs".into(), serde_json::json!("soon"));
		document.insert("accessToken".into(), serde_json::json!("token"));
		document.insert("refreshToken".into(), serde_json::Value::Null);

		match decode_document::<MsaToken>("msaToken", &document) {
			Err(Error::Parse(ParseError::Document { step, source })) => {
				assert_eq!(step, "msaToken");
				assert_eq!(source.path().to_string(), "expireTimeMs");
			},
			other => panic!("Expected a document error, got {other:?}."),
		}
	}

	#[test]
	fn non_positive_lifetimes_are_rejected() {
		assert!(expire_after("mcToken", Timestamp::EPOCH, 0).is_err());
		assert_eq!(
			expire_after("mcToken", Timestamp::EPOCH, 2).expect("Positive lifetime should pass."),
			Timestamp::from_epoch_millis(2_000)
		);
	}
}
