//! Root step that prepares an interactive login in the user's browser.

// crates.io
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	codec,
	error::{TransportError, ValidationError},
	obs,
	step::{
		Artifact, Document, Expiry, InitialInput, Secret, Step, StepContext, StepFuture, StepInput,
		decode_document, encode_document,
	},
};

/// Name of [`ExternalBrowserStep`].
pub const EXTERNAL_BROWSER: &str = "externalBrowser";

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Interactive login session handed to the caller's [`BrowserCallback`](crate::step::BrowserCallback).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalBrowser {
	/// URL the user must open to sign in.
	pub authentication_url: String,
	/// Redirect URI, including the local port, the code is delivered to.
	pub redirect_uri: String,
	/// Local port reserved for the redirect listener.
	pub port: u16,
	/// Opaque state value that must round-trip via the redirect.
	pub state: String,
	/// PKCE verifier matching the challenge embedded in the authentication URL.
	pub code_verifier: Secret,
}
impl ExternalBrowser {
	/// Login sessions carry no expiry of their own.
	pub fn expiry(&self) -> Expiry {
		Expiry::Never
	}
}
impl Debug for ExternalBrowser {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExternalBrowser")
			.field("authentication_url", &self.authentication_url)
			.field("redirect_uri", &self.redirect_uri)
			.field("port", &self.port)
			.field("state", &self.state)
			.finish_non_exhaustive()
	}
}

/// Root step that reserves a loopback port and builds the authorize URL.
///
/// The context's redirect URI must be an `http` loopback address without a trailing slash; the
/// reserved port is appended to it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExternalBrowserStep;
impl Step for ExternalBrowserStep {
	fn name(&self) -> &str {
		EXTERNAL_BROWSER
	}

	fn apply<'a>(&'a self, ctx: &'a StepContext, input: StepInput<'a>) -> StepFuture<'a, Artifact> {
		Box::pin(async move {
			let StepInput::Initial(InitialInput::ExternalBrowser(callback)) = input else {
				return Err(ValidationError::UnexpectedInitialInput {
					step: self.name().to_owned(),
					expected: "a browser callback",
				}
				.into());
			};

			validate_redirect(&ctx.app.redirect_uri)?;

			let port = reserve_local_port().await?;
			let redirect_uri = format!("{}:{port}", ctx.app.redirect_uri);
			let state = codec::random_token(STATE_LEN);
			let code_verifier = codec::random_token(PKCE_VERIFIER_LEN);
			let mut url = ctx.app.endpoints.msa_authorize.clone();

			url.query_pairs_mut()
				.append_pair("client_id", &ctx.app.client_id)
				.append_pair("redirect_uri", &redirect_uri)
				.append_pair("response_type", "code")
				.append_pair("prompt", "select_account")
				.append_pair("scope", &ctx.app.scope)
				.append_pair("state", &state)
				.append_pair("code_challenge", &codec::pkce_challenge(&code_verifier))
				.append_pair("code_challenge_method", "S256");

			let session = ExternalBrowser {
				authentication_url: url.into(),
				redirect_uri,
				port,
				state,
				code_verifier: Secret::new(code_verifier),
			};

			obs::info(self.name(), format_args!("Waiting for sign-in on port {port}"));
			callback.notify(&session);

			Ok(session.into())
		})
	}

	fn to_document(&self, artifact: &Artifact) -> Result<Document> {
		encode_document::<ExternalBrowser>(self.name(), artifact)
	}

	fn parse_document(&self, document: &Document) -> Result<Artifact> {
		decode_document::<ExternalBrowser>(self.name(), document)
	}
}

fn validate_redirect(redirect_uri: &str) -> Result<()> {
	let invalid = |reason| ValidationError::InvalidRedirect { uri: redirect_uri.to_owned(), reason };

	if redirect_uri.ends_with('/') {
		return Err(invalid("it must not end with `/`").into());
	}

	let url = Url::parse(redirect_uri)
		.map_err(|source| ValidationError::InvalidUrl { name: "redirect_uri", source })?;

	if url.scheme() != "http"
		|| !matches!(url.host_str(), Some("localhost" | "127.0.0.1"))
		|| url.port().is_some()
	{
		return Err(invalid("it must be an http loopback address without a port").into());
	}

	Ok(())
}

async fn reserve_local_port() -> Result<u16> {
	let listener = TcpListener::bind(("127.0.0.1", 0)).await.map_err(TransportError::from)?;
	let port = listener.local_addr().map_err(TransportError::from)?.port();

	Ok(port)
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;
	use crate::{
		context::ApplicationContext,
		step::{BrowserCallback, tests_support},
	};

	#[test]
	fn trailing_slash_redirects_are_rejected() {
		let err = validate_redirect("http://localhost/").expect_err("Trailing slash should fail.");

		assert!(matches!(err, Error::Validation(ValidationError::InvalidRedirect { .. })));
		assert!(validate_redirect("https://login.live.com/oauth20_desktop.srf").is_err());
		assert!(validate_redirect("http://localhost").is_ok());
	}

	#[tokio::test]
	async fn callback_receives_the_authentication_url() {
		let app = ApplicationContext::builder()
			.redirect_uri("http://localhost")
			.endpoints(tests_support::app().endpoints)
			.build()
			.expect("Loopback redirect should validate.");
		let ctx = StepContext::new(app, Arc::new(tests_support::ScriptedTransport::default()));
		let seen = Arc::new(Mutex::new(None));
		let sink = seen.clone();
		let callback = BrowserCallback::new(move |session: &ExternalBrowser| {
			*sink.lock() = Some(session.authentication_url.clone());
		});
		let artifact = ExternalBrowserStep
			.apply(&ctx, StepInput::Initial(InitialInput::ExternalBrowser(callback)))
			.await
			.expect("Session should be prepared.");
		let session = artifact.payload::<ExternalBrowser>().expect("Artifact should be a session.");
		let url = Url::parse(seen.lock().as_deref().expect("Callback should have been invoked."))
			.expect("Authentication URL should parse.");
		let query = url.query_pairs().into_owned().collect::<HashMap<_, _>>();

		assert_eq!(url.path(), "/oauth20_authorize.srf");
		assert_eq!(query["redirect_uri"], format!("http://localhost:{}", session.port));
		assert_eq!(query["state"], session.state);
		assert_eq!(query["code_challenge"], codec::pkce_challenge(session.code_verifier.expose()));
		assert_eq!(query["prompt"], "select_account");
	}
}
