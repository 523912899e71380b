//! Microsoft account token endpoint facade over the `oauth2` crate.

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret,
	EndpointNotSet, EndpointSet, HttpRequest, HttpResponse, PkceCodeVerifier, RedirectUrl,
	RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	error::{Collaborator, ParseError, ServiceError, TransportError, ValidationError},
	http::{ResponseMetadata, ResponseMetadataSlot, Transport},
	step::{MsaCode, Secret, StepContext},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Token grant returned by the Microsoft account token endpoint.
#[derive(Debug)]
pub(crate) struct TokenGrant {
	pub(crate) access_token: Secret,
	pub(crate) refresh_token: Option<Secret>,
	pub(crate) expires_in: i64,
}

/// [`AsyncHttpClient`] adapter routing `oauth2` requests through a [`Transport`].
///
/// The handle owns its transport so it satisfies `AsyncHttpClient<'c>` for every `'c`.
struct TransportHandle {
	transport: Arc<dyn Transport>,
	slot: ResponseMetadataSlot,
}
impl TransportHandle {
	fn new(ctx: &StepContext) -> Self {
		Self { transport: ctx.transport.clone(), slot: Default::default() }
	}
}
impl<'c> AsyncHttpClient<'c> for TransportHandle {
	type Error = TransportError;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let response = self.transport.execute(request).await?;

			self.slot.store(ResponseMetadata { status: Some(response.status().as_u16()) });

			Ok(response)
		})
	}
}

/// Exchanges an authorization code (with its PKCE verifier, when present).
pub(crate) async fn exchange_code(
	ctx: &StepContext,
	step: &str,
	code: &MsaCode,
) -> Result<TokenGrant> {
	let client = configured_client(ctx)?;
	let handle = TransportHandle::new(ctx);
	let redirect = code.redirect_uri.as_deref().unwrap_or(&ctx.app.redirect_uri);
	let redirect_url = RedirectUrl::new(redirect.to_owned())
		.map_err(|source| ValidationError::InvalidUrl { name: "redirect_uri", source })?;
	let mut request = client
		.exchange_code(AuthorizationCode::new(code.code.expose().to_owned()))
		.set_redirect_uri(Cow::Owned(redirect_url))
		.add_extra_param("scope", ctx.app.scope.clone());

	if let Some(verifier) = &code.code_verifier {
		request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.expose().to_owned()));
	}

	let response = request
		.request_async(&handle)
		.await
		.map_err(|e| map_request_error(step, handle.slot.take(), e))?;

	map_token_response(step, response)
}

/// Renews an access token with the refresh-token grant.
pub(crate) async fn exchange_refresh_token(
	ctx: &StepContext,
	step: &str,
	refresh_token: &Secret,
) -> Result<TokenGrant> {
	let client = configured_client(ctx)?;
	let handle = TransportHandle::new(ctx);
	let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
	let response = client
		.exchange_refresh_token(&refresh_secret)
		.add_extra_param("scope", ctx.app.scope.clone())
		.request_async(&handle)
		.await
		.map_err(|e| map_request_error(step, handle.slot.take(), e))?;

	map_token_response(step, response)
}

fn configured_client(ctx: &StepContext) -> Result<ConfiguredBasicClient> {
	let endpoints = &ctx.app.endpoints;
	let auth_url = AuthUrl::new(endpoints.msa_authorize.to_string())
		.map_err(|source| ValidationError::InvalidUrl { name: "msa_authorize", source })?;
	let token_url = TokenUrl::new(endpoints.msa_token.to_string())
		.map_err(|source| ValidationError::InvalidUrl { name: "msa_token", source })?;
	let mut client = BasicClient::new(ClientId::new(ctx.app.client_id.clone()))
		.set_auth_uri(auth_url)
		.set_token_uri(token_url)
		.set_auth_type(AuthType::RequestBody);

	if let Some(secret) = &ctx.app.client_secret {
		client = client.set_client_secret(ClientSecret::new(secret.expose().to_owned()));
	}

	Ok(client)
}

fn map_token_response(step: &str, response: BasicTokenResponse) -> Result<TokenGrant> {
	let expires_in = response
		.expires_in()
		.and_then(|lifetime| i64::try_from(lifetime.as_secs()).ok())
		.ok_or_else(|| ParseError::InvalidField { step: step.to_owned(), field: "expires_in" })?;

	Ok(TokenGrant {
		access_token: Secret::new(response.access_token().secret().to_owned()),
		refresh_token: response.refresh_token().map(|token| Secret::new(token.secret().to_owned())),
		expires_in,
	})
}

fn map_request_error(
	step: &str,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<TransportError>,
) -> Error {
	let status = meta.and_then(|meta| meta.status);

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(status, &response).into(),
		RequestTokenError::Request(error) => error.into(),
		RequestTokenError::Parse(source, _body) =>
			ParseError::Response { step: step.to_owned(), status, source }.into(),
		RequestTokenError::Other(message) =>
			ParseError::Unexpected { step: step.to_owned(), message }.into(),
	}
}

fn map_server_response_error(status: Option<u16>, response: &BasicErrorResponse) -> ServiceError {
	let message = match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	};

	ServiceError::new(Collaborator::Msa, status, message)
}
