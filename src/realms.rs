//! Bedrock Realms world join.
//!
//! Realms answers `503 Service Unavailable` with `Retry-After` while a world is still starting;
//! [`BedrockRealmsService::join_world`] keeps asking through [`retry::with_backoff`] until the
//! server hands out an address, a real error occurs, or the invocation is cancelled.

// crates.io
use oauth2::http::{Method, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	http::{self, handler},
	retry,
	step::{StepContext, XblXstsToken},
};

/// Step identity attached to [`BedrockRealmsService::join_world`] failures.
pub const JOIN_WORLD: &str = "realms.joinWorld";

#[derive(Debug, Deserialize)]
struct JoinResponse {
	address: String,
}

/// Realms client bound to an XSTS token for `https://pocket.realms.minecraft.net/`.
#[derive(Clone, Debug)]
pub struct BedrockRealmsService {
	client_version: String,
	xsts: XblXstsToken,
}
impl BedrockRealmsService {
	/// Creates a service sending `client_version` as the `Client-Version` header.
	pub fn new(client_version: impl Into<String>, xsts: XblXstsToken) -> Self {
		Self { client_version: client_version.into(), xsts }
	}

	/// Client version announced to Realms.
	pub fn client_version(&self) -> &str {
		&self.client_version
	}

	/// Joins the world and returns its server address (`host:port`).
	///
	/// Deferrals are waited out for as long as Realms asks; cancel through the context's
	/// [`Cancellation`](crate::cancel::Cancellation) to give up. Failures carry the
	/// [`JOIN_WORLD`] step identity.
	pub async fn join_world(&self, ctx: &StepContext, world_id: i64) -> Result<String> {
		self.request_join(ctx, world_id).await.map_err(|e| e.in_step(JOIN_WORLD))
	}

	async fn request_join(&self, ctx: &StepContext, world_id: i64) -> Result<String> {
		let url = ctx
			.app
			.endpoints
			.bedrock_realms
			.join(&format!("worlds/{world_id}/join"))
			.map_err(|source| crate::error::ValidationError::InvalidUrl {
				name: "bedrock_realms",
				source,
			})?;
		let authorization = self.xsts.authorization_header();
		let (url, authorization) = (&url, authorization.as_str());
		let body = retry::with_backoff(&ctx.cancellation, JOIN_WORLD, move || async move {
			let request = http::json_request::<()>(
				JOIN_WORLD,
				Method::GET,
				url,
				&[
					(AUTHORIZATION.as_str(), authorization),
					("client-version", self.client_version.as_str()),
				],
				None,
			)?;

			handler::realms(ctx.send(request).await?, ctx.now())
		})
		.await?;
		let response: JoinResponse = handler::read_json(JOIN_WORLD, Some(200), &body)?;

		Ok(response.address)
	}
}
