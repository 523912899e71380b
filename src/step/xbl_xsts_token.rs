//! Xbox Live XSTS authorization step.

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	clock::Timestamp,
	http::{self, handler},
	step::{
		Artifact, Document, Expiry, Secret, Step, StepContext, StepFuture, StepInput, XblUserToken,
		decode_document, encode_document, previous, xbl_user_token::{XBL_CONTRACT_VERSION, XboxTokenResponse},
	},
};

/// Name of [`XblXstsTokenStep`].
pub const XBL_XSTS_TOKEN: &str = "xblXstsToken";
/// Relying party of Minecraft services (Java edition login).
pub const MINECRAFT_SERVICES_RELYING_PARTY: &str = "rp://api.minecraftservices.com/";
/// Relying party of Bedrock Realms.
pub const BEDROCK_REALMS_RELYING_PARTY: &str = "https://pocket.realms.minecraft.net/";

/// XSTS token authorizing one relying party.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XblXstsToken {
	/// Expiry instant (`NotAfter`).
	pub expire_time_ms: Timestamp,
	/// XSTS token.
	pub token: Secret,
	/// User hash (`uhs`) claim.
	pub user_hash: String,
	/// Relying party the token was issued for.
	pub relying_party: String,
}
impl XblXstsToken {
	/// Expires at [`expire_time_ms`](Self::expire_time_ms).
	pub fn expiry(&self) -> Expiry {
		Expiry::At(self.expire_time_ms)
	}

	/// `XBL3.0` authorization value: `XBL3.0 x={uhs};{token}`.
	pub fn authorization_header(&self) -> String {
		format!("XBL3.0 x={};{}", self.user_hash, self.token.expose())
	}
}

/// Authorizes the Xbox Live user token for a relying party.
#[derive(Clone, Debug)]
pub struct XblXstsTokenStep {
	relying_party: String,
}
impl XblXstsTokenStep {
	/// Creates a step authorizing `relying_party`.
	pub fn new(relying_party: impl Into<String>) -> Self {
		Self { relying_party: relying_party.into() }
	}

	/// Step authorizing Minecraft services.
	pub fn minecraft_services() -> Self {
		Self::new(MINECRAFT_SERVICES_RELYING_PARTY)
	}

	/// Step authorizing Bedrock Realms.
	pub fn bedrock_realms() -> Self {
		Self::new(BEDROCK_REALMS_RELYING_PARTY)
	}

	/// Relying party this step authorizes.
	pub fn relying_party(&self) -> &str {
		&self.relying_party
	}
}
impl Step for XblXstsTokenStep {
	fn name(&self) -> &str {
		XBL_XSTS_TOKEN
	}

	fn apply<'a>(&'a self, ctx: &'a StepContext, input: StepInput<'a>) -> StepFuture<'a, Artifact> {
		Box::pin(async move {
			let user = previous::<XblUserToken>(self.name(), input)?;
			let body = serde_json::json!({
				"Properties": {
					"SandboxId": "RETAIL",
					"UserTokens": [user.token.expose()],
				},
				"RelyingParty": self.relying_party,
				"TokenType": "JWT",
			});
			let request = http::json_request(
				self.name(),
				Method::POST,
				&ctx.app.endpoints.xbl_xsts_authorize,
				&[XBL_CONTRACT_VERSION],
				Some(&body),
			)?;
			let response = XboxTokenResponse::read(
				self.name(),
				&handler::xbox_live(ctx.send(request).await?)?,
			)?;

			Ok(XblXstsToken {
				expire_time_ms: response.expire_time(self.name())?,
				user_hash: response.user_hash(self.name())?,
				token: Secret::new(response.token),
				relying_party: self.relying_party.clone(),
			}
			.into())
		})
	}

	fn to_document(&self, artifact: &Artifact) -> Result<Document> {
		encode_document::<XblXstsToken>(self.name(), artifact)
	}

	fn parse_document(&self, document: &Document) -> Result<Artifact> {
		decode_document::<XblXstsToken>(self.name(), document)
	}
}
