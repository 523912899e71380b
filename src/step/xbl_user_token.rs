//! Xbox Live user authentication step.

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	clock::Timestamp,
	error::ParseError,
	http::{self, handler},
	step::{
		Artifact, Document, Expiry, MsaToken, Secret, Step, StepContext, StepFuture, StepInput,
		decode_document, encode_document, previous,
	},
};

/// Name of [`XblUserTokenStep`].
pub const XBL_USER_TOKEN: &str = "xblUserToken";

pub(crate) const XBL_CONTRACT_VERSION: (&str, &str) = ("x-xbl-contract-version", "1");

/// Xbox Live user token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XblUserToken {
	/// Expiry instant (`NotAfter`).
	pub expire_time_ms: Timestamp,
	/// User token presented to XSTS.
	pub token: Secret,
	/// User hash (`uhs`) claim.
	pub user_hash: String,
}
impl XblUserToken {
	/// Expires at [`expire_time_ms`](Self::expire_time_ms).
	pub fn expiry(&self) -> Expiry {
		Expiry::At(self.expire_time_ms)
	}
}

/// Token response shared by user authentication and XSTS authorization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct XboxTokenResponse {
	pub(crate) not_after: String,
	pub(crate) token: String,
	pub(crate) display_claims: XboxDisplayClaims,
}
impl XboxTokenResponse {
	pub(crate) fn read(step: &str, body: &[u8]) -> Result<Self> {
		handler::read_json(step, Some(200), body)
	}

	pub(crate) fn expire_time(&self, step: &str) -> Result<Timestamp> {
		Timestamp::parse_rfc3339(&self.not_after).map_err(|source| {
			ParseError::Timestamp { step: step.to_owned(), field: "NotAfter", source }.into()
		})
	}

	pub(crate) fn user_hash(&self, step: &str) -> Result<String> {
		self.display_claims
			.xui
			.first()
			.map(|claim| claim.uhs.clone())
			.ok_or_else(|| ParseError::InvalidField { step: step.to_owned(), field: "uhs" }.into())
	}
}

#[derive(Debug, Deserialize)]
pub(crate) struct XboxDisplayClaims {
	pub(crate) xui: Vec<XboxUserClaim>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct XboxUserClaim {
	pub(crate) uhs: String,
}

/// Authenticates the MSA access token with Xbox Live.
#[derive(Clone, Copy, Debug, Default)]
pub struct XblUserTokenStep;
impl Step for XblUserTokenStep {
	fn name(&self) -> &str {
		XBL_USER_TOKEN
	}

	fn apply<'a>(&'a self, ctx: &'a StepContext, input: StepInput<'a>) -> StepFuture<'a, Artifact> {
		Box::pin(async move {
			let msa = previous::<MsaToken>(self.name(), input)?;
			let body = serde_json::json!({
				"Properties": {
					"AuthMethod": "RPS",
					"SiteName": "user.auth.xboxlive.com",
					"RpsTicket": format!("{}{}", ctx.app.rps_ticket_prefix(), msa.access_token.expose()),
				},
				"RelyingParty": "http://auth.xboxlive.com",
				"TokenType": "JWT",
			});
			let request = http::json_request(
				self.name(),
				Method::POST,
				&ctx.app.endpoints.xbl_user_authenticate,
				&[XBL_CONTRACT_VERSION],
				Some(&body),
			)?;
			let response = XboxTokenResponse::read(
				self.name(),
				&handler::xbox_live(ctx.send(request).await?)?,
			)?;

			Ok(XblUserToken {
				expire_time_ms: response.expire_time(self.name())?,
				user_hash: response.user_hash(self.name())?,
				token: Secret::new(response.token),
			}
			.into())
		})
	}

	fn to_document(&self, artifact: &Artifact) -> Result<Document> {
		encode_document::<XblUserToken>(self.name(), artifact)
	}

	fn parse_document(&self, document: &Document) -> Result<Artifact> {
		decode_document::<XblUserToken>(self.name(), document)
	}
}
