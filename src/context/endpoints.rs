//! Collaborator endpoint set, production defaults or rebased onto a test server.

// self
use crate::_prelude::*;

/// Microsoft account authorize endpoint.
pub const MSA_AUTHORIZE_URL: &str = "https://login.live.com/oauth20_authorize.srf";
/// Microsoft account token endpoint.
pub const MSA_TOKEN_URL: &str = "https://login.live.com/oauth20_token.srf";
/// Xbox Live user authentication endpoint.
pub const XBL_USER_AUTHENTICATE_URL: &str = "https://user.auth.xboxlive.com/user/authenticate";
/// Xbox Live XSTS authorization endpoint.
pub const XBL_XSTS_AUTHORIZE_URL: &str = "https://xsts.auth.xboxlive.com/xsts/authorize";
/// Minecraft services login endpoint.
pub const MC_LOGIN_URL: &str = "https://api.minecraftservices.com/authentication/login_with_xbox";
/// Minecraft services player certificates endpoint.
pub const PLAYER_CERTIFICATES_URL: &str = "https://api.minecraftservices.com/player/certificates";
/// Bedrock Realms API base.
pub const BEDROCK_REALMS_URL: &str = "https://pocket.realms.minecraft.net/";

/// Endpoint set of every remote collaborator a chain may contact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
	/// Microsoft account authorize endpoint used for interactive login URLs.
	pub msa_authorize: Url,
	/// Microsoft account token endpoint.
	pub msa_token: Url,
	/// Xbox Live user authentication endpoint.
	pub xbl_user_authenticate: Url,
	/// Xbox Live XSTS authorization endpoint.
	pub xbl_xsts_authorize: Url,
	/// Minecraft services login endpoint.
	pub mc_login: Url,
	/// Minecraft services player certificates endpoint.
	pub player_certificates: Url,
	/// Bedrock Realms API base; world paths are joined onto it.
	pub bedrock_realms: Url,
}
impl Endpoints {
	/// Production endpoints.
	pub fn production() -> Result<Self> {
		Ok(Self {
			msa_authorize: parse_url("msa_authorize", MSA_AUTHORIZE_URL)?,
			msa_token: parse_url("msa_token", MSA_TOKEN_URL)?,
			xbl_user_authenticate: parse_url("xbl_user_authenticate", XBL_USER_AUTHENTICATE_URL)?,
			xbl_xsts_authorize: parse_url("xbl_xsts_authorize", XBL_XSTS_AUTHORIZE_URL)?,
			mc_login: parse_url("mc_login", MC_LOGIN_URL)?,
			player_certificates: parse_url("player_certificates", PLAYER_CERTIFICATES_URL)?,
			bedrock_realms: parse_url("bedrock_realms", BEDROCK_REALMS_URL)?,
		})
	}

	/// Points every endpoint at `base`, keeping the production paths.
	///
	/// Useful for routing a whole chain through a mock server.
	pub fn rebased(base: &Url) -> Result<Self> {
		let production = Self::production()?;
		let rebase = |name: &'static str, url: &Url| {
			base.join(url.path()).map_err(|source| crate::error::ValidationError::InvalidUrl {
				name,
				source,
			})
		};

		Ok(Self {
			msa_authorize: rebase("msa_authorize", &production.msa_authorize)?,
			msa_token: rebase("msa_token", &production.msa_token)?,
			xbl_user_authenticate: rebase("xbl_user_authenticate", &production.xbl_user_authenticate)?,
			xbl_xsts_authorize: rebase("xbl_xsts_authorize", &production.xbl_xsts_authorize)?,
			mc_login: rebase("mc_login", &production.mc_login)?,
			player_certificates: rebase("player_certificates", &production.player_certificates)?,
			bedrock_realms: rebase("bedrock_realms", &production.bedrock_realms)?,
		})
	}
}

pub(crate) fn parse_url(name: &'static str, raw: &str) -> Result<Url> {
	Url::parse(raw).map_err(|source| crate::error::ValidationError::InvalidUrl { name, source }.into())
}
