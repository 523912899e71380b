//! Ready-made chains for the common login flows.

// self
use crate::{
	_prelude::*,
	chain::Chain,
	step::{
		ExternalBrowserStep, LocalWebServerStep, McTokenStep, MsaCodeStep, MsaTokenStep,
		PlayerCertificatesStep, XblUserTokenStep, XblXstsTokenStep,
	},
};

/// Java edition login from a user-supplied authorization code, down to the chat-signing
/// certificates.
///
/// `msaCode` → `msaToken` → `xblUserToken` → `xblXstsToken` → `mcToken` → `playerCertificates`
pub fn java_auth_code() -> Result<Chain> {
	Chain::builder()
		.step(MsaCodeStep)
		.step(MsaTokenStep)
		.step(XblUserTokenStep)
		.step(XblXstsTokenStep::minecraft_services())
		.step(McTokenStep)
		.step(PlayerCertificatesStep)
		.build()
}

/// Java edition login through the system browser and a local redirect listener.
///
/// Needs an [`ApplicationContext`](crate::context::ApplicationContext) whose redirect URI is a
/// loopback `http` address without port, e.g. `http://localhost`.
pub fn java_external_browser() -> Result<Chain> {
	Chain::builder()
		.step(ExternalBrowserStep)
		.step(LocalWebServerStep)
		.step(MsaTokenStep)
		.step(XblUserTokenStep)
		.step(XblXstsTokenStep::minecraft_services())
		.step(McTokenStep)
		.step(PlayerCertificatesStep)
		.build()
}

/// XSTS token for Bedrock Realms, for use with
/// [`BedrockRealmsService`](crate::realms::BedrockRealmsService).
pub fn bedrock_realms() -> Result<Chain> {
	Chain::builder()
		.step(MsaCodeStep)
		.step(MsaTokenStep)
		.step(XblUserTokenStep)
		.step(XblXstsTokenStep::bedrock_realms())
		.build()
}
