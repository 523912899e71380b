//! Immutable application configuration shared by every step of a chain invocation.

pub mod builder;
pub mod endpoints;

pub use builder::*;
pub use endpoints::*;

// self
use crate::{_prelude::*, step::Secret};

/// Client id of the Minecraft Java launcher's Microsoft account title.
pub const JAVA_TITLE_CLIENT_ID: &str = "00000000402b5328";
/// Scope requesting an Xbox Live title ticket.
pub const TITLE_SCOPE: &str = "service::user.auth.xboxlive.com::MBI_SSL";
/// Redirect used by desktop title clients.
pub const DESKTOP_REDIRECT_URI: &str = "https://login.live.com/oauth20_desktop.srf";

/// Client identity and collaborator endpoints.
#[derive(Clone, PartialEq, Eq)]
pub struct ApplicationContext {
	/// Microsoft account OAuth client identifier.
	pub client_id: String,
	/// Optional confidential client secret, posted in the request body.
	pub client_secret: Option<Secret>,
	/// Space-delimited scope string sent verbatim.
	pub scope: String,
	/// Redirect URI registered for the client.
	pub redirect_uri: String,
	/// Remote collaborator endpoints.
	pub endpoints: Endpoints,
}
impl ApplicationContext {
	/// Starts a builder seeded with the Minecraft Java title defaults.
	pub fn builder() -> ApplicationContextBuilder {
		ApplicationContextBuilder::default()
	}

	/// Returns `true` when the client id is a title id rather than an Azure application id.
	///
	/// Azure application ids are GUIDs; title ids are short hexadecimal strings.
	pub fn is_title_client(&self) -> bool {
		!(self.client_id.len() == 36 && self.client_id.matches('-').count() == 4)
	}

	/// Prefix Xbox Live expects in front of an MSA access token in `RpsTicket`.
	pub fn rps_ticket_prefix(&self) -> &'static str {
		if self.is_title_client() { "t=" } else { "d=" }
	}
}
impl Debug for ApplicationContext {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApplicationContext")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
			.field("scope", &self.scope)
			.field("redirect_uri", &self.redirect_uri)
			.field("endpoints", &self.endpoints)
			.finish()
	}
}
