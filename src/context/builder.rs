//! Validating builder for [`ApplicationContext`](crate::context::ApplicationContext).

// self
use crate::{
	_prelude::*,
	context::{
		ApplicationContext, DESKTOP_REDIRECT_URI, Endpoints, JAVA_TITLE_CLIENT_ID, TITLE_SCOPE,
	},
	error::ValidationError,
	step::Secret,
};

/// Builder for [`ApplicationContext`] values.
#[derive(Debug)]
pub struct ApplicationContextBuilder {
	/// Client identifier.
	pub client_id: String,
	/// Optional client secret.
	pub client_secret: Option<String>,
	/// Scope string.
	pub scope: String,
	/// Redirect URI.
	pub redirect_uri: String,
	/// Endpoint overrides; production endpoints are used when unset.
	pub endpoints: Option<Endpoints>,
}
impl ApplicationContextBuilder {
	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Sets the confidential client secret.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.client_secret = Some(client_secret.into());

		self
	}

	/// Sets the scope string.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = scope.into();

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
		self.redirect_uri = redirect_uri.into();

		self
	}

	/// Overrides the collaborator endpoints.
	pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
		self.endpoints = Some(endpoints);

		self
	}

	/// Consumes the builder and validates the resulting context.
	pub fn build(self) -> Result<ApplicationContext> {
		if self.client_id.trim().is_empty() {
			return Err(ValidationError::MissingClientId.into());
		}

		if self.redirect_uri.ends_with('/') {
			return Err(ValidationError::InvalidRedirect {
				uri: self.redirect_uri,
				reason: "it must not end with `/`",
			}
			.into());
		}

		Url::parse(&self.redirect_uri)
			.map_err(|source| ValidationError::InvalidUrl { name: "redirect_uri", source })?;

		let endpoints = match self.endpoints {
			Some(endpoints) => endpoints,
			None => Endpoints::production()?,
		};

		Ok(ApplicationContext {
			client_id: self.client_id,
			client_secret: self.client_secret.map(Secret::new),
			scope: self.scope,
			redirect_uri: self.redirect_uri,
			endpoints,
		})
	}
}
impl Default for ApplicationContextBuilder {
	fn default() -> Self {
		Self {
			client_id: JAVA_TITLE_CLIENT_ID.into(),
			client_secret: None,
			scope: TITLE_SCOPE.into(),
			redirect_uri: DESKTOP_REDIRECT_URI.into(),
			endpoints: None,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn empty_client_id_is_rejected() {
		let err = ApplicationContext::builder()
			.client_id("  ")
			.build()
			.expect_err("Blank client id should be rejected.");

		assert!(matches!(err, Error::Validation(ValidationError::MissingClientId)));
	}

	#[test]
	fn unparsable_redirect_is_rejected() {
		let err = ApplicationContext::builder()
			.redirect_uri("not a url")
			.build()
			.expect_err("Unparsable redirect should be rejected.");

		assert!(matches!(
			err,
			Error::Validation(ValidationError::InvalidUrl { name: "redirect_uri", .. })
		));
	}

	#[test]
	fn trailing_slash_redirect_is_rejected() {
		let err = ApplicationContext::builder()
			.redirect_uri("http://localhost/")
			.build()
			.expect_err("Trailing slash should be rejected.");

		assert!(matches!(err, Error::Validation(ValidationError::InvalidRedirect { .. })));
	}
}
