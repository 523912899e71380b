//! Per-collaborator response classification.
//!
//! Each collaborator reports failures differently: Xbox Live uses `XErr`, Minecraft services
//! use `errorMessage`, and Realms uses `errorCode` plus `503 Retry-After` for deferrals. The
//! handlers below normalize those into bodies, [`ServiceError`]s, or [`Attempt::Retry`].

// self
use crate::{
	_prelude::*,
	clock::Timestamp,
	error::{Collaborator, ParseError, ServiceError},
	http::{HttpResponse, parse_retry_after},
	retry::{Attempt, RetrySignal},
};

#[derive(Debug, Default, Deserialize)]
struct XboxErrorBody {
	#[serde(rename = "XErr")]
	x_err: Option<i64>,
	#[serde(rename = "Message")]
	message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MinecraftErrorBody {
	error_message: Option<String>,
	error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RealmsErrorBody {
	error_code: Option<i64>,
	error_msg: Option<String>,
}

/// Deserializes a JSON body, keeping the failing path for diagnostics.
pub fn read_json<T>(step: &str, status: Option<u16>, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ParseError::Response { step: step.to_owned(), status, source }.into())
}

/// Classifies an Xbox Live user authentication or XSTS response.
pub fn xbox_live(response: HttpResponse) -> Result<Vec<u8>> {
	let status = response.status();

	if status.is_success() {
		return Ok(response.into_body());
	}

	let body = serde_json::from_slice::<XboxErrorBody>(response.body()).unwrap_or_default();
	let code = body.x_err.or_else(|| {
		response.headers().get("x-err").and_then(|value| value.to_str().ok()?.parse().ok())
	});
	let message = body
		.message
		.filter(|message| !message.is_empty())
		.unwrap_or_else(|| status_reason(status.as_u16()));
	let mut error = ServiceError::new(Collaborator::XboxLive, Some(status.as_u16()), message);

	if let Some(code) = code {
		error = error.with_code(code);
	}

	Err(error.into())
}

/// Classifies a Minecraft services response.
pub fn minecraft(response: HttpResponse) -> Result<Vec<u8>> {
	let status = response.status();

	if status.is_success() {
		return Ok(response.into_body());
	}

	let body = serde_json::from_slice::<MinecraftErrorBody>(response.body()).unwrap_or_default();
	let message = body
		.error_message
		.or(body.error)
		.filter(|message| !message.is_empty())
		.unwrap_or_else(|| status_reason(status.as_u16()));

	Err(ServiceError::new(Collaborator::Minecraft, Some(status.as_u16()), message).into())
}

/// Classifies a Realms response; `503` with `Retry-After` becomes a retry directive.
///
/// `now` anchors `Retry-After` values given as HTTP dates.
pub fn realms(response: HttpResponse, now: Timestamp) -> Result<Attempt<Vec<u8>>> {
	let status = response.status();

	if status.is_success() {
		return Ok(Attempt::Ready(response.into_body()));
	}
	if let Some(wait) =
		(status.as_u16() == 503).then(|| parse_retry_after(response.headers(), now)).flatten()
	{
		let seconds = u64::try_from(wait.whole_seconds()).unwrap_or_default();

		return Ok(Attempt::Retry(RetrySignal::after_seconds(seconds)));
	}

	let body = serde_json::from_slice::<RealmsErrorBody>(response.body()).unwrap_or_default();
	let message = body
		.error_msg
		.filter(|message| !message.is_empty())
		.unwrap_or_else(|| status_reason(status.as_u16()));
	let mut error = ServiceError::new(Collaborator::Realms, Some(status.as_u16()), message);

	if let Some(code) = body.error_code {
		error = error.with_code(code);
	}

	Err(error.into())
}

fn status_reason(status: u16) -> String {
	oauth2::http::StatusCode::from_u16(status)
		.ok()
		.and_then(|status| status.canonical_reason())
		.unwrap_or("Unexpected status")
		.to_owned()
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::{HeaderValue, StatusCode, header::RETRY_AFTER};
	// self
	use super::*;
	use crate::step::tests_support::NOW;

	fn response(status: u16, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() = StatusCode::from_u16(status).expect("Status should be valid.");

		response
	}

	#[test]
	fn xbox_error_code_is_enriched() {
		let err = xbox_live(response(401, r#"{"Identity":"0","XErr":2148916233,"Message":""}"#))
			.expect_err("401 should fail.");
		let service = err.service().expect("Error should be a service error.");

		assert_eq!(service.code, Some(2_148_916_233));
		assert!(service.remediation.is_some());
		assert_eq!(service.status, Some(401));
	}

	#[test]
	fn xbox_error_code_falls_back_to_header() {
		let mut failed = response(401, "");

		failed.headers_mut().insert("x-err", HeaderValue::from_static("2148916238"));

		let err = xbox_live(failed).expect_err("401 should fail.");

		assert_eq!(err.service().and_then(|service| service.code), Some(2_148_916_238));
	}

	#[test]
	fn minecraft_error_message_is_kept() {
		let err = minecraft(response(
			403,
			r#"{"path":"/authentication/login_with_xbox","errorMessage":"Invalid app registration"}"#,
		))
		.expect_err("403 should fail.");

		assert_eq!(
			err.service().map(|service| service.message.as_str()),
			Some("Invalid app registration")
		);
	}

	#[test]
	fn realms_503_with_retry_after_is_a_retry() {
		let mut deferred = response(503, "Retry again later");

		deferred.headers_mut().insert(RETRY_AFTER, HeaderValue::from_static("5"));

		assert_eq!(
			realms(deferred, NOW).expect("503 with Retry-After should not fail."),
			Attempt::Retry(RetrySignal::after_seconds(5))
		);
	}

	#[test]
	fn realms_503_without_retry_after_is_an_error() {
		let err =
			realms(response(503, ""), NOW).expect_err("503 without Retry-After should fail.");

		assert_eq!(err.service().and_then(|service| service.status), Some(503));
	}

	#[test]
	fn realms_tos_code_is_enriched() {
		let body = r#"{"errorCode":6002,"errorMsg":"TOS not accepted"}"#;
		let err = realms(response(403, body), NOW).expect_err("403 should fail.");
		let service = err.service().expect("Error should be a service error.");

		assert_eq!(service.code, Some(6002));
		assert!(service.remediation.is_some_and(|text| text.contains("Terms of Service")));
	}

	#[test]
	fn malformed_body_reports_path() {
		#[derive(Debug, Deserialize)]
		struct Body {
			#[allow(dead_code)]
			token: String,
		}

		let err = read_json::<Body>("mcToken", Some(200), br#"{"token":42}"#)
			.expect_err("Wrong field type should fail.");

		match err {
			Error::Parse(ParseError::Response { source, .. }) =>
				assert_eq!(source.path().to_string(), "token"),
			other => panic!("Expected parse error, got {other:?}."),
		}
	}
}
