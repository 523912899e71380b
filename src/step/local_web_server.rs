//! Loopback listener capturing the authorization redirect of an interactive login.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use tiny_http::{Header, Method, Request, Response, Server};
// self
use crate::{
	_prelude::*,
	error::{Collaborator, ServiceError, TransportError},
	obs,
	step::{
		Artifact, Document, ExternalBrowser, MsaCode, Secret, Step, StepContext, StepFuture,
		StepInput, decode_document, encode_document, previous,
	},
};

/// Name of [`LocalWebServerStep`].
pub const LOCAL_WEB_SERVER: &str = "localWebServer";

const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(50);
const SUCCESS_PAGE: &str = "<html><body><h1>Signed in</h1><p>You can close this window and return to the application.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h1>Sign-in failed</h1><p>Return to the application for details.</p></body></html>";

#[derive(Debug, PartialEq, Eq)]
enum Redirect {
	Code(String),
	Denied { error: String, description: Option<String> },
	Ignored(u16),
}

/// Waits on the session's loopback port for the authorization redirect.
///
/// Requests without a matching `state` are answered and ignored; the wait ends with the first
/// redirect carrying either a code or an error, or with cancellation. Connections are served
/// concurrently, so idle browser connections never hold up the redirect. The listening socket
/// is released in every case.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalWebServerStep;
impl Step for LocalWebServerStep {
	fn name(&self) -> &str {
		LOCAL_WEB_SERVER
	}

	fn apply<'a>(&'a self, ctx: &'a StepContext, input: StepInput<'a>) -> StepFuture<'a, Artifact> {
		Box::pin(async move {
			let session = previous::<ExternalBrowser>(self.name(), input)?;
			let server = Server::http(("127.0.0.1", session.port))
				.map_err(|e| TransportError::Io(std::io::Error::other(e)))?;
			let stop = Arc::new(AtomicBool::new(false));
			let mut wait = tokio::task::spawn_blocking({
				let stop = stop.clone();
				let state = session.state.clone();

				move || accept_code(server, &state, &stop)
			});

			obs::info(self.name(), format_args!("Listening on {}", session.redirect_uri));

			let joined = tokio::select! {
				joined = &mut wait => joined,
				_ = ctx.cancellation.cancelled() => {
					stop.store(true, Ordering::Relaxed);
					// The server is dropped by the blocking task; wait for it to let the port go.
					let _ = wait.await;

					return Err(Error::Cancelled { step: self.name().to_owned() });
				},
			};
			let code = joined.map_err(|e| TransportError::Io(std::io::Error::other(e)))??;

			Ok(MsaCode {
				code: Secret::new(code),
				redirect_uri: Some(session.redirect_uri.clone()),
				code_verifier: Some(session.code_verifier.clone()),
			}
			.into())
		})
	}

	fn to_document(&self, artifact: &Artifact) -> Result<Document> {
		encode_document::<MsaCode>(self.name(), artifact)
	}

	fn parse_document(&self, document: &Document) -> Result<Artifact> {
		decode_document::<MsaCode>(self.name(), document)
	}
}

fn accept_code(server: Server, expected_state: &str, stop: &AtomicBool) -> Result<String> {
	while !stop.load(Ordering::Relaxed) {
		let Some(request) = server.recv_timeout(POLL_INTERVAL).map_err(TransportError::from)?
		else {
			continue;
		};
		let redirect = if request.method() == &Method::Get {
			classify(request.url(), expected_state)
		} else {
			Redirect::Ignored(405)
		};

		match redirect {
			Redirect::Code(code) => {
				respond(request, 200, SUCCESS_PAGE);

				return Ok(code);
			},
			Redirect::Denied { error, description } => {
				respond(request, 400, FAILURE_PAGE);

				let message = match description {
					Some(description) => format!("{error}: {description}"),
					None => error,
				};

				return Err(ServiceError::new(Collaborator::Msa, None, message).into());
			},
			Redirect::Ignored(status) => {
				let _ = request.respond(Response::empty(status));
			},
		}
	}

	Err(Error::Cancelled { step: LOCAL_WEB_SERVER.to_owned() })
}

fn classify(target: &str, expected_state: &str) -> Redirect {
	let Ok(url) = Url::parse(&format!("http://localhost{target}")) else {
		return Redirect::Ignored(400);
	};
	let mut code = None;
	let mut state = None;
	let mut error = None;
	let mut description = None;

	for (key, value) in url.query_pairs() {
		match key.as_ref() {
			"code" => code = Some(value.into_owned()),
			"state" => state = Some(value.into_owned()),
			"error" => error = Some(value.into_owned()),
			"error_description" => description = Some(value.into_owned()),
			_ => {},
		}
	}

	match (code, error) {
		(None, None) => Redirect::Ignored(404),
		_ if state.as_deref() != Some(expected_state) => Redirect::Ignored(400),
		(_, Some(error)) => Redirect::Denied { error, description },
		(Some(code), None) => Redirect::Code(code),
	}
}

fn respond(request: Request, status: u16, page: &'static str) {
	let mut response = Response::from_data(page.as_bytes()).with_status_code(status);

	if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..]) {
		response.add_header(header);
	}

	let _ = request.respond(response);
}
