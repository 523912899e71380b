mod common;

// crates.io
use mc_auth_chain::{
	chain::{Chain, ChainResult, presets},
	error::Error,
	step::{
		Artifact, AuthorizationCodeInput, Expiry, ExternalBrowser, InitialInput, McToken, MsaCode,
		MsaCodeStep, MsaToken, MsaTokenStep, PlayerCertificates, Secret, XblUserTokenStep,
	},
};
use time::Duration;
// self
use common::*;

fn code() -> InitialInput {
	InitialInput::AuthorizationCode(AuthorizationCodeInput::new("M.C507_BAY.2.U"))
}

fn short_chain() -> Chain {
	Chain::builder()
		.step(MsaCodeStep)
		.step(MsaTokenStep)
		.step(XblUserTokenStep)
		.build()
		.expect("Chain should validate.")
}

fn assert_leaf_valid(result: &ChainResult, now: mc_auth_chain::clock::Timestamp) {
	match result.leaf().expiry() {
		Expiry::At(expires_at) => assert!(expires_at > now, "Leaf should expire in the future."),
		Expiry::Never => panic!("Leaf of this chain always has an expiry."),
	}
}

fn queue_java_login(transport: &RecordingTransport) {
	transport
		.respond(200, msa_token_response(86_400, Some("M.R3_BAY.-CY")))
		.respond(200, xbox_token_response("user-token", "2023-11-28T22:13:20.0000000Z"))
		.respond(200, xbox_token_response("xsts-token", "2023-11-15T14:13:20.0000000Z"))
		.respond(200, mc_token_response("mc-access"))
		.respond(200, certificates_response("2023-11-16T10:00:00.000000Z"));
}

#[tokio::test]
async fn fresh_run_derives_every_step_once() {
	let (ctx, transport, _) = recording_context();
	let chain = presets::java_auth_code().expect("Preset should validate.");

	queue_java_login(&transport);

	let result = chain.run_fresh(&ctx, code()).await.expect("Fresh run should succeed.");

	assert_eq!(result.len(), 6);
	assert_eq!(
		transport.paths(),
		[
			"/oauth20_token.srf",
			"/user/authenticate",
			"/xsts/authorize",
			"/authentication/login_with_xbox",
			"/player/certificates",
		]
	);
	assert_eq!(
		result.find::<McToken>().map(McToken::authorization_header).as_deref(),
		Some("Bearer mc-access")
	);
	assert_eq!(
		result.find::<PlayerCertificates>().map(|certificates| certificates.private_key.clone()),
		Some(vec![1, 2, 3, 4])
	);
	assert_eq!(chain.metrics().fresh_runs(), 1);
}

#[tokio::test]
async fn restored_valid_leaf_refreshes_without_calls() {
	let (ctx, transport, clock) = recording_context();
	let chain = presets::java_auth_code().expect("Preset should validate.");

	queue_java_login(&transport);

	let fresh = chain.run_fresh(&ctx, code()).await.expect("Fresh run should succeed.");
	let document = chain.to_document(&fresh).expect("Result should encode.");
	let restored = chain.parse_document(&document).expect("Document should decode.");

	assert_eq!(restored, fresh);

	transport.take();
	clock.advance(Duration::hours(1));

	let refreshed = chain.refresh_leaf(&ctx, &restored).await.expect("Refresh should succeed.");

	assert_eq!(refreshed, restored);
	assert_eq!(transport.calls(), 0);
	assert_eq!(chain.to_document(&refreshed).expect("Result should encode."), document);
}

#[tokio::test]
async fn external_browser_chain_round_trips_through_its_document() {
	let (ctx, transport, _) = recording_context();
	let chain = presets::java_external_browser().expect("Preset should validate.");

	queue_java_login(&transport);

	let derived = presets::java_auth_code()
		.expect("Preset should validate.")
		.run_fresh(&ctx, code())
		.await
		.expect("Fresh run should succeed.");
	let session = ExternalBrowser {
		authentication_url: "https://collaborators.test/oauth20_authorize.srf?state=s1".into(),
		redirect_uri: "http://localhost:49152".into(),
		port: 49152,
		state: "s1".into(),
		code_verifier: Secret::new("verifier"),
	};
	let redirected = MsaCode {
		code: Secret::new("M.C507_BAY.2.U"),
		redirect_uri: Some(session.redirect_uri.clone()),
		code_verifier: Some(session.code_verifier.clone()),
	};
	let result = ChainResult::from_artifacts(
		[Artifact::from(session), Artifact::from(redirected)]
			.into_iter()
			.chain(derived.artifacts().skip(1).cloned()),
	)
	.expect("Result should not be empty.");
	let document = chain.to_document(&result).expect("Result should encode.");
	let server = &document["mcToken"]["xblXstsToken"]["xblUserToken"]["msaToken"]["localWebServer"];

	assert_eq!(server["codeVerifier"], "verifier");
	assert_eq!(server["redirectUri"], "http://localhost:49152");
	assert_eq!(server["externalBrowser"]["port"], 49152);
	assert_eq!(server["externalBrowser"]["state"], "s1");

	let restored = chain.parse_document(&document).expect("Document should decode.");

	assert_eq!(restored, result);
	assert_eq!(chain.to_document(&restored).expect("Result should encode."), document);
}

#[tokio::test]
async fn refresh_stops_at_the_first_valid_ancestor() {
	let (ctx, transport, clock) = recording_context();
	let chain = presets::java_auth_code().expect("Preset should validate.");

	queue_java_login(&transport);

	let fresh = chain.run_fresh(&ctx, code()).await.expect("Fresh run should succeed.");
	let before = chain.to_document(&fresh).expect("Result should encode.");

	transport.take();
	// Certificates, Minecraft token, XSTS token and MSA token are expired; the Xbox user token
	// is valid for two weeks.
	clock.advance(Duration::hours(36));
	transport
		.respond(200, xbox_token_response("xsts-token-2", "2023-11-17T02:13:20.0000000Z"))
		.respond(200, mc_token_response("mc-access-2"))
		.respond(200, certificates_response("2023-11-18T10:00:00.000000Z"));

	let refreshed = chain.refresh_leaf(&ctx, &fresh).await.expect("Refresh should succeed.");
	let after = chain.to_document(&refreshed).expect("Result should encode.");

	assert_eq!(
		transport.paths(),
		["/xsts/authorize", "/authentication/login_with_xbox", "/player/certificates"]
	);
	assert_eq!(
		after["mcToken"]["xblXstsToken"]["xblUserToken"],
		before["mcToken"]["xblXstsToken"]["xblUserToken"]
	);
	assert!((0..3).all(|index| refreshed.shares_artifact(&fresh, index)));
	assert_ne!(after["mcToken"]["accessToken"], before["mcToken"]["accessToken"]);
	assert_leaf_valid(&refreshed, ctx.now());
	assert_eq!(chain.metrics().rederived_steps(), 3);
}

#[tokio::test]
async fn expired_ancestor_with_refresh_token_renews_ancestor_and_leaf() {
	let (ctx, transport, clock) = recording_context();
	let chain = short_chain();

	transport
		.respond(200, msa_token_response(86_400, Some("M.R3_BAY.-CY")))
		.respond(200, xbox_token_response("user-token", "2023-11-15T10:13:20.0000000Z"));

	let fresh = chain.run_fresh(&ctx, code()).await.expect("Fresh run should succeed.");
	let before = chain.to_document(&fresh).expect("Result should encode.");

	transport.take();
	clock.advance(Duration::hours(25));
	transport
		.respond(200, msa_token_response(86_400, None))
		.respond(200, xbox_token_response("user-token-2", "2023-11-29T22:13:20.0000000Z"));

	let refreshed = chain.refresh_leaf(&ctx, &fresh).await.expect("Refresh should succeed.");
	let after = chain.to_document(&refreshed).expect("Result should encode.");
	let calls = transport.take();

	assert_eq!(calls.len(), 2);
	assert!(calls[0].form().contains(&("grant_type".into(), "refresh_token".into())));
	assert_eq!(after["msaToken"]["msaCode"], before["msaToken"]["msaCode"]);
	assert_eq!(after["msaToken"]["refreshToken"], "M.R3_BAY.-CY");
	assert!(refreshed.shares_artifact(&fresh, 0));
	assert_leaf_valid(&refreshed, ctx.now());
}

#[tokio::test]
async fn ancestor_without_renewal_credential_requires_restart() {
	let (ctx, transport, clock) = recording_context();
	let chain = short_chain();

	transport
		.respond(200, msa_token_response(3_600, None))
		.respond(200, xbox_token_response("user-token", "2023-11-14T23:13:20.0000000Z"));

	let fresh = chain.run_fresh(&ctx, code()).await.expect("Fresh run should succeed.");

	assert_eq!(fresh.find::<MsaToken>().and_then(|token| token.refresh_token.as_ref()), None);

	transport.take();
	clock.advance(Duration::hours(2));

	let err = chain.refresh_leaf(&ctx, &fresh).await.expect_err("Refresh should need a restart.");

	assert_eq!(err.step(), Some("msaToken"));
	assert!(matches!(err.root(), Error::RestartRequired { step } if step == "msaToken"));
	assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn fresh_run_failure_returns_only_the_error() {
	let (ctx, transport, _) = recording_context();
	let chain = short_chain();

	transport.respond(200, msa_token_response(86_400, None)).respond(
		401,
		serde_json::json!({ "Identity": "0", "XErr": 2_148_916_238_i64, "Message": "" }),
	);

	let err = chain.run_fresh(&ctx, code()).await.expect_err("Child accounts need consent.");
	let service = err.service().expect("Error should be a service error.");

	assert_eq!(err.step(), Some("xblUserToken"));
	assert_eq!(service.code, Some(2_148_916_238));
	assert!(service.remediation.is_some());
	assert_eq!(chain.metrics().failures(), 1);
	assert_eq!(transport.pending(), 0);
}
