//! Signs in a Java edition account through the system browser, caching the whole chain in a JSON
//! file so later runs only refresh what expired.
//!
//! ```sh
//! cargo run --example java_login -- account.json
//! ```

// std
use std::{env, fs, path::PathBuf};
// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use mc_auth_chain::{
	chain::presets,
	context::ApplicationContext,
	error::Error,
	step::{BrowserCallback, ExternalBrowser, InitialInput, McToken, StepContext},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let cache = env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| "account.json".into());
	let app = ApplicationContext::builder().redirect_uri("http://localhost").build()?;
	let ctx = StepContext::with_reqwest(app)?;
	let chain = presets::java_external_browser()?;
	let callback = BrowserCallback::new(|session: &ExternalBrowser| {
		println!("Open {} to sign in.", session.authentication_url);
	});
	let cached = match fs::read(&cache) {
		Ok(bytes) => Some(chain.parse_document(&serde_json::from_slice(&bytes)?)?),
		Err(_) => None,
	};
	let result = match cached {
		Some(cached) => match chain.refresh_leaf(&ctx, &cached).await {
			Ok(result) => result,
			Err(e) if matches!(e.root(), Error::RestartRequired { .. }) => {
				println!("{e}");

				chain.run_fresh(&ctx, InitialInput::ExternalBrowser(callback)).await?
			},
			Err(e) => return Err(e.into()),
		},
		None => chain.run_fresh(&ctx, InitialInput::ExternalBrowser(callback)).await?,
	};
	let token = result.find::<McToken>().ok_or_else(|| eyre!("Chain produced no Minecraft token."))?;

	fs::write(&cache, serde_json::to_vec_pretty(&chain.to_document(&result)?)?)?;

	println!("Signed in; Minecraft token expires at {}.", token.expire_time_ms);
	println!("Chain cached in {}.", cache.display());

	Ok(())
}
