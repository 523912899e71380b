//! Minecraft account credential chains: compose MSA, Xbox Live, and Minecraft services steps,
//! refresh only what expired, and persist the whole chain as one nested document.
//!
//! A [`chain::Chain`] is an ordered list of [`step::Step`]s. Running it fresh folds every step
//! from the root to the leaf; refreshing walks from the leaf toward the root only as far as
//! expired artifacts reach and re-derives forward from there.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cancel;
pub mod chain;
pub mod clock;
pub mod codec;
pub mod context;
pub mod error;
pub mod http;
pub mod obs;
pub mod realms;
pub mod retry;
pub mod step;

mod oauth;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
