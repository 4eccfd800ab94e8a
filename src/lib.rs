//! Token-caching, rate-limited search gate for marketplace APIs.
//!
//! [`flows::TokenManager`] caches the client-credentials token behind a singleflight guard,
//! [`rate_limit::RateLimiter`] admits callers per client key, and [`search`] validates and
//! forwards Browse searches. The `server` feature adds the axum [`gate`] plus the
//! environment-driven [`config`]; [`client::MarketplaceClient`] is the caller-side
//! counterpart that paces and caches its own searches.

#![deny(clippy::all, missing_docs)]
#![warn(unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod clock;
#[cfg(feature = "server")] pub mod config;
pub mod error;
pub mod flows;
#[cfg(feature = "server")] pub mod gate;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod rate_limit;
pub mod search;
pub mod store;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(feature = "server")] use color_eyre as _;
#[cfg(test)] use {base64 as _, httpmock as _, tower as _};
