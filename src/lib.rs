//! A client for the [Tinybird](https://www.tinybird.co) analytics API.
//!
//! This crate provides an async Rust SDK for reading data sources and pipes
//! and running SQL queries against a Tinybird workspace.
//!
//! # Using the client
//!
//! ```no_run
//! use tinybird::{ApiClient, Profile};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let profile = Profile::from_default_env()?;
//! let client = ApiClient::from_profile(&profile, None)?;
//!
//! for ds in client.list_data_sources().await? {
//!     println!("Data source: {} ({})", ds.name, ds.id);
//! }
//!
//! let data = client.get_pipe_data("top_pages", [("year", 2024)]).await?;
//! println!("{} rows", data.rows);
//!
//! client.close();
//! # Ok(())
//! # }
//! ```
//!
//! # HTTP Requests and Responses
//!
//! Every operation is also available as a request type that works with any
//! HTTP client built on the [`http`] crate. Use [`ApiRequest::into_request`]
//! to create a request, and [`ApiResponse::from_response`] to parse the
//! response.
//!
//! ```no_run
//! use tinybird::{ApiRequest, ApiResponse, JsonObject, Profile, pipe::GetPipe};
//! use http_body_util::BodyExt;
//! use std::io::Cursor;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let profile = Profile::from_default_env()?;
//! let client = reqwest::Client::new();
//!
//! let req = GetPipe { name: "top_pages" };
//! let http_req = req.into_request(&profile)?;
//! let reqwest_req: reqwest::Request = http_req.try_into()?;
//!
//! let resp = client.execute(reqwest_req).await?;
//! let http_resp: http::Response<_> = resp.into();
//! let (parts, body) = http_resp.into_parts();
//! let bytes = body.collect().await?.to_bytes();
//!
//! // The associated `Response` type of `GetPipe` is a raw JSON object.
//! let pipe = JsonObject::from_response_parts(parts, Cursor::new(bytes))?;
//! println!("Pipe: {:?}", pipe.get("name"));
//! # Ok(())
//! # }
//! ```

#![warn(
    anonymous_parameters,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_qualifications,
    variant_size_differences
)]

mod api;
mod client;
mod config;

pub use api::*;
pub use client::{ApiClient, DEFAULT_TIMEOUT};
pub use config::{DEFAULT_API_URL, Error as ConfigError, Profile};
