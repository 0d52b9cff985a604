use std::io::Read;

use serde::de::DeserializeOwned;

use crate::Profile;

pub mod datasource;
mod error;
pub mod pipe;
mod query;
pub mod sql;

pub use error::*;
pub use query::*;

/// A JSON object returned verbatim by the API.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Implemented by types that can be sent as requests to the API.
pub trait ApiRequest: Sized {
    /// The corresponding response type.
    type Response: ApiResponse;

    /// The endpoint, relative to the API URL, e.g. `v0/pipes`.
    fn path(&self) -> String;

    /// The method to use.
    fn method(&self) -> http::Method {
        http::Method::GET
    }

    /// Query parameters, not including the token.
    fn query(&self) -> QueryParams {
        QueryParams::new()
    }

    /// Consume the request and return an [http::Request] suitable for passing
    /// to your favorite HTTP client.
    ///
    /// The token from the profile is always sent as the `token` query
    /// parameter, replacing any value the request itself set for that key.
    /// Path segments are percent-encoded as needed, but otherwise passed to
    /// the server as-is.
    fn into_request(self, profile: &Profile) -> Result<http::Request<String>, ApiError> {
        let mut query = self.query();
        query.insert(TOKEN_PARAM, &profile.token);

        let mut url = url::Url::parse(&format!(
            "{}/{}",
            profile.api_url.trim_end_matches('/'),
            self.path()
        ))?;
        url.set_query(Some(&query.to_query_string()));

        let req = http::Request::builder()
            .method(self.method())
            .uri(url.as_str())
            .header(http::header::ACCEPT, "application/json")
            .header(http::header::USER_AGENT, &profile.user_agent)
            .body(String::new())?;

        Ok(req)
    }
}

/// Implemented by types that can be read as responses from the API.
pub trait ApiResponse: Sized {
    /// Read the response from an [http::Response] object.
    fn from_response(resp: http::Response<impl Read>) -> Result<Self, ApiError> {
        let (parts, body) = resp.into_parts();
        Self::from_response_parts(parts, body)
    }

    /// Read the response from pre-parsed parts. Useful for async HTTP clients
    /// where the body must be collected before parsing.
    fn from_response_parts(parts: http::response::Parts, body: impl Read)
    -> Result<Self, ApiError>;
}

/// A private trait for types that deserialize directly from the JSON body of
/// a successful response.
pub(crate) trait DataResponse: DeserializeOwned {}

impl<T: DataResponse> ApiResponse for T {
    fn from_response_parts(
        parts: http::response::Parts,
        mut body: impl Read,
    ) -> Result<Self, ApiError> {
        if !parts.status.is_success() {
            let mut buf = Vec::new();
            body.read_to_end(&mut buf)?;

            return Err(ApiError::Http {
                status: parts.status,
                body: String::from_utf8_lossy(&buf).into_owned(),
            });
        }

        let mut de = serde_json::Deserializer::from_reader(body);
        serde_path_to_error::deserialize(&mut de).map_err(|source| {
            tracing::error!("Failed to parse API response: {source:#?}");
            ApiError::InvalidResponse {
                status: parts.status,
                source,
            }
        })
    }
}

impl DataResponse for serde_json::Value {}
impl DataResponse for JsonObject {}

/// An authenticated GET against an arbitrary endpoint, returning the decoded
/// JSON body without any schema applied.
#[derive(Debug, Clone)]
pub struct Get<'a> {
    /// The endpoint, relative to the API URL.
    pub endpoint: &'a str,
    /// Extra query parameters.
    pub params: QueryParams,
}

impl ApiRequest for Get<'_> {
    type Response = serde_json::Value;

    fn path(&self) -> String {
        self.endpoint.to_owned()
    }

    fn query(&self) -> QueryParams {
        self.params.clone()
    }
}
