use std::{
    io::Cursor,
    sync::{Mutex, PoisonError},
    time,
};

use http_body_util::BodyExt as _;
use tracing::debug;

use crate::{
    ApiError, ApiRequest, ApiResponse, JsonObject, Profile, QueryParams,
    api::Get,
    datasource::{DataSource, GetDataSource, ListDataSources},
    pipe::{GetPipe, GetPipeData, ListPipes, Pipe, PipeData},
    sql::RunSelectQuery,
};

/// The timeout applied to every request, unless overridden at construction.
pub const DEFAULT_TIMEOUT: time::Duration = time::Duration::from_secs(30);

/// An async client for the API.
///
/// The client owns a single pooled HTTP connection context, shared by every
/// operation. Operations take `&self`, so a client can be shared between
/// tasks (for example in an `Arc`) and used concurrently.
///
/// The connection is released by [`ApiClient::close`], at the end of
/// [`ApiClient::scoped`], or when the client is dropped. Operations on a
/// closed client fail with [`ApiError::Closed`].
pub struct ApiClient {
    profile: Profile,
    http: Mutex<Option<reqwest::Client>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("profile", &self.profile)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ApiClient {
    /// Create a client for the API at `api_url`, authenticating with
    /// `token`. Any trailing slashes on the URL are removed.
    ///
    /// No network calls are made, and the URL is not validated until the
    /// first request.
    pub fn new(api_url: &str, token: impl Into<String>) -> Result<Self, ApiError> {
        let profile = Profile::new(api_url.trim_end_matches('/'), token);
        Self::from_profile(&profile, None)
    }

    /// Create a client from a resolved [`Profile`], optionally overriding
    /// [`DEFAULT_TIMEOUT`].
    pub fn from_profile(
        profile: &Profile,
        timeout: Option<time::Duration>,
    ) -> Result<Self, ApiError> {
        // Redirects are reported as HTTP errors, never followed.
        let http = reqwest::Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let profile = Profile {
            api_url: profile.api_url.trim_end_matches('/').to_owned(),
            ..profile.clone()
        };

        Ok(Self {
            profile,
            http: Mutex::new(Some(http)),
        })
    }

    /// The base URL requests are sent to.
    pub fn api_url(&self) -> &str {
        &self.profile.api_url
    }

    /// Run `f` with this client, then close it, returning whatever `f`
    /// returned. The client is released even if `f` fails or panics.
    ///
    /// ```no_run
    /// # async fn example() -> Result<(), tinybird::ApiError> {
    /// let client = tinybird::ApiClient::new("https://api.tinybird.co", "p.token")?;
    /// let pipes = client
    ///     .scoped(async |client| client.list_pipes().await)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scoped<F, T>(self, f: F) -> T
    where
        F: AsyncFnOnce(&ApiClient) -> T,
    {
        let out = f(&self).await;
        self.close();
        out
    }

    /// Release the underlying connection pool. Requests already in flight
    /// complete; subsequent ones fail with [`ApiError::Closed`]. Closing an
    /// already closed client does nothing.
    pub fn close(&self) {
        if self.slot().take().is_some() {
            debug!(api_url = %self.profile.api_url, "client closed");
        }
    }

    /// Whether [`ApiClient::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.slot().is_none()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<reqwest::Client>> {
        // The slot is only ever swapped, so a panic elsewhere can't leave it
        // inconsistent.
        self.http.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send any [`ApiRequest`] and decode its response.
    pub async fn roundtrip<T: ApiRequest>(&self, req: T) -> Result<T::Response, ApiError> {
        let http = self.slot().clone().ok_or(ApiError::Closed)?;

        let req = req.into_request(&self.profile)?;
        debug!(method = %req.method(), path = req.uri().path(), "sending request");

        let req: reqwest::Request = req.try_into()?;
        let resp: http::Response<reqwest::Body> = http.execute(req).await?.into();

        let (parts, body) = resp.into_parts();
        let bytes = body.collect().await?.to_bytes();
        debug!(status = %parts.status, len = bytes.len(), "received response");

        T::Response::from_response_parts(parts, Cursor::new(bytes))
    }

    /// Send an authenticated GET to `endpoint` (relative to the API URL) and
    /// return the decoded JSON body, without applying any schema.
    pub async fn get(
        &self,
        endpoint: &str,
        params: impl Into<QueryParams>,
    ) -> Result<serde_json::Value, ApiError> {
        self.roundtrip(Get {
            endpoint,
            params: params.into(),
        })
        .await
    }

    /// List all data sources.
    pub async fn list_data_sources(&self) -> Result<Vec<DataSource>, ApiError> {
        Ok(self.roundtrip(ListDataSources).await?.datasources)
    }

    /// Get detailed information about a data source, as returned by the API.
    pub async fn get_data_source(&self, datasource_id: &str) -> Result<JsonObject, ApiError> {
        self.roundtrip(GetDataSource { id: datasource_id }).await
    }

    /// List all pipes.
    pub async fn list_pipes(&self) -> Result<Vec<Pipe>, ApiError> {
        Ok(self.roundtrip(ListPipes).await?.pipes)
    }

    /// Get detailed information about a pipe, as returned by the API.
    pub async fn get_pipe(&self, pipe_name: &str) -> Result<JsonObject, ApiError> {
        self.roundtrip(GetPipe { name: pipe_name }).await
    }

    /// Fetch data from a pipe, passing `params` as pipe parameters. A `token`
    /// entry in `params` is replaced by the client's token.
    ///
    /// ```no_run
    /// # async fn example(client: &tinybird::ApiClient) -> Result<(), tinybird::ApiError> {
    /// let data = client.get_pipe_data("top_pages", [("year", 2024)]).await?;
    /// println!("{} rows", data.rows);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_pipe_data(
        &self,
        pipe_name: &str,
        params: impl Into<QueryParams>,
    ) -> Result<PipeData, ApiError> {
        self.roundtrip(GetPipeData {
            name: pipe_name,
            params: params.into(),
        })
        .await
    }

    /// Run a SQL `SELECT` statement. ` FORMAT JSON` is appended to the query.
    pub async fn run_select_query(&self, query: &str) -> Result<JsonObject, ApiError> {
        self.roundtrip(RunSelectQuery { query }).await
    }
}
