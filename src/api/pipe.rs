//! API operations concerning pipes.

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, DataResponse, JsonObject, QueryParams};

/// A pipe: a named, parameterizable query endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Pipe {
    /// The pipe type, e.g. `endpoint` or `materialized`.
    pub r#type: String,
    /// The pipe ID.
    pub id: String,
    /// The pipe name.
    pub name: String,
    /// A human-readable description.
    pub description: Option<String>,
    /// The ID of the node published as the endpoint, if any.
    pub endpoint: Option<String>,
    /// The URL the pipe's data can be fetched from.
    pub url: String,
}

/// The response to [`ListPipes`].
#[derive(Debug, Clone, Deserialize)]
pub struct PipeList {
    /// The pipes, in the order the API returned them.
    pub pipes: Vec<Pipe>,
}

impl DataResponse for PipeList {}

/// The name and type of a column in a result set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ColumnMeta {
    /// The column name.
    pub name: String,
    /// The column type.
    pub r#type: String,
}

/// One result set returned by a pipe.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipeData {
    /// The columns of the result set, in order.
    pub meta: Vec<ColumnMeta>,
    /// The rows, in order.
    pub data: Vec<JsonObject>,
    /// The number of rows.
    pub rows: u64,
    /// Query statistics (elapsed time, rows and bytes read).
    pub statistics: JsonObject,
}

impl DataResponse for PipeData {}

/// List all pipes in the workspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListPipes;

impl ApiRequest for ListPipes {
    type Response = PipeList;

    fn path(&self) -> String {
        "v0/pipes".to_owned()
    }

    fn query(&self) -> QueryParams {
        QueryParams::from([("attrs", "id,name,description,type,endpoint")])
    }
}

/// Load detailed information about a single pipe. The response is returned
/// as-is.
#[derive(Debug, Clone)]
pub struct GetPipe<'a> {
    /// The name (or ID) of the pipe.
    pub name: &'a str,
}

impl ApiRequest for GetPipe<'_> {
    type Response = JsonObject;

    fn path(&self) -> String {
        format!("v0/pipes/{}", self.name)
    }
}

/// Fetch the results of a pipe's endpoint.
#[derive(Debug, Clone)]
pub struct GetPipeData<'a> {
    /// The name of the pipe.
    pub name: &'a str,
    /// Pipe parameters, passed through verbatim. A `token` entry is
    /// overwritten with the client's token.
    pub params: QueryParams,
}

impl ApiRequest for GetPipeData<'_> {
    type Response = PipeData;

    fn path(&self) -> String {
        format!("v0/pipes/{}.json", self.name)
    }

    fn query(&self) -> QueryParams {
        self.params.clone()
    }
}
