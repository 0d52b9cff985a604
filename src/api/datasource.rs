//! API operations concerning data sources.

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, DataResponse, JsonObject, QueryParams};

/// A column in a data source schema.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Column {
    /// The column name.
    pub name: String,
    /// The column type, e.g. `Nullable(String)`.
    pub r#type: String,
    /// The compression codec, if any.
    pub codec: Option<String>,
    /// The default value expression, if any.
    pub default_value: Option<String>,
    /// The JSONPath the column is extracted from, for NDJSON data sources.
    pub jsonpath: Option<String>,
    /// Whether the column is nullable.
    pub nullable: bool,
    /// The column name after normalization.
    pub normalized_name: String,
}

/// The storage engine configuration of a data source.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Engine {
    /// The engine kind, e.g. `MergeTree`.
    pub engine: String,
    /// The sorting key.
    pub engine_sorting_key: String,
    /// The partition key.
    pub engine_partition_key: String,
    /// The primary key, if different from the sorting key.
    pub engine_primary_key: Option<String>,
}

/// A data source: a named, schema-bearing ingest table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DataSource {
    /// The data source ID.
    pub id: String,
    /// The data source name.
    pub name: String,
    /// The storage engine.
    pub engine: Engine,
    /// The schema, in order.
    pub columns: Vec<Column>,
    /// Index descriptors. Opaque.
    pub indexes: Vec<serde_json::Value>,
    /// Columns detected in ingested data but not yet in the schema.
    pub new_columns_detected: JsonObject,
    /// The number of rows in quarantine.
    pub quarantine_rows: u64,
}

/// The response to [`ListDataSources`].
#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceList {
    /// The data sources, in the order the API returned them.
    pub datasources: Vec<DataSource>,
}

impl DataResponse for DataSourceList {}

/// List all data sources in the workspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListDataSources;

impl ApiRequest for ListDataSources {
    type Response = DataSourceList;

    fn path(&self) -> String {
        "v0/datasources".to_owned()
    }

    fn query(&self) -> QueryParams {
        QueryParams::from([("attrs", "id,name,description,columns")])
    }
}

/// Load detailed information about a single data source.
///
/// The response is returned as-is, with debug column information and
/// workspace names included.
#[derive(Debug, Clone)]
pub struct GetDataSource<'a> {
    /// The ID (or name) of the data source.
    pub id: &'a str,
}

impl ApiRequest for GetDataSource<'_> {
    type Response = JsonObject;

    fn path(&self) -> String {
        format!("v0/datasources/{}", self.id)
    }

    fn query(&self) -> QueryParams {
        QueryParams::from([("debug", "columns"), ("include_workspace_names", "true")])
    }
}
