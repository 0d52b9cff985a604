//! Running SQL queries.

use crate::api::{ApiRequest, JsonObject, QueryParams};

/// Run a SQL `SELECT` statement and return the JSON-formatted result.
///
/// The query is sent as-is with ` FORMAT JSON` appended, so it must not carry
/// its own `FORMAT` clause. It is not sanitized in any way.
#[derive(Debug, Clone)]
pub struct RunSelectQuery<'a> {
    /// The SQL statement.
    pub query: &'a str,
}

impl ApiRequest for RunSelectQuery<'_> {
    type Response = JsonObject;

    fn path(&self) -> String {
        "v0/sql".to_owned()
    }

    fn query(&self) -> QueryParams {
        QueryParams::new().with("q", format!("{} FORMAT JSON", self.query))
    }
}
