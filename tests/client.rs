use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use tinybird::{ApiClient, ApiError, QueryParams};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const TOKEN: &str = "p.test-token";

fn column(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "type": "String",
        "codec": null,
        "default_value": null,
        "jsonpath": format!("$.{name}"),
        "nullable": false,
        "normalized_name": name,
    })
}

fn datasource(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "engine": {
            "engine": "MergeTree",
            "engine_sorting_key": "timestamp",
            "engine_partition_key": "toYYYYMM(timestamp)",
            "engine_primary_key": null,
        },
        "columns": [column("timestamp"), column("action")],
        "indexes": [],
        "new_columns_detected": {},
        "quarantine_rows": 0,
    })
}

fn client(server: &MockServer) -> ApiClient {
    // The trailing slash must not end up in request paths.
    ApiClient::new(&format!("{}/", server.uri()), TOKEN).unwrap()
}

/// All query parameters of the only request the server received.
async fn received_query(server: &MockServer) -> Vec<(String, String)> {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    requests[0].url.query_pairs().into_owned().collect()
}

#[tokio::test]
async fn construction_does_not_touch_the_network() {
    let server = MockServer::start().await;
    let client = client(&server);
    client.close();

    // Nothing listens here; construction must still succeed.
    let offline = ApiClient::new("http://127.0.0.1:9", TOKEN).unwrap();
    assert_eq!(offline.api_url(), "http://127.0.0.1:9");

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_data_sources_preserves_order() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let entries = vec![
        datasource("t_1", "events"),
        datasource("t_2", "users"),
        datasource("t_3", "sessions"),
    ];

    Mock::given(method("GET"))
        .and(path("/v0/datasources"))
        .and(query_param("attrs", "id,name,description,columns"))
        .and(query_param("token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "datasources": &entries })))
        .expect(1)
        .mount(&server)
        .await;

    let datasources = client(&server).list_data_sources().await?;

    let ids: Vec<_> = datasources.iter().map(|ds| ds.id.as_str()).collect();
    assert_eq!(ids, ["t_1", "t_2", "t_3"]);

    for (ds, raw) in datasources.iter().zip(&entries) {
        assert_eq!(serde_json::to_value(ds)?, *raw);
    }

    Ok(())
}

#[tokio::test]
async fn list_data_sources_missing_field() {
    let server = MockServer::start().await;

    Mock::given(path("/v0/datasources"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "datasources": [{ "id": "t_1", "name": "events" }] })),
        )
        .mount(&server)
        .await;

    let err = client(&server).list_data_sources().await.unwrap_err();
    assert_matches!(err, ApiError::InvalidResponse { .. });
}

#[tokio::test]
async fn get_data_source_returns_json_unmodified() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let body = json!({
        "id": "abc",
        "name": "events",
        "shared_with": ["other_workspace"],
        "columns": [{ "name": "a", "debug": { "x": 1 } }],
    });

    Mock::given(method("GET"))
        .and(path("/v0/datasources/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let result = client(&server).get_data_source("abc").await?;
    assert_eq!(serde_json::Value::Object(result), body);

    let query = received_query(&server).await;
    assert!(query.contains(&("debug".into(), "columns".into())));
    assert!(query.contains(&("include_workspace_names".into(), "true".into())));
    assert!(query.contains(&("token".into(), TOKEN.into())));

    Ok(())
}

#[tokio::test]
async fn list_pipes() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/pipes"))
        .and(query_param("attrs", "id,name,description,type,endpoint"))
        .and(query_param("token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pipes": [
                {
                    "type": "endpoint",
                    "id": "t_p1",
                    "name": "top_pages",
                    "description": "Most visited pages",
                    "endpoint": "t_node",
                    "url": "https://api.tinybird.co/v0/pipes/top_pages.json",
                },
                {
                    "type": "default",
                    "id": "t_p2",
                    "name": "scratch",
                    "description": null,
                    "endpoint": null,
                    "url": "https://api.tinybird.co/v0/pipes/scratch.json",
                },
            ]
        })))
        .mount(&server)
        .await;

    let pipes = client(&server).list_pipes().await?;
    assert_eq!(pipes.len(), 2);
    assert_eq!(pipes[0].name, "top_pages");
    assert_eq!(pipes[0].r#type, "endpoint");
    assert_eq!(pipes[1].description, None);

    Ok(())
}

#[tokio::test]
async fn get_pipe_sends_only_the_token() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/pipes/top_pages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "top_pages", "nodes": [] })))
        .mount(&server)
        .await;

    let pipe = client(&server).get_pipe("top_pages").await?;
    assert_eq!(pipe["name"], "top_pages");
    assert_eq!(received_query(&server).await, [("token".to_owned(), TOKEN.to_owned())]);

    Ok(())
}

#[tokio::test]
async fn get_pipe_data_passes_params() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/pipes/p.json"))
        .and(query_param("year", "2024"))
        .and(query_param("token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": [{ "name": "year", "type": "UInt16" }, { "name": "hits", "type": "UInt64" }],
            "data": [{ "year": 2024, "hits": 42 }],
            "rows": 1,
            "statistics": { "elapsed": 0.0002, "rows_read": 10, "bytes_read": 80 },
        })))
        .mount(&server)
        .await;

    let data = client(&server).get_pipe_data("p", [("year", 2024)]).await?;
    assert_eq!(data.rows, 1);
    assert_eq!(data.meta[1].name, "hits");
    assert_eq!(data.data[0]["hits"], 42);

    Ok(())
}

#[tokio::test]
async fn get_pipe_data_token_is_overwritten() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(path("/v0/pipes/p.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": [], "data": [], "rows": 0, "statistics": {},
        })))
        .mount(&server)
        .await;

    let params = QueryParams::new().with("token", "spoofed").with("year", 2024);
    client(&server).get_pipe_data("p", params).await?;

    let query = received_query(&server).await;
    let tokens: Vec<_> = query.iter().filter(|(k, _)| k == "token").collect();
    assert_eq!(tokens, [&("token".to_owned(), TOKEN.to_owned())]);
    assert!(query.contains(&("year".into(), "2024".into())));

    Ok(())
}

#[tokio::test]
async fn run_select_query_appends_format() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/sql"))
        .and(query_param("q", "SELECT 1 FORMAT JSON"))
        .and(query_param("token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": [{ "name": "1", "type": "UInt8" }],
            "data": [{ "1": 1 }],
            "rows": 1,
            "statistics": {},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).run_select_query("SELECT 1").await?;
    assert_eq!(result["rows"], 1);

    Ok(())
}

#[tokio::test]
async fn generic_get() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/tokens"))
        .and(query_param("token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;

    let value = client(&server).get("v0/tokens", QueryParams::new()).await?;
    assert_eq!(value, json!([1, 2, 3]));

    Ok(())
}

#[tokio::test]
async fn not_found_is_an_http_error_everywhere() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error": "not found"}"#))
        .mount(&server)
        .await;

    let client = client(&server);

    let errors = [
        client.list_data_sources().await.unwrap_err(),
        client.get_data_source("abc").await.unwrap_err(),
        client.list_pipes().await.unwrap_err(),
        client.get_pipe("p").await.unwrap_err(),
        client.get_pipe_data("p", QueryParams::new()).await.unwrap_err(),
        client.run_select_query("SELECT 1").await.unwrap_err(),
        client.get("v0/anything", QueryParams::new()).await.unwrap_err(),
    ];

    for err in errors {
        assert_matches!(
            err,
            ApiError::Http { status, ref body }
                if status == http::StatusCode::NOT_FOUND && body.contains("not found")
        );
    }
}

#[tokio::test]
async fn redirects_are_http_errors() {
    let server = MockServer::start().await;

    Mock::given(path("/v0/pipes/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/elsewhere"))
        .mount(&server)
        .await;
    Mock::given(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "moved": true })))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);
    assert_matches!(
        client.get_pipe("old").await,
        Err(ApiError::Http { status, .. }) if status == http::StatusCode::FOUND
    );
    assert_matches!(
        client.get("v0/pipes/old", QueryParams::new()).await,
        Err(ApiError::Http { status, .. }) if status.as_u16() == 302
    );
}

#[tokio::test]
async fn ids_are_sent_to_the_server_unvalidated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error": "not found"}"#))
        .mount(&server)
        .await;

    let client = client(&server);
    for id in ["my ds", "données"] {
        assert_matches!(
            client.get_data_source(id).await,
            Err(ApiError::Http { status, .. }) if status == http::StatusCode::NOT_FOUND
        );
    }
    assert_matches!(
        client.get_pipe("my pipe").await,
        Err(ApiError::Http { status, .. }) if status == http::StatusCode::NOT_FOUND
    );

    let paths: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|req| req.url.path().to_owned())
        .collect();
    assert_eq!(
        paths,
        [
            "/v0/datasources/my%20ds",
            "/v0/datasources/donn%C3%A9es",
            "/v0/pipes/my%20pipe",
        ]
    );
}

#[tokio::test]
async fn closed_client_fails_without_requests() {
    let server = MockServer::start().await;
    let client = client(&server);

    client.close();
    // Closing twice is fine.
    client.close();
    assert!(client.is_closed());

    assert_matches!(client.list_data_sources().await, Err(ApiError::Closed));
    assert_matches!(client.get_data_source("abc").await, Err(ApiError::Closed));
    assert_matches!(client.list_pipes().await, Err(ApiError::Closed));
    assert_matches!(client.get_pipe("p").await, Err(ApiError::Closed));
    assert_matches!(
        client.get_pipe_data("p", QueryParams::new()).await,
        Err(ApiError::Closed)
    );
    assert_matches!(client.run_select_query("SELECT 1").await, Err(ApiError::Closed));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn scoped_passes_results_through() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(path("/v0/pipes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pipes": [] })))
        .mount(&server)
        .await;

    let pipes = client(&server)
        .scoped(async |c| c.list_pipes().await)
        .await?;
    assert!(pipes.is_empty());

    // A failing scope still releases the client; the error is passed through.
    let res = client(&server)
        .scoped(async |c| c.get_pipe_data("missing", QueryParams::new()).await)
        .await;
    assert_matches!(res, Err(ApiError::Http { status, .. }) if status.as_u16() == 404);

    Ok(())
}

#[tokio::test]
async fn scoped_closes_the_client() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    let inside = client(&server).scoped(async |c| format!("{c:?}")).await;
    assert!(inside.contains("closed: false"));

    let client = client(&server);
    client.close();
    assert!(format!("{client:?}").contains("closed: true"));
    assert_matches!(client.get_pipe("p").await, Err(ApiError::Closed));

    Ok(())
}

#[tokio::test]
async fn concurrent_requests_share_one_client() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(path("/v0/sql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rows": 0 })))
        .expect(8)
        .mount(&server)
        .await;

    let client = Arc::new(client(&server));
    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.run_select_query(&format!("SELECT {i}")).await })
        })
        .collect();

    for task in tasks {
        task.await??;
    }

    Ok(())
}

#[tokio::test]
async fn transport_errors_surface() {
    // Port 9 (discard) is almost never listening locally.
    let client = ApiClient::new("http://127.0.0.1:9", TOKEN).unwrap();
    assert_matches!(client.list_pipes().await, Err(ApiError::Transport(_)));
}
