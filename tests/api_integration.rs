use instance_diff::store::{InMemoryStore, PayloadCache, TypeRegistry};
use instance_diff::{build_app, serve_app};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

// Test client wrapper for making API calls
struct TestClient {
    client: Client,
    base_url: String,
}

impl TestClient {
    async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let app = build_app(
            Arc::new(InMemoryStore::new()),
            Arc::new(PayloadCache::default()),
            Arc::new(TypeRegistry::new()),
        );
        tokio::spawn(async move {
            serve_app(app, listener).await.unwrap();
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{}", address),
        }
    }

    async fn post(&self, path: &str, json: Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.base_url, path))
            .json(&json)
            .send()
            .await
            .unwrap()
    }

    async fn put(&self, path: &str, json: Value) -> reqwest::Response {
        self.client
            .put(&format!("{}{}", self.base_url, path))
            .json(&json)
            .send()
            .await
            .unwrap()
    }

    async fn put_empty(&self, path: &str) -> reqwest::Response {
        self.client
            .put(&format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }

    async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(&format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let client = TestClient::spawn().await;
    let response = client.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_compare_cached_payloads_and_manage_sessions() {
    let client = TestClient::spawn().await;

    let response = client
        .put("/instances/prod/payload", json!({"x": 1, "y": 2}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = client.put("/instances/test/payload", json!({"x": 1, "y": 3})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(
            "/comparisons",
            json!({
                "name": "prod vs test",
                "typeId": "settings",
                "instanceIds": ["prod", "test"],
                "baseInstanceId": "prod"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let session: Value = response.json().await.unwrap();
    let session_id = session["id"].as_str().unwrap().to_string();
    assert_eq!(session["endpoint"], "/settings");
    assert_eq!(session["summary"]["totalDifferences"], 1);
    assert_eq!(session["results"][0]["path"], "y");
    assert_eq!(session["results"][0]["type"], "edited");
    assert_eq!(session["results"][0]["values"], json!({"prod": 2, "test": 3}));

    let active: Value = client.get("/sessions/active").await.json().await.unwrap();
    assert_eq!(active["id"], session_id.as_str());

    let listing: Value = client.get("/sessions").await.json().await.unwrap();
    assert_eq!(listing.as_array().unwrap().len(), 1);
    assert_eq!(listing[0]["active"], true);

    let plan_response = client
        .post(
            &format!("/sessions/{}/migration", session_id),
            json!({"sourceInstanceId": "prod", "targetInstanceId": "test", "units": ["y"]}),
        )
        .await;
    assert_eq!(plan_response.status(), StatusCode::OK);
    let plan: Value = plan_response.json().await.unwrap();
    assert_eq!(plan["payload"], json!({"y": 2}));
    assert_eq!(plan["sourceIsCurrent"], true);

    let unknown_target = client
        .post(
            &format!("/sessions/{}/migration", session_id),
            json!({"sourceInstanceId": "prod", "targetInstanceId": "qa", "units": ["y"]}),
        )
        .await;
    assert_eq!(unknown_target.status(), StatusCode::NOT_FOUND);

    let same_instance = client
        .post(
            &format!("/sessions/{}/migration", session_id),
            json!({"sourceInstanceId": "prod", "targetInstanceId": "prod", "units": ["y"]}),
        )
        .await;
    assert_eq!(same_instance.status(), StatusCode::BAD_REQUEST);

    let response = client.delete(&format!("/sessions/{}", session_id)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(client.get("/sessions/active").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        client.get(&format!("/sessions/{}", session_id)).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_inline_payloads_with_explicit_mode() {
    let client = TestClient::spawn().await;

    let response = client
        .post(
            "/comparisons",
            json!({
                "mode": {"kind": "arrayByIdentifier", "identifierField": "id", "fields": ["v"]},
                "instanceIds": ["a", "b"],
                "payloads": {
                    "a": [{"id": "f1", "v": true}],
                    "b": [{"id": "f1", "v": false}, {"id": "f2", "v": true}]
                }
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let session: Value = response.json().await.unwrap();
    assert_eq!(
        session["summary"],
        json!({"totalDifferences": 2, "added": 0, "deleted": 1, "edited": 1})
    );
    assert_eq!(
        session["results"][1]["values"],
        json!({"a": "MISSING", "b": {"v": true}})
    );
    assert!(session["name"].as_str().unwrap().starts_with("array comparison"));
}

#[tokio::test]
async fn test_rejected_runs_create_no_session() {
    let client = TestClient::spawn().await;

    let single = client
        .post(
            "/comparisons",
            json!({"typeId": "settings", "instanceIds": ["only"], "payloads": {"only": {}}}),
        )
        .await;
    assert_eq!(single.status(), StatusCode::BAD_REQUEST);
    let body: Value = single.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("at least 2 instances required"));

    let malformed = client
        .post(
            "/comparisons",
            json!({
                "mode": {"kind": "fieldSubsetOfObject", "fields": []},
                "instanceIds": ["a", "b"]
            }),
        )
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let unknown_type = client
        .post("/comparisons", json!({"typeId": "nope", "instanceIds": ["a", "b"]}))
        .await;
    assert_eq!(unknown_type.status(), StatusCode::NOT_FOUND);

    let listing: Value = client.get("/sessions").await.json().await.unwrap();
    assert!(listing.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_fetch_marks_instance_missing() {
    let client = TestClient::spawn().await;
    client.put("/instances/a/payload", json!({"x": 1})).await;
    client.put("/instances/b/payload", json!({"x": 1})).await;

    assert_eq!(client.delete("/instances/b/payload").await.status(), StatusCode::NO_CONTENT);
    assert_eq!(client.get("/instances/b/payload").await.status(), StatusCode::NOT_FOUND);

    let session: Value = client
        .post(
            "/comparisons",
            json!({"typeId": "settings", "instanceIds": ["a", "b"]}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(session["results"][0]["values"], json!({"a": 1, "b": "MISSING"}));
    assert_eq!(session["results"][0]["type"], "deleted");
}

#[tokio::test]
async fn test_custom_types_and_session_activation() {
    let client = TestClient::spawn().await;

    let response = client
        .post(
            "/comparison-types",
            json!({
                "id": "limits",
                "name": "Limits",
                "endpoint": "/limits",
                "shape": "object",
                "fields": ["rate"]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let types: Value = client.get("/comparison-types").await.json().await.unwrap();
    assert_eq!(types.as_array().unwrap().len(), 4);

    let payloads = json!({"a": {"rate": 1, "burst": 1}, "b": {"rate": 2, "burst": 9}});
    let first: Value = client
        .post(
            "/comparisons",
            json!({"typeId": "limits", "instanceIds": ["a", "b"], "payloads": payloads.clone()}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(first["summary"]["totalDifferences"], 1);
    assert_eq!(first["endpoint"], "/limits");

    let second: Value = client
        .post(
            "/comparisons",
            json!({"typeId": "limits", "instanceIds": ["b", "a"], "payloads": payloads}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_ne!(first["id"], second["id"]);

    let first_id = first["id"].as_str().unwrap();
    let response = client.put_empty(&format!("/sessions/{}/active", first_id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let active: Value = client.get("/sessions/active").await.json().await.unwrap();
    assert_eq!(active["id"], first_id);

    assert_eq!(
        client.delete("/comparison-types/settings").await.status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        client.delete("/comparison-types/limits").await.status(),
        StatusCode::NO_CONTENT
    );
}
