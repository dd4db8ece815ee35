//! Routing, health check and common header integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::Value;

    use crate::{api_url, client, error_reason, insert_bucket, start_server};

    #[tokio::test]
    async fn test_should_answer_health_checks() {
        let server = start_server().await;
        let client = client();

        for path in ["/_health", "/health"] {
            let resp = client
                .get(format!("{}{path}", server.base_url()))
                .send()
                .await
                .expect("health");
            assert_eq!(resp.status(), StatusCode::OK);
            let doc: Value = resp.json().await.expect("json");
            assert_eq!(doc["status"], "running");
            assert_eq!(doc["service"], "storage");
        }
    }

    #[tokio::test]
    async fn test_should_return_not_found_for_unknown_path() {
        let server = start_server().await;
        let resp = client()
            .get(format!("{}/nothing/here", server.base_url()))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(error_reason(&doc), "notFound");
    }

    #[tokio::test]
    async fn test_should_not_implement_unregistered_verb() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "patchme").await;

        let resp = client
            .patch(api_url(&server, "/b/patchme"))
            .json(&serde_json::json!({ "storageClass": "NEARLINE" }))
            .send()
            .await
            .expect("patch");
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(error_reason(&doc), "notImplemented");
        assert_eq!(doc["error"]["code"], 501);
    }

    #[tokio::test]
    async fn test_should_set_common_headers() {
        let server = start_server().await;
        let client = client();

        let resp = client
            .get(api_url(&server, "/b"))
            .send()
            .await
            .expect("list");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["server"], "gcstack");
        assert!(
            resp.headers()["content-type"]
                .to_str()
                .expect("content type")
                .starts_with("application/json")
        );
        let first = resp.headers()["x-request-id"].clone();

        let resp = client
            .get(api_url(&server, "/b/missing"))
            .send()
            .await
            .expect("get");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_ne!(resp.headers()["x-request-id"], first);
    }
}
