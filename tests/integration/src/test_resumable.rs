//! Resumable upload protocol integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use crate::{client, download_url, error_reason, insert_bucket, start_server, upload_url};

    /// Initiate a session and return the `Location` URL.
    async fn initiate(
        client: &reqwest::Client,
        server: &gcstack_http::Server,
        bucket: &str,
        meta: &Value,
    ) -> String {
        let resp = client
            .post(upload_url(server, &format!("/b/{bucket}/o?uploadType=resumable")))
            .header("x-upload-content-type", "application/x-tar")
            .json(meta)
            .send()
            .await
            .expect("initiate");
        assert_eq!(resp.status(), StatusCode::OK);
        resp.headers()["location"]
            .to_str()
            .expect("location header")
            .to_owned()
    }

    #[tokio::test]
    async fn test_should_finalize_exactly_once() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "big").await;

        let location = initiate(&client, &server, "big", &json!({ "name": "archive.tar" })).await;
        assert!(location.starts_with(&upload_url(&server, "/b/big/o?uploadType=resumable&upload_id=")));
        assert!(server.storage().get_file_obj("big", "archive.tar").is_err());

        let resp = client
            .put(&location)
            .body(vec![7_u8; 1024])
            .send()
            .await
            .expect("finalize");
        assert_eq!(resp.status(), StatusCode::OK);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(doc["name"], "archive.tar");
        assert_eq!(doc["size"], "1024");
        assert_eq!(doc["contentType"], "application/x-tar");

        let record = server
            .storage()
            .get_file_obj("big", "archive.tar")
            .expect("object after finalize");
        assert_eq!(record.size, 1024);

        let resp = client
            .put(&location)
            .body("again")
            .send()
            .await
            .expect("second finalize");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(error_reason(&doc), "notFound");

        let content = client
            .get(download_url(&server, "/b/big/o/archive.tar"))
            .send()
            .await
            .expect("download")
            .bytes()
            .await
            .expect("bytes");
        assert_eq!(content.len(), 1024);
    }

    #[tokio::test]
    async fn test_should_take_name_from_query_without_body() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "q").await;

        let resp = client
            .post(upload_url(&server, "/b/q/o?uploadType=resumable&name=from-query.bin"))
            .send()
            .await
            .expect("initiate");
        assert_eq!(resp.status(), StatusCode::OK);
        let location = resp.headers()["location"].to_str().expect("location").to_owned();

        let doc: Value = client
            .put(&location)
            .body("payload")
            .send()
            .await
            .expect("finalize")
            .json()
            .await
            .expect("json");
        assert_eq!(doc["name"], "from-query.bin");
        assert_eq!(doc["contentType"], "application/octet-stream");
    }

    #[tokio::test]
    async fn test_should_reject_session_for_missing_bucket() {
        let server = start_server().await;
        let resp = client()
            .post(upload_url(&server, "/b/missing/o?uploadType=resumable"))
            .json(&json!({ "name": "x" }))
            .send()
            .await
            .expect("initiate");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_should_not_implement_partial_chunks() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "chunks").await;
        let location = initiate(&client, &server, "chunks", &json!({ "name": "c.bin" })).await;

        let resp = client
            .put(&location)
            .header("content-range", "bytes 0-3/*")
            .body("abcd")
            .send()
            .await
            .expect("chunk");
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);

        // The session is still open for a single-shot finalize.
        let resp = client
            .put(&location)
            .body("abcd")
            .send()
            .await
            .expect("finalize");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_not_finalize_part_of_a_known_size() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "sized").await;
        let location = initiate(&client, &server, "sized", &json!({ "name": "ten.bin" })).await;

        let resp = client
            .put(&location)
            .header("content-range", "bytes 0-4/10")
            .body("01234")
            .send()
            .await
            .expect("first half");
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(error_reason(&doc), "notImplemented");

        let resp = client
            .put(&location)
            .header("content-range", "bytes 0-9/10")
            .body("01234")
            .send()
            .await
            .expect("short body");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(server.storage().get_file_obj("sized", "ten.bin").is_err());

        let resp = client
            .put(&location)
            .header("content-range", "bytes 0-9/10")
            .body("0123456789")
            .send()
            .await
            .expect("whole object");
        assert_eq!(resp.status(), StatusCode::OK);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(doc["size"], "10");
    }

    #[tokio::test]
    async fn test_should_finalize_empty_upload() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "empty").await;
        let location = initiate(&client, &server, "empty", &json!({ "name": "zero" })).await;

        let resp = client
            .put(&location)
            .header("content-range", "bytes */0")
            .send()
            .await
            .expect("finalize");
        assert_eq!(resp.status(), StatusCode::OK);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(doc["size"], "0");
    }

    #[tokio::test]
    async fn test_should_reject_unknown_session() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "b1").await;

        let resp = client
            .put(upload_url(&server, "/b/b1/o?uploadType=resumable&upload_id=nope"))
            .body("x")
            .send()
            .await
            .expect("finalize");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = client
            .put(upload_url(&server, "/b/b1/o?uploadType=resumable"))
            .body("x")
            .send()
            .await
            .expect("finalize without id");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(error_reason(&doc), "required");
    }
}
