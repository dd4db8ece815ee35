//! Bucket lifecycle integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use crate::{api_url, client, error_reason, insert_bucket, start_server, upload_multipart};

    #[tokio::test]
    async fn test_should_create_bucket_then_conflict_on_repeat() {
        let server = start_server().await;
        let client = client();

        let (status, doc) = insert_bucket(&client, &server, "bucket1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(doc["name"], "bucket1");
        assert_eq!(doc["kind"], "storage#bucket");

        let (status, doc) = insert_bucket(&client, &server, "bucket1").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error_reason(&doc), "conflict");
        assert_eq!(doc["error"]["code"], 409);

        let list: Value = client
            .get(api_url(&server, "/b"))
            .send()
            .await
            .expect("list")
            .json()
            .await
            .expect("list json");
        let items = list["items"].as_array().expect("items");
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_should_require_bucket_name() {
        let server = start_server().await;
        let resp = client()
            .post(api_url(&server, "/b"))
            .json(&json!({ "location": "EU" }))
            .send()
            .await
            .expect("insert");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(error_reason(&doc), "required");
    }

    #[tokio::test]
    async fn test_should_reject_invalid_bucket_name() {
        let server = start_server().await;
        let (status, doc) = insert_bucket(&client(), &server, "Bad_Name!").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_reason(&doc), "invalid");
    }

    #[tokio::test]
    async fn test_should_list_each_bucket_once_after_unrelated_delete() {
        let server = start_server().await;
        let client = client();

        insert_bucket(&client, &server, "scratch").await;
        let resp = client
            .delete(api_url(&server, "/b/scratch"))
            .send()
            .await
            .expect("delete");
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        insert_bucket(&client, &server, "keeper").await;
        let list: Value = client
            .get(api_url(&server, "/b"))
            .send()
            .await
            .expect("list")
            .json()
            .await
            .expect("list json");
        let names: Vec<&str> = list["items"]
            .as_array()
            .expect("items")
            .iter()
            .filter_map(|b| b["name"].as_str())
            .collect();
        assert_eq!(names, ["keeper"]);
        assert_eq!(list["kind"], "storage#buckets");
    }

    #[tokio::test]
    async fn test_should_get_and_delete_bucket() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "photos").await;

        let resp = client
            .get(api_url(&server, "/b/photos"))
            .send()
            .await
            .expect("get");
        assert_eq!(resp.status(), StatusCode::OK);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(doc["location"], "US");
        assert_eq!(doc["storageClass"], "STANDARD");
        assert_eq!(
            doc["selfLink"],
            format!("{}/storage/v1/b/photos", server.base_url())
        );

        let resp = client
            .delete(api_url(&server, "/b/photos"))
            .send()
            .await
            .expect("delete");
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(server.storage().get_bucket("photos").is_none());

        let resp = client
            .get(api_url(&server, "/b/photos"))
            .send()
            .await
            .expect("get after delete");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(error_reason(&doc), "notFound");
    }

    #[tokio::test]
    async fn test_should_refuse_to_delete_non_empty_bucket() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "full").await;
        let resp = upload_multipart(&client, &server, "full", "keep.txt", b"data").await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = client
            .delete(api_url(&server, "/b/full"))
            .send()
            .await
            .expect("delete");
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        assert!(server.storage().get_bucket("full").is_some());
        let content = server
            .storage()
            .get_file("full", "keep.txt")
            .expect("object survives");
        assert_eq!(content.as_ref(), b"data");
    }

    #[tokio::test]
    async fn test_should_not_find_missing_bucket_on_delete() {
        let server = start_server().await;
        let resp = client()
            .delete(api_url(&server, "/b/ghost"))
            .send()
            .await
            .expect("delete");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
