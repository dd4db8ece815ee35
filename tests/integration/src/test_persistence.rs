//! On-disk persistence integration tests.

#[cfg(test)]
mod tests {
    use gcstack_core::GcsConfig;
    use reqwest::StatusCode;
    use serde_json::Value;
    use tempfile::TempDir;

    use crate::{
        api_url, client, download_url, insert_bucket, start_server_with, upload_multipart,
    };

    fn disk_config(dir: &TempDir) -> GcsConfig {
        GcsConfig::builder()
            .gateway_listen("127.0.0.1:0".to_owned())
            .storage_base(dir.path().display().to_string())
            .build()
    }

    #[tokio::test]
    async fn test_should_keep_data_across_restart() {
        let dir = TempDir::new().expect("tempdir");
        let client = client();

        let mut server = start_server_with(disk_config(&dir)).await;
        insert_bucket(&client, &server, "durable").await;
        let resp = upload_multipart(&client, &server, "durable", "notes/a.txt", b"kept").await;
        assert_eq!(resp.status(), StatusCode::OK);
        server.stop().await;

        assert!(dir.path().join(".cloudstorage").is_dir());

        let mut server = start_server_with(disk_config(&dir)).await;
        let doc: Value = client
            .get(api_url(&server, "/b/durable"))
            .send()
            .await
            .expect("get bucket")
            .json()
            .await
            .expect("json");
        assert_eq!(doc["name"], "durable");

        let meta: Value = client
            .get(api_url(&server, "/b/durable/o/notes%2Fa.txt"))
            .send()
            .await
            .expect("get object")
            .json()
            .await
            .expect("json");
        assert_eq!(meta["size"], "4");
        assert_eq!(meta["contentType"], "text/plain");

        let content = client
            .get(download_url(&server, "/b/durable/o/notes/a.txt"))
            .send()
            .await
            .expect("download")
            .bytes()
            .await
            .expect("bytes");
        assert_eq!(content.as_ref(), b"kept");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_wipe_all_buckets() {
        let dir = TempDir::new().expect("tempdir");
        let client = client();

        let mut server = start_server_with(disk_config(&dir)).await;
        insert_bucket(&client, &server, "one").await;
        insert_bucket(&client, &server, "two").await;
        upload_multipart(&client, &server, "two", "f.txt", b"x").await;

        server.wipe().expect("wipe");

        let list: Value = client
            .get(api_url(&server, "/b"))
            .send()
            .await
            .expect("list")
            .json()
            .await
            .expect("json");
        assert!(
            list["items"]
                .as_array()
                .is_none_or(Vec::is_empty)
        );

        let (status, _) = insert_bucket(&client, &server, "one").await;
        assert_eq!(status, StatusCode::OK);
        server.stop().await;
    }
}
