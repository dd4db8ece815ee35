//! Object upload, read, list and delete integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        BOUNDARY, api_url, client, download_url, error_reason, insert_bucket, multipart_body,
        start_server, upload_multipart, upload_url,
    };

    #[tokio::test]
    async fn test_should_upload_multipart_then_download() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "bucket1").await;

        let resp = upload_multipart(&client, &server, "bucket1", "f.txt", b"hello").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(doc["name"], "f.txt");
        assert_eq!(doc["bucket"], "bucket1");
        assert_eq!(doc["size"], "5");
        assert_eq!(doc["md5Hash"], "XUFAKrxLKna5cZ2REBfFkg==");
        assert_eq!(doc["crc32c"], "mnG7TA==");

        let resp = client
            .get(download_url(&server, "/b/bucket1/o/f.txt?alt=media"))
            .send()
            .await
            .expect("download");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/plain");
        assert_eq!(resp.bytes().await.expect("bytes").as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_should_follow_media_link() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "links").await;

        let doc: Value = upload_multipart(&client, &server, "links", "dir/a b.txt", b"spaced")
            .await
            .json()
            .await
            .expect("json");
        let media_link = doc["mediaLink"].as_str().expect("mediaLink");

        let resp = client.get(media_link).send().await.expect("media link");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.bytes().await.expect("bytes").as_ref(), b"spaced");

        let self_link = doc["selfLink"].as_str().expect("selfLink");
        let meta: Value = client
            .get(self_link)
            .send()
            .await
            .expect("self link")
            .json()
            .await
            .expect("json");
        assert_eq!(meta["name"], "dir/a b.txt");
    }

    #[tokio::test]
    async fn test_should_upload_media_with_query_name() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "media").await;

        let resp = client
            .post(upload_url(&server, "/b/media/o?uploadType=media&name=logs%2Fday1.log"))
            .header("content-type", "text/x-log")
            .body("line one\nline two\n")
            .send()
            .await
            .expect("media upload");
        assert_eq!(resp.status(), StatusCode::OK);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(doc["name"], "logs/day1.log");
        assert_eq!(doc["contentType"], "text/x-log");
        assert_eq!(doc["size"], "18");

        let resp = client
            .get(api_url(&server, "/b/media/o/logs%2Fday1.log?alt=media"))
            .send()
            .await
            .expect("get media");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.bytes().await.expect("bytes").as_ref(),
            b"line one\nline two\n"
        );
    }

    #[tokio::test]
    async fn test_should_reject_upload_without_upload_type() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "bucket1").await;

        let resp = client
            .post(upload_url(&server, "/b/bucket1/o"))
            .header("content-type", format!("multipart/related; boundary={BOUNDARY}"))
            .body(multipart_body(&json!({ "name": "f.txt" }), "text/plain", b"hello"))
            .send()
            .await
            .expect("upload");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(error_reason(&doc), "required");
    }

    #[tokio::test]
    async fn test_should_reject_malformed_multipart() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "bucket1").await;

        let body = format!("--{BOUNDARY}\r\n\r\n{{\"name\":\"x\"}}\r\n--{BOUNDARY}--\r\n");
        let resp = client
            .post(upload_url(&server, "/b/bucket1/o?uploadType=multipart"))
            .header("content-type", format!("multipart/related; boundary={BOUNDARY}"))
            .body(body)
            .send()
            .await
            .expect("upload");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let doc: Value = resp.json().await.expect("json");
        assert_eq!(error_reason(&doc), "badRequest");
    }

    #[tokio::test]
    async fn test_should_not_upload_into_missing_bucket() {
        let server = start_server().await;
        let resp = upload_multipart(&client(), &server, "nobucket", "f.txt", b"x").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_should_overwrite_object() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "ow").await;
        upload_multipart(&client, &server, "ow", "f.txt", b"first").await;
        let doc: Value = upload_multipart(&client, &server, "ow", "f.txt", b"second!")
            .await
            .json()
            .await
            .expect("json");
        assert_eq!(doc["size"], "7");

        let content = client
            .get(download_url(&server, "/b/ow/o/f.txt"))
            .send()
            .await
            .expect("download")
            .bytes()
            .await
            .expect("bytes");
        assert_eq!(content.as_ref(), b"second!");
    }

    #[tokio::test]
    async fn test_should_list_objects_by_prefix() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "tree").await;
        for name in ["a/1.txt", "a/2.txt", "b/1.txt"] {
            upload_multipart(&client, &server, "tree", name, b"x").await;
        }

        let list: Value = client
            .get(api_url(&server, "/b/tree/o?prefix=a/"))
            .send()
            .await
            .expect("list")
            .json()
            .await
            .expect("json");
        let names: Vec<&str> = list["items"]
            .as_array()
            .expect("items")
            .iter()
            .filter_map(|o| o["name"].as_str())
            .collect();
        assert_eq!(names, ["a/1.txt", "a/2.txt"]);

        let all: Value = client
            .get(api_url(&server, "/b/tree/o"))
            .send()
            .await
            .expect("list")
            .json()
            .await
            .expect("json");
        assert_eq!(all["items"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn test_should_delete_object() {
        let server = start_server().await;
        let client = client();
        insert_bucket(&client, &server, "del").await;
        upload_multipart(&client, &server, "del", "gone.txt", b"bye").await;

        let resp = client
            .delete(api_url(&server, "/b/del/o/gone.txt"))
            .send()
            .await
            .expect("delete");
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = client
            .get(api_url(&server, "/b/del/o/gone.txt"))
            .send()
            .await
            .expect("get");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = client
            .delete(api_url(&server, "/b/del/o/gone.txt"))
            .send()
            .await
            .expect("delete again");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = client
            .delete(api_url(&server, "/b/del"))
            .send()
            .await
            .expect("delete bucket");
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
}
