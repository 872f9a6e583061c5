#[cfg(test)]
mod media_stream_tests {
    use lecturecast::app::{create_router, AppStateBuilder};
    use lecturecast::config::Config;
    use std::net::SocketAddr;
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    const FIXTURE_NAME: &str = "lecture.mp4";
    const FIXTURE_SIZE: usize = 4096;

    /// Deterministic fixture content so byte offsets are checkable.
    fn fixture_bytes() -> Vec<u8> {
        (0..FIXTURE_SIZE).map(|i| (i % 251) as u8).collect()
    }

    async fn start_server() -> (String, TempDir) {
        let media_dir = tempfile::tempdir().unwrap();
        let config = Config {
            media_dir: media_dir.path().to_string_lossy().to_string(),
            ..Default::default()
        };
        let state = AppStateBuilder::new().config(config).build().await.unwrap();
        tokio::fs::write(media_dir.path().join(FIXTURE_NAME), fixture_bytes())
            .await
            .unwrap();

        let app = create_router(state);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });
        (format!("http://{}", addr), media_dir)
    }

    fn header(resp: &reqwest::Response, name: &str) -> String {
        resp.headers()
            .get(name)
            .unwrap_or_else(|| panic!("missing header {}", name))
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_full_download_without_range() {
        let (base, _dir) = start_server().await;

        let resp = reqwest::get(format!("{}/media/{}", base, FIXTURE_NAME))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(header(&resp, "content-type"), "video/mp4");
        assert_eq!(header(&resp, "accept-ranges"), "bytes");
        assert_eq!(header(&resp, "content-length"), FIXTURE_SIZE.to_string());
        assert!(resp.headers().get("content-range").is_none());

        let body = resp.bytes().await.unwrap();
        assert_eq!(&body[..], &fixture_bytes()[..]);
    }

    #[tokio::test]
    async fn test_exact_range_returns_those_bytes() {
        let (base, _dir) = start_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .get(format!("{}/media/{}", base, FIXTURE_NAME))
            .header("Range", "bytes=0-1023")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 206);
        assert_eq!(header(&resp, "content-range"), "bytes 0-1023/4096");
        assert_eq!(header(&resp, "content-length"), "1024");

        let body = resp.bytes().await.unwrap();
        assert_eq!(body.len(), 1024);
        assert_eq!(&body[..], &fixture_bytes()[0..1024]);
    }

    #[tokio::test]
    async fn test_open_ended_range_runs_to_eof() {
        let (base, _dir) = start_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .get(format!("{}/media/{}", base, FIXTURE_NAME))
            .header("Range", "bytes=2048-")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 206);
        assert_eq!(header(&resp, "content-range"), "bytes 2048-4095/4096");

        let body = resp.bytes().await.unwrap();
        assert_eq!(body.len(), 2048);
        assert_eq!(&body[..], &fixture_bytes()[2048..]);
    }

    #[tokio::test]
    async fn test_range_end_clamped_to_file_size() {
        let (base, _dir) = start_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .get(format!("{}/media/{}", base, FIXTURE_NAME))
            .header("Range", "bytes=4000-999999")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 206);
        assert_eq!(header(&resp, "content-range"), "bytes 4000-4095/4096");

        let body = resp.bytes().await.unwrap();
        assert_eq!(body.len(), 96);
        assert_eq!(&body[..], &fixture_bytes()[4000..]);
    }

    #[tokio::test]
    async fn test_bad_ranges_get_416_with_total_size() {
        let (base, _dir) = start_server().await;
        let client = reqwest::Client::new();

        for range in ["bytes=-512", "bytes=4096-", "bytes=9-2", "chunks=0-10"] {
            let resp = client
                .get(format!("{}/media/{}", base, FIXTURE_NAME))
                .header("Range", range)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 416, "range {:?}", range);
            assert_eq!(
                header(&resp, "content-range"),
                "bytes */4096",
                "range {:?}",
                range
            );
            let body: serde_json::Value = resp.json().await.unwrap();
            assert_eq!(body["error"], "invalid_range");
        }
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_names_are_404() {
        let (base, _dir) = start_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .get(format!("{}/media/nope.mp4", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "not_found");

        // dotfiles are not served, the staging area stays private
        let resp = client
            .get(format!("{}/media/.staging", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        // an encoded slash must not escape the media directory
        let resp = client
            .get(format!("{}/media/..%2F..%2Fetc%2Fpasswd", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_head_reports_metadata_without_body() {
        let (base, _dir) = start_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .head(format!("{}/media/{}", base, FIXTURE_NAME))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(header(&resp, "accept-ranges"), "bytes");
        assert_eq!(header(&resp, "content-length"), FIXTURE_SIZE.to_string());
        assert!(resp.bytes().await.unwrap().is_empty());

        let resp = client
            .head(format!("{}/media/{}", base, FIXTURE_NAME))
            .header("Range", "bytes=0-99")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 206);
        assert_eq!(header(&resp, "content-range"), "bytes 0-99/4096");
        assert!(resp.bytes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_identical_ranges_are_reproducible() {
        let (base, _dir) = start_server().await;
        let client = reqwest::Client::new();
        let url = format!("{}/media/{}", base, FIXTURE_NAME);

        let first = client
            .get(&url)
            .header("Range", "bytes=100-299")
            .send()
            .await
            .unwrap();
        let first_range = header(&first, "content-range");
        let first_body = first.bytes().await.unwrap();

        let second = client
            .get(&url)
            .header("Range", "bytes=100-299")
            .send()
            .await
            .unwrap();
        assert_eq!(header(&second, "content-range"), first_range);
        assert_eq!(second.bytes().await.unwrap(), first_body);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (base, _dir) = start_server().await;

        let resp = reqwest::get(format!("{}/health", base)).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert!(body["version"].is_string());
    }
}
