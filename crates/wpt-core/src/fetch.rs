//! Entry points that fetch a test result and normalize it in one call.

use crate::error::WptError;
use crate::http::client::HttpClient;
use crate::result::model::NormalizedResult;
use crate::result::normalize::normalize;

/// Fetch the result for `test_key` from the WebPageTest server at `base_url`
/// and normalize it, using a client with default settings.
pub async fn fetch_and_normalize(
    base_url: &str,
    test_key: &str,
) -> Result<NormalizedResult, WptError> {
    let client = HttpClient::new()?;
    fetch_and_normalize_with(&client, base_url, test_key).await
}

/// Same as [`fetch_and_normalize`] with a caller-configured client.
///
/// The body is only decoded once the transport step has succeeded.
pub async fn fetch_and_normalize_with(
    client: &HttpClient,
    base_url: &str,
    test_key: &str,
) -> Result<NormalizedResult, WptError> {
    let body = client.fetch_result(base_url, test_key).await?;
    normalize(&body)
}

/// Blocking variant of [`fetch_and_normalize`] for synchronous callers.
///
/// Drives the request on a private current-thread runtime, so it must not be
/// called from within an async context.
pub fn fetch_and_normalize_blocking(
    base_url: &str,
    test_key: &str,
) -> Result<NormalizedResult, WptError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(fetch_and_normalize(base_url, test_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorPhase;
    use httpmock::{Method::GET, MockServer};

    const SAMPLE: &str = include_str!("../testdata/jsonResult.json");

    #[tokio::test]
    async fn fetches_and_orders_runs() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/jsonResult.php")
                    .query_param("test", "abc123");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        r#"{"statusCode":200,"statusText":"Ok","data":{"testId":"abc123",
                        "runs":{"1":{"firstView":{"loadTime":1000}},"0":{"firstView":{"loadTime":900}}}}}"#,
                    );
            })
            .await;

        let result = fetch_and_normalize(&server.base_url(), "abc123")
            .await
            .expect("fetch should succeed");

        mock.assert_async().await;
        assert_eq!(result.status_code, 200);
        assert_eq!(result.data.info.test_id, "abc123");
        let times: Vec<i64> = result
            .data
            .first_views()
            .map(|v| v.metrics.load_time)
            .collect();
        assert_eq!(times, vec![900, 1000]);
    }

    #[tokio::test]
    async fn configured_client_fetches_sample() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jsonResult.php");
                then.status(200).body(SAMPLE);
            })
            .await;

        let client = HttpClient::builder().user_agent("wpt-test").build().unwrap();
        let result = fetch_and_normalize_with(&client, &format!("{}/", server.base_url()), "150310_7Q_1B4")
            .await
            .unwrap();

        assert!(result.is_complete());
        assert_eq!(result.data.runs.len(), 3);
        assert_eq!(result.data.info.successful_fv_runs, 3);
    }

    #[tokio::test]
    async fn invalid_body_is_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jsonResult.php");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let err = fetch_and_normalize(&server.base_url(), "abc")
            .await
            .unwrap_err();
        assert_eq!(err.phase(), ErrorPhase::Decode);
    }

    #[tokio::test]
    async fn error_status_is_not_decoded() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jsonResult.php");
                // A decodable body: only the status should decide the outcome.
                then.status(500).body(r#"{"statusCode":200,"data":{"runs":{}}}"#);
            })
            .await;

        let err = fetch_and_normalize(&server.base_url(), "abc")
            .await
            .unwrap_err();
        assert!(matches!(err, WptError::HttpStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let err = fetch_and_normalize("http://127.0.0.1:1", "abc")
            .await
            .unwrap_err();
        assert_eq!(err.phase(), ErrorPhase::Transport);
    }

    #[test]
    fn blocking_entry_point_fetches_result() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/jsonResult.php")
                .query_param("test", "150310_7Q_1B4");
            then.status(200).body(SAMPLE);
        });

        let result = fetch_and_normalize_blocking(&server.base_url(), "150310_7Q_1B4").unwrap();

        mock.assert();
        let ids: Vec<i64> = result.data.runs.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 10]);
    }

    #[test]
    fn blocking_entry_point_propagates_transport_error() {
        let err = fetch_and_normalize_blocking("http://127.0.0.1:1", "abc").unwrap_err();
        assert!(err.is_transport());
    }
}
