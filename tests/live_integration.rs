use cloud_http::{CallOptions, CloudClient};

#[tokio::test]
async fn live_get_against_configured_endpoint() {
    let client = match CloudClient::from_env() {
        Ok(client) => client,
        Err(_) => {
            eprintln!("skipping live test: CLOUD_HTTP_ENDPOINT not set");
            return;
        }
    };
    let resource = std::env::var("CLOUD_HTTP_LIVE_RESOURCE").unwrap_or_else(|_| "get".to_owned());

    let result = client
        .get(&resource, CallOptions::new().throw_on_error(true))
        .await;

    match result {
        Ok(result) => {
            assert_ne!(result.status_code(), 0);
            if result.is_ok() {
                assert!(!result.headers().is_empty());
            } else {
                assert!(result.headers().is_empty());
            }
        }
        Err(err) => panic!("live endpoint unreachable: {err}"),
    }
}
