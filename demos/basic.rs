use std::time::Duration;

use cloud_http::{CallOptions, ClientOptions, CloudClient};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let endpoint = std::env::var("CLOUD_HTTP_ENDPOINT")?;
    let token = std::env::var("CLOUD_HTTP_TOKEN").ok();

    let client = CloudClient::new(endpoint.clone()).with_options(ClientOptions {
        endpoint,
        auth_token: token,
        max_retries: 3,
        ..ClientOptions::default()
    });

    let created = client
        .post("anything", Some(&json!({"name": "Kit"})), ())
        .await?;
    println!("{created}");

    let fetched = client
        .get(
            "status/503",
            CallOptions::new()
                .timeout(Duration::from_secs(2))
                .throw_on_error(false),
        )
        .await?;
    if fetched.is_error() {
        println!("final error status {}: {:?}", fetched.status_code(), fetched.content());
    }

    Ok(())
}
