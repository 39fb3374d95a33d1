use serde_json::Value;

use crate::util::{client, connection_failure, endpoint, print_failure, print_json};

pub async fn run(base_url: &str) -> i32 {
    let resp = match client().get(endpoint(base_url, "/health")).send().await {
        Ok(resp) => resp,
        Err(e) => return connection_failure(&e),
    };
    let status = resp.status();
    let body: Value = match resp.json().await {
        Ok(body) => body,
        Err(e) => return print_failure("invalid_response", &e.to_string(), None),
    };
    if status.is_success() {
        print_json(&body)
    } else {
        print_failure(
            "server_unhealthy",
            &format!("health check returned {status}: {body}"),
            Some("Check the fixture directory the server was started with."),
        )
    }
}
