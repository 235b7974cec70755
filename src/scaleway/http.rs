//! Direct JSON calls for Instances API endpoints `scaleway-rs` does not wrap.

use std::sync::LazyLock;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{ScalewayProvider, ScalewayProviderError};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const AUTH_HEADER: &str = "X-Auth-Token";

pub(super) const SCALEWAY_INSTANCE_API_BASE: &str = "https://api.scaleway.com/instance/v1";

static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// Builds a zoned Instances API URL.
pub(super) fn zone_url(zone: &str, path: &str) -> String {
    format!("{SCALEWAY_INSTANCE_API_BASE}/zones/{zone}/{path}")
}

/// Returns `true` when another page must be fetched.
pub(super) const fn has_more_pages(collected: usize, received: usize, total_count: u64) -> bool {
    received > 0 && (collected as u64) < total_count
}

impl ScalewayProvider {
    pub(super) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        resource: &'static str,
    ) -> Result<T, ScalewayProviderError> {
        let response = HTTP_CLIENT
            .get(url)
            .header(AUTH_HEADER, &self.config.secret_key)
            .query(query)
            .send()
            .await?;
        decode(response, resource).await
    }

    pub(super) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        resource: &'static str,
    ) -> Result<T, ScalewayProviderError> {
        let response = HTTP_CLIENT
            .post(url)
            .header(AUTH_HEADER, &self.config.secret_key)
            .json(body)
            .send()
            .await?;
        decode(response, resource).await
    }
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    resource: &'static str,
) -> Result<T, ScalewayProviderError> {
    let status = response.status();
    let body = response.bytes().await?;

    if status.is_success() {
        return serde_json::from_slice(&body).map_err(|err| ScalewayProviderError::Decode {
            resource,
            message: err.to_string(),
        });
    }

    Err(ScalewayProviderError::Api {
        resource,
        status: status.as_u16(),
        message: api_message(&body),
    })
}

/// Extracts the API error message, falling back to the raw body.
pub(super) fn api_message(body: &[u8]) -> String {
    serde_json::from_slice::<scaleway_rs::ScalewayApiError>(body).map_or_else(
        |_| String::from_utf8_lossy(body).into_owned(),
        |api_err| api_err.message,
    )
}
