use backon::{ExponentialBuilder, Retryable};
use tracing::error;
use url::Url;

/// Stateless POST helper for the OpenAI-compatible upstream.
///
/// Server errors (5xx) are retried under the given policy; everything
/// else, including 4xx, is returned to the caller for status mapping.
pub struct InferenceApi;

impl InferenceApi {
    pub async fn try_post<T>(
        client: reqwest::Client,
        url: Url,
        key: impl AsRef<str>,
        retry_policy: ExponentialBuilder,
        body: &T,
    ) -> Result<reqwest::Response, reqwest::Error>
    where
        T: serde::Serialize,
    {
        (|| async {
            let resp = client
                .post(url.clone())
                .bearer_auth(key.as_ref())
                .json(body)
                .send()
                .await?;
            if resp.status().is_server_error() {
                let status = resp.status();
                let err = resp.error_for_status().unwrap_err();
                error!("upstream server error (will retry): {}", status);
                return Err(err);
            }
            Ok(resp)
        })
        .retry(retry_policy)
        .await
    }
}
