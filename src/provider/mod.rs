pub mod retry;
pub mod transport;

use crate::{
    config::ProviderConfig,
    error::{GatewayError, Result},
    logger,
    models::GenerationRequest,
};
use serde_json::Value;
use std::sync::Arc;

pub use retry::RetryPolicy;
pub use transport::{ProviderTransport, RawResponse, ReqwestTransport, TransportError};

/// Client for the hosted image-generation provider. Maps each request
/// variant to the provider payload, sends it with the configured
/// timeouts, and classifies every failure before surfacing it.
#[derive(Clone)]
pub struct ProviderClient {
    transport: Arc<dyn ProviderTransport>,
    endpoint_url: String,
    credential: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("endpoint_url", &self.endpoint_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ProviderClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(
            config.connect_timeout,
            config.total_timeout,
        ));
        Self::with_transport(config, transport)
    }

    /// Build against a caller-supplied transport. Tests use this to
    /// script provider replies.
    pub fn with_transport(
        config: ProviderConfig,
        transport: Arc<dyn ProviderTransport>,
    ) -> Result<Self> {
        let endpoint_url = config
            .endpoint_url
            .ok_or_else(|| GatewayError::Config("Provider endpoint URL is required".into()))?;
        let credential = config
            .credential
            .ok_or_else(|| GatewayError::Config("Provider credential is required".into()))?;

        Ok(Self {
            transport,
            endpoint_url,
            credential,
            retry: RetryPolicy::new(config.max_retries),
        })
    }

    /// Image generation, with the bounded retry loop for rate limits,
    /// timeouts and transport faults.
    pub async fn generate_image(&self, request: crate::models::ImageGeneration) -> Result<Value> {
        self.send_with_retry(GenerationRequest::from(request)).await
    }

    /// Background replacement. Single attempt, no retry.
    pub async fn change_background(
        &self,
        request: crate::models::BackgroundChange,
    ) -> Result<Value> {
        self.send_once(GenerationRequest::from(request)).await
    }

    /// Pose generation. Single attempt, no retry.
    pub async fn generate_pose(&self, request: crate::models::PoseGeneration) -> Result<Value> {
        self.send_once(GenerationRequest::from(request)).await
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.credential),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
        ]
    }

    async fn send_with_retry(&self, request: GenerationRequest) -> Result<Value> {
        let request_id = logger::request_id();
        let payload = request.provider_payload();
        let headers = self.auth_headers();

        log::info!(
            "[req:{}] Sending {} request to provider: {}",
            request_id,
            request.generation_type(),
            payload
        );

        for attempt in 0..self.retry.total_attempts() {
            let is_last = attempt + 1 == self.retry.total_attempts();

            match self
                .transport
                .post_json(&self.endpoint_url, &headers, &payload)
                .await
            {
                Ok(response) => {
                    log_response(&request_id, &response);
                    match response.status {
                        200 => return parse_body(&response.body),
                        429 => {
                            if is_last {
                                log::error!(
                                    "[req:{}] Rate limit persisted after {} attempts",
                                    request_id,
                                    self.retry.total_attempts()
                                );
                                return Err(GatewayError::RateLimited);
                            }
                            let wait = self.retry.backoff_for(attempt);
                            log::warn!(
                                "[req:{}] Rate limited, retrying in {}s...",
                                request_id,
                                wait.as_secs()
                            );
                            tokio::time::sleep(wait).await;
                        }
                        status => {
                            log::error!(
                                "[req:{}] Provider returned {}: {}",
                                request_id,
                                status,
                                response.body
                            );
                            return Err(GatewayError::UpstreamHttp {
                                status,
                                body: response.body,
                            });
                        }
                    }
                }
                Err(TransportError::Timeout) => {
                    if is_last {
                        log::error!("[req:{}] Request timed out, retries exhausted", request_id);
                        return Err(GatewayError::UpstreamTimeout);
                    }
                    log::warn!(
                        "[req:{}] Request timed out, retrying ({}/{})...",
                        request_id,
                        attempt + 1,
                        self.retry.max_retries
                    );
                }
                Err(TransportError::Other(message)) => {
                    if is_last {
                        log::error!("[req:{}] Transport error: {}", request_id, message);
                        return Err(GatewayError::Transport(message));
                    }
                    log::warn!(
                        "[req:{}] Transport error on attempt {}: {}, retrying...",
                        request_id,
                        attempt + 1,
                        message
                    );
                }
            }
        }

        // total_attempts() is at least 1, so the loop always returns.
        Err(GatewayError::Internal("retry loop exhausted".into()))
    }

    async fn send_once(&self, request: GenerationRequest) -> Result<Value> {
        let request_id = logger::request_id();
        let payload = request.provider_payload();

        log::info!(
            "[req:{}] Sending {} request to provider: {}",
            request_id,
            request.generation_type(),
            payload
        );

        let response = self
            .transport
            .post_json(&self.endpoint_url, &self.auth_headers(), &payload)
            .await
            .map_err(|e| {
                log::error!("[req:{}] Error: {}", request_id, e);
                GatewayError::Internal(e.to_string())
            })?;

        log_response(&request_id, &response);

        match response.status {
            200 => parse_body(&response.body),
            status => Err(GatewayError::UpstreamHttp {
                status,
                body: response.body,
            }),
        }
    }
}

fn log_response(request_id: &str, response: &RawResponse) {
    log::info!("[req:{}] Response status: {}", request_id, response.status);
    log::debug!(
        "[req:{}] Response headers: {:?}",
        request_id,
        response.headers
    );
    log::debug!("[req:{}] Response content: {}", request_id, response.body);
}

fn parse_body(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| GatewayError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::models::{BackgroundChange, ImageGeneration, PoseGeneration};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays a scripted sequence of provider replies and records
    /// every payload it saw.
    struct ScriptedTransport {
        replies: Mutex<VecDeque<std::result::Result<RawResponse, TransportError>>>,
        requests: Mutex<Vec<Value>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<std::result::Result<RawResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn attempts(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ProviderTransport for ScriptedTransport {
        async fn post_json(
            &self,
            _url: &str,
            _headers: &[(String, String)],
            body: &Value,
        ) -> std::result::Result<RawResponse, TransportError> {
            self.requests.lock().unwrap().push(body.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport called more often than scripted")
        }
    }

    fn ok(body: &str) -> std::result::Result<RawResponse, TransportError> {
        status(200, body)
    }

    fn status(code: u16, body: &str) -> std::result::Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status: code,
            headers: vec![],
            body: body.to_string(),
        })
    }

    fn client(transport: Arc<ScriptedTransport>) -> ProviderClient {
        let config = ProviderConfig::new()
            .with_endpoint("https://provider.example/v2/run")
            .with_credential("secret");
        ProviderClient::with_transport(config, transport).unwrap()
    }

    fn image_request() -> ImageGeneration {
        ImageGeneration {
            prompt: "watch on marble".into(),
            number_of_images: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_twice_then_success_backs_off_one_then_two_seconds() {
        let transport = ScriptedTransport::new(vec![
            status(429, "slow down"),
            status(429, "slow down"),
            ok(r#"{"output": ["a.png"]}"#),
        ]);
        let gateway = client(transport.clone());

        let started = tokio::time::Instant::now();
        let body = gateway.generate_image(image_request()).await.unwrap();

        assert_eq!(body, json!({"output": ["a.png"]}));
        assert_eq!(transport.attempts(), 3);
        // 1s after the first 429, 2s after the second.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_three_times_fails_after_exactly_three_attempts() {
        let transport = ScriptedTransport::new(vec![
            status(429, ""),
            status(429, ""),
            status(429, ""),
        ]);
        let gateway = client(transport.clone());

        let err = gateway.generate_image(image_request()).await.unwrap_err();

        assert!(matches!(err, GatewayError::RateLimited));
        assert_eq!(err.status_code(), 429);
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test]
    async fn non_rate_limit_http_error_fails_on_first_attempt() {
        let transport = ScriptedTransport::new(vec![status(500, r#"{"error": "x"}"#)]);
        let gateway = client(transport.clone());

        let err = gateway.generate_image(image_request()).await.unwrap_err();

        assert_eq!(transport.attempts(), 1);
        match err {
            GatewayError::UpstreamHttp { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains(r#""x""#));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_retry_immediately_then_surface_as_504() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
        ]);
        let gateway = client(transport.clone());

        let started = tokio::time::Instant::now();
        let err = gateway.generate_image(image_request()).await.unwrap_err();

        assert!(matches!(err, GatewayError::UpstreamTimeout));
        assert_eq!(err.status_code(), 504);
        assert_eq!(transport.attempts(), 3);
        // No backoff between timeout retries.
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn transport_error_retries_then_surfaces_as_502() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Other("connection refused".into())),
            Err(TransportError::Other("connection refused".into())),
            Err(TransportError::Other("connection refused".into())),
        ]);
        let gateway = client(transport.clone());

        let err = gateway.generate_image(image_request()).await.unwrap_err();

        assert_eq!(err.status_code(), 502);
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test]
    async fn transport_error_then_success_recovers() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Other("reset by peer".into())),
            ok(r#"{"output": {"image": "a.png"}}"#),
        ]);
        let gateway = client(transport.clone());

        let body = gateway.generate_image(image_request()).await.unwrap();
        assert_eq!(body["output"]["image"], json!("a.png"));
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test]
    async fn background_change_is_single_shot() {
        let transport = ScriptedTransport::new(vec![status(429, "slow down")]);
        let gateway = client(transport.clone());

        let err = gateway
            .change_background(BackgroundChange {
                prompt: "marble".into(),
                input_image: "data:image/png;base64,AAAA".into(),
            })
            .await
            .unwrap_err();

        // Non-200 passes through untouched, no retry loop.
        assert_eq!(transport.attempts(), 1);
        assert_eq!(err.status_code(), 429);
        assert!(matches!(err, GatewayError::UpstreamHttp { .. }));
    }

    #[tokio::test]
    async fn pose_generation_is_single_shot_and_maps_faults_to_internal() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Timeout)]);
        let gateway = client(transport.clone());

        let err = gateway
            .generate_pose(PoseGeneration {
                prompt: "model".into(),
                input_image: "data:image/png;base64,AAAA".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(transport.attempts(), 1);
        assert!(matches!(err, GatewayError::Internal(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn outbound_payload_carries_discriminator() {
        let transport = ScriptedTransport::new(vec![ok("{}")]);
        let gateway = client(transport.clone());

        gateway.generate_image(image_request()).await.unwrap();

        let sent = transport.requests.lock().unwrap()[0].clone();
        assert_eq!(sent["input"]["generation_type"], json!("GenerateImage"));
        assert_eq!(sent["input"]["number_of_images"], json!(1));
    }

    #[tokio::test]
    async fn missing_endpoint_is_a_config_error() {
        let config = ProviderConfig::new().with_credential("secret");
        let transport = ScriptedTransport::new(vec![]);
        let err = ProviderClient::with_transport(config, transport).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }
}
