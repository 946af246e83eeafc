use crate::domain::model::ScoringRequest;
use crate::domain::payload::SavePayload;
use crate::domain::ports::RiskStore;
use crate::utils::error::{Result, RiskError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;
use std::time::Duration;

fn apply_options(
    mut request: RequestBuilder,
    headers: Option<&HashMap<String, String>>,
    timeout: Option<Duration>,
) -> RequestBuilder {
    // 添加自定義標頭
    if let Some(headers) = headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }

    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    request
}

/// GET a scoring request document from an API endpoint.
pub async fn fetch_scoring_request(
    client: &Client,
    endpoint: &str,
    headers: Option<&HashMap<String, String>>,
    timeout: Option<Duration>,
) -> Result<ScoringRequest> {
    tracing::debug!("Making API request to: {}", endpoint);
    let response = apply_options(client.get(endpoint), headers, timeout)
        .send()
        .await?;

    tracing::debug!("API response status: {}", response.status());

    if !response.status().is_success() {
        return Err(RiskError::ProcessingError {
            message: format!("API request failed with status: {}", response.status()),
        });
    }

    let body = response.bytes().await?;
    let request = serde_json::from_slice(&body)?;
    Ok(request)
}

/// Client for the external persistence service.
#[derive(Debug, Clone)]
pub struct HttpRiskStore {
    client: Client,
    endpoint: String,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl HttpRiskStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RiskStore for HttpRiskStore {
    async fn save(&self, payload: &SavePayload) -> Result<()> {
        tracing::debug!("POST assessment to {}", self.endpoint);
        let request = apply_options(
            self.client.post(&self.endpoint).json(payload),
            Some(&self.headers),
            self.timeout,
        );
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            tracing::info!("💾 Assessment saved ({})", status);
            return Ok(());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unreadable body>"));
        tracing::warn!("Persistence service rejected assessment: {} {}", status, message);
        Err(RiskError::PersistenceError {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Sex, Subject};
    use crate::domain::scorer::RiskScorer;
    use chrono::Utc;
    use httpmock::prelude::*;

    fn sample_payload() -> SavePayload {
        let request = ScoringRequest {
            subject: Subject {
                age: 30,
                sex: Sex::Female,
                ancestry: Some("African American".to_string()),
            },
            relatives: vec![],
        };
        let assessment = RiskScorer::default().assess(&request.subject, &request.relatives);
        SavePayload::new(&request, &assessment, Utc::now())
    }

    #[tokio::test]
    async fn test_save_posts_json_with_headers() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/genetic-risk")
                .header("authorization", "Bearer abc")
                .json_body_partial(r#"{"age": 30, "sex": "female", "ancestry": "African American"}"#);
            then.status(201);
        });

        let mut headers = HashMap::new();
        headers.insert("authorization".to_string(), "Bearer abc".to_string());
        let store = HttpRiskStore::new(server.url("/api/genetic-risk")).with_headers(headers);

        store.save(&sample_payload()).await.unwrap();
        api_mock.assert();
    }

    #[tokio::test]
    async fn test_save_failure_is_single_attempt() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/save");
            then.status(503).body("maintenance");
        });

        let store = HttpRiskStore::new(server.url("/save"));
        let err = store.save(&sample_payload()).await.unwrap_err();

        api_mock.assert_hits(1);
        match err {
            RiskError::PersistenceError { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_scoring_request() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/profile");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "subject": {"age": 52, "sex": "male"},
                    "relatives": [
                        {"relation": "Parent", "ageAtDiagnosisOrCurrent": 61, "conditions": ["Prostate Cancer"]}
                    ]
                }));
        });

        let request = fetch_scoring_request(&Client::new(), &server.url("/profile"), None, None)
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(request.subject.age, 52);
        assert_eq!(request.relatives.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/profile");
            then.status(404);
        });

        let result = fetch_scoring_request(&Client::new(), &server.url("/profile"), None, None).await;
        assert!(matches!(result, Err(RiskError::ProcessingError { .. })));
    }
}
