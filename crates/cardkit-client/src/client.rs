//! Card directory client.

use std::time::Duration;

use cardkit_cards::RawCard;
use cardkit_core::CardId;
use cardkit_token::AccessToken;
use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::CardClientConfig;
use crate::error::{CardClientError, ServiceError};

/// Header carrying the access token on every directory request.
pub const AUTHORIZATION_HEADER: &str = "Identity-Authorization";

/// Client for the card directory. Holds no per-call state; cloning shares
/// the underlying connection pool.
#[derive(Debug, Clone)]
pub struct CardClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CardClient {
    pub fn new(config: CardClientConfig) -> Result<Self, CardClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(CardClientError::Build)?;
        Ok(Self {
            http,
            base_url: config.service_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch one card.
    ///
    /// Calls `GET {base_url}/cards/{id}`.
    pub async fn get_card(
        &self,
        id: &CardId,
        token: &AccessToken,
    ) -> Result<RawCard, CardClientError> {
        let endpoint = format!("GET /cards/{id}");
        let request = self.http.get(self.url(&format!("cards/{id}")));
        self.execute(&endpoint, request, token).await
    }

    /// Publish a signed raw card. The directory answers with the card as
    /// it accepted it, issuer signature included.
    ///
    /// Calls `POST {base_url}/cards`.
    pub async fn publish_card(
        &self,
        card: &RawCard,
        token: &AccessToken,
    ) -> Result<RawCard, CardClientError> {
        let endpoint = "POST /cards";
        let request = self.http.post(self.url("cards")).json(card);
        self.execute(endpoint, request, token).await
    }

    /// Every card published for `identity`, in no particular order.
    ///
    /// Calls `GET {base_url}/cards/actions/search?identity={identity}`.
    pub async fn search_cards(
        &self,
        identity: &str,
        token: &AccessToken,
    ) -> Result<Vec<RawCard>, CardClientError> {
        let endpoint = "GET /cards/actions/search";
        let request = self
            .http
            .get(self.url("cards/actions/search"))
            .query(&[("identity", identity)]);
        self.execute(endpoint, request, token).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
        token: &AccessToken,
    ) -> Result<T, CardClientError> {
        let auth = HeaderValue::from_str(&token.encode())
            .map_err(|_| CardClientError::InvalidToken)?;

        tracing::debug!(endpoint, "dispatching directory request");
        let resp = request
            .header(AUTHORIZATION_HEADER, auth)
            .send()
            .await
            .map_err(|e| CardClientError::Transport {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| CardClientError::Transport {
                endpoint: endpoint.into(),
                source: e,
            })?;

        process_response(endpoint, status, &body)
    }
}

/// Validate, parse and deserialize one directory response.
fn process_response<T: DeserializeOwned>(
    endpoint: &str,
    status: u16,
    body: &[u8],
) -> Result<T, CardClientError> {
    if status / 100 != 2 {
        return Err(error_for_status(endpoint, status, body));
    }
    if body.is_empty() {
        return Err(CardClientError::NoBody {
            endpoint: endpoint.into(),
        });
    }
    let json: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| CardClientError::InvalidJson {
            endpoint: endpoint.into(),
            source: e,
        })?;
    serde_json::from_value(json).map_err(|e| CardClientError::InvalidResponseModel {
        endpoint: endpoint.into(),
        source: e,
    })
}

fn error_for_status(endpoint: &str, status: u16, body: &[u8]) -> CardClientError {
    if let Ok(error) = serde_json::from_slice::<ServiceError>(body) {
        tracing::debug!(endpoint, status, code = error.code, "directory reported an error");
        return CardClientError::Service {
            endpoint: endpoint.into(),
            status,
            error,
        };
    }
    match std::str::from_utf8(body).map(str::trim) {
        Ok(text) if !text.is_empty() => CardClientError::Http {
            endpoint: endpoint.into(),
            status,
            body: text.to_string(),
        },
        _ => CardClientError::Status {
            endpoint: endpoint.into(),
            status,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(status: u16, body: &[u8]) -> Result<Vec<u32>, CardClientError> {
        process_response("GET /test", status, body)
    }

    #[test]
    fn structured_error_body_becomes_service_error() {
        let err = run(400, br#"{"code":20300,"message":"bad token"}"#).unwrap_err();
        assert_eq!(
            err.service_error(),
            Some(&ServiceError {
                code: 20300,
                message: "bad token".into()
            })
        );
    }

    #[test]
    fn text_error_body_is_carried() {
        let err = run(502, b"upstream unavailable\n").unwrap_err();
        assert!(matches!(err, CardClientError::Http { status: 502, ref body, .. } if body == "upstream unavailable"));
    }

    #[test]
    fn empty_or_binary_error_body_is_bare_status() {
        assert!(matches!(
            run(500, b"").unwrap_err(),
            CardClientError::Status { status: 500, .. }
        ));
        assert!(matches!(
            run(500, &[0xff, 0xfe]).unwrap_err(),
            CardClientError::Status { status: 500, .. }
        ));
    }

    #[test]
    fn json_error_body_of_other_shape_is_text() {
        let err = run(409, br#"{"error":"conflict"}"#).unwrap_err();
        assert!(matches!(err, CardClientError::Http { status: 409, .. }));
    }

    #[test]
    fn success_pipeline_distinguishes_failures() {
        assert!(matches!(run(200, b"").unwrap_err(), CardClientError::NoBody { .. }));
        assert!(matches!(
            run(200, b"<html>").unwrap_err(),
            CardClientError::InvalidJson { .. }
        ));
        assert!(matches!(
            run(200, br#"{"not":"a list"}"#).unwrap_err(),
            CardClientError::InvalidResponseModel { .. }
        ));
        assert_eq!(run(201, b"[1,2,3]").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn url_joins_without_double_slash() {
        let client = CardClient::new(CardClientConfig::with_url("https://dir.example/v5/").unwrap()).unwrap();
        assert_eq!(client.url("cards"), "https://dir.example/v5/cards");
        let client = CardClient::new(CardClientConfig::with_url("https://dir.example").unwrap()).unwrap();
        assert_eq!(client.url("cards/actions/search"), "https://dir.example/cards/actions/search");
    }
}
