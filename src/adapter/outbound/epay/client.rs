//! HTTP client for the epay query API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use super::dto::{Envelope, OrderDto, SettlementDto};
use super::settings::EpayConfig;
use crate::domain::item::{Order, Settlement};
use crate::domain::subscriber::MerchantCredentials;
use crate::error::{GatewayError, Result};
use crate::port::outbound::gateway::PaymentGateway;

/// Query endpoints exposed by `api.php`.
#[derive(Debug, Clone, Copy)]
enum Action {
    Orders,
    Settlements,
}

impl Action {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Settlements => "settle",
        }
    }
}

/// Epay gateway client shared by every poll worker.
///
/// The merchant key travels as a query parameter, so it is scrubbed from
/// every error message before the error leaves this type.
pub struct EpayClient {
    http: HttpClient,
    scheme: String,
    page_size: u32,
    request_timeout: Duration,
}

impl EpayClient {
    pub fn new(config: &EpayConfig) -> Result<Self> {
        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let http = HttpClient::builder()
            .timeout(request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            scheme: config.scheme.clone(),
            page_size: config.page_size,
            request_timeout,
        })
    }

    fn endpoint(
        &self,
        action: Action,
        credentials: &MerchantCredentials,
    ) -> std::result::Result<Url, GatewayError> {
        let base = format!("{}://{}/api.php", self.scheme, credentials.domain);
        let mut url = Url::parse(&base).map_err(|e| {
            GatewayError::Network(format!("invalid gateway domain {:?}: {e}", credentials.domain))
        })?;
        url.query_pairs_mut()
            .append_pair("act", action.as_str())
            .append_pair("pid", &credentials.merchant_id)
            .append_pair("key", &credentials.merchant_key)
            .append_pair("limit", &self.page_size.to_string());
        Ok(url)
    }

    async fn query<T: DeserializeOwned>(
        &self,
        action: Action,
        credentials: &MerchantCredentials,
    ) -> std::result::Result<Vec<T>, GatewayError> {
        let url = self.endpoint(action, credentials)?;
        trace!(domain = %credentials.domain, act = action.as_str(), "Querying gateway");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e, credentials))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(GatewayError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e, credentials))?;
        let envelope: Envelope<T> = serde_json::from_slice(&body)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        if envelope.code != 1 {
            return Err(GatewayError::Api(redact(&envelope.msg, &credentials.merchant_key)));
        }

        debug!(
            domain = %credentials.domain,
            act = action.as_str(),
            count = envelope.data.len(),
            "Gateway query succeeded"
        );
        Ok(envelope.data)
    }

    fn transport_error(
        &self,
        err: reqwest::Error,
        credentials: &MerchantCredentials,
    ) -> GatewayError {
        if err.is_timeout() {
            return GatewayError::Timeout(self.request_timeout);
        }
        let message = err.without_url().to_string();
        GatewayError::Network(redact(&message, &credentials.merchant_key))
    }
}

#[async_trait]
impl PaymentGateway for EpayClient {
    async fn fetch_orders(
        &self,
        credentials: &MerchantCredentials,
    ) -> std::result::Result<Vec<Order>, GatewayError> {
        self.query::<OrderDto>(Action::Orders, credentials)
            .await?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }

    async fn fetch_settlements(
        &self,
        credentials: &MerchantCredentials,
    ) -> std::result::Result<Vec<Settlement>, GatewayError> {
        self.query::<SettlementDto>(Action::Settlements, credentials)
            .await?
            .into_iter()
            .map(Settlement::try_from)
            .collect()
    }
}

fn redact(message: &str, key: &str) -> String {
    if key.is_empty() {
        message.to_string()
    } else {
        message.replace(key, "***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const KEY: &str = "s3cr3t-merchant-key";

    /// Serve one canned HTTP response and hand back the request line.
    async fn serve_once(status: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..n]).lines().next().unwrap_or_default().to_string()
        });
        (addr, handle)
    }

    fn client() -> EpayClient {
        EpayClient::new(&EpayConfig {
            scheme: "http".into(),
            request_timeout_secs: 2,
            ..EpayConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_orders_with_query_parameters() {
        let (addr, server) = serve_once(
            "200 OK",
            r#"{"code":1,"msg":"ok","data":[{"trade_no":"T1","money":"1.00","status":1}]}"#,
        )
        .await;
        let creds = MerchantCredentials::new(addr, "1000", KEY);

        let orders = client().fetch_orders(&creds).await.unwrap();
        let request_line = server.await.unwrap();

        assert_eq!(orders.len(), 1);
        assert!(orders[0].status.is_success());
        assert!(request_line.starts_with("GET /api.php?act=orders&pid=1000"));
        assert!(request_line.contains("limit=50"));
    }

    #[tokio::test]
    async fn settlements_use_settle_action() {
        let (addr, server) = serve_once("200 OK", r#"{"code":1,"data":[]}"#).await;
        let creds = MerchantCredentials::new(addr, "1000", KEY);

        let settlements = client().fetch_settlements(&creds).await.unwrap();

        assert!(settlements.is_empty());
        assert!(server.await.unwrap().contains("act=settle"));
    }

    #[tokio::test]
    async fn api_error_code_is_reported() {
        let (addr, _server) =
            serve_once("200 OK", r#"{"code":-1,"msg":"KEY校验失败"}"#).await;
        let creds = MerchantCredentials::new(addr, "1000", KEY);

        let err = client().fetch_orders(&creds).await.unwrap_err();
        assert_eq!(err, GatewayError::Api("KEY校验失败".into()));
    }

    #[tokio::test]
    async fn non_200_status_is_reported() {
        let (addr, _server) = serve_once("502 Bad Gateway", "").await;
        let creds = MerchantCredentials::new(addr, "1000", KEY);

        let err = client().fetch_orders(&creds).await.unwrap_err();
        assert_eq!(err, GatewayError::Status(502));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let (addr, _server) = serve_once("200 OK", "<html>maintenance</html>").await;
        let creds = MerchantCredentials::new(addr, "1000", KEY);

        let err = client().fetch_orders(&creds).await.unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[tokio::test]
    async fn network_errors_never_contain_the_key() {
        // Nothing listens on port 9 locally.
        let creds = MerchantCredentials::new("127.0.0.1:9", "1000", KEY);

        let err = client().fetch_orders(&creds).await.unwrap_err();
        assert!(!err.to_string().contains(KEY));
    }

    #[test]
    fn redact_replaces_every_occurrence() {
        assert_eq!(redact("a KEY b KEY", "KEY"), "a *** b ***");
        assert_eq!(redact("unchanged", ""), "unchanged");
    }
}
