//! Payment gateway port.

use async_trait::async_trait;

use crate::domain::item::{Order, Settlement};
use crate::domain::subscriber::MerchantCredentials;
use crate::error::GatewayError;

/// Read-only query API of the payment gateway.
///
/// Both calls return the most recent items in gateway order. Implementations
/// must bound every request with a timeout.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn fetch_orders(
        &self,
        credentials: &MerchantCredentials,
    ) -> Result<Vec<Order>, GatewayError>;

    async fn fetch_settlements(
        &self,
        credentials: &MerchantCredentials,
    ) -> Result<Vec<Settlement>, GatewayError>;
}
