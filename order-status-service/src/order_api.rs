use anyhow::Result;
use async_trait::async_trait;
use shared::Order;
use tracing::debug;

/// Partner API that receives every reconciled status change.
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn save_order(&self, order: &Order) -> Result<()>;
}

pub struct HttpOrderApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrderApi {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn order_url(&self, order_id: &str) -> String {
        format!("{}/order/{}", self.base_url.trim_end_matches('/'), order_id)
    }
}

#[async_trait]
impl OrderApi for HttpOrderApi {
    async fn save_order(&self, order: &Order) -> Result<()> {
        let url = self.order_url(&order.order_id);

        let response = self
            .client
            .put(&url)
            .json(order)
            .send()
            .await?
            .error_for_status()?;

        debug!(%url, status = %response.status(), "order api accepted order");
        Ok(())
    }
}
