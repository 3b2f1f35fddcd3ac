use super::Transport;
use crate::{
    catalog::{self, EndpointSpec},
    error::Result,
    normalize::normalize,
    payload::{self, RawArgs},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balance {
    pub usd: f64,
}

#[derive(Clone)]
pub struct AccountClient {
    transport: Transport,
}

impl AccountClient {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub async fn balance(&self) -> Result<Balance> {
        let spec: &EndpointSpec = catalog::lookup("balance")?;
        let request = payload::build(spec, &RawArgs::new())?;
        let raw = self.transport.send(spec, &request).await?;
        let normalized = normalize(spec, &raw)?;
        let usd = normalized.balance_usd.unwrap_or_default();
        log::info!("Balance: ${:.4}", usd);
        Ok(Balance { usd })
    }
}
