use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER},
    Client,
    Response,
    StatusCode,
};

use crate::{config::AccrualConfig, AccrualApiError, Settlement, SettlementResult};

#[derive(Clone)]
pub struct AccrualApi {
    config: AccrualConfig,
    client: Arc<Client>,
}

impl AccrualApi {
    pub fn new(config: AccrualConfig) -> Result<Self, AccrualApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AccrualApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &AccrualConfig {
        &self.config
    }

    pub fn url(&self, order_number: &str) -> String {
        format!("{}/api/orders/{order_number}", self.config.base_url)
    }

    /// Asks the accrual system for the settlement of `order_number`.
    ///
    /// This never fails outright: every outcome, including transport errors and timeouts, is mapped onto one of the
    /// [`SettlementResult`] variants.
    pub async fn fetch_settlement(&self, order_number: &str) -> SettlementResult {
        if order_number.is_empty() {
            return SettlementResult::Fatal(AccrualApiError::EmptyOrderNumber);
        }
        let url = self.url(order_number);
        trace!("Querying accrual system: {url}");
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return SettlementResult::Fatal(e.into()),
        };
        match self.interpret(order_number, response).await {
            Ok(result) => result,
            Err(e) => SettlementResult::Fatal(e),
        }
    }

    async fn interpret(&self, order_number: &str, response: Response) -> Result<SettlementResult, AccrualApiError> {
        match response.status() {
            StatusCode::OK => {
                let settlement = response.json::<Settlement>().await.map_err(|e| {
                    if e.is_timeout() {
                        AccrualApiError::Timeout(e.to_string())
                    } else {
                        AccrualApiError::JsonError(e.to_string())
                    }
                })?;
                let settlement = settlement.validate(order_number)?;
                trace!("Order {order_number} is {} in the accrual system", settlement.status);
                Ok(SettlementResult::Settled(settlement))
            },
            StatusCode::NO_CONTENT => {
                trace!("Accrual system has no information about order {order_number}");
                Ok(SettlementResult::Unknown)
            },
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = self.retry_after(&response);
                trace!("Accrual system is rate limiting us. Retry in {}s", retry_after.as_secs());
                Ok(SettlementResult::RateLimited { retry_after })
            },
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(AccrualApiError::UnexpectedStatus { status: status.as_u16(), message })
            },
        }
    }

    /// `Retry-After` is expected in whole seconds. HTTP dates and garbage fall back to the configured default.
    fn retry_after(&self, response: &Response) -> Duration {
        response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.config.default_retry_after)
    }
}
