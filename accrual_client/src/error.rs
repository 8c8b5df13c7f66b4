use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AccrualApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("An order number is required to query the accrual system")]
    EmptyOrderNumber,
    #[error("The accrual system did not respond in time: {0}")]
    Timeout(String),
    #[error("Request to the accrual system failed: {0}")]
    RequestFailed(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    UnexpectedStatus { status: u16, message: String },
    #[error("Malformed settlement: {0}")]
    MalformedSettlement(String),
}

impl From<reqwest::Error> for AccrualApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::RequestFailed(e.to_string())
        }
    }
}
