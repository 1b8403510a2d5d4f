use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TripayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Tripay credentials are not configured: {0}")]
    MissingCredentials(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Request failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Tripay rejected the request: {0}")]
    Rejected(String),
    #[error("The request to Tripay timed out")]
    Timeout,
}

impl From<reqwest::Error> for TripayApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::RestResponseError(e.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("No signing secret has been configured")]
    MissingSecret,
    #[error("The request did not carry a signature")]
    MissingSignature,
    #[error("The signature does not match the payload")]
    InvalidSignature,
    #[error("The signing key could not be used: {0}")]
    InvalidKey(String),
}
