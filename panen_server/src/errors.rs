use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use groupbuy_engine::GroupBuyError;
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    GroupBuy(#[from] GroupBuyError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::GroupBuy(e) => group_buy_status(e),
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {status} response. {self}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

fn group_buy_status(e: &GroupBuyError) -> StatusCode {
    use GroupBuyError::*;
    match e {
        ValidationFailed(_) | CapacityExceeded { .. } | CampaignNotActive(_) => StatusCode::BAD_REQUEST,
        NotStoreOwner(_) => StatusCode::FORBIDDEN,
        StoreNotFound(_) | ProductNotFound(_) | CampaignNotFound(_) | ParticipantNotFound(_) => StatusCode::NOT_FOUND,
        AlreadyJoined(_) | CampaignHasParticipants(_) | PaymentAlreadySettled(..) => StatusCode::CONFLICT,
        PaymentGateway(_) => StatusCode::BAD_GATEWAY,
        DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("The bearer token is invalid. {0}")]
    InvalidToken(String),
    #[error("The identity provider could not be reached. {0}")]
    ProviderUnavailable(String),
}
