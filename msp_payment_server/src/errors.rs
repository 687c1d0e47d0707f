use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use msp_payment_engine::{CheckoutError, RefundError, ShipmentError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    /// Binding the listener fails with this.
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state. {0}")]
    Conflict(String),
    #[error("The request cannot be processed. {0}")]
    Unprocessable(String),
    #[error("MultiSafepay could not complete the request. {0}")]
    PaymentProviderError(String),
    #[error("A valid admin token is required")]
    Unauthorized,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PaymentProviderError(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::DatabaseError(_) => Self::BackendError(e.to_string()),
            CheckoutError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutError::OrderNotPayable { .. } => Self::Conflict(e.to_string()),
            CheckoutError::GatewayUnavailable { .. } | CheckoutError::Payload(_) => Self::Unprocessable(e.to_string()),
            CheckoutError::PaymentGateway(_) => Self::PaymentProviderError(e.to_string()),
        }
    }
}

impl From<RefundError> for ServerError {
    fn from(e: RefundError) -> Self {
        match e {
            RefundError::DatabaseError(_) => Self::BackendError(e.to_string()),
            RefundError::PaymentNotFound(_) | RefundError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            RefundError::InvalidRefundAmount { .. } => Self::Unprocessable(e.to_string()),
            RefundError::RefundDeclined { .. } | RefundError::PaymentGateway(_) => {
                Self::PaymentProviderError(e.to_string())
            },
        }
    }
}

impl From<ShipmentError> for ServerError {
    fn from(e: ShipmentError) -> Self {
        match e {
            ShipmentError::DatabaseError(_) => Self::BackendError(e.to_string()),
            ShipmentError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            ShipmentError::NotFulfillable { .. } => Self::Conflict(e.to_string()),
            ShipmentError::PaymentGateway(_) => Self::PaymentProviderError(e.to_string()),
        }
    }
}
