use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MspApiError {
    #[error("The MultiSafepay API is not configured correctly. {0}")]
    ConfigurationError(String),
    #[error("Could not complete the request to MultiSafepay. {message}")]
    TransportError { code: Option<u16>, message: String },
    #[error("MultiSafepay returned a response that could not be understood. {body}")]
    MalformedResponse { body: String },
    #[error("{code} : {info}")]
    PaymentGatewayError { code: i64, info: String },
    #[error("Could not serialize the request body. {0}")]
    SerializationError(String),
}

impl MspApiError {
    pub fn transport<S: Into<String>>(code: Option<u16>, message: S) -> Self {
        Self::TransportError { code, message: message.into() }
    }

    pub fn malformed(body: &[u8]) -> Self {
        Self::MalformedResponse { body: String::from_utf8_lossy(body).into_owned() }
    }
}
