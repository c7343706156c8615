use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PaymentError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    #[error("Request timeout - please try again")]
    Timeout,

    /// Error string from the payment API, passed on verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("Payment API unreachable: {0}")]
    Transport(String),

    #[error("Payment status polling timeout")]
    PollingTimeout { attempts: u32 },
}

impl PaymentError {
    pub fn validation(field: &'static str, message: &'static str) -> Self {
        PaymentError::Validation { field, message }
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PaymentError::Timeout
        } else {
            PaymentError::Transport(err.to_string())
        }
    }
}
