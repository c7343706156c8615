pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod flow;
pub mod payment;

pub use client::{
    HttpTransport, PaymentClient, PaymentTransport, PollBudget, Sleeper, TokioSleeper,
};
pub use error::PaymentError;
pub use payment::{PaymentRequest, PaymentResponse, PaymentState, PaymentStatusRecord};
