#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use travel_site::{
    PaymentError, PaymentRequest, PaymentResponse, PaymentState, PaymentStatusRecord,
    PaymentTransport, Sleeper,
};

pub fn record(reference: &str, status: PaymentState) -> PaymentStatusRecord {
    let created_at: DateTime<Utc> = "2025-03-01T10:00:00Z".parse().unwrap();
    let paid_at = (status == PaymentState::Completed).then_some(created_at);
    PaymentStatusRecord {
        reference_number: reference.to_string(),
        status,
        amount: "10.00".to_string(),
        currency: "SGD".to_string(),
        created_at,
        paid_at,
    }
}

pub fn checkout(reference: &str) -> PaymentResponse {
    PaymentResponse {
        checkout_url: "https://x".to_string(),
        payment_request_id: None,
        reference_number: reference.to_string(),
        status: PaymentState::Pending,
    }
}

/// Answers from a script; once the status script runs dry every read
/// reports `fallback_status`.
pub struct ScriptedTransport {
    creates: Mutex<VecDeque<Result<PaymentResponse, PaymentError>>>,
    statuses: Mutex<VecDeque<Result<PaymentStatusRecord, PaymentError>>>,
    fallback_status: PaymentState,
    create_delay: Option<Duration>,
    create_calls: AtomicU32,
    status_calls: AtomicU32,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self {
            creates: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            fallback_status: PaymentState::Pending,
            create_delay: None,
            create_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
        }
    }
}

impl ScriptedTransport {
    pub fn on_create(self, result: Result<PaymentResponse, PaymentError>) -> Self {
        self.creates.lock().unwrap().push_back(result);
        self
    }

    pub fn on_status(self, result: Result<PaymentStatusRecord, PaymentError>) -> Self {
        self.statuses.lock().unwrap().push_back(result);
        self
    }

    pub fn statuses(self, reference: &str, states: &[PaymentState]) -> Self {
        states
            .iter()
            .fold(self, |t, state| t.on_status(Ok(record(reference, state.clone()))))
    }

    pub fn create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentTransport for ScriptedTransport {
    async fn create_payment(
        &self,
        _request: &PaymentRequest,
    ) -> Result<PaymentResponse, PaymentError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        self.creates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PaymentError::Rejected("no scripted answer".to_string())))
    }

    async fn payment_status(&self, reference: &str) -> Result<PaymentStatusRecord, PaymentError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(record(reference, self.fallback_status.clone())))
    }
}

/// Returns immediately and remembers every requested wait.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}
