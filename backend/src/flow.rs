use crate::client::{PaymentClient, PaymentTransport, PollBudget, Sleeper};
use crate::error::PaymentError;
use crate::payment::{PaymentRequest, PaymentResponse, PaymentState, PaymentStatusRecord};
use serde::Serialize;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    Idle,
    Submitting,
    AwaitingRedirect(PaymentResponse),
    Failed(PaymentError),
}

/// Payment form submission. The entered request is kept whatever the
/// outcome so a failed attempt can be resubmitted as is.
pub struct CheckoutForm {
    request: PaymentRequest,
    state: CheckoutState,
}

impl CheckoutForm {
    pub fn new(request: PaymentRequest) -> Self {
        Self {
            request,
            state: CheckoutState::Idle,
        }
    }

    pub fn request(&self) -> &PaymentRequest {
        &self.request
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn checkout_url(&self) -> Option<&str> {
        match &self.state {
            CheckoutState::AwaitingRedirect(response) => Some(&response.checkout_url),
            _ => None,
        }
    }

    pub async fn submit<T, S>(&mut self, client: &PaymentClient<T, S>) -> &CheckoutState
    where
        T: PaymentTransport,
        S: Sleeper,
    {
        self.state = CheckoutState::Submitting;
        self.state = match client.create_payment(&self.request).await {
            Ok(response) => {
                debug!("Redirecting to checkout: {}", response.checkout_url);
                CheckoutState::AwaitingRedirect(response)
            }
            Err(e) => {
                error!("Payment submission failed: {}", e);
                CheckoutState::Failed(e)
            }
        };
        &self.state
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPhase {
    Checking,
    Pending,
    Success,
    Failed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub state: StatusPhase,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<PaymentStatusRecord>,
}

/// The page the payment provider redirects back to.
pub struct StatusPage {
    reference: Option<String>,
    budget: PollBudget,
    phase: StatusPhase,
    details: Option<PaymentStatusRecord>,
    error: Option<String>,
}

impl StatusPage {
    pub fn new(reference: Option<String>, budget: PollBudget) -> Self {
        Self {
            reference: reference.filter(|r| !r.trim().is_empty()),
            budget,
            phase: StatusPhase::Checking,
            details: None,
            error: None,
        }
    }

    pub fn phase(&self) -> StatusPhase {
        self.phase
    }

    pub fn details(&self) -> Option<&PaymentStatusRecord> {
        self.details.as_ref()
    }

    /// One quick read, then follow-up polling while the payment is pending.
    /// Also serves as the manual "check again".
    pub async fn check<T, S>(&mut self, client: &PaymentClient<T, S>) -> StatusView
    where
        T: PaymentTransport,
        S: Sleeper,
    {
        let Some(reference) = self.reference.clone() else {
            self.fail("No reference number found");
            return self.view();
        };

        self.phase = StatusPhase::Checking;
        self.error = None;
        match client.payment_status(&reference).await {
            Ok(record) => {
                self.phase = phase_for(&record.status);
                let pending = record.status == PaymentState::Pending;
                self.details = Some(record);
                if pending {
                    self.follow_up(client, &reference).await;
                }
            }
            Err(e) => {
                error!("Error checking payment status for {}: {}", reference, e);
                self.fail("Unable to verify payment status");
            }
        }
        self.view()
    }

    async fn follow_up<T, S>(&mut self, client: &PaymentClient<T, S>, reference: &str)
    where
        T: PaymentTransport,
        S: Sleeper,
    {
        match client.poll_with_budget(reference, self.budget).await {
            Ok(record) => {
                self.phase = phase_for(&record.status);
                self.details = Some(record);
            }
            Err(_) => info!("Payment {} still pending after polling", reference),
        }
    }

    fn fail(&mut self, message: &str) {
        self.phase = StatusPhase::Error;
        self.error = Some(message.to_string());
    }

    pub fn view(&self) -> StatusView {
        let message = match self.phase {
            StatusPhase::Success => "Your payment has been processed successfully!",
            StatusPhase::Failed => "Your payment could not be processed. Please try again.",
            StatusPhase::Error => self
                .error
                .as_deref()
                .unwrap_or("An error occurred while checking payment status."),
            StatusPhase::Pending => "Your payment is still being processed. Please wait...",
            StatusPhase::Checking => "Please wait while we verify your payment status...",
        };
        StatusView {
            state: self.phase,
            message: message.to_string(),
            details: self.details.clone(),
        }
    }
}

fn phase_for(state: &PaymentState) -> StatusPhase {
    match state {
        PaymentState::Completed => StatusPhase::Success,
        PaymentState::Failed => StatusPhase::Failed,
        PaymentState::Pending | PaymentState::Other(_) => StatusPhase::Pending,
    }
}
