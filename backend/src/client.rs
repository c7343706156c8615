use crate::error::PaymentError;
use crate::payment::{check_reference, PaymentRequest, PaymentResponse, PaymentStatusRecord};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const CREATE_TIMEOUT: Duration = Duration::from_secs(15);

/// The two HTTP calls offered by the payment API.
#[async_trait]
pub trait PaymentTransport: Send + Sync {
    async fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, PaymentError>;

    async fn payment_status(&self, reference: &str) -> Result<PaymentStatusRecord, PaymentError>;
}

/// Waits between polling attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Deserialize)]
struct ApiError {
    error: Option<String>,
}

/// `PaymentTransport` over HTTP with reqwest.
#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/{segments..}/`, each segment percent-encoded on its own so
    /// `/`, `?` and `#` inside one cannot change the route.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, PaymentError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            PaymentError::Transport(format!("Invalid payment API URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                PaymentError::Transport(format!("Invalid payment API URL {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }
}

async fn rejection(response: Response, fallback: &str) -> PaymentError {
    let status = response.status();
    let message = response
        .json::<ApiError>()
        .await
        .ok()
        .and_then(|body| body.error)
        .unwrap_or_else(|| fallback.to_string());
    warn!("Payment API answered {}: {}", status, message);
    PaymentError::Rejected(message)
}

#[async_trait]
impl PaymentTransport for HttpTransport {
    async fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, PaymentError> {
        let url = self.endpoint(&["payments", "create"])?;
        let response = self.client.post(url).json(request).send().await?;
        debug!("Payment API response status: {}", response.status());

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to create payment").await);
        }
        Ok(response.json().await?)
    }

    async fn payment_status(&self, reference: &str) -> Result<PaymentStatusRecord, PaymentError> {
        check_reference(reference)?;
        let url = self.endpoint(&["payments", "status", reference])?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to get payment status").await);
        }
        Ok(response.json().await?)
    }
}

/// How long to keep asking for a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    pub max_attempts: u32,
    pub interval: Duration,
    /// Wait one interval before every attempt instead of between attempts.
    pub delay_first: bool,
}

impl PollBudget {
    /// Waiting for the outcome right after checkout, about a minute.
    pub const CHECKOUT_WAIT: PollBudget = PollBudget {
        max_attempts: 30,
        interval: Duration::from_secs(2),
        delay_first: false,
    };

    /// Follow-up polling on the status page, about 15 seconds.
    pub const STATUS_PAGE: PollBudget = PollBudget {
        max_attempts: 5,
        interval: Duration::from_secs(3),
        delay_first: true,
    };

    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            delay_first: false,
        }
    }
}

/// Client for the payment API. Built explicitly and handed to whoever needs
/// it; transport and sleeper are swappable for tests.
pub struct PaymentClient<T = HttpTransport, S = TokioSleeper> {
    transport: T,
    sleeper: S,
    create_timeout: Duration,
}

impl PaymentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_parts(HttpTransport::new(base_url), TokioSleeper)
    }
}

impl<T, S> PaymentClient<T, S>
where
    T: PaymentTransport,
    S: Sleeper,
{
    pub fn with_parts(transport: T, sleeper: S) -> Self {
        Self {
            transport,
            sleeper,
            create_timeout: CREATE_TIMEOUT,
        }
    }

    pub fn with_create_timeout(mut self, timeout: Duration) -> Self {
        self.create_timeout = timeout;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Validates locally, then asks the payment API for a checkout. The
    /// caller sends the browser to the returned `checkout_url`.
    pub async fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, PaymentError> {
        request.validate()?;
        info!(
            "Creating payment request: {} {} for {}",
            request.amount, request.currency, request.email
        );

        let response = tokio::time::timeout(
            self.create_timeout,
            self.transport.create_payment(request),
        )
        .await
        .map_err(|_| {
            warn!("Payment creation timed out after {:?}", self.create_timeout);
            PaymentError::Timeout
        })??;

        info!(
            "Payment created: {} ({})",
            response.reference_number, response.status
        );
        Ok(response)
    }

    pub async fn payment_status(
        &self,
        reference: &str,
    ) -> Result<PaymentStatusRecord, PaymentError> {
        check_reference(reference)?;
        self.transport.payment_status(reference).await
    }

    /// Polls every two seconds for up to `max_attempts` attempts.
    pub async fn poll_payment_status(
        &self,
        reference: &str,
        max_attempts: u32,
    ) -> Result<PaymentStatusRecord, PaymentError> {
        self.poll_with_budget(
            reference,
            PollBudget {
                max_attempts,
                ..PollBudget::CHECKOUT_WAIT
            },
        )
        .await
    }

    /// Asks for the status until it is terminal or the budget runs out.
    /// A failed call uses up one attempt and polling carries on.
    pub async fn poll_with_budget(
        &self,
        reference: &str,
        budget: PollBudget,
    ) -> Result<PaymentStatusRecord, PaymentError> {
        check_reference(reference)?;
        for attempt in 1..=budget.max_attempts {
            if budget.delay_first {
                self.sleeper.sleep(budget.interval).await;
            }

            match self.payment_status(reference).await {
                Ok(record) if record.status.is_terminal() => {
                    info!(
                        "Payment {} is {} after {} attempt(s)",
                        reference, record.status, attempt
                    );
                    return Ok(record);
                }
                Ok(record) => debug!(
                    "Polling attempt {} for {}: {}",
                    attempt, reference, record.status
                ),
                Err(e) => warn!("Polling attempt {} for {} failed: {}", attempt, reference, e),
            }

            if !budget.delay_first && attempt < budget.max_attempts {
                self.sleeper.sleep(budget.interval).await;
            }
        }

        warn!(
            "Payment {} still not settled after {} attempts",
            reference, budget.max_attempts
        );
        Err(PaymentError::PollingTimeout {
            attempts: budget.max_attempts,
        })
    }
}
