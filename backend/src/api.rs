use crate::client::{
    HttpTransport, PaymentClient, PaymentTransport, PollBudget, Sleeper, TokioSleeper,
};
use crate::config::SiteConfig;
use crate::error::PaymentError;
use crate::flow::{CheckoutForm, CheckoutState, StatusPage, StatusView};
use crate::payment::{PaymentRequest, PaymentResponse};
use axum::{
    extract::{rejection::JsonRejection, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, timeout::TimeoutLayer,
};
use tracing::{debug, error, trace};

/// Longer than the longest polling budget.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

pub struct SiteState<T = HttpTransport, S = TokioSleeper> {
    pub client: PaymentClient<T, S>,
    pub status_poll: PollBudget,
    pub checkout_poll: PollBudget,
}

impl<T, S> SiteState<T, S> {
    pub fn new(client: PaymentClient<T, S>, config: &SiteConfig) -> Self {
        Self {
            client,
            status_poll: config.status_poll,
            checkout_poll: config.checkout_poll,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct ReferenceQuery {
    pub reference_number: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StillPending {
    pub state: String,
    pub reference_number: String,
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn error_response(e: &PaymentError) -> ApiError {
    let status = match e {
        PaymentError::Validation { .. } => StatusCode::BAD_REQUEST,
        PaymentError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        PaymentError::Rejected(_) | PaymentError::Transport(_) => StatusCode::BAD_GATEWAY,
        PaymentError::PollingTimeout { .. } => StatusCode::ACCEPTED,
    };
    (
        status,
        Json(ErrorBody {
            error: e.to_string(),
        }),
    )
}

async fn handle_checkout<T, S>(
    State(site): State<Arc<SiteState<T, S>>>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Json<PaymentResponse>, ApiError>
where
    T: PaymentTransport + 'static,
    S: Sleeper + 'static,
{
    let Json(payload) = payload.map_err(|rejection| {
        debug!("Rejected checkout body: {}", rejection.body_text());
        (
            rejection.status(),
            Json(ErrorBody {
                error: rejection.body_text(),
            }),
        )
    })?;
    let mut form = CheckoutForm::new(payload);
    match form.submit(&site.client).await {
        CheckoutState::AwaitingRedirect(response) => Ok(Json(response.clone())),
        CheckoutState::Failed(e) => Err(error_response(e)),
        state => {
            error!("Checkout ended in unexpected state: {:?}", state);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Payment failed. Please try again.".to_string(),
                }),
            ))
        }
    }
}

async fn handle_status<T, S>(
    State(site): State<Arc<SiteState<T, S>>>,
    Query(query): Query<ReferenceQuery>,
) -> Json<StatusView>
where
    T: PaymentTransport + 'static,
    S: Sleeper + 'static,
{
    let mut page = StatusPage::new(query.reference_number, site.status_poll);
    Json(page.check(&site.client).await)
}

async fn handle_wait<T, S>(
    State(site): State<Arc<SiteState<T, S>>>,
    Query(query): Query<ReferenceQuery>,
) -> Response
where
    T: PaymentTransport + 'static,
    S: Sleeper + 'static,
{
    let Some(reference) = query.reference_number.filter(|r| !r.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "No reference number found".to_string(),
            }),
        )
            .into_response();
    };

    match site
        .client
        .poll_with_budget(&reference, site.checkout_poll)
        .await
    {
        Ok(record) => Json(record).into_response(),
        Err(PaymentError::PollingTimeout { .. }) => (
            StatusCode::ACCEPTED,
            Json(StillPending {
                state: "pending".to_string(),
                reference_number: reference,
                message: "Your payment is still being processed. Please check again shortly."
                    .to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

pub fn payment_api<T, S>(state: Arc<SiteState<T, S>>) -> Router
where
    T: PaymentTransport + 'static,
    S: Sleeper + 'static,
{
    Router::new()
        .route("/checkout", post(handle_checkout::<T, S>))
        .route("/checkout/status", get(handle_status::<T, S>))
        .route("/checkout/wait", get(handle_wait::<T, S>))
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    trace!("{}, {}", request.method(), request.uri().path());
    next.run(request).await
}

/// Payment relay under `/api`, the built frontend everywhere else.
pub fn site_router<T, S>(state: Arc<SiteState<T, S>>, frontend_dir: &str) -> Router
where
    T: PaymentTransport + 'static,
    S: Sleeper + 'static,
{
    let middleware = tower::ServiceBuilder::new()
        .layer(CompressionLayer::new().quality(tower_http::CompressionLevel::Fastest))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(log_request));

    Router::new()
        .nest("/api", payment_api(state))
        .fallback_service(ServeDir::new(frontend_dir))
        .layer(middleware)
}
