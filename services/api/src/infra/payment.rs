use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::{Url, form_urlencoded};

use crate::domain::repository::PaymentGateway;
use crate::domain::types::{PaymentIntent, PaymentIntentRequest};
use crate::error::ApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Stripe payment-intents client.
///
/// Without a secret key every call fails with an upstream error, so COD
/// checkout keeps working in environments that have no Stripe account.
#[derive(Clone)]
pub struct StripePaymentClient {
    client: Client,
    api_base: Url,
    secret_key: Option<Arc<str>>,
}

#[derive(Deserialize)]
struct StripeIntent {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeError,
}

#[derive(Deserialize)]
struct StripeError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl StripePaymentClient {
    pub fn new(api_base: &str, secret_key: Option<String>) -> anyhow::Result<Self> {
        let api_base = Url::parse(api_base).context("invalid payment API base URL")?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build payment HTTP client")?;
        Ok(Self {
            client,
            api_base,
            secret_key: secret_key.filter(|k| !k.is_empty()).map(Arc::from),
        })
    }

    fn secret(&self) -> Result<&str, ApiError> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| ApiError::UpstreamPayment("online payments are not configured".into()))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("payment API base URL cannot have a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Form body for `POST /v1/payment_intents`.
fn intent_form(request: &PaymentIntentRequest) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("amount", &request.amount.to_string())
        .append_pair("currency", &request.currency)
        .append_pair("automatic_payment_methods[enabled]", "true")
        .append_pair("metadata[order_id]", &request.order_id.to_string())
        .finish()
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let reason = match response.json::<StripeErrorBody>().await {
            Ok(StripeErrorBody {
                error: StripeError {
                    message: Some(message),
                    ..
                },
            }) => message,
            Ok(StripeErrorBody {
                error: StripeError {
                    code: Some(code), ..
                },
            }) => code,
            _ => format!("status {status}"),
        };
        return Err(ApiError::UpstreamPayment(reason));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::UpstreamPayment(format!("unreadable response: {e}")))
}

impl PaymentGateway for StripePaymentClient {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ApiError> {
        let secret = self.secret()?;
        let response = self
            .client
            .post(self.endpoint(&["v1", "payment_intents"])?)
            .bearer_auth(secret)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            // Retried checkouts for the same order reuse the same intent.
            .header("Idempotency-Key", format!("order-{}", request.order_id))
            .body(intent_form(request))
            .send()
            .await
            .map_err(|e| ApiError::UpstreamPayment(format!("request failed: {e}")))?;
        let intent: StripeIntent = decode(response).await?;
        tracing::info!(order_id = %request.order_id, payment_id = %intent.id, "payment intent created");
        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }

    async fn payment_succeeded(&self, payment_id: &str) -> Result<bool, ApiError> {
        let secret = self.secret()?;
        let response = self
            .client
            .get(self.endpoint(&["v1", "payment_intents", payment_id])?)
            .bearer_auth(secret)
            .send()
            .await
            .map_err(|e| ApiError::UpstreamPayment(format!("request failed: {e}")))?;
        let intent: StripeIntent = decode(response).await?;
        Ok(intent.status.as_deref() == Some("succeeded"))
    }
}
