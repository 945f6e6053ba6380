use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Money;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Succeeded,
    Declined,
}

/// One charge attempt handed to the external gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub id: Uuid,
    pub amount: Money,
    pub currency: String,
    /// Human readable description of what is being paid for.
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentRequest {
    pub fn new(amount: Money, currency: &str, reference: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            currency: currency.to_string(),
            reference: reference.into(),
            created_at: Utc::now(),
        }
    }
}

/// Proof of an approved charge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentReceipt {
    pub receipt_number: String,
    pub request_id: Uuid,
    pub amount: Money,
    pub currency: String,
    pub paid_at: DateTime<Utc>,
}

/// External payment collaborator. Called once per commit; never retried by the engine.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Attempt the charge. `Err` means the gateway itself failed, which the
    /// engine treats exactly like a decline.
    async fn pay(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>>;
}
