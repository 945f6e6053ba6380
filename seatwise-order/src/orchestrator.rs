use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seatwise_core::payment::{PaymentGateway, PaymentReceipt, PaymentRequest, PaymentStatus};
use seatwise_core::{BookingError, BookingResult, Money};
use tracing::{info, warn};

/// Single entry point for charging money. Turns any gateway outcome other
/// than success into `PaymentDeclined`.
pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl PaymentOrchestrator {
    pub fn new(gateway: Arc<dyn PaymentGateway>, currency: impl Into<String>) -> Self {
        Self {
            gateway,
            currency: currency.into(),
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Charge once. There are no retries.
    pub async fn charge(&self, amount: Money, reference: &str) -> BookingResult<PaymentReceipt> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(BookingError::Validation(format!("invalid payment amount: {amount}")));
        }
        let request = PaymentRequest::new(amount, &self.currency, reference);

        let reason = match self.gateway.pay(&request).await {
            Ok(PaymentStatus::Succeeded) => {
                let receipt = PaymentReceipt {
                    receipt_number: receipt_number(),
                    request_id: request.id,
                    amount,
                    currency: self.currency.clone(),
                    paid_at: Utc::now(),
                };
                info!(receipt = %receipt.receipt_number, amount, reference, "payment approved");
                return Ok(receipt);
            }
            Ok(PaymentStatus::Declined) => "declined by gateway".to_string(),
            Err(err) => format!("gateway error: {err}"),
        };

        warn!(amount, reference, reason = %reason, "payment declined");
        Err(BookingError::PaymentDeclined { amount, reason })
    }
}

fn receipt_number() -> String {
    format!("RCT-{:08}", rand::thread_rng().gen_range(0..100_000_000u32))
}

/// Outcome queued on a [`ScriptedPaymentGateway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedOutcome {
    Approve,
    Decline,
    Fail,
}

/// Replays queued outcomes in order and approves once the queue is empty.
/// Every amount it is asked to charge is recorded.
#[derive(Default)]
pub struct ScriptedPaymentGateway {
    outcomes: Mutex<VecDeque<ScriptedOutcome>>,
    charges: Mutex<Vec<Money>>,
}

impl ScriptedPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcomes(outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            charges: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, outcome: ScriptedOutcome) {
        self.outcomes.lock().push_back(outcome);
    }

    pub fn charges(&self) -> Vec<Money> {
        self.charges.lock().clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedPaymentGateway {
    async fn pay(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>> {
        self.charges.lock().push(request.amount);
        let outcome = self.outcomes.lock().pop_front().unwrap_or(ScriptedOutcome::Approve);
        match outcome {
            ScriptedOutcome::Approve => Ok(PaymentStatus::Succeeded),
            ScriptedOutcome::Decline => Ok(PaymentStatus::Declined),
            ScriptedOutcome::Fail => Err("scripted gateway failure".into()),
        }
    }
}

/// Approves each payment with a fixed probability.
pub struct SimulatedPaymentGateway {
    approval_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedPaymentGateway {
    /// `seed` makes the approve/decline sequence reproducible.
    pub fn new(approval_rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            approval_rate: approval_rate.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn pay(
        &self,
        _request: &PaymentRequest,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>> {
        let approved = self.rng.lock().gen_bool(self.approval_rate);
        Ok(if approved {
            PaymentStatus::Succeeded
        } else {
            PaymentStatus::Declined
        })
    }
}
