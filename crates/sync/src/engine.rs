//! Cart Sync Engine: whole-cart operations built from single-line remote calls.
//!
//! The remote cart has no multi-item transaction, so "replace" is a drain
//! followed by a fill and "clear" is a drain. Both are non-atomic; the result
//! partitions exactly which lines landed so a caller can scope a retry.

use cartkeep_core::{CartContents, CartSnapshot, Error, ErrorKind, Response, Result, StepPolicy};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::CartService;

/// One line the remote refused or never answered for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineFailure {
    pub product_id: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl LineFailure {
    fn new(product_id: &str, err: &Error) -> Self {
        Self {
            product_id: product_id.to_string(),
            error: err.to_string(),
            status: err.status(),
        }
    }
}

/// Outcome of a single-line call. Never an `Err`: batch callers keep going.
#[derive(Debug, Clone, PartialEq)]
pub enum LineResult {
    Applied { product_id: String, data: Value },
    Failed(LineFailure),
}

impl LineResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, LineResult::Applied { .. })
    }

    pub fn product_id(&self) -> &str {
        match self {
            LineResult::Applied { product_id, .. } => product_id,
            LineResult::Failed(f) => &f.product_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Every target line was added.
    Loaded { loaded: usize },
    /// Every present line was removed.
    Cleared { cleared: usize },
    /// Clear found nothing to remove and issued no remove call.
    AlreadyEmpty,
    /// At least one line failed; `successes` and `errors` partition the lines attempted.
    Failed {
        message: String,
        successes: Vec<String>,
        errors: Vec<LineFailure>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub outcome: BatchOutcome,
    /// Best-effort drain failures that did not decide the outcome.
    pub warnings: Vec<LineFailure>,
    /// Set when the best-effort pre-clear fetch failed and the drain was skipped.
    pub pre_clear_error: Option<String>,
}

impl BatchResult {
    fn new(outcome: BatchOutcome) -> Self {
        Self {
            outcome,
            warnings: Vec::new(),
            pre_clear_error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, BatchOutcome::Failed { .. })
    }

    pub fn failed_ids(&self) -> Vec<String> {
        match &self.outcome {
            BatchOutcome::Failed { errors, .. } => {
                errors.iter().map(|e| e.product_id.clone()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn into_response(self) -> Response {
        let mut response = match self.outcome {
            BatchOutcome::Loaded { loaded } => Response::ok().with("loaded", loaded),
            BatchOutcome::Cleared { cleared } => Response::ok().with("cleared", cleared),
            BatchOutcome::AlreadyEmpty => Response::ok()
                .with("alreadyEmpty", true)
                .with("message", "Cart is already empty"),
            BatchOutcome::Failed {
                message,
                successes,
                errors,
            } => Response {
                success: false,
                error: Some(message),
                error_kind: Some(ErrorKind::Service),
                ..Response::ok()
            }
            .with("successes", successes)
            .with("errors", errors),
        };
        if !self.warnings.is_empty() {
            response = response.with("warnings", self.warnings);
        }
        if let Some(err) = self.pre_clear_error {
            response = response.with("preClearError", err);
        }
        response
    }
}

impl From<BatchResult> for Response {
    fn from(result: BatchResult) -> Self {
        result.into_response()
    }
}

/// Drives the remote cart one line at a time.
///
/// Line operations inside one call are issued strictly in order and never
/// overlap. Separate calls on the same engine are not serialized against each
/// other.
#[derive(Clone)]
pub struct CartSyncEngine {
    service: Arc<dyn CartService>,
    pre_clear: StepPolicy,
}

impl CartSyncEngine {
    pub fn new(service: Arc<dyn CartService>) -> Self {
        Self {
            service,
            pre_clear: StepPolicy::BestEffort,
        }
    }

    /// Policy for the drain that precedes [`replace_cart`](Self::replace_cart).
    /// `BestEffort` is deliberate: the fill re-creates the desired state anyway.
    pub fn with_pre_clear_policy(mut self, policy: StepPolicy) -> Self {
        self.pre_clear = policy;
        self
    }

    pub fn pre_clear_policy(&self) -> StepPolicy {
        self.pre_clear
    }

    pub async fn fetch_cart(&self) -> Result<CartContents> {
        self.service.get_cart().await.map_err(|e| {
            error!(error = %e, "Error fetching cart");
            e
        })
    }

    pub async fn add_line(&self, product_id: &str, quantity: u32) -> LineResult {
        let result = self.service.add_line(product_id, quantity).await;
        line_result(product_id, result, "adding")
    }

    pub async fn update_line(&self, product_id: &str, quantity: u32) -> LineResult {
        let result = self.service.update_line(product_id, quantity).await;
        line_result(product_id, result, "updating")
    }

    pub async fn remove_line(&self, product_id: &str) -> LineResult {
        let result = self.service.remove_line(product_id).await;
        line_result(product_id, result, "removing")
    }

    /// Make the remote cart hold exactly `target`: drain what is there, then
    /// add every target line in order.
    ///
    /// Fails before any remote call if `target` is empty or has an invalid line.
    pub async fn replace_cart(&self, target: &CartSnapshot) -> Result<BatchResult> {
        if target.is_empty() {
            return Err(Error::Validation("No products to load".to_string()));
        }
        target.validate()?;

        let mut pre_clear_error = None;
        let mut warnings = Vec::new();

        match self.service.get_cart().await {
            Ok(current) => {
                for line in &current.products {
                    if let LineResult::Failed(failure) = self.remove_line(&line.product_id).await {
                        warn!(
                            product_id = %failure.product_id,
                            error = %failure.error,
                            "Failed to remove product before loading"
                        );
                        warnings.push(failure);
                    }
                }
            }
            Err(e) => {
                if self.pre_clear == StepPolicy::Required {
                    error!(error = %e, "Could not read cart before loading");
                    return Err(e);
                }
                warn!(error = %e, "Error clearing cart before loading, continuing anyway");
                pre_clear_error = Some(e.to_string());
            }
        }

        if self.pre_clear == StepPolicy::Required && !warnings.is_empty() {
            let message = format!(
                "Failed to clear {} product(s) before loading",
                warnings.len()
            );
            return Ok(BatchResult::new(BatchOutcome::Failed {
                message,
                successes: Vec::new(),
                errors: warnings,
            }));
        }

        let mut successes = Vec::new();
        let mut errors = Vec::new();
        for line in target {
            match self.add_line(&line.product_id, line.quantity).await {
                LineResult::Applied { product_id, .. } => successes.push(product_id),
                LineResult::Failed(failure) => errors.push(failure),
            }
        }

        let outcome = if errors.is_empty() {
            info!(loaded = successes.len(), "Cart loaded");
            BatchOutcome::Loaded {
                loaded: successes.len(),
            }
        } else {
            warn!(loaded = successes.len(), failed = errors.len(), "Cart partially loaded");
            BatchOutcome::Failed {
                message: format!(
                    "Failed to load {} product(s). Some products may be out of stock or no longer available.",
                    errors.len()
                ),
                successes,
                errors,
            }
        };

        Ok(BatchResult {
            outcome,
            warnings,
            pre_clear_error,
        })
    }

    /// Remove every line currently in the remote cart.
    pub async fn clear_cart(&self) -> Result<BatchResult> {
        let current = self.fetch_cart().await?;
        if current.is_empty() {
            debug!("Cart is already empty");
            return Ok(BatchResult::new(BatchOutcome::AlreadyEmpty));
        }

        let mut removed = Vec::new();
        let mut errors = Vec::new();
        for line in &current.products {
            match self.remove_line(&line.product_id).await {
                LineResult::Applied { product_id, .. } => removed.push(product_id),
                LineResult::Failed(failure) => errors.push(failure),
            }
        }

        let outcome = if errors.is_empty() {
            info!(cleared = removed.len(), "Cart cleared");
            BatchOutcome::Cleared {
                cleared: removed.len(),
            }
        } else {
            BatchOutcome::Failed {
                message: format!("Failed to remove {} product(s)", errors.len()),
                successes: removed,
                errors,
            }
        };
        Ok(BatchResult::new(outcome))
    }
}

fn line_result(product_id: &str, result: Result<Value>, verb: &str) -> LineResult {
    match result {
        Ok(data) => {
            debug!(product_id, "Done {} product", verb);
            LineResult::Applied {
                product_id: product_id.to_string(),
                data,
            }
        }
        Err(e) => {
            error!(product_id, error = %e, "Error {} product", verb);
            LineResult::Failed(LineFailure::new(product_id, &e))
        }
    }
}
