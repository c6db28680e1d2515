use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use super::{InvocationRequest, Prediction, Predictor};
use crate::error::InvokeError;

/// A scripted predictor for tests. Returns pre-defined outcomes in order
/// and records every request it was asked to handle.
pub struct MockPredictor {
    outcomes: Mutex<VecDeque<Result<Prediction, InvokeError>>>,
    requests: Mutex<Vec<InvocationRequest>>,
}

impl MockPredictor {
    pub fn new(outcomes: Vec<Result<Prediction, InvokeError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<InvocationRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl Predictor for MockPredictor {
    async fn predict(&self, request: &InvocationRequest) -> Result<Prediction, InvokeError> {
        let calls = {
            let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
            requests.push(request.clone());
            requests.len()
        };
        let next = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        next.unwrap_or_else(|| {
            Err(InvokeError::Application(format!(
                "MockPredictor: no more outcomes (called {} times)",
                calls
            )))
        })
    }
}
