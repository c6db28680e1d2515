//! Several predictions at once.

use crate::error::InvokeError;
use crate::predictor::{InvocationRequest, Prediction, Predictor};

/// One request and how it ended.
#[derive(Debug)]
pub struct BatchEntry {
    pub request: InvocationRequest,
    pub result: Result<Prediction, InvokeError>,
}

impl BatchEntry {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run every request concurrently. Results come back in input order and
/// one failure never affects the others.
pub async fn predict_all(
    predictor: &dyn Predictor,
    requests: Vec<InvocationRequest>,
) -> Vec<BatchEntry> {
    let futures: Vec<_> = requests
        .into_iter()
        .map(|request| async move {
            let result = predictor.predict(&request).await;
            BatchEntry { request, result }
        })
        .collect();

    futures::future::join_all(futures).await
}
