pub mod mock;
pub mod process;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{InvokeError, RequestError};

/// Input for a single prediction: an area and an optional model file.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    area: f64,
    model_path: Option<PathBuf>,
}

impl InvocationRequest {
    /// Rejects non-finite areas, which have no safe decimal token.
    pub fn new(area: f64, model_path: Option<PathBuf>) -> Result<Self, RequestError> {
        if !area.is_finite() {
            return Err(RequestError::NonFinite(area));
        }
        Ok(Self { area, model_path })
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    /// Not checked for existence; the child reports a missing model itself.
    pub fn model_path(&self) -> Option<&PathBuf> {
        self.model_path.as_ref()
    }

    /// Positional arguments for the child: the decimal area, then the model path.
    /// The path is passed through byte for byte, UTF-8 or not.
    pub fn args(&self) -> Vec<OsString> {
        let mut args = vec![OsString::from(self.area.to_string())];
        if let Some(path) = &self.model_path {
            args.push(path.as_os_str().to_owned());
        }
        args
    }
}

/// A successful prediction.
///
/// `fields` holds the whole object the predictor printed, including keys
/// this crate does not know about.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub prediction: f64,
    pub area: Option<f64>,
    pub model_coefficient: Option<f64>,
    pub model_intercept: Option<f64>,
    pub fields: Map<String, Value>,
}

impl Prediction {
    /// Build from a parsed result object. `None` if `prediction` is missing
    /// or not a number.
    pub fn from_fields(fields: Map<String, Value>) -> Option<Self> {
        let number = |key: &str| fields.get(key).and_then(Value::as_f64);
        Some(Self {
            prediction: number("prediction")?,
            area: number("area"),
            model_coefficient: number("model_coefficient"),
            model_intercept: number("model_intercept"),
            fields,
        })
    }

    /// The raw result object as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Something that turns an area into a price.
/// Could be the bundled executable or a test script.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, request: &InvocationRequest) -> Result<Prediction, InvokeError>;
}
