use async_trait::async_trait;
use serde_json::Value;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{InvocationRequest, Prediction, Predictor};
use crate::config::InvokerConfig;
use crate::consts::GENERIC_FAILURE;
use crate::error::{InvokeError, SpawnError};
use crate::events::{Event, EventBus, Terminal};

/// Runs the bundled predictor executable, one child process per call.
///
/// Calls are independent: nothing but the id counter is shared, so the same
/// invoker can serve concurrent predictions. There is no timeout; a hung
/// child hangs its caller.
pub struct ProcessInvoker {
    config: InvokerConfig,
    events: Option<Arc<EventBus>>,
    next_id: AtomicU64,
}

impl ProcessInvoker {
    pub fn new(config: InvokerConfig) -> Self {
        Self {
            config,
            events: None,
            next_id: AtomicU64::new(0),
        }
    }

    /// Publish lifecycle transitions to `bus`.
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.events {
            bus.emit(event);
        }
    }

    /// Run the predictor once and classify its outcome.
    pub async fn invoke(&self, request: &InvocationRequest) -> Result<Prediction, InvokeError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let result = self.run(id, request).await;

        let terminal = match &result {
            Ok(prediction) => {
                info!(id, prediction = prediction.prediction, "Prediction succeeded");
                Terminal::Succeeded
            }
            Err(e) => {
                let terminal = e.terminal();
                warn!(id, %terminal, error = %e, "Prediction failed");
                terminal
            }
        };
        self.emit(Event::Finished { id, terminal });

        result
    }

    async fn run(&self, id: u64, request: &InvocationRequest) -> Result<Prediction, InvokeError> {
        let path = self.config.executable_path();
        let args = request.args();

        info!(id, executable = %path.display(), args = ?args, "Spawning executable");
        self.emit(Event::Spawning {
            id,
            path: path.clone(),
        });

        let child = Command::new(&path)
            .args(&args)
            .current_dir(self.config.absolute_root())
            .env_clear()
            .envs(self.config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| spawn_error(&path, source))?;

        let pid = child.id();
        debug!(id, pid = ?pid, "Child running");
        self.emit(Event::Running { id, pid });

        // Reads stdout and stderr to EOF, then reaps the child.
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| InvokeError::Execution {
                code: None,
                message: format!("failed to collect child output: {e}"),
            })?;

        let code = output.status.code();
        debug!(
            id,
            code = ?code,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "Child exited"
        );
        self.emit(Event::Exited { id, code });

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        interpret(code, &stdout, &stderr)
    }
}

#[async_trait]
impl Predictor for ProcessInvoker {
    async fn predict(&self, request: &InvocationRequest) -> Result<Prediction, InvokeError> {
        self.invoke(request).await
    }
}

fn spawn_error(path: &Path, source: io::Error) -> InvokeError {
    // ENOENT also covers a missing working directory; only blame the
    // executable when it is really absent.
    let err = if source.kind() == io::ErrorKind::NotFound && !path.exists() {
        SpawnError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        SpawnError::Other {
            path: path.to_path_buf(),
            source,
        }
    };
    InvokeError::Spawn(err)
}

/// Classify a finished child from its exit code and captured output.
///
/// `code` is `None` when the child was killed by a signal.
pub fn interpret(code: Option<i32>, stdout: &str, stderr: &str) -> Result<Prediction, InvokeError> {
    if code != Some(0) {
        let diagnostic = if stderr.trim().is_empty() { stdout } else { stderr };
        return Err(InvokeError::Execution {
            code,
            message: diagnostic.trim_end().to_string(),
        });
    }

    let fields = match parse_output(stdout)? {
        Value::Object(fields) => fields,
        // A bare `null` has no fields to inspect at all.
        Value::Null => {
            return Err(InvokeError::Parse {
                message: "result is null, expected an object".to_string(),
                output: stdout.to_string(),
            });
        }
        _ => return Err(InvokeError::Application(GENERIC_FAILURE.to_string())),
    };

    if !is_truthy(fields.get("success")) {
        return Err(InvokeError::Application(failure_message(fields.get("error"))));
    }

    Prediction::from_fields(fields).ok_or_else(|| InvokeError::Parse {
        message: "missing numeric `prediction` field".to_string(),
        output: stdout.to_string(),
    })
}

/// Parse stdout as one JSON document. If that fails, accept a JSON object on
/// the last non-empty line, since the predictor may log before its result.
fn parse_output(stdout: &str) -> Result<Value, InvokeError> {
    match serde_json::from_str::<Value>(stdout) {
        Ok(value) => Ok(value),
        Err(err) => stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .and_then(|line| serde_json::from_str::<Value>(line).ok())
            .filter(Value::is_object)
            .ok_or_else(|| InvokeError::Parse {
                message: err.to_string(),
                output: stdout.to_string(),
            }),
    }
}

/// Loose truthiness: `false`, `null`, `0`, `""` and absent are falsy.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

fn failure_message(error: Option<&Value>) -> String {
    match error {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(value) if is_truthy(Some(value)) => value.to_string(),
        _ => GENERIC_FAILURE.to_string(),
    }
}
