use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::errors::{ToolError, ToolErrorKind, ToolResult};
use crate::models::tool::{ArgValue, ParamType, ToolArgs, ToolCall, ToolParameter};
use crate::registry::ToolRegistry;

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Argument keys whose values are masked in logs
const SENSITIVE_KEYS: [&str; 5] = ["key", "token", "secret", "password", "email"];

/// Resolves tool calls against the registry and turns every outcome into text.
///
/// `invoke` is total: unknown tools, invalid arguments, handler errors, panics
/// and timeouts all come back as a descriptive string.
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolInvoker {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Deadline for a single handler execution
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn invoke(&self, request: &ToolCall) -> String {
        let started = Instant::now();
        let outcome = self.dispatch(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let arguments = redact_arguments(&request.arguments);

        match outcome {
            Ok(output) => {
                info!(tool = %request.name, %arguments, outcome = "success", elapsed_ms, "tool call completed");
                output
            }
            Err(err) => {
                match err.kind {
                    ToolErrorKind::UpstreamFailure | ToolErrorKind::ExecutionFailure => {
                        error!(tool = %request.name, %arguments, outcome = %err.kind, elapsed_ms, error = %err.message, "tool call failed")
                    }
                    _ => {
                        warn!(tool = %request.name, %arguments, outcome = %err.kind, elapsed_ms, error = %err.message, "tool call refused")
                    }
                }
                err.render()
            }
        }
    }

    async fn dispatch(&self, request: &ToolCall) -> ToolResult<String> {
        let definition = self
            .registry
            .lookup(&request.name)
            .ok_or_else(|| ToolError::not_found(format!("Tool not found: {}", request.name)))?;

        let args = validate_arguments(definition.parameters(), &request.arguments)?;
        let execution = AssertUnwindSafe(definition.call(args)).catch_unwind();

        match tokio::time::timeout(self.timeout, execution).await {
            Err(_) => Err(ToolError::upstream("timeout")),
            Ok(Err(panic)) => Err(ToolError::execution(panic_message(panic.as_ref()))),
            Ok(Ok(result)) => result,
        }
    }
}

/// Check call arguments against the declared parameters and coerce them.
///
/// Required parameters must be present and convertible; `null` counts as absent;
/// undeclared keys are ignored.
pub fn validate_arguments(parameters: &[ToolParameter], arguments: &Value) -> ToolResult<ToolArgs> {
    let empty = Map::new();
    let provided = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(ToolError::invalid_argument(format!(
                "Tool arguments must be a JSON object, got {}",
                other
            )))
        }
    };

    let mut args = ToolArgs::new();
    for parameter in parameters {
        match provided.get(&parameter.name) {
            None | Some(Value::Null) => {
                if parameter.required {
                    return Err(ToolError::invalid_argument(format!(
                        "Missing required parameter '{}'",
                        parameter.name
                    )));
                }
            }
            Some(value) => {
                let coerced = coerce(parameter.param_type, value).ok_or_else(|| {
                    ToolError::invalid_argument(format!(
                        "Parameter '{}' must be {}, got {}",
                        parameter.name, parameter.param_type, value
                    ))
                })?;
                args.insert(parameter.name.clone(), coerced);
            }
        }
    }
    Ok(args)
}

fn coerce(param_type: ParamType, value: &Value) -> Option<ArgValue> {
    match (param_type, value) {
        (ParamType::String, Value::String(s)) => Some(ArgValue::String(s.clone())),
        (ParamType::Integer, Value::Number(n)) => n.as_i64().map(ArgValue::Integer),
        (ParamType::Integer, Value::String(s)) => s.trim().parse().ok().map(ArgValue::Integer),
        (ParamType::Boolean, Value::Bool(b)) => Some(ArgValue::Boolean(*b)),
        (ParamType::Boolean, Value::String(s)) => match s.trim() {
            "true" => Some(ArgValue::Boolean(true)),
            "false" => Some(ArgValue::Boolean(false)),
            _ => None,
        },
        _ => None,
    }
}

/// Copy of the arguments with secret-looking or personal values masked
pub fn redact_arguments(arguments: &Value) -> Value {
    match arguments {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let lowered = key.to_lowercase();
                    if SENSITIVE_KEYS.iter().any(|s| lowered.contains(s)) {
                        (key.clone(), Value::String("***".to_string()))
                    } else {
                        (key.clone(), redact_arguments(value))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_arguments).collect()),
        other => other.clone(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
