use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::errors::{ToolError, ToolResult};

/// A tool as advertised to a model: name, description and JSON schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// JSON schema of the parameters the tool accepts
    pub input_schema: Value,
}

impl Tool {
    /// Create a new tool with the given name and description
    pub fn new<N, D>(name: N, description: D, input_schema: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// A tool call request, as chosen by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// The name of the tool to execute
    pub name: String,
    /// The arguments for the execution, keyed by parameter name
    pub arguments: Value,
}

impl ToolCall {
    pub fn new<S: Into<String>>(name: S, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Semantic type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
}

impl ParamType {
    fn json_type(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamType::String => "a string",
            ParamType::Integer => "an integer",
            ParamType::Boolean => "a boolean",
        })
    }
}

/// One declared parameter of a tool. Optional parameters may be absent from a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub description: String,
}

impl ToolParameter {
    pub fn required<N: Into<String>, D: Into<String>>(
        name: N,
        param_type: ParamType,
        description: D,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            description: description.into(),
        }
    }

    pub fn optional<N: Into<String>, D: Into<String>>(
        name: N,
        param_type: ParamType,
        description: D,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }
}

/// A validated, type-coerced argument value
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

/// Arguments of a tool call after validation against the parameter list.
///
/// Only declared parameters that were present in the call are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs {
    values: HashMap<String, ArgValue>,
}

impl ToolArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    pub fn with<S: Into<String>>(mut self, name: S, value: ArgValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn str(&self, name: &str) -> ToolResult<&str> {
        self.opt_str(name)?.ok_or_else(|| missing(name))
    }

    pub fn opt_str(&self, name: &str) -> ToolResult<Option<&str>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(ArgValue::String(value)) => Ok(Some(value)),
            Some(_) => Err(mistyped(name, ParamType::String)),
        }
    }

    pub fn int(&self, name: &str) -> ToolResult<i64> {
        self.opt_int(name)?.ok_or_else(|| missing(name))
    }

    pub fn opt_int(&self, name: &str) -> ToolResult<Option<i64>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(ArgValue::Integer(value)) => Ok(Some(*value)),
            Some(_) => Err(mistyped(name, ParamType::Integer)),
        }
    }

    pub fn bool(&self, name: &str) -> ToolResult<bool> {
        match self.values.get(name) {
            None => Err(missing(name)),
            Some(ArgValue::Boolean(value)) => Ok(*value),
            Some(_) => Err(mistyped(name, ParamType::Boolean)),
        }
    }
}

fn missing(name: &str) -> ToolError {
    ToolError::invalid_argument(format!("Missing required parameter '{}'", name))
}

fn mistyped(name: &str, expected: ParamType) -> ToolError {
    ToolError::invalid_argument(format!("Parameter '{}' must be {}", name, expected))
}

/// Handler invoked with validated arguments, producing the tool's text output
pub type ToolHandler = Arc<dyn Fn(ToolArgs) -> BoxFuture<'static, ToolResult<String>> + Send + Sync>;

/// A named, invocable operation: metadata, parameter list and handler.
#[derive(Clone)]
pub struct ToolDefinition {
    name: String,
    description: String,
    parameters: Vec<ToolParameter>,
    handler: ToolHandler,
}

impl ToolDefinition {
    pub fn new<N, D, F, Fut>(name: N, description: D, handler: F) -> Self
    where
        N: Into<String>,
        D: Into<String>,
        F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult<String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }

    pub fn with_param(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[ToolParameter] {
        &self.parameters
    }

    /// Run the handler. Arguments are expected to be validated already.
    pub fn call(&self, args: ToolArgs) -> BoxFuture<'static, ToolResult<String>> {
        (self.handler)(args)
    }

    /// JSON schema object describing the parameters
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for parameter in &self.parameters {
            properties.insert(
                parameter.name.clone(),
                json!({
                    "type": parameter.param_type.json_type(),
                    "description": parameter.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// The catalog entry advertised to the orchestrator
    pub fn to_tool(&self) -> Tool {
        Tool::new(&self.name, &self.description, self.input_schema())
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Adapt a method on a shared tool collection into a handler.
///
/// `bind(&tools, |t, args| async move { t.get_regions(args).await })`
pub fn bind<T, F, Fut>(target: &Arc<T>, f: F) -> impl Fn(ToolArgs) -> Fut + Send + Sync + 'static
where
    T: Send + Sync + ?Sized + 'static,
    F: Fn(Arc<T>, ToolArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult<String>> + Send + 'static,
{
    let target = Arc::clone(target);
    move |args| f(Arc::clone(&target), args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ToolErrorKind;

    fn echo_definition() -> ToolDefinition {
        ToolDefinition::new("echo", "Echoes the message", |args: ToolArgs| async move {
            Ok::<_, ToolError>(args.str("message")?.to_string())
        })
        .with_param(ToolParameter::required(
            "message",
            ParamType::String,
            "Text to echo",
        ))
        .with_param(ToolParameter::optional(
            "times",
            ParamType::Integer,
            "How often to repeat",
        ))
    }

    #[test]
    fn test_input_schema_lists_required_parameters_only() {
        let schema = echo_definition().input_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["message"]["type"], "string");
        assert_eq!(schema["properties"]["times"]["type"], "integer");
        assert_eq!(schema["required"], json!(["message"]));
    }

    #[tokio::test]
    async fn test_call_runs_handler() {
        let args = ToolArgs::new().with("message", ArgValue::String("hi".into()));
        let output = echo_definition().call(args).await.unwrap();
        assert_eq!(output, "hi");
    }

    #[test]
    fn test_args_accessors_report_missing_and_mistyped() {
        let args = ToolArgs::new()
            .with("regionId", ArgValue::Integer(3))
            .with("name", ArgValue::String("Kim".into()));

        assert_eq!(args.int("regionId").unwrap(), 3);
        assert_eq!(args.opt_str("email").unwrap(), None);

        let err = args.str("regionId").unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidArgument);
        assert!(err.message.contains("regionId"));

        let err = args.int("userId").unwrap_err();
        assert!(err.message.contains("userId"));
    }
}
