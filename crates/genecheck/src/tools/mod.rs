//! Tool registry for the verification agent.
//!
//! A registry maps tool names to an invocable [`Tool`] plus the function
//! schema shown to the model. It is built once per run and shared read-only.
//!
//! Model-requested calls are never dispatched blindly: the raw request is
//! decoded into a [`ToolRequest`], the name is resolved, the arguments are
//! checked against the tool's JSON Schema, and only then is the tool invoked.
//! Each step failing yields a [`ToolError`] that the agent shows the model.

pub mod catalog;
pub mod fake;

use async_trait::async_trait;
use gene_shared::{ToolCall, ToolError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub use catalog::{build_registry, HttpTool};
pub use fake::FakeTool;

// ============================================================================
// Tool trait
// ============================================================================

/// An external lookup function.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Run the lookup with already-validated arguments.
    async fn invoke(&self, args: &Value) -> Result<Value, ToolError>;
}

/// Build an OpenAI-style function schema.
pub fn function_schema(name: &str, description: &str, parameters: Value) -> Value {
    serde_json::json!({
        "name": name,
        "description": description,
        "parameters": parameters,
    })
}

/// A registered tool.
pub struct ToolDescriptor {
    name: String,
    schema: Value,
    validator: Option<jsonschema::Validator>,
    tool: Arc<dyn Tool>,
}

impl ToolDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Check `args` against the schema's `parameters`, if it declares any.
    pub fn validate(&self, args: &Value) -> Result<(), ToolError> {
        let Some(validator) = &self.validator else {
            return Ok(());
        };
        let errors: Vec<String> = validator
            .iter_errors(args)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ToolError::InvalidArguments {
                tool: self.name.clone(),
                reason: errors.join("; "),
            })
        }
    }

    pub async fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
        self.tool.invoke(args).await
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Requests
// ============================================================================

/// A decoded tool request: a name and a JSON object of arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub name: String,
    pub args: Value,
}

impl ToolRequest {
    /// Decode the raw call. Empty arguments mean `{}`.
    pub fn decode(call: &ToolCall) -> Result<Self, ToolError> {
        let raw = call.arguments.trim();
        let args = if raw.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str::<Value>(raw).map_err(|e| ToolError::MalformedArguments {
                tool: call.name.clone(),
                reason: e.to_string(),
            })?
        };

        if !args.is_object() {
            return Err(ToolError::MalformedArguments {
                tool: call.name.clone(),
                reason: format!("expected an object, got {}", args),
            });
        }

        Ok(Self {
            name: call.name.clone(),
            args,
        })
    }
}

/// Result of one dispatch, ready to be rendered for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Arguments as shown back to the model
    pub params: String,
    pub result: Result<Value, ToolError>,
}

impl Dispatch {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Tool-turn text describing the call and its outcome.
    pub fn render(&self) -> String {
        match &self.result {
            Ok(value) => format!(
                "Function has been called with params {}, and returns {}.",
                self.params,
                value_text(value)
            ),
            Err(e) => format!(
                "Function has been called with params {}, but returned error: {}. Please try again with the correct parameter.",
                self.params, e
            ),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Ordered collection of tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tool` under `name`.
    ///
    /// Re-registering a name replaces the entry in place. Fails if the
    /// schema's `parameters` is not a valid JSON Schema.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        schema: Value,
        tool: Arc<dyn Tool>,
    ) -> Result<(), ToolError> {
        let name = name.into();
        let validator = match schema.get("parameters") {
            Some(parameters) => Some(jsonschema::validator_for(parameters).map_err(|e| {
                ToolError::InvalidArguments {
                    tool: name.clone(),
                    reason: format!("invalid parameter schema: {}", e),
                }
            })?),
            None => None,
        };

        let descriptor = ToolDescriptor {
            name: name.clone(),
            schema,
            validator,
            tool,
        };

        match self.index.get(&name) {
            Some(&slot) => self.tools[slot] = descriptor,
            None => {
                self.index.insert(name.clone(), self.tools.len());
                self.tools.push(descriptor);
            }
        }
        debug!("Registered tool {}", name);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&ToolDescriptor, ToolError> {
        self.index
            .get(name)
            .map(|&slot| &self.tools[slot])
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Schemas in registration order, as passed to the model.
    pub fn schemas(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.schema.clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve a decoded request and validate its arguments.
    pub fn validate(&self, request: &ToolRequest) -> Result<&ToolDescriptor, ToolError> {
        let descriptor = self.lookup(&request.name)?;
        descriptor.validate(&request.args)?;
        Ok(descriptor)
    }

    /// Decode, validate and invoke a model-requested call.
    pub async fn dispatch(&self, call: &ToolCall) -> Dispatch {
        let request = match ToolRequest::decode(call) {
            Ok(request) => request,
            Err(e) => {
                return Dispatch {
                    params: call.arguments.clone(),
                    result: Err(e),
                }
            }
        };

        let params = request.args.to_string();
        let result = match self.validate(&request) {
            Ok(descriptor) => {
                info!("Invoking tool {} with {}", request.name, params);
                descriptor.invoke(&request.args).await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            debug!("Tool {} failed: {}", request.name, e);
        }
        Dispatch { params, result }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
