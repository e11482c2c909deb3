//! Tool trait and registry: the host-facing surface of the engine.
//!
//! Every capability is exposed as a [`Tool`] with a JSON parameter schema.
//! The HTTP server lists and dispatches tools through a [`ToolRegistry`];
//! text hosts call [`ToolRegistry::call_text`], which never fails and turns
//! any error into an `"Error <context>: <message>"` string.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 ToolRegistry                 │
//! │  search_properties   lookup_source   locate  │
//! │  summarize   summarize_validated             │
//! │  analyze_implementation                      │
//! └──────────────┬───────────────────────────────┘
//!                ▼
//!      validate_params() → Tool::execute(params, &ToolContext)
//!                              │
//!                              ▼
//!                       Arc<Engine>
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vhal_lookup::config::Config;
//! use vhal_lookup::engine::Engine;
//! use vhal_lookup::traits::{ToolContext, ToolRegistry};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let engine = Arc::new(Engine::from_config(&Config::default())?);
//! let tools = ToolRegistry::with_builtins();
//! let ctx = ToolContext::new(engine);
//! let text = tools
//!     .call_text("lookup_source", serde_json::json!({ "keyword": "memory" }), &ctx)
//!     .await;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use vhal_lookup_core::locator::ResourceKey;

use crate::engine::Engine;

/// Default `max_sources` for `summarize_validated`.
pub const DEFAULT_MAX_SOURCES: u64 = 10;

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A capability that hosts can discover and call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Route name (`POST /tools/{name}`), lowercase with underscores.
    fn name(&self) -> &str;

    /// One-line description for discovery.
    fn description(&self) -> &str;

    /// Whether this tool ships with the crate. Defaults to `false`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// Prefix used when a failure is rendered as text.
    fn error_context(&self) -> &str {
        "Error running tool"
    }

    /// JSON Schema for the parameters object.
    fn parameters_schema(&self) -> Value;

    /// Execute with parameters that already passed [`validate_params`].
    ///
    /// Text-producing tools return `{ "text": ... }`.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Shared engine handed to every tool call.
#[derive(Clone)]
pub struct ToolContext {
    engine: Arc<Engine>,
}

impl ToolContext {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

/// Serializable tool info for the `/tools/list` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub builtin: bool,
    pub parameters: Value,
}

impl ToolInfo {
    pub fn of(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            builtin: tool.is_builtin(),
            parameters: tool.parameters_schema(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter validation
// ═══════════════════════════════════════════════════════════════════════

/// Check `params` against a tool's schema and fill in defaults.
///
/// Understands what the tool schemas here declare: `required`, the
/// `string`, `boolean`, and `integer` types, string `enum`s, and integer
/// `minimum`. Unknown fields pass through.
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value> {
    let mut params = match params {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        other => bail!("parameters must be an object, got {}", json_type_name(other)),
    };

    let required = schema["required"].as_array().into_iter().flatten();
    for field in required.filter_map(Value::as_str) {
        if !params.contains_key(field) {
            bail!("missing required parameter: {}", field);
        }
    }

    let Some(properties) = schema["properties"].as_object() else {
        return Ok(Value::Object(params));
    };
    for (name, spec) in properties {
        match params.get(name) {
            Some(value) => check_param(name, spec, value)?,
            None => {
                if let Some(default) = spec.get("default") {
                    params.insert(name.clone(), default.clone());
                }
            }
        }
    }

    Ok(Value::Object(params))
}

fn check_param(name: &str, spec: &Value, value: &Value) -> Result<()> {
    let expected = spec["type"].as_str().unwrap_or("any");
    let mismatch = || {
        anyhow::anyhow!(
            "parameter '{}' must be of type '{}', got {}",
            name,
            expected,
            json_type_name(value)
        )
    };

    match expected {
        "string" => {
            let s = value.as_str().ok_or_else(mismatch)?;
            if let Some(allowed) = spec["enum"].as_array() {
                if !allowed.iter().any(|a| a.as_str() == Some(s)) {
                    let names: Vec<&str> = allowed.iter().filter_map(Value::as_str).collect();
                    bail!(
                        "parameter '{}' must be one of [{}], got {}",
                        name,
                        names.join(", "),
                        value
                    );
                }
            }
        }
        "boolean" => {
            value.as_bool().ok_or_else(mismatch)?;
        }
        "integer" => {
            let n = value.as_i64().ok_or_else(mismatch)?;
            if let Some(min) = spec["minimum"].as_i64() {
                if n < min {
                    bail!("{} must be at least {}", name, min);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Non-blank string parameter `name`.
fn required_str<'a>(params: &'a Value, name: &str) -> Result<&'a str> {
    let value = params[name].as_str().unwrap_or("").trim();
    if value.is_empty() {
        bail!("{} must not be empty", name);
    }
    Ok(value)
}

fn optional_str<'a>(params: &'a Value, name: &str) -> Option<&'a str> {
    params[name].as_str().map(str::trim).filter(|s| !s.is_empty())
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations
// ═══════════════════════════════════════════════════════════════════════

/// Catalog search. Returns matching records, most relevant first.
pub struct SearchPropertiesTool;

#[async_trait]
impl Tool for SearchPropertiesTool {
    fn name(&self) -> &str {
        "search_properties"
    }

    fn description(&self) -> &str {
        "Search the vehicle property catalog by name, name fragment, or category"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn error_context(&self) -> &str {
        "Error searching vehicle properties"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keyword": { "type": "string", "description": "Property name, fragment, or category" }
            },
            "required": ["keyword"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let keyword = required_str(&params, "keyword")?;
        let records = ctx.engine().search(keyword);
        Ok(json!({ "count": records.len(), "records": records }))
    }
}

/// Source lookup report for a keyword.
pub struct LookupSourceTool;

#[async_trait]
impl Tool for LookupSourceTool {
    fn name(&self) -> &str {
        "lookup_source"
    }

    fn description(&self) -> &str {
        "Find vehicle property definitions and where their Android sources live"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn error_context(&self) -> &str {
        "Error during Android source code lookup"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keyword": { "type": "string", "description": "Property name or fragment" }
            },
            "required": ["keyword"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let keyword = required_str(&params, "keyword")?;
        Ok(json!({ "text": ctx.engine().lookup(keyword) }))
    }
}

/// Relevance-ranked summary of the vHAL documentation.
pub struct SummarizeTool;

#[async_trait]
impl Tool for SummarizeTool {
    fn name(&self) -> &str {
        "summarize"
    }

    fn description(&self) -> &str {
        "Summarize the vHAL documentation for a question"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn error_context(&self) -> &str {
        "Error generating vHAL summary"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": { "type": "string", "description": "Question about the vehicle HAL" }
            },
            "required": ["question"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let question = required_str(&params, "question")?;
        Ok(json!({ "text": ctx.engine().summarize(question).await }))
    }
}

/// Summary annotated with source validation and a confidence score.
pub struct SummarizeValidatedTool;

#[async_trait]
impl Tool for SummarizeValidatedTool {
    fn name(&self) -> &str {
        "summarize_validated"
    }

    fn description(&self) -> &str {
        "Summarize the vHAL documentation and report how reliable each source is"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn error_context(&self) -> &str {
        "Error generating enhanced vHAL summary"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": { "type": "string", "description": "Question about the vehicle HAL" },
                "validate": { "type": "boolean", "description": "Probe each source", "default": true },
                "max_sources": {
                    "type": "integer",
                    "description": "Pages to read and validate",
                    "minimum": 1,
                    "default": DEFAULT_MAX_SOURCES
                }
            },
            "required": ["question"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let question = required_str(&params, "question")?;
        let validate = params["validate"].as_bool().unwrap_or(true);
        let max_sources = params["max_sources"]
            .as_u64()
            .unwrap_or(DEFAULT_MAX_SOURCES) as usize;
        let text = ctx
            .engine()
            .summarize_validated(question, validate, max_sources)
            .await;
        Ok(json!({ "text": text }))
    }
}

/// Fetch and analyze the source files behind one property.
pub struct AnalyzeImplementationTool;

#[async_trait]
impl Tool for AnalyzeImplementationTool {
    fn name(&self) -> &str {
        "analyze_implementation"
    }

    fn description(&self) -> &str {
        "Analyze how a vehicle property is implemented in the Android sources"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn error_context(&self) -> &str {
        "Error analyzing vHAL implementation"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "property_name": { "type": "string", "description": "Exact property name, e.g. SEAT_MEMORY_SELECT" },
                "version": { "type": "string", "description": "Android version, e.g. android14" }
            },
            "required": ["property_name"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let property = required_str(&params, "property_name")?;
        let version = optional_str(&params, "version");
        let analysis = ctx.engine().analyze(property, version).await;
        Ok(json!({ "text": analysis.render(), "analysis": analysis }))
    }
}

/// Candidate URLs for a resource key.
pub struct LocateTool;

#[async_trait]
impl Tool for LocateTool {
    fn name(&self) -> &str {
        "locate"
    }

    fn description(&self) -> &str {
        "List the candidate source URLs for a resource key, highest priority first"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn error_context(&self) -> &str {
        "Error locating vHAL resource"
    }

    fn parameters_schema(&self) -> Value {
        let keys: Vec<&str> = ResourceKey::ALL.iter().map(|k| k.as_str()).collect();
        json!({
            "type": "object",
            "properties": {
                "key": { "type": "string", "enum": keys },
                "version": { "type": "string", "description": "Android version, e.g. android13" }
            },
            "required": ["key"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let key = required_str(&params, "key")?;
        let version = optional_str(&params, "version");
        Ok(serde_json::to_value(ctx.engine().locate(key, version))?)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry of callable tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry pre-loaded with every built-in tool.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchPropertiesTool));
        registry.register(Box::new(LookupSourceTool));
        registry.register(Box::new(SummarizeTool));
        registry.register(Box::new(SummarizeValidatedTool));
        registry.register(Box::new(AnalyzeImplementationTool));
        registry.register(Box::new(LocateTool));
        registry
    }

    /// Register a tool. A later tool with the same name is shadowed by the earlier one.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn infos(&self) -> Vec<ToolInfo> {
        self.tools.iter().map(|t| ToolInfo::of(t.as_ref())).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Validate and execute `name`, returning structured JSON.
    pub async fn call(&self, name: &str, params: Value, ctx: &ToolContext) -> Result<Value> {
        let Some(tool) = self.find(name) else {
            bail!("no tool registered with name: {}", name);
        };
        let params = validate_params(&tool.parameters_schema(), &params)?;
        tool.execute(params, ctx).await
    }

    /// Text boundary: the `text` field of the result, or the result as
    /// pretty JSON. Failures come back as `"<error_context>: <message>"`.
    pub async fn call_text(&self, name: &str, params: Value, ctx: &ToolContext) -> String {
        let Some(tool) = self.find(name) else {
            return format!("Error: no tool registered with name: {}", name);
        };
        let outcome = match validate_params(&tool.parameters_schema(), &params) {
            Ok(params) => tool.execute(params, ctx).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(Value::Object(mut map)) if map.get("text").is_some_and(Value::is_string) => {
                match map.remove("text") {
                    Some(Value::String(text)) => text,
                    _ => String::new(),
                }
            }
            Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|e| {
                format!("{}: {}", tool.error_context(), e)
            }),
            Err(e) => format!("{}: {:#}", tool.error_context(), e),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
