//! Integration tests for the tool layer.
//!
//! A local axum app stands in for both the documentation site and the
//! source hosts, so every tool runs end-to-end through the real fetcher,
//! cache, and HTTP server.

use anyhow::Result;
use async_trait::async_trait;
use axum::http::{StatusCode, Uri};
use axum::Router;
use base64::Engine as _;
use serde_json::{json, Value};
use std::sync::Arc;
use vhal_lookup::config::{parse_config, Config};
use vhal_lookup::engine::Engine;
use vhal_lookup::server::run_server_with_tools;
use vhal_lookup::traits::{Tool, ToolContext, ToolRegistry};

// ─── Upstream fixture ───────────────────────────────────────────────

const PROPERTY_AIDL: &str = "package android.hardware.automotive.vehicle;\n\
enum VehicleProperty {\n\
    INVALID = 0x00000000,\n\
    /** Seat memory select. */\n\
    SEAT_MEMORY_SELECT = 0x0B56 + VehiclePropertyGroup.SYSTEM + VehicleArea.SEAT,\n\
    SEAT_MEMORY_SET = 0x0B57 + VehiclePropertyGroup.SYSTEM + VehicleArea.SEAT,\n\
}\n";

const DEFAULT_PROPERTIES: &str = "{\n  \"properties\": [\n    {\n      \"property\": \"VehicleProperty::SEAT_MEMORY_SELECT\",\n      \"areas\": [{ \"areaId\": 1 }],\n      \"configArray\": [3]\n    }\n  ]\n}\n";

fn encoded(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text)
}

fn upstream() -> Router {
    Router::new().fallback(|uri: Uri| async move {
        let path = uri.path().to_string();
        let filler = "The vehicle HAL exposes vehicle properties to Android services. ".repeat(2);
        if path == "/docs/automotive/vhal" {
            return (
                StatusCode::OK,
                format!("<html><body><main>vHAL overview. {}</main></body></html>", filler),
            );
        }
        if path == "/docs/automotive/vhal/seat-steering" {
            return (
                StatusCode::OK,
                format!(
                    "<html><body><nav>menu</nav><main>Seat memory presets use SEAT_MEMORY_SELECT. {}</main></body></html>",
                    filler
                ),
            );
        }
        if path.ends_with("/VehicleProperty.aidl") {
            return (StatusCode::OK, encoded(PROPERTY_AIDL));
        }
        if path.ends_with("/DefaultProperties.json") {
            return (StatusCode::OK, encoded(DEFAULT_PROPERTIES));
        }
        (StatusCode::NOT_FOUND, String::new())
    })
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn config_for(upstream: &str, port: u16) -> Config {
    parse_config(&format!(
        r#"[http]
timeout_secs = 2
max_retries = 0
batch_deadline_secs = 5

[sources]
docs_base = "{upstream}/docs/automotive/vhal"
hw_interfaces_base = "{upstream}/hw"
device_car_base = "{upstream}/car"

[server]
bind = "127.0.0.1:{port}"
"#
    ))
    .unwrap()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

// ─── Test Tool ──────────────────────────────────────────────────────

/// Counts catalog matches through the shared engine.
struct CountTool;

#[async_trait]
impl Tool for CountTool {
    fn name(&self) -> &str {
        "count_properties"
    }

    fn description(&self) -> &str {
        "Count catalog matches for a keyword"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "keyword": { "type": "string" } },
            "required": ["keyword"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let keyword = params["keyword"].as_str().unwrap_or("");
        Ok(json!({ "keyword": keyword, "count": ctx.engine().search(keyword).len() }))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_analyze_against_fixture_sources() {
    let upstream = spawn(upstream()).await;
    let cfg = config_for(&upstream, find_free_port());
    let ctx = ToolContext::new(Arc::new(Engine::from_config(&cfg).unwrap()));
    let tools = ToolRegistry::with_builtins();

    let result = tools
        .call(
            "analyze_implementation",
            json!({ "property_name": "seat_memory_select", "version": "android14" }),
            &ctx,
        )
        .await
        .unwrap();

    let analysis = &result["analysis"];
    assert_eq!(analysis["property_name"], "SEAT_MEMORY_SELECT");
    assert_eq!(analysis["property_id"], "0x0B56");
    assert_eq!(analysis["version"], "android14");

    let files = analysis["source_files"].as_array().unwrap();
    assert_eq!(files[0]["source_key"], "vehicle_property_aidl");
    assert!(files[0]["fetch_error"].is_null());
    assert!(files[0]["raw_content"]
        .as_str()
        .unwrap()
        .contains("SEAT_MEMORY_SELECT = 0x0B56"));
    assert!(!files.iter().any(|f| f["display_url"].as_str().unwrap().contains("format=TEXT")));

    let text = result["text"].as_str().unwrap();
    assert!(text.contains("Property ID: 0x0B56"));
    assert!(text.contains("VehicleProperty.aidl"));
}

#[tokio::test]
async fn test_summarize_tools_against_fixture_docs() {
    let upstream = spawn(upstream()).await;
    let cfg = config_for(&upstream, find_free_port());
    let ctx = ToolContext::new(Arc::new(Engine::from_config(&cfg).unwrap()));
    let tools = ToolRegistry::with_builtins();

    let summary = tools
        .call_text("summarize", json!({ "question": "seat memory presets" }), &ctx)
        .await;
    assert!(summary.starts_with("vHAL Summary for: 'seat memory presets'"));
    assert!(summary.contains("SEAT_MEMORY_SELECT"));
    assert!(!summary.contains("menu"));

    let report = tools
        .call_text(
            "summarize_validated",
            json!({ "question": "seat memory", "max_sources": 1 }),
            &ctx,
        )
        .await;
    assert!(report.contains("**Confidence Score:** 100.0% (1/1 sources validated)"));
    assert!(report.contains("Cached: 1*"));
}

#[tokio::test]
async fn test_custom_tool_via_http_server() {
    let upstream = spawn(upstream()).await;
    let port = find_free_port();
    let cfg = config_for(&upstream, port);
    let engine = Arc::new(Engine::from_config(&cfg).unwrap());

    let mut tools = ToolRegistry::with_builtins();
    tools.register(Box::new(CountTool));
    let tools = Arc::new(tools);

    let server_handle = tokio::spawn(async move {
        run_server_with_tools(&cfg, engine, tools).await.ok();
    });
    wait_for_server(port).await;

    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("http://127.0.0.1:{}/tools/list", port))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = body["tools"].as_array().unwrap();
    assert_eq!(listed.len(), 7);
    let custom = listed.iter().find(|t| t["name"] == "count_properties").unwrap();
    assert_eq!(custom["builtin"], false);

    let resp = client
        .post(format!("http://127.0.0.1:{}/tools/count_properties", port))
        .json(&json!({ "keyword": "SEAT" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["result"]["count"], 27);

    let resp = client
        .post(format!("http://127.0.0.1:{}/tools/locate", port))
        .json(&json!({ "key": "hal_interface", "version": "android13" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let urls = body["result"]["urls"].as_array().unwrap();
    assert_eq!(urls.len(), 2);
    assert!(urls[1].as_str().unwrap().ends_with("/2.0/IVehicle.hal?format=TEXT"));

    let resp = client
        .post(format!("http://127.0.0.1:{}/tools/locate", port))
        .json(&json!({ "key": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    server_handle.abort();
}
