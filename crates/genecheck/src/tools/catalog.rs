//! Standard knowledge tools.
//!
//! Eight lookups over curated gene knowledge bases. Each is served by an
//! HTTP lookup service at `{base_url}/{tool_name}`, which receives the
//! validated arguments as a JSON body.

use super::{function_schema, Tool, ToolRegistry};
use crate::config::ToolsConfig;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use gene_shared::ToolError;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const TOOL_NAMES: &[&str] = &[
    "get_complex_for_gene_set",
    "get_disease_for_single_gene",
    "get_domain_for_single_gene",
    "get_enrichment_for_gene_set",
    "get_pathway_for_gene_set",
    "get_interactions_for_gene_set",
    "get_gene_summary_for_single_gene",
    "get_pubmed_articles",
];

fn gene_set_parameters() -> Value {
    json!({
        "type": "object",
        "properties": {
            "gene_set": {
                "type": "array",
                "items": {"type": "string"},
                "minItems": 1,
                "description": "Gene symbols, e.g. [\"TP53\", \"MDM2\"]"
            }
        },
        "required": ["gene_set"]
    })
}

fn single_gene_parameters() -> Value {
    json!({
        "type": "object",
        "properties": {
            "gene": {
                "type": "string",
                "minLength": 1,
                "description": "A single gene symbol, e.g. \"TP53\""
            }
        },
        "required": ["gene"]
    })
}

/// Function schema for a catalog tool, or `None` for an unknown name.
pub fn schema_for(name: &str) -> Option<Value> {
    let schema = match name {
        "get_complex_for_gene_set" => function_schema(
            name,
            "Return protein complexes (CORUM) that contain genes of the given gene set.",
            gene_set_parameters(),
        ),
        "get_disease_for_single_gene" => function_schema(
            name,
            "Return diseases associated with a single gene.",
            single_gene_parameters(),
        ),
        "get_domain_for_single_gene" => function_schema(
            name,
            "Return protein domains annotated for a single gene.",
            single_gene_parameters(),
        ),
        "get_enrichment_for_gene_set" => function_schema(
            name,
            "Return enriched functional terms (GO, pathways) for a gene set.",
            gene_set_parameters(),
        ),
        "get_pathway_for_gene_set" => function_schema(
            name,
            "Return pathways that involve genes of the given gene set.",
            gene_set_parameters(),
        ),
        "get_interactions_for_gene_set" => function_schema(
            name,
            "Return known protein-protein interactions among genes of the gene set.",
            gene_set_parameters(),
        ),
        "get_gene_summary_for_single_gene" => function_schema(
            name,
            "Return the curated gene summary for a single gene.",
            single_gene_parameters(),
        ),
        "get_pubmed_articles" => function_schema(
            name,
            "Search PubMed and return titles and abstracts of matching articles.",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "minLength": 1},
                    "max_results": {"type": "integer", "minimum": 1, "maximum": 20}
                },
                "required": ["query"]
            }),
        ),
        _ => return None,
    };
    Some(schema)
}

/// Tool backed by the HTTP lookup service
pub struct HttpTool {
    name: String,
    url: String,
    http_client: reqwest::Client,
}

impl HttpTool {
    pub fn new(name: &str, base_url: &str, http_client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            url: format!("{}/{}", base_url.trim_end_matches('/'), name),
            http_client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Tool for HttpTool {
    async fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(args)
            .send()
            .await
            .map_err(|e| ToolError::invocation(&self.name, format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::invocation(&self.name, format!("reading body failed: {}", e)))?;

        if !status.is_success() {
            return Err(ToolError::invocation(
                &self.name,
                format!("HTTP {}: {}", status.as_u16(), body.trim()),
            ));
        }

        // Lookup services answer with JSON or plain text
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

/// Build the registry of enabled catalog tools, in configured order.
pub fn build_registry(config: &ToolsConfig) -> Result<ToolRegistry> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to create HTTP client for tools")?;

    let mut registry = ToolRegistry::new();
    for name in &config.enabled {
        let Some(schema) = schema_for(name) else {
            bail!(
                "Unknown tool '{}' in tools.enabled (available: {})",
                name,
                TOOL_NAMES.join(", ")
            );
        };
        let tool = HttpTool::new(name, &config.base_url, http_client.clone());
        registry.register(name.as_str(), schema, Arc::new(tool))?;
    }

    info!("Registered {} tools from {}", registry.len(), config.base_url);
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_has_schema() {
        for name in TOOL_NAMES {
            let schema = schema_for(name).unwrap();
            assert_eq!(schema["name"], *name);
            assert_eq!(schema["parameters"]["type"], "object");
        }
        assert!(schema_for("get_weather").is_none());
    }

    #[test]
    fn test_build_registry_default_order() {
        let registry = build_registry(&ToolsConfig::default()).unwrap();
        assert_eq!(registry.names(), TOOL_NAMES.to_vec());
    }

    #[test]
    fn test_build_registry_subset() {
        let config = ToolsConfig {
            enabled: vec![
                "get_pubmed_articles".to_string(),
                "get_domain_for_single_gene".to_string(),
            ],
            ..ToolsConfig::default()
        };
        let registry = build_registry(&config).unwrap();
        assert_eq!(
            registry.names(),
            vec!["get_pubmed_articles", "get_domain_for_single_gene"]
        );
    }

    #[test]
    fn test_build_registry_rejects_unknown() {
        let config = ToolsConfig {
            enabled: vec!["get_weather".to_string()],
            ..ToolsConfig::default()
        };
        let err = build_registry(&config).unwrap_err();
        assert!(err.to_string().contains("get_weather"));
    }

    #[test]
    fn test_schema_validation_of_catalog_arguments() {
        let registry = build_registry(&ToolsConfig::default()).unwrap();
        let set_tool = registry.lookup("get_pathway_for_gene_set").unwrap();
        assert!(set_tool.validate(&json!({"gene_set": ["TP53", "MDM2"]})).is_ok());
        assert!(set_tool.validate(&json!({"gene_set": []})).is_err());
        assert!(set_tool.validate(&json!({"gene": "TP53"})).is_err());

        let pubmed = registry.lookup("get_pubmed_articles").unwrap();
        assert!(pubmed.validate(&json!({"query": "TP53 apoptosis", "max_results": 5})).is_ok());
        assert!(pubmed.validate(&json!({"query": "TP53", "max_results": 100})).is_err());
    }

    #[test]
    fn test_http_tool_url() {
        let tool = HttpTool::new("get_pubmed_articles", "http://localhost:8700/tools/", reqwest::Client::new());
        assert_eq!(tool.url(), "http://localhost:8700/tools/get_pubmed_articles");
    }
}
