use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

use crate::domains::chat::{ModelPolicy, DEFAULT_MODEL};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub gateway_api_key: String,
    pub gateway_url: Option<String>,
    pub storage_dir: PathBuf,
    pub allowed_models: Option<Vec<String>>,
    pub default_model: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            gateway_api_key: env::var("AI_GATEWAY_API_KEY")
                .context("AI_GATEWAY_API_KEY must be set")?,
            gateway_url: env::var("AI_GATEWAY_URL").ok(),
            storage_dir: env::var("STORAGE_DIR")
                .unwrap_or_else(|_| "./storage".to_string())
                .into(),
            allowed_models: env::var("ALLOWED_MODELS").ok().map(|list| parse_list(&list)),
            default_model: env::var("DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        })
    }

    /// Model allow-list for the chat handler.
    pub fn model_policy(&self) -> ModelPolicy {
        match &self.allowed_models {
            Some(models) => ModelPolicy::new(models.clone(), self.default_model.clone()),
            None => ModelPolicy::default().with_default(self.default_model.clone()),
        }
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
