//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the Azure AD tenant and client ids, the Dataverse resource URL, and the
//! credential store location.

use crate::services::phase_classifier::PhaseRanges;
use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub client_id: String,
    /// Azure AD authority base, e.g. `https://login.microsoftonline.com/<tenant>`.
    pub authority_url: String,
    /// Dataverse environment URL; doubles as the OAuth resource/audience.
    /// May be empty, in which case login fails with a configuration error.
    pub dataverse_url: String,
    /// Path of the serialized credential file.
    pub credential_path: String,
    pub phase_ranges: PhaseRanges,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let client_id = env::var("AAD_CLIENT_ID").context("AAD_CLIENT_ID not set")?;

        let authority_url = match env::var("AAD_AUTHORITY_URL") {
            Ok(url) => url,
            Err(_) => {
                let tenant_id = env::var("AAD_TENANT_ID").context("AAD_TENANT_ID not set")?;
                format!("https://login.microsoftonline.com/{}", tenant_id)
            }
        };

        // Deliberately not required at startup: initiate() reports the
        // missing resource as a ConfigurationError at call time.
        let dataverse_url = env::var("DATAVERSE_URL").unwrap_or_default();

        let credential_path =
            env::var("CREDENTIAL_PATH").unwrap_or_else(|_| "credential.json".to_string());

        let phase_ranges = match env::var("PHASE_RANGES") {
            Ok(spec) => PhaseRanges::parse(&spec)
                .map_err(|e| anyhow::anyhow!("PHASE_RANGES is invalid: {}", e))?,
            Err(_) => PhaseRanges::default(),
        };
        phase_ranges
            .validate()
            .map_err(|e| anyhow::anyhow!("Phase range table is invalid: {}", e))?;

        Ok(Config {
            server_port,
            client_id,
            authority_url,
            dataverse_url,
            credential_path,
            phase_ranges,
        })
    }

    /// Identity provider device-code endpoint.
    pub fn device_code_url(&self) -> String {
        format!("{}/oauth2/devicecode", self.authority_url.trim_end_matches('/'))
    }

    /// Identity provider token endpoint.
    pub fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.authority_url.trim_end_matches('/'))
    }
}
