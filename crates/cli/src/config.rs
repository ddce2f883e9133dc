//! Process configuration: command-line flags with environment fallbacks.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use contentful::ContentfulSettings;
use devops::DevOpsSettings;
use release::{Locale, DEFAULT_MAX_REFERENCES};
use scheduler::SchedulerSettings;
use thiserror::Error;

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Invalid combinations that clap cannot reject on its own.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("work-item proxy is partially configured; missing {missing}")]
    PartialWorkTracking { missing: String },

    #[error("MAX_REFERENCES must be at least 1")]
    ZeroMaxReferences,

    #[error("CONTENT_LOCALE must not be empty")]
    EmptyLocale,
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "release-scheduler",
    version,
    about = "Schedules content entries into dated releases when their work item is ready"
)]
pub struct Config {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3002)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: IpAddr,

    /// Content management API token.
    #[arg(long, env = "CONTENTFUL_ACCESS_TOKEN", hide_env_values = true)]
    pub contentful_access_token: String,

    #[arg(long, env = "CONTENTFUL_SPACE_ID")]
    pub contentful_space_id: String,

    #[arg(long, env = "CONTENTFUL_ENVIRONMENT_ID", default_value = "master")]
    pub contentful_environment_id: String,

    #[arg(long, env = "CONTENTFUL_API_URL", default_value = contentful::DEFAULT_API_URL)]
    pub contentful_api_url: String,

    /// Locale read from entry fields.
    #[arg(long, env = "CONTENT_LOCALE", default_value = "en-US")]
    pub content_locale: String,

    /// Ceiling on resources collected per reference walk.
    #[arg(long, env = "MAX_REFERENCES", default_value_t = DEFAULT_MAX_REFERENCES)]
    pub max_references: usize,

    /// Work-tracking personal access token.
    #[arg(long, env = "AZURE_DEVOPS_PAT", hide_env_values = true)]
    pub azure_devops_pat: Option<String>,

    #[arg(long, env = "AZURE_DEVOPS_ORG")]
    pub azure_devops_org: Option<String>,

    #[arg(long, env = "AZURE_DEVOPS_PROJECT")]
    pub azure_devops_project: Option<String>,

    /// Overrides the work-tracking API base derived from org and project.
    #[arg(long, env = "AZURE_DEVOPS_BASE_URL")]
    pub azure_devops_base_url: Option<String>,

    /// Per-request timeout of outbound HTTP clients, in seconds.
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; span export is off when unset.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn contentful_settings(&self) -> ContentfulSettings {
        ContentfulSettings {
            api_url: self.contentful_api_url.clone(),
            access_token: self.contentful_access_token.clone(),
            space_id: self.contentful_space_id.clone(),
            environment_id: self.contentful_environment_id.clone(),
            timeout: self.http_timeout(),
        }
    }

    pub fn scheduler_settings(&self) -> Result<SchedulerSettings, ConfigError> {
        if self.max_references == 0 {
            return Err(ConfigError::ZeroMaxReferences);
        }
        let locale =
            Locale::new(self.content_locale.trim().to_string()).ok_or(ConfigError::EmptyLocale)?;
        Ok(SchedulerSettings {
            locale,
            max_references: self.max_references,
        })
    }

    /// Work-tracking settings, or `None` when the proxy is not configured.
    ///
    /// # Errors
    ///
    /// [`ConfigError::PartialWorkTracking`] when only some of token,
    /// organization, and project are set.
    pub fn devops_settings(&self) -> Result<Option<DevOpsSettings>, ConfigError> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        match (
            present(&self.azure_devops_pat),
            present(&self.azure_devops_org),
            present(&self.azure_devops_project),
        ) {
            (None, None, None) => Ok(None),
            (Some(token), Some(org), Some(project)) => {
                let base_url = present(&self.azure_devops_base_url)
                    .unwrap_or_else(|| DevOpsSettings::default_base_url(&org, &project));
                Ok(Some(DevOpsSettings {
                    base_url,
                    personal_access_token: token,
                    timeout: self.http_timeout(),
                }))
            }
            (token, org, project) => {
                let missing: Vec<&str> = [
                    (token.is_none(), "AZURE_DEVOPS_PAT"),
                    (org.is_none(), "AZURE_DEVOPS_ORG"),
                    (project.is_none(), "AZURE_DEVOPS_PROJECT"),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();
                Err(ConfigError::PartialWorkTracking {
                    missing: missing.join(", "),
                })
            }
        }
    }
}
