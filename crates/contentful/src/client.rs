//! HTTP client for one space environment of the content management API.

use std::time::Duration;

use async_trait::async_trait;
use release::{
    Asset, AssetId, ContentError, ContentStore, EntityLink, Entry, EntryId, LinkKind,
    ReleaseBatch, ReleaseTitle,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{info, instrument};

use crate::wire::{
    self, AssetResource, Collection, EntryResource, NamedResource, NamedResourceWire,
    ReleaseResource, MANAGEMENT_MEDIA_TYPE,
};

/// Default base URL of the management API.
pub const DEFAULT_API_URL: &str = "https://api.contentful.com";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`ContentfulClient`].
#[derive(Debug, Clone)]
pub struct ContentfulSettings {
    /// Base URL of the management API, without a trailing slash.
    pub api_url: String,
    /// Management API access token.
    pub access_token: String,
    /// Space holding the content.
    pub space_id: String,
    /// Environment within the space.
    pub environment_id: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// [`ContentStore`] over the content management HTTP API.
///
/// Constructed once at startup and shared; the underlying connection pool is
/// reused across invocations.
#[derive(Debug, Clone)]
pub struct ContentfulClient {
    http: reqwest::Client,
    settings: ContentfulSettings,
}

fn transport(err: reqwest::Error) -> ContentError {
    ContentError::Transport {
        message: err.to_string(),
    }
}

impl ContentfulClient {
    /// Builds a client from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Transport`] if the HTTP client cannot be built
    /// (e.g. the TLS backend fails to initialise).
    pub fn new(settings: ContentfulSettings) -> Result<Self, ContentError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("release-scheduler/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;
        Ok(Self { http, settings })
    }

    fn space_url(&self) -> String {
        format!(
            "{}/spaces/{}",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.space_id
        )
    }

    fn environment_url(&self, path: &str) -> String {
        let base = format!("{}/environments/{}", self.space_url(), self.settings.environment_id);
        if path.is_empty() {
            base
        } else {
            format!("{base}/{path}")
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ContentError> {
        request
            .bearer_auth(&self.settings.access_token)
            .send()
            .await
            .map_err(transport)
    }

    /// Fetches the configured space.
    pub async fn get_space(&self) -> Result<NamedResource, ContentError> {
        let response = self.send(self.http.get(self.space_url())).await?;
        let wire: NamedResourceWire = read_json(response).await?;
        Ok(wire.into())
    }

    /// Fetches the configured environment.
    pub async fn get_environment(&self) -> Result<NamedResource, ContentError> {
        let response = self.send(self.http.get(self.environment_url(""))).await?;
        let wire: NamedResourceWire = read_json(response).await?;
        Ok(wire.into())
    }

    /// Confirms the configured space and environment exist and are readable
    /// with the configured token.
    pub async fn verify_environment(&self) -> Result<(), ContentError> {
        let space = self.get_space().await?;
        let environment = self.get_environment().await?;
        info!(
            space_id = %space.id,
            space_name = %space.name,
            environment_id = %environment.id,
            "Content environment verified"
        );
        Ok(())
    }
}

/// Decodes a successful JSON response, or turns an error status into
/// [`ContentError::Api`].
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ContentError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ContentError::Api {
            status: status.as_u16(),
            message: wire::error_message(&body),
        });
    }
    response.json::<T>().await.map_err(|e| ContentError::Decode {
        message: e.to_string(),
    })
}

fn not_found_as(kind: LinkKind, id: &str, err: ContentError) -> ContentError {
    match err {
        ContentError::Api { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
            ContentError::NotFound {
                kind,
                id: id.to_string(),
            }
        }
        other => other,
    }
}

#[async_trait]
impl ContentStore for ContentfulClient {
    #[instrument(level = "debug", skip(self), fields(entry_id = %id))]
    async fn get_entry(&self, id: &EntryId) -> Result<Entry, ContentError> {
        let url = self.environment_url(&format!("entries/{id}"));
        let response = self.send(self.http.get(url)).await?;
        let wire: EntryResource = read_json(response)
            .await
            .map_err(|e| not_found_as(LinkKind::Entry, id.as_str(), e))?;
        Entry::try_from(wire)
    }

    #[instrument(level = "debug", skip(self), fields(asset_id = %id))]
    async fn get_asset(&self, id: &AssetId) -> Result<Asset, ContentError> {
        let url = self.environment_url(&format!("assets/{id}"));
        let response = self.send(self.http.get(url)).await?;
        let wire: AssetResource = read_json(response)
            .await
            .map_err(|e| not_found_as(LinkKind::Asset, id.as_str(), e))?;
        Asset::try_from(wire)
    }

    #[instrument(level = "debug", skip(self))]
    async fn list_releases(&self) -> Result<Vec<ReleaseBatch>, ContentError> {
        let response = self.send(self.http.get(self.environment_url("releases"))).await?;
        let wire: Collection<ReleaseResource> = read_json(response).await?;
        wire.items.into_iter().map(ReleaseBatch::try_from).collect()
    }

    #[instrument(level = "debug", skip(self), fields(title = %title))]
    async fn create_release(&self, title: &ReleaseTitle) -> Result<ReleaseBatch, ContentError> {
        let body = wire::release_body(title, &[]);
        let request = self
            .http
            .post(self.environment_url("releases"))
            .header(CONTENT_TYPE, MANAGEMENT_MEDIA_TYPE)
            .json(&body);
        let wire: ReleaseResource = read_json(self.send(request).await?).await?;
        ReleaseBatch::try_from(wire)
    }

    #[instrument(
        level = "debug",
        skip(self, release, members),
        fields(release_id = %release.id, version = release.version, members = members.len())
    )]
    async fn update_release(
        &self,
        release: &ReleaseBatch,
        members: Vec<EntityLink>,
    ) -> Result<ReleaseBatch, ContentError> {
        let body = wire::release_body(&release.title, &members);
        let request = self
            .http
            .put(self.environment_url(&format!("releases/{}", release.id)))
            .header(CONTENT_TYPE, MANAGEMENT_MEDIA_TYPE)
            .header("X-Contentful-Version", release.version)
            .json(&body);
        let wire: ReleaseResource = read_json(self.send(request).await?)
            .await
            .map_err(|err| match err {
                ContentError::Api { status, .. } if status == StatusCode::CONFLICT.as_u16() => {
                    ContentError::Conflict {
                        title: release.title.clone(),
                        expected_version: release.version,
                    }
                }
                other => other,
            })?;
        ReleaseBatch::try_from(wire)
    }
}
