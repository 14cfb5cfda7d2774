// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of `oxistatic.toml`, the site configuration file, to
//! simplify serialization and deserialization. File I/O is left to the
//! caller to figure out.
//!
//! Secrets never live in the configuration file itself. Instead the file
//! names the environment variables holding them.

use crate::{metadata::ContentLayout, remote::RepositoryRef};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// Site configuration layout.
///
/// # General Layout
///
/// Three sections make up a site configuration: the content repository, the
/// GitHub endpoints and OAuth application to reach it through, and session
/// handling. Only the repository owner and name are mandatory.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Content repository settings.
    pub repository: RepositorySettings,

    /// GitHub endpoints and credentials.
    #[serde(default)]
    pub github: GitHubSettings,

    /// Session handling.
    #[serde(default)]
    pub session: SessionSettings,
}

impl SiteConfig {
    /// Branch of content repository to commit to.
    pub fn repository_ref(&self) -> RepositoryRef {
        RepositoryRef {
            owner: self.repository.owner.clone(),
            name: self.repository.name.clone(),
            branch: self.repository.branch.clone(),
        }
    }

    /// Content layout inside repository.
    pub fn layout(&self) -> ContentLayout {
        ContentLayout::new(&self.repository.monorepo_path, &self.repository.content_path)
    }

    /// Margin before expiry at which access tokens get refreshed.
    pub fn refresh_margin(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session.refresh_margin_secs)
    }
}

impl FromStr for SiteConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: SiteConfig = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every local path field.
        if let Some(path) = &config.repository.local_path {
            config.repository.local_path = Some(expand(path)?);
        }
        if let Some(path) = &config.session.path {
            config.session.path = Some(expand(path)?);
        }

        Ok(config)
    }
}

impl Display for SiteConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Content repository settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct RepositorySettings {
    /// Account or organization owning repository.
    pub owner: String,

    /// Name of repository.
    pub name: String,

    /// Branch to read content from and commit content to.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Subdirectory of site inside a monorepo.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub monorepo_path: String,

    /// Content root relative to site directory.
    #[serde(default = "default_content_path")]
    pub content_path: String,

    /// Local repository to use instead of GitHub.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

/// GitHub endpoints and credentials.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct GitHubSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,

    #[serde(default = "default_oauth_url")]
    pub oauth_url: String,

    /// Client id of OAuth application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Environment variable holding OAuth client secret.
    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,

    /// Environment variable holding a personal access token. A token found
    /// there bypasses the OAuth session.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            graphql_url: default_graphql_url(),
            oauth_url: default_oauth_url(),
            client_id: None,
            client_secret_env: default_client_secret_env(),
            token_env: default_token_env(),
        }
    }
}

/// Session handling settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Session file location. Defaults to user data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Refresh access tokens this many seconds before they expire.
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            path: None,
            refresh_margin_secs: default_refresh_margin_secs(),
        }
    }
}

fn default_branch() -> String {
    "main".into()
}

fn default_content_path() -> String {
    "outstatic/content".into()
}

fn default_api_url() -> String {
    crate::session::oauth::DEFAULT_API_URL.into()
}

fn default_graphql_url() -> String {
    crate::remote::github::DEFAULT_GRAPHQL_URL.into()
}

fn default_oauth_url() -> String {
    crate::session::oauth::DEFAULT_OAUTH_URL.into()
}

fn default_client_secret_env() -> String {
    "OXISTATIC_CLIENT_SECRET".into()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}

fn default_refresh_margin_secs() -> i64 {
    60
}

fn expand(path: &std::path::Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
