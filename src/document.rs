// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Content documents.
//!
//! A __document__ is a markdown or MDX file made of YAML front matter fenced
//! by `---` lines, followed by the document body:
//!
//! ```text
//! ---
//! title: Hello World
//! status: published
//! slug: hello-world
//! publishedAt: 2024-05-01T12:00:00Z
//! ---
//!
//! Body goes here.
//! ```
//!
//! Front matter has a fixed set of well-known fields shared by every
//! collection. Anything else is a __custom field__ defined by the schema of
//! the collection the document belongs to. Custom fields are preserved
//! verbatim across reads and writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Publication status of a document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Draft,
    Published,
}

impl FromStr for Status {
    type Err = DocumentError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            other => Err(DocumentError::InvalidStatus(other.to_string())),
        }
    }
}

/// Author of a document.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Front matter of a document.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontMatter {
    pub title: String,

    #[serde(default)]
    pub status: Status,

    /// URL slug. Derived from title when left empty.
    #[serde(default)]
    pub slug: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,

    /// Custom fields defined by collection schema.
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_yaml::Value>,
}

/// File format of a document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    #[default]
    Markdown,
    Mdx,
}

impl Format {
    /// Determine format from file path extension.
    pub fn from_path(path: &str) -> Option<Self> {
        match path.rsplit_once('.').map(|(_, ext)| ext) {
            Some("md") => Some(Self::Markdown),
            Some("mdx") => Some(Self::Mdx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Mdx => "mdx",
        }
    }

    /// File name for document with target slug.
    pub fn file_name(self, slug: &str) -> String {
        format!("{slug}.{}", self.extension())
    }
}

/// Markdown document with front matter.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Document {
    pub front_matter: FrontMatter,
    pub body: String,
    pub format: Format,
}

impl Document {
    /// Construct new draft document.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            front_matter: FrontMatter {
                title: title.into(),
                ..Default::default()
            },
            body: body.into(),
            format: Format::Markdown,
        }
    }

    /// Parse document of given format.
    ///
    /// # Errors
    ///
    /// - Return [`DocumentError::MissingFrontMatter`] if the document does
    ///   not open with a front matter fence.
    /// - Return [`DocumentError::Yaml`] if front matter is malformed.
    pub fn parse(data: &str, format: Format) -> Result<Self> {
        let (front, body) = split_front_matter(data).ok_or(DocumentError::MissingFrontMatter)?;
        let front_matter: FrontMatter = serde_yaml::from_str(front)?;

        Ok(Self {
            front_matter,
            body: body.to_string(),
            format,
        })
    }

    /// Slug of document, deriving it from the title if unset.
    ///
    /// # Errors
    ///
    /// - Return [`DocumentError::InvalidSlug`] if no slug can be derived.
    pub fn resolved_slug(&self) -> Result<String> {
        let slug = self.front_matter.slug.trim();
        if slug.is_empty() {
            return slugify(&self.front_matter.title);
        }

        let normalized = slugify(slug)?;
        if normalized != slug {
            return Err(DocumentError::InvalidSlug(slug.to_string()));
        }

        Ok(normalized)
    }

    /// Render document to file contents.
    ///
    /// # Errors
    ///
    /// - Return [`DocumentError::Yaml`] if front matter cannot be serialized.
    pub fn render(&self) -> Result<String> {
        let front = serde_yaml::to_string(&self.front_matter)?;
        Ok(format!("---\n{front}---\n\n{}", self.body))
    }
}

impl Display for Document {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.render().map_err(|_| std::fmt::Error)?.as_str())
    }
}

/// Split document into raw front matter and body.
fn split_front_matter(data: &str) -> Option<(&str, &str)> {
    let rest = data.strip_prefix("---")?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    // INVARIANT: Empty front matter closes immediately.
    if let Some(body) = rest.strip_prefix("---") {
        return Some(("", body.trim_start_matches(['\r', '\n'])));
    }

    let (front, body) = rest.split_once("\n---")?;
    let body = body.trim_start_matches(['\r', '\n']);

    Some((front.trim_end_matches('\r'), body))
}

/// Turn arbitrary text into a URL slug.
///
/// Lowercases input, joins runs of alphanumeric characters with single
/// dashes, and drops apostrophes so "Don't Panic" becomes "dont-panic".
///
/// # Errors
///
/// - Return [`DocumentError::InvalidSlug`] if input has no alphanumeric
///   characters.
pub fn slugify(input: &str) -> Result<String> {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else if ch == '\'' || ch == '\u{2019}' {
            continue;
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        return Err(DocumentError::InvalidSlug(input.to_string()));
    }

    Ok(slug)
}

/// Document parsing error types.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Document does not start with front matter fence.
    #[error("document has no front matter")]
    MissingFrontMatter,

    /// Slug cannot be derived or is not in slug form.
    #[error("invalid slug {0:?}")]
    InvalidSlug(String),

    /// Status is neither draft nor published.
    #[error("invalid status {0:?}, expected \"draft\" or \"published\"")]
    InvalidStatus(String),

    /// Front matter cannot be parsed or rendered.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Friendly result alias :3
type Result<T, E = DocumentError> = std::result::Result<T, E>;
