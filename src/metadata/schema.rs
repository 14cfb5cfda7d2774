// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Custom field schemas.
//!
//! A schema lists the custom front matter fields of a collection or
//! singleton. Schemas follow a JSON Schema inspired layout:
//!
//! ```json
//! {
//!   "title": "Posts",
//!   "type": "object",
//!   "path": "outstatic/content/posts",
//!   "properties": {
//!     "rating": {
//!       "title": "Rating",
//!       "type": "number",
//!       "fieldType": "Number",
//!       "required": true
//!     }
//!   }
//! }
//! ```

use crate::{
    document::FrontMatter,
    metadata::{MetadataError, Result},
};

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Front matter names owned by every document.
pub const RESERVED_FIELDS: &[&str] = &[
    "title",
    "status",
    "slug",
    "author",
    "publishedAt",
    "content",
    "description",
    "coverImage",
    "collection",
];

/// Editor widget of a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Text,
    Number,
    Boolean,
    Date,
    Image,
    Tags,
}

impl FieldType {
    /// Stored data type of field values.
    pub fn data_type(self) -> DataType {
        match self {
            Self::String | Self::Text | Self::Image => DataType::String,
            Self::Number => DataType::Number,
            Self::Boolean => DataType::Boolean,
            Self::Date => DataType::Date,
            Self::Tags => DataType::Array,
        }
    }
}

impl FromStr for FieldType {
    type Err = MetadataError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data.to_ascii_lowercase().as_str() {
            "string" => Ok(Self::String),
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "image" => Ok(Self::Image),
            "tags" => Ok(Self::Tags),
            _ => Err(MetadataError::UnknownField(data.to_string())),
        }
    }
}

/// Stored data type of custom field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Boolean,
    Date,
    Array,
}

impl Display for DataType {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::String => "a string",
            Self::Number => "a number",
            Self::Boolean => "a boolean",
            Self::Date => "an RFC 3339 date",
            Self::Array => "a list of tags",
        };
        fmt.write_str(name)
    }
}

/// Selectable value of a tags field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagValue {
    pub value: String,
    pub label: String,
}

/// Definition of a single custom field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub title: String,

    #[serde(rename = "type")]
    pub data_type: DataType,

    pub field_type: FieldType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<TagValue>,
}

impl CustomField {
    /// Construct new optional custom field.
    pub fn new(title: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            title: title.into(),
            data_type: field_type.data_type(),
            field_type,
            description: None,
            required: false,
            values: Vec::new(),
        }
    }

    /// Mark field as required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn accepts(&self, value: &Value) -> bool {
        match self.data_type {
            DataType::String => value.is_string(),
            DataType::Number => value.is_number(),
            DataType::Boolean => value.is_bool(),
            DataType::Date => value
                .as_str()
                .is_some_and(|date| DateTime::parse_from_rfc3339(date).is_ok()),
            DataType::Array => value.as_sequence().is_some_and(|tags| {
                tags.iter().all(|tag| {
                    tag.is_string() || tag.get("value").is_some_and(Value::is_string)
                })
            }),
        }
    }
}

/// Custom field schema of a collection or singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub title: String,

    #[serde(rename = "type")]
    pub kind: String,

    /// Directory or file path of documents described by schema.
    pub path: String,

    #[serde(default)]
    pub properties: BTreeMap<String, CustomField>,
}

impl Schema {
    /// Construct empty schema.
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: "object".into(),
            path: path.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Define new custom field.
    ///
    /// # Errors
    ///
    /// - Return [`MetadataError::InvalidFieldName`] if name is not a plain
    ///   identifier.
    /// - Return [`MetadataError::ReservedField`] if name is built in.
    /// - Return [`MetadataError::DuplicateField`] if field already exists.
    pub fn add_field(&mut self, name: impl Into<String>, field: CustomField) -> Result<()> {
        let name = name.into();
        let mut chars = name.chars();
        let valid = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic())
            && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        if !valid {
            return Err(MetadataError::InvalidFieldName(name));
        }

        if RESERVED_FIELDS.contains(&name.as_str()) {
            return Err(MetadataError::ReservedField(name));
        }

        if self.properties.contains_key(&name) {
            return Err(MetadataError::DuplicateField(name));
        }

        self.properties.insert(name, field);
        Ok(())
    }

    /// Remove custom field definition.
    ///
    /// Existing documents keep their values for the field.
    ///
    /// # Errors
    ///
    /// - Return [`MetadataError::UnknownField`] if field does not exist.
    pub fn remove_field(&mut self, name: &str) -> Result<CustomField> {
        self.properties
            .remove(name)
            .ok_or_else(|| MetadataError::UnknownField(name.to_string()))
    }

    /// Validate custom fields of document front matter.
    ///
    /// Fields unknown to the schema are allowed and left alone.
    ///
    /// # Errors
    ///
    /// - Return [`MetadataError::MissingField`] if a required field is absent
    ///   or empty.
    /// - Return [`MetadataError::FieldType`] if a field holds a value of the
    ///   wrong type.
    pub fn validate(&self, front_matter: &FrontMatter) -> Result<()> {
        for (name, field) in &self.properties {
            let value = front_matter.fields.get(name).filter(|value| !is_blank(value));
            match value {
                None if field.required => return Err(MetadataError::MissingField(name.clone())),
                None => continue,
                Some(value) if !field.accepts(value) => {
                    return Err(MetadataError::FieldType {
                        field: name.clone(),
                        expected: field.data_type,
                    })
                }
                Some(_) => continue,
            }
        }

        Ok(())
    }
}

impl FromStr for Schema {
    type Err = MetadataError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(data).map_err(|source| MetadataError::Parse {
            source,
            path: "schema.json".into(),
        })
    }
}

impl Display for Schema {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let json = serde_json::to_string_pretty(self).map_err(|_| std::fmt::Error)?;
        writeln!(fmt, "{json}")
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn schema() -> anyhow::Result<Schema> {
        let mut schema = Schema::new("Posts", "outstatic/content/posts");
        schema.add_field("rating", CustomField::new("Rating", FieldType::Number).required(true))?;
        schema.add_field("published", CustomField::new("Published", FieldType::Date))?;
        schema.add_field("tags", CustomField::new("Tags", FieldType::Tags))?;
        Ok(schema)
    }

    fn front_matter(yaml: &str) -> anyhow::Result<FrontMatter> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    #[test]
    fn serialize_schema() -> anyhow::Result<()> {
        let mut schema = Schema::new("Posts", "outstatic/content/posts");
        schema.add_field(
            "rating",
            CustomField::new("Rating", FieldType::Number)
                .required(true)
                .description("Out of five"),
        )?;

        let expect = indoc! {r#"
            {
              "title": "Posts",
              "type": "object",
              "path": "outstatic/content/posts",
              "properties": {
                "rating": {
                  "title": "Rating",
                  "type": "number",
                  "fieldType": "Number",
                  "description": "Out of five",
                  "required": true
                }
              }
            }
        "#};
        assert_eq!(schema.to_string(), expect);
        assert_eq!(expect.parse::<Schema>()?, schema);

        Ok(())
    }

    #[test]
    fn add_field_rejects_bad_names() -> anyhow::Result<()> {
        let mut schema = schema()?;
        let field = CustomField::new("X", FieldType::String);

        assert!(matches!(
            schema.add_field("title", field.clone()),
            Err(MetadataError::ReservedField(_))
        ));
        assert!(matches!(
            schema.add_field("rating", field.clone()),
            Err(MetadataError::DuplicateField(_))
        ));
        assert!(matches!(
            schema.add_field("2fast", field.clone()),
            Err(MetadataError::InvalidFieldName(_))
        ));
        assert!(matches!(
            schema.add_field("has space", field),
            Err(MetadataError::InvalidFieldName(_))
        ));

        Ok(())
    }

    #[test]
    fn validate_accepts_valid_document() -> anyhow::Result<()> {
        let front = front_matter(indoc! {r#"
            title: Hello
            rating: 5
            published: 2024-05-01T12:00:00Z
            tags:
              - value: rust
                label: Rust
              - git
            extra: kept
        "#})?;
        schema()?.validate(&front)?;

        Ok(())
    }

    #[test]
    fn validate_rejects_missing_required() -> anyhow::Result<()> {
        let front = front_matter("title: Hello\nrating: ''\n")?;
        let result = schema()?.validate(&front);
        assert!(matches!(result, Err(MetadataError::MissingField(field)) if field == "rating"));

        Ok(())
    }

    #[test]
    fn validate_rejects_wrong_types() -> anyhow::Result<()> {
        let front = front_matter("title: Hello\nrating: five\n")?;
        assert!(matches!(schema()?.validate(&front), Err(MetadataError::FieldType { .. })));

        let front = front_matter("title: Hello\nrating: 1\npublished: yesterday\n")?;
        assert!(matches!(schema()?.validate(&front), Err(MetadataError::FieldType { .. })));

        Ok(())
    }

    #[test]
    fn remove_field() -> anyhow::Result<()> {
        let mut schema = schema()?;
        assert_eq!(schema.remove_field("tags")?.field_type, FieldType::Tags);
        assert!(matches!(schema.remove_field("tags"), Err(MetadataError::UnknownField(_))));

        Ok(())
    }
}
