use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Where a parameter is read from in the inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    /// The whole decoded request body.
    Body,
    /// A single field of the decoded request body.
    FormData,
}

impl ParameterLocation {
    /// Whether binding this location needs the request body decoded.
    #[must_use]
    pub fn reads_body(self) -> bool {
        matches!(self, ParameterLocation::Body | ParameterLocation::FormData)
    }

    /// Style used when a parameter declares none.
    #[must_use]
    pub fn default_style(self) -> ParameterStyle {
        match self {
            ParameterLocation::Path | ParameterLocation::Header => ParameterStyle::Simple,
            _ => ParameterStyle::Form,
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::Body => "body",
            ParameterLocation::FormData => "formData",
        };
        f.write_str(s)
    }
}

/// Serialization style of a string-sourced array or object parameter.
///
/// | Style            | Locations               | `explode` off  | `explode` on        |
/// |------------------|-------------------------|----------------|---------------------|
/// | `matrix`         | path                    | `;id=1,2`      | `;id=1;id=2`        |
/// | `label`          | path                    | `.1,2`         | `.1.2`              |
/// | `simple`         | path, header            | `1,2`          | `1,2`               |
/// | `form`           | query, cookie, formData | `id=1,2`       | `id=1&id=2`         |
/// | `spaceDelimited` | query, formData         | `id=1%202`     | `id=1&id=2`         |
/// | `pipeDelimited`  | query, formData         | `id=1\|2`      | `id=1&id=2`         |
/// | `deepObject`     | query                   | n/a            | `id[a]=1&id[b]=2`   |
///
/// Objects in the non-deep styles are `k,v,k,v` with `explode` off and
/// `k=v` pairs (`,`, `.` or `;` separated) with it on. Without a declared
/// style an object parameter is read as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterStyle {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl ParameterStyle {
    /// Whether the style can be read from `location`.
    #[must_use]
    pub fn allowed_at(self, location: ParameterLocation) -> bool {
        use ParameterLocation as L;
        match self {
            ParameterStyle::Matrix | ParameterStyle::Label => location == L::Path,
            ParameterStyle::Simple => matches!(location, L::Path | L::Header),
            ParameterStyle::Form => matches!(location, L::Query | L::Cookie | L::FormData),
            ParameterStyle::SpaceDelimited | ParameterStyle::PipeDelimited => {
                matches!(location, L::Query | L::FormData)
            }
            ParameterStyle::DeepObject => location == L::Query,
        }
    }
}

impl fmt::Display for ParameterStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterStyle::Matrix => "matrix",
            ParameterStyle::Label => "label",
            ParameterStyle::Form => "form",
            ParameterStyle::Simple => "simple",
            ParameterStyle::SpaceDelimited => "spaceDelimited",
            ParameterStyle::PipeDelimited => "pipeDelimited",
            ParameterStyle::DeepObject => "deepObject",
        };
        f.write_str(s)
    }
}

/// Declared parameter of an endpoint, as supplied by the generated contract.
///
/// The `schema` is a JSON Schema fragment (`{"type": "integer", "minimum": 1}`)
/// that is compiled once when the endpoint is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMeta {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    #[serde(default)]
    pub schema: Option<Value>,
    /// `None` uses the location's default style
    #[serde(default)]
    pub style: Option<ParameterStyle>,
    /// `None` splits a lone occurrence on the delimiter and keeps repeated
    /// occurrences whole
    #[serde(default)]
    pub explode: Option<bool>,
}

impl ParameterMeta {
    /// Create an optional parameter at `location`.
    ///
    /// Path parameters are always required.
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            location,
            required: location == ParameterLocation::Path,
            schema: None,
            style: None,
            explode: None,
        }
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Path)
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Query)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Header)
    }

    pub fn cookie(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Cookie)
    }

    pub fn body(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Body)
    }

    pub fn form_data(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::FormData)
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required || self.location == ParameterLocation::Path;
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn style(mut self, style: ParameterStyle) -> Self {
        self.style = Some(style);
        self
    }

    #[must_use]
    pub fn explode(mut self, explode: bool) -> Self {
        self.explode = Some(explode);
        self
    }

    /// Declared style, or the location default.
    #[must_use]
    pub fn effective_style(&self) -> ParameterStyle {
        self.style.unwrap_or_else(|| self.location.default_style())
    }

    /// The `type` keyword of the schema, if declared.
    #[must_use]
    pub fn schema_type(&self) -> Option<&str> {
        self.schema
            .as_ref()
            .and_then(|s| s.get("type"))
            .and_then(Value::as_str)
    }
}
