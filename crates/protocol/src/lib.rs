use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod paths;

pub use paths::{
    base_name, normalize_relative_path, relative_path_from, validate_relative_path,
    PathRejection, SEPARATOR,
};

/// One file under the scan root, identified by its canonical relative path.
///
/// The absolute path stays inside the host process: it is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    id: String,
    name: String,
    #[serde(rename = "path")]
    relative_path: String,
    #[serde(skip)]
    absolute_path: PathBuf,
}

impl FileDescriptor {
    /// Build a descriptor from a relative path in host or canonical form.
    pub fn new(relative_path: &str, absolute_path: impl Into<PathBuf>) -> Self {
        let relative_path = normalize_relative_path(relative_path);
        Self {
            id: relative_path.clone(),
            name: base_name(&relative_path).to_string(),
            relative_path,
            absolute_path: absolute_path.into(),
        }
    }

    /// Descriptor for `relative_path` resolved against `root`.
    pub fn under_root(root: &Path, relative_path: &str) -> Self {
        let normalized = normalize_relative_path(relative_path);
        let absolute = normalized
            .split(SEPARATOR)
            .fold(root.to_path_buf(), |acc, segment| acc.join(segment));
        Self::new(&normalized, absolute)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Directory(DirectoryNode),
    File(FileNode),
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            Self::Directory(dir) => &dir.name,
            Self::File(file) => file.descriptor.name(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Directory(dir) => &dir.path,
            Self::File(file) => file.descriptor.relative_path(),
        }
    }

    pub const fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryNode {
    pub name: String,
    pub path: String,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    #[serde(flatten)]
    pub descriptor: FileDescriptor,
}

/// Classification shared by every crate and surfaced at the HTTP boundary as `code`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Decode,
    InvalidPath,
    EmptyPrompt,
    EmptySelection,
    FileRead,
    GatewayNotConfigured,
    Remote,
    MalformedResponse,
    InvalidRequest,
    Busy,
    UnknownSession,
    Internal,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::Decode => "decode",
            Self::InvalidPath => "invalid_path",
            Self::EmptyPrompt => "empty_prompt",
            Self::EmptySelection => "empty_selection",
            Self::FileRead => "file_read",
            Self::GatewayNotConfigured => "gateway_not_configured",
            Self::Remote => "remote",
            Self::MalformedResponse => "malformed_response",
            Self::InvalidRequest => "invalid_request",
            Self::Busy => "busy",
            Self::UnknownSession => "unknown_session",
            Self::Internal => "internal",
        }
    }
}

/// Error body returned by every failing request.
///
/// `error` keeps the plain-message contract older clients read; `code` is additive.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorEnvelope {
    pub error: String,
    pub code: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    pub fn new(code: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
            hint: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SubmitFile {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub files: Vec<SubmitFile>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionCreated {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ToggleRequest {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionSubmitRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: String,
    pub root: String,
    pub gateway_configured: bool,
    pub sessions: usize,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn descriptor_normalizes_and_hides_absolute_path() {
        let descriptor = FileDescriptor::new("./sub//b.js", "/srv/root/sub/b.js");
        assert_eq!(descriptor.id(), "sub/b.js");
        assert_eq!(descriptor.name(), "b.js");

        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            value,
            json!({ "id": "sub/b.js", "name": "b.js", "path": "sub/b.js" })
        );
    }

    #[test]
    fn under_root_joins_segments() {
        let descriptor = FileDescriptor::under_root(Path::new("/srv/root"), "sub/b.js");
        assert_eq!(
            descriptor.absolute_path(),
            Path::new("/srv/root").join("sub").join("b.js")
        );
    }

    #[test]
    fn tree_nodes_are_tagged_by_kind() {
        let node = TreeNode::Directory(DirectoryNode {
            name: "sub".to_string(),
            path: "sub".to_string(),
            children: vec![TreeNode::File(FileNode {
                descriptor: FileDescriptor::new("sub/b.js", "/r/sub/b.js"),
            })],
        });

        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "type": "directory",
                "name": "sub",
                "path": "sub",
                "children": [
                    { "type": "file", "id": "sub/b.js", "name": "b.js", "path": "sub/b.js" }
                ]
            })
        );
    }

    #[test]
    fn error_envelope_keeps_plain_error_field() {
        let envelope = ErrorEnvelope::new(ErrorKind::EmptyPrompt, "Prompt is required");
        let raw = serialize_json(&envelope).unwrap();
        assert_eq!(raw, r#"{"error":"Prompt is required","code":"empty_prompt"}"#);
        assert_eq!(
            serde_json::to_value(ErrorKind::GatewayNotConfigured).unwrap(),
            json!(ErrorKind::GatewayNotConfigured.as_str())
        );
    }

    #[test]
    fn submit_request_ignores_extra_descriptor_fields() {
        let request: SubmitRequest = serde_json::from_value(json!({
            "prompt": "Explain",
            "files": [{ "id": "a.js", "name": "a.js", "path": "a.js", "fullPath": "/x/a.js" }]
        }))
        .unwrap();
        assert_eq!(request.files, vec![SubmitFile { path: "a.js".to_string() }]);
    }
}
