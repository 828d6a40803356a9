use crate::error::GatewayError;
use context_scanner::LoadedFile;

/// Fixed-width rule framing each file header. Builders and any future splitter
/// must share this constant.
pub const SECTION_DELIMITER: &str = "====================";

pub const FILES_LEAD_IN: &str = "Here are the file contents you requested to include:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSection {
    pub path: String,
    pub content: String,
}

impl FileSection {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

impl From<LoadedFile> for FileSection {
    fn from(file: LoadedFile) -> Self {
        Self {
            path: file.path,
            content: file.content,
        }
    }
}

/// Prompt plus file sections, in selection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedPayload {
    prompt: String,
    sections: Vec<FileSection>,
}

impl AggregatedPayload {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn sections(&self) -> &[FileSection] {
        &self.sections
    }

    /// The text sent as the single user message.
    pub fn render(&self) -> String {
        let mut blocks = String::new();
        for section in &self.sections {
            blocks.push_str(SECTION_DELIMITER);
            blocks.push('\n');
            blocks.push_str("File: ");
            blocks.push_str(&section.path);
            blocks.push('\n');
            blocks.push_str(SECTION_DELIMITER);
            blocks.push_str("\n\n");
            blocks.push_str(&section.content);
            blocks.push_str("\n\n");
        }
        format!("{}\n\n{FILES_LEAD_IN}\n\n{blocks}", self.prompt)
    }
}

/// The prompt is kept verbatim; it only has to contain something besides whitespace.
pub fn aggregate(prompt: &str, files: Vec<FileSection>) -> Result<AggregatedPayload, GatewayError> {
    if prompt.trim().is_empty() {
        return Err(GatewayError::EmptyPrompt);
    }
    if files.is_empty() {
        return Err(GatewayError::EmptySelection);
    }
    Ok(AggregatedPayload {
        prompt: prompt.to_string(),
        sections: files,
    })
}
