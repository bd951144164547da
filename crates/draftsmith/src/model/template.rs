use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bracketing syntax a section marker was written in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MarkerSyntax {
    /// `{{NAME}}`
    DoubleBrace,
    /// `[NAME]`
    SquareBracket,
    /// `{NAME}`
    SingleBrace,
    /// `<<NAME>>`
    DoubleAngle,
}

impl MarkerSyntax {
    pub const ALL: [MarkerSyntax; 4] = [
        MarkerSyntax::DoubleBrace,
        MarkerSyntax::SquareBracket,
        MarkerSyntax::SingleBrace,
        MarkerSyntax::DoubleAngle,
    ];

    /// Renders a marker for `name` in this syntax.
    pub fn render(&self, name: &str) -> String {
        match self {
            MarkerSyntax::DoubleBrace => format!("{{{{{}}}}}", name),
            MarkerSyntax::SquareBracket => format!("[{}]", name),
            MarkerSyntax::SingleBrace => format!("{{{}}}", name),
            MarkerSyntax::DoubleAngle => format!("<<{}>>", name),
        }
    }
}

/// A named placeholder detected in a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Uppercase name, unique within its template.
    pub name: String,
    /// Marker text as it first appeared in the template, e.g. `{{OBJECTIVE}}`.
    pub marker: String,
    pub syntax: MarkerSyntax,
    pub required: bool,
}

/// File format of an uploaded template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    Docx,
    Text,
}

impl TemplateFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "docx" => Some(TemplateFormat::Docx),
            "txt" | "md" | "markdown" => Some(TemplateFormat::Text),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateFormat::Docx => "docx",
            TemplateFormat::Text => "text",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "docx" => Some(TemplateFormat::Docx),
            "text" => Some(TemplateFormat::Text),
            _ => None,
        }
    }

    /// Extension of the filled (primary) artifact.
    pub fn output_extension(&self) -> &'static str {
        match self {
            TemplateFormat::Docx => "docx",
            TemplateFormat::Text => "txt",
        }
    }
}

impl fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Usage counters, the only mutable part of a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUsage {
    pub times_used: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub owner_id: String,
    /// Filename the template was uploaded with.
    pub original_name: String,
    pub format: TemplateFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Backing artifact in the artifact store.
    #[serde(skip_serializing)]
    pub file_path: PathBuf,
    pub file_size: u64,
    pub sections: Vec<Section>,
    pub page_count: u32,
    pub usage: TemplateUsage,
    pub created_at: DateTime<Utc>,
}

impl Template {
    pub fn section_names(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_render() {
        assert_eq!(MarkerSyntax::DoubleBrace.render("CONTENT"), "{{CONTENT}}");
        assert_eq!(MarkerSyntax::SquareBracket.render("CONTENT"), "[CONTENT]");
        assert_eq!(MarkerSyntax::SingleBrace.render("CONTENT"), "{CONTENT}");
        assert_eq!(MarkerSyntax::DoubleAngle.render("CONTENT"), "<<CONTENT>>");
    }

    #[test]
    fn test_template_format_from_path() {
        assert_eq!(
            TemplateFormat::from_path(Path::new("a/b/assignment.DOCX")),
            Some(TemplateFormat::Docx)
        );
        assert_eq!(
            TemplateFormat::from_path(Path::new("notes.md")),
            Some(TemplateFormat::Text)
        );
        assert_eq!(TemplateFormat::from_path(Path::new("scan.pdf")), None);
        assert_eq!(TemplateFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_template_format_round_trips_through_storage_name() {
        for format in [TemplateFormat::Docx, TemplateFormat::Text] {
            assert_eq!(TemplateFormat::parse(format.as_str()), Some(format));
        }
        assert_eq!(TemplateFormat::Text.output_extension(), "txt");
    }
}
