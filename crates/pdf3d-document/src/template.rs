//! LaTeX template with a title and an embedded 3D asset.

use std::path::Path;

use crate::error::DocumentError;

/// Placeholder replaced by the escaped project title.
pub const TITLE_PLACEHOLDER: &str = "<<title>>";

/// Placeholder replaced by the asset file name.
pub const ASSET_PLACEHOLDER: &str = "<<asset>>";

const BUILTIN: &str = r"\documentclass[a4paper]{article}
\usepackage{media9}
\usepackage[margin=1cm]{geometry}
\begin{document}
    \pagestyle{empty}
    \centerline{\Large \textbf{Project: <<title>>}}
    \vspace{1cm}
    \includemedia[
        width=0.9\linewidth, height=0.7\linewidth,
        activate=pageopen, 3Dmenu, 3Dtoolbar, 3Dlights=Day,
        3Dcoo=0 0 0, 3Droo=25, 3Dbg=1 1 1
    ]{}{<<asset>>}
\end{document}
";

/// Escape LaTeX special characters so `text` typesets literally.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '{' | '}' | '$' | '&' | '#' | '_' | '%' => {
                out.push('\\');
                out.push(c);
            }
            '^' => out.push_str(r"\textasciicircum{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            _ => out.push(c),
        }
    }
    out
}

/// A document template with title and asset placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTemplate {
    source: String,
}

impl DocumentTemplate {
    /// The A4 single-page template embedding the asset with `media9`.
    pub fn builtin() -> Self {
        Self {
            source: BUILTIN.to_string(),
        }
    }

    /// Parse a template, requiring the asset placeholder.
    pub fn parse(source: impl Into<String>) -> Result<Self, DocumentError> {
        let source = source.into();
        if !source.contains(ASSET_PLACEHOLDER) {
            return Err(DocumentError::TemplateInvalid {
                placeholder: ASSET_PLACEHOLDER,
            });
        }
        Ok(Self { source })
    }

    /// Load a custom template from disk.
    pub fn from_file(path: &Path) -> Result<Self, DocumentError> {
        let source = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DocumentError::TemplateMissing(path.to_path_buf()),
            _ => DocumentError::Io(e),
        })?;
        Self::parse(source)
    }

    /// Use `path` when given, the built-in template otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, DocumentError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::builtin()),
        }
    }

    /// Substitute the escaped title and the asset file name.
    pub fn render(&self, title: &str, asset: &str) -> String {
        self.source
            .replace(TITLE_PLACEHOLDER, &escape_latex(title))
            .replace(ASSET_PLACEHOLDER, asset)
    }
}

impl Default for DocumentTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}
