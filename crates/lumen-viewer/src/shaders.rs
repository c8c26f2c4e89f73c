//! Shader source loading.

use std::path::{Path, PathBuf};

use lumen_engine::gfx::StageKind;
use thiserror::Error;

const BUILTIN_VERTEX: &str = include_str!("../shaders/main.vert.wgsl");
const BUILTIN_FRAGMENT: &str = include_str!("../shaders/main.frag.wgsl");

#[derive(Debug, Error)]
pub enum SourceLoadError {
    #[error("failed to read {stage} shader {}: {source}", .path.display())]
    Io {
        stage: StageKind,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{stage} shader {origin} is empty")]
    Empty { stage: StageKind, origin: String },
}

/// Trimmed, non-empty WGSL text for both stages.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    /// The sources bundled with the viewer.
    pub fn builtin() -> Self {
        Self {
            vertex: BUILTIN_VERTEX.trim().to_string(),
            fragment: BUILTIN_FRAGMENT.trim().to_string(),
        }
    }

    /// Loads each stage from its path, or the bundled source when `None`.
    pub fn load(vertex: Option<&Path>, fragment: Option<&Path>) -> Result<Self, SourceLoadError> {
        Ok(Self {
            vertex: load_stage(StageKind::Vertex, vertex, BUILTIN_VERTEX)?,
            fragment: load_stage(StageKind::Fragment, fragment, BUILTIN_FRAGMENT)?,
        })
    }

    /// Validates in-memory text the same way files are.
    pub fn from_text(vertex: &str, fragment: &str) -> Result<Self, SourceLoadError> {
        Ok(Self {
            vertex: checked(StageKind::Vertex, vertex, "text")?,
            fragment: checked(StageKind::Fragment, fragment, "text")?,
        })
    }
}

fn load_stage(stage: StageKind, path: Option<&Path>, builtin: &str) -> Result<String, SourceLoadError> {
    let Some(path) = path else {
        return checked(stage, builtin, "builtin");
    };
    let text = std::fs::read_to_string(path).map_err(|source| SourceLoadError::Io {
        stage,
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("loaded {stage} shader from {}", path.display());
    checked(stage, &text, &path.display().to_string())
}

fn checked(stage: StageKind, text: &str, origin: &str) -> Result<String, SourceLoadError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SourceLoadError::Empty {
            stage,
            origin: origin.to_string(),
        });
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_sources_are_present() {
        let s = ShaderSources::builtin();
        assert!(s.vertex.contains("@vertex"));
        assert!(s.fragment.contains("@fragment"));
        assert_eq!(ShaderSources::load(None, None).unwrap(), s);
    }

    #[test]
    fn whitespace_only_source_is_rejected() {
        let err = ShaderSources::from_text("  \n\t", "@fragment fn fs_main() {}").unwrap_err();
        assert!(matches!(err, SourceLoadError::Empty { stage: StageKind::Vertex, .. }));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ShaderSources::load(Some(Path::new("/nonexistent/lumen.wgsl")), None).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/lumen.wgsl"), "{err}");
    }

    #[test]
    fn text_is_trimmed() {
        let s = ShaderSources::from_text("\n  vs  \n", " fs ").unwrap();
        assert_eq!(s.vertex, "vs");
        assert_eq!(s.fragment, "fs");
    }
}
