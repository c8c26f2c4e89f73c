use std::fmt;

use thiserror::Error;

use crate::gfx::{GfxError, StageKind};

/// Diagnostics gathered after a failed link.
///
/// Each log is present only when the context reported non-empty text for it.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct LinkDiagnostics {
    pub program: Option<String>,
    pub vertex: Option<String>,
    pub fragment: Option<String>,
}

impl LinkDiagnostics {
    pub fn is_empty(&self) -> bool {
        self.program.is_none() && self.vertex.is_none() && self.fragment.is_none()
    }

    /// Present logs in program, vertex, fragment order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("program", self.program.as_deref()),
            ("vertex stage", self.vertex.as_deref()),
            ("fragment stage", self.fragment.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, log)| log.map(|l| (label, l)))
    }
}

impl fmt::Display for LinkDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no diagnostics");
        }
        for (i, (label, log)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{label} info log: {}", log.trim_end())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ProgramError {
    #[error("{0} shader source is empty")]
    EmptySource(StageKind),

    #[error("{stage} shader failed to compile: {log}")]
    Compilation { stage: StageKind, log: String },

    #[error("program failed to link: {0}")]
    Link(LinkDiagnostics),

    #[error("attribute `{0}` not found in the linked program")]
    AttributeResolution(String),

    #[error(transparent)]
    Context(#[from] GfxError),
}

fn non_empty(log: String) -> Option<String> {
    if log.trim().is_empty() { None } else { Some(log) }
}

impl LinkDiagnostics {
    pub(crate) fn from_logs(program: String, vertex: String, fragment: String) -> Self {
        Self {
            program: non_empty(program),
            vertex: non_empty(vertex),
            fragment: non_empty(fragment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_logs_are_dropped() {
        let d = LinkDiagnostics::from_logs("bad link".into(), "".into(), "  \n".into());
        assert_eq!(d.program.as_deref(), Some("bad link"));
        assert!(d.vertex.is_none());
        assert!(d.fragment.is_none());
        assert_eq!(d.to_string(), "program info log: bad link");
    }

    #[test]
    fn all_logs_are_joined_in_order() {
        let d = LinkDiagnostics::from_logs("p".into(), "v".into(), "f".into());
        assert_eq!(
            d.to_string(),
            "program info log: p; vertex stage info log: v; fragment stage info log: f"
        );
    }
}
