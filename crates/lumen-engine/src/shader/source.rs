use std::fs;
use std::path::Path;

use crate::error::{Error, FileReadError, Result};

use super::stage::StageKind;

/// WGSL text of a vertex + fragment stage pair.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ShaderSource {
    vertex: String,
    fragment: String,
}

impl ShaderSource {
    /// Reads both stage files fully. Touches no GPU state.
    pub fn load(vertex_path: impl AsRef<Path>, fragment_path: impl AsRef<Path>) -> Result<Self> {
        let vertex = read_stage(StageKind::Vertex, vertex_path.as_ref())?;
        let fragment = read_stage(StageKind::Fragment, fragment_path.as_ref())?;
        log::debug!(
            "loaded shader sources `{}` and `{}`",
            vertex_path.as_ref().display(),
            fragment_path.as_ref().display()
        );
        Ok(Self { vertex, fragment })
    }

    /// In-memory sources, e.g. from `include_str!`.
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Result<Self> {
        let (vertex, fragment) = (vertex.into(), fragment.into());
        for (stage, text) in [(StageKind::Vertex, &vertex), (StageKind::Fragment, &fragment)] {
            if text.trim().is_empty() {
                return Err(Error::FileRead {
                    stage,
                    path: "<memory>".into(),
                    cause: FileReadError::Empty,
                });
            }
        }
        Ok(Self { vertex, fragment })
    }

    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

fn read_stage(stage: StageKind, path: &Path) -> Result<String> {
    let fail = |cause: FileReadError| Error::FileRead {
        stage,
        path: path.to_path_buf(),
        cause,
    };

    // Invalid UTF-8 surfaces as `InvalidData` and lands in `Unreadable`.
    let text = fs::read_to_string(path).map_err(|e| fail(e.into()))?;
    if text.trim().is_empty() {
        return Err(fail(FileReadError::Empty));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn loads_both_files() {
        let vs = file_with(b"// vertex");
        let fs = file_with(b"// fragment");
        let src = ShaderSource::load(vs.path(), fs.path()).unwrap();
        assert_eq!(src.vertex(), "// vertex");
        assert_eq!(src.fragment(), "// fragment");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fs = file_with(b"// fragment");
        let err = ShaderSource::load(dir.path().join("missing.wgsl"), fs.path()).unwrap_err();
        match err {
            Error::FileRead { stage, path, cause } => {
                assert_eq!(stage, StageKind::Vertex);
                assert!(path.ends_with("missing.wgsl"));
                assert!(matches!(cause, FileReadError::NotFound));
            }
            other => panic!("expected file read error, got {other:?}"),
        }
    }

    #[test]
    fn whitespace_only_file_is_empty() {
        let vs = file_with(b"// vertex");
        let fs = file_with(b"  \n\t\n");
        let err = ShaderSource::load(vs.path(), fs.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::FileRead { stage: StageKind::Fragment, cause: FileReadError::Empty, .. }
        ));
    }

    #[test]
    fn invalid_utf8_is_unreadable() {
        let vs = file_with(&[0xff, 0xfe, 0x00, 0x41]);
        let fs = file_with(b"// fragment");
        let err = ShaderSource::load(vs.path(), fs.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::FileRead { cause: FileReadError::Unreadable(_), .. }
        ));
    }

    #[test]
    fn in_memory_sources_must_not_be_empty() {
        assert!(ShaderSource::new("@vertex fn v() {}", "x").is_ok());
        assert!(matches!(
            ShaderSource::new("x", ""),
            Err(Error::FileRead { stage: StageKind::Fragment, .. })
        ));
    }
}
