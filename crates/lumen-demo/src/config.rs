use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Result};

/// Which scene the demo renders.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Scene {
    /// Per-vertex colored triangle, no index buffer.
    Triangle,
    /// Indexed quad sampling a texture.
    Textured,
}

impl FromStr for Scene {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "triangle" => Ok(Self::Triangle),
            "textured" => Ok(Self::Textured),
            other => bail!("unknown scene `{other}` (expected `triangle` or `textured`)"),
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Triangle => "triangle",
            Self::Textured => "textured",
        })
    }
}

/// Demo settings read from the environment.
///
/// - `LUMEN_SCENE`: `triangle` (default) or `textured`
/// - `LUMEN_ASSETS`: assets directory, defaults to this crate's `assets/`
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub scene: Scene,
    pub assets: PathBuf,
}

impl DemoConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var("LUMEN_SCENE").ok(),
            std::env::var_os("LUMEN_ASSETS").map(PathBuf::from),
        )
    }

    fn from_vars(scene: Option<String>, assets: Option<PathBuf>) -> Result<Self> {
        let scene = match scene {
            Some(s) => s.parse()?,
            None => Scene::Triangle,
        };
        let assets = assets.unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets")));
        Ok(Self { scene, assets })
    }

    pub fn shader_paths(&self) -> (PathBuf, PathBuf) {
        let dir = self.assets.join("shaders");
        (
            dir.join(format!("{}.vert.wgsl", self.scene)),
            dir.join(format!("{}.frag.wgsl", self.scene)),
        )
    }

    pub fn texture_path(&self) -> PathBuf {
        self.assets.join("textures").join("checker.ppm")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_triangle_and_bundled_assets() {
        let config = DemoConfig::from_vars(None, None).unwrap();
        assert_eq!(config.scene, Scene::Triangle);
        assert!(config.assets.ends_with("assets"));
    }

    #[test]
    fn scene_names_are_case_insensitive() {
        let config = DemoConfig::from_vars(Some(" Textured ".into()), None).unwrap();
        assert_eq!(config.scene, Scene::Textured);
    }

    #[test]
    fn unknown_scene_is_an_error() {
        let err = DemoConfig::from_vars(Some("cube".into()), None).unwrap_err();
        assert!(err.to_string().contains("unknown scene `cube`"));
    }

    #[test]
    fn shader_paths_follow_scene_name() {
        let config = DemoConfig::from_vars(Some("textured".into()), Some("/tmp/a".into())).unwrap();
        let (vs, fs) = config.shader_paths();
        assert!(vs.ends_with("shaders/textured.vert.wgsl"));
        assert!(fs.ends_with("shaders/textured.frag.wgsl"));
    }

    #[test]
    fn bundled_shaders_compile_and_link() {
        use lumen_engine::shader::{compile_module, link_interfaces, ShaderSource, StageKind};

        for scene in [Scene::Triangle, Scene::Textured] {
            let config = DemoConfig { scene, ..DemoConfig::from_vars(None, None).unwrap() };
            let (vs_path, fs_path) = config.shader_paths();
            let source = ShaderSource::load(vs_path, fs_path).unwrap();
            let vs = compile_module(StageKind::Vertex, source.vertex()).unwrap();
            let fs = compile_module(StageKind::Fragment, source.fragment()).unwrap();
            link_interfaces(&vs, &fs).unwrap_or_else(|e| panic!("{scene}: {e}"));
        }
    }
}
