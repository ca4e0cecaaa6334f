//! Locating the ffmpeg and ffprobe binaries.

use std::path::{Path, PathBuf};

use reelcut_common::{ReelcutError, ReelcutResult, ToolsConfig};

use crate::probe::FfprobeProbe;

/// Resolved paths of the media engine binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl EngineTools {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Find both binaries.
    ///
    /// Lookup order: the explicit path from the config, then each configured
    /// search directory, then every directory on `PATH`. Either binary
    /// missing is a [`ReelcutError::ToolNotFound`] listing where it looked.
    pub fn resolve(config: &ToolsConfig) -> ReelcutResult<Self> {
        let ffmpeg = locate("ffmpeg", config.ffmpeg.as_deref(), &config.search_dirs)?;
        let ffprobe = locate("ffprobe", config.ffprobe.as_deref(), &config.search_dirs)?;
        tracing::debug!(
            ffmpeg = %ffmpeg.display(),
            ffprobe = %ffprobe.display(),
            "Resolved media tools"
        );
        Ok(Self { ffmpeg, ffprobe })
    }

    /// A probe backed by the resolved ffprobe.
    pub fn probe(&self) -> FfprobeProbe {
        FfprobeProbe::new(&self.ffprobe)
    }
}

fn executable_names(tool: &str) -> Vec<String> {
    if cfg!(windows) {
        vec![format!("{tool}.exe"), tool.to_string()]
    } else {
        vec![tool.to_string()]
    }
}

fn locate(tool: &str, explicit: Option<&Path>, search_dirs: &[PathBuf]) -> ReelcutResult<PathBuf> {
    let mut searched = Vec::new();

    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(tool, path = %path.display(), "Configured tool path does not exist");
        searched.push(path.to_path_buf());
    }

    let path_dirs = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect::<Vec<_>>())
        .unwrap_or_default();

    for dir in search_dirs.iter().chain(path_dirs.iter()) {
        for name in executable_names(tool) {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(candidate);
        }
    }

    Err(ReelcutError::ToolNotFound {
        tool: tool.to_string(),
        searched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("reelcut_tools_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = scratch_dir("explicit");
        let ffmpeg = dir.join("my-ffmpeg");
        let ffprobe = dir.join("my-ffprobe");
        std::fs::write(&ffmpeg, b"").unwrap();
        std::fs::write(&ffprobe, b"").unwrap();

        let config = ToolsConfig {
            ffmpeg: Some(ffmpeg.clone()),
            ffprobe: Some(ffprobe.clone()),
            search_dirs: vec![],
        };
        let tools = EngineTools::resolve(&config).unwrap();
        assert_eq!(tools, EngineTools::new(ffmpeg, ffprobe));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_search_dir_is_used() {
        let dir = scratch_dir("search");
        let name = executable_names("reelcut-fake-tool").remove(0);
        std::fs::write(dir.join(&name), b"").unwrap();

        let found = locate("reelcut-fake-tool", None, std::slice::from_ref(&dir)).unwrap();
        assert_eq!(found, dir.join(name));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_tool_lists_searched_locations() {
        let dir = scratch_dir("missing");
        let err = locate(
            "reelcut-definitely-missing-tool",
            Some(&dir.join("nope")),
            std::slice::from_ref(&dir),
        )
        .unwrap_err();
        match err {
            ReelcutError::ToolNotFound { tool, searched } => {
                assert_eq!(tool, "reelcut-definitely-missing-tool");
                assert_eq!(searched[0], dir.join("nope"));
                assert!(searched.len() >= 2);
            }
            other => panic!("unexpected error: {other}"),
        }

        std::fs::remove_dir_all(&dir).ok();
    }
}
