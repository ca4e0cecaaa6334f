//! Export configuration and job management.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reelcut_common::{ReelcutError, ReelcutResult};
use reelcut_project_model::{normalize, Project, RawExportSettings};

use crate::compiler::compile_project;
use crate::compositor::AudioMode;
use crate::runner::run_with_progress;
use crate::tools::EngineTools;

/// An export job ready to be rendered.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Snapshot of the project taken when the export was requested.
    /// Edits made afterwards do not affect this job.
    pub project: Project,

    /// Output file path.
    pub output_path: PathBuf,

    /// Encode settings as supplied by the caller; normalized before use.
    pub settings: RawExportSettings,

    /// Which tracks' audio reaches the output.
    pub audio_mode: AudioMode,
}

impl ExportJob {
    pub fn new(project: Project, output_path: impl Into<PathBuf>) -> Self {
        Self {
            project,
            output_path: output_path.into(),
            settings: RawExportSettings::default(),
            audio_mode: AudioMode::default(),
        }
    }

    pub fn with_settings(mut self, settings: RawExportSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_audio_mode(mut self, audio_mode: AudioMode) -> Self {
        self.audio_mode = audio_mode;
        self
    }
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn FnMut(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportProgress {
    /// Seconds of output written so far.
    pub position_secs: f64,

    /// Expected output length in seconds.
    pub total_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

impl ExportProgress {
    /// Progress in `[0.0, 1.0]`.
    pub fn fraction(&self) -> f64 {
        match self.stage {
            ExportStage::Complete => 1.0,
            _ if self.total_secs > 0.0 => (self.position_secs / self.total_secs).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Complete,
}

/// Render `job` on the calling thread.
///
/// Settings are normalized, every source is probed, the project is
/// compiled and ffmpeg runs with progress. `should_cancel` is checked
/// before compiling and throughout the render; a cancelled render leaves no
/// partial output behind.
pub fn export_blocking<P, C>(
    job: &ExportJob,
    tools: &EngineTools,
    mut on_progress: P,
    should_cancel: C,
) -> ReelcutResult<PathBuf>
where
    P: FnMut(ExportProgress),
    C: Fn() -> bool,
{
    let started = std::time::Instant::now();
    tracing::info!(
        output = %job.output_path.display(),
        audio_mode = %job.audio_mode,
        "Starting export"
    );

    if job.output_path.as_os_str().is_empty() {
        return Err(ReelcutError::validation("Output path is empty"));
    }
    if let Some(parent) = job.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    on_progress(ExportProgress {
        position_secs: 0.0,
        total_secs: job.project.export_duration(),
        stage: ExportStage::Preparing,
    });

    if should_cancel() {
        return Err(ReelcutError::Cancelled);
    }

    let settings = normalize(&job.settings);
    let compiled = compile_project(&job.project, &settings, job.audio_mode, &tools.probe())?;
    tracing::info!(
        inputs = compiled.inputs.len(),
        duration_secs = compiled.duration,
        codec = settings.video_codec().as_str(),
        format = settings.format().as_str(),
        "Export plan ready"
    );

    let command = compiled.command(&tools.ffmpeg, &job.output_path);
    let result = run_with_progress(
        &command,
        compiled.duration,
        |position_secs, total_secs| {
            on_progress(ExportProgress {
                position_secs,
                total_secs,
                stage: ExportStage::Rendering,
            })
        },
        &should_cancel,
    );

    if let Err(err) = result {
        if err.is_cancelled() && job.output_path.exists() {
            if let Err(e) = std::fs::remove_file(&job.output_path) {
                tracing::warn!(error = %e, path = %job.output_path.display(), "Failed to remove partial output");
            }
        }
        return Err(err);
    }

    on_progress(ExportProgress {
        position_secs: compiled.duration,
        total_secs: compiled.duration,
        stage: ExportStage::Complete,
    });
    tracing::info!(
        elapsed_secs = started.elapsed().as_secs_f64(),
        output = %job.output_path.display(),
        "Export finished"
    );
    Ok(job.output_path.clone())
}

/// Export the project to a video file.
///
/// This is the main entry point for rendering. The render runs on tokio's
/// blocking pool; set `cancel` to stop it.
pub async fn export_project(
    job: ExportJob,
    tools: EngineTools,
    progress: Option<ProgressCallback>,
    cancel: Arc<AtomicBool>,
) -> ReelcutResult<PathBuf> {
    let mut progress = progress;
    tokio::task::spawn_blocking(move || {
        export_blocking(
            &job,
            &tools,
            |report| {
                if let Some(cb) = progress.as_mut() {
                    cb(report);
                }
            },
            || cancel.load(Ordering::Relaxed),
        )
    })
    .await
    .map_err(|e| ReelcutError::render(format!("Export worker failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn tools() -> EngineTools {
        EngineTools::new("/nonexistent/ffmpeg", "/nonexistent/ffprobe")
    }

    #[test]
    fn test_fraction() {
        let mut report = ExportProgress {
            position_secs: 2.5,
            total_secs: 10.0,
            stage: ExportStage::Rendering,
        };
        assert!((report.fraction() - 0.25).abs() < 1e-9);
        report.total_secs = 0.0;
        assert_eq!(report.fraction(), 0.0);
        report.stage = ExportStage::Complete;
        assert_eq!(report.fraction(), 1.0);
    }

    #[test]
    fn test_empty_project_fails_before_running() {
        let out = std::env::temp_dir().join("reelcut-export-empty/out.mp4");
        let job = ExportJob::new(Project::new(), &out);
        let err = export_blocking(&job, &tools(), |_| {}, || false).unwrap_err();
        assert!(matches!(err, ReelcutError::Validation { .. }));
        assert!(err.to_string().contains("Timeline is empty"));
        assert!(!out.exists());
    }

    #[test]
    fn test_cancel_before_compile() {
        let out = std::env::temp_dir().join("reelcut-export-cancel/out.mp4");
        let job = ExportJob::new(Project::new(), &out);
        let stages = Mutex::new(Vec::new());
        let err = export_blocking(
            &job,
            &tools(),
            |p| stages.lock().unwrap().push(p.stage),
            || true,
        )
        .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(*stages.lock().unwrap(), vec![ExportStage::Preparing]);
    }

    #[test]
    fn test_empty_output_path_rejected() {
        let job = ExportJob::new(Project::new(), "");
        let err = export_blocking(&job, &tools(), |_| {}, || false).unwrap_err();
        assert!(err.to_string().contains("Output path is empty"));
    }

    #[tokio::test]
    async fn test_async_export_reports_errors() {
        let out = std::env::temp_dir().join("reelcut-export-async/out.mp4");
        let job = ExportJob::new(Project::new(), out).with_audio_mode(AudioMode::VideoTrackOnly);
        let err = export_project(job, tools(), None, Arc::new(AtomicBool::new(false)))
            .await
            .unwrap_err();
        assert!(matches!(err, ReelcutError::Validation { .. }));
    }
}
