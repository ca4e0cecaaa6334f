//! Export a project to video.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reelcut_common::{format_clock_stamp, AppConfig};
use reelcut_project_model::{normalize, RawExportSettings};
use reelcut_render_engine::export::{export_project, ExportJob, ExportProgress, ExportStage};
use reelcut_render_engine::AudioMode;

/// Settings given on the command line, applied over the configured
/// defaults in this order: `--settings` JSON, then the individual flags.
pub struct Overrides {
    pub settings: Option<String>,
    pub format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crf: Option<u32>,
    pub preset: Option<String>,
}

impl Overrides {
    fn apply(self, base: RawExportSettings) -> anyhow::Result<RawExportSettings> {
        let mut raw = base;
        if let Some(json) = self.settings {
            let value: serde_json::Value = serde_json::from_str(&json)
                .map_err(|e| anyhow::anyhow!("Invalid --settings JSON: {e}"))?;
            if !value.is_object() {
                anyhow::bail!("--settings must be a JSON object");
            }
            raw = raw.merged_with(&RawExportSettings::from_value(&value));
        }

        let flags = RawExportSettings {
            format: self.format.map(Into::into).unwrap_or_default(),
            width: self.width.map(Into::into).unwrap_or_default(),
            height: self.height.map(Into::into).unwrap_or_default(),
            crf: self.crf.map(Into::into).unwrap_or_default(),
            preset: self.preset.map(Into::into).unwrap_or_default(),
            ..RawExportSettings::default()
        };
        Ok(raw.merged_with(&flags))
    }
}

pub async fn run(
    config: &AppConfig,
    path: PathBuf,
    output: Option<PathBuf>,
    audio_mode: Option<String>,
    overrides: Overrides,
) -> anyhow::Result<()> {
    println!("Exporting project at: {}", path.display());

    let project = super::open(&path)?;
    let audio_mode: AudioMode = audio_mode
        .as_deref()
        .unwrap_or(config.export.audio_mode.as_str())
        .parse()?;
    let raw = overrides.apply(RawExportSettings::from_value(&config.export.settings))?;
    let settings = normalize(&raw);

    let output_path = output.unwrap_or_else(|| path.with_extension(settings.format().as_str()));
    if output_path == path {
        anyhow::bail!("Output would overwrite the project file");
    }

    let tools = super::tools(config)?;

    println!("  Output: {}", output_path.display());
    println!(
        "  Video: {} crf {} ({})",
        settings.video_codec().as_str(),
        settings.crf(),
        settings.preset().as_str()
    );
    println!(
        "  Audio: {} {} ({audio_mode})",
        settings.audio_codec().as_str(),
        settings.audio_bitrate()
    );
    if settings.has_target_size() {
        println!("  Resolution: {}x{}", settings.width(), settings.height());
    }
    println!(
        "  Duration: {}",
        format_clock_stamp(project.export_duration())
    );

    let job = ExportJob::new(project, &output_path)
        .with_settings(raw)
        .with_audio_mode(audio_mode);

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            flag.store(true, Ordering::Relaxed);
        }
    });

    let progress_cb: Box<dyn FnMut(ExportProgress) + Send> = Box::new(|p: ExportProgress| {
        if p.stage == ExportStage::Rendering {
            print!(
                "\r  Progress: {:.1}% ({} / {})  ",
                p.fraction() * 100.0,
                format_clock_stamp(p.position_secs),
                format_clock_stamp(p.total_secs),
            );
            std::io::stdout().flush().ok();
        }
    });

    match export_project(job, tools, Some(progress_cb), cancel).await {
        Ok(written) => {
            println!("\nExport complete: {}", written.display());
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            println!("\nExport cancelled");
            Ok(())
        }
        Err(e) => {
            println!("\nExport failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn overrides() -> Overrides {
        Overrides {
            settings: None,
            format: None,
            width: None,
            height: None,
            crf: None,
            preset: None,
        }
    }

    #[test]
    fn test_flags_override_settings_json() {
        let flags = Overrides {
            settings: Some(r#"{"crf": 18, "format": "mov"}"#.to_string()),
            crf: Some(30),
            ..overrides()
        };
        let raw = flags
            .apply(RawExportSettings::from_value(&json!({"preset": "fast"})))
            .unwrap();
        assert_eq!(raw.crf, json!(30));
        assert_eq!(raw.format, json!("mov"));
        assert_eq!(raw.preset, json!("fast"));
    }

    #[test]
    fn test_settings_must_be_an_object() {
        let flags = Overrides {
            settings: Some("[1, 2]".to_string()),
            ..overrides()
        };
        assert!(flags.apply(RawExportSettings::default()).is_err());
    }
}
