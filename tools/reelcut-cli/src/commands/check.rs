//! Check that the media tools can be found.

use reelcut_common::{config_file_path, AppConfig};
use reelcut_render_engine::runner;
use reelcut_render_engine::{EngineCommand, EngineTools};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Reelcut System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[OK] Config: defaults ({} not found)", config_path.display());
    }

    let tools = match EngineTools::resolve(&config.tools) {
        Ok(tools) => tools,
        Err(e) => {
            println!("[FAIL] {e}");
            println!();
            println!("Install ffmpeg or set tools.ffmpeg / tools.ffprobe in the config file.");
            return Ok(());
        }
    };

    let mut all_ok = true;
    for (name, path) in [("ffmpeg", &tools.ffmpeg), ("ffprobe", &tools.ffprobe)] {
        match runner::run(&EngineCommand::new(path, vec!["-version".to_string()])) {
            Ok(()) => println!("[OK] {name}: {}", path.display()),
            Err(e) => {
                all_ok = false;
                println!("[FAIL] {name} at {} does not run: {e}", path.display());
            }
        }
    }

    println!();
    if all_ok {
        println!("All required tools are available. Reelcut is ready.");
    } else {
        println!("Some required tools are not working. See above for details.");
    }

    Ok(())
}
