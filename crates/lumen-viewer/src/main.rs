use anyhow::{Context, Result};

use lumen_engine::device::GpuInit;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::window::{Runtime, RuntimeConfig};
use lumen_viewer::config::USAGE;
use lumen_viewer::shaders::ShaderSources;
use lumen_viewer::{headless, Invocation, ViewerApp, ViewerConfig};

fn main() -> Result<()> {
    let config = match ViewerConfig::from_args(std::env::args().skip(1)) {
        Ok(Invocation::Run(config)) => config,
        Ok(Invocation::Help) => {
            println!("{USAGE}");
            return Ok(());
        }
        Err(e) => {
            eprintln!("error: {e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    init_logging(LoggingConfig {
        env_filter: config.log_filter.clone(),
        ..LoggingConfig::default()
    });

    let sources = ShaderSources::load(config.vertex.as_deref(), config.fragment.as_deref())
        .context("failed to load shader sources")?;

    if let Some(frames) = config.headless {
        let report = headless::run(&sources, config.app_settings(), frames)?;
        log::info!("headless run: {report}");
        return Ok(());
    }

    Runtime::run(
        RuntimeConfig {
            title: "lumen viewer".to_string(),
            ..RuntimeConfig::default()
        },
        GpuInit::default(),
        ViewerApp::new(sources, config.app_settings()),
    )
}
