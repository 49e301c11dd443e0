//! Viewer binary: loads optional scene options from a TOML path and runs the viewer.

use std::path::Path;
use std::process::ExitCode;

use metaballs::options::SceneOptions;
use metaballs::viewer::Viewer;

fn main() -> ExitCode {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => match SceneOptions::load(Path::new(&path)) {
            Ok(options) => options,
            Err(e) => {
                log::error!("failed to load {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => SceneOptions::default(),
    };

    match Viewer::builder().with_options(options).build().run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
