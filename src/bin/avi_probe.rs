//! Command-line probe: parses an AVI file's header/index and prints the
//! result as JSON, the same shape a host application would log or ship.

use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: avi-probe <path.avi>");
        return ExitCode::FAILURE;
    };

    match avi_core::open(&path) {
        Ok(demuxer) => {
            let info = demuxer.info().expect("just parsed");
            match serde_json::to_string_pretty(info) {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("failed to serialize file info: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            eprintln!("failed to open {path}: {e}");
            ExitCode::FAILURE
        }
    }
}
