//! Logging setup shared by the client and the daemon (the
//! persisted-state entry for `.cache/clangd-query/daemon.log`).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use log::LevelFilter;

/// Client-side logging: stderr only, so stdout stays reserved for command
/// output.
pub fn init_client(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .write_style(env_logger::WriteStyle::Auto)
        .target(env_logger::Target::Stderr)
        .init();
}

/// Daemon-side logging: every record is written to stderr (useful when the
/// daemon is run in the foreground via the hidden `daemon` command) and
/// tee'd to `.cache/clangd-query/daemon.log` under the project root.
pub fn init_daemon(project_root: &Path, verbose: bool) -> std::io::Result<()> {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let log_dir = project_root.join(".cache").join("clangd-query");
    std::fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("daemon.log");

    let file = OpenOptions::new().create(true).append(true).open(&log_path)?;
    let file = Mutex::new(file);

    env_logger::Builder::new()
        .filter_level(level)
        .write_style(env_logger::WriteStyle::Never)
        .format(move |_buf, record| {
            let line = format!(
                "{} [{}] {}: {}\n",
                chrono::Utc::now().to_rfc3339(),
                record.level(),
                record.target(),
                record.args()
            );
            eprint!("{line}");
            if let Ok(mut f) = file.lock() {
                let _ = f.write_all(line.as_bytes());
            }
            Ok(())
        })
        .init();

    Ok(())
}
