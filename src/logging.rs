use std::path::Path;

pub const LOG_FILE_BASENAME: &str = "todo-lab";
pub const LOG_FILE_SUFFIX: &str = "log";
pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const LOG_ROTATE_KEEP_FILES: usize = 5;
pub const LOG_ENV: &str = "TODO_LAB_LOG";

/// Log files live next to the task slot.
pub fn log_directory(data_dir: &Path) -> &Path {
    data_dir
}

/// Picks the logger spec: the first non-blank of `TODO_LAB_LOG` and `RUST_LOG`,
/// otherwise a build-dependent default.
pub fn resolve_log_spec(own: Option<String>, rust_log: Option<String>) -> String {
    // Keep dependency logs at WARN by default; our crate is more verbose in debug builds.
    let default_spec = if cfg!(debug_assertions) {
        "warn,todo_lab_lib=debug,todo_lab=debug"
    } else {
        "warn,todo_lab_lib=info,todo_lab=info"
    };
    own.filter(|value| !value.trim().is_empty())
        .or_else(|| rust_log.filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| default_spec.to_string())
}

#[cfg(all(feature = "app", not(test)))]
pub fn init_logging(
    data_dir: &Path,
) -> Result<flexi_logger::LoggerHandle, flexi_logger::FlexiLoggerError> {
    use flexi_logger::{
        detailed_format, Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming, WriteMode,
    };

    std::fs::create_dir_all(data_dir)?;

    let spec = resolve_log_spec(std::env::var(LOG_ENV).ok(), std::env::var("RUST_LOG").ok());

    let handle = Logger::try_with_str(spec)?
        .log_to_file(
            FileSpec::default()
                .directory(log_directory(data_dir))
                .basename(LOG_FILE_BASENAME)
                .suffix(LOG_FILE_SUFFIX),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(detailed_format)
        .rotate(
            Criterion::Size(LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_ROTATE_KEEP_FILES),
        )
        // stdout belongs to the task list; only problems go to the terminal.
        .duplicate_to_stderr(Duplicate::Warn)
        .start()?;

    install_panic_hook();

    log::info!(
        "logger initialized dir={} rotate_size_bytes={} keep_files={}",
        log_directory(data_dir).display(),
        LOG_ROTATE_SIZE_BYTES,
        LOG_ROTATE_KEEP_FILES
    );
    Ok(handle)
}

#[cfg(all(feature = "app", not(test)))]
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info: &std::panic::PanicHookInfo<'_>| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("<non-string panic payload>");
        let location = info
            .location()
            .map(|loc| format!("{loc}"))
            .unwrap_or_else(|| "<unknown>".to_string());
        let backtrace = std::backtrace::Backtrace::force_capture();

        log::error!("panic: payload={payload} location={location}\nbacktrace:\n{backtrace}");
        default_hook(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_files_share_the_data_directory() {
        let dir = Path::new("/tmp/todo-lab");
        assert_eq!(log_directory(dir), dir);
    }

    #[test]
    fn resolve_log_spec_prefers_own_variable_then_rust_log() {
        assert_eq!(
            resolve_log_spec(Some("trace".into()), Some("error".into())),
            "trace"
        );
        assert_eq!(resolve_log_spec(Some("  ".into()), Some("error".into())), "error");
        assert_eq!(resolve_log_spec(None, Some("error".into())), "error");

        let fallback = resolve_log_spec(None, Some(String::new()));
        assert!(fallback.starts_with("warn,todo_lab_lib="));
        assert_eq!(fallback, resolve_log_spec(None, None));
    }
}
