use std::io::Write;
use std::sync::Once;

/// Default filter when neither the config nor `RUST_LOG` sets one: other
/// crates at `warn`, the tessel crates at `info`.
const DEFAULT_FILTER: &str = "warn,tessel_batch=info,tessel_wgpu=info";

/// Added on top of the default when `recovery_diagnostics` is set: atlas
/// surface loss, reallocation and snapshot repaints.
const RECOVERY_FILTER: &str = "tessel_batch::texture=debug";

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "tessel_batch=debug", "tessel_batch::texture=trace").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Log atlas recovery at `debug` without raising everything else.
    pub recovery_diagnostics: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            recovery_diagnostics: false,
        }
    }
}

impl LoggingConfig {
    /// Filter string in effect for this config, given the value of `RUST_LOG`.
    pub fn resolve_filter(&self, rust_log: Option<&str>) -> String {
        if let Some(filter) = &self.env_filter {
            return filter.clone();
        }
        if let Some(filter) = rust_log.filter(|f| !f.trim().is_empty()) {
            return filter.to_string();
        }
        if self.recovery_diagnostics {
            format!("{DEFAULT_FILTER},{RECOVERY_FILTER}")
        } else {
            DEFAULT_FILTER.to_string()
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
///
/// Filter precedence: `config.env_filter`, then `RUST_LOG`, then the crate
/// default. Lines carry the thread name so snapshot-worker output is
/// distinguishable from the render thread.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let rust_log = std::env::var("RUST_LOG").ok();
        let filter = config.resolve_filter(rust_log.as_deref());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);
        builder.format(|buf, record| {
            let thread = std::thread::current();
            writeln!(
                buf,
                "[{:<5} {} {}] {}",
                record.level(),
                thread.name().unwrap_or("unnamed"),
                record.target(),
                record.args()
            )
        });

        // A host or test harness may already have installed a logger.
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized with filter `{filter}`");
    });
}
