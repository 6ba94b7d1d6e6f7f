use log::{debug, info};
use std::sync::Once;
use std::time::Instant;

static INIT: Once = Once::new();

/// Install env_logger once. `RUST_LOG` overrides the defaults below.
pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(log::LevelFilter::Info)
            .filter_module("cinelist_lib", log::LevelFilter::Debug)
            .filter_module("reqwest", log::LevelFilter::Warn)
            .filter_module("hyper", log::LevelFilter::Warn)
            .parse_default_env()
            .format_timestamp_secs()
            .format_target(false)
            .try_init();

        debug!("Logger ready");
    });
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

/// One-line log formats shared by the HTTP client and the favorites stores
pub struct LogContext;

impl LogContext {
    /// `duration_ms` is `None` when the request is about to be sent
    pub fn api_call(provider: &str, endpoint: &str, status: &str, duration_ms: Option<u64>) {
        match duration_ms {
            Some(duration) => info!("{} {} {} in {}ms", provider, endpoint, status, duration),
            None => debug!("{} {} sending", provider, endpoint),
        }
    }

    pub fn store_operation(operation: &str, user_id: &str, movie_id: Option<i64>) {
        match movie_id {
            Some(id) => debug!("favorites {} movie {} (user {})", operation, id, user_id),
            None => debug!("favorites {} (user {})", operation, user_id),
        }
    }
}

/// Logs how long a labelled piece of work took once `finish` is called
pub struct TimedOperation {
    start: Instant,
    label: String,
}

impl TimedOperation {
    pub fn new(label: &str) -> Self {
        Self {
            start: Instant::now(),
            label: label.to_string(),
        }
    }

    pub fn finish(self) -> u64 {
        let elapsed = self.start.elapsed().as_millis() as u64;
        info!("{} took {}ms", self.label, elapsed);
        elapsed
    }
}
