#![forbid(unsafe_code)]

//! Logging facade.
//!
//! The engine logs through `tracing` with one target per component
//! (`cmesh.drag`, `cmesh.resize`, ...). It never installs a subscriber
//! itself; hosts either bring their own or, with the `tracing-json` feature,
//! call [`init_json_subscriber`].

pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

/// Environment variable holding the `EnvFilter` directive.
pub const LOG_FILTER_ENV: &str = "CMESH_LOG";

/// Target names used by the engine's components.
pub mod targets {
    pub const DRAG: &str = "cmesh.drag";
    pub const RESIZE: &str = "cmesh.resize";
    pub const ITEM: &str = "cmesh.item";
    pub const ZONE: &str = "cmesh.zone";
    pub const STACK: &str = "cmesh.stack";
    pub const WORKSPACE: &str = "cmesh.workspace";
}

/// Install a global JSON subscriber filtered by `CMESH_LOG` (default `info`).
///
/// Returns `false` if a global subscriber was already set.
#[cfg(feature = "tracing-json")]
pub fn init_json_subscriber() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
