use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize tracing for the process.
///
/// Default: info for our crates, warn for everything else. `RUST_LOG` overrides.
pub fn init(service_name: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,vdm=info,vdm_core=info,vdm_moca=info,{}=info",
            service_name.replace('-', "_")
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::Config(format!("logging init failed: {e}")))
}
