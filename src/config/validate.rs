// src/config/validate.rs

use anyhow::{anyhow, Result};

use crate::config::settings::Settings;

/// Run basic semantic validation against the merged settings.
///
/// This checks:
/// - the proxy and the application do not share a port
/// - the binary name is not empty
/// - a source extension is configured
/// - the scan interval is non-zero
pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.proxy_port == settings.app_port {
        return Err(anyhow!(
            "proxy port and app port must differ (both are {})",
            settings.proxy_port
        ));
    }

    if settings.binary.trim().is_empty() {
        return Err(anyhow!("binary name must not be empty"));
    }

    if settings.watch.extension.trim_start_matches('.').is_empty() {
        return Err(anyhow!("watched file extension must not be empty"));
    }

    if settings.scan_interval.is_zero() {
        return Err(anyhow!("[watch].interval_ms must be >= 1 (got 0)"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliArgs;

    #[test]
    fn default_settings_are_valid() {
        let s = Settings::resolve(&CliArgs::default(), None);
        assert!(validate_settings(&s).is_ok());
    }

    #[test]
    fn shared_port_is_rejected() {
        let args = CliArgs {
            port: Some(4000),
            app_port: Some(4000),
            ..Default::default()
        };
        let err = validate_settings(&Settings::resolve(&args, None)).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn bare_dot_extension_is_rejected() {
        let args = CliArgs {
            ext: Some(".".into()),
            ..Default::default()
        };
        assert!(validate_settings(&Settings::resolve(&args, None)).is_err());
    }
}
