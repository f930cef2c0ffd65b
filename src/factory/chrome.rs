//! Chrome/Chromium browser factory.
//!
//! Builds launch options for the two deployment modes and resolves the
//! binary-path fallback once, at construction time — never per request.
//!
//! # Launch Configuration
//!
//! Every browser gets the fixed report viewport (1024×768 at 1.5 device
//! scale) and headless mode forced on. [`DeploymentMode::Sandbox`] adds the
//! flags constrained container/serverless environments need; local
//! development keeps the stock flag set.

use std::path::Path;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions};

use super::BrowserFactory;
use crate::config::{DeploymentMode, RenderConfig};
use crate::error::{RenderError, Result};

/// Report pages are laid out against this fixed viewport.
const VIEWPORT: (u32, u32) = (1024, 768);

/// Device scale factor applied to the viewport, matching the report's
/// expected rasterization density.
const DEVICE_SCALE_FACTOR: &str = "--force-device-scale-factor=1.5";

/// Slack added on top of the supervisor's idle window for the engine's own
/// connection watchdog. The watchdog must outlive the supervisor timer or
/// it would kill the resident browser first.
const ENGINE_IDLE_MARGIN: Duration = Duration::from_secs(60);

/// Factory for Chrome/Chromium browser instances.
///
/// # Thread Safety
///
/// `Send + Sync`; safely shared with the supervisor's blocking launches.
pub struct ChromeBrowserFactory {
    /// Generates launch options for each browser instance.
    launch_options_fn: Box<dyn Fn() -> Result<LaunchOptions<'static>> + Send + Sync>,
}

impl ChromeBrowserFactory {
    /// Create a factory with a custom launch-options function.
    pub fn new<F>(launch_options_fn: F) -> Self
    where
        F: Fn() -> Result<LaunchOptions<'static>> + Send + Sync + 'static,
    {
        Self {
            launch_options_fn: Box::new(launch_options_fn),
        }
    }

    /// Create a factory from the service configuration.
    ///
    /// The preferred binary path is checked here, once: a configured
    /// `chrome_path` that does not exist on disk falls back to the engine's
    /// auto-detection with a warning. Requests never re-run this probe.
    pub fn from_config(config: &RenderConfig) -> Self {
        let chrome_path = resolve_chrome_path(config.chrome_path.as_deref());
        let mode = config.deployment_mode;
        let engine_idle_timeout = config.idle_timeout + ENGINE_IDLE_MARGIN;

        log::debug!(
            "Creating ChromeBrowserFactory (mode: {:?}, path: {})",
            mode,
            chrome_path.as_deref().unwrap_or("auto-detect")
        );

        Self::new(move || {
            create_launch_options(mode, chrome_path.as_deref(), engine_idle_timeout)
                .map_err(|e| RenderError::Launch(e.to_string()))
        })
    }
}

impl BrowserFactory for ChromeBrowserFactory {
    /// Launch a new Chrome instance with the configured options.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Launch`] if options cannot be built or the
    /// process fails to start.
    fn create(&self) -> Result<Browser> {
        let options = (self.launch_options_fn)()?;

        log::info!("🚀 Launching browser...");
        Browser::new(options).map_err(|e| {
            log::error!("❌ Browser launch failed: {}", e);
            RenderError::Launch(e.to_string())
        })
    }
}

/// Resolve the preferred Chrome binary path, falling back to auto-detect.
///
/// Resolution happens once at factory construction. Returns `None` when no
/// usable explicit path is available.
fn resolve_chrome_path(preferred: Option<&str>) -> Option<String> {
    let path = preferred?;

    if Path::new(path).exists() {
        log::info!("Using configured Chrome binary: {}", path);
        Some(path.to_string())
    } else {
        log::warn!(
            "Configured Chrome binary '{}' not found; falling back to auto-detection",
            path
        );
        None
    }
}

/// Build Chrome launch options for a deployment mode.
///
/// # Flags Applied
///
/// All modes:
/// - fixed 1024×768 window with a 1.5 device scale factor
/// - `--disable-dev-shm-usage` (containers mount a tiny /dev/shm)
/// - `--disable-gpu` and `--hide-scrollbars` for deterministic layout
///
/// [`DeploymentMode::Sandbox`] additionally disables the setuid sandbox and
/// the zygote, and turns off software rasterization and crash reporting —
/// the flag set constrained production sandboxes require.
///
/// The engine's own idle watchdog is extended past the supervisor's idle
/// window so the resident browser is closed by exactly one mechanism.
pub fn create_launch_options(
    mode: DeploymentMode,
    chrome_path: Option<&str>,
    engine_idle_timeout: Duration,
) -> std::result::Result<LaunchOptions<'static>, Box<dyn std::error::Error + Send + Sync>> {
    let mut args: Vec<&std::ffi::OsStr> = vec![
        DEVICE_SCALE_FACTOR.as_ref(),
        "--disable-dev-shm-usage".as_ref(),
        "--disable-gpu".as_ref(),
        "--hide-scrollbars".as_ref(),
    ];

    if mode == DeploymentMode::Sandbox {
        let sandbox_args: [&std::ffi::OsStr; 4] = [
            "--disable-setuid-sandbox".as_ref(),
            "--no-zygote".as_ref(),
            "--disable-software-rasterizer".as_ref(),
            "--disable-crash-reporter".as_ref(),
        ];
        args.extend(sandbox_args);
    }

    let mut builder = LaunchOptions::default_builder();

    if let Some(path) = chrome_path {
        builder.path(Some(path.to_string().into()));
    }

    builder
        .headless(true)
        .sandbox(mode == DeploymentMode::Local)
        .window_size(Some(VIEWPORT))
        .idle_browser_timeout(engine_idle_timeout)
        .args(args)
        .build()
        .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
            log::error!(
                "❌ Failed to build launch options (mode: {:?}): {}",
                mode,
                e
            );
            e.into()
        })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Launch options build for both deployment modes without touching a
    /// Chrome binary.
    #[test]
    fn test_create_launch_options_both_modes() {
        let result =
            create_launch_options(DeploymentMode::Local, None, Duration::from_secs(360));
        assert!(result.is_ok(), "local options should build: {:?}", result.err());

        let result =
            create_launch_options(DeploymentMode::Sandbox, None, Duration::from_secs(360));
        assert!(
            result.is_ok(),
            "sandbox options should build: {:?}",
            result.err()
        );
    }

    /// An explicit path is threaded through the options untouched.
    #[test]
    fn test_create_launch_options_with_path() {
        let result = create_launch_options(
            DeploymentMode::Local,
            Some("/custom/chrome/path"),
            Duration::from_secs(360),
        );
        assert!(result.is_ok());
    }

    /// A configured path that does not exist resolves to auto-detect.
    #[test]
    fn test_resolve_chrome_path_fallback() {
        let resolved = resolve_chrome_path(Some("/definitely/not/a/real/chrome"));
        assert!(resolved.is_none());
    }

    /// No configured path means auto-detect from the start.
    #[test]
    fn test_resolve_chrome_path_none() {
        assert!(resolve_chrome_path(None).is_none());
    }

    /// Factory construction never launches anything.
    #[test]
    fn test_factory_from_config() {
        let _factory = ChromeBrowserFactory::from_config(&RenderConfig::default());

        let sandboxed = RenderConfig {
            deployment_mode: DeploymentMode::Sandbox,
            chrome_path: Some("/missing/binary".to_string()),
            ..RenderConfig::default()
        };
        let _factory = ChromeBrowserFactory::from_config(&sandboxed);
    }
}
