//! Configuration for the rendering service.
//!
//! This module provides [`RenderConfig`] and [`RenderConfigBuilder`] for
//! configuring the browser lifecycle, the per-stage render timeouts, and the
//! HTTP surface.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use reportpdf_service::RenderConfigBuilder;
//!
//! let config = RenderConfigBuilder::new()
//!     .port(8080)
//!     .idle_timeout(Duration::from_secs(600))
//!     .max_concurrent_renders(8)
//!     .build()
//!     .expect("Invalid configuration");
//!
//! assert_eq!(config.port, 8080);
//! ```
//!
//! # Environment Configuration
//!
//! When the `env-config` feature is enabled, configuration can be loaded
//! from environment variables and an optional `app.env` file:
//!
//! ```rust,ignore
//! use reportpdf_service::config::env::from_env;
//!
//! let config = from_env()?;
//! ```
//!
//! See the [`mod@env`] module for the available variables.

use std::time::Duration;

/// Which browser lifecycle policy the supervisor runs.
///
/// The two deployment variants of this service differ only in this knob,
/// not in code paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserPolicy {
    /// Keep one resident browser shared by all requests, torn down only
    /// after a full idle window without use. This is the default.
    Pooled,

    /// Launch a fresh browser for every render and close it when the
    /// request finishes. Slower, but holds no long-lived process; suited
    /// to constrained environments that reap idle processes anyway.
    LaunchPerRequest,
}

impl Default for BrowserPolicy {
    fn default() -> Self {
        BrowserPolicy::Pooled
    }
}

impl std::str::FromStr for BrowserPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pooled" => Ok(BrowserPolicy::Pooled),
            "per-request" | "launch-per-request" => Ok(BrowserPolicy::LaunchPerRequest),
            other => Err(format!(
                "unknown browser policy '{}' (expected 'pooled' or 'per-request')",
                other
            )),
        }
    }
}

/// Where the service is running, which decides the Chrome flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Local interactive development. Chrome runs with its stock sandbox
    /// and a minimal flag set.
    Local,

    /// Constrained production sandbox (container, serverless). Chrome runs
    /// without the setuid sandbox and with the shared-memory and zygote
    /// workarounds those environments need.
    Sandbox,
}

impl Default for DeploymentMode {
    fn default() -> Self {
        DeploymentMode::Local
    }
}

impl DeploymentMode {
    /// Label reported by the health endpoint.
    pub fn environment_label(&self) -> &'static str {
        match self {
            DeploymentMode::Local => "development",
            DeploymentMode::Sandbox => "production",
        }
    }
}

impl std::str::FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "development" => Ok(DeploymentMode::Local),
            "sandbox" | "production" => Ok(DeploymentMode::Sandbox),
            other => Err(format!(
                "unknown deployment mode '{}' (expected 'local' or 'sandbox')",
                other
            )),
        }
    }
}

/// Configuration for the rendering service.
///
/// Use [`RenderConfigBuilder`] for validation and convenience.
///
/// # Fields Overview
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `port` | 3002 | HTTP listen port |
/// | `policy` | pooled | Browser lifecycle policy |
/// | `deployment_mode` | local | Chrome flag set / health label |
/// | `chrome_path` | auto | Preferred Chrome binary |
/// | `idle_timeout` | 5 min | Browser idle expiry window |
/// | `content_load_timeout` | 60 s | HTML content load bound |
/// | `navigation_timeout` | 30 s | URL navigation bound |
/// | `image_wait_ceiling` | 3 s | Per-image load ceiling |
/// | `settle_delay` | 500 ms | Post-image layout settle |
/// | `request_timeout` | 120 s | End-to-end request deadline |
/// | `max_concurrent_renders` | 4 | In-flight render bound |
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// HTTP listen port. The server binds all interfaces.
    pub port: u16,

    /// Browser lifecycle policy (pooled vs launch-per-request).
    pub policy: BrowserPolicy,

    /// Deployment mode, selecting Chrome flags and the health-endpoint
    /// environment label.
    pub deployment_mode: DeploymentMode,

    /// Preferred Chrome/Chromium binary path.
    ///
    /// `None` lets the engine auto-detect an installation. A configured
    /// path that does not exist on disk falls back to auto-detection once
    /// at factory construction, never per request.
    pub chrome_path: Option<String>,

    /// How long the pooled browser survives with zero acquisitions before
    /// it is closed. Every acquisition re-arms this window.
    pub idle_timeout: Duration,

    /// Bound on loading inline HTML content (DOM parsed, not full
    /// resource load).
    pub content_load_timeout: Duration,

    /// Bound on navigating to an external URL. Shorter than the content
    /// bound because a slow remote host should fail fast.
    pub navigation_timeout: Duration,

    /// Per-image ceiling during the image wait step. An image that has
    /// neither loaded nor errored by then is force-resolved.
    pub image_wait_ceiling: Duration,

    /// Fixed delay after image resolution, letting layout and reflow
    /// finish before capture.
    pub settle_delay: Duration,

    /// End-to-end deadline wrapping browser acquisition and the whole
    /// render. Must cover at least the content-load bound.
    pub request_timeout: Duration,

    /// Maximum renders in flight at once. Each open page costs browser
    /// memory, so excess requests queue rather than pile on.
    pub max_concurrent_renders: usize,

    /// Error-message substrings that identify a dead browser session.
    ///
    /// Matched by [`crate::error::classify_render_failure`]. Kept as
    /// configuration because the engine has no structured crash signal.
    pub fatal_error_signatures: Vec<String>,
}

/// Default signatures covering the engine's known connection-dead messages.
fn default_fatal_signatures() -> Vec<String> {
    vec![
        "Target closed".to_string(),
        "Session closed".to_string(),
        "Target detached".to_string(),
        "connection is closed".to_string(),
    ]
}

impl Default for RenderConfig {
    /// Production-ready defaults matching the documented render pipeline:
    /// 5-minute idle expiry, 60 s content load, 30 s navigation, 3 s per
    /// image, 500 ms settle, 120 s end-to-end, 4 concurrent renders.
    fn default() -> Self {
        Self {
            port: 3002,
            policy: BrowserPolicy::Pooled,
            deployment_mode: DeploymentMode::Local,
            chrome_path: None,
            idle_timeout: Duration::from_secs(300),
            content_load_timeout: Duration::from_secs(60),
            navigation_timeout: Duration::from_secs(30),
            image_wait_ceiling: Duration::from_secs(3),
            settle_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(120),
            max_concurrent_renders: 4,
            fatal_error_signatures: default_fatal_signatures(),
        }
    }
}

/// Builder for [`RenderConfig`] with validation.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use reportpdf_service::{BrowserPolicy, RenderConfigBuilder};
///
/// let config = RenderConfigBuilder::new()
///     .policy(BrowserPolicy::LaunchPerRequest)
///     .request_timeout(Duration::from_secs(180))
///     .build()
///     .expect("Invalid configuration");
/// ```
///
/// # Validation
///
/// The [`build()`](Self::build) method validates:
/// - `max_concurrent_renders` must be greater than 0
/// - `request_timeout` must cover `content_load_timeout`
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: RenderConfig::default(),
        }
    }

    /// Set the HTTP listen port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the browser lifecycle policy.
    pub fn policy(mut self, policy: BrowserPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Set the deployment mode.
    pub fn deployment_mode(mut self, mode: DeploymentMode) -> Self {
        self.config.deployment_mode = mode;
        self
    }

    /// Set a preferred Chrome binary path.
    pub fn chrome_path<S: Into<String>>(mut self, path: S) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    /// Set the browser idle-expiry window.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Set the HTML content load bound.
    pub fn content_load_timeout(mut self, timeout: Duration) -> Self {
        self.config.content_load_timeout = timeout;
        self
    }

    /// Set the URL navigation bound.
    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.config.navigation_timeout = timeout;
        self
    }

    /// Set the per-image wait ceiling.
    pub fn image_wait_ceiling(mut self, ceiling: Duration) -> Self {
        self.config.image_wait_ceiling = ceiling;
        self
    }

    /// Set the post-image settle delay.
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    /// Set the end-to-end request deadline.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the bound on concurrent in-flight renders.
    pub fn max_concurrent_renders(mut self, max: usize) -> Self {
        self.config.max_concurrent_renders = max;
        self
    }

    /// Replace the renderer-fatal error signatures.
    pub fn fatal_error_signatures(mut self, signatures: Vec<String>) -> Self {
        self.config.fatal_error_signatures = signatures;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// - Returns error if `max_concurrent_renders` is 0
    /// - Returns error if `request_timeout` is shorter than
    ///   `content_load_timeout` (the inner bound could never fire)
    pub fn build(self) -> std::result::Result<RenderConfig, String> {
        if self.config.max_concurrent_renders == 0 {
            return Err("max_concurrent_renders must be greater than 0".to_string());
        }

        if self.config.request_timeout < self.config.content_load_timeout {
            return Err(
                "request_timeout must be at least as long as content_load_timeout".to_string(),
            );
        }

        Ok(self.config)
    }
}

impl Default for RenderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Configuration (feature-gated)
// ============================================================================

/// Environment-based configuration loading.
///
/// This module is only available when the `env-config` feature is enabled.
/// It uses `dotenvy` to load an optional `app.env` file from the current
/// directory before reading process environment variables.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `PDF_PORT` | u16 | 3002 | HTTP listen port |
/// | `PDF_BROWSER_POLICY` | String | pooled | `pooled` or `per-request` |
/// | `PDF_DEPLOYMENT_MODE` | String | local | `local` or `sandbox` |
/// | `CHROME_PATH` | String | auto | Preferred Chrome binary path |
/// | `PDF_IDLE_TIMEOUT_SECONDS` | u64 | 300 | Browser idle expiry |
/// | `PDF_CONTENT_TIMEOUT_SECONDS` | u64 | 60 | HTML content load bound |
/// | `PDF_NAVIGATION_TIMEOUT_SECONDS` | u64 | 30 | URL navigation bound |
/// | `PDF_IMAGE_WAIT_SECONDS` | u64 | 3 | Per-image ceiling |
/// | `PDF_SETTLE_DELAY_MS` | u64 | 500 | Post-image settle delay |
/// | `PDF_REQUEST_TIMEOUT_SECONDS` | u64 | 120 | End-to-end deadline |
/// | `PDF_MAX_CONCURRENT_RENDERS` | usize | 4 | In-flight render bound |
/// | `PDF_FATAL_SIGNATURES` | String | built-in | Comma-separated signature override |
#[cfg(feature = "env-config")]
pub mod env {
    use super::*;
    use crate::error::RenderError;

    /// Default environment file name.
    pub const ENV_FILE_NAME: &str = "app.env";

    /// Load environment variables from the `app.env` file.
    ///
    /// Called automatically by [`from_env`]; the file is optional.
    pub fn load_env_file() -> std::result::Result<std::path::PathBuf, dotenvy::Error> {
        dotenvy::from_filename(ENV_FILE_NAME)
    }

    fn var_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to the [`RenderConfig::default`] values;
    /// malformed numeric values are ignored the same way. Policy and mode
    /// strings that fail to parse are reported as configuration errors
    /// rather than silently defaulted, since a typo there changes process
    /// lifecycle behavior.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Validation`] if the assembled configuration
    /// fails builder validation or a policy/mode string is unparseable.
    pub fn from_env() -> std::result::Result<RenderConfig, RenderError> {
        match load_env_file() {
            Ok(path) => log::info!("Loaded configuration from: {:?}", path),
            Err(e) => log::debug!(
                "No {} file found ({}); using environment variables and defaults",
                ENV_FILE_NAME,
                e
            ),
        }

        let defaults = RenderConfig::default();

        let policy = match std::env::var("PDF_BROWSER_POLICY") {
            Ok(raw) => raw.parse::<BrowserPolicy>().map_err(RenderError::Validation)?,
            Err(_) => defaults.policy,
        };

        let deployment_mode = match std::env::var("PDF_DEPLOYMENT_MODE") {
            Ok(raw) => raw
                .parse::<DeploymentMode>()
                .map_err(RenderError::Validation)?,
            Err(_) => defaults.deployment_mode,
        };

        let mut builder = RenderConfigBuilder::new()
            .port(var_parsed("PDF_PORT", defaults.port))
            .policy(policy)
            .deployment_mode(deployment_mode)
            .idle_timeout(Duration::from_secs(var_parsed(
                "PDF_IDLE_TIMEOUT_SECONDS",
                defaults.idle_timeout.as_secs(),
            )))
            .content_load_timeout(Duration::from_secs(var_parsed(
                "PDF_CONTENT_TIMEOUT_SECONDS",
                defaults.content_load_timeout.as_secs(),
            )))
            .navigation_timeout(Duration::from_secs(var_parsed(
                "PDF_NAVIGATION_TIMEOUT_SECONDS",
                defaults.navigation_timeout.as_secs(),
            )))
            .image_wait_ceiling(Duration::from_secs(var_parsed(
                "PDF_IMAGE_WAIT_SECONDS",
                defaults.image_wait_ceiling.as_secs(),
            )))
            .settle_delay(Duration::from_millis(var_parsed(
                "PDF_SETTLE_DELAY_MS",
                defaults.settle_delay.as_millis() as u64,
            )))
            .request_timeout(Duration::from_secs(var_parsed(
                "PDF_REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout.as_secs(),
            )))
            .max_concurrent_renders(var_parsed(
                "PDF_MAX_CONCURRENT_RENDERS",
                defaults.max_concurrent_renders,
            ));

        if let Ok(path) = std::env::var("CHROME_PATH") {
            if !path.trim().is_empty() {
                builder = builder.chrome_path(path);
            }
        }

        if let Ok(raw) = std::env::var("PDF_FATAL_SIGNATURES") {
            let signatures: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !signatures.is_empty() {
                builder = builder.fatal_error_signatures(signatures);
            }
        }

        let config = builder.build().map_err(RenderError::Validation)?;

        log::info!("Render service configuration:");
        log::info!("   - Port: {}", config.port);
        log::info!("   - Policy: {:?}", config.policy);
        log::info!("   - Mode: {}", config.deployment_mode.environment_label());
        log::info!(
            "   - Idle timeout: {}s",
            config.idle_timeout.as_secs()
        );
        log::info!(
            "   - Request timeout: {}s",
            config.request_timeout.as_secs()
        );
        log::info!(
            "   - Max concurrent renders: {}",
            config.max_concurrent_renders
        );
        log::info!(
            "   - Chrome path: {}",
            config.chrome_path.as_deref().unwrap_or("auto-detect")
        );

        Ok(config)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Verifies that the builder correctly sets all configuration values.
    #[test]
    fn test_config_builder() {
        let config = RenderConfigBuilder::new()
            .port(8080)
            .policy(BrowserPolicy::LaunchPerRequest)
            .deployment_mode(DeploymentMode::Sandbox)
            .chrome_path("/usr/bin/chromium")
            .idle_timeout(Duration::from_secs(600))
            .content_load_timeout(Duration::from_secs(90))
            .navigation_timeout(Duration::from_secs(20))
            .image_wait_ceiling(Duration::from_secs(10))
            .settle_delay(Duration::from_millis(1500))
            .request_timeout(Duration::from_secs(180))
            .max_concurrent_renders(8)
            .build()
            .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.policy, BrowserPolicy::LaunchPerRequest);
        assert_eq!(config.deployment_mode, DeploymentMode::Sandbox);
        assert_eq!(config.chrome_path.as_deref(), Some("/usr/bin/chromium"));
        assert_eq!(config.idle_timeout.as_secs(), 600);
        assert_eq!(config.content_load_timeout.as_secs(), 90);
        assert_eq!(config.navigation_timeout.as_secs(), 20);
        assert_eq!(config.image_wait_ceiling.as_secs(), 10);
        assert_eq!(config.settle_delay.as_millis(), 1500);
        assert_eq!(config.request_timeout.as_secs(), 180);
        assert_eq!(config.max_concurrent_renders, 8);
    }

    /// Verifies that defaults match the documented render pipeline.
    #[test]
    fn test_config_defaults() {
        let config = RenderConfig::default();

        assert_eq!(config.port, 3002);
        assert_eq!(config.policy, BrowserPolicy::Pooled);
        assert_eq!(config.deployment_mode, DeploymentMode::Local);
        assert!(config.chrome_path.is_none());
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
        assert_eq!(config.content_load_timeout, Duration::from_secs(60));
        assert_eq!(config.navigation_timeout, Duration::from_secs(30));
        assert_eq!(config.image_wait_ceiling, Duration::from_secs(3));
        assert_eq!(config.settle_delay, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.max_concurrent_renders, 4);
        assert!(!config.fatal_error_signatures.is_empty());
    }

    /// Zero concurrent renders is rejected at build time.
    #[test]
    fn test_config_rejects_zero_concurrency() {
        let result = RenderConfigBuilder::new().max_concurrent_renders(0).build();

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .contains("max_concurrent_renders must be greater than 0")
        );
    }

    /// A request deadline shorter than the content-load bound is rejected:
    /// the inner timeout could never fire before the outer one.
    #[test]
    fn test_config_rejects_inverted_timeouts() {
        let result = RenderConfigBuilder::new()
            .request_timeout(Duration::from_secs(30))
            .content_load_timeout(Duration::from_secs(60))
            .build();

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("request_timeout"));
    }

    /// Verifies policy string parsing.
    #[test]
    fn test_browser_policy_from_str() {
        assert_eq!("pooled".parse::<BrowserPolicy>(), Ok(BrowserPolicy::Pooled));
        assert_eq!(
            "per-request".parse::<BrowserPolicy>(),
            Ok(BrowserPolicy::LaunchPerRequest)
        );
        assert_eq!(
            "Launch-Per-Request".parse::<BrowserPolicy>(),
            Ok(BrowserPolicy::LaunchPerRequest)
        );
        assert!("threaded".parse::<BrowserPolicy>().is_err());
    }

    /// Verifies deployment mode parsing and the health label.
    #[test]
    fn test_deployment_mode_from_str_and_label() {
        assert_eq!("local".parse::<DeploymentMode>(), Ok(DeploymentMode::Local));
        assert_eq!(
            "production".parse::<DeploymentMode>(),
            Ok(DeploymentMode::Sandbox)
        );
        assert!("cloud".parse::<DeploymentMode>().is_err());

        assert_eq!(DeploymentMode::Local.environment_label(), "development");
        assert_eq!(DeploymentMode::Sandbox.environment_label(), "production");
    }

    /// Default fatal signatures cover the engine's closed-target family.
    #[test]
    fn test_default_signatures_cover_known_messages() {
        let config = RenderConfig::default();
        let covered = |msg: &str| {
            crate::error::matches_fatal_signature(msg, &config.fatal_error_signatures)
        };

        assert!(covered("Target closed"));
        assert!(covered("Session closed"));
        assert!(covered(
            "Unable to make method calls because underlying connection is closed"
        ));
        assert!(!covered("The event waited for never came"));
    }

    /// Verifies that the builder implements Default.
    #[test]
    fn test_builder_default() {
        let builder: RenderConfigBuilder = Default::default();
        let config = builder.build().unwrap();
        assert_eq!(config.port, 3002);
    }
}
