//! Configuration constants and profile loading for wardline
//!
//! Profiles live in an INI file, one section per backend:
//!
//! ```ini
//! [default]
//! base_url = https://hms.example.com
//! timeout_secs = 15
//! protected_routes = /superadmin, /billing/admin
//! header.X-Hospital-Id = north-wing
//! ```

use crate::http::{ClientConfig, Endpoints, HttpHeaders};
use anyhow::{anyhow, Context, Result};
use ini::{Ini, Properties};
use std::path::PathBuf;
use std::time::Duration;

/// Default profile file path for wardline
pub const DEFAULT_PROFILE_PATH: &str = "~/.wardline/profile";

/// Environment variable name for overriding the profile path
pub const PROFILE_PATH_ENV_VAR: &str = "WARDLINE_PROFILE_PATH";

/// Where sessions are persisted unless a profile says otherwise
pub const DEFAULT_SESSION_FILE: &str = "~/.wardline/session.json";

const HEADER_PREFIX: &str = "header.";

/// Get the profile file path, checking environment variable first, then falling back to default
pub fn get_profile_path() -> String {
    std::env::var_os(PROFILE_PATH_ENV_VAR)
        .and_then(|val| val.into_string().ok())
        .unwrap_or_else(|| DEFAULT_PROFILE_PATH.to_string())
}

/// Expand `~` and environment references in a configured path
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).with_context(|| format!("cannot expand '{path}'"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// One backend connection profile
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub base_url: String,
    pub timeout: Duration,
    pub demo_fallback: bool,
    pub protected_routes: Vec<String>,
    pub session_file: PathBuf,
    pub headers: HttpHeaders,
    pub endpoints: Endpoints,
}

impl Profile {
    /// Load profile `name` from the INI file at `path`
    pub fn load(path: &str, name: &str) -> Result<Self> {
        let file = expand_path(path)?;
        tracing::debug!("Loading profile '{}' from '{}'", name, file.display());

        let ini = Ini::load_from_file(&file)
            .with_context(|| format!("failed to read profile file {}", file.display()))?;
        Self::from_ini(&ini, name)
    }

    pub fn from_ini(ini: &Ini, name: &str) -> Result<Self> {
        let section = ini
            .section(Some(name))
            .ok_or_else(|| anyhow!("profile '{name}' is not configured"))?;
        Self::from_section(name, section)
    }

    fn from_section(name: &str, section: &Properties) -> Result<Self> {
        let base_url = section
            .get("base_url")
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow!("profile '{name}' has no base_url"))?
            .to_string();

        let timeout = match section.get("timeout_secs") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .with_context(|| format!("invalid timeout_secs '{raw}'"))?,
            ),
            None => crate::http::config::DEFAULT_TIMEOUT,
        };

        let demo_fallback = match section.get("demo_fallback") {
            Some(raw) => parse_bool(raw).ok_or_else(|| anyhow!("invalid demo_fallback '{raw}'"))?,
            None => true,
        };

        let protected_routes = match section.get("protected_routes") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|route| !route.is_empty())
                .map(str::to_string)
                .collect(),
            None => vec![crate::http::config::DEFAULT_PROTECTED_ROUTE.to_string()],
        };

        let session_file = expand_path(section.get("session_file").unwrap_or(DEFAULT_SESSION_FILE))?;

        let headers = section
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(HEADER_PREFIX)
                    .map(|header| (header.to_string(), value.to_string()))
            })
            .collect();

        let mut endpoints = Endpoints::default();
        for (key, slot) in [
            ("csrf_endpoint", &mut endpoints.csrf),
            ("login_endpoint", &mut endpoints.login),
            ("logout_endpoint", &mut endpoints.logout),
            ("refresh_endpoint", &mut endpoints.refresh),
            ("user_endpoint", &mut endpoints.current_user),
        ] {
            if let Some(value) = section.get(key) {
                *slot = value.trim().to_string();
            }
        }

        Ok(Self {
            name: name.to_string(),
            base_url,
            timeout,
            demo_fallback,
            protected_routes,
            session_file,
            headers,
            endpoints,
        })
    }

    /// Client configuration described by this profile
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::new(&self.base_url)
            .with_context(|| format!("profile '{}'", self.name))?
            .with_timeout(self.timeout)
            .with_demo_fallback(self.demo_fallback)
            .with_protected_routes(self.protected_routes.clone())
            .with_endpoints(self.endpoints.clone());
        for (name, value) in &self.headers {
            config = config.with_header(name, value);
        }
        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_profile_path() {
        assert_eq!(DEFAULT_PROFILE_PATH, "~/.wardline/profile");
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(PROFILE_PATH_ENV_VAR, "WARDLINE_PROFILE_PATH");
    }

    #[test]
    fn test_get_profile_path_env_override() {
        // Save current env var state
        let original = std::env::var_os(PROFILE_PATH_ENV_VAR);

        let test_path = "/custom/profile/path";
        std::env::set_var(PROFILE_PATH_ENV_VAR, test_path);
        assert_eq!(get_profile_path(), test_path);

        std::env::remove_var(PROFILE_PATH_ENV_VAR);
        assert_eq!(get_profile_path(), DEFAULT_PROFILE_PATH);

        // Restore original state
        if let Some(val) = original {
            std::env::set_var(PROFILE_PATH_ENV_VAR, val);
        }
    }

    #[test]
    fn profile_should_load_all_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[staging]\n\
             base_url = https://staging.hms.example.com\n\
             timeout_secs = 5\n\
             demo_fallback = off\n\
             protected_routes = /superadmin, /billing/admin\n\
             session_file = /tmp/wardline-staging.json\n\
             refresh_endpoint = /api/auth/token/refresh/\n\
             header.X-Hospital-Id = north-wing"
        )
        .unwrap();

        let profile = Profile::load(file.path().to_str().unwrap(), "staging").unwrap();

        assert_eq!(profile.base_url, "https://staging.hms.example.com");
        assert_eq!(profile.timeout, Duration::from_secs(5));
        assert!(!profile.demo_fallback);
        assert_eq!(profile.protected_routes, vec!["/superadmin", "/billing/admin"]);
        assert_eq!(profile.session_file, PathBuf::from("/tmp/wardline-staging.json"));
        assert_eq!(profile.endpoints.refresh, "/api/auth/token/refresh/");
        assert_eq!(profile.endpoints.login, "/api/auth/login/");
        assert_eq!(
            profile.headers,
            vec![("X-Hospital-Id".to_string(), "north-wing".to_string())]
        );

        let config = profile.client_config().unwrap();
        assert!(!config.demo_fallback());
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn profile_should_apply_defaults() {
        let ini = Ini::load_from_str("[default]\nbase_url = http://localhost:8000\n").unwrap();
        let profile = Profile::from_ini(&ini, "default").unwrap();

        assert!(profile.demo_fallback);
        assert_eq!(profile.protected_routes, vec!["/superadmin"]);
        assert!(profile.headers.is_empty());
        assert_eq!(profile.endpoints, Endpoints::default());
    }

    #[test]
    fn profile_should_report_missing_section_and_url() {
        let ini = Ini::load_from_str("[default]\ntimeout_secs = 3\n").unwrap();

        let missing = Profile::from_ini(&ini, "prod").unwrap_err();
        assert!(missing.to_string().contains("profile 'prod' is not configured"));

        let no_url = Profile::from_ini(&ini, "default").unwrap_err();
        assert!(no_url.to_string().contains("no base_url"));
    }

    #[test]
    fn profile_should_reject_bad_values() {
        let ini =
            Ini::load_from_str("[default]\nbase_url = http://x\ntimeout_secs = soon\n").unwrap();
        assert!(Profile::from_ini(&ini, "default").is_err());

        let ini =
            Ini::load_from_str("[default]\nbase_url = http://x\ndemo_fallback = maybe\n").unwrap();
        assert!(Profile::from_ini(&ini, "default").is_err());
    }
}
