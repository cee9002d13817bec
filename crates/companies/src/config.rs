//! CLI configuration -- thin wrapper around `companies_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--url, --token, etc.).

use std::time::Duration;

use secrecy::SecretString;

use companies_core::{FeedConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use companies_config::{
    Config, Profile, config_path, load_config_or_default, parse_database_url, save_config,
    store_auth_token,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `FeedConfig` from the config file, profile, and CLI overrides.
///
/// With `--url` no profile is required; otherwise the active profile
/// supplies the database.
pub fn build_feed_config(global: &GlobalOpts) -> Result<FeedConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    match cfg.profiles.get(&profile_name) {
        Some(profile) => resolve_profile(profile, &profile_name, &cfg, global),
        None if global.url.is_some() => {
            let profile = Profile::new(global.url.clone().unwrap_or_default());
            resolve_profile(&profile, &profile_name, &cfg, global)
        }
        None if global.profile.is_some() => Err(companies_config::ConfigError::UnknownProfile {
            name: profile_name,
        }
        .into()),
        None => Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        }),
    }
}

/// Translate a `Profile` + global flags into a `FeedConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<FeedConfig, CliError> {
    // 1. Read token (flag > env var > keyring > plaintext)
    let auth = match global.token {
        Some(ref token) => Some(SecretString::from(token.clone())),
        None => companies_config::resolve_auth_token(profile, profile_name),
    };

    // 2. Database URL (flag > env > profile)
    let mut profile = profile.clone();
    if let Some(ref url) = global.url {
        profile.database_url.clone_from(url);
    }

    // 3. Collection (flag > env > profile)
    if let Some(ref collection) = global.collection {
        profile.collection.clone_from(collection);
    }

    let mut feed = companies_config::feed_config(&profile, &cfg.defaults, auth)?;

    // 4. TLS verification
    if global.insecure {
        feed.tls = TlsVerification::DangerAcceptInvalid;
    }

    // 5. Timeout (flag > env > profile > defaults)
    if let Some(secs) = global.timeout {
        feed.connect_timeout = Duration::from_secs(secs);
    }

    Ok(feed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        // A token flag keeps resolution away from the keyring
        let mut argv = vec!["companies", "--token", "t"];
        argv.extend_from_slice(args);
        argv.push("list");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn timeout_for(profile_timeout: Option<u64>, args: &[&str]) -> Duration {
        let mut profile = Profile::new("https://demo.example");
        profile.timeout = profile_timeout;
        resolve_profile(&profile, "default", &Config::default(), &global(args))
            .unwrap()
            .connect_timeout
    }

    #[test]
    fn timeout_flag_beats_profile() {
        assert_eq!(timeout_for(Some(5), &["--timeout", "9"]), Duration::from_secs(9));
        assert_eq!(timeout_for(None, &["--timeout", "9"]), Duration::from_secs(9));
    }

    #[test]
    fn without_flag_profile_then_defaults_apply() {
        assert_eq!(timeout_for(Some(5), &[]), Duration::from_secs(5));
        assert_eq!(timeout_for(None, &[]), Duration::from_secs(30));
    }
}
