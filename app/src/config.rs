use std::path::{Path, PathBuf};

use crate::notify::{parse_smtp_tls_mode_str, SmtpSettings};

pub const DB_FILE_NAME: &str = "lucidatafact.db";

pub const ENV_DB: &str = "LUCIDATAFACT_DB";
pub const ENV_SMTP_HOST: &str = "LUCIDATAFACT_SMTP_HOST";
pub const ENV_SMTP_PORT: &str = "LUCIDATAFACT_SMTP_PORT";
pub const ENV_SMTP_USER: &str = "LUCIDATAFACT_SMTP_USER";
pub const ENV_SMTP_PASSWORD: &str = "LUCIDATAFACT_SMTP_PASSWORD";
pub const ENV_SMTP_FROM: &str = "LUCIDATAFACT_SMTP_FROM";
pub const ENV_SMTP_TO: &str = "LUCIDATAFACT_SMTP_TO";
pub const ENV_SMTP_TLS: &str = "LUCIDATAFACT_SMTP_TLS";

/// Picks the database file. An explicit path always wins; otherwise the first
/// existing file next to the executable or in the working directory, falling
/// back to the first candidate so a fresh database lands there.
pub fn resolve_db_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join(DB_FILE_NAME));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(DB_FILE_NAME));
    }

    if let Some(found) = candidates.iter().find(|p| p.exists()) {
        return Some(found.clone());
    }
    candidates.into_iter().next()
}

/// Reads SMTP reminder settings through `lookup` (normally the process
/// environment). Returns `None` when no host is configured at all.
pub fn smtp_settings_from_lookup<F>(lookup: F) -> Option<SmtpSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let host = get(ENV_SMTP_HOST)?;
    let mut settings = SmtpSettings {
        host,
        ..SmtpSettings::default()
    };
    if let Some(port) = get(ENV_SMTP_PORT) {
        // Unparseable ports are kept invalid so validation reports them.
        settings.port = port.parse().unwrap_or(0);
    }
    settings.user = get(ENV_SMTP_USER).unwrap_or_default();
    settings.password = lookup(ENV_SMTP_PASSWORD).unwrap_or_default();
    settings.from = get(ENV_SMTP_FROM).unwrap_or_default();
    settings.to = get(ENV_SMTP_TO).unwrap_or_default();

    match get(ENV_SMTP_TLS).map(|v| v.to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "none" | "off" | "0" | "false" | "no") => {
            settings.use_tls = false;
            settings.tls_mode = None;
        }
        Some(v) => settings.tls_mode = parse_smtp_tls_mode_str(&v),
        None => settings.tls_mode = None,
    }
    Some(settings)
}

pub fn smtp_settings_from_env() -> Option<SmtpSettings> {
    smtp_settings_from_lookup(|k| std::env::var(k).ok())
}
