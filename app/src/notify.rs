//! Native reminder channels. The in-app reminder needs none of this; a
//! [`Notifier`] is the optional extra the daily check tries when enabled.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{SmtpTransport, Transport};
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationPermission {
    Granted,
    Denied,
    Unsupported,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Whether this channel may deliver right now.
    fn permission(&self) -> NotificationPermission;

    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Channel for sessions with no native notifications at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Unsupported
    }

    async fn notify(&self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::NotConfigured("no notification channel".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SmtpTlsMode {
    Implicit,
    Starttls,
}

impl SmtpTlsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmtpTlsMode::Implicit => "implicit",
            SmtpTlsMode::Starttls => "starttls",
        }
    }
}

fn default_smtp_tls_mode_for_port(port: i64) -> SmtpTlsMode {
    match port {
        465 => SmtpTlsMode::Implicit,
        _ => SmtpTlsMode::Starttls,
    }
}

pub fn parse_smtp_tls_mode_str(v: &str) -> Option<SmtpTlsMode> {
    let s = v.trim();
    if s.eq_ignore_ascii_case("implicit") {
        Some(SmtpTlsMode::Implicit)
    } else if s.eq_ignore_ascii_case("starttls") {
        Some(SmtpTlsMode::Starttls)
    } else {
        None
    }
}

fn resolved_smtp_tls_mode(mode: Option<SmtpTlsMode>, port: i64) -> SmtpTlsMode {
    mode.unwrap_or_else(|| default_smtp_tls_mode_for_port(port))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpSettings {
    pub host: String,
    pub port: i64,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub from: String,
    pub to: String,
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
    #[serde(default)]
    pub tls_mode: Option<SmtpTlsMode>,
}

fn default_use_tls() -> bool {
    true
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            user: String::new(),
            password: String::new(),
            from: String::new(),
            to: String::new(),
            use_tls: true,
            tls_mode: Some(SmtpTlsMode::Starttls),
        }
    }
}

pub fn validate_smtp_settings(s: &SmtpSettings) -> Result<(), NotifyError> {
    let fail = |msg: &str| -> Result<(), NotifyError> { Err(NotifyError::NotConfigured(msg.to_string())) };

    if s.host.trim().is_empty() {
        return fail("missing SMTP host");
    }
    if s.port <= 0 || s.port > 65535 {
        return fail("invalid SMTP port");
    }
    if s.from.trim().is_empty() {
        return fail("missing From address");
    }
    if s.to.trim().is_empty() {
        return fail("missing reminder recipient");
    }
    let user_empty = s.user.trim().is_empty();
    let pass_empty = s.password.trim().is_empty();
    if user_empty ^ pass_empty {
        return fail("set both SMTP user and password, or leave both empty");
    }

    if s.use_tls {
        let mode = resolved_smtp_tls_mode(s.tls_mode, s.port);
        if s.port == 465 && mode != SmtpTlsMode::Implicit {
            return fail("port 465 requires implicit TLS (SMTPS)");
        }
        if s.port == 587 && mode != SmtpTlsMode::Starttls {
            return fail("port 587 requires STARTTLS");
        }
    }
    Ok(())
}

fn build_smtp_transport(s: &SmtpSettings) -> Result<SmtpTransport, NotifyError> {
    validate_smtp_settings(s)?;
    let port: u16 = u16::try_from(s.port)
        .map_err(|_| NotifyError::NotConfigured("invalid SMTP port".to_string()))?;
    let host = s.host.trim();

    let mut builder = if s.use_tls {
        match resolved_smtp_tls_mode(s.tls_mode, s.port) {
            SmtpTlsMode::Implicit => {
                let tls_params = TlsParameters::new(host.to_string())
                    .map_err(|e| NotifyError::NotConfigured(format!("TLS parameters: {e}")))?;
                SmtpTransport::builder_dangerous(host)
                    .port(port)
                    .tls(Tls::Wrapper(tls_params))
            }
            SmtpTlsMode::Starttls => SmtpTransport::starttls_relay(host)
                .map_err(|e| NotifyError::NotConfigured(format!("invalid SMTP host: {e}")))?
                .port(port),
        }
    } else {
        SmtpTransport::builder_dangerous(host).port(port)
    };

    if !s.user.trim().is_empty() {
        builder = builder.credentials(Credentials::new(s.user.clone(), s.password.clone()));
    }

    Ok(builder.build())
}

/// Sends the daily reminder as a plain-text e-mail.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    settings: SmtpSettings,
}

impl SmtpNotifier {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SmtpSettings {
        &self.settings
    }

    fn build_message(&self, title: &str, body: &str) -> Result<Message, NotifyError> {
        let from: Mailbox = self
            .settings
            .from
            .parse()
            .map_err(|_| NotifyError::Message("invalid From address".to_string()))?;
        let to: Mailbox = self
            .settings
            .to
            .parse()
            .map_err(|_| NotifyError::Message("invalid recipient address".to_string()))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(title)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Message(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn permission(&self) -> NotificationPermission {
        match validate_smtp_settings(&self.settings) {
            Ok(()) => NotificationPermission::Granted,
            Err(_) => NotificationPermission::Denied,
        }
    }

    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let email = self.build_message(title, body)?;
        let settings = self.settings.clone();

        tokio::task::spawn_blocking(move || {
            let transport = build_smtp_transport(&settings)?;
            transport
                .send(&email)
                .map_err(|e| NotifyError::Delivery(e.to_string()))?;
            Ok::<(), NotifyError>(())
        })
        .await
        .map_err(|e| NotifyError::Delivery(e.to_string()))?
    }
}
