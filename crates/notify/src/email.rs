//! SMTP email channel.
//!
//! Each alert becomes one plain-text email to every configured recipient,
//! with the rendered subject and body and the topic in an `X-Heartwatch-Topic`
//! header.

use heartwatch_core::config::NotifyConfig;
use lettre::message::header::{ContentType, HeaderName, HeaderValue};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::traits::{Notification, Notifier, NotifyError};

const DEFAULT_SUBMISSION_PORT: u16 = 587;
const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailNotifier {
    /// Build the channel from the notify section.
    ///
    /// Port 465 uses implicit TLS; any other port uses STARTTLS unless
    /// `smtp_tls` is off. Credentials are used when both the username and
    /// password are set; setting only one is a configuration error.
    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| NotifyError::Config("SMTP_HOST is not set".into()))?;
        let from = parse_mailbox(
            config
                .email_from
                .as_deref()
                .ok_or_else(|| NotifyError::Config("HEARTWATCH_EMAIL_FROM is not set".into()))?,
        )?;
        let to = config
            .email_to
            .iter()
            .map(|addr| parse_mailbox(addr))
            .collect::<Result<Vec<_>, _>>()?;
        if to.is_empty() {
            return Err(NotifyError::Config("HEARTWATCH_EMAIL_TO has no recipients".into()));
        }

        let port = config.smtp_port.unwrap_or(DEFAULT_SUBMISSION_PORT);
        let builder = if port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else if config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        } else {
            Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
        }
        .map_err(|e| NotifyError::Config(format!("SMTP relay '{host}': {e}")))?
        .port(port);

        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(user), Some(password)) => builder.credentials(Credentials::new(user.clone(), password.clone())),
            (None, None) => builder,
            _ => {
                return Err(NotifyError::Config(
                    "SMTP_USERNAME and SMTP_PASSWORD must be set together".into(),
                ))
            }
        };

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    fn compose(&self, notification: &Notification) -> Result<Message, NotifyError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(notification.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .raw_header(HeaderValue::new(
                HeaderName::new_from_ascii_str("X-Heartwatch-Topic"),
                notification.topic.clone(),
            ));
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }
        builder
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Smtp(e.to_string()))
    }
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, NotifyError> {
    addr.parse()
        .map_err(|e| NotifyError::Config(format!("invalid email address '{addr}': {e}")))
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = self.compose(notification)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::debug!(subject = %notification.subject, recipients = self.to.len(), "Alert emailed");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}
