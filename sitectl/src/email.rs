//! Email service for invitation emails.

use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::{path::Path, time::Duration};

use crate::{
    config::{Config, EmailTransportConfig},
    errors::Error,
};

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
    reply_to: Option<String>,
    site_title: String,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let email_config = &config.email;

        let transport = match &email_config.transport {
            EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(smtp_builder.build())
            }
            EmailTransportConfig::File { path } => {
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: email_config.from_email.clone(),
            from_name: email_config.from_name.clone(),
            reply_to: email_config.reply_to.clone(),
            site_title: config.site.title.clone(),
        })
    }

    /// Send the link an invited user follows to choose their password.
    pub async fn send_invitation_email(
        &self,
        to_email: &str,
        to_name: Option<&str>,
        accept_link: &str,
        valid_for: Duration,
    ) -> Result<(), Error> {
        let subject = format!("You're invited to edit {}", self.site_title);
        let body = self.create_invitation_body(to_name, accept_link, valid_for);
        self.send_email(to_email, to_name, &subject, &body).await
    }

    async fn send_email(&self, to_email: &str, to_name: Option<&str>, subject: &str, body: &str) -> Result<(), Error> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal {
                operation: format!("parse from email: {e}"),
            })?;

        let to = if let Some(name) = to_name {
            format!("{name} <{to_email}>")
        } else {
            to_email.to_string()
        }
        .parse::<Mailbox>()
        .map_err(|e| Error::Internal {
            operation: format!("parse to email: {e}"),
        })?;

        let mut builder = Message::builder().from(from).to(to).subject(subject).header(ContentType::TEXT_HTML);
        if let Some(reply_to) = &self.reply_to {
            let reply_to = reply_to.parse::<Mailbox>().map_err(|e| Error::Internal {
                operation: format!("parse reply-to email: {e}"),
            })?;
            builder = builder.reply_to(reply_to);
        }
        let message = builder.body(body.to_string()).map_err(|e| Error::Internal {
            operation: format!("build email message: {e}"),
        })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        Ok(())
    }

    fn create_invitation_body(&self, to_name: Option<&str>, accept_link: &str, valid_for: Duration) -> String {
        let greeting = match to_name {
            Some(name) => format!("Hello {name},"),
            None => "Hello,".to_string(),
        };
        let site = &self.site_title;
        let days = (valid_for.as_secs() / 86_400).max(1);
        let validity = if days == 1 { "1 day".to_string() } else { format!("{days} days") };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Invitation to {site}</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .footer {{ margin-top: 30px; font-size: 12px; color: #666; }}
    </style>
</head>
<body>
    <div class="container">
        <h2>You have been invited to the {site} admin console</h2>

        <p>{greeting}</p>

        <p>An administrator created an account for you. Choose a password to finish setting it up:</p>

        <p><a href="{accept_link}">Accept invitation</a></p>

        <p>Or copy and paste this link into your browser:</p>
        <p>{accept_link}</p>

        <p>This link expires in {validity}.</p>

        <div class="footer">
            <p>If you were not expecting this invitation, you can ignore this email.</p>
            <p>This is an automated message, please do not reply to this email.</p>
        </div>
    </div>
</body>
</html>"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_config;

    fn service_writing_to(dir: &Path) -> EmailService {
        let mut config = create_test_config();
        config.email.transport = EmailTransportConfig::File {
            path: dir.to_string_lossy().into_owned(),
        };
        EmailService::new(&config).unwrap()
    }

    #[test]
    fn test_invitation_body() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_writing_to(dir.path());

        let body = service.create_invitation_body(
            Some("Asha"),
            "https://site.example.com/admin/accept-invitation?token=abc",
            Duration::from_secs(7 * 86_400),
        );
        assert!(body.contains("Hello Asha,"));
        assert!(body.contains("https://site.example.com/admin/accept-invitation?token=abc"));
        assert!(body.contains("7 days"));

        let body = service.create_invitation_body(None, "https://x.test", Duration::from_secs(60));
        assert!(body.contains("Hello,"));
        assert!(body.contains("1 day"));
    }

    #[tokio::test]
    async fn test_file_transport_writes_message() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_writing_to(dir.path());

        service
            .send_invitation_email(
                "editor@example.com",
                None,
                "https://site.example.com/admin/accept-invitation?token=abc",
                Duration::from_secs(86_400),
            )
            .await
            .unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        let contents = std::fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
        assert!(contents.contains("editor@example.com"));
    }
}
