//! 邮件发送模块
//! - smtp：use_tls 时使用 STARTTLS，否则明文连接
//! - file：开发环境下把邮件写成 .eml 文件

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;

use super::error::MonitorError;
use super::setting::{MailTransport, Smtp};
use crate::monitor_controller::traits::NotificationSink;
use crate::{debug, info, warn};

const LOG_TAG: &str = "Mail-common-module";

const PLAIN_TEXT_NOTICE: &str = "This notification is formatted as HTML, open it in an HTML capable mail client.";

enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

pub struct MailSender {
    transport: Transport,
    from: Mailbox,
}

impl MailSender {
    pub fn new(config: &Smtp) -> Result<Self, MonitorError> {
        let from = config
            .sender()
            .parse::<Mailbox>()
            .map_err(|e| MonitorError::Mail(format!("invalid sender {:?}: {}", config.sender(), e)))?;

        let transport = match config.transport {
            MailTransport::Smtp => {
                if !config.use_tls {
                    warn!(LOG_TAG, "smtp tls is disabled, credentials are sent in clear text");
                }
                let mut builder = if config.use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(config.host.as_str())
                        .map_err(|e| MonitorError::Mail(format!("create smtp transport: {}", e)))?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
                }
                .port(config.port);
                if !config.username.is_empty() {
                    builder = builder.credentials(Credentials::new(config.username.clone(), config.password.clone()));
                }
                Transport::Smtp(builder.build())
            }
            MailTransport::File => {
                let mail_dir = Path::new(config.file_path.as_str());
                if !mail_dir.exists() {
                    std::fs::create_dir_all(mail_dir)
                        .map_err(|e| MonitorError::Mail(format!("create mail folder {}: {}", config.file_path, e)))?;
                }
                Transport::File(AsyncFileTransport::<Tokio1Executor>::new(mail_dir))
            }
        };

        info!(LOG_TAG, "mail sender ready, transport: {:?}", config.transport);
        Ok(MailSender { transport, from })
    }

    fn build_message(&self, subject: &str, html_body: &str, recipients: &[String]) -> Result<Message, MonitorError> {
        if recipients.is_empty() {
            return Err(MonitorError::Mail(String::from("no recipients configured")));
        }
        let mut builder = Message::builder().from(self.from.clone()).subject(subject);
        for addr in recipients {
            let to = addr
                .parse::<Mailbox>()
                .map_err(|e| MonitorError::Mail(format!("invalid recipient {:?}: {}", addr, e)))?;
            builder = builder.to(to);
        }
        builder
            .multipart(MultiPart::alternative_plain_html(
                String::from(PLAIN_TEXT_NOTICE),
                html_body.to_string(),
            ))
            .map_err(|e| MonitorError::Mail(format!("build message: {}", e)))
    }
}

#[async_trait]
impl NotificationSink for MailSender {
    async fn send(&self, subject: &str, html_body: &str, recipients: &[String]) -> Result<(), MonitorError> {
        let message = self.build_message(subject, html_body, recipients)?;
        match &self.transport {
            Transport::Smtp(smtp) => {
                smtp.send(message)
                    .await
                    .map_err(|e| MonitorError::Mail(format!("send smtp mail: {}", e)))?;
            }
            Transport::File(file) => {
                let id = file
                    .send(message)
                    .await
                    .map_err(|e| MonitorError::Mail(format!("write mail file: {}", e)))?;
                debug!(LOG_TAG, "mail written as {}.eml", id);
            }
        }
        Ok(())
    }
}
