//! Report dispatch
//!
//! Sends a composed report through the email transport. When no SMTP
//! provider is configured the dispatcher takes a mock path: the would-be
//! send is logged and a test-mode success is returned, so demo and
//! development environments never hard-fail on missing credentials.
//!
//! Provider failures of any kind (timeout, auth, rejected recipient) are
//! surfaced uniformly as `DispatchError` with the provider's message
//! preserved. A failed dispatch never touches the already-persisted
//! records; the caller's contract with the operator is "your data is
//! saved, the email failed, you may retry".

use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailConfig;
use crate::models::ExpiryStatus;
use crate::services::report::Report;
use std::sync::Arc;

/// Error types for report dispatch
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The provider rejected or failed the send; message preserved verbatim
    #[error("{0}")]
    Provider(String),

    /// The report could not be rendered into a transport message
    #[error("Failed to build report email: {0}")]
    InvalidMessage(String),
}

/// Result of a dispatch attempt that did not fail
#[derive(Debug, Clone)]
pub struct DispatchResult {
    /// Human-readable message for the operator, set on the mock path
    pub message: Option<String>,
}

/// Transport seam between the dispatcher and the actual email provider
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Send one email to the given recipients
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        html_body: &str,
    ) -> Result<(), DispatchError>;
}

/// SMTP transport backed by lettre
pub struct SmtpEmailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpEmailTransport {
    /// Build the transport from configuration.
    ///
    /// Call only when `config.is_configured()` holds.
    pub fn from_config(config: &EmailConfig) -> anyhow::Result<Self> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("SMTP host not configured"))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| anyhow::anyhow!("Failed to create SMTP transport: {}", e))?
            .port(config.smtp_port);

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            mailer: builder.build(),
            from: format!("{} <{}>", config.smtp_from_name, config.smtp_from),
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpEmailTransport {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        html_body: &str,
    ) -> Result<(), DispatchError> {
        let mut builder = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| DispatchError::InvalidMessage(format!("invalid from address: {}", e)))?,
            )
            .subject(subject)
            .header(ContentType::TEXT_HTML);

        for recipient in recipients {
            builder = builder.to(recipient
                .parse()
                .map_err(|e| DispatchError::InvalidMessage(format!("invalid recipient {}: {}", recipient, e)))?);
        }

        let email = builder
            .body(html_body.to_string())
            .map_err(|e| DispatchError::InvalidMessage(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| DispatchError::Provider(e.to_string()))
    }
}

/// Dispatches composed reports through the configured transport.
///
/// Stateless between calls, and not idempotent: every call sends a fresh
/// email. Repeat sends are gated by the session lifecycle, not here.
pub struct ReportDispatcher {
    transport: Option<Arc<dyn EmailTransport>>,
}

impl ReportDispatcher {
    /// Create a dispatcher over the given transport; `None` selects the
    /// mock path
    pub fn new(transport: Option<Arc<dyn EmailTransport>>) -> Self {
        Self { transport }
    }

    /// Build a dispatcher from configuration
    pub fn from_config(config: &EmailConfig) -> anyhow::Result<Self> {
        if config.is_configured() {
            let transport = SmtpEmailTransport::from_config(config)?;
            Ok(Self::new(Some(Arc::new(transport))))
        } else {
            Ok(Self::new(None))
        }
    }

    /// Whether a real provider is wired in
    pub fn is_live(&self) -> bool {
        self.transport.is_some()
    }

    /// Dispatch a report.
    ///
    /// Mock path (no transport): logs the would-be send and returns a
    /// test-mode success. Live path: renders the HTML payload and sends;
    /// any provider failure becomes a `DispatchError`.
    pub async fn dispatch(&self, report: &Report) -> Result<DispatchResult, DispatchError> {
        let recipients = report.recipients.join(", ");

        let Some(transport) = &self.transport else {
            tracing::info!(
                to = %recipients,
                subject = %report.subject(),
                records = report.counts.total,
                "Mock email report (no SMTP provider configured)"
            );
            return Ok(DispatchResult {
                message: Some(format!(
                    "Test mode: the report for {} was generated successfully (no email provider configured).",
                    recipients
                )),
            });
        };

        let html = render_report_html(report);
        transport
            .send(&report.recipients, &report.subject(), &html)
            .await?;

        tracing::info!(to = %recipients, records = report.counts.total, "Report dispatched");
        Ok(DispatchResult { message: None })
    }
}

/// Render the report into the HTML email body
pub fn render_report_html(report: &Report) -> String {
    let rows: String = report
        .lines
        .iter()
        .map(|line| {
            let (badge_style, label) = match line.status {
                ExpiryStatus::Expired => ("background: #fee2e2; color: #991b1b;", "Expired"),
                ExpiryStatus::ExpiringSoon => ("background: #fef3c7; color: #92400e;", "Attention"),
                ExpiryStatus::Valid => ("background: #ecfdf5; color: #065f46;", "OK"),
            };
            format!(
                r#"<tr style="border-bottom: 1px solid #f1f5f9;">
                  <td style="padding: 12px 0; font-weight: bold;">{}</td>
                  <td style="padding: 12px 0; font-size: 14px;">{}</td>
                  <td style="padding: 12px 0;"><span style="padding: 4px 8px; border-radius: 4px; font-size: 10px; font-weight: bold; text-transform: uppercase; {}">{}</span></td>
                </tr>"#,
                line.product_name, line.expiry, badge_style, label
            )
        })
        .collect();

    format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto; border: 1px solid #eee; border-radius: 12px; overflow: hidden;">
  <div style="background: #1e293b; color: white; padding: 24px; text-align: center;">
    <h1 style="margin: 0; font-size: 24px;">Expiry Report</h1>
    <p style="margin: 8px 0 0; opacity: 0.8; font-size: 14px;">{store} - {period}</p>
  </div>
  <div style="padding: 24px;">
    <p>Hello,</p>
    <p>Operator <strong>{operator}</strong> has finished the expiry check.</p>
    <div style="display: grid; grid-template-columns: 1fr 1fr; gap: 16px; margin: 24px 0;">
      <div style="background: #f8fafc; padding: 16px; border-radius: 8px; text-align: center;">
        <span style="display: block; font-size: 24px; font-weight: bold;">{total}</span>
        <span style="font-size: 12px; color: #64748b; text-transform: uppercase;">Total Checked</span>
      </div>
      <div style="background: #fef2f2; padding: 16px; border-radius: 8px; text-align: center;">
        <span style="display: block; font-size: 24px; font-weight: bold; color: #dc2626;">{expired}</span>
        <span style="font-size: 12px; color: #ef4444; text-transform: uppercase;">Expired</span>
      </div>
    </div>
    <h3 style="border-bottom: 1px solid #eee; padding-bottom: 8px;">Record Details:</h3>
    <table style="width: 100%; border-collapse: collapse;">
      <thead>
        <tr style="text-align: left; font-size: 12px; color: #64748b; text-transform: uppercase;">
          <th style="padding: 8px 0;">Product</th>
          <th style="padding: 8px 0;">Expiry</th>
          <th style="padding: 8px 0;">Status</th>
        </tr>
      </thead>
      <tbody>{rows}</tbody>
    </table>
  </div>
  <div style="background: #f8fafc; padding: 16px; text-align: center; font-size: 12px; color: #94a3b8;">
    Sent via ShelfCheck
  </div>
</div>"#,
        store = report.store,
        period = report.period.to_string().to_uppercase(),
        operator = report.operator_name,
        total = report.counts.total,
        expired = report.counts.expired,
        rows = rows,
    )
}
