use crate::error::{Result, TripError};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use std::env;

const SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// A trip summary ready to deliver. The body is the markdown the search
/// adapters rendered, sent as plain text.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MailPayload {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    subject: String,
    content: Vec<MailContent>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
}

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
}

#[derive(Debug, Serialize)]
struct MailContent {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: String,
}

pub fn build_mail_payload(message: &EmailMessage, from: &str) -> MailPayload {
    MailPayload {
        personalizations: vec![Personalization {
            to: vec![EmailAddress {
                email: message.to.clone(),
            }],
        }],
        from: EmailAddress {
            email: from.to_string(),
        },
        subject: message.subject.clone(),
        content: vec![MailContent {
            content_type: "text/plain",
            value: message.content.clone(),
        }],
    }
}

/// Deliver one message through SendGrid. The sender address comes from
/// `SENDGRID_FROM` so no mailbox is baked into the binary.
pub async fn send_email(message: &EmailMessage) -> Result<()> {
    let api_key = env::var("SENDGRID_API_KEY")
        .map_err(|_| TripError::Config("SENDGRID_API_KEY not set".to_string()))?;
    let from = env::var("SENDGRID_FROM")
        .map_err(|_| TripError::Config("SENDGRID_FROM not set".to_string()))?;

    let payload = build_mail_payload(message, &from);

    log::info!("sending trip summary to {}", message.to);

    let client = reqwest::Client::new();
    let resp = client
        .post(SEND_URL)
        .header(AUTHORIZATION, format!("Bearer {api_key}"))
        .header(CONTENT_TYPE, "application/json")
        .json(&payload)
        .send()
        .await
        .map_err(|err| TripError::EmailFailed(err.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(TripError::EmailFailed(format!(
            "SendGrid returned {status}: {body}"
        )));
    }

    Ok(())
}
