use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, Secret};

use crate::config::Config;
use crate::models::vendor::VendorWithBundle;

#[derive(thiserror::Error, Debug)]
pub enum MailerError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

#[derive(Clone)]
struct SmtpSettings {
    host: String,
    port: u16,
    user: Option<String>,
    password: Option<Secret<String>>,
}

/// Transactional email sender for the subscription sweeps. When no SMTP host
/// is configured, sends are logged and skipped so the sweeps stay runnable in
/// development.
#[derive(Clone)]
pub struct Mailer {
    smtp: Option<SmtpSettings>,
    from_address: String,
    admin_email: String,
    base_url: String,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Self {
        Self {
            smtp: config.smtp_host.clone().map(|host| SmtpSettings {
                host,
                port: config.smtp_port,
                user: config.smtp_user.clone(),
                password: config.smtp_password.clone(),
            }),
            from_address: config.smtp_from.clone(),
            admin_email: config.admin_email.clone(),
            base_url: config.base_url.clone(),
        }
    }

    /// Subscription warning to the vendor at the 30/7/2-day marks.
    pub async fn send_subscription_warning(
        &self,
        vendor: &VendorWithBundle,
        days_remaining: i64,
    ) -> Result<(), MailerError> {
        let subject = format!("Your subscription expires in {} days", days_remaining);
        let body = vendor_warning_body(
            &vendor.name,
            days_remaining,
            vendor.bundle_name.as_deref(),
            vendor.bundle_price,
            &renewal_link(&self.base_url, &vendor.id.to_string()),
        );
        self.send(&vendor.contact_email, &subject, body).await
    }

    /// Heads-up to the admin channel, sent only at the 2-day mark.
    pub async fn send_admin_subscription_warning(
        &self,
        vendor: &VendorWithBundle,
        days_remaining: i64,
    ) -> Result<(), MailerError> {
        let subject = format!("Vendor subscription expiring: {}", vendor.name);
        let body = admin_warning_body(&vendor.name, &vendor.contact_email, days_remaining);
        self.send(&self.admin_email, &subject, body).await
    }

    pub async fn send_subscription_expired(
        &self,
        vendor: &VendorWithBundle,
    ) -> Result<(), MailerError> {
        let subject = "Your subscription has expired".to_string();
        let body = expired_body(
            &vendor.name,
            &renewal_link(&self.base_url, &vendor.id.to_string()),
        );
        self.send(&vendor.contact_email, &subject, body).await
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), MailerError> {
        let Some(smtp) = &self.smtp else {
            tracing::info!(
                to = to,
                subject = subject,
                "SMTP not configured, skipping email"
            );
            return Ok(());
        };

        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| MailerError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?.port(smtp.port);

        if let (Some(user), Some(pass)) = (&smtp.user, &smtp.password) {
            transport_builder = transport_builder
                .credentials(Credentials::new(user.clone(), pass.expose_secret().clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(to = to, subject = subject, "Email sent");
        Ok(())
    }
}

fn renewal_link(base_url: &str, vendor_id: &str) -> String {
    format!(
        "{}/vendors/{}/subscription/renew",
        base_url.trim_end_matches('/'),
        vendor_id
    )
}

fn vendor_warning_body(
    vendor_name: &str,
    days_remaining: i64,
    bundle_name: Option<&str>,
    bundle_price: Option<f64>,
    renewal_link: &str,
) -> String {
    let bundle_line = match (bundle_name, bundle_price) {
        (Some(name), Some(price)) => format!("Current bundle: {} ({:.2})\n", name, price),
        (Some(name), None) => format!("Current bundle: {}\n", name),
        _ => String::new(),
    };

    format!(
        "Hi {},\n\n\
         Your marketplace subscription expires in {} days.\n\
         {}\
         Renew here to keep your listing active: {}\n",
        vendor_name, days_remaining, bundle_line, renewal_link
    )
}

fn admin_warning_body(vendor_name: &str, contact_email: &str, days_remaining: i64) -> String {
    format!(
        "Vendor \"{}\" ({}) has a subscription expiring in {} days.\n",
        vendor_name, contact_email, days_remaining
    )
}

fn expired_body(vendor_name: &str, renewal_link: &str) -> String {
    format!(
        "Hi {},\n\n\
         Your marketplace subscription has expired and your listing is no longer\n\
         shown to customers. Renew here to reactivate it: {}\n",
        vendor_name, renewal_link
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_body_carries_days_bundle_and_link() {
        let body = vendor_warning_body(
            "Spice Corner",
            7,
            Some("Gold"),
            Some(49.0),
            "https://souk.example/vendors/abc/subscription/renew",
        );
        assert!(body.contains("7 days"));
        assert!(body.contains("Gold (49.00)"));
        assert!(body.contains("https://souk.example/vendors/abc/subscription/renew"));
    }

    #[test]
    fn warning_body_omits_missing_bundle() {
        let body = vendor_warning_body("Spice Corner", 2, None, None, "link");
        assert!(!body.contains("Current bundle"));
    }

    #[test]
    fn admin_body_names_the_vendor() {
        let body = admin_warning_body("Spice Corner", "owner@spice.example", 2);
        assert!(body.contains("Spice Corner"));
        assert!(body.contains("owner@spice.example"));
        assert!(body.contains("2 days"));
    }

    #[test]
    fn expired_body_carries_renewal_link() {
        let body = expired_body("Spice Corner", "https://souk.example/renew");
        assert!(body.contains("Spice Corner"));
        assert!(body.contains("https://souk.example/renew"));
    }

    #[test]
    fn renewal_link_trims_trailing_slash() {
        assert_eq!(
            renewal_link("https://souk.example/", "abc"),
            "https://souk.example/vendors/abc/subscription/renew"
        );
    }
}
