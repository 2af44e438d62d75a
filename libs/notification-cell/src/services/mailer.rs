use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::models::AppointmentNotice;

/// Best-effort mail dispatch. Every notify method spawns a detached task so
/// booking latency never depends on mail delivery; delivery failures are
/// logged and swallowed, never returned to the caller.
#[derive(Clone)]
pub struct NotificationService {
    client: Client,
    service_url: String,
    api_key: String,
    enabled: bool,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            service_url: config.mail_service_url.clone(),
            api_key: config.mail_service_api_key.clone(),
            enabled: config.is_mail_configured(),
        }
    }

    pub fn notify_created(&self, notice: AppointmentNotice) {
        self.dispatch("appointment_created", notice, None);
    }

    pub fn notify_cancelled(&self, notice: AppointmentNotice, reason: String) {
        self.dispatch("appointment_cancelled", notice, Some(reason));
    }

    pub fn notify_updated(&self, notice: AppointmentNotice) {
        self.dispatch("appointment_updated", notice, None);
    }

    fn dispatch(&self, template: &'static str, notice: AppointmentNotice, reason: Option<String>) {
        if !self.enabled {
            debug!("Mail service not configured, skipping {} notification", template);
            return;
        }

        let Some(recipient) = notice.client_email.clone() else {
            debug!(
                "No client email on appointment {}, skipping {} notification",
                notice.appointment_id, template
            );
            return;
        };

        let client = self.client.clone();
        let url = format!("{}/send", self.service_url);
        let api_key = self.api_key.clone();

        tokio::spawn(async move {
            let body = json!({
                "template": template,
                "to": recipient,
                "data": {
                    "appointment_id": notice.appointment_id,
                    "appointment_type": notice.appointment_type,
                    "date": notice.appointment_date,
                    "start_time": notice.start_time,
                    "license_plate": notice.license_plate,
                    "reason": reason,
                }
            });

            let result = client
                .post(&url)
                .bearer_auth(&api_key)
                .json(&body)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    debug!(
                        "Sent {} notification for appointment {}",
                        template, notice.appointment_id
                    );
                }
                Ok(response) => {
                    warn!(
                        "Mail service returned {} for appointment {} ({})",
                        response.status(),
                        notice.appointment_id,
                        template
                    );
                }
                Err(e) => {
                    warn!(
                        "Failed to send {} notification for appointment {}: {}",
                        template, notice.appointment_id, e
                    );
                }
            }
        });
    }
}
