use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// NewTicket
///
/// A validated ticket ready to send. Field names on the wire follow the ticket API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    #[serde(rename = "sujet")]
    pub subject: String,
    #[serde(rename = "date_probleme")]
    pub problem_date: NaiveDate,
    pub description: String,
}

/// TicketForm
///
/// Raw values posted by the creation form, kept as typed by the visitor so the form can
/// be re-rendered on error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketForm {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub problem_date: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketFormError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Date of the problem must be a valid date (YYYY-MM-DD)")]
    InvalidDate,
}

impl TicketForm {
    pub fn validate(&self) -> Result<NewTicket, TicketFormError> {
        let subject = self.subject.trim();
        let description = self.description.trim();
        let date = self.problem_date.trim();
        if subject.is_empty() || description.is_empty() || date.is_empty() {
            return Err(TicketFormError::MissingFields);
        }

        let problem_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| TicketFormError::InvalidDate)?;

        Ok(NewTicket {
            subject: subject.to_string(),
            problem_date,
            description: description.to_string(),
        })
    }
}

/// TicketApiError
///
/// Failures from the ticket API. The `Display` text is shown in the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketApiError {
    /// The API answered with an error status; the message is taken from its body.
    #[error("{0}")]
    Rejected(String),
    /// The API could not be reached or answered with something unreadable.
    #[error("Server error. Please try again.")]
    Transport(String),
}

/// TicketApi
///
/// Contract for the external ticket service. Handlers only see this trait, so tests
/// can substitute `MockTicketApi`.
#[async_trait]
pub trait TicketApi: Send + Sync {
    /// Creates a ticket on behalf of the signed-in visitor. `bearer` is forwarded as
    /// the `Authorization` header when present.
    async fn create_ticket(
        &self,
        ticket: &NewTicket,
        bearer: Option<&str>,
    ) -> Result<Value, TicketApiError>;
}

pub type TicketApiState = Arc<dyn TicketApi>;

/// HttpTicketApi
///
/// `reqwest` client for the ticket API.
#[derive(Clone)]
pub struct HttpTicketApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTicketApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn tickets_url(&self) -> String {
        format!("{}/tickets/", self.base_url)
    }
}

#[async_trait]
impl TicketApi for HttpTicketApi {
    async fn create_ticket(
        &self,
        ticket: &NewTicket,
        bearer: Option<&str>,
    ) -> Result<Value, TicketApiError> {
        let mut request = self.client.post(self.tickets_url()).json(ticket);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "ticket API unreachable");
            TicketApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        // An empty or non-JSON body is tolerated on both paths.
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            tracing::info!(%status, "ticket created");
            Ok(body)
        } else {
            tracing::warn!(%status, "ticket API rejected ticket");
            Err(TicketApiError::Rejected(rejection_message(&body)))
        }
    }
}

/// Extracts a readable message from an error body of the form `{"detail": "..."}` or
/// `{"detail": [{"msg": "..."}, ...]}`.
pub fn rejection_message(body: &Value) -> String {
    match body.get("detail") {
        Some(Value::String(detail)) => detail.clone(),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                "Failed to create ticket".to_string()
            } else {
                messages.join(", ")
            }
        }
        _ => "Failed to create ticket".to_string(),
    }
}

/// MockTicketApi
///
/// In-memory stand-in that records submissions and answers with a fixed outcome.
#[derive(Default)]
pub struct MockTicketApi {
    failure: Option<TicketApiError>,
    submitted: Mutex<Vec<(NewTicket, Option<String>)>>,
}

impl MockTicketApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: TicketApiError) -> Self {
        Self {
            failure: Some(error),
            submitted: Mutex::default(),
        }
    }

    /// Tickets received so far, with the bearer token that accompanied each.
    pub fn submitted(&self) -> Vec<(NewTicket, Option<String>)> {
        self.submitted
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TicketApi for MockTicketApi {
    async fn create_ticket(
        &self,
        ticket: &NewTicket,
        bearer: Option<&str>,
    ) -> Result<Value, TicketApiError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push((ticket.clone(), bearer.map(str::to_string)));
        }
        Ok(serde_json::json!({ "id": 1, "sujet": ticket.subject }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(subject: &str, date: &str, description: &str) -> TicketForm {
        TicketForm {
            subject: subject.to_string(),
            problem_date: date.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn validate_trims_and_parses_date() {
        let ticket = form("  Printer jam ", "2025-03-14", " Tray 2 ").validate().unwrap();
        assert_eq!(ticket.subject, "Printer jam");
        assert_eq!(ticket.description, "Tray 2");
        assert_eq!(ticket.problem_date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
    }

    #[test]
    fn validate_rejects_missing_and_bad_dates() {
        assert_eq!(
            form("", "2025-03-14", "x").validate(),
            Err(TicketFormError::MissingFields)
        );
        assert_eq!(
            form("s", "14/03/2025", "x").validate(),
            Err(TicketFormError::InvalidDate)
        );
        assert_eq!(
            form("s", "2025-02-30", "x").validate(),
            Err(TicketFormError::InvalidDate)
        );
    }

    #[test]
    fn wire_names_follow_the_ticket_api() {
        let ticket = form("s", "2025-01-02", "d").validate().unwrap();
        assert_eq!(
            serde_json::to_value(&ticket).unwrap(),
            json!({ "sujet": "s", "date_probleme": "2025-01-02", "description": "d" })
        );
    }

    #[test]
    fn rejection_message_shapes() {
        assert_eq!(rejection_message(&json!({ "detail": "Not authenticated" })), "Not authenticated");
        assert_eq!(
            rejection_message(&json!({ "detail": [{ "msg": "field required" }, { "msg": "bad date" }] })),
            "field required, bad date"
        );
        assert_eq!(rejection_message(&json!({ "error": "x" })), "Failed to create ticket");
        assert_eq!(rejection_message(&Value::Null), "Failed to create ticket");
    }
}
