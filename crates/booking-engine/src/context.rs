//! The active (user, date) context a booking screen works in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};

/// Identifies which day's state the engine currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextKey {
    pub user_id: String,
    pub date: NaiveDate,
}

/// Everything a booking needs besides the chosen time.
///
/// Passed explicitly into every engine operation; the identifiers are carried
/// through to the backend, not authorized here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingContext {
    pub tenant_id: String,
    pub created_by: String,
    pub assigned_user_id: String,
    pub lead_id: String,
    pub student_id: String,
    /// The counsellor/agent whose calendar is being booked.
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub date: NaiveDate,
    pub timezone: String,
}

impl BookingContext {
    /// A context with only the calendar owner and day filled in, enough for
    /// read-only availability lookups.
    pub fn for_user(user_id: impl Into<String>, date: NaiveDate, timezone: impl Into<String>) -> Self {
        Self {
            tenant_id: String::new(),
            created_by: String::new(),
            assigned_user_id: String::new(),
            lead_id: String::new(),
            student_id: String::new(),
            user_id: user_id.into(),
            user_name: None,
            user_email: None,
            date,
            timezone: timezone.into(),
        }
    }

    pub fn key(&self) -> ContextKey {
        ContextKey {
            user_id: self.user_id.clone(),
            date: self.date,
        }
    }

    /// Pre-flight check run before any booking request.
    ///
    /// # Errors
    /// `BookingError::Validation` naming the first missing identifier.
    pub fn validate(&self) -> Result<()> {
        if blank(&self.tenant_id) {
            return Err(BookingError::Validation("Tenant is required to book a slot".into()));
        }
        if blank(&self.created_by) && blank(&self.assigned_user_id) {
            return Err(BookingError::Validation(
                "Assigned user is required to book a slot".into(),
            ));
        }
        if blank(&self.lead_id) && blank(&self.student_id) {
            return Err(BookingError::Validation("Lead is required to book a slot".into()));
        }
        if blank(&self.user_id) {
            return Err(BookingError::Validation(
                "Select a counsellor before booking".into(),
            ));
        }
        Ok(())
    }

    /// Lead id, falling back to the student id.
    pub fn effective_lead_id(&self) -> &str {
        first_filled(&self.lead_id, &self.student_id)
    }

    pub fn effective_student_id(&self) -> &str {
        first_filled(&self.student_id, &self.lead_id)
    }

    pub fn effective_created_by(&self) -> &str {
        first_filled(&self.created_by, &self.assigned_user_id)
    }

    pub fn effective_assigned_user_id(&self) -> &str {
        first_filled(&self.assigned_user_id, &self.created_by)
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn first_filled<'a>(preferred: &'a str, fallback: &'a str) -> &'a str {
    if blank(preferred) {
        fallback
    } else {
        preferred
    }
}
