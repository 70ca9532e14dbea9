//! Status enums for requests, quotes and bookings, and the transitions allowed between them.
//!
//! Request states move `open -> in_progress -> completed`, fall back to `open` when the
//! booking is cancelled or removed, and can be sent to the absorbing `cancelled` state by a
//! mechanic edit. `completed` and `cancelled` accept no further events.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Things that happen elsewhere in the lifecycle and move a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEvent {
    Booked,
    BookingCompleted,
    BookingCancelled,
    BookingRemoved,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }

    /// Next status after `event`, or `InvalidTransition` when the event is not allowed here.
    pub fn apply(self, event: RequestEvent) -> Result<RequestStatus, ModelError> {
        use RequestEvent::*;
        use RequestStatus::*;
        match (self, event) {
            (Open, Booked) => Ok(InProgress),
            (InProgress, BookingCompleted) => Ok(Completed),
            (InProgress, BookingCancelled) | (InProgress, BookingRemoved) => Ok(Open),
            (Open, RequestEvent::Cancelled) | (InProgress, RequestEvent::Cancelled) => Ok(RequestStatus::Cancelled),
            (from, ev) => Err(ModelError::InvalidTransition(format!(
                "service request is {}; cannot apply {ev:?}",
                from.as_str()
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Rejected => "rejected",
        }
    }

    /// A quote is decided exactly once; only a pending quote accepts a different status.
    pub fn decide(self, target: QuoteStatus) -> Result<QuoteStatus, ModelError> {
        match self {
            current if current == target => Ok(current),
            QuoteStatus::Pending => Ok(target),
            decided => Err(ModelError::InvalidTransition(format!(
                "quote is already {}; only pending quotes can change",
                decided.as_str()
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Scheduled => "scheduled",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// scheduled -> in_progress | completed | cancelled, in_progress -> completed | cancelled.
    /// Re-asserting the current non-terminal status is a no-op.
    pub fn advance(self, target: BookingStatus) -> Result<BookingStatus, ModelError> {
        use BookingStatus::*;
        match (self, target) {
            (from, to) if from.is_terminal() => Err(ModelError::InvalidTransition(format!(
                "booking is {}; cannot move to {}",
                from.as_str(),
                to.as_str()
            ))),
            (from, to) if from == to => Ok(to),
            (Scheduled, InProgress) | (Scheduled, Completed) | (Scheduled, Cancelled) => Ok(target),
            (InProgress, Completed) | (InProgress, Cancelled) => Ok(target),
            (from, to) => Err(ModelError::InvalidTransition(format!(
                "booking is {}; cannot move to {}",
                from.as_str(),
                to.as_str()
            ))),
        }
    }

    /// The request-side event a booking entering this status triggers, if any.
    pub fn request_event(self) -> Option<RequestEvent> {
        match self {
            BookingStatus::Completed => Some(RequestEvent::BookingCompleted),
            BookingStatus::Cancelled => Some(RequestEvent::BookingCancelled),
            BookingStatus::Scheduled | BookingStatus::InProgress => None,
        }
    }
}

macro_rules! status_text {
    ($ty:ty, $what:literal, [$($variant:path),+ $(,)?]) => {
        impl $ty {
            /// Parses the wire value; unknown values are a validation error.
            pub fn parse(s: &str) -> Result<Self, ModelError> {
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| ModelError::Validation(format!("invalid {} status: {s}", $what)))
            }
        }
    };
}

status_text!(RequestStatus, "request", [RequestStatus::Open, RequestStatus::InProgress, RequestStatus::Completed, RequestStatus::Cancelled]);
status_text!(QuoteStatus, "quote", [QuoteStatus::Pending, QuoteStatus::Accepted, QuoteStatus::Rejected]);
status_text!(BookingStatus, "booking", [BookingStatus::Scheduled, BookingStatus::InProgress, BookingStatus::Completed, BookingStatus::Cancelled]);
