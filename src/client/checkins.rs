//! Check-in submission and listing.

use reqwest::{Method, StatusCode};

use super::dto::{CheckInRequest, SubmitOutcome};
use super::{ApiClient, error_from_response, send_json};
use crate::domain::{CheckInRecord, EventId};
use crate::error::ClientError;

impl ApiClient {
    /// Records a check-in via `POST /api/checkins`.
    ///
    /// Only `409 Conflict` is reported as
    /// [`SubmitOutcome::AlreadyCheckedIn`]. Every other failure is an error,
    /// whatever its message says.
    ///
    /// # Errors
    ///
    /// Returns a transport error or any other non-success status.
    pub async fn submit_check_in(
        &self,
        token: &str,
        event_id: &EventId,
    ) -> Result<SubmitOutcome, ClientError> {
        let response = self
            .authed(Method::POST, "/api/checkins", token)?
            .json(&CheckInRequest { event_id })
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(SubmitOutcome::Created);
        }
        if response.status() == StatusCode::CONFLICT {
            return Ok(SubmitOutcome::AlreadyCheckedIn);
        }
        Err(error_from_response(response, "Check-in").await)
    }

    /// Lists the viewer's check-ins (`GET /api/checkins`).
    ///
    /// # Errors
    ///
    /// Returns a transport, status, or decode error.
    pub async fn list_check_ins(&self, token: &str) -> Result<Vec<CheckInRecord>, ClientError> {
        send_json(
            self.authed(Method::GET, "/api/checkins", token)?,
            "Loading check-ins",
        )
        .await
    }
}
