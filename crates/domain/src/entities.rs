use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{DispatchError, DispatchResult};

/// Sentinel stored when a dispatch is created without a description.
pub const DEFAULT_DESCRIPTION: &str = "No description";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields required to persist a new user. The password arrives here already
/// hashed; plaintext never crosses the repository boundary.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Pending,
    Accepted,
    Started,
    Completed,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Pending => "pending",
            DispatchStatus::Accepted => "accepted",
            DispatchStatus::Started => "started",
            DispatchStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DispatchStatus::Pending),
            "accepted" => Ok(DispatchStatus::Accepted),
            "started" => Ok(DispatchStatus::Started),
            "completed" => Ok(DispatchStatus::Completed),
            _ => Err(format!("invalid dispatch status: {s}")),
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for DispatchStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for DispatchStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for DispatchStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
    }
}

/// Proof-of-delivery payload captured when a dispatch is completed.
///
/// At least one field must be present; fields the caller omits are stored
/// as empty strings rather than nulls so that a completed dispatch always
/// carries all three columns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodDetails {
    pub pod_image: Option<String>,
    pub notes: Option<String>,
    pub recipient_name: Option<String>,
}

impl PodDetails {
    pub fn is_empty(&self) -> bool {
        self.pod_image.is_none() && self.notes.is_none() && self.recipient_name.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispatch {
    pub id: i64,
    pub area: String,
    pub description: String,
    /// Mutable business date; distinct from the immutable creation time.
    pub date: DateTime<Utc>,
    pub status: DispatchStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub complete_time: Option<DateTime<Utc>>,
    pub pod_image: Option<String>,
    pub notes: Option<String>,
    pub recipient_name: Option<String>,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Dispatch {
    /// A freshly created dispatch: pending, unowned, description defaulted
    /// when blank. The id is assigned by the database on insert.
    pub fn new(area: String, description: Option<String>) -> Self {
        let now = Utc::now();
        let description = match description {
            Some(d) if !d.trim().is_empty() => d,
            _ => DEFAULT_DESCRIPTION.to_string(),
        };

        Self {
            id: 0,
            area,
            description,
            date: now,
            status: DispatchStatus::Pending,
            start_time: None,
            complete_time: None,
            pod_image: None,
            notes: None,
            recipient_name: None,
            owner_id: None,
            created_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == Some(user_id)
    }

    /// Assigns ownership and moves pending -> accepted. Ownership is set
    /// exactly once; a dispatch that already left pending cannot be
    /// re-accepted.
    pub fn accept(&mut self, owner_id: i64) -> DispatchResult<()> {
        if self.status != DispatchStatus::Pending {
            return Err(DispatchError::invalid_transition(self.status, "accept"));
        }
        self.owner_id = Some(owner_id);
        self.status = DispatchStatus::Accepted;
        Ok(())
    }

    /// Moves accepted -> started and stamps the start time.
    pub fn start(&mut self) -> DispatchResult<()> {
        if self.status != DispatchStatus::Accepted {
            return Err(DispatchError::invalid_transition(self.status, "start"));
        }
        self.status = DispatchStatus::Started;
        self.start_time = Some(Utc::now());
        Ok(())
    }

    /// Moves started -> completed, stamps the completion time and stores all
    /// three proof-of-delivery fields atomically. Omitted fields become
    /// empty strings, never nulls.
    pub fn complete(&mut self, pod: PodDetails) -> DispatchResult<()> {
        if self.status != DispatchStatus::Started {
            return Err(DispatchError::invalid_transition(self.status, "complete"));
        }
        self.status = DispatchStatus::Completed;
        self.complete_time = Some(Utc::now());
        self.pod_image = Some(pod.pod_image.unwrap_or_default());
        self.notes = Some(pod.notes.unwrap_or_default());
        self.recipient_name = Some(pod.recipient_name.unwrap_or_default());
        Ok(())
    }
}

/// Conjunctive equality filter over the dispatch collection. Absent
/// predicates impose no constraint.
#[derive(Debug, Clone, Default)]
pub struct DispatchFilter {
    pub status: Option<DispatchStatus>,
    pub date: Option<DateTime<Utc>>,
    pub area: Option<String>,
    pub owner_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod(image: Option<&str>, notes: Option<&str>, recipient: Option<&str>) -> PodDetails {
        PodDetails {
            pod_image: image.map(String::from),
            notes: notes.map(String::from),
            recipient_name: recipient.map(String::from),
        }
    }

    #[test]
    fn new_dispatch_is_pending_and_unowned() {
        let dispatch = Dispatch::new("north".to_string(), None);

        assert_eq!(dispatch.status, DispatchStatus::Pending);
        assert_eq!(dispatch.owner_id, None);
        assert_eq!(dispatch.description, DEFAULT_DESCRIPTION);
        assert!(dispatch.start_time.is_none());
        assert!(dispatch.complete_time.is_none());
        assert!(dispatch.pod_image.is_none());
    }

    #[test]
    fn blank_description_falls_back_to_default() {
        let dispatch = Dispatch::new("north".to_string(), Some("   ".to_string()));
        assert_eq!(dispatch.description, DEFAULT_DESCRIPTION);

        let dispatch = Dispatch::new("north".to_string(), Some("fragile".to_string()));
        assert_eq!(dispatch.description, "fragile");
    }

    #[test]
    fn accept_assigns_owner_once() {
        let mut dispatch = Dispatch::new("north".to_string(), None);

        dispatch.accept(7).unwrap();
        assert_eq!(dispatch.status, DispatchStatus::Accepted);
        assert_eq!(dispatch.owner_id, Some(7));

        let err = dispatch.accept(8).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidTransition {
                from: DispatchStatus::Accepted,
                action: "accept"
            }
        ));
        assert_eq!(dispatch.owner_id, Some(7));
    }

    #[test]
    fn start_requires_accepted() {
        let mut dispatch = Dispatch::new("north".to_string(), None);
        assert!(dispatch.start().is_err());
        assert!(dispatch.start_time.is_none());

        dispatch.accept(7).unwrap();
        dispatch.start().unwrap();
        assert_eq!(dispatch.status, DispatchStatus::Started);
        assert!(dispatch.start_time.is_some());

        // no backward or repeated transition
        assert!(dispatch.start().is_err());
    }

    #[test]
    fn complete_requires_started_and_sets_all_pod_fields() {
        let mut dispatch = Dispatch::new("north".to_string(), None);
        dispatch.accept(7).unwrap();

        // skipping started is rejected
        assert!(dispatch.complete(pod(Some("img"), None, None)).is_err());
        assert!(dispatch.complete_time.is_none());

        dispatch.start().unwrap();
        dispatch
            .complete(pod(Some("img1"), Some(""), Some("Jane")))
            .unwrap();

        assert_eq!(dispatch.status, DispatchStatus::Completed);
        assert!(dispatch.complete_time.is_some());
        assert_eq!(dispatch.pod_image.as_deref(), Some("img1"));
        assert_eq!(dispatch.notes.as_deref(), Some(""));
        assert_eq!(dispatch.recipient_name.as_deref(), Some("Jane"));
    }

    #[test]
    fn complete_stores_omitted_fields_as_empty_strings() {
        let mut dispatch = Dispatch::new("north".to_string(), None);
        dispatch.accept(7).unwrap();
        dispatch.start().unwrap();
        dispatch.complete(pod(Some("img1"), None, None)).unwrap();

        assert_eq!(dispatch.pod_image.as_deref(), Some("img1"));
        assert_eq!(dispatch.notes.as_deref(), Some(""));
        assert_eq!(dispatch.recipient_name.as_deref(), Some(""));
    }

    #[test]
    fn start_time_tracks_status() {
        let mut dispatch = Dispatch::new("north".to_string(), None);
        assert!(dispatch.start_time.is_none());
        dispatch.accept(1).unwrap();
        assert!(dispatch.start_time.is_none());
        dispatch.start().unwrap();
        assert!(dispatch.start_time.is_some());
        dispatch.complete(PodDetails {
            pod_image: Some("x".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(dispatch.start_time.is_some());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            DispatchStatus::Pending,
            DispatchStatus::Accepted,
            DispatchStatus::Started,
            DispatchStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<DispatchStatus>().unwrap(), status);
        }
        assert!("in_flight".parse::<DispatchStatus>().is_err());
    }
}
