//! Stored tour listing.

use serde::{Deserialize, Serialize};

use super::TourDraft;
use crate::domain::booking::TourSummary;
use crate::domain::foundation::{
    DomainError, ErrorCode, Identity, Role, StateMachine, Timestamp, TourId, UserId,
};
use crate::domain::pricing::Amount;

/// Publication state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TourStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl TourStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TourStatus::Draft => "draft",
            TourStatus::Published => "published",
            TourStatus::Archived => "archived",
        }
    }
}

impl StateMachine for TourStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use TourStatus::*;
        matches!(
            (self, target),
            (Draft, Published) | (Draft, Archived) | (Published, Archived) | (Archived, Published)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use TourStatus::*;
        match self {
            Draft => vec![Published, Archived],
            Published => vec![Archived],
            Archived => vec![Published],
        }
    }
}

/// A tour listing as persisted in the `tours` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour {
    pub id: TourId,
    pub host_id: UserId,
    pub title: String,
    pub location: String,
    pub description: String,
    pub duration_days: u32,
    pub price: Amount,
    #[serde(default)]
    pub original_price: Option<Amount>,
    pub max_group_size: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    pub status: TourStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Tour {
    /// Creates a listing owned by `host_id` from a validated draft.
    pub fn from_draft(
        id: TourId,
        host_id: UserId,
        draft: TourDraft,
        images: Vec<String>,
        videos: Vec<String>,
        status: TourStatus,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            host_id,
            title: draft.title.trim().to_string(),
            location: draft.location.trim().to_string(),
            description: draft.description.trim().to_string(),
            duration_days: draft.duration_days,
            price: draft.price,
            original_price: draft.original_price,
            max_group_size: draft.max_group_size,
            images,
            videos,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == TourStatus::Published
    }

    /// Replaces the editable fields with those of `draft`.
    pub fn apply(&mut self, draft: TourDraft) {
        self.title = draft.title.trim().to_string();
        self.location = draft.location.trim().to_string();
        self.description = draft.description.trim().to_string();
        self.duration_days = draft.duration_days;
        self.price = draft.price;
        self.original_price = draft.original_price;
        self.max_group_size = draft.max_group_size;
        self.updated_at = Timestamp::now();
    }

    /// Moves the listing to `status`.
    pub fn set_status(&mut self, status: TourStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(status).map_err(|err| {
            DomainError::new(ErrorCode::InvalidStateTransition, err.to_string())
                .with_detail("tour_id", self.id.to_string())
        })?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Admins manage every listing; hosts manage their own.
    pub fn can_be_managed_by(&self, identity: &Identity) -> bool {
        match identity.role {
            Role::Admin => true,
            Role::Host => identity.id == self.host_id,
            Role::Guest => false,
        }
    }

    /// The handoff the booking flow is mounted with.
    pub fn summary(&self) -> TourSummary {
        TourSummary {
            id: self.id,
            title: self.title.clone(),
            location: self.location.clone(),
            price: self.price,
            original_price: self.original_price,
            max_group_size: self.max_group_size,
            duration_days: self.duration_days,
            image_url: self.images.first().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(id: &str, role: Role) -> Identity {
        Identity::new(UserId::new(id).unwrap(), "host@example.com", None, role, true)
    }

    fn tour() -> Tour {
        let draft = TourDraft {
            title: "  Glacier Walk ".to_string(),
            location: "Reykjavik".to_string(),
            description: "Ice".to_string(),
            duration_days: 1,
            price: Amount::new(25_000),
            original_price: None,
            max_group_size: 8,
        };
        Tour::from_draft(
            TourId::new(),
            UserId::new("host-1").unwrap(),
            draft,
            vec!["https://cdn.example.com/a.jpg".to_string()],
            vec![],
            TourStatus::Published,
        )
    }

    #[test]
    fn from_draft_trims_text() {
        assert_eq!(tour().title, "Glacier Walk");
    }

    #[test]
    fn owner_host_and_admin_can_manage() {
        let t = tour();
        assert!(t.can_be_managed_by(&host("host-1", Role::Host)));
        assert!(!t.can_be_managed_by(&host("host-2", Role::Host)));
        assert!(t.can_be_managed_by(&host("admin", Role::Admin)));
        assert!(!t.can_be_managed_by(&host("host-1", Role::Guest)));
    }

    #[test]
    fn status_transitions_are_checked() {
        let mut t = tour();
        t.set_status(TourStatus::Archived).unwrap();
        let err = t.set_status(TourStatus::Draft).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn summary_uses_first_image() {
        let summary = tour().summary();
        assert_eq!(summary.image_url.as_deref(), Some("https://cdn.example.com/a.jpg"));
        assert_eq!(summary.max_group_size, 8);
    }
}
