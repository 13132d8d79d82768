//! Admin-panel wizard for listing a new tour.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::messages;
use crate::application::lock;
use crate::application::records::TourCatalog;
use crate::application::session_store::SessionStore;
use crate::application::wizard::{FlowError, StepEffect, StepFlow, Wizard};
use crate::domain::foundation::{AuthError, StateMachine, ValidationError};
use crate::domain::media::{FileUpload, MediaKind};
use crate::domain::pricing::Amount;
use crate::domain::tour::{TourDraft, TourStatus};
use crate::domain::wizard::{is_reachable_step, reachable_steps, FormFields, TransientNotice, WizardStep};

pub const TITLE_FIELD: &str = "title";
pub const LOCATION_FIELD: &str = "location";
pub const DESCRIPTION_FIELD: &str = "description";
pub const DURATION_FIELD: &str = "duration_days";
pub const PRICE_FIELD: &str = "price";
pub const ORIGINAL_PRICE_FIELD: &str = "original_price";
pub const GROUP_SIZE_FIELD: &str = "max_group_size";
/// Checkbox: keep the listing unpublished.
pub const SAVE_AS_DRAFT_FIELD: &str = "save_as_draft";
pub const TOUR_ID_FIELD: &str = "tour_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TourCreationStep {
    BasicInfo,
    PricingAndCapacity,
    Media,
    Published,
}

impl StateMachine for TourCreationStep {
    fn can_transition_to(&self, target: &Self) -> bool {
        is_reachable_step(self, target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        reachable_steps(self)
    }
}

impl WizardStep for TourCreationStep {
    const ORDER: &'static [Self] = &[
        TourCreationStep::BasicInfo,
        TourCreationStep::PricingAndCapacity,
        TourCreationStep::Media,
        TourCreationStep::Published,
    ];

    fn name(&self) -> &'static str {
        match self {
            TourCreationStep::BasicInfo => "basic_info",
            TourCreationStep::PricingAndCapacity => "pricing_and_capacity",
            TourCreationStep::Media => "media",
            TourCreationStep::Published => "published",
        }
    }
}

/// Tour creation with staged media.
///
/// Files are checked when staged and uploaded only by the final action.
pub struct TourCreationFlow {
    store: Arc<SessionStore>,
    catalog: Arc<TourCatalog>,
    staged: Mutex<Vec<FileUpload>>,
}

impl TourCreationFlow {
    pub fn new(store: Arc<SessionStore>, catalog: Arc<TourCatalog>) -> Self {
        Self {
            store,
            catalog,
            staged: Mutex::new(Vec::new()),
        }
    }

    fn has_staged_image(&self) -> bool {
        lock(&self.staged)
            .iter()
            .any(|file| MediaKind::from_content_type(&file.content_type) == Some(MediaKind::Image))
    }
}

#[async_trait]
impl StepFlow for TourCreationFlow {
    type Step = TourCreationStep;
    const NAME: &'static str = "tour_creation";

    fn validate(&self, step: TourCreationStep, fields: &FormFields) -> Vec<String> {
        match step {
            TourCreationStep::BasicInfo => messages(tour_draft(fields).validate_basics()),
            TourCreationStep::PricingAndCapacity => {
                let mut errors = Vec::new();
                if !fields.is_blank(ORIGINAL_PRICE_FIELD)
                    && fields.parse::<u64>(ORIGINAL_PRICE_FIELD).is_none()
                {
                    errors.push("Original price must be a whole amount".to_string());
                }
                errors.extend(messages(tour_draft(fields).validate_pricing()));
                errors
            }
            TourCreationStep::Media if !self.has_staged_image() => {
                vec!["Add at least one image".to_string()]
            }
            TourCreationStep::Media | TourCreationStep::Published => Vec::new(),
        }
    }

    fn has_action(&self, step: TourCreationStep) -> bool {
        step == TourCreationStep::Media
    }

    async fn run_action(
        &self,
        _step: TourCreationStep,
        fields: FormFields,
    ) -> Result<StepEffect<TourCreationStep>, FlowError> {
        let identity = self
            .store
            .current_identity()
            .ok_or(FlowError::Auth(AuthError::NotAuthenticated))?;
        let status = if fields.flag(SAVE_AS_DRAFT_FIELD) {
            TourStatus::Draft
        } else {
            TourStatus::Published
        };
        let media = lock(&self.staged).clone();

        let tour = self
            .catalog
            .create(&identity, tour_draft(&fields), &media, status)
            .await?;
        lock(&self.staged).clear();

        let notice = match status {
            TourStatus::Published => "Tour published",
            _ => "Tour saved as draft",
        };
        Ok(StepEffect::advance()
            .with_field(TOUR_ID_FIELD, tour.id.to_string())
            .with_notice(TransientNotice::success(notice)))
    }

    fn allows_back(&self, step: TourCreationStep) -> bool {
        step != TourCreationStep::Published
    }
}

impl Wizard<TourCreationFlow> {
    /// Checks `file` and adds it to the upload batch.
    pub fn stage_file(&self, file: FileUpload) -> Result<MediaKind, ValidationError> {
        let kind = file.validate(self.flow().catalog.limits())?;
        lock(&self.flow().staged).push(file);
        Ok(kind)
    }

    pub fn staged_files(&self) -> Vec<FileUpload> {
        lock(&self.flow().staged).clone()
    }

    pub fn remove_staged(&self, index: usize) -> Option<FileUpload> {
        let mut staged = lock(&self.flow().staged);
        (index < staged.len()).then(|| staged.remove(index))
    }

    /// Current errors as one blocking summary, `None` when there are none.
    pub fn validation_summary(&self) -> Option<String> {
        let errors = self.errors();
        if errors.is_empty() {
            return None;
        }
        let mut summary = String::from("Please fix the following:");
        for error in errors {
            summary.push_str("\n- ");
            summary.push_str(&error);
        }
        Some(summary)
    }
}

fn tour_draft(fields: &FormFields) -> TourDraft {
    TourDraft {
        title: fields.trimmed(TITLE_FIELD).to_string(),
        location: fields.trimmed(LOCATION_FIELD).to_string(),
        description: fields.trimmed(DESCRIPTION_FIELD).to_string(),
        duration_days: fields.parse(DURATION_FIELD).unwrap_or(0),
        price: fields.parse(PRICE_FIELD).map(Amount::new).unwrap_or(Amount::ZERO),
        original_price: fields.parse(ORIGINAL_PRICE_FIELD).map(Amount::new),
        max_group_size: fields.parse(GROUP_SIZE_FIELD).unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tour_draft_reads_numeric_fields() {
        let fields = FormFields::new()
            .with(TITLE_FIELD, " Glacier Walk ")
            .with(DURATION_FIELD, "2")
            .with(PRICE_FIELD, "25000")
            .with(GROUP_SIZE_FIELD, "abc");
        let draft = tour_draft(&fields);
        assert_eq!(draft.title, "Glacier Walk");
        assert_eq!(draft.duration_days, 2);
        assert_eq!(draft.price, Amount::new(25_000));
        assert_eq!(draft.original_price, None);
        assert_eq!(draft.max_group_size, 0);
    }
}
