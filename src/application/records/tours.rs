//! TourCatalog - tour listings and their media.

use std::sync::Arc;

use tracing::{debug, info};

use super::{decode, decode_all, encode, record_error, storage_error, validation_failure, TOURS};
use crate::domain::foundation::{DomainError, ErrorCode, Identity, Role, TourId};
use crate::domain::media::{FileUpload, MediaKind, UploadLimits};
use crate::domain::tour::{Tour, TourDraft, TourStatus};
use crate::ports::{FileStorage, RecordFilter, RecordStore, SortOrder};

/// Reads and writes the `tours` collection.
pub struct TourCatalog {
    records: Arc<dyn RecordStore>,
    storage: Arc<dyn FileStorage>,
    limits: UploadLimits,
}

impl TourCatalog {
    pub fn new(
        records: Arc<dyn RecordStore>,
        storage: Arc<dyn FileStorage>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            records,
            storage,
            limits,
        }
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Published listings, newest first.
    pub async fn list_published(&self) -> Result<Vec<Tour>, DomainError> {
        let filter = RecordFilter::all()
            .eq("status", TourStatus::Published.as_str())
            .order_by("created_at", SortOrder::Descending);
        let rows = self
            .records
            .query(TOURS, &filter)
            .await
            .map_err(|err| record_error(TOURS, ErrorCode::TourNotFound, err))?;
        decode_all(TOURS, rows)
    }

    /// Listings `identity` may manage: everything for admins, own tours for hosts.
    pub async fn list_managed(&self, identity: &Identity) -> Result<Vec<Tour>, DomainError> {
        if !identity.role.can_manage_tours() {
            return Err(forbidden());
        }
        let mut filter = RecordFilter::all().order_by("created_at", SortOrder::Descending);
        if identity.role != Role::Admin {
            filter = filter.eq("host_id", identity.id.as_str());
        }
        let rows = self
            .records
            .query(TOURS, &filter)
            .await
            .map_err(|err| record_error(TOURS, ErrorCode::TourNotFound, err))?;
        decode_all(TOURS, rows)
    }

    pub async fn get(&self, id: &TourId) -> Result<Tour, DomainError> {
        let filter = RecordFilter::all().eq("id", id.to_string()).limit(1);
        let row = self
            .records
            .query(TOURS, &filter)
            .await
            .map_err(|err| record_error(TOURS, ErrorCode::TourNotFound, err))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                DomainError::new(ErrorCode::TourNotFound, "Tour not found")
                    .with_detail("id", id.to_string())
            })?;
        decode(TOURS, row)
    }

    /// Creates a listing, uploading `media` first.
    ///
    /// Every file is checked before the first upload, so a bad file leaves
    /// storage untouched.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the identity is a host or admin
    /// - `VerificationRequired` if the identity's email is unconfirmed
    /// - `ValidationFailed` for an invalid draft
    /// - `InvalidFormat` naming the `file` field for an unsupported or oversize upload
    pub async fn create(
        &self,
        identity: &Identity,
        draft: TourDraft,
        media: &[FileUpload],
        status: TourStatus,
    ) -> Result<Tour, DomainError> {
        authorize_write(identity)?;
        let errors = draft.validate();
        if !errors.is_empty() {
            return Err(validation_failure(&errors));
        }
        let kinds = media
            .iter()
            .map(|file| file.validate(&self.limits))
            .collect::<Result<Vec<_>, _>>()
            .map_err(DomainError::from)?;

        let id = TourId::new();
        let mut images = Vec::new();
        let mut videos = Vec::new();
        for (file, kind) in media.iter().zip(kinds) {
            let path = file.storage_path(&id, kind);
            let stored = self
                .storage
                .upload(&path, file)
                .await
                .map_err(|err| storage_error(&path, err))?;
            debug!(tour_id = %id, path = %stored.path, "media uploaded");
            match kind {
                MediaKind::Image => images.push(stored.public_url),
                MediaKind::Video => videos.push(stored.public_url),
            }
        }

        let tour = Tour::from_draft(id, identity.id.clone(), draft, images, videos, status);
        let row = self
            .records
            .insert(TOURS, encode(TOURS, &tour)?)
            .await
            .map_err(|err| record_error(TOURS, ErrorCode::TourNotFound, err))?;
        info!(tour_id = %tour.id, status = status.as_str(), "tour created");
        decode(TOURS, row)
    }

    /// Replaces the editable fields of a listing.
    pub async fn update(
        &self,
        identity: &Identity,
        id: &TourId,
        draft: TourDraft,
    ) -> Result<Tour, DomainError> {
        authorize_write(identity)?;
        let errors = draft.validate();
        if !errors.is_empty() {
            return Err(validation_failure(&errors));
        }
        let mut tour = self.managed(identity, id).await?;
        tour.apply(draft);
        self.save(&tour).await
    }

    /// Publishes, archives, or re-publishes a listing.
    pub async fn set_status(
        &self,
        identity: &Identity,
        id: &TourId,
        status: TourStatus,
    ) -> Result<Tour, DomainError> {
        authorize_write(identity)?;
        let mut tour = self.managed(identity, id).await?;
        tour.set_status(status)?;
        let saved = self.save(&tour).await?;
        info!(tour_id = %id, status = status.as_str(), "tour status changed");
        Ok(saved)
    }

    pub async fn delete(&self, identity: &Identity, id: &TourId) -> Result<(), DomainError> {
        authorize_write(identity)?;
        self.managed(identity, id).await?;
        self.records
            .delete(TOURS, &id.to_string())
            .await
            .map_err(|err| record_error(TOURS, ErrorCode::TourNotFound, err))?;
        info!(tour_id = %id, "tour deleted");
        Ok(())
    }

    async fn managed(&self, identity: &Identity, id: &TourId) -> Result<Tour, DomainError> {
        let tour = self.get(id).await?;
        if !tour.can_be_managed_by(identity) {
            return Err(forbidden().with_detail("tour_id", id.to_string()));
        }
        Ok(tour)
    }

    async fn save(&self, tour: &Tour) -> Result<Tour, DomainError> {
        let mut patch = encode(TOURS, tour)?;
        if let Some(fields) = patch.as_object_mut() {
            fields.remove("id");
            fields.remove("created_at");
        }
        let row = self
            .records
            .update(TOURS, &tour.id.to_string(), patch)
            .await
            .map_err(|err| record_error(TOURS, ErrorCode::TourNotFound, err))?;
        decode(TOURS, row)
    }
}

fn forbidden() -> DomainError {
    DomainError::new(ErrorCode::Forbidden, "Only hosts and admins can manage tours")
}

fn authorize_write(identity: &Identity) -> Result<(), DomainError> {
    if !identity.role.can_manage_tours() {
        return Err(forbidden());
    }
    if !identity.email_verified {
        return Err(DomainError::new(
            ErrorCode::VerificationRequired,
            "Verify your email address before managing tours",
        )
        .with_detail("user_id", identity.id.as_str()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryCollaborator;
    use crate::domain::foundation::UserId;
    use crate::domain::pricing::Amount;

    fn catalog(collaborator: &InMemoryCollaborator) -> TourCatalog {
        TourCatalog::new(
            Arc::new(collaborator.clone()),
            Arc::new(collaborator.clone()),
            UploadLimits::default(),
        )
    }

    fn identity(id: &str, role: Role, verified: bool) -> Identity {
        Identity::new(UserId::new(id).unwrap(), format!("{}@example.com", id), None, role, verified)
    }

    fn draft() -> TourDraft {
        TourDraft {
            title: "Glacier Walk".to_string(),
            location: "Iceland".to_string(),
            description: "A day on the ice".to_string(),
            duration_days: 2,
            price: Amount::new(25_000),
            original_price: Some(Amount::new(30_000)),
            max_group_size: 8,
        }
    }

    fn photo() -> FileUpload {
        FileUpload::new("glacier.jpg", "image/jpeg", vec![0; 1024])
    }

    #[tokio::test]
    async fn create_uploads_media_then_inserts() {
        let collaborator = InMemoryCollaborator::new();
        let catalog = catalog(&collaborator);
        let host = identity("host-1", Role::Host, true);

        let tour = catalog
            .create(&host, draft(), &[photo()], TourStatus::Published)
            .await
            .unwrap();

        assert_eq!(tour.images.len(), 1);
        assert!(tour.images[0].starts_with("https://storage.local/tours/"));
        assert_eq!(collaborator.stored_objects().len(), 1);
        assert_eq!(catalog.get(&tour.id).await.unwrap(), tour);
        assert_eq!(catalog.list_published().await.unwrap(), vec![tour]);
    }

    #[tokio::test]
    async fn bad_file_rejected_before_any_upload() {
        let collaborator = InMemoryCollaborator::new();
        let catalog = catalog(&collaborator);
        let host = identity("host-1", Role::Host, true);
        let pdf = FileUpload::new("brochure.pdf", "application/pdf", vec![1]);

        let err = catalog
            .create(&host, draft(), &[photo(), pdf], TourStatus::Draft)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
        assert_eq!(err.details.get("field").map(String::as_str), Some("file"));
        assert!(err.message.contains("brochure.pdf"));
        assert!(collaborator.stored_objects().is_empty());
    }

    #[tokio::test]
    async fn oversize_video_names_the_file_field() {
        let collaborator = InMemoryCollaborator::new();
        let catalog = TourCatalog::new(
            Arc::new(collaborator.clone()),
            Arc::new(collaborator.clone()),
            UploadLimits { max_image_bytes: 1024, max_video_bytes: 2048 },
        );
        let host = identity("host-1", Role::Host, true);
        let clip = FileUpload::new("summit.mp4", "video/mp4", vec![0; 4096]);

        let err = catalog
            .create(&host, draft(), &[clip], TourStatus::Draft)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
        assert!(err.message.contains("too large"));
        assert!(collaborator.stored_objects().is_empty());
    }

    #[tokio::test]
    async fn writes_require_role_and_verified_email() {
        let collaborator = InMemoryCollaborator::new();
        let catalog = catalog(&collaborator);

        let guest = identity("guest", Role::Guest, true);
        let err = catalog.create(&guest, draft(), &[], TourStatus::Draft).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let unverified = identity("host-1", Role::Host, false);
        let err = catalog.create(&unverified, draft(), &[], TourStatus::Draft).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::VerificationRequired);
    }

    #[tokio::test]
    async fn only_owner_or_admin_manage_existing_tours() {
        let collaborator = InMemoryCollaborator::new();
        let catalog = catalog(&collaborator);
        let owner = identity("host-1", Role::Host, true);
        let tour = catalog.create(&owner, draft(), &[], TourStatus::Draft).await.unwrap();

        let other = identity("host-2", Role::Host, true);
        let err = catalog.set_status(&other, &tour.id, TourStatus::Published).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert!(catalog.list_managed(&other).await.unwrap().is_empty());

        let admin = identity("admin", Role::Admin, true);
        let published = catalog.set_status(&admin, &tour.id, TourStatus::Published).await.unwrap();
        assert!(published.is_published());

        let mut edited = draft();
        edited.title = "Glacier Hike".to_string();
        let updated = catalog.update(&owner, &tour.id, edited).await.unwrap();
        assert_eq!(updated.title, "Glacier Hike");

        catalog.delete(&owner, &tour.id).await.unwrap();
        let err = catalog.get(&tour.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TourNotFound);
    }

    #[tokio::test]
    async fn invalid_status_transition_is_reported() {
        let collaborator = InMemoryCollaborator::new();
        let catalog = catalog(&collaborator);
        let host = identity("host-1", Role::Host, true);
        let tour = catalog.create(&host, draft(), &[], TourStatus::Archived).await.unwrap();

        let err = catalog.set_status(&host, &tour.id, TourStatus::Draft).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }
}
