use async_trait::async_trait;
use uuid::Uuid;

use trialvault_core::filter::{AssetFilter, Sort};
use trialvault_core::model::{
    Asset, AssetModality, AssetRecord, NewAsset, NewProcedure, NewReview, NewSite, NewStudyEvent,
    NewSubject, NewTrial, Procedure, Review, ReviewStatus, Site, StudyEvent, Subject,
    SubjectStatus, Trial, TrialStatus,
};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Trial not found: {0}")]
    TrialNotFound(Uuid),

    #[error("Trial not found: {0}")]
    TrialCodeNotFound(String),

    #[error("Site not found: {0}")]
    SiteNotFound(Uuid),

    #[error("Subject not found: {0}")]
    SubjectNotFound(Uuid),

    #[error("Study event not found: {0}")]
    EventNotFound(Uuid),

    #[error("Procedure not found: {0}")]
    ProcedureNotFound(Uuid),

    #[error("Asset not found: {0}")]
    AssetNotFound(Uuid),

    #[error("Protocol code already exists: {0}")]
    DuplicateProtocolCode(String),

    #[error("Site number already exists in this trial: {0}")]
    DuplicateSiteNumber(String),

    #[error("Screening number already exists at this site: {0}")]
    DuplicateScreeningNumber(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Storage backend for trials
#[async_trait]
pub trait TrialStore: Send + Sync {
    /// Register a new trial
    async fn create_trial(&self, new: &NewTrial) -> StorageResult<Trial>;

    /// Get trial by ID
    async fn get_trial(&self, id: Uuid) -> StorageResult<Trial>;

    /// Get trial by protocol code
    async fn get_trial_by_code(&self, protocol_code: &str) -> StorageResult<Trial>;

    /// List trials, optionally filtered by status, newest first
    async fn list_trials(
        &self,
        status: Option<TrialStatus>,
        limit: i64,
        offset: i64,
    ) -> StorageResult<(Vec<Trial>, u64)>;
}

/// Storage backend for sites
#[async_trait]
pub trait SiteStore: Send + Sync {
    async fn create_site(&self, new: &NewSite) -> StorageResult<Site>;

    async fn get_site(&self, id: Uuid) -> StorageResult<Site>;

    /// List sites filtered by trial and/or country
    async fn list_sites(
        &self,
        trial_id: Option<Uuid>,
        country: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> StorageResult<(Vec<Site>, u64)>;
}

/// Storage backend for subjects
#[async_trait]
pub trait SubjectStore: Send + Sync {
    async fn create_subject(&self, new: &NewSubject) -> StorageResult<Subject>;

    async fn get_subject(&self, id: Uuid) -> StorageResult<Subject>;

    async fn list_subjects(
        &self,
        site_id: Option<Uuid>,
        study_arm: Option<&str>,
        status: Option<SubjectStatus>,
        limit: i64,
        offset: i64,
    ) -> StorageResult<(Vec<Subject>, u64)>;
}

/// Storage backend for the per-trial catalog of study events and procedures
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_event(&self, new: &NewStudyEvent) -> StorageResult<StudyEvent>;

    async fn get_event(&self, id: Uuid) -> StorageResult<StudyEvent>;

    /// Events for a trial in calendar order
    async fn list_events(&self, trial_id: Option<Uuid>) -> StorageResult<Vec<StudyEvent>>;

    async fn create_procedure(&self, new: &NewProcedure) -> StorageResult<Procedure>;

    async fn get_procedure(&self, id: Uuid) -> StorageResult<Procedure>;

    async fn list_procedures(
        &self,
        trial_id: Option<Uuid>,
        modality: Option<AssetModality>,
    ) -> StorageResult<Vec<Procedure>>;
}

/// Storage backend for assets and the denormalized record projection
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Register uploaded asset metadata
    async fn create_asset(&self, new: &NewAsset) -> StorageResult<Asset>;

    /// Get the denormalized record for one asset
    async fn get_record(&self, id: Uuid) -> StorageResult<AssetRecord>;

    /// List denormalized records for a filter, with the total count the
    /// filter matches (for pagination metadata)
    async fn list_records(
        &self,
        filter: &AssetFilter,
        sort: Sort,
        limit: i64,
        offset: i64,
    ) -> StorageResult<(Vec<AssetRecord>, u64)>;
}

/// Storage backend for reviews
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Record a review verdict for an asset
    async fn create_review(&self, asset_id: Uuid, new: &NewReview) -> StorageResult<Review>;

    /// Full review history of an asset, newest first
    async fn list_for_asset(&self, asset_id: Uuid) -> StorageResult<Vec<Review>>;

    /// List reviews across assets, optionally filtered by status/reviewer
    async fn list_reviews(
        &self,
        status: Option<ReviewStatus>,
        reviewer: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> StorageResult<(Vec<Review>, u64)>;
}
