pub mod assets;
pub mod catalog;
pub mod reviews;
pub mod sites;
pub mod subjects;
pub mod traits;
pub mod trials;

pub use assets::PostgresAssetStore;
pub use catalog::PostgresCatalogStore;
pub use reviews::PostgresReviewStore;
pub use sites::PostgresSiteStore;
pub use subjects::PostgresSubjectStore;
pub use traits::{
    AssetStore, CatalogStore, ReviewStore, SiteStore, StorageError, StorageResult, SubjectStore,
    TrialStore,
};
pub use trials::PostgresTrialStore;
