use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::geo::GeoError;
use crate::storage::StorageError;
use trialvault_core::envelope::ErrorEnvelope;
use trialvault_core::CoreError;

/// API-level error carrying the HTTP status and the machine-readable code
/// emitted in the error envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_INPUT",
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "NOT_FOUND",
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope::new(self.message, self.code);
        (self.status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TrialNotFound(_)
            | StorageError::TrialCodeNotFound(_)
            | StorageError::SiteNotFound(_)
            | StorageError::SubjectNotFound(_)
            | StorageError::EventNotFound(_)
            | StorageError::ProcedureNotFound(_)
            | StorageError::AssetNotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                code: "NOT_FOUND",
                message: err.to_string(),
            },
            StorageError::DuplicateProtocolCode(_)
            | StorageError::DuplicateSiteNumber(_)
            | StorageError::DuplicateScreeningNumber(_) => Self {
                status: StatusCode::CONFLICT,
                code: "DUPLICATE",
                message: err.to_string(),
            },
            StorageError::Database(_) | StorageError::Serialization(_) | StorageError::Internal(_) => {
                error!("Storage error: {}", err);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "STORAGE_ERROR",
                    message: "Internal storage error".to_string(),
                }
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownFormat(_)
            | CoreError::UnknownGroupKey(_)
            | CoreError::UnknownSortField(_)
            | CoreError::InvalidBucketWidth(_) => Self::bad_request(err.to_string()),
            CoreError::Csv(_)
            | CoreError::Template(_)
            | CoreError::Serialization(_)
            | CoreError::ExportFailed(_) => {
                error!("Export error: {}", err);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "EXPORT_ERROR",
                    message: "Export failed".to_string(),
                }
            }
        }
    }
}

impl From<GeoError> for ApiError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::Disabled => Self {
                status: StatusCode::NOT_FOUND,
                code: "GEOCODING_DISABLED",
                message: "Geocoding is disabled on this server".to_string(),
            },
            GeoError::Http(_) | GeoError::ClientBuild(_) => {
                error!("Geocoding error: {}", err);
                Self {
                    status: StatusCode::BAD_GATEWAY,
                    code: "GEOCODE_FAILED",
                    message: "Geocoding lookup failed".to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_not_found_mapping() {
        let err: ApiError = StorageError::TrialNotFound(Uuid::new_v4()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "NOT_FOUND");
    }

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let err: ApiError = StorageError::DuplicateProtocolCode("ONC-301".to_string()).into();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_database_errors_do_not_leak_details() {
        let err: ApiError = StorageError::Internal("connection refused at 10.0.0.5".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("10.0.0.5"));
    }

    #[test]
    fn test_core_validation_errors_are_bad_requests() {
        let err: ApiError = CoreError::UnknownGroupKey("bogus".to_string()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_INPUT");
    }
}
