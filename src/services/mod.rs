//! Service layer for business logic
//!
//! HTTP handlers and the CLI share these services; each one holds an
//! `Arc<SeaOrmStorage>` and keeps validation out of the storage layer.

mod analytics_service;
mod archive;
mod auth_service;
pub mod bulk_upload;
mod deal_service;
pub mod import_validation;
mod media_store;
pub mod profile_service;
mod social_service;

pub use analytics_service::*;
pub use archive::ArchiveTask;
pub use auth_service::*;
pub use bulk_upload::{BulkUploadReport, BulkUploadService};
pub use deal_service::*;
pub use import_validation::{DealField, DealFieldError, DealFieldsRaw, DealRowError};
pub use media_store::*;
pub use profile_service::{ProfileService, PublicProfile, UpdateProfileRequest};
pub use social_service::*;
