pub mod ingestion_event;

pub use ingestion_event::IngestionEvent;

use signet_sdk::objects::SourceType;

/// Source type for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `signet_sdk::objects::SourceType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE", type_name = "source_type")]
pub enum SourceTypeName {
    Vc,
    Oidc,
    Manual,
}

impl From<SourceTypeName> for SourceType {
    fn from(value: SourceTypeName) -> Self {
        match value {
            SourceTypeName::Vc => SourceType::VerifiableCredential,
            SourceTypeName::Oidc => SourceType::Oidc,
            SourceTypeName::Manual => SourceType::Manual,
        }
    }
}

impl From<SourceType> for SourceTypeName {
    fn from(value: SourceType) -> Self {
        match value {
            SourceType::VerifiableCredential => SourceTypeName::Vc,
            SourceType::Oidc => SourceTypeName::Oidc,
            SourceType::Manual => SourceTypeName::Manual,
        }
    }
}
