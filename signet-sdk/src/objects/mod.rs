pub mod error;
pub mod events;
pub mod ingest;
pub mod notification;
pub mod source_type;

pub use error::{ErrorCode, ErrorResponse};
pub use events::{EventResponse, ListEventsResponse};
pub use ingest::{IngestRequest, IngestResponse, IngestStatus};
pub use notification::QueueMessage;
pub use source_type::{SourceType, UnknownSourceType};

/// Header carrying the authenticated caller identity (a UUID).
pub const USER_ID_HEADER: &str = "X-User-Id";
