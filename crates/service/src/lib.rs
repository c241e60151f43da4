//! PV lifecycle and image attachment services.
//!
//! [`PvService`] implements the report lifecycle (create, list, fetch,
//! update, completion toggle, delete) over any [`pvdesk_storage::PvStorage`]
//! backend, appending activity entries to the owning task. [`ImageService`]
//! handles file-backed image attachments for surveillance reports.

mod error;
mod images;
mod pv;

pub use error::ServiceError;
pub use images::{
    ImageService, ImageStore, UploadedImage, IMAGE_URL_PREFIX, MAX_IMAGES_PER_UPLOAD,
    MAX_IMAGE_BYTES,
};
pub use pv::{PvService, PvView};

/// Current instant as an RFC 3339 string, the timestamp format used in
/// records and activity entries.
pub(crate) fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
