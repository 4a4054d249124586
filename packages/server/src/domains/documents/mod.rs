pub mod context;
pub mod extraction;
pub mod models;
pub mod upload;

pub use context::{DocumentContext, PdfStrategy};
pub use models::{Document, NewDocument};
pub use upload::{delete_document, upload_document, Upload};
