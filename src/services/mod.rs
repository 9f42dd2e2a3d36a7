//! Service layer: external integrations and the upsert orchestration.

pub mod capture;
pub mod coordinator;
pub mod encoder;
pub mod storage;
pub mod store;

pub use capture::{CaptureDevice, CaptureSession};
pub use coordinator::Coordinator;
pub use encoder::EncodingClient;
pub use storage::SupabaseStorage;
pub use store::PgProfileStore;
