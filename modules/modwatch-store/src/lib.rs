pub mod memory;
pub mod postgres;
pub mod staging;
pub mod traits;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use staging::{FileReports, FileStaging, MemoryReports, MemoryStaging, ReportSource, StagingStore};
pub use traits::{
    apply_update, ContentStore, DirectoryStore, IncidentStore, IncidentUpdate, InsertOutcome, Store,
};
