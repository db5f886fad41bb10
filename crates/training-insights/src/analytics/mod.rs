pub mod domain;
pub mod filter;
pub mod ingest;
pub mod report;
pub mod session;

pub use domain::{
    ModuleAttempts, ModuleCatalog, ModuleSpec, TrainingDataset, TrainingRecord, TrainingStatus,
};
pub use filter::{FilterCriteria, FilterOptions, Selection};
pub use ingest::{IngestError, MalformedInputError, TrainingImporter, UploadFormat};
pub use report::DashboardReport;
pub use session::{ContentDigest, DatasetInfo, LoadedDataset, SessionCache, SessionLoad};
