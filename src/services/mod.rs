//! Service layer for testgenie

pub mod config;
pub mod context;
pub mod detector;
pub mod extractor;
pub mod framework;
pub mod interaction;
pub mod orchestrator;
pub mod writer;

pub use config::{ConfigService, DefaultConfigService};
pub use detector::{ContextDetector, DefaultContextDetector};
pub use extractor::{DefaultSymbolExtractor, Extraction, SymbolExtractor};
pub use framework::{TestFramework, resolve_framework};
pub use interaction::{Interaction, Notice, NoticeLevel, PickOption};
pub use orchestrator::{ContinuationMode, Orchestrator, RunOutcome, RunReport, RunTarget, Stage};
pub use writer::{AtomicFileWriter, FileWriter, WriteOutcome};
