pub mod advisor;
pub mod backends;
pub mod failure;
pub mod inventory;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod types;

// Re-export core types at crate root for convenience.
pub use advisor::{HardwareProfile, Recommendation};
pub use backends::{Backend, BackendError};
pub use failure::{ClassifiedFailure, FailureKind, Remedy};
pub use inventory::{ModelInventory, OllamaProbe, ResidentModel};
pub use registry::BackendRegistry;
pub use resolver::{PREFERRED_CODING_MODELS, ResolutionOutcome, ResolveError};
pub use service::AssistantService;
pub use types::*;
