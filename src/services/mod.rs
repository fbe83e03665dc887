// Service exports
pub mod analysis;
pub mod broker;
pub mod cache;
pub mod clock;
pub mod codes;
pub mod fallback;
pub mod lifecycle;
pub mod memory;
pub mod postgres;
pub mod store;

pub use analysis::{AnalysisError, AnalysisGenerator, HttpAnalysisGenerator, TemplateAnalysisGenerator};
pub use broker::{BrokerError, CodeBroker, IssuedCode, ResolvedCode};
pub use cache::{CacheKey, LocalCodeCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use fallback::{FallbackCodeStore, Located};
pub use lifecycle::{Lifecycle, LifecycleError, PublishedMatch};
pub use memory::InMemoryStore;
pub use postgres::{DbInvitationStatus, DbMatchStatus, DbMatchType, PostgresStore};
pub use store::{CodeStore, Durability, LifecycleStore, StoreError};
