//! Reference host adapters: an in-memory session registry, a static realm
//! and the layer binding a subject to each request.
//!
//! These exist so the filters can run end to end in the bundled server and in
//! tests. Production deployments plug their own [`crate::authc::Subject`].

mod layer;
mod realm;
mod session;
mod subject;

pub use layer::{SESSION_COOKIE_NAME, SubjectLayer, SubjectService};
pub use realm::StaticRealm;
pub use session::{DEFAULT_SESSION_IDLE_TTL, MemorySession, MemorySessionRegistry};
pub use subject::{HostSubject, PRINCIPAL_ATTRIBUTE, SessionChange};
