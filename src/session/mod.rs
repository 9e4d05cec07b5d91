//! Collaborator layer around the compositing core: session records, blob persistence and the
//! capture / generate / download flow.

pub mod booth;
pub mod lock;
pub mod model;
pub mod store;

pub use booth::{Booth, StripOutcome};
pub use lock::SessionLocks;
pub use model::{NewSession, PhotoRecord, Session, SessionState};
pub use store::PhotoStore;
