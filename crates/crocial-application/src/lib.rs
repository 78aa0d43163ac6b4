//! Screen use cases for the Crocial application.
//!
//! One use-case object per screen, each owning its state slices and the
//! `Arc<dyn Gateway>` collaborators it orchestrates. Presentation layers
//! call the operations and render the snapshots; no screen reaches into
//! another screen's state.

pub mod bootstrap;
pub mod dashboard;
pub mod messages;
pub mod social;
pub mod studio;

pub use bootstrap::App;
pub use dashboard::DashboardScreen;
pub use messages::MessagesScreen;
pub use social::SocialScreen;
pub use studio::StudioScreen;
