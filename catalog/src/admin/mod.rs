//! View-state models of the administration screens.
//!
//! Each type holds the state a screen renders and exposes the interactions
//! it reacts to. Data flows through [`crate::service::DomainAccess`], so the
//! same models run against the in-memory store or a persistent one.

pub mod detail;
pub mod header;
pub mod nav;
pub mod selection;

pub use detail::{AdminShell, DomainDetail};
pub use header::DomainHeader;
pub use nav::{NavEntry, Navigation};
pub use selection::{LanguageSelection, SelectionChange, SelectionError};
