//! Database record models matching table schemas.
//!
//! Records are distinct from API models so storage and wire shapes can evolve separately.
//!
//! - [`content`]: landing-page sections, singletons and site settings
//! - [`submissions`]: contact form leads and their option lists
//! - [`users`]: identities, profiles and invitations

pub mod content;
pub mod submissions;
pub mod users;
