//! Landing-page content services.
//!
//! The admin API and the public renderer share these operations:
//!
//! - [`collections`]: item-at-a-time collections (FAQs, logos, pain points, progress stages,
//!   services, accordion) with create, edit, delete and one-step moves
//! - [`bulk`]: collections saved as a whole list (clients, pricing plans, reviews)
//! - [`singletons`]: hero, about and footer sections
//! - [`settings`]: named site-wide values
//! - [`landing`]: the per-section model the public page renders from
//! - [`reorder`]: the swap protocol behind moves

pub mod bulk;
pub mod collections;
pub mod defaults;
pub mod landing;
pub mod reorder;
pub mod settings;
pub mod singletons;

pub use collections::{Collection, Collections};
pub use landing::Landing;
pub use reorder::Direction;
