//! Data persistence and access.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers, content services)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - typed tables, users, invitations)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │    Store    │  (db::store - uniform select / atomic batch apply)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────────────────┐
//! │ PostgreSQL │ in-memory  │
//! └─────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`store`]: the [`store::Store`] trait and its PostgreSQL and in-memory implementations
//! - [`handlers`]: repositories returning typed records
//! - [`models`]: record structures matching table schemas
//! - [`errors`]: database-specific error types
//!
//! # Migrations
//!
//! Migrations live in the `migrations/` directory and are exposed through [`crate::migrator`]:
//!
//! ```ignore
//! sitectl::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
pub mod store;
