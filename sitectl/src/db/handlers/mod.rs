//! Repository implementations for database access.
//!
//! Every repository borrows a [`Store`](crate::db::store::Store) and returns records from
//! [`crate::db::models`]. Writes spanning several tables go through a single
//! [`WriteBatch`](crate::db::store::WriteBatch) so they land all-or-nothing.
//!
//! - [`Table`]: generic typed access to one content table
//! - [`Users`]: identities and their profiles
//! - [`Invitations`]: one-time invitation tokens
//!
//! ```ignore
//! use sitectl::db::handlers::{Repository, Users};
//!
//! let mut users = Users::new(store.as_ref());
//! if let Some(user) = users.get_user_by_email("editor@example.com").await? {
//!     println!("{}", user.id);
//! }
//! ```

pub mod invitations;
pub mod repository;
pub mod table;
pub mod users;

pub use invitations::Invitations;
pub use repository::Repository;
pub use table::{Ordered, Record, Table};
pub use users::Users;
