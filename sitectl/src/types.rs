//! Common type definitions.
//!
//! All entity IDs are UUIDs generated by the service, wrapped in type aliases for readability:
//!
//! - [`UserId`]: identity (and profile) identifier
//! - [`InvitationId`]: pending invitation identifier
//!
//! [`abbrev_uuid`] shortens UUIDs to their first 8 characters for logging.

use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type InvitationId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviates_to_eight_chars() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }
}
