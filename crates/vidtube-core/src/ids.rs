//! Object id parsing.
//!
//! Every identifier that arrives in a path segment or request body is a
//! 24-character hex string naming a document `_id`. Handlers parse them
//! through [`parse_object_id`] before issuing any query so that malformed
//! ids are rejected with a 400 instead of reaching the database.

use bson::oid::ObjectId;

/// An identifier that is not a valid object id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid or missing {what} id")]
pub struct InvalidId {
    /// Which kind of id was being parsed ("video", "playlist", ...).
    pub what: &'static str,
}

/// Parse a hex object id, trimming surrounding whitespace.
///
/// `what` names the resource for the error message.
pub fn parse_object_id(raw: &str, what: &'static str) -> Result<ObjectId, InvalidId> {
    let trimmed = raw.trim();
    if trimmed.len() != 24 {
        return Err(InvalidId { what });
    }
    ObjectId::parse_str(trimmed).map_err(|_| InvalidId { what })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_hex() {
        let id = ObjectId::new();
        let parsed = parse_object_id(&id.to_hex(), "video").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn trims_whitespace() {
        let id = ObjectId::new();
        let parsed = parse_object_id(&format!("  {}\n", id.to_hex()), "video").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_empty() {
        let err = parse_object_id("   ", "playlist").unwrap_err();
        assert_eq!(err.what, "playlist");
        assert_eq!(err.to_string(), "invalid or missing playlist id");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(parse_object_id("abc123", "video").is_err());
        assert!(parse_object_id(&"a".repeat(25), "video").is_err());
    }

    #[test]
    fn rejects_non_hex() {
        assert!(parse_object_id(&"z".repeat(24), "comment").is_err());
    }
}
