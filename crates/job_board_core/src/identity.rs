//! crates/job_board_core/src/identity.rs
//!
//! Derives the stable identity key of a raw job record. The upstream feed has
//! used several field names for the same thing over time, and some records
//! carry none at all; resolution walks the known names in order and only
//! synthesizes an identity as a last resort.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::domain::JobRecord;

/// Identity field names, most preferred first.
pub const IDENTITY_FIELDS: &[&str] = &["id", "_id", "uniqueId"];

/// Resolves identities for one feed session.
///
/// Synthesized identities are remembered so two records processed by the same
/// resolver can never be handed the same one.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    synthesized: HashSet<String>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identity of `raw`. Never fails for any input shape.
    pub fn resolve(&mut self, raw: &Value) -> String {
        if let Some(identity) = Self::declared(raw) {
            return identity;
        }
        loop {
            let candidate = synthesize();
            if self.synthesized.insert(candidate.clone()) {
                debug!(identity = %candidate, "record has no usable identity field, synthesized one");
                return candidate;
            }
        }
    }

    /// Resolves without a history, for callers that do not own a session
    /// (e.g. re-keying persisted bookmarks).
    pub fn resolve_stateless(raw: &Value) -> String {
        Self::declared(raw).unwrap_or_else(synthesize)
    }

    /// Resolves the identity of `raw` and builds the record around it.
    pub fn attach(&mut self, raw: Value) -> JobRecord {
        let identity = self.resolve(&raw);
        JobRecord::from_raw(raw, identity)
    }

    /// Forgets every identity synthesized so far.
    pub fn clear_history(&mut self) {
        self.synthesized.clear();
    }

    pub fn synthesized_count(&self) -> usize {
        self.synthesized.len()
    }

    /// The first usable identity field, following [`IDENTITY_FIELDS`] order.
    pub fn declared(raw: &Value) -> Option<String> {
        let object = raw.as_object()?;
        IDENTITY_FIELDS.iter().find_map(|field| {
            let value = object.get(*field)?;
            let identity = usable(value);
            if identity.is_none() {
                debug!(field = %field, ?value, "ignoring malformed identity field");
            }
            identity
        })
    }
}

/// Accepts non-blank strings, integers and Mongo-style `{"$oid": "..."}` objects.
fn usable(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        Value::Object(object) => object.get("$oid").and_then(usable),
        _ => None,
    }
}

/// Last resort: a random v4 UUID.
fn synthesize() -> String {
    Uuid::new_v4().to_string()
}
