//! Signature audit recording.
//!
//! Computes a deterministic fingerprint of the agreed contract terms and
//! stamps signature events with actor role, timestamp, and request
//! provenance. Pure functions; the "already signed" guard lives in the
//! lifecycle service, not here.

use casalink_core::error::{CasalinkError, CasalinkResult};
use casalink_core::models::contract::{
    ContractContent, PartyRole, SignatureMetadata, SignatureRecord,
};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Request provenance captured alongside a signature.
#[derive(Debug, Clone, Default)]
pub struct SignatureProvenance {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// SHA-256 over the canonical serialization of the contract content and
/// custom clauses, hex-encoded.
///
/// Canonical means object keys are emitted in sorted order at every level,
/// so the hash is independent of map insertion order. The signature
/// metadata section itself is excluded: both parties' hashes compare equal
/// exactly when they signed the same terms, regardless of signing order.
pub fn content_hash(
    content: &ContractContent,
    custom_clauses: &serde_json::Value,
) -> CasalinkResult<String> {
    let mut agreed = content.clone();
    agreed.signatures = None;

    let content_value = serde_json::to_value(&agreed)
        .map_err(|e| CasalinkError::Internal(format!("content serialization: {e}")))?;

    let mut canonical = String::new();
    canonicalize(&content_value, &mut canonical);
    canonical.push('\n');
    canonicalize(custom_clauses, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Merge a signature event for `role` into the per-role metadata mapping,
/// immutably. An existing entry for the role is never overwritten.
pub fn record_signature(
    existing: &SignatureMetadata,
    role: PartyRole,
    provenance: &SignatureProvenance,
    content_hash: String,
    signed_at: DateTime<Utc>,
) -> SignatureMetadata {
    let mut merged = existing.clone();
    let record = SignatureRecord {
        signed_at,
        ip_address: provenance.ip_address.clone(),
        user_agent: provenance.user_agent.clone(),
        content_hash,
    };
    match role {
        PartyRole::Owner => {
            merged.owner.get_or_insert(record);
        }
        PartyRole::Tenant => {
            merged.tenant.get_or_insert(record);
        }
    }
    merged
}

/// Serialize a JSON value with object keys sorted at every nesting level.
fn canonicalize(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::Value::String((*key).clone()).to_string());
                out.push(':');
                canonicalize(&map[*key], out);
            }
            out.push('}');
        }
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                canonicalize(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_is_independent_of_key_order() {
        let content = ContractContent::default();
        let clauses_a = json!({"pets": "allowed", "smoking": "forbidden"});
        let clauses_b = json!({"smoking": "forbidden", "pets": "allowed"});

        let a = content_hash(&content, &clauses_a).unwrap();
        let b = content_hash(&content, &clauses_b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hash_changes_when_terms_change() {
        let content = ContractContent::default();
        let a = content_hash(&content, &json!({"pets": "allowed"})).unwrap();
        let b = content_hash(&content, &json!({"pets": "forbidden"})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn hash_ignores_signature_metadata() {
        let clauses = json!({});
        let unsigned = ContractContent::default();
        let baseline = content_hash(&unsigned, &clauses).unwrap();

        let signed = ContractContent {
            signatures: Some(record_signature(
                &SignatureMetadata::default(),
                PartyRole::Owner,
                &SignatureProvenance::default(),
                baseline.clone(),
                Utc::now(),
            )),
            ..ContractContent::default()
        };
        assert_eq!(content_hash(&signed, &clauses).unwrap(), baseline);
    }

    #[test]
    fn nested_objects_are_canonicalized() {
        let content = ContractContent::default();
        let a = json!({"outer": {"b": 2, "a": 1}});
        let b = json!({"outer": {"a": 1, "b": 2}});
        assert_eq!(
            content_hash(&content, &a).unwrap(),
            content_hash(&content, &b).unwrap()
        );
    }

    #[test]
    fn record_signature_never_overwrites() {
        let provenance = SignatureProvenance {
            ip_address: Some("10.0.0.1".into()),
            user_agent: Some("first".into()),
        };
        let first = record_signature(
            &SignatureMetadata::default(),
            PartyRole::Owner,
            &provenance,
            "hash-one".into(),
            Utc::now(),
        );

        let second = record_signature(
            &first,
            PartyRole::Owner,
            &SignatureProvenance {
                ip_address: Some("10.0.0.2".into()),
                user_agent: Some("second".into()),
            },
            "hash-two".into(),
            Utc::now(),
        );

        assert_eq!(second.owner.as_ref().unwrap().content_hash, "hash-one");
        assert_eq!(
            second.owner.as_ref().unwrap().ip_address.as_deref(),
            Some("10.0.0.1")
        );
    }

    #[test]
    fn roles_are_recorded_independently() {
        let meta = record_signature(
            &SignatureMetadata::default(),
            PartyRole::Owner,
            &SignatureProvenance::default(),
            "owner-hash".into(),
            Utc::now(),
        );
        assert!(meta.owner.is_some());
        assert!(meta.tenant.is_none());

        let meta = record_signature(
            &meta,
            PartyRole::Tenant,
            &SignatureProvenance::default(),
            "tenant-hash".into(),
            Utc::now(),
        );
        assert_eq!(meta.owner.as_ref().unwrap().content_hash, "owner-hash");
        assert_eq!(meta.tenant.as_ref().unwrap().content_hash, "tenant-hash");
    }
}
