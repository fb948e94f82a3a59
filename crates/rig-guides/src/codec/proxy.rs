//! Proxy records.

use tracing::warn;

use crate::codec::transform::{decode_transform, encode_transform};
use crate::keys;
use crate::model::{Proxy, Record, Value};

impl Proxy {
    /// Serializes the proxy.
    ///
    /// The offset transform, attributes and metadata are only written when
    /// they carry something; the identifier only on request.
    pub fn to_record(&self, include_identifier: bool) -> Record {
        let mut record = Record::new();
        record.insert(keys::NAME.to_string(), Value::from(self.name()));
        record.insert(
            keys::PARENT.to_string(),
            self.parent_identifier()
                .map_or(Value::Null, |id| Value::from(id.as_str())),
        );
        record.insert(
            keys::LOCATOR_SCALE.to_string(),
            Value::Float(self.locator_scale()),
        );
        record.insert(keys::TRANSFORM.to_string(), encode_transform(self.transform()));

        if let Some(offset) = self.offset_transform().filter(|t| !t.is_identity()) {
            record.insert(keys::OFFSET_TRANSFORM.to_string(), encode_transform(offset));
        }
        if !self.attributes().is_empty() {
            record.insert(
                keys::ATTRIBUTES.to_string(),
                Value::Map(self.attributes().clone()),
            );
        }

        let metadata = self.metadata_record();
        if !metadata.is_empty() {
            record.insert(keys::METADATA.to_string(), Value::Map(metadata));
        }
        if include_identifier {
            record.insert(keys::UUID.to_string(), Value::from(self.identifier().as_str()));
        }
        record
    }

    /// Creates a proxy from a record, starting from the defaults.
    pub fn from_record(record: &Record) -> Proxy {
        let mut proxy = Proxy::default();
        proxy.patch_from_record(record);
        proxy
    }

    /// Applies a record as a sparse patch: keys that are absent leave the
    /// corresponding field untouched. A `null` parent or offset transform
    /// clears it. Malformed entries are logged and skipped.
    pub fn patch_from_record(&mut self, record: &Record) -> &mut Self {
        // Identity first, so parent links are checked against the new id
        if let Some(value) = record.get(keys::UUID) {
            match value.as_str() {
                Some(id) => self.set_uuid(id),
                None => self.reject_entry(keys::UUID, "expected text"),
            }
        }
        if let Some(value) = record.get(keys::NAME) {
            match value.as_str() {
                Some(name) => self.set_name(name),
                None => self.reject_entry(keys::NAME, "expected text"),
            }
        }
        if let Some(value) = record.get(keys::PARENT) {
            match value {
                Value::Null => self.clear_parent_identifier(),
                Value::Text(id) => self.set_parent_identifier(id),
                _ => self.reject_entry(keys::PARENT, "expected text or null"),
            }
        }
        if let Some(value) = record.get(keys::LOCATOR_SCALE) {
            match value.as_f64() {
                Some(scale) => self.set_locator_scale(scale),
                None => self.reject_entry(keys::LOCATOR_SCALE, "expected a number"),
            }
        }
        if let Some(value) = record.get(keys::TRANSFORM) {
            match decode_transform(value, *self.transform()) {
                Ok(transform) => self.set_transform(transform),
                Err(err) => warn!(proxy = %self.name(), error = %err, "ignoring transform"),
            }
        }
        if let Some(value) = record.get(keys::OFFSET_TRANSFORM) {
            if value.is_null() {
                self.clear_offset_transform();
            } else {
                let base = self.offset_transform().copied().unwrap_or_default();
                match decode_transform(value, base) {
                    Ok(transform) => self.set_offset_transform(transform),
                    Err(err) => {
                        warn!(proxy = %self.name(), error = %err, "ignoring offset transform")
                    }
                }
            }
        }
        if let Some(value) = record.get(keys::ATTRIBUTES) {
            match value.as_map() {
                Some(attributes) => {
                    for (key, value) in attributes {
                        self.set_attribute(key, value.clone());
                    }
                }
                None => self.reject_entry(keys::ATTRIBUTES, "expected a map"),
            }
        }
        if let Some(value) = record.get(keys::METADATA) {
            match value.as_map() {
                Some(metadata) => {
                    for (key, value) in metadata {
                        self.set_metadata(key, value.clone());
                    }
                }
                None => self.reject_entry(keys::METADATA, "expected a map"),
            }
        }
        self
    }

    /// Free metadata plus the reserved meta-parent and role entries.
    fn metadata_record(&self) -> Record {
        let mut metadata = Record::new();
        if let Some(id) = self.meta_parent() {
            metadata.insert(keys::META_PARENT.to_string(), Value::from(id.as_str()));
        }
        if let Some(role) = self.role() {
            metadata.insert(keys::ROLE.to_string(), Value::from(role));
        }
        for (key, value) in self.metadata() {
            metadata.insert(key.clone(), value.clone());
        }
        metadata
    }

    fn reject_entry(&self, key: &str, reason: &str) {
        warn!(proxy = %self.name(), key, reason, "ignoring record entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identifier, Transform};

    fn record(entries: &[(&str, Value)]) -> Record {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_minimal_record_shape() {
        let proxy = Proxy::new("hip");
        let rec = proxy.to_record(false);
        let keys: Vec<&str> = rec.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "parent", "locatorScale", "transform"]);
        assert_eq!(rec["parent"], Value::Null);

        let rec = proxy.to_record(true);
        assert_eq!(rec["uuid"], Value::from(proxy.identifier().as_str()));
    }

    #[test]
    fn test_optional_sections() {
        let hip = Proxy::new("hip");
        let mut knee = Proxy::new("knee")
            .with_parent(&hip)
            .with_role("knee")
            .with_initial_position([0.0, 50.0, 2.0]);
        knee.set_attribute("twist", 4i64);
        knee.set_metadata("side", "left");

        let rec = knee.to_record(false);
        assert_eq!(rec["parent"], Value::from(hip.identifier().as_str()));
        assert!(rec.contains_key("offsetTransform"));
        assert_eq!(rec["attributes"].as_map().unwrap()["twist"], Value::Int(4));
        let metadata = rec["metadata"].as_map().unwrap();
        assert_eq!(metadata["role"], Value::from("knee"));
        assert_eq!(metadata["side"], Value::from("left"));
    }

    #[test]
    fn test_identity_offset_is_omitted() {
        let mut proxy = Proxy::new("hip");
        proxy.set_offset_transform(Transform::IDENTITY);
        assert!(!proxy.to_record(false).contains_key("offsetTransform"));
    }

    #[test]
    fn test_sparse_patch() {
        let mut proxy = Proxy::new("A");
        proxy.set_position([1.0, 2.0, 3.0]);
        let before = proxy.clone();

        proxy.patch_from_record(&record(&[("locatorScale", Value::Int(2))]));

        assert_eq!(proxy.locator_scale(), 2.0);
        assert_eq!(proxy.name(), "A");
        assert_eq!(proxy.transform(), before.transform());
        assert_eq!(proxy.identifier(), before.identifier());
    }

    #[test]
    fn test_patch_clears_with_null() {
        let hip = Proxy::new("hip");
        let mut knee = Proxy::new("knee").with_parent(&hip);
        knee.set_offset_position([0.0, 1.0, 0.0]);

        knee.patch_from_record(&record(&[
            ("parent", Value::Null),
            ("offsetTransform", Value::Null),
        ]));
        assert!(knee.parent_identifier().is_none());
        assert!(knee.offset_transform().is_none());
    }

    #[test]
    fn test_patch_skips_malformed_entries() {
        let mut proxy = Proxy::new("hip");
        let id = proxy.identifier().clone();
        proxy.patch_from_record(&record(&[
            ("uuid", Value::from("not a uuid")),
            ("name", Value::Int(3)),
            ("locatorScale", Value::from("big")),
            ("parent", Value::from(id.as_str())),
            ("transform", Value::from("up")),
        ]));
        assert_eq!(proxy.identifier(), &id);
        assert_eq!(proxy.name(), "hip");
        assert_eq!(proxy.locator_scale(), 1.0);
        assert!(proxy.parent_identifier().is_none());
        assert!(proxy.transform().is_identity());
    }

    #[test]
    fn test_round_trip_with_identifier() {
        let shoulder = Proxy::new("shoulder");
        let elbow = Proxy::new("elbow");
        let mut pole = Proxy::new("elbow_pole")
            .with_parent(&shoulder)
            .with_meta_parent(&elbow)
            .with_role("elbowPole")
            .with_initial_position([40.0, 145.0, -40.0])
            .with_locator_scale(0.5);
        pole.add_color(&[0.2, 0.4, 1.0]);

        let rec = pole.to_record(true);
        let loaded = Proxy::from_record(&rec);
        assert_eq!(loaded.to_record(true), rec);
        assert_eq!(loaded.meta_parent(), Some(elbow.identifier()));
        assert_eq!(loaded.role(), Some("elbowPole"));
    }

    #[test]
    fn test_from_record_without_uuid_gets_fresh_identity() {
        let rec = record(&[("name", Value::from("toe"))]);
        let a = Proxy::from_record(&rec);
        let b = Proxy::from_record(&rec);
        assert_ne!(a.identifier(), b.identifier());
        assert!(Identifier::parse(a.identifier().as_str()).is_ok());
    }
}
