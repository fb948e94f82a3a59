//! TransformRec := { position: [x,y,z], rotation: [x,y,z], scale: [x,y,z] }

use crate::error::ValidationError;
use crate::keys;
use crate::model::{Record, Transform, Value};

pub fn encode_transform(transform: &Transform) -> Value {
    let mut record = Record::new();
    record.insert(keys::POSITION.to_string(), Value::from(transform.position));
    record.insert(keys::ROTATION.to_string(), Value::from(transform.rotation));
    record.insert(keys::SCALE.to_string(), Value::from(transform.scale));
    Value::Map(record)
}

/// Decodes a transform record on top of `base`. Missing components keep
/// the base value; malformed ones reject the whole record.
pub fn decode_transform(value: &Value, base: Transform) -> Result<Transform, ValidationError> {
    let record = value.as_map().ok_or_else(|| ValidationError::InvalidValue {
        key: keys::TRANSFORM.to_string(),
        reason: "expected a map",
    })?;

    let mut transform = base;
    for (key, slot) in [
        (keys::POSITION, &mut transform.position),
        (keys::ROTATION, &mut transform.rotation),
        (keys::SCALE, &mut transform.scale),
    ] {
        if let Some(component) = record.get(key) {
            *slot = component.as_vec3().ok_or_else(|| ValidationError::InvalidValue {
                key: key.to_string(),
                reason: "expected three numbers",
            })?;
        }
    }

    if !transform.is_finite() {
        return Err(ValidationError::NonFinite { field: "transform" });
    }
    Ok(transform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_shape() {
        let value = encode_transform(&Transform::from_position([1.0, 2.0, 3.0]));
        let record = value.as_map().unwrap();
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, ["position", "rotation", "scale"]);
        assert_eq!(record["scale"], Value::from([1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_partial_decode_keeps_base() {
        let base = Transform::from_position([5.0, 5.0, 5.0]);
        let mut record = Record::new();
        record.insert("rotation".to_string(), Value::from([0.0, 90.0, 0.0]));

        let decoded = decode_transform(&Value::Map(record), base).unwrap();
        assert_eq!(decoded.position, [5.0, 5.0, 5.0]);
        assert_eq!(decoded.rotation, [0.0, 90.0, 0.0]);
    }

    #[test]
    fn test_integers_widen() {
        let mut record = Record::new();
        record.insert(
            "position".to_string(),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Float(3.5)]),
        );
        let decoded = decode_transform(&Value::Map(record), Transform::IDENTITY).unwrap();
        assert_eq!(decoded.position, [1.0, 2.0, 3.5]);
    }

    #[test]
    fn test_malformed_component() {
        let mut record = Record::new();
        record.insert("scale".to_string(), Value::from([1.0, 1.0, 1.0]));
        record.insert("position".to_string(), Value::from("up"));
        assert!(decode_transform(&Value::Map(record), Transform::IDENTITY).is_err());
        assert!(decode_transform(&Value::Int(3), Transform::IDENTITY).is_err());
    }
}
