use super::*;
use serde_json::json;

#[test]
fn digest_has_requested_length() {
    let s = digest_value(&123, 10).unwrap();
    assert_eq!(s.len(), 10);
    assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(digest_value(&123, DEFAULT_DIGEST_LEN).unwrap().len(), 20);
    assert_eq!(digest_value(&123, MAX_DIGEST_LEN).unwrap().len(), 32);
}

#[test]
fn digest_rejects_out_of_range_lengths() {
    assert!(digest_value(&1, 0).is_err());
    assert!(digest_value(&1, 33).is_err());
}

#[test]
fn digest_is_key_order_independent() {
    let a: serde_json::Value = serde_json::from_str(r#"{"b": 1, "a": [1, 2]}"#).unwrap();
    let b = json!({"a": [1, 2], "b": 1});
    assert_eq!(
        digest_value(&a, 20).unwrap(),
        digest_value(&b, 20).unwrap()
    );
    assert_ne!(
        digest_value(&a, 20).unwrap(),
        digest_value(&json!({"a": [1, 2], "b": 2}), 20).unwrap()
    );
}

#[test]
fn file_digest_matches_value_digest() {
    let dir = std::env::temp_dir().join(format!("ravebrain_digest_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("payload.json");

    // Larger than one read chunk.
    let payload = json!({"values": (0..3000).collect::<Vec<u32>>()});
    std::fs::write(&path, canonical_json(&payload).unwrap()).unwrap();

    assert_eq!(
        digest_file(&path, 20).unwrap(),
        digest_value(&payload, 20).unwrap()
    );
    assert!(digest_file(dir.join("missing.json"), 20).is_err());

    std::fs::remove_dir_all(&dir).ok();
}
