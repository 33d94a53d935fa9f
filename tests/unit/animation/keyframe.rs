use super::*;
use serde_json::json;

fn temp_dir(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "ravebrain_keyframe_{name}_{}_{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn length_mismatch_is_rejected() {
    let err = Keyframe::new("v", vec![1.0, 2.0].into(), vec![0.0]).unwrap_err();
    assert!(matches!(
        err,
        BrainError::LengthMismatch {
            values: 2,
            times: 1
        }
    ));
}

#[test]
fn non_finite_values_drop_with_their_time() {
    let kf = Keyframe::new(
        "v",
        vec![1.0, f64::NAN, 3.0, f64::INFINITY].into(),
        vec![0.0, 1.0, 2.0, 3.0],
    )
    .unwrap();
    assert_eq!(kf.time(), &[0.0, 2.0]);
    assert_eq!(kf.values(), &KeyValues::Numbers(vec![1.0, 3.0]));

    let all_nan = Keyframe::new("v", vec![f64::NAN].into(), vec![0.0]).unwrap();
    assert!(all_nan.is_empty());
    assert_eq!(all_nan.time_range(), [0.0, 0.0]);
    assert_eq!(all_nan.value_range(), None);
}

#[test]
fn labels_derive_levels_in_first_appearance_order() {
    let kf = Keyframe::new(
        "cond",
        vec!["b", "a", "b", "c"].into(),
        vec![0.0, 1.0, 2.0, 3.0],
    )
    .unwrap();
    assert_eq!(kf.kind(), ValueKind::Discrete);
    assert_eq!(kf.value_names().unwrap(), &["b", "a", "c"]);
    assert_eq!(kf.value_range(), None);
    assert_eq!(kf.target(), DEFAULT_TARGET);
}

#[test]
fn factor_drops_values_outside_levels() {
    let kf = Keyframe::factor(
        "cond",
        vec!["lo".into(), "hi".into()],
        vec!["hi".into(), "mid".into(), "lo".into()],
        vec![0.0, 1.0, 2.0],
    )
    .unwrap();
    assert_eq!(kf.time(), &[0.0, 2.0]);
    assert_eq!(kf.value_names().unwrap(), &["lo", "hi"]);
}

#[test]
fn dense_requires_values_and_targets_vertex_colors() {
    assert!(matches!(
        Keyframe::dense("c", KeyValues::Numbers(vec![]), vec![]),
        Err(BrainError::EmptyValue(_))
    ));
    let kf = Keyframe::dense("c", vec![1.0, f64::NAN].into(), vec![0.0, 0.0]).unwrap();
    assert_eq!(kf.target(), DENSE_TARGET);
    assert_eq!(kf.values().len(), 2);
}

#[test]
fn ranges_cover_min_and_max() {
    let kf = Keyframe::new("v", vec![3.0, -1.0, 2.0].into(), vec![5.0, 1.0, -2.0]).unwrap();
    assert_eq!(kf.time_range(), [-2.0, 5.0]);
    assert_eq!(kf.value_range(), Some([-1.0, 3.0]));
}

#[test]
fn materialize_compacts_and_is_idempotent() {
    let dir = temp_dir("materialize");
    let path = dir.join("kf.json");
    let cache = JsonCache::new();

    let mut kf = Keyframe::new("v", vec![3.0, -1.0, 2.0].into(), vec![0.0, 1.0, 2.0]).unwrap();
    let first = kf.materialize(&cache, &path, "record").unwrap();
    assert!(first.is_new_cache);
    assert!(kf.is_cached());
    assert_eq!(kf.values(), &KeyValues::Numbers(vec![-1.0, 3.0]));

    let stored = cache.read(&path).unwrap();
    assert_eq!(stored["record"]["value"], json!([3.0, -1.0, 2.0]));
    assert_eq!(stored["record"]["cached"], json!(false));

    let second = kf.materialize(&cache, &path, "record").unwrap();
    assert!(!second.is_new_cache);
    assert_eq!(second.absolute_path, first.absolute_path);
    assert_eq!(kf.values(), &KeyValues::Numbers(vec![-1.0, 3.0]));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn materialized_discrete_keeps_levels() {
    let dir = temp_dir("discrete");
    let mut kf = Keyframe::new("c", vec!["x", "y", "x"].into(), vec![0.0, 1.0, 2.0]).unwrap();
    kf.materialize(&JsonCache::new(), dir.join("c.json"), "c")
        .unwrap();
    assert_eq!(kf.values(), &KeyValues::Labels(vec!["x".into(), "y".into()]));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn descriptor_round_trips() {
    let kf = Keyframe::new("cond", vec!["a", "b"].into(), vec![0.0, 1.0]).unwrap();
    let d = kf.descriptor();
    let v = serde_json::to_value(&d).unwrap();
    assert_eq!(v["data_type"], json!("discrete"));
    assert_eq!(v["cache_path"], json!(null));
    let back: KeyframeDescriptor = serde_json::from_value(v).unwrap();
    assert_eq!(back, d);
}
