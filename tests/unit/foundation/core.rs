use super::*;

#[test]
fn layer_accepts_user_range_only() {
    assert!(Layer::new(0).is_ok());
    assert!(Layer::new(13).is_ok());
    assert!(Layer::new(14).is_err());
    assert!(LayerSet::from_indices(&[0, 3, 13]).is_ok());
    assert!(LayerSet::from_indices(&[0, 31]).is_err());
}

#[test]
fn marker_layer_survives_deserialization() {
    let s: LayerSet = serde_json::from_str("[31]").unwrap();
    assert!(s.contains(Layer::MARKER));
    let err = serde_json::from_str::<LayerSet>("[20]");
    assert!(err.is_err());
}

#[test]
fn layer_set_serializes_as_sorted_ints() {
    let s = LayerSet::from_indices(&[3, 0, 3]).unwrap();
    assert_eq!(s.len(), 2);
    assert_eq!(serde_json::to_string(&s).unwrap(), "[0,3]");
}

#[test]
fn mat4_rows_are_row_major() {
    let m = Mat4([
        1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0,
    ]);
    assert_eq!(m.rows()[1], [5.0, 6.0, 7.0, 8.0]);
    assert_eq!(m.at(2, 3), 12.0);
    assert_eq!(Mat4::default(), Mat4::IDENTITY);
}

#[test]
fn vec3_requires_three_values() {
    assert_eq!(vec3_from_slice(&[1.0, 2.0, 3.0]).unwrap(), [1.0, 2.0, 3.0]);
    assert!(vec3_from_slice(&[1.0, 2.0]).is_err());
}
