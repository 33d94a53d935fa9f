use super::*;
use serde_json::json;

#[test]
fn parses_hex_forms() {
    assert_eq!(parse_hex("#FF0000").unwrap(), Rgb8::new(255, 0, 0));
    assert_eq!(parse_hex("0x00ff00").unwrap(), Rgb8::new(0, 255, 0));
    assert_eq!(parse_hex("0000ff80").unwrap(), Rgb8::new(0, 0, 255));
    assert!(parse_hex("#fff").is_err());
    assert!(parse_hex("#gg0000").is_err());
}

#[test]
fn palette_color_accepts_objects_and_arrays() {
    let c: PaletteColor = serde_json::from_value(json!({"r": 1.0, "g": 0.0, "b": 0.0})).unwrap();
    assert_eq!(c.0, Rgb8::new(255, 0, 0));

    let c: PaletteColor = serde_json::from_value(json!({"h": 120.0, "s": 1.0, "l": 0.5})).unwrap();
    assert_eq!(c.0, Rgb8::new(0, 255, 0));

    let c: PaletteColor = serde_json::from_value(json!([0.0, 0.0, 1.0, 0.5])).unwrap();
    assert_eq!(c.0, Rgb8::new(0, 0, 255));

    assert!(serde_json::from_value::<PaletteColor>(json!([1.0, 2.0])).is_err());
}

#[test]
fn palette_color_serializes_as_hex() {
    let c = PaletteColor::hex("#1874CD").unwrap();
    assert_eq!(serde_json::to_value(c).unwrap(), json!("#1874cd"));
    assert_eq!(c.0.to_hex_literal(), "0x1874cd");
}

#[test]
fn interpolation_hits_every_stop() {
    let out = interpolate_hex(&["#000000", "#ffffff", "#ff0000"], 5).unwrap();
    assert_eq!(
        out,
        vec!["#000000", "#808080", "#ffffff", "#ff8080", "#ff0000"]
    );
}

#[test]
fn interpolation_edge_cases() {
    assert_eq!(interpolate_hex(&["#123456"], 3).unwrap(), vec!["#123456"; 3]);
    assert!(interpolate_hex(&["#000000", "#ffffff"], 0).unwrap().is_empty());
    assert_eq!(
        interpolate_hex(&["#000000", "#ffffff"], 1).unwrap(),
        vec!["#000000"]
    );
    assert_eq!(interpolate_hex(&["#000000", "#ffffff"], 16).unwrap().len(), 16);
}
