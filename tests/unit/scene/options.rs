use super::*;

#[test]
fn partial_json_fills_defaults() {
    let opts =
        SceneOptions::from_reader(r##"{"background":"#000000","side_width":300}"##.as_bytes())
            .unwrap();
    assert_eq!(opts.background, "#000000");
    assert_eq!(opts.side_width, 300.0);
    assert_eq!(opts.camera_pos, [500.0, 0.0, 0.0]);
    assert_eq!(opts.widget_id, "threebrain_data");
    assert!(opts.show_inactive_electrodes);
}

#[test]
fn malformed_json_is_a_validation_error() {
    let err = SceneOptions::from_reader("{".as_bytes()).unwrap_err();
    assert!(err.is_validation());
    let err = SceneOptions::from_path("/nonexistent/options.json").unwrap_err();
    assert!(err.to_string().contains("open scene options"));
}

#[test]
fn validate_checks_coords_and_normalizes_scales() {
    let mut opts = SceneOptions {
        font_scale: 0.0,
        start_zoom: -2.0,
        ..SceneOptions::default()
    };
    opts.validate().unwrap();
    assert_eq!(opts.font_scale, 1.0);
    assert_eq!(opts.start_zoom, 1.0);

    opts.coords = Some(vec![1.0, 2.0]);
    assert!(opts.validate().unwrap_err().is_validation());
    opts.coords = Some(vec![1.0, 2.0, 3.0]);
    assert!(opts.validate().is_ok());
}

#[test]
fn brain_presets_wrap_caller_presets_once() {
    let opts = SceneOptions {
        control_presets: vec!["electrodes".to_string(), "custom".to_string()],
        ..SceneOptions::default()
    }
    .with_brain_presets();
    assert_eq!(
        opts.control_presets,
        vec![
            "subject2",
            "surface_type2",
            "hemisphere_material",
            "map_template",
            "electrodes",
            "custom",
            "animation",
            "display_highlights",
        ]
    );
}

#[test]
fn settings_mirror_options() {
    let opts = SceneOptions {
        control_panel: false,
        widget_id: "w".to_string(),
        ..SceneOptions::default()
    };
    let s = ViewerSettings::new(&opts, BTreeMap::new(), None);
    assert!(s.hide_controls);
    assert_eq!(s.cache_folder, "lib/w-0/");
    assert_eq!(s.lib_path, "lib/");
    assert_eq!(s.font_magnification, 1.0);

    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["default_colormap"], serde_json::Value::Null);
    assert_eq!(v["control_center"], serde_json::json!([0.0, 0.0, 0.0]));
}
