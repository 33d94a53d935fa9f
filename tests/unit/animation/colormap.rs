use super::*;
use crate::animation::keyframe::{KeyValues, Keyframe};
use std::collections::BTreeMap;

#[derive(Default)]
struct Source {
    keyframes: BTreeMap<String, Keyframe>,
}

impl Source {
    fn with(name: &str, values: KeyValues, time: Vec<f64>) -> Self {
        let mut s = Self::default();
        s.keyframes
            .insert(name.to_string(), Keyframe::new(name, values, time).unwrap());
        s
    }
}

impl AnimationSource for Source {
    fn animation_time_range(&self, name: &str) -> Option<[f64; 2]> {
        self.keyframes.get(name).map(Keyframe::time_range)
    }

    fn animation_value_range(&self, name: &str) -> Option<[f64; 2]> {
        self.keyframes.get(name).and_then(Keyframe::value_range)
    }

    fn animation_value_names(&self, name: &str) -> Option<&[String]> {
        self.keyframes.get(name).and_then(Keyframe::value_names)
    }
}

#[test]
fn continuous_ranges_are_unions() {
    let sources = [
        Source::with("v", vec![1.0, 2.0, 3.0].into(), vec![0.0, -1.0, 2.0]),
        Source::with("v", vec![1.0, 2.0, 4.0].into(), vec![0.0, -2.0, 2.0]),
        Source::with("v", vec![1.0, 2.0, 5.0].into(), vec![0.0, -3.0, 2.0]),
        Source::default(),
    ];
    let cmap = ColorMap::derive("v", &sources);
    assert_eq!(cmap.value_type(), ValueKind::Continuous);
    assert_eq!(cmap.value_range(), Some([1.0, 5.0]));
    assert_eq!(cmap.time_range(), [-3.0, 2.0]);
    assert_eq!(cmap.n_colors(), 64);
    assert_eq!(cmap.ramp_len(), 64);

    let d = cmap.descriptor();
    assert_eq!(d.color_vals.len(), 64);
    assert_eq!(d.color_vals[0], "0x000080");
    assert_eq!(d.color_vals[63], "0xff0000");
    let ColorKeys::Breakpoints(keys) = d.color_keys else {
        panic!("expected numeric keys");
    };
    assert_eq!(keys.len(), 64);
    assert_eq!(keys[0], 1.0);
    assert!((keys[1] - 1.0625).abs() < 1e-12);
}

#[test]
fn discrete_levels_union_in_order() {
    let sources = [
        Source::with("c", vec!["a", "B"].into(), vec![0.0, 1.0]),
        Source::with("c", vec!["c", "a", "c"].into(), vec![0.0, 1.0, 2.0]),
    ];
    let cmap = ColorMap::derive("c", &sources);
    assert_eq!(cmap.value_type(), ValueKind::Discrete);
    assert_eq!(cmap.value_names(), &["a", "B", "c"]);
    assert_eq!(cmap.value_range(), None);
    assert_eq!(cmap.n_colors(), 3);
    assert_eq!(cmap.colors(), &DISCRETE_PALETTE[..3]);

    let d = cmap.descriptor();
    assert_eq!(d.color_vals.len(), 16);
    assert_eq!(d.color_levels, 3);
    assert_eq!(d.color_keys, ColorKeys::Levels((1..=16).collect()));
}

#[test]
fn discrete_palette_expands_for_many_levels() {
    let labels: Vec<String> = (0..10).map(|i| format!("l{i}")).collect();
    let times = (0..10).map(f64::from).collect();
    let sources = [Source::with("c", labels.into(), times)];
    let cmap = ColorMap::derive("c", &sources);
    assert_eq!(cmap.colors().len(), 10);
    assert_eq!(cmap.colors()[0], DISCRETE_PALETTE[0]);
    assert_eq!(cmap.colors()[9], DISCRETE_PALETTE[5]);
    assert_eq!(cmap.ramp_len(), 16);
}

#[test]
fn missing_data_uses_fallback_ranges() {
    let none: [Source; 0] = [];
    let cmap = ColorMap::derive("nothing", &none);
    assert_eq!(cmap.time_range(), [0.0, 1.0]);
    assert_eq!(cmap.value_range(), Some([-1.0, 1.0]));
}

#[test]
fn single_sample_widens_below() {
    let sources = [Source::with("v", vec![4.0].into(), vec![2.0])];
    let cmap = ColorMap::derive("v", &sources);
    assert_eq!(cmap.time_range(), [1.0, 2.0]);
    assert_eq!(cmap.value_range(), Some([3.0, 4.0]));
}

#[test]
fn overrides_apply() {
    let sources = [Source::with("v", vec![0.0, 1.0].into(), vec![0.0, 1.0])];
    let mut cmap = ColorMap::derive("v", &sources);
    cmap.set_colors(&[Rgb8::new(0, 0, 0)]);
    assert_eq!(cmap.colors(), &CONTINUOUS_PALETTE);

    cmap.set_colors(&[Rgb8::new(0, 0, 0), Rgb8::new(255, 255, 255)]);
    cmap.set_value_range(-10.0, 10.0);
    cmap.set_hard_range(5.0, -5.0);
    cmap.set_alias("Power");

    let d = cmap.descriptor();
    assert_eq!(d.value_range, Some([-10.0, 10.0]));
    assert_eq!(d.hard_range, Some([-5.0, 5.0]));
    assert_eq!(d.alias.as_deref(), Some("Power"));
    assert_eq!(d.color_vals[0], "0x000000");
    assert_eq!(d.color_vals[63], "0xffffff");
}

#[test]
fn discrete_maps_ignore_range_overrides() {
    let sources = [Source::with("label", vec!["a", "b"].into(), vec![0.0, 1.0])];
    let mut cmap = ColorMap::derive("label", &sources);
    cmap.set_value_range(0.0, 1.0);
    cmap.set_hard_range(3.0, 2.0);

    let d = cmap.descriptor();
    assert_eq!(d.value_range, None);
    assert_eq!(d.hard_range, None);
}

#[test]
fn descriptor_round_trips() {
    let sources = [Source::with("c", vec!["x", "y"].into(), vec![0.0, 1.0])];
    let d = ColorMap::derive("c", &sources).descriptor();
    let back: ColorMapDescriptor =
        serde_json::from_value(serde_json::to_value(&d).unwrap()).unwrap();
    assert_eq!(back, d);
}
