use super::*;
use crate::foundation::core::Layer;
use crate::geometry::group::GroupValue;

fn temp_dir(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "ravebrain_brain_{name}_{}_{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const TORIG: [f64; 16] = [
    -1.0, 0.0, 0.0, 128.0, 0.0, 0.0, 1.0, -128.0, 0.0, -1.0, 0.0, 128.0, 0.0, 0.0, 0.0, 1.0,
];
const NORIG: [f64; 16] = [
    -1.0, 0.0, 0.0, 130.0, 0.0, 0.0, 1.0, -120.0, 0.0, -1.0, 0.0, 125.0, 0.0, 0.0, 0.0, 1.0,
];

/// Subject directory with T1, pial surfaces and sulc curvature.
fn subject_dir(name: &str, with_xfm: bool) -> PathBuf {
    let root = temp_dir(name);
    let rave = root.join(CACHE_DIR);
    std::fs::create_dir_all(&rave).unwrap();
    let mut common = json!({
        "Norig": NORIG.chunks(4).map(<[f64]>::to_vec).collect::<Vec<_>>(),
        "Torig": TORIG,
    });
    if with_xfm {
        common["xfm"] = json!([1, 0, 0, 1, 0, 1, 0, 2, 0, 0, 1, 3]);
    }
    std::fs::write(rave.join(COMMON_DIGEST), common.to_string()).unwrap();

    let cache = JsonCache::new();
    cache
        .put(
            rave.join("S1_t1.json"),
            &json!({
                "datacube_value_T1 (S1)": [0.0, 1.0],
                "datacube_dim_T1 (S1)": [2, 1, 1],
                "datacube_half_size_T1 (S1)": [128, 128, 128],
            }),
            None,
        )
        .unwrap();
    for h in ["lh", "rh"] {
        cache
            .put(rave.join(format!("S1_fs_{h}_pial.json")), &json!({"mesh": h}), None)
            .unwrap();
        cache
            .put(rave.join(format!("S1_fs_{h}_sulc.json")), &json!({"sulc": h}), None)
            .unwrap();
    }
    root
}

#[test]
fn new_brain_has_misc_marker() {
    let brain = Brain::new("S1").unwrap();
    let misc = brain.graph().geom(brain.misc()).unwrap();
    assert_eq!(misc.name, "_misc_S1");
    assert_eq!(misc.type_tag(), "blank");
    assert_eq!(
        brain.graph().group_of(brain.misc()).unwrap().name,
        "_internal_group_data_S1"
    );
    assert_eq!(
        brain.get_geometries(&Selection::All, &Selection::All),
        vec![brain.misc()]
    );
    assert_eq!(brain.to_string(), "Brain - S1\n  Surfaces: \n  Volumes:  ");
}

#[test]
fn transforms_compose_in_fixed_order() {
    let mut brain = Brain::new("S1").unwrap();
    brain.set_norig(&NORIG).unwrap();
    brain.set_torig(&TORIG[..12]).unwrap();
    assert!(brain.set_xfm(&[1.0, 2.0]).unwrap_err().is_validation());

    let c = brain.scanner_center().unwrap();
    for (got, want) in c.iter().zip([-2.0, -8.0, 3.0]) {
        assert!((got - want).abs() < 1e-9, "{c:?}");
    }
    let v2v = brain.vox2vox_mni305().unwrap();
    assert!((v2v.at(0, 3) - 2.0).abs() < 1e-9);

    let g = brain.global_data().unwrap();
    assert_eq!(g["S1"]["Torig"][0], json!([-1.0, 0.0, 0.0, 128.0]));
    assert!(g["S1"]["scanner_center"].is_array());

    brain.set_torig(&[0.0; 16]).unwrap();
    assert!(matches!(
        brain.vox2vox_mni305(),
        Err(BrainError::SingularMatrix)
    ));
}

#[test]
fn loads_prepared_subject_directory() {
    let root = subject_dir("load", true);
    let brain = Brain::from_cache_dir("S1", &root, &LoadOptions::default()).unwrap();

    assert_eq!(brain.volume_types(), vec!["T1"]);
    assert_eq!(brain.surface_types(), vec!["pial"]);
    assert_eq!(brain.transforms().xfm.at(2, 3), 3.0);
    assert_eq!(brain.transforms().norig.0, NORIG);

    let t1 = brain.volume("T1").unwrap();
    let cube = brain.graph().geom(t1.geom()).unwrap();
    assert_eq!(cube.name, "T1 (S1)");
    assert!(cube.layer.contains(Layer::INVISIBLE));

    let pial = brain.surface("pial").unwrap();
    let group = brain.graph().group(pial.group()).unwrap();
    assert_eq!(
        group.entry("curvature"),
        Some(&GroupValue::Inline(json!("sulc")))
    );
    assert_eq!(
        group.entry("default_vertex_lh_pial"),
        Some(&GroupValue::Inline(json!("Curvature - lh.sulc (S1)")))
    );

    let misc = brain.graph().group_of(brain.misc()).unwrap();
    let rec = misc
        .entry("Curvature - rh.sulc (S1)")
        .and_then(|v| v.as_record())
        .unwrap();
    assert_eq!(rec.file_name, "S1_fs_rh_sulc.json");
    assert_eq!(rec.lazy, Some(true));

    let ids = brain.get_geometries(&Selection::All, &Selection::All);
    assert_eq!(ids, vec![brain.misc(), t1.geom(), pial.left(), pial.right()]);
    assert_eq!(
        brain.get_geometries(&Selection::Nothing, &Selection::Only(vec!["white".into()])),
        vec![brain.misc()]
    );

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn missing_surface_is_skipped_and_xfm_falls_back_to_talairach() {
    let root = subject_dir("fallback", false);
    let transforms = root.join("mri").join("transforms");
    std::fs::create_dir_all(&transforms).unwrap();
    std::fs::write(
        transforms.join("talairach.xfm"),
        "MNI Transform File\nLinear_Transform =\n 1 0 0 5\n 0 1 0 6\n 0 0 1 7;\n",
    )
    .unwrap();

    let opts = LoadOptions {
        surfaces: vec!["pial".into(), "white".into(), "bogus".into()],
        ..LoadOptions::default()
    };
    let brain = Brain::from_cache_dir("S1", &root, &opts).unwrap();
    assert_eq!(brain.surface_types(), vec!["pial"]);
    assert_eq!(brain.transforms().xfm.at(1, 3), 6.0);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn subject_directory_must_be_prepared() {
    let root = temp_dir("bare");
    let err = Brain::from_cache_dir("S1", &root, &LoadOptions::default()).unwrap_err();
    assert!(err.is_validation());
    assert!(Brain::from_cache_dir("S1", root.join("nope"), &LoadOptions::default()).is_err());
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn standard_surfaces_center_on_scanner_origin() {
    let mut brain = Brain::new("S1").unwrap();
    brain.set_norig(&NORIG).unwrap();
    brain.set_torig(&TORIG).unwrap();
    let graph = brain.graph_mut();
    let gid = graph.add_group(Group::new("g"));
    let v = vec![vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
    let f = vec![vec![0, 1, 2]];
    let l = graph
        .add_free_mesh(FreeMeshSpec::inline("l", gid, v.clone(), f.clone()))
        .unwrap();
    let r = graph
        .add_free_mesh(FreeMeshSpec::inline("r", gid, v, f))
        .unwrap();
    let surface = BrainSurface::new(graph, "other", "inflated", MeshType::Std141, l, r).unwrap();
    brain.add_surface(surface).unwrap();

    let g = brain.graph().group(gid).unwrap();
    for (got, want) in g.position.iter().zip([-2.0, -8.0, 3.0]) {
        assert!((got - want).abs() < 1e-9);
    }
    assert_eq!(g.subject_code.as_deref(), Some("S1"));
    assert_eq!(brain.graph().geom(l).unwrap().position, [-50.0, 0.0, 0.0]);
    assert_eq!(brain.graph().geom(r).unwrap().position, [50.0, 0.0, 0.0]);
    assert_eq!(brain.surface_mesh_types()["inflated"], MeshType::Std141);

    assert_eq!(brain.remove_surface(&["inflated", "pial"]).len(), 1);
    assert!(brain.surface_types().is_empty());
}

#[test]
fn render_adds_presets_and_global_data() {
    let root = subject_dir("render", true);
    let brain = Brain::from_cache_dir("S1", &root, &LoadOptions::default()).unwrap();

    let opts = brain.render_options(SceneOptions::default()).unwrap();
    assert_eq!(opts.control_presets.first().map(String::as_str), Some("subject2"));
    assert!(opts.side_display);
    assert!(opts.global_data.contains_key("S1"));

    let bundle = brain
        .render(&Selection::All, &Selection::All, SceneOptions::default())
        .unwrap();
    assert_eq!(bundle.geoms.len(), 5);
    assert!(
        bundle.groups[0]
            .group_data
            .contains_key("__global_data__S1")
    );
    // T1 payload, two meshes and two curvature files.
    assert_eq!(bundle.files().len(), 5);

    let mut bare = brain.clone();
    bare.remove_volume(&["T1"]);
    assert!(!bare.render_options(SceneOptions::default()).unwrap().side_display);

    std::fs::remove_dir_all(&root).ok();
}
