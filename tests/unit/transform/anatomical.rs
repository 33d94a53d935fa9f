use super::*;
use crate::foundation::error::BrainError;

fn torig() -> Mat4 {
    Mat4([
        -1.0, 0.0, 0.0, 128.0, //
        0.0, 0.0, 1.0, -128.0, //
        0.0, -1.0, 0.0, 128.0, //
        0.0, 0.0, 0.0, 1.0,
    ])
}

#[test]
fn identity_transforms_compose_to_identity() {
    let t = AnatomicalTransforms::default();
    assert_eq!(t.vox2vox_mni305().unwrap(), Mat4::IDENTITY);
    assert_eq!(t.scanner_center().unwrap(), [-0.0, -0.0, -0.0]);
}

#[test]
fn scanner_center_is_offset_between_norig_and_torig() {
    let mut norig = torig();
    norig.0[3] += 2.0;
    norig.0[7] -= 3.0;
    norig.0[11] += 5.0;
    let t = AnatomicalTransforms {
        xfm: Mat4::IDENTITY,
        norig,
        torig: torig(),
    };
    let c = t.scanner_center().unwrap();
    assert!((c[0] + 2.0).abs() < 1e-9);
    assert!((c[1] - 3.0).abs() < 1e-9);
    assert!((c[2] + 5.0).abs() < 1e-9);
}

#[test]
fn composition_order_is_xfm_norig_inv_torig() {
    let mut xfm = Mat4::IDENTITY;
    xfm.0[0] = 2.0;
    let t = AnatomicalTransforms {
        xfm,
        norig: torig(),
        torig: torig(),
    };
    // Norig == Torig cancels out, leaving xfm.
    assert!(t.vox2vox_mni305().unwrap().approx_eq(&xfm, 1e-12));
}

#[test]
fn singular_torig_fails() {
    let t = AnatomicalTransforms {
        torig: Mat4([0.0; 16]),
        ..Default::default()
    };
    assert!(matches!(t.vox2vox_mni305(), Err(BrainError::SingularMatrix)));
    assert!(matches!(t.scanner_center(), Err(BrainError::SingularMatrix)));
}

#[test]
fn serializes_with_anatomical_names() {
    let v = serde_json::to_value(AnatomicalTransforms::default()).unwrap();
    assert!(v.get("Norig").is_some());
    assert!(v.get("Torig").is_some());
    assert_eq!(v["xfm"].as_array().unwrap().len(), 16);
}

#[test]
fn parses_talairach_text() {
    let text = "MNI Transform File\n\nTransform_Type = Linear;\nLinear_Transform =\n\
                \x201.1 0.0 0.0 -1.5\n 0.0 0.9 0.1 2.0\n 0.0 -0.1 1.2 3.5;\n";
    let m = parse_talairach_xfm(text);
    assert_eq!(m.at(0, 0), 1.1);
    assert_eq!(m.at(2, 3), 3.5);
    assert_eq!(m.rows()[3], [0.0, 0.0, 0.0, 1.0]);

    assert_eq!(parse_talairach_xfm("garbage"), Mat4::IDENTITY);
}
