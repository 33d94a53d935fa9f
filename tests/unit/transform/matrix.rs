use super::*;

fn sample() -> Mat4 {
    Mat4([
        2.0, 0.0, 0.0, 1.0, //
        0.0, 0.0, 3.0, -2.0, //
        0.0, -1.5, 0.0, 4.0, //
        0.0, 0.0, 0.0, 1.0,
    ])
}

#[test]
fn identity_is_neutral() {
    let m = sample();
    assert_eq!(multiply(&m, &Mat4::IDENTITY), m);
    assert_eq!(multiply(&Mat4::IDENTITY, &m), m);
}

#[test]
fn product_is_row_major() {
    let a = Mat4([
        1.0, 2.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ]);
    let b = Mat4([
        1.0, 0.0, 0.0, 0.0, 3.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ]);
    let ab = multiply(&a, &b);
    assert_eq!(ab.at(0, 0), 7.0);
    assert_eq!(ab.at(0, 1), 2.0);
}

#[test]
fn inverse_round_trips_to_identity() {
    let mats = [
        sample(),
        Mat4([
            -1.0, 0.0, 0.0, 128.0, 0.0, 0.0, 1.0, -128.0, 0.0, -1.0, 0.0, 128.0, 0.0, 0.0, 0.0,
            1.0,
        ]),
        Mat4([
            4.0, 7.0, 2.0, 3.0, 0.0, 5.0, 0.0, 1.0, 1.0, 1.0, 3.0, 0.0, 2.0, 0.0, 1.0, 6.0,
        ]),
    ];
    for m in mats {
        assert_ne!(determinant(&m), 0.0);
        let inv = invert(&m).unwrap();
        assert!(multiply(&m, &inv).approx_eq(&Mat4::IDENTITY, 1e-9));
        assert!(multiply(&inv, &m).approx_eq(&Mat4::IDENTITY, 1e-9));
    }
}

#[test]
fn exact_zero_determinant_is_singular() {
    let mut m = Mat4::IDENTITY;
    m.0[10] = 0.0;
    assert_eq!(determinant(&m), 0.0);
    assert!(matches!(invert(&m), Err(BrainError::SingularMatrix)));
}

#[test]
fn tiny_determinant_is_still_inverted() {
    let mut m = Mat4::IDENTITY;
    m.0[0] = 1e-300;
    assert!(invert(&m).is_ok());
}

#[test]
fn spread_accepts_affine_rows() {
    let m = spread_4x4(&[1.0, 0.0, 0.0, 5.0, 0.0, 1.0, 0.0, 6.0, 0.0, 0.0, 1.0, 7.0]).unwrap();
    assert_eq!(m.rows()[3], [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(m.at(1, 3), 6.0);
    assert!(spread_4x4(&[1.0; 9]).is_err());

    let rows = vec![vec![1.0, 0.0, 0.0, 0.0]; 3];
    assert!(from_rows(&rows).is_ok());
    assert!(from_rows(&[vec![1.0, 2.0]]).is_err());
}
