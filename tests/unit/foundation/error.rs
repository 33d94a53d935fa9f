use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        BrainError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        BrainError::LengthMismatch {
            values: 2,
            times: 1
        }
        .to_string()
        .contains("validation error:")
    );
    assert!(
        BrainError::EmptyValue("v".to_string())
            .to_string()
            .contains("validation error:")
    );
    assert!(
        BrainError::SingularMatrix
            .to_string()
            .contains("singular matrix:")
    );
    assert!(
        BrainError::unsupported("blank", "set_value")
            .to_string()
            .contains("unsupported operation:")
    );
    assert!(
        BrainError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn validation_family_is_grouped() {
    assert!(BrainError::EmptyValue("v".to_string()).is_validation());
    assert!(BrainError::LengthMismatch { values: 0, times: 1 }.is_validation());
    assert!(!BrainError::SingularMatrix.is_validation());
}

#[test]
fn missing_cache_file_names_the_path() {
    let err = BrainError::MissingCacheFile(PathBuf::from("/tmp/nope.json"));
    assert!(err.to_string().contains("/tmp/nope.json"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = BrainError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
