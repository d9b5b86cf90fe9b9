use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        GimbalError::mutation("x")
            .to_string()
            .contains("mutation error:")
    );
    assert!(GimbalError::stack("x").to_string().contains("stack error:"));
    assert!(
        GimbalError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = GimbalError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
