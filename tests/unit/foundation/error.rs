use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        SynthError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        SynthError::precondition("x")
            .to_string()
            .contains("precondition failed:")
    );
    assert!(SynthError::engine("x").to_string().contains("engine error:"));
    assert!(SynthError::phase("x").to_string().contains("phase error:"));
    assert!(
        SynthError::package("x")
            .to_string()
            .contains("packaging error:")
    );
    assert!(
        SynthError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = SynthError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn anyhow_context_converts_with_question_mark() {
    fn open_missing() -> SynthResult<()> {
        use anyhow::Context as _;
        std::fs::read("/definitely/not/here/bodysynth")
            .context("read fixture")
            .map(|_| ())?;
        Ok(())
    }

    let err = open_missing().unwrap_err();
    assert!(matches!(err, SynthError::Other(_)));
    assert!(err.to_string().contains("read fixture"));
}
