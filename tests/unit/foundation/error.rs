use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CubeMovieError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        CubeMovieError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        CubeMovieError::encoding(EncodingErrorKind::DiskFull, "x")
            .to_string()
            .contains("encoding error: disk full")
    );
    assert!(
        CubeMovieError::environment_restore("x")
            .to_string()
            .contains("environment restore error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CubeMovieError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn encoding_failure_reports_partial_output() {
    let err = CubeMovieError::Encoding(EncodingFailure {
        kind: EncodingErrorKind::Process,
        message: "exit status 1".to_string(),
        partial_output: Some(PathBuf::from("out/movie.mp4")),
    });
    let s = err.to_string();
    assert!(s.contains("encoder process failed"));
    assert!(s.contains("out/movie.mp4"));
    assert_eq!(err.as_encoding().unwrap().kind, EncodingErrorKind::Process);
}
