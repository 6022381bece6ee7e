use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LivestripError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        LivestripError::encoder("x")
            .to_string()
            .contains("encoder failure:")
    );
    assert!(
        LivestripError::decode("x")
            .to_string()
            .contains("decode error:")
    );
    assert!(
        LivestripError::clip_invalid("x")
            .to_string()
            .contains("clip invalid:")
    );
}

#[test]
fn unsupported_codec_lists_preferences() {
    let err = LivestripError::unsupported_codec(&["video/mp4", "video/webm"]);
    assert_eq!(
        err.to_string(),
        "unsupported codec: none of [video/mp4, video/webm] is supported"
    );
}

#[test]
fn per_clip_classification() {
    assert!(LivestripError::ClipTooSmall { size: 1, min: 50_000 }.is_per_clip());
    assert!(LivestripError::ClipTooFragmented { chunks: 1, min: 2 }.is_per_clip());
    assert!(
        LivestripError::MetadataTimeout {
            slot: 0,
            timeout: Duration::from_secs(1)
        }
        .is_per_clip()
    );
    assert!(!LivestripError::NoUsableMaterial.is_per_clip());
    assert!(!LivestripError::encoder("boom").is_per_clip());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LivestripError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
