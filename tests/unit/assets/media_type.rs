use super::*;

#[test]
fn splits_container_and_codec() {
    let m = MediaType::new("video/webm;codecs=vp9");
    assert_eq!(m.container(), "video/webm");
    assert_eq!(m.codec(), Some("vp9"));
    assert_eq!(m.extension(), "webm");

    let quoted = MediaType::new("video/webm; codecs=\"vp8\"");
    assert_eq!(quoted.codec(), Some("vp8"));

    let bare = MediaType::new("video/mp4");
    assert_eq!(bare.codec(), None);
    assert_eq!(bare.extension(), "mp4");
}

#[test]
fn pick_supported_respects_preference_order() {
    let prefs: Vec<MediaType> = ["video/webm;codecs=vp8", "video/webm;codecs=vp9", "video/webm"]
        .into_iter()
        .map(MediaType::from)
        .collect();
    let picked = pick_supported(&prefs, |m| m.codec() != Some("vp8"));
    assert_eq!(picked.map(MediaType::as_str), Some("video/webm;codecs=vp9"));
    assert!(pick_supported(&prefs, |_| false).is_none());
}
