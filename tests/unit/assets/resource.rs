use super::*;
use crate::assets::media_type::MediaType;

fn clip() -> Clip {
    Clip::from_payload(vec![7u8; 64], MediaType::new("video/webm"))
}

#[test]
fn release_removes_backing_file() {
    let dir = tempfile::tempdir().unwrap();
    let res = PlaybackResource::create(dir.path(), 2, &clip()).unwrap();
    let path = res.path().unwrap().to_path_buf();
    assert_eq!(std::fs::read(&path).unwrap(), vec![7u8; 64]);
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("webm"));
    assert_eq!(res.slot(), 2);

    res.release();
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn drop_removes_unreleased_file() {
    let dir = tempfile::tempdir().unwrap();
    let res = PlaybackResource::create(dir.path(), 0, &clip()).unwrap();
    let path = res.path().unwrap().to_path_buf();
    drop(res);
    assert!(!path.exists());
}
