use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(24, 0).is_err());
    assert_eq!(Fps::whole(24).unwrap(), Fps { num: 24, den: 1 });
}

#[test]
fn scene_frames_rounds_with_minimum_of_one() {
    let fps = Fps::whole(24).unwrap();
    assert_eq!(fps.scene_frames(2.0), 48);
    assert_eq!(fps.scene_frames(3.0), 72);
    assert_eq!(fps.scene_frames(0.02), 1);
    assert_eq!(fps.scene_frames(1.0 / 24.0 * 2.4), 2);
    assert_eq!(fps.scene_frames(1.0 / 24.0 * 2.6), 3);
}

#[test]
fn scene_frames_handles_rational_fps() {
    let fps = Fps::new(30000, 1001).unwrap();
    assert_eq!(fps.scene_frames(10.0), 300);
}

#[test]
fn fps_deserializes_whole_and_rational() {
    let a: Fps = serde_json::from_str("24").unwrap();
    assert_eq!(a, Fps { num: 24, den: 1 });
    let b: Fps = serde_json::from_str(r#"{"num":30000,"den":1001}"#).unwrap();
    assert_eq!(b, Fps { num: 30000, den: 1001 });
    assert!(serde_json::from_str::<Fps>("0").is_err());
}

#[test]
fn canvas_validation_requires_even_non_zero() {
    assert!(Canvas::FULL_HD.validate().is_ok());
    assert!(Canvas { width: 0, height: 2 }.validate().is_err());
    assert!(Canvas { width: 11, height: 10 }.validate().is_err());
    assert_eq!(Canvas { width: 4, height: 2 }.rgba_len(), 32);
}
