use super::*;

const SCRIPT: &str = "\
**Product:** Desk lamp
**Tone:** upbeat
---
[00:00] *Light that follows you.*
[00:04] *Three color temperatures.*

not a scene line
[0:09] Ships today
";

#[test]
fn parses_scenes_with_durations_from_next_timestamp() {
    let scenes = parse_script(SCRIPT).unwrap();
    assert_eq!(
        scenes,
        vec![
            ScriptScene {
                start_secs: 0,
                caption: "Light that follows you.".to_string(),
                duration_seconds: 4.0,
            },
            ScriptScene {
                start_secs: 4,
                caption: "Three color temperatures.".to_string(),
                duration_seconds: 5.0,
            },
            ScriptScene {
                start_secs: 9,
                caption: "Ships today".to_string(),
                duration_seconds: LAST_SCENE_SECS,
            },
        ]
    );
}

#[test]
fn minutes_count_toward_start() {
    let scenes = parse_script("h\n---\n[01:30] *a*\n[02:00] *b*").unwrap();
    assert_eq!(scenes[0].start_secs, 90);
    assert_eq!(scenes[0].duration_seconds, 30.0);
}

#[test]
fn malformed_timestamps_are_skipped() {
    let scenes = parse_script("h\n---\n[soon] *x*\n[00:02 *y*\n[00:03] *z*").unwrap();
    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].caption, "z");
}

#[test]
fn missing_separator_is_config_error() {
    let err = parse_script("[00:00] *a*").unwrap_err();
    assert_eq!(err.kind(), "config");
}

#[test]
fn no_scenes_is_config_error() {
    let err = parse_script("header\n---\njust prose\n").unwrap_err();
    assert_eq!(err.kind(), "config");
}

#[test]
fn non_increasing_timestamps_are_config_error() {
    let err = parse_script("h\n---\n[00:05] *a*\n[00:05] *b*").unwrap_err();
    assert_eq!(err.kind(), "config");
    assert!(err.to_string().contains("00:05"));
}

#[test]
fn images_are_assigned_round_robin() {
    let scenes = parse_script(SCRIPT).unwrap();
    let specs = scenes_from_script(&scenes, &["a.png", "b.png"]).unwrap();
    let sources: Vec<&str> = specs.iter().map(|s| s.image_source.as_str()).collect();
    assert_eq!(sources, vec!["a.png", "b.png", "a.png"]);
    assert_eq!(specs[1].caption, "Three color temperatures.");
    assert_eq!(specs[1].duration_seconds, 5.0);
}

#[test]
fn scenes_need_an_image() {
    let scenes = parse_script(SCRIPT).unwrap();
    let none: [&str; 0] = [];
    assert_eq!(
        scenes_from_script(&scenes, &none).unwrap_err().kind(),
        "config"
    );
}
