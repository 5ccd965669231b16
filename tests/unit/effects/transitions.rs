use super::*;

#[test]
fn wipe_dir_parses_aliases() {
    let params = serde_json::json!({ "dir": "ttb", "soft_edge": 0.1 });
    assert_eq!(
        parse_transition_kind_params("wipe", &params).unwrap(),
        TransitionKind::Wipe {
            dir: WipeDir::TopToBottom,
            soft_edge: 0.1
        }
    );
    assert_eq!(parse_wipe_dir("Right_To_Left").unwrap(), WipeDir::RightToLeft);
}

#[test]
fn wipe_soft_edge_is_clamped() {
    let params = serde_json::json!({ "soft_edge": -5.0 });
    assert_eq!(
        parse_transition_kind_params("wipe", &params).unwrap(),
        TransitionKind::Wipe {
            dir: WipeDir::LeftToRight,
            soft_edge: 0.0
        }
    );
}

#[test]
fn cut_and_crossfade_aliases() {
    let null = serde_json::Value::Null;
    assert_eq!(
        parse_transition_kind_params(" None ", &null).unwrap(),
        TransitionKind::Cut
    );
    assert_eq!(
        parse_transition_kind_params("dissolve", &null).unwrap(),
        TransitionKind::Crossfade
    );
}

#[test]
fn unknown_kinds_are_config_errors() {
    let null = serde_json::Value::Null;
    let err = parse_transition_kind_params("spin", &null).unwrap_err();
    assert_eq!(err.kind(), "config");
    assert!(parse_transition_kind_params("", &null).is_err());
    assert!(parse_transition_kind_params("wipe", &serde_json::json!(3)).is_err());
}

#[test]
fn kind_params_roundtrip_through_parser() {
    let kind = TransitionKind::Wipe {
        dir: WipeDir::BottomToTop,
        soft_edge: 0.25,
    };
    let (name, params) = kind.to_kind_params();
    assert_eq!(parse_transition_kind_params(&name, &params).unwrap(), kind);
}

#[test]
fn progress_ramps_strictly_inside_unit_interval() {
    let ts: Vec<f32> = (1..=3).map(|s| transition_progress(s, 3)).collect();
    assert_eq!(ts, vec![0.25, 0.5, 0.75]);
    assert_eq!(transition_progress(0, 0), 1.0);
}
