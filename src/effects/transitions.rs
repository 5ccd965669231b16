use crate::foundation::error::{AdreelError, AdreelResult};

/// Direction in which a wipe reveals the incoming scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WipeDir {
    /// Reveal from the left edge.
    LeftToRight,
    /// Reveal from the right edge.
    RightToLeft,
    /// Reveal from the top edge.
    TopToBottom,
    /// Reveal from the bottom edge.
    BottomToTop,
}

impl WipeDir {
    fn as_str(self) -> &'static str {
        match self {
            WipeDir::LeftToRight => "ltr",
            WipeDir::RightToLeft => "rtl",
            WipeDir::TopToBottom => "ttb",
            WipeDir::BottomToTop => "btt",
        }
    }
}

/// Blend used for frames inserted between two scenes.
#[derive(Clone, Debug, PartialEq)]
pub enum TransitionKind {
    /// Hard cut; no frames are inserted.
    Cut,
    /// Linear cross-dissolve.
    Crossfade,
    /// Directional wipe with an optional soft edge (fraction of the axis length).
    Wipe {
        /// Reveal direction.
        dir: WipeDir,
        /// Soft edge width in `[0, 1]`.
        soft_edge: f32,
    },
}

/// Parse a transition kind string plus its JSON parameter object.
pub fn parse_transition_kind_params(
    kind: &str,
    params: &serde_json::Value,
) -> AdreelResult<TransitionKind> {
    let kind = kind.trim().to_ascii_lowercase();
    if kind.is_empty() {
        return Err(AdreelError::config("transition kind must be non-empty"));
    }

    match kind.as_str() {
        "none" | "cut" => Ok(TransitionKind::Cut),
        "crossfade" | "dissolve" => Ok(TransitionKind::Crossfade),
        "wipe" => {
            let params = if params.is_null() {
                None
            } else {
                Some(
                    params
                        .as_object()
                        .ok_or_else(|| AdreelError::config("wipe params must be an object"))?,
                )
            };

            let dir = match params.and_then(|p| p.get("dir")).and_then(|v| v.as_str()) {
                None => WipeDir::LeftToRight,
                Some(s) => parse_wipe_dir(s)?,
            };

            let soft_edge = match params
                .and_then(|p| p.get("soft_edge"))
                .and_then(|v| v.as_f64())
            {
                None => 0.0,
                Some(v) => {
                    let f = v as f32;
                    if !f.is_finite() {
                        return Err(AdreelError::config("wipe.soft_edge must be finite when set"));
                    }
                    f.clamp(0.0, 1.0)
                }
            };

            Ok(TransitionKind::Wipe { dir, soft_edge })
        }
        _ => Err(AdreelError::config(format!(
            "unknown transition kind '{kind}'"
        ))),
    }
}

/// Parse a wipe direction, accepting long and short aliases.
pub fn parse_wipe_dir(s: &str) -> AdreelResult<WipeDir> {
    match s.trim().to_ascii_lowercase().as_str() {
        "left_to_right" | "lefttoright" | "ltr" => Ok(WipeDir::LeftToRight),
        "right_to_left" | "righttoleft" | "rtl" => Ok(WipeDir::RightToLeft),
        "top_to_bottom" | "toptobottom" | "ttb" => Ok(WipeDir::TopToBottom),
        "bottom_to_top" | "bottomtotop" | "btt" => Ok(WipeDir::BottomToTop),
        other => Err(AdreelError::config(format!("unknown wipe.dir '{other}'"))),
    }
}

impl TransitionKind {
    /// Inverse of [`parse_transition_kind_params`].
    pub fn to_kind_params(&self) -> (String, serde_json::Value) {
        match self {
            TransitionKind::Cut => ("none".to_string(), serde_json::Value::Null),
            TransitionKind::Crossfade => ("crossfade".to_string(), serde_json::Value::Null),
            TransitionKind::Wipe { dir, soft_edge } => (
                "wipe".to_string(),
                serde_json::json!({ "dir": dir.as_str(), "soft_edge": soft_edge }),
            ),
        }
    }
}

/// Blend progress for the `step`-th (1-based) of `count` inserted frames.
///
/// Ramps linearly from 0 to 1, excluding both endpoints, which are the neighbouring scene
/// frames themselves.
pub fn transition_progress(step: u32, count: u32) -> f32 {
    if count == 0 {
        return 1.0;
    }
    (f64::from(step) / f64::from(count + 1)) as f32
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transitions.rs"]
mod tests;
