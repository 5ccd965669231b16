use crate::{
    foundation::error::{AdreelError, AdreelResult},
    scene::model::SceneSpec,
};

/// On-screen time of the final scene, which has no following timestamp.
pub const LAST_SCENE_SECS: f64 = 5.0;

/// One timestamped caption from an ad script.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptScene {
    /// Start time in seconds.
    pub start_secs: u32,
    /// Caption text with surrounding `*` removed.
    pub caption: String,
    /// Time until the next scene starts, or [`LAST_SCENE_SECS`] for the last one.
    pub duration_seconds: f64,
}

/// Parse the scene section of an ad script.
///
/// The script is a header, a line containing `---`, then scene lines:
///
/// ```text
/// Title: Ergonomic chair
/// ---
/// [00:00] *Sit better.*
/// [00:04] *Work longer.*
/// ```
///
/// Lines that do not start with `[...]` are ignored, as are lines whose timestamp is not
/// `MM:SS`. Timestamps must strictly increase.
pub fn parse_script(text: &str) -> AdreelResult<Vec<ScriptScene>> {
    let Some(section) = text.split("---").nth(1) else {
        return Err(AdreelError::config(
            "script must contain a header and a scenes section separated by '---'",
        ));
    };

    let mut starts: Vec<(u32, String)> = Vec::new();
    for line in section.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !line.starts_with('[') {
            continue;
        }
        let Some(close) = line.find(']') else {
            continue;
        };
        let Some(start) = parse_timestamp(&line[1..close]) else {
            tracing::warn!(line, "skipping script line with malformed timestamp");
            continue;
        };
        let caption = line[close + 1..].trim().trim_matches('*').trim().to_string();

        if let Some((prev, _)) = starts.last()
            && start <= *prev
        {
            return Err(AdreelError::config(format!(
                "script timestamps must increase ({} follows {})",
                format_timestamp(start),
                format_timestamp(*prev)
            )));
        }
        starts.push((start, caption));
    }

    if starts.is_empty() {
        return Err(AdreelError::config("no valid scenes found in script"));
    }

    let next_starts: Vec<Option<u32>> = starts
        .iter()
        .skip(1)
        .map(|(s, _)| Some(*s))
        .chain(std::iter::once(None))
        .collect();
    Ok(starts
        .into_iter()
        .zip(next_starts)
        .map(|((start_secs, caption), next)| ScriptScene {
            start_secs,
            caption,
            duration_seconds: next.map_or(LAST_SCENE_SECS, |n| f64::from(n - start_secs)),
        })
        .collect())
}

/// Pair script captions with images, cycling through `images` when there are more scenes.
pub fn scenes_from_script(
    scenes: &[ScriptScene],
    images: &[impl AsRef<str>],
) -> AdreelResult<Vec<SceneSpec>> {
    if images.is_empty() {
        return Err(AdreelError::config("script needs at least one image"));
    }
    Ok(scenes
        .iter()
        .enumerate()
        .map(|(i, s)| {
            SceneSpec::new(
                images[i % images.len()].as_ref(),
                s.caption.clone(),
                s.duration_seconds,
            )
        })
        .collect())
}

fn parse_timestamp(s: &str) -> Option<u32> {
    let (m, sec) = s.trim().split_once(':')?;
    let m: u32 = m.trim().parse().ok()?;
    let sec: u32 = sec.trim().parse().ok()?;
    m.checked_mul(60)?.checked_add(sec)
}

fn format_timestamp(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/script.rs"]
mod tests;
