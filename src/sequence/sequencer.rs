use crate::{
    effects::transitions::transition_progress,
    foundation::core::{Fps, FrameIndex},
    foundation::error::{AdreelError, AdreelResult},
    job::cancel::CancelToken,
    job::progress::{JobProgress, ProgressReporter},
    render::composite::blend_transition,
    render::frame::Frame,
    scene::model::TransitionPolicy,
};

/// One built scene frame and how long it stays on screen.
#[derive(Clone, Debug)]
pub struct SceneFrame {
    /// The representative frame of the scene.
    pub frame: Frame,
    /// On-screen duration in seconds.
    pub duration_seconds: f64,
}

/// Expands scene frames into the output frame stream.
///
/// Single pass and lazy: scenes are pulled from the upstream iterator only when the previous
/// scene has been fully emitted, so at most the outgoing and incoming scene frames are held
/// at once. Each scene yields `fps.scene_frames(duration)` repetitions; with a non-cut
/// [`TransitionPolicy`], `frames` blended frames are inserted between adjacent scenes.
///
/// The cancel token is checked before each scene starts. After a scene's last frame is
/// emitted the progress reporter is notified. The first error ends the stream.
pub struct Sequencer<I> {
    scenes: I,
    fps: Fps,
    transition: TransitionPolicy,
    cancel: Option<CancelToken>,
    progress: ProgressReporter,
    scenes_total: usize,
    scenes_done: usize,
    next_index: u64,
    current: Option<(Frame, u64)>,
    last: Option<Frame>,
    blending: Option<Blend>,
    finished: bool,
}

struct Blend {
    from: Frame,
    to: SceneFrame,
    step: u32,
}

impl<I> std::fmt::Debug for Sequencer<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("fps", &self.fps)
            .field("transition", &self.transition)
            .field("scenes_done", &self.scenes_done)
            .field("scenes_total", &self.scenes_total)
            .field("next_index", &self.next_index)
            .field("finished", &self.finished)
            .finish()
    }
}

/// Sequence already built scene frames.
pub fn expand<S>(
    scenes: S,
    fps: Fps,
    transition: TransitionPolicy,
) -> Sequencer<std::iter::Map<S::IntoIter, fn(SceneFrame) -> AdreelResult<SceneFrame>>>
where
    S: IntoIterator<Item = SceneFrame>,
{
    let ok: fn(SceneFrame) -> AdreelResult<SceneFrame> = Ok;
    Sequencer::new(scenes.into_iter().map(ok), fps, transition)
}

impl<I> Sequencer<I>
where
    I: Iterator<Item = AdreelResult<SceneFrame>>,
{
    /// Sequence scene frames produced (possibly lazily and fallibly) by `scenes`.
    ///
    /// The scene total used for progress comes from the iterator's size hint.
    pub fn new(scenes: I, fps: Fps, transition: TransitionPolicy) -> Self {
        let (lower, upper) = scenes.size_hint();
        Self {
            scenes,
            fps,
            transition,
            cancel: None,
            progress: ProgressReporter::default(),
            scenes_total: upper.unwrap_or(lower),
            scenes_done: 0,
            next_index: 0,
            current: None,
            last: None,
            blending: None,
            finished: false,
        }
    }

    /// Stop at the next scene boundary once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Report progress after each completed scene.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Hand the progress reporter back (for the final report after publishing).
    pub fn into_progress(self) -> ProgressReporter {
        self.progress
    }

    /// Scenes fully emitted so far.
    pub fn scenes_done(&self) -> usize {
        self.scenes_done
    }

    /// Frames emitted so far.
    pub fn frames_emitted(&self) -> u64 {
        self.next_index
    }

    fn emit(&mut self, frame: &Frame) -> Frame {
        let out = frame.with_index(FrameIndex(self.next_index));
        self.next_index += 1;
        out
    }

    fn fail(&mut self, err: AdreelError) -> Option<AdreelResult<Frame>> {
        self.finished = true;
        self.current = None;
        self.last = None;
        self.blending = None;
        Some(Err(err))
    }

    fn start_scene(&mut self, scene: SceneFrame) {
        let count = self.fps.scene_frames(scene.duration_seconds);
        tracing::debug!(
            scene = self.scenes_done,
            frames = count,
            duration_seconds = scene.duration_seconds,
            "scene start"
        );
        self.current = Some((scene.frame, count));
    }

    fn finish_scene(&mut self, frame: Frame) {
        self.scenes_done += 1;
        self.last = Some(frame);
        let total = self.scenes_total.max(self.scenes_done);
        self.progress.report(JobProgress::new(self.scenes_done, total));
    }
}

impl<I> Iterator for Sequencer<I>
where
    I: Iterator<Item = AdreelResult<SceneFrame>>,
{
    type Item = AdreelResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            if let Some((frame, remaining)) = self.current.take() {
                let out = self.emit(&frame);
                if remaining > 1 {
                    self.current = Some((frame, remaining - 1));
                } else {
                    self.finish_scene(frame);
                }
                return Some(Ok(out));
            }

            if let Some(mut blend) = self.blending.take() {
                let count = self.transition.inserted_frames();
                if blend.step > count {
                    self.start_scene(blend.to);
                    continue;
                }
                let t = transition_progress(blend.step, count);
                let (from, to) = (&blend.from, &blend.to.frame);
                if (from.width, from.height) != (to.width, to.height) {
                    return self.fail(AdreelError::media_shape(format!(
                        "transition between {}x{} and {}x{} frames",
                        from.width, from.height, to.width, to.height
                    )));
                }
                let pixels = match blend_transition(
                    &self.transition.kind,
                    &from.pixels,
                    &to.pixels,
                    from.width,
                    from.height,
                    t,
                ) {
                    Ok(p) => p,
                    Err(e) => return self.fail(e),
                };
                let frame = match Frame::new(
                    FrameIndex(self.next_index),
                    from.width,
                    from.height,
                    pixels,
                ) {
                    Ok(f) => f,
                    Err(e) => return self.fail(e),
                };
                self.next_index += 1;
                blend.step += 1;
                self.blending = Some(blend);
                return Some(Ok(frame));
            }

            if let Some(token) = self.cancel.as_ref()
                && token.is_cancelled()
            {
                tracing::info!(scenes_done = self.scenes_done, "sequencer cancelled");
                return self.fail(AdreelError::Cancelled);
            }

            match self.scenes.next() {
                None => {
                    self.finished = true;
                    self.last = None;
                    return None;
                }
                Some(Err(e)) => return self.fail(e),
                Some(Ok(scene)) => match self.last.take() {
                    Some(from) if self.transition.inserted_frames() > 0 => {
                        self.blending = Some(Blend {
                            from,
                            to: scene,
                            step: 1,
                        });
                    }
                    _ => self.start_scene(scene),
                },
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/sequencer.rs"]
mod tests;
