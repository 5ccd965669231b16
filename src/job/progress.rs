/// Scene-level job progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JobProgress {
    /// Scenes whose frames have all been emitted.
    pub scenes_done: usize,
    /// Scenes in the job.
    pub scenes_total: usize,
    /// `scenes_done / scenes_total` in `[0, 1]`; never decreases within a job.
    pub fraction: f64,
}

impl JobProgress {
    /// Progress after `scenes_done` of `scenes_total` scenes.
    pub fn new(scenes_done: usize, scenes_total: usize) -> Self {
        let fraction = if scenes_total == 0 {
            1.0
        } else {
            (scenes_done as f64 / scenes_total as f64).clamp(0.0, 1.0)
        };
        Self {
            scenes_done,
            scenes_total,
            fraction,
        }
    }

    /// Final progress, reported once the output is published.
    pub fn complete(scenes_total: usize) -> Self {
        Self {
            scenes_done: scenes_total,
            scenes_total,
            fraction: 1.0,
        }
    }
}

/// Progress callback installed on a job.
pub type ProgressObserver = Box<dyn FnMut(JobProgress) + Send>;

/// Forwards progress to an optional observer, dropping reports that would move backwards.
#[derive(Default)]
pub struct ProgressReporter {
    observer: Option<ProgressObserver>,
    last: f64,
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("observer", &self.observer.is_some())
            .field("last", &self.last)
            .finish()
    }
}

impl ProgressReporter {
    /// Wrap an optional observer.
    pub fn new(observer: Option<ProgressObserver>) -> Self {
        Self {
            observer,
            last: 0.0,
        }
    }

    /// Deliver `progress` unless it is behind the last delivered fraction.
    pub fn report(&mut self, progress: JobProgress) {
        if progress.fraction < self.last {
            return;
        }
        self.last = progress.fraction;
        tracing::debug!(
            scenes_done = progress.scenes_done,
            scenes_total = progress.scenes_total,
            fraction = progress.fraction,
            "job progress"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer(progress);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/progress.rs"]
mod tests;
