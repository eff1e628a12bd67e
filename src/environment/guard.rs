use crate::environment::state::{
    DisplayMode, Environment, EnvironmentState, Notice, RenderSettings, WarningCategory,
    WarningSelection, next_guard_id,
};
use crate::foundation::error::{CubeMovieError, CubeMovieResult};

/// Scoped change of the rendering environment for one session.
///
/// `enter` snapshots the environment, switches to batch display mode unless a preview is
/// requested, suppresses both noisy warning categories and installs session render settings.
/// `exit` (or dropping the guard) puts the snapshot back.
#[derive(Debug)]
pub struct EnvironmentGuard {
    env: Environment,
    id: u64,
    snapshot: EnvironmentState,
    notices: Vec<Notice>,
    restored: bool,
}

impl EnvironmentGuard {
    #[tracing::instrument(skip(env))]
    pub fn enter(env: &Environment, preview: bool) -> Self {
        let id = next_guard_id();
        let snapshot = {
            let mut state = env.lock();
            let snapshot = *state;
            if snapshot.owner.is_some() {
                tracing::warn!(
                    target: "cubemovie::warning",
                    previous = ?snapshot.owner,
                    "entering a render environment that another session still owns"
                );
            }
            state.owner = Some(id);
            snapshot
        };

        let notices = WarningCategory::ALL
            .into_iter()
            .filter_map(|c| env.suppress(c))
            .collect();

        let mode = if preview {
            DisplayMode::Interactive
        } else {
            DisplayMode::Batch
        };
        {
            let mut state = env.lock();
            state.display_mode = mode;
            state.render = RenderSettings::session();
        }

        Self {
            env: env.clone(),
            id,
            snapshot,
            notices,
            restored: false,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Notices emitted while entering.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// State captured at `enter`.
    pub fn snapshot(&self) -> &EnvironmentState {
        &self.snapshot
    }

    pub fn restore_warnings(&mut self, selection: WarningSelection) -> Vec<Notice> {
        let restored = self.env.restore_warnings(selection);
        self.notices.extend(restored.iter().cloned());
        restored
    }

    /// Restore the snapshot and check that the environment matches it afterwards.
    ///
    /// The snapshot is always written back. An error reports that another session took over the
    /// environment while this one was active, or that the restored state does not match.
    pub fn exit(mut self) -> CubeMovieResult<Vec<Notice>> {
        self.restore()?;
        Ok(std::mem::take(&mut self.notices))
    }

    fn restore(&mut self) -> CubeMovieResult<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        let replaced = self.env.replace(self.snapshot);
        let current = self.env.snapshot();

        if replaced.owner != Some(self.id) {
            return Err(CubeMovieError::environment_restore(format!(
                "render environment was taken over by another session (owner {:?}); \
                 restored the state captured by session {}",
                replaced.owner, self.id
            )));
        }
        if current != self.snapshot {
            return Err(CubeMovieError::environment_restore(format!(
                "restored state {current:?} does not match snapshot {:?}",
                self.snapshot
            )));
        }
        tracing::debug!(guard = self.id, "render environment restored");
        Ok(())
    }
}

impl Drop for EnvironmentGuard {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::error!("{e}");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/environment/guard.rs"]
mod tests;
