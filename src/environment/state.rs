use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

/// Whether frames are shown as they are produced or rendered off-screen only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Frames are presented to a preview surface and paced in real time.
    Interactive,
    /// Non-interactive rendering; nothing is paced.
    #[default]
    Batch,
}

/// The two high-frequency warning kinds a render session suppresses.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WarningCategory {
    /// The cube's spatial coordinate system is missing or unusable.
    CoordinateSystem,
    /// None of the requested contour levels lies inside a slice's data range.
    EmptyContour,
}

impl WarningCategory {
    pub const ALL: [Self; 2] = [Self::CoordinateSystem, Self::EmptyContour];

    /// Stable short name, accepted by [`WarningCategory::parse`].
    pub fn name(self) -> &'static str {
        match self {
            Self::CoordinateSystem => "coordinate-system",
            Self::EmptyContour => "empty-contour",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "coordinate-system" | "wcs" => Some(Self::CoordinateSystem),
            "empty-contour" | "contour" => Some(Self::EmptyContour),
            _ => None,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::CoordinateSystem => "coordinate system warnings",
            Self::EmptyContour => "empty contour level warnings",
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::CoordinateSystem => 0,
            Self::EmptyContour => 1,
        }
    }
}

impl fmt::Display for WarningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Filter action for one warning category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WarningFilter {
    #[default]
    Default,
    Ignore,
}

/// Figure-level settings applied while a session is active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    /// Leave the figure background transparent (encoders flatten over their own background).
    pub transparent: bool,
    /// Draw the axes frame.
    pub frame_on: bool,
    /// Fit margins to the labels instead of using fixed fractions.
    pub tight_layout: bool,
    /// Padding around the figure when saved, in inches.
    pub pad_inches: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            transparent: false,
            frame_on: true,
            tight_layout: false,
            pad_inches: 0.1,
        }
    }
}

impl RenderSettings {
    /// Settings installed for the duration of a render session.
    pub fn session() -> Self {
        Self {
            transparent: true,
            frame_on: true,
            tight_layout: true,
            pad_inches: 0.0,
        }
    }
}

/// Complete snapshot of the process-wide rendering state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvironmentState {
    pub display_mode: DisplayMode,
    pub filters: [WarningFilter; 2],
    pub render: RenderSettings,
    /// Guard currently owning the state, if any.
    pub owner: Option<u64>,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::Batch,
            filters: [WarningFilter::Default; 2],
            render: RenderSettings::default(),
            owner: None,
        }
    }
}

impl EnvironmentState {
    pub fn filter(&self, category: WarningCategory) -> WarningFilter {
        self.filters[category.slot()]
    }

    pub fn set_filter(&mut self, category: WarningCategory, filter: WarningFilter) {
        self.filters[category.slot()] = filter;
    }
}

/// Whether a [`Notice`] reports a suppression or a re-enable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Suppressed,
    Restored,
}

/// Structured informational message about a warning category.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Notice {
    pub category: WarningCategory,
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub(crate) fn suppressed(category: WarningCategory) -> Self {
        let message = format!(
            "Disabled {} for this session so they do not flood every frame. Re-enable them with \
             restore_warnings(\"{}\").",
            category.describe(),
            category.name()
        );
        Self::emit(category, NoticeKind::Suppressed, message)
    }

    pub(crate) fn restored(category: WarningCategory) -> Self {
        let message = format!("Re-enabled {}.", category.describe());
        Self::emit(category, NoticeKind::Restored, message)
    }

    fn emit(category: WarningCategory, kind: NoticeKind, message: String) -> Self {
        tracing::info!(target: "cubemovie::notice", category = %category, ?kind, "{message}");
        Self {
            category,
            kind,
            message,
        }
    }
}

/// Which categories [`Environment::restore_warnings`] re-enables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarningSelection {
    One(WarningCategory),
    All,
}

impl WarningSelection {
    fn categories(self) -> Vec<WarningCategory> {
        match self {
            Self::One(c) => vec![c],
            Self::All => WarningCategory::ALL.to_vec(),
        }
    }
}

static GLOBAL: LazyLock<Environment> = LazyLock::new(Environment::isolated);
static NEXT_GUARD_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_guard_id() -> u64 {
    NEXT_GUARD_ID.fetch_add(1, Ordering::Relaxed)
}

/// Handle to a rendering environment.
///
/// Clones share state. [`Environment::global`] is the process-wide instance sessions use by
/// default; [`Environment::isolated`] creates a private one.
#[derive(Clone, Debug)]
pub struct Environment {
    state: Arc<Mutex<EnvironmentState>>,
    emitted: Arc<[AtomicU64; 2]>,
}

impl Environment {
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    pub fn isolated() -> Self {
        Self {
            state: Arc::new(Mutex::new(EnvironmentState::default())),
            emitted: Arc::new([AtomicU64::new(0), AtomicU64::new(0)]),
        }
    }

    /// Whether both handles refer to the same environment.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, EnvironmentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> EnvironmentState {
        *self.lock()
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.lock().display_mode
    }

    pub fn set_display_mode(&self, mode: DisplayMode) {
        self.lock().display_mode = mode;
    }

    pub fn filter(&self, category: WarningCategory) -> WarningFilter {
        self.lock().filter(category)
    }

    pub fn render_settings(&self) -> RenderSettings {
        self.lock().render
    }

    /// Suppress `category`. Returns the notice when the category was not already suppressed.
    pub fn suppress(&self, category: WarningCategory) -> Option<Notice> {
        let mut state = self.lock();
        if state.filter(category) == WarningFilter::Ignore {
            return None;
        }
        state.set_filter(category, WarningFilter::Ignore);
        drop(state);
        Some(Notice::suppressed(category))
    }

    /// Re-enable suppressed categories.
    ///
    /// A category that is not currently suppressed is left alone and produces no notice.
    pub fn restore_warnings(&self, selection: WarningSelection) -> Vec<Notice> {
        let mut restored = Vec::new();
        {
            let mut state = self.lock();
            for category in selection.categories() {
                if state.filter(category) == WarningFilter::Ignore {
                    state.set_filter(category, WarningFilter::Default);
                    restored.push(category);
                }
            }
        }
        restored.into_iter().map(Notice::restored).collect()
    }

    /// Emit a warning unless its category is suppressed. Returns whether it was emitted.
    pub fn warn(&self, category: WarningCategory, message: &str) -> bool {
        if self.filter(category) == WarningFilter::Ignore {
            return false;
        }
        self.emitted[category.slot()].fetch_add(1, Ordering::Relaxed);
        tracing::warn!(target: "cubemovie::warning", category = %category, "{message}");
        true
    }

    /// Number of warnings of `category` emitted through this environment.
    pub fn warnings_emitted(&self, category: WarningCategory) -> u64 {
        self.emitted[category.slot()].load(Ordering::Relaxed)
    }

    pub(crate) fn replace(&self, state: EnvironmentState) -> EnvironmentState {
        std::mem::replace(&mut *self.lock(), state)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/environment/state.rs"]
mod tests;
