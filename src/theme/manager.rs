use std::cell::RefCell;
use std::rc::Rc;

use crate::events::{EventBus, SubscriptionId};

use super::scheme::{ColorSchemeSignal, FixedScheme};
use super::store::{CSRF_COOKIE, CookieJar, MemoryStore, PreferenceStore};
use super::sync::{NoSync, ThemeSync};
use super::{
    Preference, ResolvedTheme, SUPPRESS_TRANSITIONS_CLASS, THEME_KEY, ThemeChanged, ThemeRoot,
};

/// Label state of an element carrying the toggle marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleButton {
    pub label: String,
    pub aria_label: String,
}

impl ToggleButton {
    pub fn for_preference(preference: Preference) -> Self {
        let name = preference.display_name();
        Self {
            label: format!("{} {name}", preference.icon()),
            aria_label: format!("Switch theme: currently {name}"),
        }
    }
}

/// Assembles a [`ThemeManager`] from host capabilities.
///
/// Every capability has an inert default so hosts only wire what they have.
pub struct ThemeManagerBuilder {
    local: Box<dyn PreferenceStore>,
    cookies: Box<dyn PreferenceStore>,
    scheme: Box<dyn ColorSchemeSignal>,
    sync: Box<dyn ThemeSync>,
    root: ThemeRoot,
    toggles: usize,
}

impl ThemeManagerBuilder {
    #[must_use]
    pub fn local_store(mut self, store: impl PreferenceStore + 'static) -> Self {
        self.local = Box::new(store);
        self
    }

    #[must_use]
    pub fn cookie_store(mut self, store: impl PreferenceStore + 'static) -> Self {
        self.cookies = Box::new(store);
        self
    }

    #[must_use]
    pub fn scheme(mut self, scheme: impl ColorSchemeSignal + 'static) -> Self {
        self.scheme = Box::new(scheme);
        self
    }

    #[must_use]
    pub fn sync(mut self, sync: impl ThemeSync + 'static) -> Self {
        self.sync = Box::new(sync);
        self
    }

    #[must_use]
    pub fn root(mut self, root: ThemeRoot) -> Self {
        self.root = root;
        self
    }

    /// Number of elements carrying the toggle marker.
    #[must_use]
    pub fn toggle_buttons(mut self, count: usize) -> Self {
        self.toggles = count;
        self
    }

    pub fn build(self) -> ThemeManager {
        let toggles = Rc::new(RefCell::new(vec![
            ToggleButton::for_preference(Preference::Auto);
            self.toggles
        ]));
        let mut events = EventBus::new();
        let labels = Rc::clone(&toggles);
        events.subscribe(ThemeChanged::NAME, move |event: &ThemeChanged| {
            refresh_labels(&labels, event.theme);
        });
        ThemeManager {
            local: self.local,
            cookies: self.cookies,
            scheme: self.scheme,
            sync: self.sync,
            root: self.root,
            toggles,
            events,
            applied: None,
        }
    }
}

impl Default for ThemeManagerBuilder {
    fn default() -> Self {
        Self {
            local: Box::new(MemoryStore::new()),
            cookies: Box::new(CookieJar::new()),
            scheme: Box::new(FixedScheme { dark: false }),
            sync: Box::new(NoSync),
            root: ThemeRoot::new(),
            toggles: 0,
        }
    }
}

fn refresh_labels(toggles: &RefCell<Vec<ToggleButton>>, preference: Preference) {
    let label = ToggleButton::for_preference(preference);
    for button in toggles.borrow_mut().iter_mut() {
        button.clone_from(&label);
    }
}

/// Resolves, applies and persists the theme preference.
///
/// One manager per page/process, passed explicitly to whatever needs theme
/// state. Persistence and sync failures are logged and never undo the
/// local state change.
pub struct ThemeManager {
    local: Box<dyn PreferenceStore>,
    cookies: Box<dyn PreferenceStore>,
    scheme: Box<dyn ColorSchemeSignal>,
    sync: Box<dyn ThemeSync>,
    root: ThemeRoot,
    toggles: Rc<RefCell<Vec<ToggleButton>>>,
    events: EventBus<ThemeChanged>,
    applied: Option<Preference>,
}

impl ThemeManager {
    pub fn builder() -> ThemeManagerBuilder {
        ThemeManagerBuilder::default()
    }

    /// Start-up: suppress transitions, then resolve and apply the initial
    /// preference without emitting a change event.
    pub fn init(&mut self) -> (Preference, ResolvedTheme) {
        if self.root.add_class(SUPPRESS_TRANSITIONS_CLASS) {
            tracing::trace!("transitions suppressed for start-up");
        }
        let (preference, resolved) = self.resolve_initial();
        self.apply_immediately(preference);
        refresh_labels(&self.toggles, self.preference());
        tracing::debug!(%preference, %resolved, "theme initialised");
        (preference, resolved)
    }

    /// Work out the preference to start with.
    ///
    /// Order: stored preference (key-value store, then cookie), then the
    /// theme the server rendered into the root, then the current system
    /// color scheme as a concrete light or dark preference.
    pub fn resolve_initial(&self) -> (Preference, ResolvedTheme) {
        let preference = self
            .stored_preference()
            .or_else(|| self.root.resolved().map(Preference::from))
            .unwrap_or_else(|| {
                Preference::from(ResolvedTheme::from_dark(self.scheme.prefers_dark()))
            });
        (preference, self.resolve(preference))
    }

    /// Apply `preference`, persist it and broadcast `theme-changed`.
    pub fn set_preference(&mut self, preference: Preference) -> ThemeChanged {
        let actual_theme = self.resolve(preference);
        self.root.set_theme(actual_theme);
        self.persist(preference);
        self.applied = Some(preference);
        let event = ThemeChanged {
            theme: preference,
            actual_theme,
        };
        tracing::debug!(%preference, %actual_theme, "theme preference set");
        self.events.emit(&event);
        event
    }

    /// Like [`set_preference`](Self::set_preference) for raw input;
    /// unrecognised values select `auto`.
    pub fn set_preference_str(&mut self, value: &str) -> ThemeChanged {
        self.set_preference(Preference::parse_or_auto(value))
    }

    /// Rotate the stored preference: light, dark, auto, light.
    pub fn cycle_preference(&mut self) -> ThemeChanged {
        let next = self.preference().next();
        self.set_preference(next)
    }

    /// A toggle control was activated: cycle and push the result upstream.
    pub fn activate_toggle(&mut self) -> ThemeChanged {
        let event = self.cycle_preference();
        self.sync_with_server();
        event
    }

    /// The OS color scheme changed. Only `auto` follows it; stores are
    /// left untouched.
    pub fn on_system_scheme_change(&mut self, dark: bool) -> Option<ThemeChanged> {
        if self.preference() != Preference::Auto {
            return None;
        }
        let actual_theme = ResolvedTheme::from_dark(dark);
        self.root.set_theme(actual_theme);
        let event = ThemeChanged {
            theme: Preference::Auto,
            actual_theme,
        };
        self.events.emit(&event);
        Some(event)
    }

    /// Pick up a preference written by another instance sharing our stores.
    pub fn reload_from_store(&mut self) -> Option<ThemeChanged> {
        let stored = self.preference();
        if self.applied == Some(stored) {
            return None;
        }
        let actual_theme = self.resolve(stored);
        self.root.set_theme(actual_theme);
        self.applied = Some(stored);
        let event = ThemeChanged {
            theme: stored,
            actual_theme,
        };
        tracing::debug!(preference = %stored, "theme reloaded from store");
        self.events.emit(&event);
        Some(event)
    }

    /// Fire-and-forget push of the stored preference to the server.
    pub fn sync_with_server(&self) {
        let token = match self.cookies.get(CSRF_COOKIE) {
            Ok(token) => token.unwrap_or_default(),
            Err(err) => {
                tracing::debug!(%err, "csrf cookie unreadable");
                String::new()
            }
        };
        self.sync.push(self.preference(), &token);
    }

    /// Block until in-flight syncs finish.
    pub fn flush_sync(&self) {
        self.sync.flush();
    }

    /// Drop the start-up transition suppression. Hosts call this once the
    /// first frame with the new theme has been drawn.
    pub fn restore_transitions(&mut self) -> bool {
        self.root.remove_class(SUPPRESS_TRANSITIONS_CLASS)
    }

    /// The stored preference, or `auto` when nothing valid is stored.
    pub fn preference(&self) -> Preference {
        self.stored_preference().unwrap_or(Preference::Auto)
    }

    /// The theme currently rendered on the root.
    pub fn current_theme(&self) -> ResolvedTheme {
        self.root.resolved().unwrap_or(ResolvedTheme::Light)
    }

    pub fn system_prefers_dark(&self) -> bool {
        self.scheme.prefers_dark()
    }

    pub const fn root(&self) -> &ThemeRoot {
        &self.root
    }

    pub fn toggle_buttons(&self) -> Vec<ToggleButton> {
        self.toggles.borrow().clone()
    }

    pub fn subscribe(
        &mut self,
        handler: impl FnMut(&ThemeChanged) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(ThemeChanged::NAME, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn resolve(&self, preference: Preference) -> ResolvedTheme {
        preference.resolve(self.scheme.prefers_dark())
    }

    fn stored_preference(&self) -> Option<Preference> {
        read_preference(self.local.as_ref(), "local")
            .or_else(|| read_preference(self.cookies.as_ref(), "cookie"))
    }

    fn apply_immediately(&mut self, preference: Preference) {
        self.root.set_theme(self.resolve(preference));
        self.persist(preference);
        self.applied = Some(preference);
    }

    fn persist(&mut self, preference: Preference) {
        if let Err(err) = self.local.set(THEME_KEY, preference.as_str()) {
            tracing::warn!(%err, "failed to persist theme to local store");
        }
        if let Err(err) = self.cookies.set(THEME_KEY, preference.as_str()) {
            tracing::warn!(%err, "failed to persist theme cookie");
        }
    }
}

fn read_preference(store: &dyn PreferenceStore, which: &str) -> Option<Preference> {
    match store.get(THEME_KEY) {
        Ok(value) => value.as_deref().and_then(Preference::parse),
        Err(err) => {
            tracing::debug!(%err, store = which, "theme store unreadable");
            None
        }
    }
}

impl std::fmt::Debug for ThemeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeManager")
            .field("root", &self.root)
            .field("applied", &self.applied)
            .field("toggles", &self.toggles.borrow().len())
            .finish_non_exhaustive()
    }
}
