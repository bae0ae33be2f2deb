use std::cell::RefCell;
use std::rc::Rc;

use inkshade::config::StorePaths;
use inkshade::theme::scheme::{FixedScheme, SchemeSwitch};
use inkshade::theme::store::{CookieFile, FileStore, PreferenceStore};
use inkshade::theme::{Preference, ResolvedTheme, THEME_KEY, ThemeManager, ThemeRoot};

fn manager_in(dir: &std::path::Path, dark: bool) -> ThemeManager {
    let paths = StorePaths::in_dir(dir);
    ThemeManager::builder()
        .local_store(FileStore::new(paths.local))
        .cookie_store(CookieFile::new(paths.cookies))
        .scheme(FixedScheme { dark })
        .toggle_buttons(2)
        .build()
}

#[test]
fn test_preference_survives_restart_through_files() {
    let dir = tempfile::tempdir().unwrap();
    for preference in Preference::ALL {
        let mut first = manager_in(dir.path(), true);
        first.init();
        first.set_preference(preference);

        let fresh = manager_in(dir.path(), true);
        assert_eq!(fresh.resolve_initial().0, preference);
    }
}

#[test]
fn test_cookie_file_used_when_local_store_is_gone() {
    let dir = tempfile::tempdir().unwrap();
    let paths = StorePaths::in_dir(dir.path());
    let mut manager = manager_in(dir.path(), false);
    manager.set_preference(Preference::Dark);

    std::fs::remove_file(&paths.local).unwrap();
    let cookie = CookieFile::new(&paths.cookies);
    assert_eq!(cookie.get(THEME_KEY).unwrap().as_deref(), Some("dark"));

    let fresh = manager_in(dir.path(), false);
    assert_eq!(
        fresh.resolve_initial(),
        (Preference::Dark, ResolvedTheme::Dark)
    );
}

#[test]
fn test_second_instance_picks_up_change() {
    let dir = tempfile::tempdir().unwrap();
    let mut watcher_side = manager_in(dir.path(), false);
    watcher_side.init();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    watcher_side.subscribe(move |event| sink.borrow_mut().push(*event));

    let mut other = manager_in(dir.path(), false);
    other.init();
    other.set_preference(Preference::Dark);

    let event = watcher_side.reload_from_store().expect("change detected");
    assert_eq!(event.theme, Preference::Dark);
    assert_eq!(watcher_side.root().theme_attr(), Some("dark"));
    assert_eq!(watcher_side.reload_from_store(), None);
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_corrupt_store_file_falls_back_and_is_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let paths = StorePaths::in_dir(dir.path());
    std::fs::write(&paths.local, "{ not json").unwrap();

    let mut manager = ThemeManager::builder()
        .local_store(FileStore::new(&paths.local))
        .cookie_store(CookieFile::new(&paths.cookies))
        .root(ThemeRoot::with_server_theme("dark"))
        .build();
    assert_eq!(manager.resolve_initial().0, Preference::Dark);

    manager.set_preference(Preference::Light);
    let store = FileStore::new(&paths.local);
    assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
}

#[test]
fn test_toggle_labels_follow_cycle_and_auto_tracks_scheme() {
    let dir = tempfile::tempdir().unwrap();
    let paths = StorePaths::in_dir(dir.path());
    let scheme = SchemeSwitch::new(false);
    let mut manager = ThemeManager::builder()
        .local_store(FileStore::new(paths.local))
        .cookie_store(CookieFile::new(paths.cookies))
        .scheme(scheme.clone())
        .toggle_buttons(2)
        .build();
    manager.init();
    manager.set_preference(Preference::Light);

    manager.activate_toggle();
    let buttons = manager.toggle_buttons();
    assert!(buttons.iter().all(|b| b.label.ends_with("Dark")));

    manager.activate_toggle();
    assert_eq!(manager.preference(), Preference::Auto);
    assert_eq!(manager.current_theme(), ResolvedTheme::Light);

    scheme.set_dark(true);
    let event = manager.on_system_scheme_change(true).expect("auto follows");
    assert_eq!(event.actual_theme, ResolvedTheme::Dark);
    assert_eq!(
        manager.toggle_buttons()[0].aria_label,
        "Switch theme: currently Auto"
    );
}
