use std::collections::HashMap;

pub const SOUND_KEY: &str = "soundEnabled";
pub const THEME_KEY: &str = "theme";

/// String key/value persistence, `localStorage` in the browser.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

impl KeyValueStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s == "dark" { Theme::Dark } else { Theme::Light }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    /// Element id of the ambient track played with this theme.
    pub fn ambient_track(self) -> &'static str {
        match self {
            Theme::Light => "light-ambient",
            Theme::Dark => "dark-ambient",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Preferences {
    pub sound_enabled: bool,
    pub theme: Theme,
}

impl Preferences {
    /// Read saved preferences. Embedded views never play sound.
    pub fn load(store: &impl KeyValueStore, embedded: bool) -> Self {
        Preferences {
            sound_enabled: !embedded && store.get(SOUND_KEY).as_deref() == Some("true"),
            theme: store.get(THEME_KEY).map(|t| Theme::parse(&t)).unwrap_or_default(),
        }
    }

    pub fn toggle_sound(&mut self, store: &mut impl KeyValueStore) -> bool {
        self.sound_enabled = !self.sound_enabled;
        store.set(SOUND_KEY, if self.sound_enabled { "true" } else { "false" });
        self.sound_enabled
    }

    pub fn toggle_theme(&mut self, store: &mut impl KeyValueStore) -> Theme {
        self.theme = self.theme.toggled();
        store.set(THEME_KEY, self.theme.as_str());
        self.theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_saved() {
        let store: HashMap<String, String> = HashMap::new();
        assert_eq!(Preferences::load(&store, false), Preferences::default());
    }

    #[test]
    fn toggles_persist() {
        let mut store: HashMap<String, String> = HashMap::new();
        let mut prefs = Preferences::load(&store, false);
        assert!(prefs.toggle_sound(&mut store));
        assert_eq!(prefs.toggle_theme(&mut store), Theme::Dark);

        let reloaded = Preferences::load(&store, false);
        assert!(reloaded.sound_enabled);
        assert_eq!(reloaded.theme.ambient_track(), "dark-ambient");
        assert!(!Preferences::load(&store, true).sound_enabled);
    }
}
