pub mod preferences;

pub use preferences::{
    CapturePreferences, Preferences, PreferencesError, PreferencesStore, PreviewPreferences,
    SitePreferences, PREFERENCES_FILE,
};
