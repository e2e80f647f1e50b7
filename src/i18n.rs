// i18n.rs — runtime UI strings
//
// English and the catalogs under assets/i18n/ ship inside the binary.
// Overrides for any language are read from either
//   assets/i18n/<lang>.json            { "key": "value" }
//   assets/i18n.json                   { "<lang>": { "key": "value" } }
// searched next to the executable first, then in the working directory.
// Lookup order: selected language, then English, then the key itself.

use once_cell::sync::{Lazy, OnceCell};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

pub const FALLBACK_LANG: &str = "en";

/// Languages offered in the Language menu: (code, native name).
pub const LANGUAGES: [(&str, &str); 8] = [
    ("en", "English"),
    ("zh-Hans", "简体中文"),
    ("zh-Hant", "繁體中文"),
    ("ja", "日本語"),
    ("ko", "한국어"),
    ("fr", "Français"),
    ("de", "Deutsch"),
    ("es", "Español"),
];

/// Catalogs compiled in for every non-English entry of `LANGUAGES`.
const BUNDLED: [(&str, &str); 7] = [
    ("zh-Hans", include_str!("../assets/i18n/zh-Hans.json")),
    ("zh-Hant", include_str!("../assets/i18n/zh-Hant.json")),
    ("ja", include_str!("../assets/i18n/ja.json")),
    ("ko", include_str!("../assets/i18n/ko.json")),
    ("fr", include_str!("../assets/i18n/fr.json")),
    ("de", include_str!("../assets/i18n/de.json")),
    ("es", include_str!("../assets/i18n/es.json")),
];

static BUILTIN_EN: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("app.title", "AnyWhereDoor - 360° Video Viewer"),
        ("menu.file", "File"),
        ("menu.open_video", "Open Video…"),
        ("menu.open_url", "Open URL…"),
        ("menu.exit", "Exit"),
        ("menu.view", "View"),
        ("menu.language", "Language"),
        ("view.reset", "Reset View"),
        ("view.fullscreen.enter", "Enter Fullscreen"),
        ("view.fullscreen.exit", "Exit Fullscreen"),
        ("file.filter.videos", "Videos"),
        ("file.pick_title", "Choose a 360° video"),
        ("status.loading", "Loading 360° Video..."),
        ("status.hint", "Drag to look around • Scroll to zoom"),
        ("status.error", "Could not play this video: {err}"),
        ("control.play", "Play"),
        ("control.pause", "Pause"),
        ("control.fullscreen", "Fullscreen"),
        ("control.volume", "Volume"),
        ("url.title", "Open URL"),
        ("url.open", "Open"),
        ("url.cancel", "Cancel"),
        ("error.title", "AnyWhereDoor"),
        ("error.open_failed", "Could not open {url}:\n{err}"),
        ("error.no_source", "No video selected."),
        ("error.bad_args", "Invalid command line: {err}"),
        ("font.not_found", "no system font with wide script coverage found, using egui defaults"),
        ("font.using", "using UI font {path}"),
    ])
});

#[derive(Debug, Clone)]
pub struct I18n {
    pub lang: String,
    map: HashMap<String, String>,
}

impl I18n {
    /// English only, without touching the filesystem.
    pub fn builtin() -> Self {
        Self::from_layers(FALLBACK_LANG, Vec::new())
    }

    /// Built-in English, then each layer on top; later layers win.
    pub fn from_layers(lang: &str, layers: Vec<HashMap<String, String>>) -> Self {
        let mut map: HashMap<String, String> = BUILTIN_EN
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for layer in layers {
            map.extend(layer);
        }
        Self {
            lang: lang.to_string(),
            map,
        }
    }

    pub fn load(lang: &str) -> Self {
        let mut layers = Vec::new();
        if lang != FALLBACK_LANG {
            layers.push(load_lang(FALLBACK_LANG));
        }
        let bundled = bundled_lang(lang);
        let selected = load_lang(lang);
        if bundled.is_empty() && selected.is_empty() && lang != FALLBACK_LANG {
            log::warn!("no translations found for {lang}, falling back to {FALLBACK_LANG}");
        }
        layers.push(bundled);
        layers.push(selected);
        Self::from_layers(lang, layers)
    }

    pub fn get(&self, key: &str) -> String {
        self.map
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Substitutes `{name}` placeholders; unknown placeholders stay as-is.
    pub fn format(&self, key: &str, args: &[(&str, String)]) -> String {
        let mut s = self.get(key);
        for (name, value) in args {
            s = s.replace(&format!("{{{name}}}"), value);
        }
        s
    }
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

fn load_json_map(path: &Path) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(map) => Some(map),
        Err(err) => {
            log::warn!("ignoring {}: {err}", path.display());
            None
        }
    }
}

fn load_multi_lang_json(path: &Path, lang: &str) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    let mut all: HashMap<String, HashMap<String, String>> = match serde_json::from_str(&text) {
        Ok(all) => all,
        Err(err) => {
            log::warn!("ignoring {}: {err}", path.display());
            return None;
        }
    };
    all.remove(lang)
}

fn bundled_lang(lang: &str) -> HashMap<String, String> {
    let Some((_, text)) = BUNDLED.iter().find(|(code, _)| *code == lang) else {
        return HashMap::new();
    };
    serde_json::from_str(text).unwrap_or_else(|err| {
        log::warn!("bundled {lang} catalog is invalid: {err}");
        HashMap::new()
    })
}

fn find_asset(relative: &Path) -> Option<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    exe_dir
        .into_iter()
        .chain(std::iter::once(PathBuf::new()))
        .map(|dir| dir.join("assets").join(relative))
        .find(|p| p.exists())
}

fn load_lang(lang: &str) -> HashMap<String, String> {
    let per_lang = Path::new("i18n").join(format!("{lang}.json"));
    if let Some(map) = find_asset(&per_lang).and_then(|p| load_json_map(&p)) {
        return map;
    }
    find_asset(Path::new("i18n.json"))
        .and_then(|p| load_multi_lang_json(&p, lang))
        .unwrap_or_default()
}

/// Loads `lang` as the global catalog. Later calls replace it.
pub fn init(lang: impl Into<String>) {
    let catalog = I18n::load(&lang.into());
    log::debug!("ui language set to {}", catalog.lang);

    let lock = I18N.get_or_init(|| RwLock::new(I18n::builtin()));
    if let Ok(mut current) = lock.write() {
        *current = catalog;
    }
}

pub fn current_lang() -> String {
    I18N.get()
        .and_then(|l| l.read().ok().map(|i| i.lang.clone()))
        .unwrap_or_else(|| FALLBACK_LANG.to_string())
}

/// Localized text for `key`; built-in English before `init`.
pub fn tr(key: &str) -> String {
    match I18N.get().and_then(|l| l.read().ok()) {
        Some(i) => i.get(key),
        None => BUILTIN_EN
            .get(key)
            .map(|v| v.to_string())
            .unwrap_or_else(|| key.to_string()),
    }
}

pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    match I18N.get().and_then(|l| l.read().ok()) {
        Some(i) => i.format(key, args),
        None => I18n::builtin().format(key, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_viewer_strings() {
        let i = I18n::builtin();
        assert_eq!(i.get("status.loading"), "Loading 360° Video...");
        assert_eq!(i.get("status.hint"), "Drag to look around • Scroll to zoom");
    }

    #[test]
    fn missing_key_returns_key() {
        assert_eq!(I18n::builtin().get("no.such.key"), "no.such.key");
    }

    #[test]
    fn later_layers_override_earlier_ones() {
        let fr = HashMap::from([("menu.file".to_string(), "Fichier".to_string())]);
        let i = I18n::from_layers("fr", vec![fr]);
        assert_eq!(i.get("menu.file"), "Fichier");
        // Untranslated keys fall through to English.
        assert_eq!(i.get("menu.view"), "View");
    }

    #[test]
    fn placeholders_are_substituted() {
        let i = I18n::builtin();
        let s = i.format(
            "error.open_failed",
            &[("url", "a.mp4".to_string()), ("err", "404".to_string())],
        );
        assert_eq!(s, "Could not open a.mp4:\n404");

        let partial = i.format("error.open_failed", &[("url", "a.mp4".to_string())]);
        assert!(partial.ends_with("{err}"));
    }

    #[test]
    fn every_offered_language_has_a_complete_catalog() {
        for (code, _) in LANGUAGES.iter().filter(|(c, _)| *c != FALLBACK_LANG) {
            let catalog = bundled_lang(code);
            assert!(!catalog.is_empty(), "{code} has no catalog");
            for key in catalog.keys() {
                assert!(BUILTIN_EN.contains_key(key.as_str()), "{code}: unknown key {key}");
            }
            for key in ["menu.file", "status.loading", "status.hint", "control.play"] {
                assert!(catalog.contains_key(key), "{code}: missing {key}");
            }
        }
    }

    #[test]
    fn bundled_catalog_layers_over_english() {
        let i = I18n::from_layers("de", vec![bundled_lang("de")]);
        assert_eq!(i.get("menu.file"), "Datei");
        assert_eq!(i.get("font.using"), "using UI font {path}");
    }
}
