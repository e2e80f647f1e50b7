// config.rs — command line and environment configuration for the viewer binary
//
//     anywheredoor [URL|PATH] [--url URL] [--autoplay] [--muted] [--no-controls] [--lang CODE]

use crate::error::ConfigError;
use crate::i18n::FALLBACK_LANG;
use crate::viewer::ViewerConfig;

pub const LANG_ENV: &str = "ANYWHEREDOOR_LANG";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `None` means ask with a file dialog.
    pub source: Option<String>,
    pub autoplay: bool,
    pub muted: bool,
    pub show_controls: bool,
    pub lang: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: None,
            autoplay: false,
            muted: false,
            show_controls: true,
            lang: FALLBACK_LANG.to_string(),
        }
    }
}

impl AppConfig {
    /// Parses arguments (without the program name). `env_lang` is the value
    /// of [`LANG_ENV`], used when `--lang` is absent.
    pub fn from_args<I>(args: I, env_lang: Option<String>) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = AppConfig::default();
        let mut lang = None;
        let mut it = args.into_iter();

        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--autoplay" => config.autoplay = true,
                "--muted" => config.muted = true,
                "--no-controls" => config.show_controls = false,
                "--lang" => {
                    let code = it.next().ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                    lang = Some(code);
                }
                "--url" => {
                    let url = it.next().ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                    config.set_source(url)?;
                }
                opt if opt.starts_with("--") => {
                    return Err(ConfigError::UnknownOption(opt.to_string()));
                }
                source => config.set_source(source.to_string())?,
            }
        }

        config.lang = lang
            .or_else(|| env_lang.filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| FALLBACK_LANG.to_string());
        Ok(config)
    }

    /// Reads the process arguments and environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_args(std::env::args().skip(1), std::env::var(LANG_ENV).ok())
    }

    fn set_source(&mut self, source: String) -> Result<(), ConfigError> {
        if self.source.is_some() {
            return Err(ConfigError::DuplicateSource(source));
        }
        self.source = Some(source);
        Ok(())
    }

    pub fn viewer_config(&self, url: impl Into<String>) -> ViewerConfig {
        ViewerConfig {
            url: url.into(),
            autoplay: self.autoplay,
            muted: self.muted,
            show_controls: self.show_controls,
        }
    }
}
