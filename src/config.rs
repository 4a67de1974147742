use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat};
use serde::Deserialize;
use tracing::Level;

use crate::{
    cli::Args,
    logging::parse_level,
    orchestrator::RunConfig,
    result::{Error, Result},
    types::LanguagePreferences,
};

/// Fully resolved settings: defaults, then the config file, then the CLI / environment
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub channel_url: String,
    pub languages: String,
    pub output_dir: PathBuf,
    pub min_wait: f64,
    pub max_wait: f64,
    pub cookies_from_browser: Option<String>,
    pub cache_file: Option<PathBuf>,
    pub force_refresh: bool,
    pub numbering: bool,
    pub clean_text: bool,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

fn path_value(path: &Option<PathBuf>) -> Option<String> {
    path.as_deref().map(|p| p.to_string_lossy().into_owned())
}

impl Settings {
    pub fn load(args: &Args) -> Result<Self> {
        Self::build(args).map_err(|err| Error::Configuration(err.to_string()))
    }

    fn build(args: &Args) -> std::result::Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("languages", "hi,en")?
            .set_default("output_dir", "subtitles")?
            .set_default("min_wait", 5.0)?
            .set_default("max_wait", 15.0)?
            .set_default("force_refresh", false)?
            .set_default("numbering", true)?
            .set_default("clean_text", false)?
            .set_default("log_level", "info")?;

        if let Some(path) = &args.config {
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
        }

        builder
            .set_override_option("channel_url", args.channel_url.clone())?
            .set_override_option("languages", args.languages.clone())?
            .set_override_option("output_dir", path_value(&args.output_dir))?
            .set_override_option("min_wait", args.min_wait)?
            .set_override_option("max_wait", args.max_wait)?
            .set_override_option("cookies_from_browser", args.cookies_from_browser.clone())?
            .set_override_option("cache_file", path_value(&args.cache_file))?
            .set_override_option("force_refresh", args.force_refresh.then_some(true))?
            .set_override_option("numbering", args.no_numbering.then_some(false))?
            .set_override_option("clean_text", args.clean_text.then_some(true))?
            .set_override_option("log_level", args.log_level.clone())?
            .set_override_option("log_file", path_value(&args.log_file))?
            .build()?
            .try_deserialize()
    }

    pub fn log_level(&self) -> Result<Level> {
        parse_level(&self.log_level)
            .ok_or_else(|| Error::Configuration(format!("Unknown log level {:?}", self.log_level)))
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Settings of the download run
    pub fn run_config(&self) -> Result<RunConfig> {
        let languages: LanguagePreferences = self
            .languages
            .parse()
            .map_err(|err| Error::Configuration(format!("Languages: {err}")))?;

        Ok(RunConfig {
            channel_url: self.channel_url.clone(),
            languages,
            out_dir: self.output_dir.clone(),
            min_wait_secs: self.min_wait,
            max_wait_secs: self.max_wait,
            cache_file: self.cache_file.clone(),
            force_refresh: self.force_refresh,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(channel_url: &str) -> Args {
        Args {
            channel_url: Some(channel_url.to_owned()),
            ..Args::default()
        }
    }

    #[test]
    fn defaults() {
        let settings = Settings::load(&args("https://www.youtube.com/@c")).unwrap();

        assert_eq!(settings.languages, "hi,en");
        assert_eq!(settings.output_dir, PathBuf::from("subtitles"));
        assert_eq!((settings.min_wait, settings.max_wait), (5.0, 15.0));
        assert!(settings.numbering);
        assert!(!settings.clean_text && !settings.force_refresh);
        assert_eq!(settings.cache_file, None);
        assert_eq!(settings.log_level().unwrap(), Level::INFO);

        let run = settings.run_config().unwrap();
        assert_eq!(run.languages.to_string(), "hi,en");
    }

    #[test]
    fn file_then_cli_override() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("autosubs.toml");
        std::fs::write(
            &file,
            indoc::indoc! {r#"
                channel_url = "https://www.youtube.com/@from-file"
                languages = "es"
                min_wait = 1.0
                max_wait = 2.0
                numbering = false
                cache_file = "ids.txt"
            "#},
        )
        .unwrap();

        let args = Args {
            config: Some(file),
            languages: Some("de,en".to_owned()),
            max_wait: Some(3.0),
            clean_text: true,
            ..Args::default()
        };
        let settings = Settings::load(&args).unwrap();

        assert_eq!(settings.channel_url, "https://www.youtube.com/@from-file");
        assert_eq!(settings.languages, "de,en");
        assert_eq!((settings.min_wait, settings.max_wait), (1.0, 3.0));
        assert!(!settings.numbering);
        assert!(settings.clean_text);
        assert_eq!(settings.cache_file, Some(PathBuf::from("ids.txt")));
    }

    #[test]
    fn missing_channel_is_a_configuration_error() {
        assert!(matches!(
            Settings::load(&Args::default()),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn bad_values_are_configuration_errors() {
        let mut settings = Settings::load(&args("url")).unwrap();
        settings.languages = "en,???".to_owned();
        assert!(matches!(settings.run_config(), Err(Error::Configuration(_))));

        settings.log_level = "loud".to_owned();
        assert!(matches!(settings.log_level(), Err(Error::Configuration(_))));
    }
}
