use std::path::PathBuf;

use clap::Parser;
use indoc::indoc;

macro_rules! arg_env {
    ($v:literal) => {
        concat!("AUTOSUBS_", $v)
    };
}

/// Wrapper-tool around `yt-dlp` to collect the auto-generated subtitles of a whole channel.
///
/// Already downloaded videos are skipped, so the tool can be stopped and
/// restarted at any time.
#[derive(Parser, Debug, Default)]
#[command(
    version,
    after_help = indoc!("
        Examples:
          # Hindi subtitles, falling back to English
          autosubs 'https://www.youtube.com/@channel/videos' --lang hi,en

          # Plain text output in a specific directory
          autosubs 'URL' --output-dir ./subs --clean-text

          # Use the browser cookies and keep the video list between runs
          autosubs 'URL' --cookies-from-browser firefox --cache-file ./cache.txt
    ")
)]
pub struct Args {
    /// The URL of the channel (or playlist) whose videos subtitles are wanted
    #[arg(env = arg_env!("CHANNEL_URL"))]
    pub channel_url: Option<String>,

    /// Comma-separated languages, by order of preference [default: hi,en]
    #[arg(long = "lang", env = arg_env!("LANG"))]
    pub languages: Option<String>,

    /// The path to the output directory [default: subtitles]
    #[arg(long, env = arg_env!("OUTPUT_DIR"))]
    pub output_dir: Option<PathBuf>,

    /// Minimum number of seconds to wait between two downloads [default: 5]
    #[arg(long, env = arg_env!("MIN_WAIT"))]
    pub min_wait: Option<f64>,

    /// Maximum number of seconds to wait between two downloads [default: 15]
    #[arg(long, env = arg_env!("MAX_WAIT"))]
    pub max_wait: Option<f64>,

    /// Name of the browser to take the cookies from (e.g. firefox, chrome)
    #[arg(long, env = arg_env!("COOKIES_FROM_BROWSER"))]
    pub cookies_from_browser: Option<String>,

    /// The path to the cache file, avoiding listing the channel videos on every run
    #[arg(long, env = arg_env!("CACHE_FILE"))]
    pub cache_file: Option<PathBuf>,

    /// List the channel videos again even if the cache file exists
    #[arg(long, env = arg_env!("FORCE_REFRESH"))]
    pub force_refresh: bool,

    /// Do not prefix the filenames with the position of the video in the channel
    #[arg(long, env = arg_env!("NO_NUMBERING"))]
    pub no_numbering: bool,

    /// Convert the subtitles into deduplicated plain text
    #[arg(long, visible_alias = "clean-txt", env = arg_env!("CLEAN_TEXT"))]
    pub clean_text: bool,

    /// Logging level: trace, debug, info, warning, error [default: info]
    #[arg(long, env = arg_env!("LOG_LEVEL"))]
    pub log_level: Option<String>,

    /// Also write the logs to this file
    #[arg(long, env = arg_env!("LOG_FILE"))]
    pub log_file: Option<PathBuf>,

    /// TOML file providing default values for the options above
    #[arg(long, env = arg_env!("CONFIG"))]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_all_options() {
        let args = Args::try_parse_from([
            "autosubs",
            "https://www.youtube.com/@chan/videos",
            "--lang",
            "es,en",
            "--output-dir",
            "out",
            "--min-wait",
            "1",
            "--max-wait",
            "2.5",
            "--cookies-from-browser",
            "firefox",
            "--cache-file",
            "cache.txt",
            "--force-refresh",
            "--no-numbering",
            "--clean-txt",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(
            args.channel_url.as_deref(),
            Some("https://www.youtube.com/@chan/videos")
        );
        assert_eq!(args.languages.as_deref(), Some("es,en"));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.min_wait, Some(1.0));
        assert_eq!(args.max_wait, Some(2.5));
        assert_eq!(args.cookies_from_browser.as_deref(), Some("firefox"));
        assert!(args.force_refresh && args.no_numbering && args.clean_text);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.log_file, None);
    }

    #[test]
    fn rejects_non_numeric_wait() {
        assert!(Args::try_parse_from(["autosubs", "url", "--min-wait", "soon"]).is_err());
    }
}
