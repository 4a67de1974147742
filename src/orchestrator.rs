use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    cache::{merge_ids, VideoCache},
    cancel::Cancellation,
    cleanup::TextCleanup,
    io::staging_dir,
    naming::FilenameGenerator,
    outside::{FetchResult, SubtitleFetcher, VideoSource},
    rate_limit::RateLimiter,
    repository::SubtitleRepository,
    result::{Error, Result},
    types::{
        DownloadProgress, FailureReason, LanguageCode, LanguagePreferences, SkipReason,
        SubtitleOutcome, VideoId, VideoRecord,
    },
};

/// Extension assumed when the downloaded artifact has none
const DEFAULT_EXTENSION: &str = "vtt";

/// Settings of one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub channel_url: String,
    pub languages: LanguagePreferences,
    pub out_dir: PathBuf,
    pub min_wait_secs: f64,
    pub max_wait_secs: f64,
    pub cache_file: Option<PathBuf>,
    pub force_refresh: bool,
}

/// Where the orchestrator is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initializing,
    ListingResolved,
    Processing,
    Finalizing,
    Done,
    Aborted,
}

/// Emitted after every handled candidate
#[derive(Debug)]
pub struct ProgressEvent<'a> {
    /// 1-based position in the candidate list
    pub index: usize,
    pub video_id: &'a VideoId,
    pub outcome: &'a SubtitleOutcome,
    pub progress: &'a DownloadProgress,
}

/// Receive the progress of a run, e.g. to display it
pub trait ProgressObserver {
    fn on_outcome(&mut self, event: &ProgressEvent<'_>);
}

/// Final state of a run
#[derive(Debug)]
pub struct RunReport {
    pub progress: DownloadProgress,
    /// One outcome per handled candidate, in candidate order
    pub outcomes: Vec<(VideoId, SubtitleOutcome)>,
    /// Whether the run stopped early because of a cancellation
    pub cancelled: bool,
}

/// Drive the download of the subtitles of a whole channel.
///
/// Videos are handled one after the other, with a random pause between two downloads.
/// The run can be resumed: already downloaded videos are skipped and the
/// channel listing can be read back from the cache file.
pub struct Orchestrator<'a> {
    config: RunConfig,
    source: &'a dyn VideoSource,
    fetcher: &'a dyn SubtitleFetcher,
    repository: &'a dyn SubtitleRepository,
    names: &'a dyn FilenameGenerator,
    cleanup: Option<&'a dyn TextCleanup>,
    observer: Option<&'a mut dyn ProgressObserver>,
    cancel: Cancellation,
    stage: Stage,
    /// Statistics as of the Finalizing stage, kept even if the run then fails
    final_progress: Option<DownloadProgress>,
}

/// Output of the listing resolution
struct Listing {
    /// Content of the cache before this run
    prior: Vec<VideoId>,
    /// Videos to handle, in order
    candidates: Vec<VideoId>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: RunConfig,
        source: &'a dyn VideoSource,
        fetcher: &'a dyn SubtitleFetcher,
        repository: &'a dyn SubtitleRepository,
        names: &'a dyn FilenameGenerator,
        cancel: Cancellation,
    ) -> Self {
        Self {
            config,
            source,
            fetcher,
            repository,
            names,
            cleanup: None,
            observer: None,
            cancel,
            stage: Stage::Initializing,
            final_progress: None,
        }
    }

    /// Convert every downloaded subtitle with this cleanup step
    pub fn with_cleanup(mut self, cleanup: &'a dyn TextCleanup) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    pub fn with_observer(mut self, observer: &'a mut dyn ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Statistics of the run, available once it reached the Finalizing stage.
    ///
    /// Unlike the [`RunReport`], they survive a run aborted during processing.
    pub fn final_progress(&self) -> Option<&DownloadProgress> {
        self.final_progress.as_ref()
    }

    /// Execute the whole run.
    ///
    /// Per-video problems are recorded in the report. Only configuration,
    /// listing, and output directory problems make the run fail.
    pub fn run(&mut self) -> Result<RunReport> {
        let res = self.run_stages();
        self.enter(if res.is_ok() {
            Stage::Done
        } else {
            Stage::Aborted
        });
        res
    }

    fn enter(&mut self, stage: Stage) {
        debug!("Stage {:?} -> {stage:?}", self.stage);
        self.stage = stage;
    }

    fn run_stages(&mut self) -> Result<RunReport> {
        self.enter(Stage::Initializing);
        let limiter = self.initialize()?;

        let listing = self.resolve_listing()?;
        self.enter(Stage::ListingResolved);

        // From now on, whatever happens, the discovered IDs are written back
        let processed = self.process(&listing.candidates, &limiter);

        self.enter(Stage::Finalizing);
        self.flush_cache(&listing.prior, &listing.candidates);
        self.final_progress = Some(match &processed {
            Ok(report) => report.progress.clone(),
            Err(_) => DownloadProgress::new(listing.candidates.len()),
        });

        let report = processed?;
        info!("Run finished: {}", report.progress);
        Ok(report)
    }

    /// Validate the configuration before any work is done
    fn initialize(&self) -> Result<RateLimiter> {
        if self.config.languages.is_empty() {
            return Err(Error::Configuration(
                "At least one subtitle language is required".to_owned(),
            ));
        }

        let limiter = RateLimiter::new(self.config.min_wait_secs, self.config.max_wait_secs)
            .map_err(|err| Error::Configuration(format!("Wait times: {err}")))?;

        std::fs::create_dir_all(&self.config.out_dir).map_err(|err| {
            Error::Configuration(format!(
                "Could not create output directory {}: {err}",
                self.config.out_dir.display()
            ))
        })?;

        Ok(limiter)
    }

    fn resolve_listing(&self) -> Result<Listing> {
        let prior = match &self.config.cache_file {
            Some(path) if VideoCache::exists(path) => VideoCache::load(path).unwrap_or_else(|err| {
                warn!("{err}. Ignoring the cache");
                Vec::new()
            }),
            Some(path) => {
                debug!("No cache file at {}", path.display());
                Vec::new()
            }
            None => Vec::new(),
        };

        if !self.config.force_refresh && !prior.is_empty() {
            info!("{} videos loaded from the cache", prior.len());
            return Ok(Listing {
                candidates: prior.clone(),
                prior,
            });
        }

        info!("Get the channel videos ID");
        let listing = self
            .source
            .list_channel_videos(&self.config.channel_url, &self.cancel)?;
        let candidates = merge_ids(&[], &listing);
        info!("{} videos in the channel", candidates.len());

        self.save_cache(&merge_ids(&prior, &candidates));

        Ok(Listing { prior, candidates })
    }

    fn save_cache(&self, ids: &[VideoId]) {
        if let Some(path) = &self.config.cache_file {
            if let Err(err) = VideoCache::save(path, ids) {
                // The cache only saves time, losing it is not worth failing the run
                warn!("{err}");
            }
        }
    }

    fn flush_cache(&self, prior: &[VideoId], candidates: &[VideoId]) {
        self.save_cache(&merge_ids(prior, candidates));
    }

    fn process(&mut self, candidates: &[VideoId], limiter: &RateLimiter) -> Result<RunReport> {
        self.enter(Stage::Processing);

        let mut report = RunReport {
            progress: DownloadProgress::new(candidates.len()),
            outcomes: Vec::with_capacity(candidates.len()),
            cancelled: false,
        };

        if candidates.is_empty() {
            warn!("No video found in the channel");
            return Ok(report);
        }

        let existing = self.repository.downloaded_ids()?;
        info!(
            "{} of {} videos already downloaded",
            candidates.iter().filter(|id| existing.contains(*id)).count(),
            candidates.len()
        );

        let staging = staging_dir(&self.config.out_dir)
            .map_err(|_| Error::OutputDirUnavailable(self.config.out_dir.clone()))?;

        let mut attempted = false;
        for (pos, video_id) in candidates.iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let index = pos + 1;
            report.progress.current = Some(video_id.clone());

            let outcome = if existing.contains(video_id) {
                debug!("Video {video_id} already downloaded. Skipping it");
                SubtitleOutcome::Skipped(SkipReason::AlreadyExists)
            } else {
                if attempted && !limiter.wait(&self.cancel)? {
                    report.cancelled = true;
                    break;
                }
                attempted = true;

                info!("[{index}/{}] Downloading subtitle of {video_id}", candidates.len());
                self.attempt(index, video_id, staging.path())
            };

            match &outcome {
                SubtitleOutcome::Skipped(_) => report.progress.record_skip(),
                outcome if outcome.is_failure() => {
                    warn!("Video {video_id}: {outcome}");
                    report.progress.record_failure()
                }
                outcome => {
                    info!("Video {video_id}: {outcome}");
                    report.progress.record_success()
                }
            }

            if let Some(observer) = self.observer.as_mut() {
                observer.on_outcome(&ProgressEvent {
                    index,
                    video_id,
                    outcome: &outcome,
                    progress: &report.progress,
                });
            }

            let was_cancelled = outcome == SubtitleOutcome::Failed(FailureReason::Cancelled);
            report.outcomes.push((video_id.clone(), outcome));
            if was_cancelled {
                report.cancelled = true;
                break;
            }
        }

        report.progress.current = None;
        if report.cancelled {
            warn!("Run cancelled, stopping after {} videos", report.progress.processed);
        }
        Ok(report)
    }

    /// Try every wanted language in order until one is available
    fn attempt(&self, index: usize, video_id: &VideoId, staging: &Path) -> SubtitleOutcome {
        for language in self.config.languages.iter() {
            debug!("Trying language '{language}' for {video_id}");

            match self
                .fetcher
                .fetch_subtitle(video_id, language, staging, &self.cancel)
            {
                Ok(FetchResult::LanguageUnavailable) => {
                    debug!("No '{language}' subtitle for {video_id}");
                }
                Ok(FetchResult::Downloaded(artifact)) => {
                    return self.store(index, video_id, language, &artifact)
                }
                Err(Error::Cancelled) => return SubtitleOutcome::Failed(FailureReason::Cancelled),
                Err(err) => return SubtitleOutcome::Failed(FailureReason::Download(err.to_string())),
            }
        }

        SubtitleOutcome::NotAvailable
    }

    /// Name, move in place, and optionally clean the downloaded artifact
    fn store(
        &self,
        index: usize,
        video_id: &VideoId,
        language: &LanguageCode,
        artifact: &Path,
    ) -> SubtitleOutcome {
        let record = match self.source.get_metadata(video_id, &self.cancel) {
            Ok(record) => record,
            // The track is already there, keep it. The run stops before the next video.
            Err(Error::Cancelled) => {
                debug!("Metadata lookup of {video_id} cancelled, using a placeholder title");
                VideoRecord::untitled(video_id.clone())
            }
            Err(err) => {
                warn!("Could not get metadata of {video_id}, using a placeholder title: {err}");
                VideoRecord::untitled(video_id.clone())
            }
        };

        let extension = artifact
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(DEFAULT_EXTENSION);
        let filename =
            self.names
                .generate(Some(index), video_id, &record.title, language, extension);

        let mut path = match self.repository.persist(video_id, artifact, &filename) {
            Ok(path) => path,
            Err(err) => return SubtitleOutcome::Failed(FailureReason::Download(err.to_string())),
        };

        if let Some(cleanup) = self.cleanup {
            match cleanup.clean_file(&path) {
                Ok(cleaned) => path = cleaned,
                // The raw subtitle stays in place
                Err(err) => return SubtitleOutcome::Failed(FailureReason::Cleanup(err.to_string())),
            }
        }

        SubtitleOutcome::Downloaded {
            language: language.clone(),
            path,
        }
    }
}
