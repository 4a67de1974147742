use std::io::Write;

use owo_colors::OwoColorize;
use tracing::warn;

use crate::{
    orchestrator::{ProgressEvent, ProgressObserver},
    types::{DownloadProgress, SubtitleOutcome},
};

/// Print one line per handled video, then a summary table
pub struct ConsoleReporter<W: Write> {
    out: W,
    colored: bool,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout(colored: bool) -> Self {
        Self::new(std::io::stdout(), colored)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, colored: bool) -> Self {
        Self { out, colored }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn outcome_text(&self, outcome: &SubtitleOutcome) -> String {
        if !self.colored {
            return outcome.to_string();
        }

        match outcome {
            SubtitleOutcome::Downloaded { .. } => outcome.green().to_string(),
            SubtitleOutcome::Skipped(_) => outcome.dimmed().to_string(),
            SubtitleOutcome::NotAvailable => outcome.yellow().to_string(),
            SubtitleOutcome::Failed(_) => outcome.red().to_string(),
        }
    }

    /// Write the final statistics of the run
    pub fn summary(&mut self, progress: &DownloadProgress, cancelled: bool) -> std::io::Result<()> {
        let title = if cancelled {
            "Summary (cancelled)"
        } else {
            "Summary"
        };

        if self.colored {
            writeln!(self.out, "\n{}", title.bold())?;
        } else {
            writeln!(self.out, "\n{title}")?;
        }

        for (name, value) in summary_rows(progress) {
            writeln!(self.out, "  {name:<14}{value:>8}")?;
        }
        self.out.flush()
    }
}

fn summary_rows(progress: &DownloadProgress) -> [(&'static str, String); 7] {
    [
        ("Total", progress.total.to_string()),
        ("Processed", progress.processed.to_string()),
        ("Downloaded", progress.succeeded().to_string()),
        ("Skipped", progress.skipped.to_string()),
        ("Failed", progress.failed.to_string()),
        ("Remaining", progress.remaining().to_string()),
        ("Success rate", format!("{:.1}%", progress.success_rate())),
    ]
}

impl<W: Write> ProgressObserver for ConsoleReporter<W> {
    fn on_outcome(&mut self, event: &ProgressEvent<'_>) {
        let text = self.outcome_text(event.outcome);
        let res = writeln!(
            self.out,
            "[{}/{}] {} {text}",
            event.index, event.progress.total, event.video_id
        );

        if let Err(err) = res {
            warn!("Could not write progress: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use indoc::indoc;

    use super::*;
    use crate::types::{FailureReason, SkipReason, VideoId};

    #[test]
    fn one_line_per_outcome() {
        let mut reporter = ConsoleReporter::new(Vec::new(), false);
        let video_id = VideoId::parse("dQw4w9WgXcQ").unwrap();
        let mut progress = DownloadProgress::new(3);

        let outcomes = [
            SubtitleOutcome::Skipped(SkipReason::AlreadyExists),
            SubtitleOutcome::Downloaded {
                language: "en".parse().unwrap(),
                path: PathBuf::from("out/0002_dQw4w9WgXcQ_Title.en.vtt"),
            },
            SubtitleOutcome::Failed(FailureReason::Download("HTTP 429".to_owned())),
        ];
        for (pos, outcome) in outcomes.iter().enumerate() {
            progress.processed += 1;
            reporter.on_outcome(&ProgressEvent {
                index: pos + 1,
                video_id: &video_id,
                outcome,
                progress: &progress,
            });
        }

        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(
            out,
            indoc! {"
                [1/3] dQw4w9WgXcQ skipped (already downloaded)
                [2/3] dQw4w9WgXcQ downloaded [en] 0002_dQw4w9WgXcQ_Title.en.vtt
                [3/3] dQw4w9WgXcQ failed: HTTP 429
            "}
        );
    }

    #[test]
    fn summary_table() {
        let mut reporter = ConsoleReporter::new(Vec::new(), false);
        let progress = DownloadProgress {
            total: 10,
            processed: 9,
            skipped: 1,
            failed: 2,
            current: None,
        };

        reporter.summary(&progress, true).unwrap();

        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(out.starts_with("\nSummary (cancelled)\n"));
        assert!(out.contains("  Downloaded           6\n"));
        assert!(out.contains("  Remaining            1\n"));
        assert!(out.contains("  Success rate     75.0%\n"));
    }
}
