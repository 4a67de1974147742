//! Collect the auto-generated subtitles of every video of a channel, through `yt-dlp`.
//!
//! The [`orchestrator::Orchestrator`] drives a run over abstract collaborators
//! (video source, subtitle fetcher, repository, filename generator) so the
//! binary wires the real ones from [`outside`], and tests wire fakes.

pub mod already_downloaded;
pub mod cache;
pub mod cancel;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod io;
pub mod logging;
pub mod naming;
pub mod orchestrator;
pub mod outside;
pub mod rate_limit;
pub mod report;
pub mod repository;
pub mod result;
pub mod types;
