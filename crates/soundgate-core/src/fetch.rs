//! Media retrieval via yt-dlp.
//!
//! [`YtdlpFetcher`] runs yt-dlp as a child process and hands back a
//! [`FetchedArtifact`], a guard that owns the downloaded file until it is
//! released. Failures are classified into [`FetchFailure`] so callers can pick
//! a matching user message.

use crate::config::GateSettings;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// File name prefix of every artifact written by the fetcher
pub const ARTIFACT_PREFIX: &str = "sg-";

/// JSON line printed by yt-dlp once the final file is in place
const REPORT_TEMPLATE: &str = "after_move:%(.{title,uploader,duration,filepath})j";

/// Error fragments meaning the track exists but may not be downloaded
const RESTRICTED_PATTERNS: &[&str] = &[
    "is private",
    "private track",
    "private video",
    "sign in",
    "login required",
    "http error 401",
    "http error 403",
    "geo-restricted",
    "geo restricted",
    "not available in your country",
    "blocked it in your country",
    "members-only",
    "go+ subscription",
    "copyright",
];

/// Error fragments meaning the track does not exist (anymore)
const UNAVAILABLE_PATTERNS: &[&str] = &[
    "http error 404",
    "http error 410",
    "unsupported url",
    "is not a valid url",
    "unable to extract",
    "removed",
    "no longer available",
    "does not exist",
    "is not available",
];

/// Error fragments for transient network trouble
const TRANSIENT_PATTERNS: &[&str] = &[
    "connection reset",
    "connection refused",
    "connection timed out",
    "timed out",
    "unable to download webpage",
    "http error 429",
    "http error 500",
    "http error 502",
    "http error 503",
    "http error 504",
    "network is unreachable",
    "temporary failure in name resolution",
    "name or service not known",
];

/// Class of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    /// The resource is gone or the URL is not a track
    Unavailable,
    /// The resource is private, geo-blocked or otherwise restricted
    Restricted,
    /// Network or rate-limit trouble; retrying later may work
    Transient,
    /// Anything else
    Unknown,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unavailable => "resource unavailable",
            Self::Restricted => "resource restricted",
            Self::Transient => "transient failure",
            Self::Unknown => "unknown failure",
        })
    }
}

/// Error returned by a media fetch
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    /// Failure class
    pub kind: FetchFailure,
    /// Diagnostic detail for logs
    pub message: String,
}

impl FetchError {
    /// Create a new fetch error.
    #[must_use]
    pub fn new(kind: FetchFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Classify yt-dlp error output.
///
/// # Examples
///
/// ```
/// use soundgate_core::fetch::{classify_ytdlp_error, FetchFailure};
/// assert_eq!(
///     classify_ytdlp_error("ERROR: [soundcloud] x: HTTP Error 404: Not Found"),
///     FetchFailure::Unavailable
/// );
/// ```
#[must_use]
pub fn classify_ytdlp_error(stderr: &str) -> FetchFailure {
    let message = stderr.to_lowercase();
    let matches = |patterns: &[&str]| patterns.iter().any(|p| message.contains(p));

    if matches(RESTRICTED_PATTERNS) {
        FetchFailure::Restricted
    } else if matches(UNAVAILABLE_PATTERNS) {
        FetchFailure::Unavailable
    } else if matches(TRANSIENT_PATTERNS) {
        FetchFailure::Transient
    } else {
        FetchFailure::Unknown
    }
}

/// A downloaded audio file owned by exactly one pipeline.
///
/// The file is deleted by [`FetchedArtifact::release`]. If the guard is
/// dropped without being released (early return, panic, cancelled task) the
/// file is deleted on drop instead. Deletion is attempted once either way.
#[derive(Debug)]
pub struct FetchedArtifact {
    path: PathBuf,
    title: String,
    performer: Option<String>,
    byte_size: u64,
    duration_secs: Option<u32>,
    released: bool,
}

impl FetchedArtifact {
    /// Take ownership of a file on disk.
    #[must_use]
    pub fn new(
        path: PathBuf,
        title: impl Into<String>,
        performer: Option<String>,
        byte_size: u64,
        duration_secs: Option<u32>,
    ) -> Self {
        Self {
            path,
            title: title.into(),
            performer,
            byte_size,
            duration_secs,
            released: false,
        }
    }

    /// Local path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display title of the track.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Uploader of the track, if known.
    #[must_use]
    pub fn performer(&self) -> Option<&str> {
        self.performer.as_deref()
    }

    /// File size in bytes.
    #[must_use]
    pub const fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// Track duration in whole seconds, if known.
    #[must_use]
    pub const fn duration_secs(&self) -> Option<u32> {
        self.duration_secs
    }

    /// Delete the file. Failures are logged and swallowed.
    pub async fn release(mut self) {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "Deleted artifact"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to delete artifact"),
        }
    }
}

impl Drop for FetchedArtifact {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Deleted unreleased artifact"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to delete unreleased artifact"),
        }
    }
}

/// Retrieval of a remote track into a local file
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download `url` as best-quality MP3.
    async fn fetch(&self, url: &str) -> Result<FetchedArtifact, FetchError>;
}

/// Metadata printed by yt-dlp after post-processing
#[derive(Debug, Default, Deserialize)]
struct YtdlpReport {
    title: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
    filepath: Option<PathBuf>,
}

impl YtdlpReport {
    /// Last JSON line of the output, if any parses.
    fn parse(stdout: &str) -> Self {
        stdout
            .lines()
            .rev()
            .map(str::trim)
            .filter(|line| line.starts_with('{'))
            .find_map(|line| serde_json::from_str(line).ok())
            .unwrap_or_default()
    }
}

/// Removes every file of one fetch attempt unless disarmed.
struct PartialFiles<'a> {
    dir: &'a Path,
    stem: &'a str,
    armed: bool,
}

impl PartialFiles<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFiles<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let removed = remove_matching(self.dir, self.stem);
        if removed > 0 {
            debug!(stem = self.stem, removed, "Removed partial download files");
        }
    }
}

/// Delete files in `dir` whose name starts with `prefix`, returning the count.
fn remove_matching(dir: &Path, prefix: &str) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
        .filter(|entry| match std::fs::remove_file(entry.path()) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Failed to delete file");
                false
            }
        })
        .count()
}

/// Drain a child pipe to the end.
async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!(error = %e, "Failed to read yt-dlp output");
        }
    }
    buf
}

/// Kill the child's whole process group and reap the child.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pgid) = child.id().and_then(|pid| i32::try_from(pid).ok()) {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Err(e) = killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            debug!(pgid, error = %e, "Failed to kill yt-dlp process group");
        }
    }
    if let Err(e) = child.kill().await {
        debug!(error = %e, "Failed to kill yt-dlp");
    }
}

/// yt-dlp backed [`MediaFetcher`]
#[derive(Debug, Clone)]
pub struct YtdlpFetcher {
    binary: String,
    output_dir: PathBuf,
    timeout: Duration,
}

impl YtdlpFetcher {
    /// Create a fetcher writing into `output_dir`.
    #[must_use]
    pub fn new(binary: impl Into<String>, output_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            output_dir: output_dir.into(),
            timeout,
        }
    }

    /// Create a fetcher from gate settings.
    #[must_use]
    pub fn from_settings(settings: &GateSettings) -> Self {
        Self::new(
            settings.ytdlp_path.clone(),
            settings.temp_root.clone(),
            Duration::from_secs(settings.fetch_timeout_secs),
        )
    }

    /// Directory artifacts are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory and delete artifacts left by a previous run.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn prepare(&self) -> std::io::Result<usize> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let removed = remove_matching(&self.output_dir, ARTIFACT_PREFIX);
        if removed > 0 {
            info!(
                files_deleted = removed,
                dir = %self.output_dir.display(),
                "Cleaned up stale artifacts"
            );
        }
        Ok(removed)
    }

    fn command(&self, url: &str, stem: &str) -> Command {
        let template = self.output_dir.join(format!("{stem}.%(ext)s"));
        let mut command = Command::new(&self.binary);
        command
            .args([
                "--no-playlist",
                "--no-warnings",
                "--quiet",
                "--no-progress",
                "--no-simulate",
                "-f",
                "bestaudio/best",
                "-x",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "0",
                "--print",
                REPORT_TEMPLATE,
                "-o",
            ])
            .arg(template)
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // yt-dlp leads its own group so post-processors die with it.
        #[cfg(unix)]
        command.process_group(0);
        command
    }

    /// First file produced for `stem`, ignoring yt-dlp temporaries.
    async fn locate(&self, stem: &str) -> Option<PathBuf> {
        let mut entries = tokio::fs::read_dir(&self.output_dir).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(stem) && !name.ends_with(".part") && !name.ends_with(".ytdl") {
                return Some(entry.path());
            }
        }
        None
    }

    /// Reported path if it belongs to this attempt, otherwise a directory scan.
    async fn resolve_path(&self, report: &YtdlpReport, stem: &str) -> Option<PathBuf> {
        let reported = report.filepath.as_ref().filter(|path| {
            path.file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with(stem))
        });
        match reported {
            Some(path) if tokio::fs::try_exists(path).await.unwrap_or(false) => Some(path.clone()),
            _ => self.locate(stem).await,
        }
    }
}

#[async_trait]
impl MediaFetcher for YtdlpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedArtifact, FetchError> {
        let stem = format!("{ARTIFACT_PREFIX}{}", Uuid::new_v4().as_simple());
        let partial = PartialFiles {
            dir: &self.output_dir,
            stem: &stem,
            armed: true,
        };

        debug!(url = %url, stem = %stem, "Starting yt-dlp");
        let mut child = self.command(url, &stem).spawn().map_err(|e| {
            FetchError::new(
                FetchFailure::Unknown,
                format!("failed to run {}: {e}", self.binary),
            )
        })?;
        let stdout = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr = tokio::spawn(read_pipe(child.stderr.take()));

        let waited = tokio::time::timeout(self.timeout, child.wait()).await;
        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                terminate(&mut child).await;
                return Err(FetchError::new(
                    FetchFailure::Unknown,
                    format!("failed to wait for {}: {e}", self.binary),
                ));
            }
            Err(_) => {
                terminate(&mut child).await;
                return Err(FetchError::new(
                    FetchFailure::Transient,
                    format!("yt-dlp timed out after {}s", self.timeout.as_secs()),
                ));
            }
        };
        let output = std::process::Output {
            status,
            stdout: stdout.await.unwrap_or_default(),
            stderr: stderr.await.unwrap_or_default(),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(FetchError::new(classify_ytdlp_error(&message), message));
        }

        let report = YtdlpReport::parse(&String::from_utf8_lossy(&output.stdout));
        let Some(path) = self.resolve_path(&report, &stem).await else {
            return Err(FetchError::new(
                FetchFailure::Unknown,
                "yt-dlp finished without producing a file",
            ));
        };
        let byte_size = tokio::fs::metadata(&path)
            .await
            .map_err(|e| FetchError::new(FetchFailure::Unknown, format!("cannot stat artifact: {e}")))?
            .len();

        partial.disarm();

        let title = report
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "track".to_string());
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let duration_secs = report
            .duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d.round() as u32);

        info!(url = %url, path = %path.display(), byte_size, "Fetched track");
        Ok(FetchedArtifact::new(
            path,
            title,
            report.uploader,
            byte_size,
            duration_secs,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ytdlp_errors() {
        let cases = [
            ("ERROR: [soundcloud] a/b: HTTP Error 404: Not Found", FetchFailure::Unavailable),
            ("ERROR: Unsupported URL: https://soundcloud.com/", FetchFailure::Unavailable),
            ("ERROR: [soundcloud] a/b: HTTP Error 403: Forbidden", FetchFailure::Restricted),
            ("ERROR: This track is private", FetchFailure::Restricted),
            (
                "ERROR: Unable to download webpage: <urlopen error [Errno -3] Temporary failure in name resolution>",
                FetchFailure::Transient,
            ),
            ("ERROR: HTTP Error 429: Too Many Requests", FetchFailure::Transient),
            ("ERROR: ffprobe and ffmpeg not found", FetchFailure::Unknown),
            ("something odd happened", FetchFailure::Unknown),
        ];
        for (stderr, expected) in cases {
            assert_eq!(classify_ytdlp_error(stderr), expected, "{stderr}");
        }
    }

    #[test]
    fn test_report_parsing_takes_last_json_line() {
        let stdout = "noise\n{\"title\": \"Old\"}\n{\"title\": \"Song\", \"uploader\": \"Band\", \"duration\": 61.6, \"filepath\": \"/tmp/sg-1.mp3\"}\n";
        let report = YtdlpReport::parse(stdout);
        assert_eq!(report.title.as_deref(), Some("Song"));
        assert_eq!(report.uploader.as_deref(), Some("Band"));
        assert_eq!(report.filepath, Some(PathBuf::from("/tmp/sg-1.mp3")));

        let empty = YtdlpReport::parse("not json");
        assert!(empty.title.is_none());
    }

    #[test]
    fn test_artifact_release_on_drop() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sg-drop.mp3");
        std::fs::write(&path, b"audio")?;

        let artifact = FetchedArtifact::new(path.clone(), "t", None, 5, None);
        assert_eq!(artifact.byte_size(), 5);
        drop(artifact);

        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_artifact_release_tolerates_missing_file() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sg-gone.mp3");
        let artifact = FetchedArtifact::new(path.clone(), "t", None, 0, None);
        artifact.release().await;
        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_prepare_purges_only_own_files() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("artifacts");
        let fetcher = YtdlpFetcher::new("yt-dlp", &out, Duration::from_secs(1));

        assert_eq!(fetcher.prepare().await?, 0);
        std::fs::write(out.join("sg-stale.mp3"), b"x")?;
        std::fs::write(out.join("sg-stale.mp3.part"), b"x")?;
        std::fs::write(out.join("keep.txt"), b"x")?;

        assert_eq!(fetcher.prepare().await?, 2);
        assert!(out.join("keep.txt").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_binary_is_unknown_failure() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let fetcher = YtdlpFetcher::new(
            "/nonexistent/yt-dlp-binary",
            dir.path(),
            Duration::from_secs(5),
        );
        let err = fetcher
            .fetch("https://soundcloud.com/a/b")
            .await
            .expect_err("spawn must fail");
        assert_eq!(err.kind, FetchFailure::Unknown);
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }
}
