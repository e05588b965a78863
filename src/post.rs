//! Posting turn summaries to outside channels
//!
//! Delivery runs on a worker thread so the state graph lock is never
//! held across slow I/O. Channels are attempted independently; one
//! failing never blocks another, and the joint success flag is the
//! conjunction of every channel's result. A caller may abandon a
//! background post by dropping the handle, but the post itself runs to
//! completion.

use std::path::PathBuf;
use std::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("channel {channel} rejected the post: {reason}")]
    Rejected { channel: String, reason: String },
    #[error("post I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialized save carried alongside the summary text
#[derive(Debug, Clone)]
pub struct SaveAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// One destination a turn summary can be delivered to
pub trait SummaryChannel: Send {
    fn name(&self) -> &str;

    /// Deliver the summary, returning a human-readable receipt
    fn deliver(
        &mut self,
        summary: &str,
        attachment: Option<&SaveAttachment>,
    ) -> Result<String, PostError>;
}

/// Channel that records the summary in the structured log
#[derive(Debug, Default)]
pub struct LogChannel;

impl SummaryChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    fn deliver(
        &mut self,
        summary: &str,
        attachment: Option<&SaveAttachment>,
    ) -> Result<String, PostError> {
        tracing::info!("turn summary:\n{summary}");
        if let Some(attachment) = attachment {
            tracing::info!(
                "turn attachment {} ({} bytes)",
                attachment.file_name,
                attachment.bytes.len()
            );
        }
        Ok("logged".to_string())
    }
}

/// Channel that drops the summary and attachment into a directory
#[derive(Debug)]
pub struct FileChannel {
    dir: PathBuf,
}

impl FileChannel {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SummaryChannel for FileChannel {
    fn name(&self) -> &str {
        "file"
    }

    fn deliver(
        &mut self,
        summary: &str,
        attachment: Option<&SaveAttachment>,
    ) -> Result<String, PostError> {
        std::fs::create_dir_all(&self.dir)?;
        let summary_path = self.dir.join("turn_summary.txt");
        std::fs::write(&summary_path, summary)?;
        if let Some(attachment) = attachment {
            std::fs::write(self.dir.join(&attachment.file_name), &attachment.bytes)?;
        }
        Ok(format!("wrote {}", summary_path.display()))
    }
}

/// What one channel did with the post
#[derive(Debug)]
pub struct ChannelReport {
    pub channel: String,
    pub result: Result<String, PostError>,
}

/// Combined result of posting through every configured channel
#[derive(Debug)]
pub struct PostOutcome {
    pub reports: Vec<ChannelReport>,
    /// True only when every channel delivered
    pub all_succeeded: bool,
}

/// Posts one turn's summary through a set of channels
pub struct TurnPoster {
    channels: Vec<Box<dyn SummaryChannel>>,
    game_label: String,
    player: String,
    round: u32,
}

impl TurnPoster {
    pub fn new(game_label: impl Into<String>, player: impl Into<String>, round: u32) -> Self {
        Self {
            channels: Vec::new(),
            game_label: game_label.into(),
            player: player.into(),
            round,
        }
    }

    pub fn add_channel(&mut self, channel: Box<dyn SummaryChannel>) {
        self.channels.push(channel);
    }

    /// Conventional name for this turn's save attachment, such as
    /// `bigworld_Blu3.sav` for Blue's round 3
    pub fn attachment_name(&self) -> String {
        let prefix: String = self.player.chars().take(3).collect();
        format!("{}_{}{}.sav", self.game_label, prefix, self.round)
    }

    /// Deliver through every channel, none skipped on earlier failure
    pub fn post(&mut self, summary: &str, attachment: Option<&SaveAttachment>) -> PostOutcome {
        let mut reports = Vec::with_capacity(self.channels.len());
        for channel in self.channels.iter_mut() {
            let result = channel.deliver(summary, attachment);
            match &result {
                Ok(receipt) => {
                    tracing::info!("posted turn summary via {}: {receipt}", channel.name());
                }
                Err(err) => {
                    tracing::warn!("posting via {} failed: {err}", channel.name());
                }
            }
            reports.push(ChannelReport { channel: channel.name().to_string(), result });
        }
        let all_succeeded = reports.iter().all(|r| r.result.is_ok());
        PostOutcome { reports, all_succeeded }
    }

    /// Post on a worker thread; the returned handle marshals the
    /// outcome back to the calling thread
    pub fn post_in_background(
        mut self,
        summary: String,
        attachment: Option<SaveAttachment>,
    ) -> PostHandle {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let outcome = self.post(&summary, attachment.as_ref());
            // Receiver may be gone when the caller abandoned the post
            let _ = tx.send(outcome);
        });
        PostHandle { rx }
    }
}

/// Pending background post; dropping it abandons the result but not
/// the post itself
pub struct PostHandle {
    rx: mpsc::Receiver<PostOutcome>,
}

impl PostHandle {
    /// Block until the post finishes. None when the worker vanished
    /// without reporting.
    pub fn wait(self) -> Option<PostOutcome> {
        self.rx.recv().ok()
    }
}
