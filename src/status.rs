use std::sync::Mutex;

use crate::objects::ObjectUrl;

pub const PROCESSING: &str = "Processing... please wait.";

/// The Download Artifact: a link to a local object with a suggested file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub href: ObjectUrl,
    pub download: String,
    pub label: String,
}

impl DownloadLink {
    pub fn new(href: ObjectUrl, download: String) -> Self {
        let label = format!("Download {download}");
        Self {
            href,
            download,
            label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Text(String),
    Link(DownloadLink),
}

impl Status {
    /// What a reader sees: the text, or the link's label.
    pub fn text(&self) -> &str {
        match self {
            Status::Text(text) => text,
            Status::Link(link) => &link.label,
        }
    }
}

/// Where all progress and error feedback goes.
///
/// Writes take `&self`: concurrent submissions share one area.
pub trait StatusArea: Send + Sync {
    fn set_text(&self, text: &str);

    /// Replace the content with exactly this link.
    fn show_link(&self, link: DownloadLink);
}

/// Keeps every write, newest last.
#[derive(Debug, Default)]
pub struct MemoryStatus {
    history: Mutex<Vec<Status>>,
}

impl MemoryStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Status> {
        self.history().pop()
    }

    pub fn history(&self) -> Vec<Status> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn push(&self, status: Status) {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(status);
    }
}

impl StatusArea for MemoryStatus {
    fn set_text(&self, text: &str) {
        self.push(Status::Text(text.to_owned()));
    }

    fn show_link(&self, link: DownloadLink) {
        self.push(Status::Link(link));
    }
}

#[derive(Debug, Default)]
pub struct TerminalStatus;

impl StatusArea for TerminalStatus {
    fn set_text(&self, text: &str) {
        println!("{text}");
    }

    fn show_link(&self, link: DownloadLink) {
        println!("{} <{}>", link.label, link.href);
    }
}
