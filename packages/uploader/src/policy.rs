use std::fmt;
use std::str::FromStr;

use crate::file::FileHandle;

/// Largest file accepted into the queue unless configured otherwise.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// One entry of an accept list: `*/*`, `image/*` or `application/pdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimePattern {
    Any,
    /// Any subtype of the given top-level type.
    TopLevel(String),
    Exact(String),
}

impl MimePattern {
    pub fn matches(&self, mime: &str) -> bool {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let Some((top, sub)) = essence.split_once('/') else {
            return false;
        };
        if top.is_empty() || sub.is_empty() {
            return false;
        }
        match self {
            MimePattern::Any => true,
            MimePattern::TopLevel(t) => t == top,
            MimePattern::Exact(e) => *e == essence,
        }
    }
}

impl FromStr for MimePattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.split_once('/') {
            Some(("*", "*")) => Ok(MimePattern::Any),
            Some((top, "*")) if !top.is_empty() => Ok(MimePattern::TopLevel(top.to_string())),
            Some((top, sub))
                if !top.is_empty()
                    && !sub.is_empty()
                    && !top.contains('*')
                    && !sub.contains('*') =>
            {
                Ok(MimePattern::Exact(s))
            }
            _ => Err(format!("'{s}' is not a MIME type pattern")),
        }
    }
}

impl fmt::Display for MimePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MimePattern::Any => f.write_str("*/*"),
            MimePattern::TopLevel(t) => write!(f, "{t}/*"),
            MimePattern::Exact(e) => f.write_str(e),
        }
    }
}

/// What happens to a queue entry once its upload succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuccessPolicy {
    /// Keep the entry visible as `success` with progress 100.
    Retain,
    /// Remove the entry and release its preview.
    #[default]
    Prune,
}

/// Admission rules and post-upload behaviour of an upload queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_file_size: u64,
    pub accept: Vec<MimePattern>,
    pub on_success: SuccessPolicy,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            accept: vec![
                MimePattern::TopLevel("image".into()),
                MimePattern::Exact("application/pdf".into()),
            ],
            on_success: SuccessPolicy::default(),
        }
    }
}

impl UploadPolicy {
    /// Check a file against the size ceiling and the accept list.
    pub fn check(&self, file: &FileHandle) -> Result<(), Rejection> {
        if file.size() > self.max_file_size {
            return Err(Rejection {
                name: file.name().to_string(),
                reason: RejectionReason::TooLarge {
                    size: file.size(),
                    limit: self.max_file_size,
                },
            });
        }
        if !self.accept.iter().any(|p| p.matches(file.content_type())) {
            return Err(Rejection {
                name: file.name().to_string(),
                reason: RejectionReason::UnacceptedType(file.content_type().to_string()),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    TooLarge { size: u64, limit: u64 },
    UnacceptedType(String),
}

/// A file refused at enqueue time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub name: String,
    pub reason: RejectionReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            RejectionReason::TooLarge { limit, .. } => write!(
                f,
                "File {} is too large. Max size is {}.",
                self.name,
                human_size(*limit)
            ),
            RejectionReason::UnacceptedType(mime) => {
                let mime = if mime.is_empty() { "unknown" } else { mime };
                write!(
                    f,
                    "File {} was rejected: file type {} is not accepted",
                    self.name, mime
                )
            }
        }
    }
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        format!("{bytes} bytes")
    }
}
