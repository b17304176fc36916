//! Conflict detection and resolution for file operations.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// A conflict detected during a file operation.
#[derive(Debug, Clone)]
pub struct Conflict {
    /// The source path being operated on.
    pub source: PathBuf,
    /// The destination path that already exists.
    pub destination: PathBuf,
    /// The kind of conflict.
    pub kind: ConflictKind,
}

impl Conflict {
    /// Create a new conflict.
    pub fn new(source: PathBuf, destination: PathBuf, kind: ConflictKind) -> Self {
        Self {
            source,
            destination,
            kind,
        }
    }

    /// Inspect `destination` and create the matching conflict.
    pub fn detect(source: &Path, destination: &Path) -> Self {
        let kind = match fs::symlink_metadata(destination) {
            Ok(meta) if meta.is_dir() => ConflictKind::DirectoryExists,
            _ => ConflictKind::FileExists,
        };
        Self::new(source.to_path_buf(), destination.to_path_buf(), kind)
    }
}

/// The kind of conflict encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// A file already exists at the destination.
    FileExists,
    /// A directory already exists at the destination.
    DirectoryExists,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileExists => write!(f, "File already exists"),
            Self::DirectoryExists => write!(f, "Directory already exists"),
        }
    }
}

/// How to resolve a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConflictResolution {
    /// Leave the existing destination alone and skip this item.
    #[default]
    Skip,
    /// Remove the existing destination, then proceed.
    Replace,
    /// Keep the existing destination and give the new item a "copy" name.
    KeepBoth,
}

impl std::fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "Skip"),
            Self::Replace => write!(f, "Replace"),
            Self::KeepBoth => write!(f, "Keep Both"),
        }
    }
}

/// A resolution plus whether it answers every later conflict in the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictDecision {
    pub resolution: ConflictResolution,
    pub apply_to_remaining: bool,
}

impl ConflictDecision {
    /// A decision for this conflict only.
    pub fn once(resolution: ConflictResolution) -> Self {
        Self {
            resolution,
            apply_to_remaining: false,
        }
    }

    /// A decision for this and all remaining conflicts of the batch.
    pub fn for_all(resolution: ConflictResolution) -> Self {
        Self {
            resolution,
            apply_to_remaining: true,
        }
    }
}

/// Something that can decide how a conflict is resolved.
///
/// In an interactive application this asks the user; headless callers and
/// tests use [`FixedPolicy`]. The whole batch waits while a decision is
/// pending.
#[async_trait]
pub trait ConflictPrompt: Send + Sync {
    /// Decide how to resolve `conflict`.
    async fn resolve(&self, conflict: &Conflict) -> ConflictDecision;
}

/// A prompt that always gives the same answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPolicy(pub ConflictResolution);

impl FixedPolicy {
    /// Create a policy answering every conflict with `resolution`.
    pub fn new(resolution: ConflictResolution) -> Self {
        Self(resolution)
    }
}

#[async_trait]
impl ConflictPrompt for FixedPolicy {
    async fn resolve(&self, _conflict: &Conflict) -> ConflictDecision {
        ConflictDecision::for_all(self.0)
    }
}

/// A pending conflict waiting for an answer from the UI.
#[derive(Debug)]
pub struct ConflictRequest {
    /// The conflict to resolve.
    pub conflict: Conflict,
    responder: oneshot::Sender<ConflictDecision>,
}

impl ConflictRequest {
    /// Answer the conflict and resume the batch.
    pub fn respond(self, decision: ConflictDecision) {
        let _ = self.responder.send(decision);
    }
}

/// A prompt that forwards conflicts over a channel to a UI task.
///
/// If the receiving side has gone away, or drops a request without
/// answering, the conflict is skipped.
#[derive(Debug, Clone)]
pub struct ChannelPrompt {
    tx: mpsc::Sender<ConflictRequest>,
}

impl ChannelPrompt {
    /// Create a prompt and the receiver the UI should answer from.
    ///
    /// A buffer of zero is raised to one.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ConflictRequest>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ConflictPrompt for ChannelPrompt {
    async fn resolve(&self, conflict: &Conflict) -> ConflictDecision {
        let (responder, answer) = oneshot::channel();
        let request = ConflictRequest {
            conflict: conflict.clone(),
            responder,
        };

        if self.tx.send(request).await.is_err() {
            return ConflictDecision::once(ConflictResolution::Skip);
        }

        answer
            .await
            .unwrap_or(ConflictDecision::once(ConflictResolution::Skip))
    }
}

/// Per-batch conflict state.
///
/// Remembers a decision marked `apply_to_remaining` so later conflicts in
/// the same batch are answered without prompting again.
pub struct ConflictResolver<'a> {
    prompt: &'a dyn ConflictPrompt,
    cached: Option<ConflictDecision>,
}

impl<'a> ConflictResolver<'a> {
    /// Create a resolver for a new batch.
    pub fn new(prompt: &'a dyn ConflictPrompt) -> Self {
        Self {
            prompt,
            cached: None,
        }
    }

    /// The decision remembered for the rest of the batch, if any.
    pub fn cached(&self) -> Option<ConflictDecision> {
        self.cached
    }

    /// Decide what to do about `destination` already existing.
    pub async fn resolve(&mut self, source: &Path, destination: &Path) -> ConflictDecision {
        if let Some(decision) = self.cached {
            debug!(
                source = %source.display(),
                resolution = %decision.resolution,
                "Reusing remembered conflict decision"
            );
            return decision;
        }

        let conflict = Conflict::detect(source, destination);
        let decision = self.prompt.resolve(&conflict).await;
        debug!(
            source = %source.display(),
            destination = %destination.display(),
            resolution = %decision.resolution,
            apply_to_remaining = decision.apply_to_remaining,
            "Conflict resolved"
        );

        if decision.apply_to_remaining {
            self.cached = Some(decision);
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPrompt {
        calls: AtomicUsize,
        decision: ConflictDecision,
    }

    #[async_trait]
    impl ConflictPrompt for CountingPrompt {
        async fn resolve(&self, _conflict: &Conflict) -> ConflictDecision {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.decision
        }
    }

    #[tokio::test]
    async fn test_apply_to_remaining_is_cached() {
        let prompt = CountingPrompt {
            calls: AtomicUsize::new(0),
            decision: ConflictDecision::for_all(ConflictResolution::Replace),
        };
        let mut resolver = ConflictResolver::new(&prompt);

        for _ in 0..3 {
            let decision = resolver.resolve(Path::new("/a"), Path::new("/b")).await;
            assert_eq!(decision.resolution, ConflictResolution::Replace);
        }
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 1);
        assert!(resolver.cached().is_some());
    }

    #[tokio::test]
    async fn test_single_decision_prompts_again() {
        let prompt = CountingPrompt {
            calls: AtomicUsize::new(0),
            decision: ConflictDecision::once(ConflictResolution::KeepBoth),
        };
        let mut resolver = ConflictResolver::new(&prompt);

        resolver.resolve(Path::new("/a"), Path::new("/b")).await;
        resolver.resolve(Path::new("/c"), Path::new("/d")).await;
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 2);
        assert!(resolver.cached().is_none());
    }

    #[tokio::test]
    async fn test_channel_prompt_round_trip() {
        let (prompt, mut rx) = ChannelPrompt::new(4);

        let ui = tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            assert_eq!(request.conflict.destination, PathBuf::from("/dest/a.txt"));
            request.respond(ConflictDecision::once(ConflictResolution::KeepBoth));
        });

        let conflict = Conflict::new(
            PathBuf::from("/src/a.txt"),
            PathBuf::from("/dest/a.txt"),
            ConflictKind::FileExists,
        );
        let decision = prompt.resolve(&conflict).await;
        assert_eq!(decision.resolution, ConflictResolution::KeepBoth);
        ui.await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_prompt_zero_buffer() {
        let (prompt, mut rx) = ChannelPrompt::new(0);
        tokio::spawn(async move {
            if let Some(request) = rx.recv().await {
                request.respond(ConflictDecision::once(ConflictResolution::Replace));
            }
        });

        let conflict = Conflict::new(
            PathBuf::from("/src/a"),
            PathBuf::from("/dest/a"),
            ConflictKind::FileExists,
        );
        assert_eq!(
            prompt.resolve(&conflict).await.resolution,
            ConflictResolution::Replace
        );
    }

    #[tokio::test]
    async fn test_channel_prompt_without_ui_skips() {
        let (prompt, rx) = ChannelPrompt::new(1);
        drop(rx);

        let conflict = Conflict::new(
            PathBuf::from("/src/a"),
            PathBuf::from("/dest/a"),
            ConflictKind::FileExists,
        );
        let decision = prompt.resolve(&conflict).await;
        assert_eq!(decision.resolution, ConflictResolution::Skip);
    }
}
