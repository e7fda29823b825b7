// src/backend/loader.rs
//
// Load state of the external rendering library. One instance lives for the
// whole page session; every viewer that needs the library subscribes here.

use log::debug;

#[derive(Debug)]
enum LoadState<T> {
    Idle,
    Loading { subscribers: Vec<T> },
    Ready,
}

/// What the caller must do after subscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Library already available; proceed now. The subscriber was not kept.
    Ready,
    /// First subscriber of a new attempt; the caller starts the fetch.
    StartLoad,
    /// A fetch is already in flight; the subscriber waits for it.
    Queued,
}

#[derive(Debug)]
pub struct LibraryLoader<T> {
    state: LoadState<T>,
    attempts: u32,
}

impl<T> Default for LibraryLoader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LibraryLoader<T> {
    pub fn new() -> Self {
        Self {
            state: LoadState::Idle,
            attempts: 0,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, LoadState::Ready)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading { .. })
    }

    /// Number of fetches started so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn subscribe(&mut self, subscriber: T) -> Admission {
        match &mut self.state {
            LoadState::Ready => Admission::Ready,
            LoadState::Loading { subscribers } => {
                subscribers.push(subscriber);
                Admission::Queued
            }
            LoadState::Idle => {
                self.attempts += 1;
                self.state = LoadState::Loading {
                    subscribers: vec![subscriber],
                };
                Admission::StartLoad
            }
        }
    }

    /// Resolve the in-flight attempt. Returns its subscribers in
    /// registration order; a second call for the same attempt returns none.
    ///
    /// A failed attempt returns to idle so a later subscriber starts afresh.
    pub fn complete(&mut self, success: bool) -> Vec<T> {
        let previous = std::mem::replace(&mut self.state, LoadState::Idle);
        match previous {
            LoadState::Loading { subscribers } => {
                if success {
                    self.state = LoadState::Ready;
                }
                subscribers
            }
            LoadState::Ready => {
                debug!("library load completed twice; ignoring");
                self.state = LoadState::Ready;
                Vec::new()
            }
            LoadState::Idle => Vec::new(),
        }
    }
}
