//! # Play Queue and Navigation
//!
//! Pure track-selection logic: given the queue, the current position and
//! the shuffle/repeat flags, decide what plays next. No I/O, no clocks;
//! randomness comes in through the caller's `Rng` so tests are
//! deterministic.
//!
//! Selection priority for both directions:
//! 1. repeat-one, not yet consumed for this arrival: the same song again;
//! 2. shuffle: uniform pick among the *other* entries;
//! 3. sequential advance/retreat;
//! 4. boundary: wrap iff repeat-all, otherwise end of playback.
//!
//! Repeat-one is armed once per arrival at a track, so a track repeats
//! exactly once and then the queue moves on.

use rand::Rng;
use serde::{Deserialize, Serialize};
use subtune_catalog::Song;

/// Browsing context a queue was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueSource {
    Library,
    Search,
    Album,
    Artist,
    Genre,
    Playlist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatMode {
    Off,
    One,
    All,
}

impl RepeatMode {
    /// Off → One → All → Off.
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::Off,
        }
    }
}

/// An ordered list of songs plus where it came from. Starting playback from
/// a new browsing context replaces the queue wholesale.
#[derive(Debug, Clone)]
pub struct PlayQueue {
    pub songs: Vec<Song>,
    pub source: QueueSource,
}

impl PlayQueue {
    pub fn new(songs: Vec<Song>, source: QueueSource) -> Self {
        Self { songs, source }
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

/// Queue plus navigation state. Mutations keep one invariant: shuffle and
/// an active repeat mode are mutually exclusive.
#[derive(Debug)]
pub struct QueueState {
    queue: PlayQueue,
    current: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
    /// One-shot: armed on arrival at a track, consumed by the first
    /// repeat-one resolution.
    repeat_one_armed: bool,
}

impl QueueState {
    pub fn new() -> Self {
        Self {
            queue: PlayQueue::new(Vec::new(), QueueSource::Library),
            current: None,
            shuffle: false,
            repeat: RepeatMode::Off,
            repeat_one_armed: false,
        }
    }

    /// Replace the queue and position at `start`. Resets the repeat-one
    /// shot; shuffle and repeat mode themselves survive queue changes.
    pub fn set_queue(&mut self, queue: PlayQueue, start: usize) {
        self.current = if start < queue.len() { Some(start) } else { None };
        self.queue = queue;
        self.repeat_one_armed = true;
    }

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.current.and_then(|i| self.queue.songs.get(i))
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    /// Enabling shuffle drops any repeat mode back to `Off`.
    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
        if shuffle {
            self.repeat = RepeatMode::Off;
        }
    }

    pub fn toggle_shuffle(&mut self) {
        self.set_shuffle(!self.shuffle);
    }

    /// Any repeat change, including setting it `Off`, clears shuffle.
    pub fn set_repeat(&mut self, repeat: RepeatMode) {
        self.repeat = repeat;
        self.shuffle = false;
        if repeat == RepeatMode::One {
            self.repeat_one_armed = true;
        }
    }

    pub fn cycle_repeat(&mut self) {
        self.set_repeat(self.repeat.cycled());
    }

    /// Resolve the next track and move to it. `None` ends playback.
    pub fn next<R: Rng>(&mut self, rng: &mut R) -> Option<&Song> {
        let target = self.resolve(rng, Direction::Forward)?;
        self.arrive(target);
        self.queue.songs.get(target)
    }

    /// Resolve the previous track and move to it.
    pub fn previous<R: Rng>(&mut self, rng: &mut R) -> Option<&Song> {
        let target = self.resolve(rng, Direction::Backward)?;
        self.arrive(target);
        self.queue.songs.get(target)
    }

    fn arrive(&mut self, index: usize) {
        let changed = self.current != Some(index);
        self.current = Some(index);
        if changed {
            // A fresh arrival re-arms the one-shot repeat.
            self.repeat_one_armed = true;
        }
    }

    fn resolve<R: Rng>(&mut self, rng: &mut R, direction: Direction) -> Option<usize> {
        let len = self.queue.len();
        let current = self.current?;
        if len == 0 {
            return None;
        }

        if self.repeat == RepeatMode::One && self.repeat_one_armed {
            self.repeat_one_armed = false;
            return Some(current);
        }

        if self.shuffle && len > 1 {
            // Uniform among the other entries; never the current one.
            let mut pick = rng.gen_range(0..len - 1);
            if pick >= current {
                pick += 1;
            }
            return Some(pick);
        }

        match direction {
            Direction::Forward if current + 1 < len => Some(current + 1),
            Direction::Backward if current > 0 => Some(current - 1),
            Direction::Forward | Direction::Backward => match self.repeat {
                RepeatMode::All => Some(match direction {
                    Direction::Forward => 0,
                    Direction::Backward => len - 1,
                }),
                _ => None,
            },
        }
    }
}

impl Default for QueueState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}
