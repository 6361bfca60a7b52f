//! # Note Stream
//!
//! Target notes travelling from the spawn edge (position 1.0) towards the
//! hit-line (0.0), and the weighted picker that chooses their pitches.
//!
//! Notes live in one dense vector owned by the engine; resolved notes are
//! filtered out during cleanup.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Attempts at drawing a pitch different from the previous one.
pub const MAX_REPEAT_ATTEMPTS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct GameNote {
    /// Unique within a game, increasing in spawn order.
    pub id: u64,
    /// Written MIDI pitch.
    pub pitch: i32,
    /// 1.0 at the spawn edge, 0.0 at the hit-line, negative past it.
    pub position: f32,
    pub active: bool,
    pub hit: bool,
    pub missed: bool,
    /// Game time at which the note was hit.
    pub hit_timestamp: Option<Duration>,
}

impl GameNote {
    /// Still waiting to be played.
    pub fn is_pending(&self) -> bool {
        self.active && !self.hit && !self.missed
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteStream {
    notes: Vec<GameNote>,
    next_id: u64,
}

impl NoteStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a note at the spawn edge and returns its id.
    pub fn spawn(&mut self, pitch: i32) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.notes.push(GameNote {
            id,
            pitch,
            position: 1.0,
            active: true,
            hit: false,
            missed: false,
            hit_timestamp: None,
        });
        id
    }

    /// Moves every unhit note `delta` closer to (and past) the hit-line.
    /// Hit notes hold their position for the flash.
    pub fn advance(&mut self, delta: f32) {
        for note in self.notes.iter_mut().filter(|n| !n.hit) {
            note.position -= delta;
        }
    }

    /// Next pending note at or below `threshold`, marked as missed.
    pub fn next_miss(&mut self, threshold: f32) -> Option<&GameNote> {
        let note = self
            .notes
            .iter_mut()
            .find(|n| n.is_pending() && n.position <= threshold)?;
        note.missed = true;
        note.active = false;
        Some(note)
    }

    /// The pending note of `pitch` closest to the hit-line.
    pub fn hit_candidate(&self, pitch: i32) -> Option<usize> {
        self.notes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_pending() && n.pitch == pitch)
            .min_by(|(_, a), (_, b)| a.position.total_cmp(&b.position))
            .map(|(index, _)| index)
    }

    pub fn mark_hit(&mut self, index: usize, now: Duration) -> Option<&GameNote> {
        let note = self.notes.get_mut(index)?;
        note.hit = true;
        note.active = false;
        note.hit_timestamp = Some(now);
        Some(note)
    }

    /// Drops hit notes whose flash is over and missed notes past `offscreen`.
    pub fn cleanup(&mut self, now: Duration, hit_linger: Duration, offscreen: f32) {
        self.notes.retain(|note| {
            if let Some(hit_at) = note.hit_timestamp {
                return now.saturating_sub(hit_at) < hit_linger;
            }
            !(note.missed && note.position < offscreen)
        });
    }

    pub fn notes(&self) -> &[GameNote] {
        &self.notes
    }

    pub fn get(&self, id: u64) -> Option<&GameNote> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Removes all notes and restarts ids.
    pub fn clear(&mut self) {
        self.notes.clear();
        self.next_id = 0;
    }
}

/// Weighted random pitch selection that avoids repeating the previous pitch.
#[derive(Debug, Clone)]
pub struct NotePicker {
    rng: StdRng,
    last_pitch: Option<i32>,
}

impl NotePicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            last_pitch: None,
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            last_pitch: None,
        }
    }

    /// Weight of `candidate` given the previous pitch: stepwise motion is
    /// favoured over leaps.
    fn weight(&self, candidate: i32) -> u32 {
        match self.last_pitch {
            None => 1,
            Some(last) => match (candidate - last).abs() {
                0..=5 => 3,
                6..=12 => 2,
                _ => 1,
            },
        }
    }

    /// Picks the next pitch. With a single candidate, or after
    /// [`MAX_REPEAT_ATTEMPTS`] unlucky draws, the previous pitch may repeat.
    pub fn pick(&mut self, candidates: &[i32]) -> Option<i32> {
        let pitch = match candidates {
            [] => return None,
            [only] => *only,
            _ => {
                let weights: Vec<u32> = candidates.iter().map(|&c| self.weight(c)).collect();
                let mut pitch = self.draw(candidates, &weights);
                let mut attempts = 1;
                while Some(pitch) == self.last_pitch && attempts < MAX_REPEAT_ATTEMPTS {
                    pitch = self.draw(candidates, &weights);
                    attempts += 1;
                }
                pitch
            }
        };
        self.last_pitch = Some(pitch);
        Some(pitch)
    }

    fn draw(&mut self, candidates: &[i32], weights: &[u32]) -> i32 {
        match WeightedIndex::new(weights) {
            Ok(dist) => candidates[dist.sample(&mut self.rng)],
            Err(_) => candidates[self.rng.gen_range(0..candidates.len())],
        }
    }

    pub fn last_pitch(&self) -> Option<i32> {
        self.last_pitch
    }

    pub fn reset(&mut self) {
        self.last_pitch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_in_spawn_order() {
        let mut stream = NoteStream::new();
        let a = stream.spawn(60);
        let b = stream.spawn(62);
        assert!(b > a);
        assert_eq!(stream.get(a).unwrap().position, 1.0);
        assert!(stream.get(b).unwrap().is_pending());
    }

    #[test]
    fn closest_matching_note_is_the_candidate() {
        let mut stream = NoteStream::new();
        let far = stream.spawn(60);
        stream.advance(0.4);
        let near = stream.spawn(60);
        stream.advance(0.3);
        stream.spawn(62);
        // far is at 0.3, near at 0.7
        let index = stream.hit_candidate(60).unwrap();
        assert_eq!(stream.notes()[index].id, far);
        assert_ne!(far, near);
        assert_eq!(stream.hit_candidate(64), None);
    }

    #[test]
    fn misses_are_reported_once() {
        let mut stream = NoteStream::new();
        stream.spawn(60);
        stream.advance(0.95);
        assert_eq!(stream.next_miss(0.08).map(|n| n.pitch), Some(60));
        assert!(stream.next_miss(0.08).is_none());
    }

    #[test]
    fn cleanup_waits_for_flash_and_offscreen() {
        let mut stream = NoteStream::new();
        let hit = stream.spawn(60);
        let missed = stream.spawn(62);
        let index = stream.hit_candidate(60).unwrap();
        stream.mark_hit(index, Duration::from_millis(1000));
        stream.advance(0.95);
        stream.next_miss(0.08);

        let linger = Duration::from_millis(500);
        stream.cleanup(Duration::from_millis(1400), linger, -0.1);
        assert!(stream.get(hit).is_some());
        assert!(stream.get(missed).is_some());

        stream.advance(0.2);
        stream.cleanup(Duration::from_millis(1500), linger, -0.1);
        assert!(stream.get(hit).is_none());
        assert!(stream.get(missed).is_none());
    }

    #[test]
    fn picker_avoids_immediate_repeats() {
        let mut picker = NotePicker::new(7);
        let candidates = [60, 62, 64, 65, 67];
        let mut repeats = 0;
        let mut previous = None;
        for _ in 0..200 {
            let pitch = picker.pick(&candidates).unwrap();
            assert!(candidates.contains(&pitch));
            if previous == Some(pitch) {
                repeats += 1;
            }
            previous = Some(pitch);
        }
        // Ten draws at most 3/13 each make a repeat vanishingly rare.
        assert!(repeats <= 1, "repeats = {repeats}");
    }

    #[test]
    fn picker_repeats_a_single_candidate() {
        let mut picker = NotePicker::new(1);
        assert_eq!(picker.pick(&[67]), Some(67));
        assert_eq!(picker.pick(&[67]), Some(67));
        assert_eq!(picker.pick(&[]), None);
    }
}
