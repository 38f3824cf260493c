//! Pooled audio voice allocation.
//!
//! Audio output is an external collaborator; the orchestrator only needs
//! "play this clip on an idle voice, allocating one if none is idle". The
//! pool is bounded: requests beyond the cap are dropped and counted rather
//! than failing the tick — gameplay degrades to silence, never to a crash.

/// Clip index of the bullet-fire sound.
pub const CLIP_FIRE: u32 = 0;

/// Clip index of the explosion sound.
pub const CLIP_EXPLODE: u32 = 1;

/// Clip index of the level heartbeat sound.
pub const CLIP_BLOP: u32 = 2;

/// One playback resource capable of rendering a single clip at a time.
pub trait Voice {
    /// True when the voice is not currently rendering a clip.
    fn is_idle(&self) -> bool;

    /// Assigns a clip and starts playback.
    fn start(&mut self, clip: u32);
}

/// Sink the side-channel bridge drains device sound requests into.
///
/// Implemented by [`VoicePool`]; tests substitute their own recorder.
pub trait AudioSink {
    /// Triggers playback of one clip. Returns `false` when the request was
    /// dropped (overflow) — a diagnostic condition, never an error.
    fn play(&mut self, clip: u32) -> bool;
}

/// A grow-on-demand pool of reusable voices with a hard size cap.
///
/// ## Semantics
/// * `play` reuses the first idle voice, allocating a new one through the
///   factory only when every existing voice is busy.
/// * Growth stops at `max_voices`; overflowing requests are dropped and
///   counted in [`VoicePool::dropped`].
pub struct VoicePool<V, F>
where
    F: FnMut() -> V,
{
    voices: Vec<V>,
    factory: F,
    max_voices: usize,
    dropped: u64,
}

impl<V: Voice, F: FnMut() -> V> VoicePool<V, F> {
    /// Default voice cap; generous next to the per-tick request capacity.
    pub const DEFAULT_MAX_VOICES: usize = 16;

    /// Creates an empty pool that allocates voices through `factory`.
    pub fn new(factory: F) -> Self {
        Self::with_capacity(factory, Self::DEFAULT_MAX_VOICES)
    }

    /// Creates an empty pool with an explicit voice cap.
    pub fn with_capacity(factory: F, max_voices: usize) -> Self {
        Self {
            voices: Vec::new(),
            factory,
            max_voices,
            dropped: 0,
        }
    }

    /// Number of voices allocated so far.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// True when no voice has been allocated yet.
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Requests dropped because the pool was saturated.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// The allocated voices, in allocation order.
    pub fn voices(&self) -> &[V] {
        &self.voices
    }
}

impl<V: Voice, F: FnMut() -> V> AudioSink for VoicePool<V, F> {
    fn play(&mut self, clip: u32) -> bool {
        if let Some(voice) = self.voices.iter_mut().find(|v| v.is_idle()) {
            voice.start(clip);
            return true;
        }
        if self.voices.len() < self.max_voices {
            let mut voice = (self.factory)();
            voice.start(clip);
            self.voices.push(voice);
            return true;
        }
        self.dropped += 1;
        log::warn!("voice pool saturated ({} voices); dropped clip {clip}", self.max_voices);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct FakeVoice {
        busy_ticks: u32,
        log: Rc<RefCell<Vec<u32>>>,
    }

    impl Voice for FakeVoice {
        fn is_idle(&self) -> bool {
            self.busy_ticks == 0
        }

        fn start(&mut self, clip: u32) {
            self.busy_ticks = 1;
            self.log.borrow_mut().push(clip);
        }
    }

    fn pool_with_log(
        max: usize,
    ) -> (
        VoicePool<FakeVoice, impl FnMut() -> FakeVoice>,
        Rc<RefCell<Vec<u32>>>,
    ) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let factory_log = Rc::clone(&log);
        let pool = VoicePool::with_capacity(
            move || FakeVoice {
                busy_ticks: 0,
                log: Rc::clone(&factory_log),
            },
            max,
        );
        (pool, log)
    }

    #[test]
    fn allocates_only_when_no_voice_is_idle() {
        let (mut pool, log) = pool_with_log(8);

        assert!(pool.play(CLIP_EXPLODE));
        assert!(pool.play(CLIP_FIRE));
        assert_eq!(pool.len(), 2);
        assert_eq!(*log.borrow(), vec![CLIP_EXPLODE, CLIP_FIRE]);

        // Free the first voice; the next request must reuse it.
        pool.voices[0].busy_ticks = 0;
        assert!(pool.play(CLIP_BLOP));
        assert_eq!(pool.len(), 2);
        assert_eq!(*log.borrow(), vec![CLIP_EXPLODE, CLIP_FIRE, CLIP_BLOP]);
    }

    #[test]
    fn overflow_drops_and_counts() {
        let (mut pool, log) = pool_with_log(2);

        assert!(pool.play(0));
        assert!(pool.play(1));
        assert!(!pool.play(2));
        assert!(!pool.play(3));

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.dropped(), 2);
        assert_eq!(*log.borrow(), vec![0, 1]);
    }

    #[test]
    fn requests_play_in_order() {
        let (mut pool, log) = pool_with_log(8);
        for clip in [CLIP_EXPLODE, CLIP_FIRE] {
            pool.play(clip);
        }
        assert_eq!(*log.borrow(), vec![CLIP_EXPLODE, CLIP_FIRE]);
        assert!(pool.len() <= 2);
    }
}
