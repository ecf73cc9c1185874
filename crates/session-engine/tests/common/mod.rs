//! Shared fakes for the session engine tests

#![allow(dead_code)]

use chrono::NaiveDate;
use smartbook_config::PlayerConfig;
use smartbook_core::{AudioHandle, Audiobook, BookKey, Chapter, MemorySessionStore};
use smartbook_session::{
    AudioEvent, AudioOutput, Clock, EngineEvent, EngineResult, ManualClock, SessionEngine,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// What a fake device has been told to do
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    pub loaded: Option<AudioHandle>,
    pub loads: usize,
    pub paused: bool,
    pub ready: bool,
    pub time: f64,
    pub duration: Option<f64>,
    pub rate: f64,
    pub volume: f64,
    pub seeks: Vec<f64>,
    pub plays: usize,
}

/// Audio output that records commands instead of producing sound
///
/// Clones share state, so a test keeps one copy and gives the other to
/// the engine.
#[derive(Debug, Clone)]
pub struct FakeOutput {
    state: Arc<Mutex<DeviceState>>,
    ready_on_load: bool,
}

impl FakeOutput {
    /// Device that accepts seeks right after loading
    pub fn ready() -> Self {
        Self::with_readiness(true)
    }

    /// Device that only accepts seeks once `CanPlay` is delivered
    pub fn slow() -> Self {
        Self::with_readiness(false)
    }

    fn with_readiness(ready_on_load: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(DeviceState {
                paused: true,
                rate: 1.0,
                volume: 1.0,
                ..Default::default()
            })),
            ready_on_load,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().expect("device state")
    }

    pub fn make_ready(&self) {
        self.state().ready = true;
    }

    pub fn set_duration(&self, duration: f64) {
        self.state().duration = Some(duration);
    }

    pub fn last_seek(&self) -> Option<f64> {
        self.state().seeks.last().copied()
    }
}

impl AudioOutput for FakeOutput {
    fn load(&mut self, audio: &AudioHandle) -> EngineResult<()> {
        let mut state = self.state();
        state.loaded = Some(audio.clone());
        state.loads += 1;
        state.paused = true;
        state.time = 0.0;
        state.ready = self.ready_on_load;
        Ok(())
    }

    fn unload(&mut self) {
        let mut state = self.state();
        state.loaded = None;
        state.paused = true;
        state.ready = false;
    }

    fn play(&mut self) -> EngineResult<()> {
        let mut state = self.state();
        state.paused = false;
        state.plays += 1;
        Ok(())
    }

    fn pause(&mut self) {
        self.state().paused = true;
    }

    fn seek(&mut self, time: f64) {
        let mut state = self.state();
        state.time = time;
        state.seeks.push(time);
    }

    fn set_rate(&mut self, rate: f64) {
        self.state().rate = rate;
    }

    fn set_volume(&mut self, volume: f64) {
        self.state().volume = volume;
    }

    fn current_time(&self) -> f64 {
        self.state().time
    }

    fn duration(&self) -> Option<f64> {
        self.state().duration
    }

    fn is_paused(&self) -> bool {
        self.state().paused
    }

    fn is_ready(&self) -> bool {
        self.state().ready
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 20).expect("valid date")
}

/// Engine wired to fakes, with handles to inspect them
pub struct Harness {
    pub engine: SessionEngine,
    pub clock: ManualClock,
    pub main: FakeOutput,
    pub clip: FakeOutput,
    pub store: MemorySessionStore,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemorySessionStore::new())
    }

    pub fn with_store(store: MemorySessionStore) -> Self {
        Self::build(store, FakeOutput::ready(), PlayerConfig::default())
    }

    pub fn build(store: MemorySessionStore, main: FakeOutput, settings: PlayerConfig) -> Self {
        Self::with_devices(store, main, FakeOutput::ready(), settings)
    }

    pub fn with_devices(
        store: MemorySessionStore,
        main: FakeOutput,
        clip: FakeOutput,
        settings: PlayerConfig,
    ) -> Self {
        let clock = ManualClock::new(today());
        let engine = SessionEngine::new(
            &settings,
            Arc::new(clock.clone()) as Arc<dyn Clock>,
            Box::new(main.clone()),
            Box::new(clip.clone()),
            Box::new(store.clone()),
        );
        Self {
            engine,
            clock,
            main,
            clip,
            store,
        }
    }

    /// Loads `book` and delivers the device's metadata
    pub fn load(&mut self, book: Audiobook, duration: f64) {
        self.engine.load(book, None).expect("load");
        self.engine
            .handle_main_event(AudioEvent::LoadedMetadata { duration });
    }

    /// Starts the main transport the way a device would confirm it
    pub fn play(&mut self) {
        if self.main.state().paused {
            self.engine.toggle_play_pause().expect("play");
        }
        self.engine.handle_main_event(AudioEvent::Play);
    }

    pub fn pause(&mut self) {
        if !self.main.state().paused {
            self.engine.toggle_play_pause().expect("pause");
        }
        self.engine.handle_main_event(AudioEvent::Pause);
    }

    /// Advances time, firing every timer at its deadline
    pub fn advance(&mut self, ms: u64) -> Vec<EngineEvent> {
        let target = self.clock.now_ms() + ms;
        let mut events = Vec::new();
        while let Some(deadline) = self.engine.next_deadline() {
            if deadline > target {
                break;
            }
            self.clock.set(deadline.max(self.clock.now_ms()));
            events.extend(self.engine.poll_timers());
        }
        self.clock.set(target);
        events.extend(self.engine.poll_timers());
        events
    }

    /// Moves the main transport as a playing device would
    pub fn report_time(&mut self, time: f64) {
        self.main.state().time = time;
        self.engine
            .handle_main_event(AudioEvent::TimeUpdate { time });
    }
}

pub fn chapters() -> Vec<Chapter> {
    vec![
        Chapter::new(1, "Introduction", 0.0),
        Chapter::new(2, "Chapter 1", 300.0),
        Chapter::new(3, "Chapter 2", 900.0),
        Chapter::new(4, "Chapter 3", 1800.0),
    ]
}

pub fn book(name: &str) -> Audiobook {
    Audiobook::new(
        BookKey::new(name),
        name.trim_end_matches(".m4b"),
        chapters(),
        AudioHandle::new(format!("mem://{}", name)),
    )
}
