//! Playback session orchestrator
//!
//! [`SessionEngine`] owns everything that belongs to one listening session:
//! the loaded audiobook, its bookmarks and clips, the main and clip
//! transports, and the timers (remote buttons, sleep timer, listening time,
//! debounced saves). It is a plain state machine: callers feed it
//! operations and device events, and call [`SessionEngine::poll_timers`]
//! whenever [`SessionEngine::next_deadline`] has passed.

use crate::clip::{ClipPlayback, ClipWindow};
use crate::clock::Clock;
use crate::listening::ListeningAccumulator;
use crate::output::{AudioEvent, AudioOutput};
use crate::persistence::SaveScheduler;
use crate::remote::RemoteDispatcher;
use crate::sleep_timer::SleepTimer;
use crate::state::{PlaybackState, TransportMode};
use crate::{EngineError, EngineResult};
use serde::Serialize;
use smartbook_config::PlayerConfig;
use smartbook_core::{
    format_time, insert_sorted, locate, AppError, Audiobook, BookKey, BookSession, Bookmark,
    Chapter, Clip, EntryId, IdGenerator, ListeningStats, PressKind, RemoteAction, RemoteButton,
    RemoteControlMapping, SessionSnapshot, SessionStore, Validator,
};
use std::sync::Arc;

/// Something the engine did on its own while processing timers
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A remote gesture was recognised; `action` is `None` for unknown bindings
    RemotePress {
        button: RemoteButton,
        kind: PressKind,
        action: Option<RemoteAction>,
    },
    SleepTimerExpired,
    ListeningFlushed { seconds: u64 },
    SessionSaved,
}

/// Point-in-time summary for hosts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub book: Option<BookKey>,
    pub title: Option<String>,
    pub position: f64,
    pub duration: f64,
    pub is_playing: bool,
    pub chapter: Option<usize>,
    pub chapter_progress: String,
    pub volume: f64,
    pub playback_rate: f64,
    pub sleep_timer_remaining: u64,
    pub active_clip: Option<EntryId>,
}

struct LoadedBook {
    audiobook: Audiobook,
    bookmarks: Vec<Bookmark>,
    clips: Vec<Clip>,
    chapter: usize,
}

pub struct SessionEngine {
    settings: PlayerConfig,
    clock: Arc<dyn Clock>,
    main: Box<dyn AudioOutput>,
    clip_output: Box<dyn AudioOutput>,
    store: Box<dyn SessionStore>,
    snapshot: SessionSnapshot,
    book: Option<LoadedBook>,
    playback: PlaybackState,
    mode: TransportMode,
    volume: f64,
    rate: f64,
    sleep_timer: SleepTimer,
    listening: ListeningAccumulator,
    saves: SaveScheduler,
    remote: RemoteDispatcher,
    ids: IdGenerator,
    creating_clip: bool,
}

impl SessionEngine {
    /// Creates an engine and reads the stored session
    ///
    /// A store that cannot be read leaves the engine with a fresh snapshot.
    pub fn new(
        settings: &PlayerConfig,
        clock: Arc<dyn Clock>,
        main: Box<dyn AudioOutput>,
        clip_output: Box<dyn AudioOutput>,
        store: Box<dyn SessionStore>,
    ) -> Self {
        let snapshot = match store.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Failed to read session, starting fresh: {}", e);
                SessionSnapshot::default()
            }
        };

        let mut ids = IdGenerator::new();
        for session in snapshot.books.values() {
            session.bookmarks.iter().for_each(|b| ids.observe(b.id));
            session.clips.iter().for_each(|c| ids.observe(c.id));
        }

        let unknown = snapshot.remote_controls.unknown_actions();
        if !unknown.is_empty() {
            log::warn!("Remote bindings without a matching action: {:?}", unknown);
        }

        let mut engine = Self {
            settings: settings.clone(),
            clock,
            main,
            clip_output,
            store,
            snapshot,
            book: None,
            playback: PlaybackState::new(),
            mode: TransportMode::Main,
            volume: settings.default_volume.clamp(0.0, 1.0),
            rate: settings.default_rate,
            sleep_timer: SleepTimer::new(),
            listening: ListeningAccumulator::new(settings.listening_flush_secs),
            saves: SaveScheduler::new(settings.save_debounce_ms),
            remote: RemoteDispatcher::new(settings.long_press_threshold_ms),
            ids,
            creating_clip: false,
        };
        engine.main.set_volume(engine.volume);
        engine.main.set_rate(engine.rate);
        engine
    }

    // ---- Loading ----

    /// Makes `audiobook` the active book
    ///
    /// The stored session for its key is restored. `restored_position`
    /// overrides the stored position when given. Switching away from a
    /// different book saves the outgoing session immediately.
    pub fn load(
        &mut self,
        audiobook: Audiobook,
        restored_position: Option<f64>,
    ) -> EngineResult<()> {
        if let Err(reasons) = audiobook.validate() {
            return Err(AppError::InvalidAudiobook { reasons }.into());
        }
        if let Some(position) = restored_position {
            if !position.is_finite() {
                return Err(EngineError::invalid("restored position", position));
            }
        }

        let switching = self
            .book
            .as_ref()
            .is_some_and(|book| book.audiobook.key != audiobook.key);
        self.unload_book();
        if switching {
            self.save_now();
        }

        self.main.load(&audiobook.audio)?;
        self.main.set_rate(self.rate);
        self.main.set_volume(self.volume);

        let key = audiobook.key.clone();
        let session = self.snapshot.book(&key).cloned().unwrap_or_default();
        let position = restored_position.unwrap_or(session.current_time).max(0.0);

        self.playback = PlaybackState::restored(position);
        let chapter = locate(&audiobook.chapters, position);
        log::info!(
            "Loaded '{}' at {} ({} bookmarks, {} clips)",
            audiobook.title,
            format_time(position),
            session.bookmarks.len(),
            session.clips.len()
        );

        self.book = Some(LoadedBook {
            audiobook,
            bookmarks: session.bookmarks,
            clips: session.clips,
            chapter,
        });
        self.snapshot.last_opened = Some(key);

        if let Some(duration) = self.main.duration() {
            self.apply_duration(duration);
        }
        if self.main.is_ready() {
            self.apply_pending_seek();
        }
        self.mark_dirty();
        Ok(())
    }

    /// Flushes and detaches the active book, leaving its session in the snapshot
    fn unload_book(&mut self) {
        self.close_clip_player();
        if self.book.is_some() {
            self.main.pause();
            self.on_main_paused(false);
        }
        self.sleep_timer.freeze();
        self.remote.cancel();
        self.capture_session();
        self.book = None;
        self.playback = PlaybackState::new();
    }

    // ---- Main transport ----

    /// Seeks the main transport, returning the clamped target
    pub fn seek_to(&mut self, time: f64) -> EngineResult<f64> {
        self.require_book()?;
        if !time.is_finite() {
            return Err(EngineError::invalid("seek time", time));
        }

        let target = self.playback.clamp(time);
        self.move_main_to(target);
        Ok(target)
    }

    /// Skips relative to the current position
    pub fn skip(&mut self, delta: f64) -> EngineResult<f64> {
        self.require_book()?;
        if !delta.is_finite() {
            return Err(EngineError::invalid("skip delta", delta));
        }
        self.seek_to(self.playback.position() + delta)
    }

    /// Pauses a playing clip, otherwise flips the main transport
    pub fn toggle_play_pause(&mut self) -> EngineResult<()> {
        self.require_book()?;

        if let Some(clip) = self.mode.clip_mut() {
            if clip.is_playing() {
                clip.set_playing(false);
                self.clip_output.pause();
                return Ok(());
            }
        }

        if self.main.is_paused() {
            self.main.play()
        } else {
            self.pause_main();
            Ok(())
        }
    }

    pub fn handle_main_event(&mut self, event: AudioEvent) {
        if self.book.is_none() {
            log::debug!("Ignoring {:?} with no audiobook loaded", event);
            return;
        }

        match event {
            AudioEvent::LoadedMetadata { duration } => self.apply_duration(duration),
            AudioEvent::CanPlay => self.apply_pending_seek(),
            AudioEvent::TimeUpdate { time } => {
                // The device still sits at 0 until the restore seek is issued
                if !time.is_finite() || self.playback.pending_seek().is_some() {
                    return;
                }
                self.playback.set_position(time);
                self.update_chapter(time);
                self.mark_dirty();
            }
            AudioEvent::Play => self.on_main_playing(),
            AudioEvent::Pause => self.on_main_paused(false),
            AudioEvent::Ended => self.on_main_paused(true),
        }
    }

    fn pause_main(&mut self) {
        self.main.pause();
        self.on_main_paused(false);
    }

    fn on_main_playing(&mut self) {
        if let Some(clip) = self.mode.clip_mut() {
            if clip.is_playing() {
                clip.set_playing(false);
                self.clip_output.pause();
            }
        }

        let now = self.clock.now_ms();
        self.playback.set_playing(true);
        self.sleep_timer.resume(now);
        self.listening.start(now);
    }

    fn on_main_paused(&mut self, ended: bool) {
        self.playback.set_playing(false);
        if ended {
            log::info!("Reached the end of the audiobook");
            self.playback.set_at_end(true);
        }
        self.sleep_timer.freeze();
        let seconds = self.listening.stop();
        self.record_listening(seconds);
    }

    fn move_main_to(&mut self, time: f64) {
        if self.playback.pending_seek().is_some() || !self.main.is_ready() {
            self.playback.set_pending_seek(Some(time));
        } else {
            self.main.seek(time);
        }
        self.playback.set_position(time);
        self.playback.set_at_end(false);
        self.update_chapter(time);
        self.mark_dirty();
    }

    fn apply_pending_seek(&mut self) {
        if let Some(time) = self.playback.take_pending_seek() {
            let time = self.playback.clamp(time);
            log::debug!("Applying deferred seek to {}", format_time(time));
            self.main.seek(time);
            self.playback.set_position(time);
            self.update_chapter(time);
        }
    }

    fn apply_duration(&mut self, duration: f64) {
        if !duration.is_finite() || duration <= 0.0 {
            return;
        }
        self.playback.set_duration(duration);

        if let Some(book) = &self.book {
            if self
                .snapshot
                .stats
                .record_book_duration(&book.audiobook.key, duration)
            {
                self.mark_dirty();
            }
        }
    }

    fn update_chapter(&mut self, time: f64) {
        if let Some(book) = self.book.as_mut() {
            let index = locate(&book.audiobook.chapters, time);
            if index != book.chapter {
                log::debug!("Now in chapter {}", index + 1);
                book.chapter = index;
            }
        }
    }

    // ---- Chapters ----

    pub fn previous_chapter(&mut self) -> EngineResult<usize> {
        let current = self.require_book()?.chapter;
        self.go_to_chapter(current.saturating_sub(1))
    }

    pub fn next_chapter(&mut self) -> EngineResult<usize> {
        let book = self.require_book()?;
        let last = book.audiobook.chapter_count().saturating_sub(1);
        let target = (book.chapter + 1).min(last);
        self.go_to_chapter(target)
    }

    /// Seeks to the start of chapter `index`
    pub fn go_to_chapter(&mut self, index: usize) -> EngineResult<usize> {
        let book = self.require_book()?;
        let start = book
            .audiobook
            .chapter(index)
            .map(|chapter| chapter.start_time)
            .ok_or(EngineError::ChapterOutOfRange {
                index,
                count: book.audiobook.chapter_count(),
            })?;
        self.seek_to(start)?;
        Ok(index)
    }

    // ---- Bookmarks ----

    /// Bookmarks the current position
    pub fn add_bookmark(&mut self) -> EngineResult<Bookmark> {
        let position = self.playback.position();
        let book = self.book.as_mut().ok_or(EngineError::NoAudioLoaded)?;
        let id = self.ids.next_at(self.clock.wall_ms());

        let bookmark = Bookmark::new(id, position, book.chapter);
        insert_sorted(&mut book.bookmarks, bookmark.clone());
        log::info!("Added bookmark at {}", format_time(position));

        self.mark_dirty();
        Ok(bookmark)
    }

    pub fn remove_bookmark(&mut self, id: EntryId) -> EngineResult<Bookmark> {
        let book = self.book.as_mut().ok_or(EngineError::NoAudioLoaded)?;
        let index = book
            .bookmarks
            .iter()
            .position(|b| b.id == id)
            .ok_or(EngineError::BookmarkNotFound(id))?;

        let removed = book.bookmarks.remove(index);
        self.mark_dirty();
        Ok(removed)
    }

    // ---- Clips ----

    /// Captures the trailing clip window ending at the current position
    pub fn create_clip(&mut self) -> EngineResult<Clip> {
        if self.creating_clip {
            return Err(EngineError::ClipBusy);
        }

        self.creating_clip = true;
        let result = self.capture_clip();
        self.creating_clip = false;
        result
    }

    fn capture_clip(&mut self) -> EngineResult<Clip> {
        let position = self.playback.position();
        let book = self.book.as_mut().ok_or(EngineError::NoAudioLoaded)?;
        let window = ClipWindow::trailing(
            position,
            self.settings.clip_length_secs,
            self.settings.min_clip_position_secs,
        )?;

        let id = self.ids.next_at(self.clock.wall_ms());
        let created_at = self.clock.today().format("%Y-%m-%d").to_string();
        let clip = Clip::new(id, window.start, window.end, book.chapter, created_at);
        book.clips.insert(0, clip.clone());
        log::info!("Created {}", clip.title);

        self.mark_dirty();
        Ok(clip)
    }

    pub fn delete_clip(&mut self, id: EntryId) -> EngineResult<Clip> {
        let index = self
            .require_book()?
            .clips
            .iter()
            .position(|c| c.id == id)
            .ok_or(EngineError::ClipNotFound(id))?;

        if self.mode.clip().is_some_and(|active| active.clip_id() == id) {
            self.close_clip_player();
        }

        let removed = match self.book.as_mut() {
            Some(book) => book.clips.remove(index),
            None => return Err(EngineError::NoAudioLoaded),
        };
        self.mark_dirty();
        Ok(removed)
    }

    /// Switches to clip mode and starts playing clip `id`
    ///
    /// The main transport is paused first and its position remembered.
    pub fn play_clip(&mut self, id: EntryId) -> EngineResult<()> {
        let book = self.require_book()?;
        let clip = book
            .clips
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(EngineError::ClipNotFound(id))?;
        let audio = book.audiobook.audio.clone();

        let saved_position = match self.mode.clip() {
            Some(active) => active.saved_position(),
            None => self.playback.position(),
        };
        if self.playback.is_playing() || !self.main.is_paused() {
            self.pause_main();
        }

        self.clip_output.pause();
        if let Err(e) = self.clip_output.load(&audio) {
            self.close_clip_player();
            return Err(e);
        }
        self.clip_output.set_rate(self.rate);
        self.clip_output.set_volume(self.volume);

        let mut playback = ClipPlayback::new(&clip, saved_position);
        playback.set_playing(true);
        let ready = self.clip_output.is_ready();
        if !ready {
            playback.set_pending_seek(Some(clip.start_time));
        }
        self.mode = TransportMode::Clip(playback);
        log::debug!("Playing {}", clip.title);

        if ready {
            self.clip_output.seek(clip.start_time);
            self.start_clip_output()?;
        }
        Ok(())
    }

    /// Pauses or resumes the clip transport
    pub fn toggle_clip_play_pause(&mut self) -> EngineResult<()> {
        let clip = self.mode.clip_mut().ok_or(EngineError::NoClipActive)?;
        if clip.is_playing() {
            clip.set_playing(false);
            self.clip_output.pause();
            return Ok(());
        }

        if self.playback.is_playing() || !self.main.is_paused() {
            self.pause_main();
        }

        let resume_at = match self.mode.clip_mut() {
            Some(clip) => {
                clip.set_playing(true);
                clip.resume_point()
            }
            None => return Err(EngineError::NoClipActive),
        };
        self.clip_output.set_rate(self.rate);
        self.clip_output.set_volume(self.volume);
        self.clip_output.seek(resume_at);
        self.start_clip_output()
    }

    /// Pauses the clip without leaving clip mode
    pub fn stop_clip(&mut self) -> EngineResult<()> {
        let clip = self.mode.clip_mut().ok_or(EngineError::NoClipActive)?;
        clip.set_playing(false);
        self.clip_output.pause();
        Ok(())
    }

    /// Leaves clip mode and puts the main transport back where it was
    ///
    /// Main playback is not resumed.
    pub fn close_clip_player(&mut self) {
        if let TransportMode::Clip(clip) = std::mem::take(&mut self.mode) {
            self.clip_output.pause();
            self.clip_output.unload();
            if self.book.is_some() {
                self.move_main_to(clip.saved_position());
            }
        }
    }

    /// Seeks inside the clip by a fraction of its length
    pub fn handle_clip_seek(&mut self, fraction: f64) -> EngineResult<f64> {
        if !fraction.is_finite() {
            return Err(EngineError::invalid("clip seek fraction", fraction));
        }
        let clip = self.mode.clip_mut().ok_or(EngineError::NoClipActive)?;
        let device_time = clip.seek_fraction(fraction);
        if clip.pending_seek().is_some() {
            // Applied on CanPlay in place of the clip start
            clip.set_pending_seek(Some(device_time));
        } else {
            self.clip_output.seek(device_time);
        }
        Ok(device_time)
    }

    /// Closes clip mode and seeks the main transport to where clip `id` started
    pub fn jump_to_clip_start(&mut self, id: EntryId) -> EngineResult<f64> {
        let start = self
            .require_book()?
            .clips
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.original_start_time)
            .ok_or(EngineError::ClipNotFound(id))?;

        self.close_clip_player();
        self.seek_to(start)
    }

    pub fn handle_clip_event(&mut self, event: AudioEvent) {
        let Some(clip) = self.mode.clip_mut() else {
            log::debug!("Ignoring clip device {:?} outside clip mode", event);
            return;
        };

        match event {
            AudioEvent::CanPlay => {
                if let Some(time) = clip.take_pending_seek() {
                    let playing = clip.is_playing();
                    self.clip_output.seek(time);
                    if playing {
                        if let Err(e) = self.start_clip_output() {
                            log::warn!("Failed to start clip playback: {}", e);
                        }
                    }
                }
            }
            AudioEvent::TimeUpdate { time } if time.is_finite() => {
                let was_playing = clip.is_playing();
                let end = clip.end();
                if clip.apply_device_time(time) && was_playing {
                    log::debug!("Clip finished");
                    self.clip_output.pause();
                    self.clip_output.seek(end);
                }
            }
            AudioEvent::Play => clip.set_playing(true),
            AudioEvent::Pause | AudioEvent::Ended => clip.set_playing(false),
            AudioEvent::LoadedMetadata { .. } | AudioEvent::TimeUpdate { .. } => {}
        }
    }

    fn start_clip_output(&mut self) -> EngineResult<()> {
        if let Err(e) = self.clip_output.play() {
            if let Some(clip) = self.mode.clip_mut() {
                clip.set_playing(false);
            }
            return Err(e);
        }
        Ok(())
    }

    // ---- Output settings ----

    /// Sets the playback rate on both devices
    pub fn set_playback_rate(&mut self, rate: f64) -> EngineResult<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(EngineError::invalid("playback rate", rate));
        }
        self.rate = rate;
        self.main.set_rate(rate);
        if self.mode.is_clip() {
            self.clip_output.set_rate(rate);
        }
        Ok(())
    }

    /// Sets the volume on both devices, clamped to 0-1
    pub fn set_volume(&mut self, volume: f64) -> EngineResult<f64> {
        if !volume.is_finite() {
            return Err(EngineError::invalid("volume", volume));
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.main.set_volume(self.volume);
        if self.mode.is_clip() {
            self.clip_output.set_volume(self.volume);
        }
        Ok(self.volume)
    }

    pub fn volume_up(&mut self) -> f64 {
        self.step_volume(self.settings.volume_step)
    }

    pub fn volume_down(&mut self) -> f64 {
        self.step_volume(-self.settings.volume_step)
    }

    fn step_volume(&mut self, step: f64) -> f64 {
        self.set_volume(self.volume + step).unwrap_or(self.volume)
    }

    // ---- Sleep timer ----

    /// Starts a sleep countdown of `minutes`; 0 turns it off
    pub fn set_sleep_timer_minutes(&mut self, minutes: u32) {
        let now = self.clock.now_ms();
        self.sleep_timer
            .set_minutes(minutes, now, self.playback.is_playing());
        if minutes == 0 {
            log::info!("Sleep timer off");
        } else {
            log::info!("Sleep timer set to {} minutes", minutes);
        }
    }

    pub fn sleep_timer_remaining(&self) -> u64 {
        self.sleep_timer.remaining()
    }

    // ---- Remote control ----

    /// Runs the action bound under `name`; unknown names do nothing
    pub fn execute_remote_action(&mut self, name: &str) -> EngineResult<Option<RemoteAction>> {
        let Some(action) = RemoteAction::from_name(name) else {
            log::debug!("Ignoring unknown remote action '{}'", name);
            return Ok(None);
        };

        match action {
            RemoteAction::Rewind10
            | RemoteAction::Rewind30
            | RemoteAction::Rewind45
            | RemoteAction::Rewind60
            | RemoteAction::FastForward10
            | RemoteAction::FastForward30
            | RemoteAction::FastForward60 => {
                self.skip(action.skip_seconds().unwrap_or(0.0))?;
            }
            RemoteAction::AddBookmark => {
                self.add_bookmark()?;
            }
            RemoteAction::CreateClip => {
                self.create_clip()?;
            }
            RemoteAction::PreviousChapter => {
                self.previous_chapter()?;
            }
            RemoteAction::NextChapter => {
                self.next_chapter()?;
            }
            RemoteAction::PlayPause => self.toggle_play_pause()?,
            RemoteAction::VolumeUp => {
                self.volume_up();
            }
            RemoteAction::VolumeDown => {
                self.volume_down();
            }
            RemoteAction::Nothing => {}
        }
        Ok(Some(action))
    }

    /// Feeds a raw headset button press
    ///
    /// Returns the gestures settled by this press: any expired gesture on
    /// either button, plus a long press when this press completes one.
    pub fn remote_press(&mut self, button: RemoteButton) -> Vec<EngineEvent> {
        let mut events = self.poll_timers();
        let now = self.clock.now_ms();
        if let Some(kind) = self.remote.press(button, now) {
            events.push(self.fire_remote(button, kind));
        }
        events
    }

    fn fire_remote(&mut self, button: RemoteButton, kind: PressKind) -> EngineEvent {
        let name = self
            .snapshot
            .remote_controls
            .action_for(button, kind)
            .to_string();

        let action = match self.execute_remote_action(&name) {
            Ok(action) => action,
            Err(e) => {
                log::warn!("Remote {:?} {:?} press ('{}') failed: {}", button, kind, name, e);
                RemoteAction::from_name(&name)
            }
        };
        EngineEvent::RemotePress {
            button,
            kind,
            action,
        }
    }

    pub fn set_remote_mapping(&mut self, mapping: RemoteControlMapping) {
        let unknown = mapping.unknown_actions();
        if !unknown.is_empty() {
            log::warn!("Remote bindings without a matching action: {:?}", unknown);
        }
        self.snapshot.remote_controls = mapping;
        self.mark_dirty();
    }

    pub fn remote_mapping(&self) -> &RemoteControlMapping {
        &self.snapshot.remote_controls
    }

    // ---- Timers ----

    /// Runs every timer whose deadline has passed
    pub fn poll_timers(&mut self) -> Vec<EngineEvent> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();

        for (button, kind) in self.remote.poll(now) {
            events.push(self.fire_remote(button, kind));
        }

        let seconds = self.listening.poll(now);
        if seconds > 0 {
            self.record_listening(seconds);
            events.push(EngineEvent::ListeningFlushed { seconds });
        }

        if self.sleep_timer.poll(now) {
            log::info!("Sleep timer expired, pausing");
            self.pause_main();
            events.push(EngineEvent::SleepTimerExpired);
        }

        if self.saves.poll(now) && self.write_snapshot() {
            events.push(EngineEvent::SessionSaved);
        }

        events
    }

    /// Earliest pending timer deadline on the engine clock
    pub fn next_deadline(&self) -> Option<u64> {
        [
            self.remote.next_deadline(),
            self.sleep_timer.next_deadline(),
            self.listening.next_deadline(),
            self.saves.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    // ---- Persistence ----

    /// Flushes pending listening time and saves immediately
    pub fn flush(&mut self) -> bool {
        let seconds = self.listening.take();
        self.record_listening(seconds);
        self.save_now()
    }

    /// Ends the session: closes clip mode, stops every timer and saves
    pub fn shutdown(&mut self) {
        self.unload_book();
        self.save_now();
        log::info!("Session shut down");
    }

    fn record_listening(&mut self, seconds: u64) {
        if seconds == 0 {
            return;
        }
        let today = self.clock.today();
        self.snapshot.stats.add_listening(today, seconds);
        self.mark_dirty();
    }

    fn mark_dirty(&mut self) {
        self.saves.mark_dirty(self.clock.now_ms());
    }

    fn save_now(&mut self) -> bool {
        self.saves.take();
        self.write_snapshot()
    }

    fn write_snapshot(&mut self) -> bool {
        self.capture_session();
        match self.store.save(&self.snapshot) {
            Ok(()) => {
                log::debug!("Session saved");
                true
            }
            Err(e) => {
                log::warn!("Failed to save session, will retry: {}", e);
                self.mark_dirty();
                false
            }
        }
    }

    fn capture_session(&mut self) {
        if let Some(book) = &self.book {
            self.snapshot.set_book(
                book.audiobook.key.clone(),
                BookSession {
                    current_time: self.playback.position(),
                    bookmarks: book.bookmarks.clone(),
                    clips: book.clips.clone(),
                },
            );
        }
    }

    // ---- Queries ----

    fn require_book(&self) -> EngineResult<&LoadedBook> {
        self.book.as_ref().ok_or(EngineError::NoAudioLoaded)
    }

    pub fn audiobook(&self) -> Option<&Audiobook> {
        self.book.as_ref().map(|book| &book.audiobook)
    }

    pub fn current_time(&self) -> f64 {
        self.playback.position()
    }

    /// Known duration in seconds, 0 while unknown
    pub fn duration(&self) -> f64 {
        self.playback.duration()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn at_end(&self) -> bool {
        self.playback.at_end()
    }

    pub fn current_chapter(&self) -> Option<usize> {
        self.book.as_ref().map(|book| book.chapter)
    }

    pub fn current_chapter_info(&self) -> Option<&Chapter> {
        self.book
            .as_ref()
            .and_then(|book| book.audiobook.chapter(book.chapter))
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        self.book.as_ref().map_or(&[], |book| &book.bookmarks)
    }

    /// Clips, newest first
    pub fn clips(&self) -> &[Clip] {
        self.book.as_ref().map_or(&[], |book| &book.clips)
    }

    pub fn clip_playback(&self) -> Option<&ClipPlayback> {
        self.mode.clip()
    }

    pub fn is_creating_clip(&self) -> bool {
        self.creating_clip
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    pub fn stats(&self) -> &ListeningStats {
        &self.snapshot.stats
    }

    /// Listening seconds counted but not yet added to today's total
    pub fn pending_listening_seconds(&self) -> u64 {
        self.listening.pending()
    }

    /// Book opened most recently, for reopening on startup
    pub fn last_opened(&self) -> Option<&BookKey> {
        self.snapshot.last_opened.as_ref()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.saves.is_dirty()
    }

    pub fn progress_percentage(&self) -> f64 {
        self.playback.progress_percentage()
    }

    /// One-based chapter position, e.g. "3/15"
    pub fn chapter_progress(&self) -> String {
        match &self.book {
            Some(book) => format!("{}/{}", book.chapter + 1, book.audiobook.chapter_count()),
            None => "0/0".to_string(),
        }
    }

    /// The snapshot as it would be saved right now
    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = self.snapshot.clone();
        if let Some(book) = &self.book {
            snapshot.set_book(
                book.audiobook.key.clone(),
                BookSession {
                    current_time: self.playback.position(),
                    bookmarks: book.bookmarks.clone(),
                    clips: book.clips.clone(),
                },
            );
        }
        snapshot
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            book: self.book.as_ref().map(|b| b.audiobook.key.clone()),
            title: self.book.as_ref().map(|b| b.audiobook.title.clone()),
            position: self.playback.position(),
            duration: self.playback.duration(),
            is_playing: self.playback.is_playing(),
            chapter: self.current_chapter(),
            chapter_progress: self.chapter_progress(),
            volume: self.volume,
            playback_rate: self.rate,
            sleep_timer_remaining: self.sleep_timer.remaining(),
            active_clip: self.mode.clip().map(ClipPlayback::clip_id),
        }
    }
}

impl std::fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("book", &self.book.as_ref().map(|b| &b.audiobook.key))
            .field("playback", &self.playback)
            .field("mode", &self.mode)
            .field("volume", &self.volume)
            .field("rate", &self.rate)
            .finish_non_exhaustive()
    }
}
