//! Async host for the session engine
//!
//! [`SessionDriver`] moves a [`SessionEngine`] onto a tokio task. All
//! operations and device events reach it through one channel, so they are
//! applied strictly one after another. Between commands the task sleeps
//! until the engine's next timer deadline.

use crate::clock::TokioClock;
use crate::engine::{EngineEvent, SessionEngine, SessionStatus};
use crate::error::{EngineError, EngineResult};
use crate::output::AudioEvent;
use smartbook_core::{Audiobook, Bookmark, Clip, RemoteButton};
use tokio::sync::{broadcast, mpsc, oneshot};

const COMMAND_BUFFER_SIZE: usize = 64;
const EVENT_BUFFER_SIZE: usize = 64;

type Job = Box<dyn FnOnce(&mut SessionEngine) + Send>;

/// Message accepted by the driver task
pub enum SessionCommand {
    MainEvent(AudioEvent),
    ClipEvent(AudioEvent),
    RemotePress(RemoteButton),
    /// Runs a closure against the engine
    Run(Job),
    /// Tears the session down and acknowledges once saved
    Shutdown(oneshot::Sender<()>),
}

pub struct SessionDriver {
    engine: SessionEngine,
    clock: TokioClock,
    commands: mpsc::Receiver<SessionCommand>,
    events: broadcast::Sender<EngineEvent>,
}

impl SessionDriver {
    /// Spawns the driver task and returns a handle to it
    ///
    /// `clock` must be the clock the engine was built with.
    pub fn spawn(engine: SessionEngine, clock: TokioClock) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);

        let driver = Self {
            engine,
            clock,
            commands: command_rx,
            events: events.clone(),
        };
        tokio::spawn(driver.run());

        SessionHandle {
            commands: command_tx,
            events,
        }
    }

    async fn run(mut self) {
        log::debug!("Session driver started");
        loop {
            let deadline = self.engine.next_deadline();
            let wake_at = self.clock.instant_at(deadline.unwrap_or(0));

            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        log::debug!("All session handles dropped");
                        self.engine.shutdown();
                        break;
                    };
                    if !self.handle(command) {
                        break;
                    }
                }
                _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                    let events = self.engine.poll_timers();
                    self.publish(events);
                }
            }
        }
        log::debug!("Session driver stopped");
    }

    /// Applies one command; returns false once the session is over
    fn handle(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::MainEvent(event) => self.engine.handle_main_event(event),
            SessionCommand::ClipEvent(event) => self.engine.handle_clip_event(event),
            SessionCommand::RemotePress(button) => {
                let events = self.engine.remote_press(button);
                self.publish(events);
            }
            SessionCommand::Run(job) => job(&mut self.engine),
            SessionCommand::Shutdown(done) => {
                self.engine.shutdown();
                let _ = done.send(());
                return false;
            }
        }
        true
    }

    fn publish(&self, events: Vec<EngineEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}

/// Cloneable handle to a running [`SessionDriver`]
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<EngineEvent>,
}

impl SessionHandle {
    /// Receives the events the engine raises from its timers
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub async fn main_event(&self, event: AudioEvent) -> EngineResult<()> {
        self.send(SessionCommand::MainEvent(event)).await
    }

    pub async fn clip_event(&self, event: AudioEvent) -> EngineResult<()> {
        self.send(SessionCommand::ClipEvent(event)).await
    }

    pub async fn remote_press(&self, button: RemoteButton) -> EngineResult<()> {
        self.send(SessionCommand::RemotePress(button)).await
    }

    /// Runs `f` on the engine task and returns its result
    pub async fn call<R, F>(&self, f: F) -> EngineResult<R>
    where
        F: FnOnce(&mut SessionEngine) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |engine| {
            let _ = reply_tx.send(f(engine));
        });
        self.send(SessionCommand::Run(job)).await?;
        reply_rx.await.map_err(|_| EngineError::ShutDown)
    }

    pub async fn load(
        &self,
        audiobook: Audiobook,
        restored_position: Option<f64>,
    ) -> EngineResult<()> {
        self.call(move |engine| engine.load(audiobook, restored_position))
            .await?
    }

    pub async fn toggle_play_pause(&self) -> EngineResult<()> {
        self.call(|engine| engine.toggle_play_pause()).await?
    }

    pub async fn seek_to(&self, time: f64) -> EngineResult<f64> {
        self.call(move |engine| engine.seek_to(time)).await?
    }

    pub async fn skip(&self, delta: f64) -> EngineResult<f64> {
        self.call(move |engine| engine.skip(delta)).await?
    }

    pub async fn add_bookmark(&self) -> EngineResult<Bookmark> {
        self.call(|engine| engine.add_bookmark()).await?
    }

    pub async fn create_clip(&self) -> EngineResult<Clip> {
        self.call(|engine| engine.create_clip()).await?
    }

    pub async fn set_sleep_timer_minutes(&self, minutes: u32) -> EngineResult<()> {
        self.call(move |engine| engine.set_sleep_timer_minutes(minutes))
            .await
    }

    pub async fn status(&self) -> EngineResult<SessionStatus> {
        self.call(|engine| engine.status()).await
    }

    /// Shuts the session down; resolves after the final save
    pub async fn shutdown(&self) -> EngineResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(SessionCommand::Shutdown(done_tx)).await?;
        done_rx.await.map_err(|_| EngineError::ShutDown)
    }

    async fn send(&self, command: SessionCommand) -> EngineResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EngineError::ShutDown)
    }
}
