mod updater;

use log::{debug, error};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use self::updater::Updater;
use crate::module::Module;
use crate::native::{Backend, ModuleHeader, Native};

/// Highest volume accepted by [`Player::set_volume`].
pub const MAX_VOLUME: u8 = 128;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PlayerState {
    Idle,
    Playing,
}

/// The process-wide playback controller.
///
/// libmikmod plays one module at a time; starting another stops the current
/// one. While playing, a background thread drives the mixer.
pub struct Player<B: Backend = Native> {
    backend: Arc<B>,
    interval: Duration,
    session: Mutex<Option<Session>>,
}

struct Session {
    // address of the module being played, used for identity only
    subject: usize,
    updater: Updater,
}

impl<B: Backend> Player<B> {
    pub(crate) fn new(backend: Arc<B>, interval: Duration) -> Player<B> {
        Player {
            backend,
            interval,
            session: Mutex::new(None),
        }
    }

    /// Starts playing `module`, stopping whatever was playing before.
    pub fn play(&self, module: &Module<'_, B>) {
        let mut session = self.session.lock();
        if let Some(previous) = session.take() {
            self.end(previous);
        }

        let raw = module.as_ptr();
        unsafe { self.backend.start(raw) };

        match Updater::spawn(Arc::clone(&self.backend), self.interval) {
            Ok(updater) => {
                debug!("playing {}", module.title());
                *session = Some(Session {
                    subject: raw as usize,
                    updater,
                });
            }
            Err(e) => {
                error!("failed to spawn update thread: {}", e);
                self.backend.stop();
            }
        }
    }

    /// Stops playback and waits for the update thread to exit. Does nothing
    /// when idle.
    pub fn stop(&self) {
        if let Some(session) = self.session.lock().take() {
            self.end(session);
        }
    }

    /// Whether libmikmod is playing a module right now.
    ///
    /// A module that ended on its own is reaped here, leaving the player
    /// idle by the time this returns false.
    pub fn is_playing(&self) -> bool {
        let active = self.backend.active();
        if !active {
            if let Some(finished) = self.session.lock().take() {
                self.end(finished);
            }
        }
        active
    }

    pub fn state(&self) -> PlayerState {
        if self.session.lock().is_some() {
            PlayerState::Playing
        } else {
            PlayerState::Idle
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state() == PlayerState::Playing && self.backend.paused()
    }

    pub fn toggle_pause(&self) {
        self.when_playing(|backend| backend.toggle_pause());
    }

    /// Sets the song volume, clamped to [`MAX_VOLUME`].
    pub fn set_volume(&self, volume: u8) {
        let volume = volume.min(MAX_VOLUME) as i16;
        self.when_playing(|backend| backend.set_volume(volume));
    }

    /// Jumps to song position `position`.
    pub fn set_position(&self, position: u16) {
        self.when_playing(|backend| backend.set_position(position));
    }

    pub fn next_position(&self) {
        self.when_playing(|backend| backend.next_position());
    }

    pub fn prev_position(&self) {
        self.when_playing(|backend| backend.prev_position());
    }

    /// Stops playback if `module` is the one being played, ahead of it being
    /// freed.
    pub(crate) fn release(&self, module: *mut ModuleHeader) {
        let mut session = self.session.lock();
        if session
            .as_ref()
            .map_or(false, |s| s.subject == module as usize)
        {
            if let Some(current) = session.take() {
                debug!("stopping playback of a module being freed");
                self.end(current);
            }
        }
    }

    fn when_playing(&self, f: impl FnOnce(&B)) {
        let session = self.session.lock();
        if session.is_some() {
            f(&self.backend);
        }
    }

    fn end(&self, session: Session) {
        self.backend.stop();
        session.updater.shutdown();
        debug!("playback stopped");
    }
}
