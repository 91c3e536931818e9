//! Module music playback through libmikmod.
//!
//! [`MikMod`] is the process-wide library context: creating it initializes
//! libmikmod, dropping it shuts the library down. Modules are loaded from it
//! and played through its [`Player`].
//!
//! ```no_run
//! use std::{thread, time::Duration};
//!
//! let mikmod = mikmod::MikMod::init()?;
//! let module = mikmod.load_file("song.mod")?;
//! mikmod.player().play(&module);
//! while mikmod.player().is_playing() {
//!     thread::sleep(Duration::from_millis(100));
//! }
//! module.close()?;
//! mikmod.uninit();
//! # Ok::<(), mikmod::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod module;
pub mod native;
pub mod player;
pub mod version;

use log::{debug, info};
use std::os::raw::c_int;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use config::{Config, MixMode};
pub use error::{Error, ErrorCode, NativeError, Result};
pub use module::Module;
pub use native::{Backend, Native};
pub use player::{Player, PlayerState};
pub use version::Version;

use native::ModuleHeader;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Held for as long as a [`MikMod`] exists.
struct InitGuard;

impl InitGuard {
    fn acquire() -> Result<InitGuard> {
        INITIALIZED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InitGuard)
            .map_err(|_| Error::AlreadyInitialized)
    }
}

impl Drop for InitGuard {
    fn drop(&mut self) {
        INITIALIZED.store(false, Ordering::Release);
    }
}

/// The initialized library. At most one exists per process.
pub struct MikMod<B: Backend = Native> {
    backend: Arc<B>,
    config: Config,
    player: Player<B>,
    _guard: InitGuard,
}

impl MikMod<Native> {
    /// Opens and initializes libmikmod with the default configuration.
    pub fn init() -> Result<MikMod> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<MikMod> {
        let guard = InitGuard::acquire()?;
        let backend = Native::open(config.library_path.as_deref())?;
        Self::start(backend, config, guard)
    }
}

impl<B: Backend> MikMod<B> {
    /// Initializes the library through `backend`.
    pub fn with_backend(backend: B, config: Config) -> Result<MikMod<B>> {
        let guard = InitGuard::acquire()?;
        Self::start(backend, config, guard)
    }

    fn start(backend: B, config: Config, guard: InitGuard) -> Result<MikMod<B>> {
        let params = native::to_native(&config.device_params)?;

        if !backend.init_threads() {
            return Err(Error::NoThreadSupport);
        }
        backend.register_all_drivers();
        backend.register_all_loaders();
        backend.set_mode(config.mix_mode.bits());
        if backend.init(&params) != 0 {
            return Err(Error::Init(NativeError::last(&backend)));
        }

        let backend = Arc::new(backend);
        info!(
            "libmikmod {} initialized",
            Version::from_packed(backend.version())
        );
        let player = Player::new(Arc::clone(&backend), config.update_interval);
        Ok(MikMod {
            backend,
            config,
            player,
            _guard: guard,
        })
    }

    /// Stops playback and shuts the library down. Dropping the value does
    /// the same.
    pub fn uninit(self) {
        drop(self)
    }

    pub fn version(&self) -> Version {
        Version::from_packed(self.backend.version())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn player(&self) -> &Player<B> {
        &self.player
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Loads the module at `path`.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Module<'_, B>> {
        let path = path.as_ref();
        let name = native::path_to_native(path)?;
        let raw = self
            .backend
            .load(&name, self.max_channels(), self.config.curious);
        let module = self.adopt(raw)?;
        debug!("loaded {}: {}", path.display(), module.tracker());
        Ok(module)
    }

    /// Loads a module from an in-memory copy of the file.
    pub fn load_slice(&self, bytes: &[u8]) -> Result<Module<'_, B>> {
        native::buffer_len(bytes.len())?;
        let raw = self
            .backend
            .load_mem(bytes, self.max_channels(), self.config.curious);
        let module = self.adopt(raw)?;
        debug!("loaded {} bytes: {}", bytes.len(), module.tracker());
        Ok(module)
    }

    fn max_channels(&self) -> c_int {
        c_int::from(self.config.max_channels)
    }

    fn adopt(&self, raw: *mut ModuleHeader) -> Result<Module<'_, B>> {
        match NonNull::new(raw) {
            Some(raw) => Ok(Module::new(
                self,
                raw,
                self.config.looping,
                self.config.fadeout,
            )),
            None => Err(Error::Load(NativeError::last(&*self.backend))),
        }
    }
}

impl<B: Backend> Drop for MikMod<B> {
    fn drop(&mut self) {
        self.player.stop();
        self.backend.exit();
        debug!("libmikmod shut down");
    }
}
