use std::env;
use std::ops::BitOr;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the libmikmod shared object to open.
pub const ENV_LIBRARY: &str = "MIKMOD_LIBRARY";
/// Environment variable holding the driver parameter string for `MikMod_Init`.
pub const ENV_DEVICE_PARAMS: &str = "MIKMOD_DEVICE_PARAMS";

/// Mixer flags written to libmikmod's `md_mode` (`DMODE_*` in mikmod.h).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MixMode(u16);

impl MixMode {
    pub const SIXTEEN_BITS: MixMode = MixMode(0x0001);
    pub const STEREO: MixMode = MixMode(0x0002);
    pub const SOFT_SNDFX: MixMode = MixMode(0x0004);
    pub const SOFT_MUSIC: MixMode = MixMode(0x0008);
    pub const HQ_MIXER: MixMode = MixMode(0x0010);
    pub const FLOAT: MixMode = MixMode(0x0020);
    pub const SURROUND: MixMode = MixMode(0x0100);
    pub const INTERP: MixMode = MixMode(0x0200);
    pub const REVERSE: MixMode = MixMode(0x0400);
    pub const SIMD_MIXER: MixMode = MixMode(0x0800);
    pub const NOISE_REDUCTION: MixMode = MixMode(0x1000);

    pub const fn empty() -> MixMode {
        MixMode(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: MixMode) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MixMode {
    type Output = MixMode;

    fn bitor(self, rhs: MixMode) -> MixMode {
        MixMode(self.0 | rhs.0)
    }
}

impl Default for MixMode {
    fn default() -> MixMode {
        MixMode::SOFT_MUSIC | MixMode::NOISE_REDUCTION
    }
}

/// Settings for [`MikMod`](crate::MikMod).
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared object to open; `None` searches the usual library names.
    pub library_path: Option<PathBuf>,
    /// Driver parameter string passed to `MikMod_Init`.
    pub device_params: String,
    pub mix_mode: MixMode,
    /// Upper bound on channels reserved for each loaded module.
    pub max_channels: u16,
    /// Lets loaders pick up hidden patterns past the song end.
    pub curious: bool,
    /// Whether loaded modules restart when they reach the end.
    pub looping: bool,
    /// Fade the volume out during the last pattern.
    pub fadeout: bool,
    /// Period of the mixer update task.
    pub update_interval: Duration,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            library_path: None,
            device_params: String::new(),
            mix_mode: MixMode::default(),
            max_channels: 128,
            curious: false,
            looping: false,
            fadeout: true,
            update_interval: Duration::from_millis(10),
        }
    }
}

impl Config {
    /// Defaults, with the library path and device parameters taken from
    /// `MIKMOD_LIBRARY` and `MIKMOD_DEVICE_PARAMS` when set.
    pub fn from_env() -> Config {
        let mut config = Config::default();
        if let Some(path) = env::var_os(ENV_LIBRARY) {
            config.library_path = Some(PathBuf::from(path));
        }
        if let Ok(params) = env::var(ENV_DEVICE_PARAMS) {
            config.device_params = params;
        }
        config
    }

    pub fn library_path(mut self, path: impl Into<PathBuf>) -> Config {
        self.library_path = Some(path.into());
        self
    }

    pub fn device_params(mut self, params: impl Into<String>) -> Config {
        self.device_params = params.into();
        self
    }

    pub fn mix_mode(mut self, mix_mode: MixMode) -> Config {
        self.mix_mode = mix_mode;
        self
    }

    pub fn max_channels(mut self, max_channels: u16) -> Config {
        self.max_channels = max_channels;
        self
    }

    pub fn curious(mut self, curious: bool) -> Config {
        self.curious = curious;
        self
    }

    pub fn looping(mut self, looping: bool) -> Config {
        self.looping = looping;
        self
    }

    pub fn fadeout(mut self, fadeout: bool) -> Config {
        self.fadeout = fadeout;
        self
    }

    pub fn update_interval(mut self, interval: Duration) -> Config {
        self.update_interval = interval;
        self
    }
}
