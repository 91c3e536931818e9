//! libmikmod opened at runtime with `libloading`.

use libloading::Library;
use log::debug;
use std::ffi::{CStr, OsStr};
use std::os::raw::{c_char, c_int, c_long, c_short, c_ushort};
use std::path::Path;

use super::{from_native, Backend, ModuleHeader};

/// File names tried, in order, when no explicit path is configured.
pub const LIBRARY_NAMES: &[&str] = &[
    "libmikmod.so.3",
    "libmikmod.so",
    "libmikmod.3.dylib",
    "libmikmod.dylib",
    "libmikmod-3.dll",
    "mikmod.dll",
];

type Void = unsafe extern "C" fn();
type Bool = unsafe extern "C" fn() -> c_int;

struct Api {
    get_version: unsafe extern "C" fn() -> c_long,
    init_threads: Bool,
    register_all_drivers: Void,
    register_all_loaders: Void,
    init: unsafe extern "C" fn(*const c_char) -> c_int,
    exit: Void,
    update: Void,
    strerror: unsafe extern "C" fn(c_int) -> *const c_char,
    player_load: unsafe extern "C" fn(*const c_char, c_int, c_int) -> *mut ModuleHeader,
    player_load_mem: unsafe extern "C" fn(*const c_char, c_int, c_int, c_int) -> *mut ModuleHeader,
    player_free: unsafe extern "C" fn(*mut ModuleHeader),
    player_start: unsafe extern "C" fn(*mut ModuleHeader),
    player_stop: Void,
    player_active: Bool,
    player_toggle_pause: Void,
    player_paused: Bool,
    player_set_volume: unsafe extern "C" fn(c_short),
    player_set_position: unsafe extern "C" fn(c_ushort),
    player_next_position: Void,
    player_prev_position: Void,

    md_mode: *mut c_ushort,
    errno: *mut c_int,
}

/// The real libmikmod.
pub struct Native {
    api: Api,
    // Keeps the function pointers in `api` valid; dropped last.
    _lib: Library,
}

// libmikmod serializes its entry points once MikMod_InitThreads has run.
// `MikMod::init` calls it first and refuses to go on when it fails.
unsafe impl Send for Native {}
unsafe impl Sync for Native {}

impl Native {
    /// Opens libmikmod from `path`, or from the first of [`LIBRARY_NAMES`]
    /// the dynamic loader can find.
    pub fn open(path: Option<&Path>) -> Result<Native, libloading::Error> {
        let lib = match path {
            Some(path) => unsafe { Library::new(path)? },
            None => open_any(LIBRARY_NAMES)?,
        };
        let api = unsafe { Api::resolve(&lib)? };
        Ok(Native { api, _lib: lib })
    }
}

fn open_any(names: &[&str]) -> Result<Library, libloading::Error> {
    let mut last = None;
    for name in names {
        match unsafe { Library::new(OsStr::new(name)) } {
            Ok(lib) => {
                debug!("opened {}", name);
                return Ok(lib);
            }
            Err(e) => last = Some(e),
        }
    }
    Err(last.unwrap_or(libloading::Error::DlOpenUnknown))
}

unsafe fn symbol<T: Copy>(lib: &Library, name: &[u8]) -> Result<T, libloading::Error> {
    Ok(*lib.get::<T>(name)?)
}

impl Api {
    unsafe fn resolve(lib: &Library) -> Result<Api, libloading::Error> {
        Ok(Api {
            get_version: symbol(lib, b"MikMod_GetVersion\0")?,
            init_threads: symbol(lib, b"MikMod_InitThreads\0")?,
            register_all_drivers: symbol(lib, b"MikMod_RegisterAllDrivers\0")?,
            register_all_loaders: symbol(lib, b"MikMod_RegisterAllLoaders\0")?,
            init: symbol(lib, b"MikMod_Init\0")?,
            exit: symbol(lib, b"MikMod_Exit\0")?,
            update: symbol(lib, b"MikMod_Update\0")?,
            strerror: symbol(lib, b"MikMod_strerror\0")?,
            player_load: symbol(lib, b"Player_Load\0")?,
            player_load_mem: symbol(lib, b"Player_LoadMem\0")?,
            player_free: symbol(lib, b"Player_Free\0")?,
            player_start: symbol(lib, b"Player_Start\0")?,
            player_stop: symbol(lib, b"Player_Stop\0")?,
            player_active: symbol(lib, b"Player_Active\0")?,
            player_toggle_pause: symbol(lib, b"Player_TogglePause\0")?,
            player_paused: symbol(lib, b"Player_Paused\0")?,
            player_set_volume: symbol(lib, b"Player_SetVolume\0")?,
            player_set_position: symbol(lib, b"Player_SetPosition\0")?,
            player_next_position: symbol(lib, b"Player_NextPosition\0")?,
            player_prev_position: symbol(lib, b"Player_PrevPosition\0")?,
            // data symbols resolve to the variable's address
            md_mode: symbol(lib, b"md_mode\0")?,
            errno: symbol(lib, b"MikMod_errno\0")?,
        })
    }
}

unsafe impl Backend for Native {
    fn version(&self) -> u32 {
        unsafe { (self.api.get_version)() as u32 }
    }

    fn init_threads(&self) -> bool {
        unsafe { (self.api.init_threads)() != 0 }
    }

    fn register_all_drivers(&self) {
        unsafe { (self.api.register_all_drivers)() }
    }

    fn register_all_loaders(&self) {
        unsafe { (self.api.register_all_loaders)() }
    }

    fn set_mode(&self, mode: u16) {
        unsafe { self.api.md_mode.write_volatile(mode) }
    }

    fn init(&self, params: &CStr) -> c_int {
        unsafe { (self.api.init)(params.as_ptr()) }
    }

    fn exit(&self) {
        unsafe { (self.api.exit)() }
    }

    fn update(&self) {
        unsafe { (self.api.update)() }
    }

    fn errno(&self) -> c_int {
        unsafe { self.api.errno.read_volatile() }
    }

    fn strerror(&self, code: c_int) -> String {
        unsafe { from_native((self.api.strerror)(code)) }
    }

    fn load(&self, path: &CStr, max_channels: c_int, curious: bool) -> *mut ModuleHeader {
        unsafe { (self.api.player_load)(path.as_ptr(), max_channels, curious as c_int) }
    }

    fn load_mem(&self, data: &[u8], max_channels: c_int, curious: bool) -> *mut ModuleHeader {
        // `MikMod::load_slice` checks the length before getting here
        let len = match c_int::try_from(data.len()) {
            Ok(len) => len,
            Err(_) => return std::ptr::null_mut(),
        };
        unsafe {
            (self.api.player_load_mem)(
                data.as_ptr() as *const c_char,
                len,
                max_channels,
                curious as c_int,
            )
        }
    }

    unsafe fn free(&self, module: *mut ModuleHeader) {
        (self.api.player_free)(module)
    }

    unsafe fn start(&self, module: *mut ModuleHeader) {
        (self.api.player_start)(module)
    }

    fn stop(&self) {
        unsafe { (self.api.player_stop)() }
    }

    fn active(&self) -> bool {
        unsafe { (self.api.player_active)() != 0 }
    }

    fn toggle_pause(&self) {
        unsafe { (self.api.player_toggle_pause)() }
    }

    fn paused(&self) -> bool {
        unsafe { (self.api.player_paused)() != 0 }
    }

    fn set_volume(&self, volume: i16) {
        unsafe { (self.api.player_set_volume)(volume) }
    }

    fn set_position(&self, position: u16) {
        unsafe { (self.api.player_set_position)(position) }
    }

    fn next_position(&self) {
        unsafe { (self.api.player_next_position)() }
    }

    fn prev_position(&self) {
        unsafe { (self.api.player_prev_position)() }
    }
}
