#![allow(dead_code)]

use mikmod::native::{Backend, ModuleHeader};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

pub const MMERR_OPENING_FILE: c_int = 1;
pub const MMERR_NOT_A_MODULE: c_int = 11;
pub const MMERR_DETECTING_DEVICE: c_int = 15;

/// Observable state of a [`Fake`], shared with the test after the backend
/// has been moved into `MikMod`.
#[derive(Default)]
pub struct State {
    pub calls: Mutex<Vec<String>>,
    pub errno: AtomicI32,
    pub active: AtomicBool,
    pub paused: AtomicBool,
    pub updates: AtomicUsize,
    pub update_threads: Mutex<HashSet<ThreadId>>,
    pub live_modules: AtomicUsize,
    remaining: AtomicUsize,
    playing: AtomicUsize,
}

impl State {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == name).count()
    }

    /// Index of the first call named `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.calls.lock().iter().position(|c| c == name)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

/// In-process stand-in for libmikmod.
///
/// `song.mod`-style paths load; `missing.mod` fails to open. Buffers load
/// when they start with `MOD:`, the rest of the buffer being the title.
/// A started module stays active for `song_length` updates.
pub struct Fake {
    state: Arc<State>,
    init_error: Option<c_int>,
    threads: bool,
    song_length: usize,
    slow_active: Option<Duration>,
}

impl Fake {
    pub fn new() -> Fake {
        Fake {
            state: Arc::new(State::default()),
            init_error: None,
            threads: true,
            song_length: usize::MAX,
            slow_active: None,
        }
    }

    /// A build of libmikmod without thread support.
    pub fn without_threads() -> Fake {
        Fake {
            threads: false,
            ..Fake::new()
        }
    }

    pub fn failing_init(code: c_int) -> Fake {
        Fake {
            init_error: Some(code),
            ..Fake::new()
        }
    }

    /// Modules end by themselves after `updates` mixer updates.
    pub fn song_length(mut self, updates: usize) -> Fake {
        self.song_length = updates;
        self
    }

    /// `Player_Active` takes `delay` when called from the update thread,
    /// holding that thread after the module has ended.
    pub fn slow_active(mut self, delay: Duration) -> Fake {
        self.slow_active = Some(delay);
        self
    }

    pub fn state(&self) -> Arc<State> {
        Arc::clone(&self.state)
    }

    fn fail(&self, code: c_int) -> *mut ModuleHeader {
        self.state.errno.store(code, Ordering::SeqCst);
        ptr::null_mut()
    }

    fn alloc(&self, title: &str, tracker: &str) -> *mut ModuleHeader {
        let header = ModuleHeader {
            songname: cstr(title),
            modtype: cstr(tracker),
            comment: cstr("made with\rlove"),
            numchn: 4,
            numvoices: 8,
            numpos: 12,
            numpat: 9,
            numins: 15,
            numsmp: 15,
            sngtime: 5 * 1024,
            ..ModuleHeader::default()
        };
        self.state.live_modules.fetch_add(1, Ordering::SeqCst);
        Box::into_raw(Box::new(header))
    }
}

fn cstr(s: &str) -> *mut c_char {
    CString::new(s).unwrap().into_raw()
}

unsafe fn free_cstr(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

unsafe impl Backend for Fake {
    fn version(&self) -> u32 {
        0x03030b
    }

    fn init_threads(&self) -> bool {
        self.state.record("init_threads");
        self.threads
    }

    fn register_all_drivers(&self) {
        self.state.record("register_all_drivers");
    }

    fn register_all_loaders(&self) {
        self.state.record("register_all_loaders");
    }

    fn set_mode(&self, mode: u16) {
        self.state.record(format!("set_mode({:#06x})", mode));
    }

    fn init(&self, params: &CStr) -> c_int {
        self.state
            .record(format!("init({})", params.to_string_lossy()));
        match self.init_error {
            Some(code) => {
                self.state.errno.store(code, Ordering::SeqCst);
                1
            }
            None => 0,
        }
    }

    fn exit(&self) {
        self.state.record("exit");
    }

    fn update(&self) {
        let state = &self.state;
        state.update_threads.lock().insert(thread::current().id());
        state.updates.fetch_add(1, Ordering::SeqCst);
        if state.active.load(Ordering::SeqCst) && !state.paused.load(Ordering::SeqCst) {
            let left = state.remaining.fetch_sub(1, Ordering::SeqCst);
            if left <= 1 {
                state.active.store(false, Ordering::SeqCst);
            }
        }
    }

    fn errno(&self) -> c_int {
        self.state.errno.load(Ordering::SeqCst)
    }

    fn strerror(&self, code: c_int) -> String {
        let msg = match code {
            MMERR_OPENING_FILE => "Could not open requested file",
            MMERR_NOT_A_MODULE => "Unknown module format",
            MMERR_DETECTING_DEVICE => "Could not find a suitable driver",
            _ => "Unknown error",
        };
        msg.to_string()
    }

    fn load(&self, path: &CStr, _max_channels: c_int, _curious: bool) -> *mut ModuleHeader {
        let path = path.to_string_lossy();
        self.state.record(format!("load({})", path));
        if path.ends_with("missing.mod") {
            return self.fail(MMERR_OPENING_FILE);
        }
        let title = path.trim_end_matches(".mod").to_string();
        self.alloc(&title, "Protracker")
    }

    fn load_mem(&self, data: &[u8], _max_channels: c_int, _curious: bool) -> *mut ModuleHeader {
        self.state.record(format!("load_mem({})", data.len()));
        match data.strip_prefix(b"MOD:") {
            Some(title) => self.alloc(&String::from_utf8_lossy(title), "Impulse Tracker"),
            None => self.fail(MMERR_NOT_A_MODULE),
        }
    }

    unsafe fn free(&self, module: *mut ModuleHeader) {
        self.state.record("free");
        if self.state.playing.load(Ordering::SeqCst) == module as usize {
            // libmikmod stops a module that is freed while playing
            self.state.active.store(false, Ordering::SeqCst);
        }
        let header = Box::from_raw(module);
        free_cstr(header.songname);
        free_cstr(header.modtype);
        free_cstr(header.comment);
        self.state.live_modules.fetch_sub(1, Ordering::SeqCst);
    }

    unsafe fn start(&self, module: *mut ModuleHeader) {
        self.state.record("start");
        self.state.playing.store(module as usize, Ordering::SeqCst);
        self.state
            .remaining
            .store(self.song_length, Ordering::SeqCst);
        self.state.paused.store(false, Ordering::SeqCst);
        self.state.active.store(true, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.state.record("stop");
        self.state.playing.store(0, Ordering::SeqCst);
        self.state.active.store(false, Ordering::SeqCst);
    }

    fn active(&self) -> bool {
        let active = self.state.active.load(Ordering::SeqCst);
        if let Some(delay) = self.slow_active {
            if thread::current().name() == Some("mikmod-update") {
                thread::sleep(delay);
            }
        }
        active
    }

    fn toggle_pause(&self) {
        self.state.record("toggle_pause");
        self.state.paused.fetch_xor(true, Ordering::SeqCst);
    }

    fn paused(&self) -> bool {
        self.state.paused.load(Ordering::SeqCst)
    }

    fn set_volume(&self, volume: i16) {
        self.state.record(format!("set_volume({})", volume));
    }

    fn set_position(&self, position: u16) {
        self.state.record(format!("set_position({})", position));
    }

    fn next_position(&self) {
        self.state.record("next_position");
    }

    fn prev_position(&self) {
        self.state.record("prev_position");
    }
}

/// Polls `f` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut f: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if f() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
