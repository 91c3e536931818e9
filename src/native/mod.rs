//! The foreign side: libmikmod's data layout, the calls the wrapper makes,
//! and string marshaling between Rust and C.

pub mod mikmod;

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::path::Path;
use std::ptr;

use crate::error::{Error, Result};

pub use self::mikmod::Native;

/// `UF_MAXCHAN` in mikmod.h.
pub const UF_MAXCHAN: usize = 64;

/// Leading fields of libmikmod's `MODULE`, up to and including `relspd`.
///
/// Only ever used behind a pointer handed out by the library, so the
/// remaining (internal) fields are never touched.
#[repr(C)]
pub struct ModuleHeader {
    pub songname: *mut c_char,
    pub modtype: *mut c_char,
    pub comment: *mut c_char,

    pub flags: u16,
    pub numchn: u8,
    pub numvoices: u8,
    pub numpos: u16,
    pub numpat: u16,
    pub numins: u16,
    pub numsmp: u16,
    pub instruments: *mut c_void,
    pub samples: *mut c_void,
    pub realchn: u8,
    pub totalchn: u8,

    pub reppos: u16,
    pub initspeed: u8,
    pub inittempo: u16,
    pub initvolume: u8,
    pub panning: [u16; UF_MAXCHAN],
    pub chanvol: [u8; UF_MAXCHAN],
    pub bpm: u16,
    pub sngspd: u16,
    pub volume: i16,

    pub extspd: c_int,
    pub panflag: c_int,
    pub wrap: c_int,
    pub r#loop: c_int,
    pub fadeout: c_int,

    pub patpos: u16,
    pub sngpos: i16,
    /// Song time in units of 2^-10 seconds.
    pub sngtime: u32,

    pub relspd: i16,
}

impl Default for ModuleHeader {
    fn default() -> ModuleHeader {
        ModuleHeader {
            songname: ptr::null_mut(),
            modtype: ptr::null_mut(),
            comment: ptr::null_mut(),
            flags: 0,
            numchn: 0,
            numvoices: 0,
            numpos: 0,
            numpat: 0,
            numins: 0,
            numsmp: 0,
            instruments: ptr::null_mut(),
            samples: ptr::null_mut(),
            realchn: 0,
            totalchn: 0,
            reppos: 0,
            initspeed: 6,
            inittempo: 125,
            initvolume: 128,
            panning: [0; UF_MAXCHAN],
            chanvol: [64; UF_MAXCHAN],
            bpm: 125,
            sngspd: 6,
            volume: 128,
            extspd: 1,
            panflag: 1,
            wrap: 0,
            r#loop: 1,
            fadeout: 0,
            patpos: 0,
            sngpos: 0,
            sngtime: 0,
            relspd: 0,
        }
    }
}

/// The native calls made by this crate.
///
/// # Safety
///
/// Implementors must return either null or a pointer to a live
/// [`ModuleHeader`] from the load functions, and keep it valid until it is
/// passed to [`Backend::free`]. All methods may be called from the update
/// thread as well as from the caller's thread.
pub unsafe trait Backend: Send + Sync + 'static {
    /// `MikMod_GetVersion`, packed as `major << 16 | minor << 8 | revision`.
    fn version(&self) -> u32;

    /// `MikMod_InitThreads`. Returning false makes initialization fail,
    /// since the other methods are then not safe to call concurrently.
    fn init_threads(&self) -> bool;
    fn register_all_drivers(&self);
    fn register_all_loaders(&self);
    /// Writes `md_mode`.
    fn set_mode(&self, mode: u16);
    /// `MikMod_Init`; zero on success.
    fn init(&self, params: &CStr) -> c_int;
    fn exit(&self);
    fn update(&self);

    /// Current value of `MikMod_errno`.
    fn errno(&self) -> c_int;
    fn strerror(&self, code: c_int) -> String;

    fn load(&self, path: &CStr, max_channels: c_int, curious: bool) -> *mut ModuleHeader;
    fn load_mem(&self, data: &[u8], max_channels: c_int, curious: bool) -> *mut ModuleHeader;

    /// # Safety
    /// `module` must come from this backend's load functions and not have
    /// been freed.
    unsafe fn free(&self, module: *mut ModuleHeader);

    /// # Safety
    /// Same requirements as [`Backend::free`].
    unsafe fn start(&self, module: *mut ModuleHeader);

    fn stop(&self);
    fn active(&self) -> bool;
    fn toggle_pause(&self);
    fn paused(&self) -> bool;
    fn set_volume(&self, volume: i16);
    fn set_position(&self, position: u16);
    fn next_position(&self);
    fn prev_position(&self);
}

/// Copies `s` into a NUL-terminated native string. The copy is released when
/// the returned value drops, so keep it alive for the duration of the call.
pub fn to_native(s: &str) -> Result<CString> {
    Ok(CString::new(s)?)
}

/// Like [`to_native`] for filesystem paths.
pub fn path_to_native(path: &Path) -> Result<CString> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        Ok(CString::new(path.as_os_str().as_bytes())?)
    }
    #[cfg(not(unix))]
    {
        match path.to_str() {
            Some(s) => to_native(s),
            None => Err(Error::InvalidPath(path.to_path_buf())),
        }
    }
}

/// Converts the length of an in-memory module to the type libmikmod takes.
/// Empty buffers and buffers past `c_int::MAX` bytes are rejected before
/// they reach the library.
pub fn buffer_len(len: usize) -> Result<c_int> {
    if len == 0 {
        return Err(Error::EmptyBuffer);
    }
    c_int::try_from(len).map_err(|_| Error::BufferTooLarge(len))
}

/// Copies a native string into an owned `String`. Null reads as empty;
/// invalid UTF-8 is replaced.
///
/// # Safety
/// `s` must be null or point to a NUL-terminated string.
pub unsafe fn from_native(s: *const c_char) -> String {
    if s.is_null() {
        String::new()
    } else {
        CStr::from_ptr(s).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_is_rejected() {
        match to_native("bad\0name") {
            Err(Error::Nul(e)) => assert_eq!(e.nul_position(), 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn empty_string_is_valid() {
        let s = to_native("").unwrap();
        assert_eq!(s.as_bytes_with_nul(), b"\0");
    }

    #[test]
    fn path_round_trip() {
        let s = path_to_native(Path::new("songs/space debris.mod")).unwrap();
        assert_eq!(s.to_str().unwrap(), "songs/space debris.mod");
    }

    #[test]
    fn buffer_length_limits() {
        assert!(matches!(buffer_len(0), Err(Error::EmptyBuffer)));
        assert_eq!(buffer_len(5).unwrap(), 5);
        assert_eq!(buffer_len(c_int::MAX as usize).unwrap(), c_int::MAX);

        let too_large = c_int::MAX as usize + 1;
        match buffer_len(too_large) {
            Err(e @ Error::BufferTooLarge(_)) => {
                assert!(e.is_load());
                assert_eq!(
                    e.to_string(),
                    format!(
                        "failed to load module: buffer of {} bytes is too large",
                        too_large
                    )
                );
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn null_reads_empty() {
        assert_eq!(unsafe { from_native(ptr::null()) }, "");
    }

    #[test]
    fn lossy_utf8() {
        let raw = CString::new(vec![b'a', 0xff, b'b']).unwrap();
        assert_eq!(unsafe { from_native(raw.as_ptr()) }, "a\u{fffd}b");
    }
}
