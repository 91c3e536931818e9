mod info;

use log::debug;
use std::fmt;
use std::os::raw::c_int;
use std::ptr::{self, NonNull};
use std::time::Duration;

use crate::native::{from_native, Backend, ModuleHeader, Native};
use crate::MikMod;

/// A loaded module. Freed by [`Module::close`] or when dropped; if it is
/// the module being played, playback is stopped first.
pub struct Module<'a, B: Backend = Native> {
    lib: &'a MikMod<B>,
    raw: NonNull<ModuleHeader>,
}

// Reads a field the player thread updates while the module plays.
macro_rules! live {
    ($module:expr, $field:ident) => {
        unsafe { ptr::addr_of!((*$module.raw.as_ptr()).$field).read_volatile() }
    };
}

impl<'a, B: Backend> Module<'a, B> {
    pub(crate) fn new(
        lib: &'a MikMod<B>,
        raw: NonNull<ModuleHeader>,
        looping: bool,
        fadeout: bool,
    ) -> Module<'a, B> {
        unsafe {
            let m = raw.as_ptr();
            (*m).r#loop = looping as c_int;
            (*m).fadeout = fadeout as c_int;
        }
        Module { lib, raw }
    }

    pub(crate) fn as_ptr(&self) -> *mut ModuleHeader {
        self.raw.as_ptr()
    }

    fn header(&self) -> &ModuleHeader {
        unsafe { self.raw.as_ref() }
    }

    /// Song name.
    pub fn title(&self) -> String {
        unsafe { from_native(self.header().songname) }
    }

    /// Name of the tracker (module format) the song was made with.
    pub fn tracker(&self) -> String {
        unsafe { from_native(self.header().modtype) }
    }

    pub fn comment(&self) -> String {
        unsafe { from_native(self.header().comment) }
    }

    pub fn num_channels(&self) -> usize {
        self.header().numchn as usize
    }

    /// Voices reserved by the player for real and virtual channels.
    pub fn num_voices(&self) -> usize {
        self.header().numvoices as usize
    }

    pub fn num_positions(&self) -> usize {
        self.header().numpos as usize
    }

    pub fn num_patterns(&self) -> usize {
        self.header().numpat as usize
    }

    pub fn num_instruments(&self) -> usize {
        self.header().numins as usize
    }

    pub fn num_samples(&self) -> usize {
        self.header().numsmp as usize
    }

    /// Time played since the song started.
    pub fn elapsed(&self) -> Duration {
        ticks_to_duration(live!(self, sngtime))
    }

    /// Ticks per row.
    pub fn speed(&self) -> u16 {
        live!(self, sngspd)
    }

    /// Beats per minute.
    pub fn tempo(&self) -> u16 {
        live!(self, bpm)
    }

    /// Current song position.
    pub fn position(&self) -> i16 {
        live!(self, sngpos)
    }

    /// Current row in the pattern being played.
    pub fn row(&self) -> u16 {
        live!(self, patpos)
    }

    pub fn is_looping(&self) -> bool {
        self.header().r#loop != 0
    }

    pub fn has_fadeout(&self) -> bool {
        self.header().fadeout != 0
    }

    pub fn info_str(&self) -> String {
        info::info_module(self)
    }

    /// Frees the module.
    pub fn close(self) -> crate::Result<()> {
        drop(self);
        Ok(())
    }
}

impl<B: Backend> Drop for Module<'_, B> {
    fn drop(&mut self) {
        self.lib.player().release(self.raw.as_ptr());
        unsafe { self.lib.backend().free(self.raw.as_ptr()) };
        debug!("module freed");
    }
}

impl<B: Backend> fmt::Display for Module<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.info_str())
    }
}

/// Converts libmikmod song time (1/1024 s units) to a duration with
/// millisecond precision.
fn ticks_to_duration(ticks: u32) -> Duration {
    Duration::from_millis(u64::from(ticks) * 1000 / 1024)
}
