use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// libmikmod version, as reported by `MikMod_GetVersion`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub revision: u8,
}

impl Version {
    /// Decodes the packed form: byte 0 is the revision, byte 1 the minor and
    /// byte 2 the major version.
    pub fn from_packed(v: u32) -> Version {
        let mut buf = [0; 4];
        LittleEndian::write_u32(&mut buf, v);
        Version {
            major: buf[2],
            minor: buf[1],
            revision: buf[0],
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}
