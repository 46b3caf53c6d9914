//! Inspection of precompiled binaries.
//!
//! Precompiled nodes ask a [`BinaryInspector`] for their linking mode and
//! architectures the first time those are needed. The default
//! [`MachOInspector`] reads the Mach-O, fat, and `ar` headers directly.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// How a precompiled binary is linked into its dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Linking {
    /// Archived into the dependent at link time.
    Static,
    /// Loaded at runtime and embedded in the final bundle.
    Dynamic,
}

/// A CPU architecture slice found in a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    /// 64-bit Intel.
    X86_64,
    /// 32-bit Intel.
    I386,
    /// 32-bit ARM v7.
    Armv7,
    /// 32-bit ARM v7s.
    Armv7s,
    /// 32-bit ARM v7k.
    Armv7k,
    /// 64-bit ARM.
    Arm64,
    /// 64-bit ARM with pointer authentication.
    Arm64e,
    /// 64-bit ARM with 32-bit pointers.
    #[serde(rename = "arm64_32")]
    Arm64_32,
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Architecture::X86_64 => "x86_64",
            Architecture::I386 => "i386",
            Architecture::Armv7 => "armv7",
            Architecture::Armv7s => "armv7s",
            Architecture::Armv7k => "armv7k",
            Architecture::Arm64 => "arm64",
            Architecture::Arm64e => "arm64e",
            Architecture::Arm64_32 => "arm64_32",
        };
        f.write_str(name)
    }
}

/// What inspecting a binary reveals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMetadata {
    /// Static or dynamic linking.
    pub linking: Linking,
    /// Architectures present, sorted and deduplicated.
    pub architectures: Vec<Architecture>,
}

/// Failure to inspect a precompiled binary.
///
/// Recoverable: callers decide whether a failed inspection matters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BinaryError {
    /// The binary could not be read.
    #[error("couldn't read binary at {}: {reason}", path.display())]
    Io {
        /// Path of the binary.
        path: PathBuf,
        /// The underlying I/O error message.
        reason: String,
    },

    /// The binary's headers are not a recognized layout.
    #[error("malformed binary at {}: {reason}", path.display())]
    Malformed {
        /// Path of the binary.
        path: PathBuf,
        /// What was wrong with the headers.
        reason: String,
    },
}

/// Determines the linking mode and architectures of a binary.
pub trait BinaryInspector: Send + Sync {
    /// Inspects the binary at `binary_path`.
    fn inspect(&self, binary_path: &Path) -> Result<BinaryMetadata, BinaryError>;
}

/// Reads Mach-O, universal (fat), and `ar` archive headers from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct MachOInspector;

impl BinaryInspector for MachOInspector {
    fn inspect(&self, binary_path: &Path) -> Result<BinaryMetadata, BinaryError> {
        let bytes = std::fs::read(binary_path).map_err(|e| BinaryError::Io {
            path: binary_path.to_path_buf(),
            reason: e.to_string(),
        })?;
        parse_binary(&bytes).map_err(|reason| BinaryError::Malformed {
            path: binary_path.to_path_buf(),
            reason,
        })
    }
}

const AR_MAGIC: &[u8] = b"!<arch>\n";
const AR_HEADER_LEN: usize = 60;
const FAT_MAGIC: u32 = 0xcafe_babe;
const FAT_MAGIC_64: u32 = 0xcafe_babf;
const MH_MAGIC: u32 = 0xfeed_face;
const MH_MAGIC_64: u32 = 0xfeed_facf;
const MH_CIGAM: u32 = 0xcefa_edfe;
const MH_CIGAM_64: u32 = 0xcffa_edfe;
const MH_DYLIB: u32 = 6;
const MH_DYLIB_STUB: u32 = 9;

const CPU_TYPE_X86: u32 = 7;
const CPU_TYPE_X86_64: u32 = 0x0100_0007;
const CPU_TYPE_ARM: u32 = 12;
const CPU_TYPE_ARM64: u32 = 0x0100_000c;
const CPU_TYPE_ARM64_32: u32 = 0x0200_000c;
const CPU_SUBTYPE_MASK: u32 = 0x00ff_ffff;

fn parse_binary(bytes: &[u8]) -> Result<BinaryMetadata, String> {
    if bytes.starts_with(AR_MAGIC) {
        return parse_archive(bytes);
    }
    match read_u32(bytes, 0, true)? {
        FAT_MAGIC => parse_fat(bytes, false),
        FAT_MAGIC_64 => parse_fat(bytes, true),
        _ => {
            let (cputype, subtype, filetype) = thin_header(bytes)?;
            Ok(BinaryMetadata {
                linking: linking_for(filetype),
                architectures: architecture(cputype, subtype).into_iter().collect(),
            })
        }
    }
}

fn parse_fat(bytes: &[u8], is_64: bool) -> Result<BinaryMetadata, String> {
    let count = read_u32(bytes, 4, true)? as usize;
    if count == 0 {
        return Err("universal binary has no slices".to_string());
    }
    let entry_len = if is_64 { 32 } else { 20 };
    let mut architectures = BTreeSet::new();
    let mut first_offset = None;
    for index in 0..count {
        let base = 8 + index * entry_len;
        let cputype = read_u32(bytes, base, true)?;
        let subtype = read_u32(bytes, base + 4, true)?;
        let offset = if is_64 {
            read_u64(bytes, base + 8)? as usize
        } else {
            read_u32(bytes, base + 8, true)? as usize
        };
        architectures.extend(architecture(cputype, subtype));
        first_offset.get_or_insert(offset);
    }

    let offset = first_offset.unwrap_or_default();
    let slice = bytes
        .get(offset..)
        .ok_or_else(|| format!("slice offset {offset} is past the end of the file"))?;
    let linking = if slice.starts_with(AR_MAGIC) {
        Linking::Static
    } else {
        linking_for(thin_header(slice)?.2)
    };

    Ok(BinaryMetadata {
        linking,
        architectures: architectures.into_iter().collect(),
    })
}

fn parse_archive(bytes: &[u8]) -> Result<BinaryMetadata, String> {
    let mut architectures = BTreeSet::new();
    let mut offset = AR_MAGIC.len();
    while offset + AR_HEADER_LEN <= bytes.len() {
        let header = &bytes[offset..offset + AR_HEADER_LEN];
        let name = String::from_utf8_lossy(&header[0..16]);
        let size: usize = std::str::from_utf8(&header[48..58])
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| format!("invalid archive member size at offset {offset}"))?;

        let start = offset + AR_HEADER_LEN;
        let end = start
            .checked_add(size)
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| format!("archive member at offset {offset} exceeds the file"))?;
        let mut data = &bytes[start..end];

        // BSD archives store long member names inline, ahead of the data.
        if let Some(len) = name.trim_end().strip_prefix("#1/") {
            let len: usize = len
                .parse()
                .map_err(|_| format!("invalid extended name length at offset {offset}"))?;
            data = data.get(len..).unwrap_or_default();
        }
        if let Ok((cputype, subtype, _)) = thin_header(data) {
            architectures.extend(architecture(cputype, subtype));
        }

        offset = end + size % 2;
    }

    Ok(BinaryMetadata {
        linking: Linking::Static,
        architectures: architectures.into_iter().collect(),
    })
}

/// Returns `(cputype, cpusubtype, filetype)` of a thin Mach-O header.
fn thin_header(bytes: &[u8]) -> Result<(u32, u32, u32), String> {
    let big_endian = match read_u32(bytes, 0, false)? {
        MH_MAGIC | MH_MAGIC_64 => false,
        MH_CIGAM | MH_CIGAM_64 => true,
        other => return Err(format!("unrecognized magic {other:#010x}")),
    };
    Ok((
        read_u32(bytes, 4, big_endian)?,
        read_u32(bytes, 8, big_endian)?,
        read_u32(bytes, 12, big_endian)?,
    ))
}

fn linking_for(filetype: u32) -> Linking {
    match filetype {
        MH_DYLIB | MH_DYLIB_STUB => Linking::Dynamic,
        _ => Linking::Static,
    }
}

fn architecture(cputype: u32, subtype: u32) -> Option<Architecture> {
    let subtype = subtype & CPU_SUBTYPE_MASK;
    match cputype {
        CPU_TYPE_X86 => Some(Architecture::I386),
        CPU_TYPE_X86_64 => Some(Architecture::X86_64),
        CPU_TYPE_ARM => match subtype {
            9 => Some(Architecture::Armv7),
            11 => Some(Architecture::Armv7s),
            12 => Some(Architecture::Armv7k),
            _ => None,
        },
        CPU_TYPE_ARM64 if subtype == 2 => Some(Architecture::Arm64e),
        CPU_TYPE_ARM64 => Some(Architecture::Arm64),
        CPU_TYPE_ARM64_32 => Some(Architecture::Arm64_32),
        _ => None,
    }
}

fn read_u32(bytes: &[u8], offset: usize, big_endian: bool) -> Result<u32, String> {
    let raw: [u8; 4] = bytes
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| format!("truncated header at offset {offset}"))?;
    Ok(if big_endian {
        u32::from_be_bytes(raw)
    } else {
        u32::from_le_bytes(raw)
    })
}

fn read_u64(bytes: &[u8], offset: usize) -> Result<u64, String> {
    let raw: [u8; 8] = bytes
        .get(offset..offset + 8)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| format!("truncated header at offset {offset}"))?;
    Ok(u64::from_be_bytes(raw))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const MH_OBJECT: u32 = 1;

    /// A 64-bit little-endian Mach-O header padded to 32 bytes.
    pub(crate) fn thin(cputype: u32, subtype: u32, filetype: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        for word in [MH_MAGIC_64, cputype, subtype, filetype, 0, 0, 0, 0] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    pub(crate) fn dynamic_arm64() -> Vec<u8> {
        thin(CPU_TYPE_ARM64, 0, MH_DYLIB)
    }

    pub(crate) fn static_archive() -> Vec<u8> {
        let member = thin(CPU_TYPE_ARM64, 0, MH_OBJECT);
        let mut bytes = AR_MAGIC.to_vec();
        bytes.extend_from_slice(format!("{:<16}", "a.o/").as_bytes());
        bytes.extend_from_slice(format!("{:<12}{:<6}{:<6}{:<8}", 0, 0, 0, 644).as_bytes());
        bytes.extend_from_slice(format!("{:<10}", member.len()).as_bytes());
        bytes.extend_from_slice(b"`\n");
        bytes.extend_from_slice(&member);
        bytes
    }

    #[test]
    fn thin_dylib_is_dynamic() {
        let meta = parse_binary(&dynamic_arm64()).unwrap();
        assert_eq!(meta.linking, Linking::Dynamic);
        assert_eq!(meta.architectures, vec![Architecture::Arm64]);
    }

    #[test]
    fn thin_object_is_static() {
        let meta = parse_binary(&thin(CPU_TYPE_X86_64, 3, MH_OBJECT)).unwrap();
        assert_eq!(meta.linking, Linking::Static);
        assert_eq!(meta.architectures, vec![Architecture::X86_64]);
    }

    #[test]
    fn arm64e_subtype() {
        let meta = parse_binary(&thin(CPU_TYPE_ARM64, 2, MH_DYLIB)).unwrap();
        assert_eq!(meta.architectures, vec![Architecture::Arm64e]);
    }

    #[test]
    fn fat_binary_lists_every_slice() {
        let first = thin(CPU_TYPE_X86_64, 3, MH_DYLIB);
        let second = dynamic_arm64();
        let header_len = 8 + 2 * 20;
        let mut bytes = Vec::new();
        for word in [FAT_MAGIC, 2] {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        let offsets = [header_len, header_len + first.len()];
        for (cputype, offset, len) in [
            (CPU_TYPE_X86_64, offsets[0], first.len()),
            (CPU_TYPE_ARM64, offsets[1], second.len()),
        ] {
            for word in [cputype, 0, offset as u32, len as u32, 0] {
                bytes.extend_from_slice(&word.to_be_bytes());
            }
        }
        bytes.extend_from_slice(&first);
        bytes.extend_from_slice(&second);

        let meta = parse_binary(&bytes).unwrap();
        assert_eq!(meta.linking, Linking::Dynamic);
        assert_eq!(meta.architectures, vec![Architecture::X86_64, Architecture::Arm64]);
    }

    #[test]
    fn archive_is_static() {
        let meta = parse_binary(&static_archive()).unwrap();
        assert_eq!(meta.linking, Linking::Static);
        assert_eq!(meta.architectures, vec![Architecture::Arm64]);
    }

    #[test]
    fn garbage_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libGarbage.a");
        std::fs::write(&path, b"not a binary at all").unwrap();
        let err = MachOInspector.inspect(&path).unwrap_err();
        assert!(matches!(err, BinaryError::Malformed { .. }));
    }

    #[test]
    fn missing_binary_is_io_error() {
        let err = MachOInspector.inspect(Path::new("/nonexistent/libX.a")).unwrap_err();
        assert!(matches!(err, BinaryError::Io { .. }));
    }

    #[test]
    fn truncated_header_is_malformed() {
        assert!(parse_binary(&[0xcf, 0xfa]).is_err());
    }
}
