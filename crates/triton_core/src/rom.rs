//! ROM images and per-variant load plans.
//!
//! The monitor and BASIC shipped on a handful of EPROM sets over the
//! machine's life; each CLI selector maps to a fixed table of files,
//! start addresses and sizes. Files are copied into memory verbatim.

use std::fmt;
use std::path::Path;

/// Accepted EPROM sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RomSize {
    K1,
    K2,
    K4,
    K8,
}

impl RomSize {
    pub fn bytes(self) -> usize {
        match self {
            RomSize::K1 => 0x400,
            RomSize::K2 => 0x800,
            RomSize::K4 => 0x1000,
            RomSize::K8 => 0x2000,
        }
    }
}

/// Errors raised while assembling the memory image at startup.
#[derive(Debug)]
pub enum RomError {
    /// Underlying I/O error (file not found, permission denied, etc.)
    Io {
        path: String,
        source: std::io::Error,
    },
    /// ROM file size does not match the expected EPROM size.
    BadLength {
        path: String,
        expected: usize,
        actual: usize,
    },
    /// The CLI selector names no known ROM set.
    UnknownVariant(String),
}

impl fmt::Display for RomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read ROM {path}: {source}"),
            Self::BadLength {
                path,
                expected,
                actual,
            } => write!(f, "ROM {path}: expected {expected} bytes, got {actual}"),
            Self::UnknownVariant(arg) => write!(f, "unknown ROM variant {arg:?}"),
        }
    }
}

impl std::error::Error for RomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// One file of a load plan.
#[derive(Clone, Copy, Debug)]
pub struct RomFile {
    pub path: &'static str,
    pub start: u16,
    pub size: RomSize,
}

const fn rom(path: &'static str, start: u16, size: RomSize) -> RomFile {
    RomFile { path, start, size }
}

/// Monitor/BASIC generations selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RomVariant {
    /// No selector: the combined 7.2 images in the working directory.
    Default,
    L41,
    L51,
    L52,
    L72,
    L72Dec,
}

/// Resolve the optional CLI selector.
pub fn parse_variant(arg: Option<&str>) -> Result<RomVariant, RomError> {
    match arg {
        None => Ok(RomVariant::Default),
        Some("4.1") => Ok(RomVariant::L41),
        Some("5.1") => Ok(RomVariant::L51),
        Some("5.2") => Ok(RomVariant::L52),
        Some("7.2") => Ok(RomVariant::L72),
        Some("7.2DEC") => Ok(RomVariant::L72Dec),
        Some(other) => Err(RomError::UnknownVariant(other.to_string())),
    }
}

/// The file table for a variant, preserved from the original distribution.
pub fn load_plan(variant: RomVariant) -> &'static [RomFile] {
    use RomSize::{K1, K8};
    match variant {
        RomVariant::Default => {
            const PLAN: &[RomFile] = &[
                rom("MONA72.ROM", 0x0000, K1),
                rom("MONB72.ROM", 0x0c00, K1),
                rom("BASIC72.ROM", 0xe000, K8),
            ];
            PLAN
        }
        RomVariant::L41 => {
            const PLAN: &[RomFile] = &[
                rom("roms/L4.1 MONITOR.BIN", 0x0000, K1),
                rom("roms/L4.1A BASIC.BIN", 0x0400, K1),
                rom("roms/L4.1B BASIC.BIN", 0x0800, K1),
            ];
            PLAN
        }
        RomVariant::L51 => {
            const PLAN: &[RomFile] = &[
                rom("roms/ROM_5.1A.BIN", 0x0000, K1),
                rom("roms/ROM_5.1A BASIC.BIN", 0x0400, K1),
                rom("roms/ROM_5.1B BASIC.BIN", 0x0800, K1),
                rom("roms/ROM_5.1B.BIN", 0x0c00, K1),
            ];
            PLAN
        }
        RomVariant::L52 => {
            const PLAN: &[RomFile] = &[
                rom("roms/ROM_5.2A.BIN", 0x0000, K1),
                rom("roms/ROM_5.1A BASIC.BIN", 0x0400, K1),
                rom("roms/ROM_5.1B BASIC.BIN", 0x0800, K1),
                rom("roms/ROM_5.2B.BIN", 0x0c00, K1),
            ];
            PLAN
        }
        RomVariant::L72 => {
            const PLAN: &[RomFile] = &[
                rom("roms/ROM_7.2A.BIN", 0x0000, K1),
                rom("roms/ROM_7.2B.BIN", 0x0c00, K1),
                rom("roms/L7.2A BASIC.BIN", 0xe000, K1),
                rom("roms/L7.2B BASIC.BIN", 0xe400, K1),
                rom("roms/L7.2C BASIC.BIN", 0xe800, K1),
                rom("roms/L7.2D BASIC.BIN", 0xec00, K1),
                rom("roms/L7.2E BASIC.BIN", 0xf000, K1),
                rom("roms/L7.2F BASIC.BIN", 0xf400, K1),
                rom("roms/L7.2G BASIC.BIN", 0xf800, K1),
                rom("roms/L7.2H BASIC.BIN", 0xfc00, K1),
            ];
            PLAN
        }
        RomVariant::L72Dec => {
            const PLAN: &[RomFile] = &[
                rom("roms/ROM_7.2A.BIN", 0x0000, K1),
                rom("roms/ROM_7.2B.BIN", 0x0c00, K1),
                rom("roms/L7.2A BASIC 31DECEMBER2020.BIN", 0xe000, K1),
                rom("roms/L7.2B BASIC 31DECEMBER2020.BIN", 0xe400, K1),
                rom("roms/L7.2C BASIC 31DECEMBER2020.BIN", 0xe800, K1),
                rom("roms/L7.2D BASIC 31DECEMBER2020.BIN", 0xec00, K1),
                rom("roms/L7.2E BASIC 31DECEMBER2020.BIN", 0xf000, K1),
                rom("roms/L7.2F BASIC 31DECEMBER2020.BIN", 0xf400, K1),
                rom("roms/L7.2G BASIC 31DECEMBER2020.BIN", 0xf800, K1),
                rom("roms/L7.2H BASIC 31DECEMBER2020.BIN", 0xfc00, K1),
            ];
            PLAN
        }
    }
}

/// Copy one ROM file into memory at its start address.
pub fn load_file(
    memory: &mut [u8],
    path: &Path,
    start: u16,
    size: RomSize,
) -> Result<(), RomError> {
    let display = path.display().to_string();
    let data = std::fs::read(path).map_err(|source| RomError::Io {
        path: display.clone(),
        source,
    })?;
    if data.len() != size.bytes() {
        return Err(RomError::BadLength {
            path: display,
            expected: size.bytes(),
            actual: data.len(),
        });
    }
    let start = start as usize;
    memory[start..start + data.len()].copy_from_slice(&data);
    log::info!("loaded {display} at {start:#06x} ({} bytes)", data.len());
    Ok(())
}

/// Load a whole variant's plan into memory.
pub fn load_variant(memory: &mut [u8], variant: RomVariant) -> Result<(), RomError> {
    for file in load_plan(variant) {
        load_file(memory, Path::new(file.path), file.start, file.size)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load_file, load_plan, parse_variant, RomError, RomSize, RomVariant};
    use std::path::Path;

    #[test]
    fn selector_parsing() {
        assert_eq!(parse_variant(None).unwrap(), RomVariant::Default);
        assert_eq!(parse_variant(Some("4.1")).unwrap(), RomVariant::L41);
        assert_eq!(parse_variant(Some("5.1")).unwrap(), RomVariant::L51);
        assert_eq!(parse_variant(Some("5.2")).unwrap(), RomVariant::L52);
        assert_eq!(parse_variant(Some("7.2")).unwrap(), RomVariant::L72);
        assert_eq!(parse_variant(Some("7.2DEC")).unwrap(), RomVariant::L72Dec);
        assert!(matches!(
            parse_variant(Some("9.9")),
            Err(RomError::UnknownVariant(_))
        ));
    }

    #[test]
    fn plans_stay_inside_memory() {
        for variant in [
            RomVariant::Default,
            RomVariant::L41,
            RomVariant::L51,
            RomVariant::L52,
            RomVariant::L72,
            RomVariant::L72Dec,
        ] {
            for file in load_plan(variant) {
                let end = file.start as usize + file.size.bytes();
                assert!(end <= 0x10000, "{} overruns memory", file.path);
            }
        }
    }

    #[test]
    fn default_plan_matches_the_distribution() {
        let plan = load_plan(RomVariant::Default);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].path, "MONA72.ROM");
        assert_eq!(plan[0].start, 0x0000);
        assert_eq!(plan[1].path, "MONB72.ROM");
        assert_eq!(plan[1].start, 0x0c00);
        assert_eq!(plan[2].path, "BASIC72.ROM");
        assert_eq!(plan[2].start, 0xe000);
        assert_eq!(plan[2].size.bytes(), 0x2000);
    }

    #[test]
    fn load_file_copies_verbatim_at_offset() {
        let dir = std::env::temp_dir().join("triton_rom_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.rom");
        let mut image = vec![0u8; 0x400];
        image[0] = 0xc3;
        image[0x3ff] = 0x76;
        std::fs::write(&path, &image).unwrap();

        let mut memory = vec![0u8; 0x10000];
        load_file(&mut memory, &path, 0x0c00, RomSize::K1).unwrap();
        assert_eq!(memory[0x0c00], 0xc3);
        assert_eq!(memory[0x0fff], 0x76);
        assert_eq!(memory[0x1000], 0x00);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn load_file_rejects_wrong_size() {
        let dir = std::env::temp_dir().join("triton_rom_short_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("short.rom");
        std::fs::write(&path, [0u8; 0x200]).unwrap();

        let mut memory = vec![0u8; 0x10000];
        let result = load_file(&mut memory, &path, 0x0000, RomSize::K1);
        assert!(matches!(result, Err(RomError::BadLength { .. })));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn load_file_missing_is_io_error() {
        let mut memory = vec![0u8; 0x10000];
        let result = load_file(
            &mut memory,
            Path::new("no/such/file.rom"),
            0x0000,
            RomSize::K1,
        );
        assert!(matches!(result, Err(RomError::Io { .. })));
    }
}
