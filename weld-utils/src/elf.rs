//! Typed wrappers around the ELF constants that describe output sections and
//! symbols, plus the bit-level codec for a symbol's `st_info` and `st_other`
//! attribute bytes.

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SectionType(u32);

impl SectionType {
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn from_u32(raw: u32) -> Self {
        Self(raw)
    }
}

pub mod sht {
    use super::SectionType;

    pub const NULL: SectionType = SectionType(object::elf::SHT_NULL);
    pub const PROGBITS: SectionType = SectionType(object::elf::SHT_PROGBITS);
    pub const SYMTAB: SectionType = SectionType(object::elf::SHT_SYMTAB);
    pub const STRTAB: SectionType = SectionType(object::elf::SHT_STRTAB);
    pub const RELA: SectionType = SectionType(object::elf::SHT_RELA);
    pub const HASH: SectionType = SectionType(object::elf::SHT_HASH);
    pub const DYNAMIC: SectionType = SectionType(object::elf::SHT_DYNAMIC);
    pub const NOTE: SectionType = SectionType(object::elf::SHT_NOTE);
    pub const NOBITS: SectionType = SectionType(object::elf::SHT_NOBITS);
    pub const REL: SectionType = SectionType(object::elf::SHT_REL);
    pub const DYNSYM: SectionType = SectionType(object::elf::SHT_DYNSYM);
    pub const INIT_ARRAY: SectionType = SectionType(object::elf::SHT_INIT_ARRAY);
    pub const FINI_ARRAY: SectionType = SectionType(object::elf::SHT_FINI_ARRAY);
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SectionFlags(u64);

impl SectionFlags {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn from_u32(raw: u32) -> SectionFlags {
        SectionFlags(raw as u64)
    }

    /// Returns self with the specified flags set.
    #[must_use]
    pub const fn with(self, flags: SectionFlags) -> SectionFlags {
        SectionFlags(self.0 | flags.0)
    }

    #[must_use]
    pub const fn contains(self, flag: SectionFlags) -> bool {
        self.0 & flag.0 != 0
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Section flag bit values.
pub mod shf {
    use super::SectionFlags;

    pub const WRITE: SectionFlags = SectionFlags::from_u32(object::elf::SHF_WRITE);
    pub const ALLOC: SectionFlags = SectionFlags::from_u32(object::elf::SHF_ALLOC);
    pub const EXECINSTR: SectionFlags = SectionFlags::from_u32(object::elf::SHF_EXECINSTR);
    pub const MERGE: SectionFlags = SectionFlags::from_u32(object::elf::SHF_MERGE);
    pub const STRINGS: SectionFlags = SectionFlags::from_u32(object::elf::SHF_STRINGS);
    pub const INFO_LINK: SectionFlags = SectionFlags::from_u32(object::elf::SHF_INFO_LINK);
    pub const LINK_ORDER: SectionFlags = SectionFlags::from_u32(object::elf::SHF_LINK_ORDER);
    pub const GROUP: SectionFlags = SectionFlags::from_u32(object::elf::SHF_GROUP);
    pub const TLS: SectionFlags = SectionFlags::from_u32(object::elf::SHF_TLS);
}

impl std::fmt::Display for SectionFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (flag, ch) in [
            (shf::WRITE, "W"),
            (shf::ALLOC, "A"),
            (shf::EXECINSTR, "X"),
            (shf::MERGE, "M"),
            (shf::STRINGS, "S"),
            (shf::INFO_LINK, "I"),
            (shf::LINK_ORDER, "L"),
            (shf::GROUP, "G"),
            (shf::TLS, "T"),
        ] {
            if self.contains(flag) {
                f.write_str(ch)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SectionFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self, f)
    }
}

/// Symbol binding values, stored in the high four bits of `st_info`.
pub mod stb {
    pub const LOCAL: u8 = object::elf::STB_LOCAL;
    pub const GLOBAL: u8 = object::elf::STB_GLOBAL;
    pub const WEAK: u8 = object::elf::STB_WEAK;
    pub const LOOS: u8 = object::elf::STB_LOOS;
    pub const HIOS: u8 = object::elf::STB_HIOS;
    pub const LOPROC: u8 = object::elf::STB_LOPROC;
    pub const HIPROC: u8 = object::elf::STB_HIPROC;
}

/// Symbol type values, stored in the low four bits of `st_info`.
pub mod stt {
    pub const NOTYPE: u8 = object::elf::STT_NOTYPE;
    pub const OBJECT: u8 = object::elf::STT_OBJECT;
    pub const FUNC: u8 = object::elf::STT_FUNC;
    pub const SECTION: u8 = object::elf::STT_SECTION;
    pub const FILE: u8 = object::elf::STT_FILE;
    pub const COMMON: u8 = object::elf::STT_COMMON;
    pub const TLS: u8 = object::elf::STT_TLS;
    pub const LOOS: u8 = object::elf::STT_LOOS;
    pub const HIOS: u8 = object::elf::STT_HIOS;
    pub const LOPROC: u8 = object::elf::STT_LOPROC;
    pub const HIPROC: u8 = object::elf::STT_HIPROC;
}

/// Symbol visibility codes, stored in the low bits of `st_other`. The codes
/// past PROTECTED are Solaris extensions that the `object` crate doesn't
/// define; ELIMINATE is the largest defined code and needs three bits.
pub mod stv {
    pub const DEFAULT: u8 = object::elf::STV_DEFAULT;
    pub const INTERNAL: u8 = object::elf::STV_INTERNAL;
    pub const HIDDEN: u8 = object::elf::STV_HIDDEN;
    pub const PROTECTED: u8 = object::elf::STV_PROTECTED;
    pub const EXPORTED: u8 = 4;
    pub const SINGLETON: u8 = 5;
    pub const ELIMINATE: u8 = 6;
}

/// Packs a symbol binding and symbol type into an `st_info` byte. Inputs
/// outside the 4-bit range are truncated, never rejected, matching the ABI's
/// macro semantics.
#[must_use]
pub const fn st_info(bind: u8, sym_type: u8) -> u8 {
    (bind << 4) | (sym_type & 0xf)
}

/// Extracts the symbol binding from an `st_info` byte.
#[must_use]
pub const fn st_bind(info: u8) -> u8 {
    info >> 4
}

/// Extracts the symbol type from an `st_info` byte.
#[must_use]
pub const fn st_type(info: u8) -> u8 {
    info & 0xf
}

/// Zeroes the bits of `st_other` that have no defined meaning. The defined
/// visibility codes run through [`stv::ELIMINATE`], so the low three bits
/// survive.
#[must_use]
pub const fn st_visibility(other: u8) -> u8 {
    other & 0x7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_st_info_round_trips() {
        for bind in 0..=15u8 {
            for sym_type in 0..=15u8 {
                let info = st_info(bind, sym_type);
                assert_eq!(st_bind(info), bind);
                assert_eq!(st_type(info), sym_type);
            }
        }
        for info in 0..=u8::MAX {
            assert_eq!(st_info(st_bind(info), st_type(info)), info);
        }
    }

    #[test]
    fn test_st_info_truncates_out_of_range_inputs() {
        assert_eq!(st_info(0x12, 0x34), st_info(0x2, 0x4));
        assert_eq!(st_bind(st_info(0xff, 0)), 0xf);
        assert_eq!(st_type(st_info(0, 0xff)), 0xf);
    }

    #[test]
    fn test_st_visibility_zeroes_reserved_bits() {
        for other in 0..=u8::MAX {
            assert_eq!(st_visibility(other), other & 0x7);
        }
        for vis in [
            stv::DEFAULT,
            stv::INTERNAL,
            stv::HIDDEN,
            stv::PROTECTED,
            stv::EXPORTED,
            stv::SINGLETON,
            stv::ELIMINATE,
        ] {
            assert_eq!(st_visibility(vis), vis);
        }
        assert_eq!(st_visibility(0xf8 | stv::HIDDEN), stv::HIDDEN);
    }

    #[test]
    fn test_section_flags_display() {
        let flags = SectionFlags::empty().with(shf::ALLOC).with(shf::EXECINSTR);
        assert_eq!(flags.to_string(), "AX");
        assert!(flags.contains(shf::ALLOC));
        assert!(!flags.contains(shf::WRITE));
        assert_eq!(SectionFlags::empty().to_string(), "");
    }

    #[test]
    fn test_section_type_raw() {
        assert_eq!(sht::SYMTAB.raw(), 2);
        assert_eq!(sht::PROGBITS, SectionType::from_u32(1));
    }
}
