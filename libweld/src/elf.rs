use crate::error::Result;
use anyhow::anyhow;
use bytemuck::Pod;
use bytemuck::Zeroable;

// Entries are stored with native byte order. Output targets are little-endian.
const _: () = assert!(cfg!(target_endian = "little"));

/// One entry of a symbol table section for 64-bit targets. Field order and
/// widths are fixed by the ELF ABI, which is what makes the record safe to
/// copy into section content byte-for-byte.
#[derive(Zeroable, Pod, Clone, Copy)]
#[repr(C)]
pub struct SymtabEntry64 {
    pub name: u32,
    pub info: u8,
    pub other: u8,
    pub shndx: u16,
    pub value: u64,
    pub size: u64,
}

/// The 32-bit layout. Same fields, reordered so that each is naturally
/// aligned at the narrower address width.
#[derive(Zeroable, Pod, Clone, Copy)]
#[repr(C)]
pub struct SymtabEntry32 {
    pub name: u32,
    pub value: u32,
    pub size: u32,
    pub info: u8,
    pub other: u8,
    pub shndx: u16,
}

/// The entry layout an ordinary writer uses unless targeting 32-bit.
pub type SymtabEntry = SymtabEntry64;

/// Entry sizes mandated by the ELF ABI for each class.
pub const SYMTAB_ENTRY_SIZE: u64 = size_of::<SymtabEntry64>() as u64;
pub const SYMTAB_ENTRY_SIZE_32: u64 = size_of::<SymtabEntry32>() as u64;

const _ASSERTS: () = {
    assert!(SYMTAB_ENTRY_SIZE == 24);
    assert!(SYMTAB_ENTRY_SIZE_32 == 16);
};

/// Uniform access to either symbol entry layout. The writer picks a layout
/// for the target's address width at section creation time; code that
/// composes or inspects entries goes through these accessors rather than
/// depending on the concrete shape.
pub trait SymbolEntry: Pod {
    fn new(name: u32, value: u64, size: u64, info: u8, other: u8, shndx: u16) -> Self;

    fn name(&self) -> u32;
    fn value(&self) -> u64;
    fn size(&self) -> u64;
    fn info(&self) -> u8;
    fn other(&self) -> u8;
    fn shndx(&self) -> u16;
}

impl SymbolEntry for SymtabEntry64 {
    fn new(name: u32, value: u64, size: u64, info: u8, other: u8, shndx: u16) -> Self {
        Self {
            name,
            info,
            other,
            shndx,
            value,
            size,
        }
    }

    fn name(&self) -> u32 {
        self.name
    }

    fn value(&self) -> u64 {
        self.value
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn info(&self) -> u8 {
        self.info
    }

    fn other(&self) -> u8 {
        self.other
    }

    fn shndx(&self) -> u16 {
        self.shndx
    }
}

impl SymbolEntry for SymtabEntry32 {
    fn new(name: u32, value: u64, size: u64, info: u8, other: u8, shndx: u16) -> Self {
        Self {
            name,
            value: value as u32,
            size: size as u32,
            info,
            other,
            shndx,
        }
    }

    fn name(&self) -> u32 {
        self.name
    }

    fn value(&self) -> u64 {
        u64::from(self.value)
    }

    fn size(&self) -> u64 {
        u64::from(self.size)
    }

    fn info(&self) -> u8 {
        self.info
    }

    fn other(&self) -> u8 {
        self.other
    }

    fn shndx(&self) -> u16 {
        self.shndx
    }
}

/// Decodes one symbol entry from a byte range, e.g. one read back out of
/// section content. Fails if the slice isn't exactly one entry long.
pub fn symbol_from_bytes<T: SymbolEntry>(bytes: &[u8]) -> Result<T> {
    bytemuck::try_pod_read_unaligned(bytes)
        .map_err(|error| anyhow!("invalid symbol entry bytes: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weld_utils::elf::st_bind;
    use weld_utils::elf::st_info;
    use weld_utils::elf::st_type;
    use weld_utils::elf::stb;
    use weld_utils::elf::stt;

    #[test]
    fn test_entry_64_matches_abi_encoding() {
        let entry = SymtabEntry64 {
            name: 1,
            info: st_info(stb::GLOBAL, stt::FUNC),
            other: 2,
            shndx: 7,
            value: 0xdead_beef,
            size: 8,
        };
        #[rustfmt::skip]
        let expected: [u8; 24] = [
            1, 0, 0, 0,
            0x12,
            2,
            7, 0,
            0xef, 0xbe, 0xad, 0xde, 0, 0, 0, 0,
            8, 0, 0, 0, 0, 0, 0, 0,
        ];
        assert_eq!(bytemuck::bytes_of(&entry), expected.as_slice());
    }

    #[test]
    fn test_entry_32_matches_abi_encoding() {
        let entry = SymtabEntry32 {
            name: 3,
            value: 0x0001_0000,
            size: 12,
            info: st_info(stb::WEAK, stt::OBJECT),
            other: 1,
            shndx: 4,
        };
        #[rustfmt::skip]
        let expected: [u8; 16] = [
            3, 0, 0, 0,
            0, 0, 1, 0,
            12, 0, 0, 0,
            0x21,
            1,
            4, 0,
        ];
        assert_eq!(bytemuck::bytes_of(&entry), expected.as_slice());
    }

    #[test]
    fn test_accessors_agree_across_layouts() {
        fn check<T: SymbolEntry>() {
            let entry = T::new(9, 0x2000, 32, st_info(stb::LOCAL, stt::SECTION), 0, 1);
            assert_eq!(entry.name(), 9);
            assert_eq!(entry.value(), 0x2000);
            assert_eq!(entry.size(), 32);
            assert_eq!(st_bind(entry.info()), stb::LOCAL);
            assert_eq!(st_type(entry.info()), stt::SECTION);
            assert_eq!(entry.other(), 0);
            assert_eq!(entry.shndx(), 1);
        }
        check::<SymtabEntry64>();
        check::<SymtabEntry32>();
    }

    #[test]
    fn test_symbol_from_bytes_round_trips() {
        let entry = SymtabEntry::new(5, 0x1000, 16, st_info(stb::GLOBAL, stt::FUNC), 0, 2);
        let bytes = bytemuck::bytes_of(&entry).to_vec();
        let decoded: SymtabEntry = symbol_from_bytes(&bytes).unwrap();
        assert_eq!(decoded.name(), 5);
        assert_eq!(decoded.value(), 0x1000);
        assert_eq!(decoded.size(), 16);
        assert_eq!(decoded.shndx(), 2);
    }

    #[test]
    fn test_symbol_from_bytes_rejects_wrong_lengths() {
        let bytes = [0u8; 24];
        assert!(symbol_from_bytes::<SymtabEntry64>(&bytes).is_ok());
        assert!(symbol_from_bytes::<SymtabEntry64>(&bytes[..23]).is_err());
        assert!(symbol_from_bytes::<SymtabEntry32>(&bytes).is_err());
    }
}
