use crate::elf::SymtabEntry;
use crate::error::Result;
use anyhow::Context as _;
use bytemuck::Pod;
use std::any::Any;
use std::marker::PhantomData;
use weld_utils::elf::SectionFlags;
use weld_utils::elf::SectionType;
use weld_utils::elf::sht;

/// Header fields common to every output section. Concrete section kinds
/// augment these with their own, e.g. a record section adds its entry size.
struct SectionBase {
    name: String,
    section_type: SectionType,
    flags: SectionFlags,
}

/// One section of the output being assembled. Exposes exactly the fields
/// that section-header emission needs to read back.
pub trait OutputSection: Any {
    fn name(&self) -> &str;

    fn section_type(&self) -> SectionType;

    fn flags(&self) -> SectionFlags;

    /// Value for the header's `sh_entsize` field. Zero for sections that
    /// don't hold fixed-size records.
    fn entry_size(&self) -> u64;

    fn data(&self) -> &[u8];

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// An append-only byte buffer holding a stream of fixed-layout `T` records.
/// Record `n` lives at byte offset `n * size_of::<T>()`; for a symbol table
/// that offset divided by the entry size is the symbol index that relocation
/// records refer to.
///
/// The `Pod` bound is what makes the byte copy sound: `T` is trivially
/// copyable, has no indirection and no padding, so records serialize
/// byte-exactly with no per-type code.
pub struct BinaryDataSection<T> {
    base: SectionBase,
    data: Vec<u8>,
    phantom: PhantomData<T>,
}

impl<T: Pod> BinaryDataSection<T> {
    pub(crate) fn new(name: &str, section_type: SectionType, flags: SectionFlags) -> Self {
        const { assert!(size_of::<T>() != 0, "section records must have a non-zero size") };
        Self {
            base: SectionBase {
                name: name.to_owned(),
                section_type,
                flags,
            },
            data: Vec::new(),
            phantom: PhantomData,
        }
    }

    /// Appends one record, returning the byte offset at which it was written.
    pub fn append(&mut self, entry: T) -> u64 {
        self.append_slice(std::slice::from_ref(&entry))
    }

    /// Appends `entries.len()` contiguous records, returning the byte offset
    /// of the first. Appending an empty slice leaves the section unchanged
    /// and returns the current content length.
    pub fn append_slice(&mut self, entries: &[T]) -> u64 {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(bytemuck::cast_slice(entries));
        offset
    }

    /// Number of whole records appended so far. Exact, since only
    /// whole-record appends exist: the content length is always a multiple
    /// of the entry size.
    pub fn entry_count(&self) -> usize {
        self.data.len() / size_of::<T>()
    }

    /// Reads back the record at `index` as a copy. Section content is never
    /// mutated in place.
    pub fn entry(&self, index: usize) -> Result<T> {
        let start = index * size_of::<T>();
        let bytes = self
            .data
            .get(start..start + size_of::<T>())
            .with_context(|| {
                format!(
                    "entry {index} is out of bounds of section `{}`",
                    self.base.name
                )
            })?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Replaces the section's header flags, e.g. to mark the content as
    /// allocatable.
    pub fn set_flags(&mut self, flags: SectionFlags) {
        self.base.flags = flags;
    }
}

impl<T: Pod> OutputSection for BinaryDataSection<T> {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn section_type(&self) -> SectionType {
        self.base.section_type
    }

    fn flags(&self) -> SectionFlags {
        self.base.flags
    }

    fn entry_size(&self) -> u64 {
        size_of::<T>() as u64
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A string table section. Content starts with a NUL so that offset zero is
/// the empty string, as consumers of `st_name` expect.
pub struct StringTableSection {
    base: SectionBase,
    data: Vec<u8>,
}

impl StringTableSection {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            base: SectionBase {
                name: name.to_owned(),
                section_type: sht::STRTAB,
                flags: SectionFlags::empty(),
            },
            data: vec![0],
        }
    }

    /// Adds a NUL-terminated copy of `string`, returning the offset to store
    /// in referencing fields such as a symbol's name index.
    pub fn add_string(&mut self, string: &[u8]) -> u64 {
        let offset = self.data.len() as u64;
        tracing::trace!(name = %String::from_utf8_lossy(string), offset, "Write string table entry");
        self.data.extend_from_slice(string);
        self.data.push(0);
        offset
    }
}

impl OutputSection for StringTableSection {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn section_type(&self) -> SectionType {
        self.base.section_type
    }

    fn flags(&self) -> SectionFlags {
        self.base.flags
    }

    fn entry_size(&self) -> u64 {
        0
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owns every section of the output being assembled. Sections can only be
/// created through the writer, so a section's lifetime is always tied to the
/// writer that will eventually emit it.
pub struct Writer {
    sections: Vec<Box<dyn OutputSection>>,
}

impl Writer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    /// Creates a section holding a stream of fixed-layout `T` records.
    pub fn add_binary_data_section<T: Pod>(
        &mut self,
        name: &str,
        section_type: SectionType,
    ) -> &mut BinaryDataSection<T> {
        tracing::debug!(name, entry_size = size_of::<T>(), "Add binary data section");
        self.push_section(BinaryDataSection::new(
            name,
            section_type,
            SectionFlags::empty(),
        ))
    }

    /// Creates a symbol table using the entry layout for 64-bit targets.
    pub fn add_symbol_table(&mut self, name: &str) -> &mut BinaryDataSection<SymtabEntry> {
        self.add_binary_data_section(name, sht::SYMTAB)
    }

    pub fn add_string_table(&mut self, name: &str) -> &mut StringTableSection {
        tracing::debug!(name, "Add string table section");
        self.push_section(StringTableSection::new(name))
    }

    /// Looks up a previously created section by name, at its concrete type.
    pub fn section_mut<S: OutputSection>(&mut self, name: &str) -> Option<&mut S> {
        self.sections
            .iter_mut()
            .find(|section| section.name() == name)
            .and_then(|section| section.as_any_mut().downcast_mut())
    }

    pub fn section_by_name(&self, name: &str) -> Option<&dyn OutputSection> {
        self.sections().find(|section| section.name() == name)
    }

    /// The sections created so far, in creation order. Section-header
    /// emission walks these to fill in a header per section.
    pub fn sections(&self) -> impl Iterator<Item = &dyn OutputSection> {
        self.sections.iter().map(|section| section.as_ref())
    }

    fn push_section<S: OutputSection>(&mut self, section: S) -> &mut S {
        self.sections.push(Box::new(section));
        self.sections
            .last_mut()
            .and_then(|section| section.as_any_mut().downcast_mut())
            .expect("section was just pushed")
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}
