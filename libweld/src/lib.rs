pub mod elf;
pub mod elf_writer;
pub mod error;

pub use elf_writer::Writer;
