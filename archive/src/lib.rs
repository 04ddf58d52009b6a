//! Enumerates the `.class` entries of a jar.
//!
//! This crate only gets bytes out of a zip-based archive; turning those bytes into a
//! [`duke::tree::class::ClassFile`](https://docs.rs/duke) is somebody else's problem, see the
//! crate-level docs of `duke` for why.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};
use zip::ZipArchive;

/// A source of `.class` entries, backed by some zip-shaped container.
pub trait Jar {
	/// Names of every entry in the archive, `.class` suffixed or not.
	fn entry_names(&mut self) -> Result<Vec<String>>;

	/// Reads the raw bytes of a single entry.
	fn read_entry(&mut self, name: &str) -> Result<Vec<u8>>;

	/// Names of only the `.class` entries, in archive order.
	fn class_names(&mut self) -> Result<Vec<String>> {
		Ok(self.entry_names()?.into_iter().filter(|name| name.ends_with(".class")).collect())
	}

	/// Reads every `.class` entry's bytes, in archive order.
	fn read_classes(&mut self) -> Result<Vec<(String, Vec<u8>)>> {
		let names = self.class_names()?;
		log::debug!("found {} class entries", names.len());

		let mut out = Vec::with_capacity(names.len());
		for name in names {
			let bytes = self.read_entry(&name)?;
			out.push((name, bytes));
		}
		Ok(out)
	}
}

trait JarFromReader {
	type Reader<'a>: Read + Seek + 'a where Self: 'a;

	fn open(&self) -> Result<Self::Reader<'_>>;
}

impl<T: JarFromReader> Jar for T {
	fn entry_names(&mut self) -> Result<Vec<String>> {
		let reader = self.open()?;
		let zip = ZipArchive::new(reader)?;
		Ok(zip.file_names().map(|name| name.to_owned()).collect())
	}

	fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
		let reader = self.open()?;
		let mut zip = ZipArchive::new(reader)?;

		let mut file = zip.by_name(name)
			.map_err(|_| anyhow!("no such entry {name:?} in archive"))?;

		let mut vec = Vec::new();
		file.read_to_end(&mut vec)?;
		Ok(vec)
	}
}

/// A jar backed by a file on disk, opened anew for every operation.
#[derive(Debug, Clone)]
pub struct FileJar {
	path: PathBuf,
}

impl FileJar {
	pub fn new(path: impl Into<PathBuf>) -> FileJar {
		FileJar { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl JarFromReader for FileJar {
	type Reader<'a> = File;

	fn open(&self) -> Result<File> {
		File::open(&self.path)
			.with_context(|| anyhow!("failed to open jar at {:?}", self.path))
	}
}

/// A jar backed by an in-memory byte buffer, useful for tests.
#[derive(Debug, Clone)]
pub struct MemJar {
	data: Vec<u8>,
}

impl MemJar {
	pub fn new(data: Vec<u8>) -> MemJar {
		MemJar { data }
	}
}

impl JarFromReader for MemJar {
	type Reader<'a> = Cursor<&'a [u8]>;

	fn open(&self) -> Result<Cursor<&[u8]>> {
		Ok(Cursor::new(&self.data))
	}
}

#[cfg(test)]
mod testing {
	use std::io::Write;
	use zip::write::SimpleFileOptions;
	use super::*;

	fn make_test_jar() -> MemJar {
		let mut buf = Vec::new();
		{
			let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
			let options = SimpleFileOptions::default();
			writer.start_file("a/A.class", options).unwrap();
			writer.write_all(b"fake class bytes").unwrap();
			writer.start_file("a/README.txt", options).unwrap();
			writer.write_all(b"not a class").unwrap();
			writer.finish().unwrap();
		}
		MemJar::new(buf)
	}

	#[test]
	fn lists_only_class_entries() -> Result<()> {
		let mut jar = make_test_jar();
		let names = jar.class_names()?;
		pretty_assertions::assert_eq!(names, vec!["a/A.class".to_owned()]);
		Ok(())
	}

	#[test]
	fn reads_class_bytes() -> Result<()> {
		let mut jar = make_test_jar();
		let bytes = jar.read_entry("a/A.class")?;
		pretty_assertions::assert_eq!(bytes, b"fake class bytes");
		Ok(())
	}

	#[test]
	fn missing_entry_errors() {
		let mut jar = make_test_jar();
		assert!(jar.read_entry("nope.class").is_err());
	}
}
