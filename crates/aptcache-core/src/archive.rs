//! Tar archives of installed files.
//!
//! Entries are named by absolute path with the leading `/` removed, so
//! extracting at `/` puts every file back where it came from. Symlinks are
//! stored as links and, when they point at a file, the file is stored too;
//! an archive restored on its own therefore never contains dangling links
//! that the installation did not also have.

use std::fs::{self, File, Metadata};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use tar::{Builder, EntryType, Header};
use thiserror::Error;

use crate::reporter::Reporter;

/// Errors from building an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// No destination path was given.
    #[error("archive destination path is required")]
    MissingDestination,

    /// The file list was empty.
    #[error("at least one file is required to create an archive")]
    NoFiles,

    /// Only regular files and symlinks can be archived.
    #[error("unsupported file type for archiving: {0}")]
    UnsupportedFileType(PathBuf),

    /// A file could not be read or the archive could not be written.
    #[error("archive I/O error at {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Builds restore archives from installed file lists.
pub struct Archiver<'a> {
    reporter: &'a dyn Reporter,
}

impl std::fmt::Debug for Archiver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archiver").finish_non_exhaustive()
    }
}

impl<'a> Archiver<'a> {
    /// Create an archiver reporting to `reporter`.
    pub fn new(reporter: &'a dyn Reporter) -> Self {
        Self { reporter }
    }

    /// Write a tar archive of `files` to `dest`.
    ///
    /// Missing parent directories of `dest` are created. Relative inputs are
    /// taken relative to the working directory. On failure the partially
    /// written archive is removed.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::MissingDestination`] / [`ArchiveError::NoFiles`]
    ///   before anything is touched.
    /// - [`ArchiveError::UnsupportedFileType`] for directories, devices,
    ///   sockets and other non-file inputs.
    /// - [`ArchiveError::Io`] naming the path that failed.
    pub fn create_archive<P: AsRef<Path>>(&self, dest: &Path, files: &[P]) -> Result<(), ArchiveError> {
        if dest.as_os_str().is_empty() {
            return Err(ArchiveError::MissingDestination);
        }
        if files.is_empty() {
            return Err(ArchiveError::NoFiles);
        }

        self.reporter.section(&format!(
            "Archiving {} file(s) to {}",
            files.len(),
            dest.display()
        ));

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(ArchiveError::io(parent))?;
        }
        let file = File::create(dest).map_err(ArchiveError::io(dest))?;
        if let Err(err) = self.write_archive(dest, file, files) {
            if let Err(cleanup) = fs::remove_file(dest) {
                tracing::warn!(
                    "Failed to remove partial archive {}: {cleanup}",
                    dest.display()
                );
            }
            return Err(err);
        }

        self.reporter
            .success(&format!("Created archive {}", dest.display()));
        Ok(())
    }

    fn write_archive<P: AsRef<Path>>(&self, dest: &Path, file: File, files: &[P]) -> Result<(), ArchiveError> {
        let mut builder = Builder::new(BufWriter::new(file));
        builder.follow_symlinks(false);

        for path in files {
            self.append_path(&mut builder, path.as_ref())?;
        }

        builder
            .into_inner()
            .and_then(|mut writer| writer.flush())
            .map_err(ArchiveError::io(dest))
    }

    fn append_path<W: Write>(&self, builder: &mut Builder<W>, path: &Path) -> Result<(), ArchiveError> {
        let path = std::path::absolute(path).map_err(ArchiveError::io(path))?;
        let meta = fs::symlink_metadata(&path).map_err(ArchiveError::io(&path))?;
        let file_type = meta.file_type();

        if file_type.is_file() {
            append_file(builder, &path, &meta)
        } else if file_type.is_symlink() {
            self.append_symlink(builder, &path, &meta)
        } else {
            Err(ArchiveError::UnsupportedFileType(path))
        }
    }

    fn append_symlink<W: Write>(
        &self,
        builder: &mut Builder<W>,
        path: &Path,
        meta: &Metadata,
    ) -> Result<(), ArchiveError> {
        let target = fs::read_link(path).map_err(ArchiveError::io(path))?;

        let mut header = Header::new_gnu();
        header.set_metadata(meta);
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        builder
            .append_link(&mut header, entry_name(path), strip_root(&target))
            .map_err(ArchiveError::io(path))?;

        // Absolute targets replace the parent on join.
        let resolved = normalize(&path.parent().unwrap_or(Path::new("/")).join(&target));
        match fs::metadata(&resolved) {
            Ok(target_meta) if target_meta.is_dir() => {
                self.reporter.debug(&format!(
                    "Not archiving directory target {} of {}",
                    resolved.display(),
                    path.display()
                ));
                Ok(())
            }
            Ok(target_meta) => append_file(builder, &resolved, &target_meta),
            Err(err) => {
                self.reporter.warning(&format!(
                    "Symlink {} points at missing {}: {err}",
                    path.display(),
                    resolved.display()
                ));
                Ok(())
            }
        }
    }
}

fn append_file<W: Write>(builder: &mut Builder<W>, path: &Path, meta: &Metadata) -> Result<(), ArchiveError> {
    let file = File::open(path).map_err(ArchiveError::io(path))?;

    let mut header = Header::new_gnu();
    header.set_metadata(meta);
    header.set_entry_type(EntryType::Regular);
    header.set_size(meta.len());
    builder
        .append_data(&mut header, entry_name(path), file)
        .map_err(ArchiveError::io(path))
}

/// Archive entry name for an absolute path: normalised, leading `/` removed.
fn entry_name(path: &Path) -> PathBuf {
    strip_root(&normalize(path)).to_path_buf()
}

fn strip_root(path: &Path) -> &Path {
    path.strip_prefix("/").unwrap_or(path)
}

/// Collapse `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
