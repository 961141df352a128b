//! Container file handle: lifecycle, group operations, and dataset
//! introspection.
//!
//! A [`ContainerFile`] owns the parsed object tree of one on-disk container.
//! Queries take `&self`, mutations take `&mut self` and are buffered in
//! memory until [`flush`](ContainerFile::flush) or
//! [`close`](ContainerFile::close) rewrites the image. Dropping the handle
//! is the single release point; `Drop` flushes unsaved mutations best-effort
//! (use `close` to observe flush errors).

use std::fs;
use std::path::{Path, PathBuf};

use hivefile_format::datatype::{self, ScalarType};
use hivefile_format::header::FLAG_COLLECTIVE;
use hivefile_format::image;
use hivefile_format::record::{self, DatasetRecord};
use hivefile_format::tree::{path_components, GroupNode, Node};

use crate::error::Error;
use crate::parallel;

// ---------------------------------------------------------------------------
// Image bytes — owned buffer or a read-only mapping
// ---------------------------------------------------------------------------

enum ImageBytes {
    Owned(Vec<u8>),
    #[cfg(feature = "mmap")]
    Mapped(memmap2::Mmap),
}

impl ImageBytes {
    fn as_bytes(&self) -> &[u8] {
        match self {
            ImageBytes::Owned(v) => v,
            #[cfg(feature = "mmap")]
            ImageBytes::Mapped(m) => m,
        }
    }
}

/// Read a container image from disk.
///
/// With the `mmap` feature (default) the file is memory-mapped; parsing
/// copies what the tree needs, so the mapping ends with this function's
/// caller and never outlives the open.
fn read_image_bytes(path: &Path) -> Result<ImageBytes, Error> {
    #[cfg(feature = "mmap")]
    {
        let file = fs::File::open(path).map_err(Error::Io)?;
        // SAFETY: read-only mapping, released before `open` returns. The
        // caller is responsible for not truncating the file concurrently.
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(Error::Io)?;
        Ok(ImageBytes::Mapped(mmap))
    }
    #[cfg(not(feature = "mmap"))]
    {
        Ok(ImageBytes::Owned(fs::read(path).map_err(Error::Io)?))
    }
}

// ---------------------------------------------------------------------------
// ContainerFile
// ---------------------------------------------------------------------------

/// An open container file.
///
/// Obtained via [`ContainerFile::open`]; released by dropping (or by
/// [`close`](ContainerFile::close), which also reports flush errors).
/// Ownership makes the release-exactly-once contract structural: there is no
/// handle left to misuse after close.
pub struct ContainerFile {
    path: PathBuf,
    root: GroupNode,
    collective: bool,
    dirty: bool,
}

impl ContainerFile {
    /// Open or create a container.
    ///
    /// * `truncate = true` discards any existing container at `path` and
    ///   starts a fresh empty one; the file is created on disk immediately.
    /// * `truncate = false` opens an existing container read/write; a
    ///   missing file is [`Error::Io`], a malformed one [`Error::Format`].
    /// * `parallel = true` requires an installed
    ///   [`CollectiveDriver`](crate::parallel::CollectiveDriver);
    ///   otherwise [`Error::Configuration`] is returned before any file is
    ///   created or opened. In a collective session only rank 0 writes,
    ///   bracketed by barriers, and every rank parses the same image.
    pub fn open<P: AsRef<Path>>(path: P, truncate: bool, parallel: bool) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let driver = if parallel {
            Some(parallel::driver().ok_or_else(|| {
                Error::Configuration(
                    "collective I/O requested but no process-group driver is installed".into(),
                )
            })?)
        } else {
            None
        };

        if truncate {
            let image = image::empty_image(collective_flags(parallel));
            match driver {
                Some(d) => {
                    if d.rank() == 0 {
                        fs::write(&path, &image).map_err(Error::Io)?;
                    }
                    d.barrier();
                }
                None => fs::write(&path, &image).map_err(Error::Io)?,
            }
            return Ok(Self {
                path,
                root: GroupNode::new(),
                collective: parallel,
                dirty: false,
            });
        }

        let bytes = read_image_bytes(&path)?;
        let (_header, root) = image::parse_image(bytes.as_bytes())?;
        Ok(Self {
            path,
            root,
            collective: parallel,
            dirty: false,
        })
    }

    /// The on-disk path of this container.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this handle was opened for collective I/O.
    pub fn is_collective(&self) -> bool {
        self.collective
    }

    /// Rewrite the on-disk image if there are unsaved mutations.
    pub fn flush(&mut self) -> Result<(), Error> {
        if !self.dirty {
            return Ok(());
        }
        let image = image::encode_image(&self.root, collective_flags(self.collective));
        if self.collective {
            // The driver was present at open and cannot be uninstalled.
            if let Some(d) = parallel::driver() {
                if d.rank() == 0 {
                    fs::write(&self.path, &image).map_err(Error::Io)?;
                }
                d.barrier();
            }
        } else {
            fs::write(&self.path, &image).map_err(Error::Io)?;
        }
        self.dirty = false;
        Ok(())
    }

    /// Flush and release the handle, reporting any flush error.
    pub fn close(mut self) -> Result<(), Error> {
        self.flush()
    }

    // -----------------------------------------------------------------------
    // Group operations
    // -----------------------------------------------------------------------

    /// Existence probe for a group. Never errors, never mutates; an all-slash
    /// or empty path names the root group, which always exists.
    pub fn has_group(&self, path: &str) -> bool {
        if path_components(path).next().is_none() {
            return true;
        }
        matches!(self.root.resolve(path), Some(Node::Group(_)))
    }

    /// Existence probe for a dataset. Never errors, never mutates.
    pub fn has_dataset(&self, path: &str) -> bool {
        matches!(self.root.resolve(path), Some(Node::Dataset(_)))
    }

    /// Create the group at `path`, along with any missing intermediate
    /// groups. A no-op when the group already exists. Fails with
    /// [`Error::NotAGroup`] if a path component is occupied by a dataset.
    pub fn add_group(&mut self, path: &str) -> Result<(), Error> {
        let mut changed = false;
        ensure_group(&mut self.root, path_components(path), path, &mut changed)?;
        if changed {
            self.dirty = true;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Dataset introspection
    // -----------------------------------------------------------------------

    /// Number of dimensions of the dataset at `path`.
    pub fn dataset_rank(&self, path: &str) -> Result<usize, Error> {
        Ok(self.dataset_at(path)?.shape.len())
    }

    /// Full shape of the dataset at `path`, extents ordered outermost to
    /// innermost exactly as stored on disk.
    pub fn dataset_shape(&self, path: &str) -> Result<Vec<u64>, Error> {
        Ok(self.dataset_at(path)?.shape.clone())
    }

    /// Number of direct child links (of any kind) under the group at `path`.
    pub fn num_links_in_group(&self, path: &str) -> Result<usize, Error> {
        Ok(self.group_at(path)?.num_links())
    }

    /// Names of all direct children of the group at `path`, in the group's
    /// native (insertion) order.
    pub fn dataset_list(&self, path: &str) -> Result<Vec<String>, Error> {
        Ok(self.group_at(path)?.link_names().map(String::from).collect())
    }

    // -----------------------------------------------------------------------
    // Typed dataset write
    // -----------------------------------------------------------------------

    /// Create an `f64` dataset at `path` with the given shape.
    pub fn write_f64(&mut self, path: &str, values: &[f64], shape: &[u64]) -> Result<(), Error> {
        self.write_raw(
            path,
            ScalarType::F64,
            shape,
            values.len() as u64,
            datatype::encode_f64(values),
        )
    }

    /// Create an `f32` dataset at `path` with the given shape.
    pub fn write_f32(&mut self, path: &str, values: &[f32], shape: &[u64]) -> Result<(), Error> {
        self.write_raw(
            path,
            ScalarType::F32,
            shape,
            values.len() as u64,
            datatype::encode_f32(values),
        )
    }

    /// Create an `i64` dataset at `path` with the given shape.
    pub fn write_i64(&mut self, path: &str, values: &[i64], shape: &[u64]) -> Result<(), Error> {
        self.write_raw(
            path,
            ScalarType::I64,
            shape,
            values.len() as u64,
            datatype::encode_i64(values),
        )
    }

    /// Create an `i32` dataset at `path` with the given shape.
    pub fn write_i32(&mut self, path: &str, values: &[i32], shape: &[u64]) -> Result<(), Error> {
        self.write_raw(
            path,
            ScalarType::I32,
            shape,
            values.len() as u64,
            datatype::encode_i32(values),
        )
    }

    /// Create a `u8` dataset at `path` with the given shape.
    pub fn write_u8(&mut self, path: &str, values: &[u8], shape: &[u64]) -> Result<(), Error> {
        self.write_raw(
            path,
            ScalarType::U8,
            shape,
            values.len() as u64,
            datatype::encode_u8(values),
        )
    }

    /// Create a string dataset at `path` with the given shape.
    pub fn write_str<S: AsRef<str>>(
        &mut self,
        path: &str,
        values: &[S],
        shape: &[u64],
    ) -> Result<(), Error> {
        self.write_raw(
            path,
            ScalarType::Str,
            shape,
            values.len() as u64,
            datatype::encode_str(values),
        )
    }

    fn write_raw(
        &mut self,
        path: &str,
        dtype: ScalarType,
        shape: &[u64],
        count: u64,
        data: Vec<u8>,
    ) -> Result<(), Error> {
        if shape.len() > record::MAX_RANK {
            return Err(Error::RankTooLarge(shape.len()));
        }
        let expected = record::element_count(shape).ok_or(Error::ShapeOverflow)?;
        if expected != count {
            return Err(Error::ShapeMismatch {
                expected,
                actual: count,
            });
        }

        let components: Vec<&str> = path_components(path).collect();
        let (name, parent) = components
            .split_last()
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        if name.len() > record::MAX_NAME_LEN {
            return Err(Error::NameTooLong(name.len()));
        }

        // Dataset creation is not a namespace operation: the parent group
        // must already exist (use `add_group` first).
        let mut cursor = &mut self.root;
        for component in parent {
            cursor = match cursor.child_mut(component) {
                Some(Node::Group(g)) => g,
                Some(Node::Dataset(_)) => return Err(Error::NotAGroup(path.to_string())),
                None => return Err(Error::NotFound(path.to_string())),
            };
        }
        if cursor.child(name).is_some() {
            return Err(Error::AlreadyExists(path.to_string()));
        }
        cursor.insert(
            (*name).to_string(),
            Node::Dataset(DatasetRecord {
                dtype,
                shape: shape.to_vec(),
                data,
            }),
        );
        self.dirty = true;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Typed dataset read
    // -----------------------------------------------------------------------

    /// Read the dataset at `path` as `f64` values.
    pub fn read_f64(&self, path: &str) -> Result<Vec<f64>, Error> {
        let d = self.typed_dataset_at(path, ScalarType::F64, "f64")?;
        Ok(datatype::decode_f64(&d.data, d.element_count())?)
    }

    /// Read the dataset at `path` as `f32` values.
    pub fn read_f32(&self, path: &str) -> Result<Vec<f32>, Error> {
        let d = self.typed_dataset_at(path, ScalarType::F32, "f32")?;
        Ok(datatype::decode_f32(&d.data, d.element_count())?)
    }

    /// Read the dataset at `path` as `i64` values.
    pub fn read_i64(&self, path: &str) -> Result<Vec<i64>, Error> {
        let d = self.typed_dataset_at(path, ScalarType::I64, "i64")?;
        Ok(datatype::decode_i64(&d.data, d.element_count())?)
    }

    /// Read the dataset at `path` as `i32` values.
    pub fn read_i32(&self, path: &str) -> Result<Vec<i32>, Error> {
        let d = self.typed_dataset_at(path, ScalarType::I32, "i32")?;
        Ok(datatype::decode_i32(&d.data, d.element_count())?)
    }

    /// Read the dataset at `path` as `u8` values.
    pub fn read_u8(&self, path: &str) -> Result<Vec<u8>, Error> {
        let d = self.typed_dataset_at(path, ScalarType::U8, "u8")?;
        Ok(datatype::decode_u8(&d.data, d.element_count())?)
    }

    /// Read the dataset at `path` as strings.
    pub fn read_str(&self, path: &str) -> Result<Vec<String>, Error> {
        let d = self.typed_dataset_at(path, ScalarType::Str, "str")?;
        Ok(datatype::decode_str(&d.data, d.element_count())?)
    }

    // -----------------------------------------------------------------------
    // Resolution helpers
    // -----------------------------------------------------------------------

    fn dataset_at(&self, path: &str) -> Result<&DatasetRecord, Error> {
        match self.root.resolve(path) {
            Some(Node::Dataset(d)) => Ok(d),
            Some(Node::Group(_)) => Err(Error::NotADataset(path.to_string())),
            None => Err(Error::NotFound(path.to_string())),
        }
    }

    fn typed_dataset_at(
        &self,
        path: &str,
        dtype: ScalarType,
        expected: &'static str,
    ) -> Result<&DatasetRecord, Error> {
        let d = self.dataset_at(path)?;
        if d.dtype != dtype {
            return Err(Error::TypeMismatch {
                expected,
                actual: d.dtype.to_string(),
            });
        }
        Ok(d)
    }

    fn group_at(&self, path: &str) -> Result<&GroupNode, Error> {
        if path_components(path).next().is_none() {
            return Ok(&self.root);
        }
        match self.root.resolve(path) {
            Some(Node::Group(g)) => Ok(g),
            Some(Node::Dataset(_)) => Err(Error::NotAGroup(path.to_string())),
            None => Err(Error::NotFound(path.to_string())),
        }
    }
}

impl Drop for ContainerFile {
    fn drop(&mut self) {
        if !self.dirty {
            return;
        }
        if self.collective {
            // Best-effort, rank 0 only; no barrier in drop (other ranks may
            // be unwinding).
            match parallel::driver() {
                Some(d) if d.rank() == 0 => {}
                _ => return,
            }
        }
        let image = image::encode_image(&self.root, collective_flags(self.collective));
        let _ = fs::write(&self.path, &image);
    }
}

impl std::fmt::Debug for ContainerFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerFile")
            .field("path", &self.path)
            .field("links", &self.root.num_links())
            .field("collective", &self.collective)
            .field("dirty", &self.dirty)
            .finish()
    }
}

fn collective_flags(collective: bool) -> u8 {
    if collective {
        FLAG_COLLECTIVE
    } else {
        0
    }
}

/// Walk `components` under `group`, creating missing groups along the way.
fn ensure_group<'a, 'p>(
    group: &'a mut GroupNode,
    mut components: impl Iterator<Item = &'p str>,
    full_path: &str,
    changed: &mut bool,
) -> Result<&'a mut GroupNode, Error> {
    let component = match components.next() {
        None => return Ok(group),
        Some(c) => c,
    };
    if group.child(component).is_none() {
        if component.len() > record::MAX_NAME_LEN {
            return Err(Error::NameTooLong(component.len()));
        }
        group.insert(component.to_string(), Node::Group(GroupNode::new()));
        *changed = true;
    }
    match group.child_mut(component) {
        Some(Node::Group(g)) => ensure_group(g, components, full_path, changed),
        Some(Node::Dataset(_)) => Err(Error::NotAGroup(full_path.to_string())),
        // Just inserted or found above.
        None => unreachable!(),
    }
}

// ---------------------------------------------------------------------------
// Stateless one-shot queries
// ---------------------------------------------------------------------------

/// Enumerate the direct children of `group_path` inside the container at
/// `container`, without the caller managing a handle.
///
/// Opens the container non-truncating, queries, and releases it before
/// returning; ownership guarantees no handle survives any exit path.
pub fn dataset_list<P: AsRef<Path>>(
    container: P,
    group_path: &str,
    parallel: bool,
) -> Result<Vec<String>, Error> {
    let file = ContainerFile::open(container, false, parallel)?;
    file.dataset_list(group_path)
}

/// Check whether `dataset_path` exists inside the container at `container`,
/// without the caller managing a handle.
pub fn dataset_exists<P: AsRef<Path>>(
    container: P,
    dataset_path: &str,
    parallel: bool,
) -> Result<bool, Error> {
    let file = ContainerFile::open(container, false, parallel)?;
    Ok(file.has_dataset(dataset_path))
}
