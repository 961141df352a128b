//! Container file accessor: groups, datasets, and shape introspection over
//! the hivefile format.
//!
//! This crate provides the session layer on top of `hivefile-format`: open
//! or create a container, probe and create groups, create typed datasets,
//! and inspect dataset shapes and group contents.
//!
//! # Basic usage
//!
//! ```no_run
//! use hivefile::ContainerFile;
//!
//! let mut file = ContainerFile::open("results.hvf", true, false).unwrap();
//! file.add_group("/mesh").unwrap();
//! file.write_f64("/mesh/coordinates", &[0.0, 0.0, 1.0, 0.0], &[2, 2]).unwrap();
//! assert_eq!(file.dataset_rank("/mesh/coordinates").unwrap(), 2);
//! file.close().unwrap();
//! ```
//!
//! # Stateless queries
//!
//! ```no_run
//! let names = hivefile::dataset_list("results.hvf", "/mesh", false).unwrap();
//! let found = hivefile::dataset_exists("results.hvf", "/mesh/coordinates", false).unwrap();
//! assert!(found && names.contains(&"coordinates".to_string()));
//! ```
//!
//! # Collective I/O
//!
//! Multi-process sessions require a [`parallel::CollectiveDriver`] installed
//! once per process; without one, `open(.., parallel = true)` fails with
//! [`Error::Configuration`] before any file is touched.

pub mod error;
pub mod file;
pub mod parallel;

pub use error::Error;
pub use file::{dataset_exists, dataset_list, ContainerFile};

// Re-export the element type for callers that inspect dataset records.
pub use hivefile_format::datatype::ScalarType;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    // -----------------------------------------------------------------------
    // Helper: unique temp container per test
    // -----------------------------------------------------------------------

    fn temp_container(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "hivefile_test_{}_{name}.hvf",
            std::process::id()
        ));
        std::fs::remove_file(&path).ok();
        path
    }

    fn fresh(name: &str) -> (PathBuf, ContainerFile) {
        let path = temp_container(name);
        let file = ContainerFile::open(&path, true, false).unwrap();
        (path, file)
    }

    // -----------------------------------------------------------------------
    // Probes on a fresh container
    // -----------------------------------------------------------------------

    #[test]
    fn fresh_container_probes_false() {
        let (path, file) = fresh("fresh_probes");
        assert!(!file.has_group("/mesh"));
        assert!(!file.has_dataset("/mesh/coordinates"));
        assert!(!file.has_dataset("anything"));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn root_group_always_exists() {
        let (path, file) = fresh("root_exists");
        assert!(file.has_group("/"));
        assert!(file.has_group(""));
        assert_eq!(file.num_links_in_group("/").unwrap(), 0);
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    // -----------------------------------------------------------------------
    // Group operations
    // -----------------------------------------------------------------------

    #[test]
    fn add_group_then_probe() {
        let (path, mut file) = fresh("add_group");
        file.add_group("/mesh").unwrap();
        assert!(file.has_group("/mesh"));
        assert!(!file.has_dataset("/mesh"));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn add_group_is_idempotent() {
        let (path, mut file) = fresh("add_group_idem");
        file.add_group("/mesh").unwrap();
        file.add_group("/mesh").unwrap();
        assert_eq!(file.num_links_in_group("/").unwrap(), 1);
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn add_group_creates_intermediates() {
        let (path, mut file) = fresh("add_group_nested");
        file.add_group("/a/b/c").unwrap();
        assert!(file.has_group("/a"));
        assert!(file.has_group("/a/b"));
        assert!(file.has_group("/a/b/c"));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn add_group_across_dataset_fails() {
        let (path, mut file) = fresh("add_group_dataset");
        file.write_f64("/values", &[1.0], &[1]).unwrap();
        let err = file.add_group("/values/deeper").unwrap_err();
        assert!(matches!(err, Error::NotAGroup(_)));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    // -----------------------------------------------------------------------
    // Dataset write + introspection
    // -----------------------------------------------------------------------

    #[test]
    fn rank_and_shape_match_write() {
        let (path, mut file) = fresh("rank_shape");
        file.write_f64(
            "/matrix",
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            &[2, 3],
        )
        .unwrap();
        assert_eq!(file.dataset_rank("/matrix").unwrap(), 2);
        assert_eq!(file.dataset_shape("/matrix").unwrap(), vec![2, 3]);
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn scalar_dataset_rank_zero() {
        let (path, mut file) = fresh("scalar_rank");
        file.write_i64("/count", &[42], &[]).unwrap();
        assert_eq!(file.dataset_rank("/count").unwrap(), 0);
        assert!(file.dataset_shape("/count").unwrap().is_empty());
        assert_eq!(file.read_i64("/count").unwrap(), vec![42]);
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn typed_roundtrips() {
        let (path, mut file) = fresh("typed_roundtrips");
        file.write_f64("/f64", &[1.5, -2.5], &[2]).unwrap();
        file.write_f32("/f32", &[0.5f32], &[1]).unwrap();
        file.write_i64("/i64", &[i64::MIN, i64::MAX], &[2]).unwrap();
        file.write_i32("/i32", &[-7, 7], &[2]).unwrap();
        file.write_u8("/u8", &[0, 128, 255], &[3]).unwrap();
        file.write_str("/str", &["alpha", "beta"], &[2]).unwrap();

        assert_eq!(file.read_f64("/f64").unwrap(), vec![1.5, -2.5]);
        assert_eq!(file.read_f32("/f32").unwrap(), vec![0.5f32]);
        assert_eq!(file.read_i64("/i64").unwrap(), vec![i64::MIN, i64::MAX]);
        assert_eq!(file.read_i32("/i32").unwrap(), vec![-7, 7]);
        assert_eq!(file.read_u8("/u8").unwrap(), vec![0, 128, 255]);
        assert_eq!(file.read_str("/str").unwrap(), vec!["alpha", "beta"]);
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn shape_mismatch_rejected() {
        let (path, mut file) = fresh("shape_mismatch");
        let err = file.write_f64("/bad", &[1.0, 2.0], &[3]).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(!file.has_dataset("/bad"));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rank_past_format_limit_rejected() {
        let (path, mut file) = fresh("rank_limit");
        // 256 unit extents: element count is fine, the rank field is not.
        let shape = vec![1u64; 256];
        let err = file.write_u8("/deep", &[7], &shape).unwrap_err();
        assert!(matches!(err, Error::RankTooLarge(256)));
        assert!(!file.has_dataset("/deep"));
        file.close().unwrap();
        // The rejected write corrupted nothing: the container reopens.
        ContainerFile::open(&path, false, false).unwrap();
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rank_at_format_limit_accepted() {
        let (path, mut file) = fresh("rank_at_limit");
        let shape = vec![1u64; 255];
        file.write_u8("/deep", &[7], &shape).unwrap();
        assert_eq!(file.dataset_rank("/deep").unwrap(), 255);
        file.close().unwrap();
        let file = ContainerFile::open(&path, false, false).unwrap();
        assert_eq!(file.read_u8("/deep").unwrap(), vec![7]);
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn long_dataset_name_rejected() {
        let (path, mut file) = fresh("long_dataset_name");
        let name = format!("/{}", "x".repeat(70_000));
        let err = file.write_f64(&name, &[1.0], &[1]).unwrap_err();
        assert!(matches!(err, Error::NameTooLong(70_000)));
        file.close().unwrap();
        ContainerFile::open(&path, false, false).unwrap();
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn long_group_name_rejected() {
        let (path, mut file) = fresh("long_group_name");
        let name = format!("/{}", "g".repeat(70_000));
        let err = file.add_group(&name).unwrap_err();
        assert!(matches!(err, Error::NameTooLong(70_000)));
        assert_eq!(file.num_links_in_group("/").unwrap(), 0);
        file.close().unwrap();
        ContainerFile::open(&path, false, false).unwrap();
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn shape_extent_overflow_rejected() {
        let (path, mut file) = fresh("shape_overflow");
        let err = file
            .write_f64("/huge", &[1.0], &[u64::MAX, 2])
            .unwrap_err();
        assert!(matches!(err, Error::ShapeOverflow));
        assert!(!file.has_dataset("/huge"));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn type_mismatch_on_read() {
        let (path, mut file) = fresh("type_mismatch");
        file.write_i32("/values", &[1, 2], &[2]).unwrap();
        let err = file.read_f64("/values").unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: "f64",
                ..
            }
        ));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn write_requires_existing_parent() {
        let (path, mut file) = fresh("write_parent");
        let err = file.write_f64("/missing/values", &[1.0], &[1]).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn write_to_occupied_path_fails() {
        let (path, mut file) = fresh("write_occupied");
        file.write_f64("/values", &[1.0], &[1]).unwrap();
        let err = file.write_f64("/values", &[2.0], &[1]).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
        let err = file.write_f64("/", &[2.0], &[1]).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    // -----------------------------------------------------------------------
    // Introspection errors
    // -----------------------------------------------------------------------

    #[test]
    fn rank_of_missing_dataset() {
        let (path, file) = fresh("rank_missing");
        assert!(matches!(
            file.dataset_rank("/absent").unwrap_err(),
            Error::NotFound(_)
        ));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rank_of_group_is_not_a_dataset() {
        let (path, mut file) = fresh("rank_group");
        file.add_group("/mesh").unwrap();
        assert!(matches!(
            file.dataset_rank("/mesh").unwrap_err(),
            Error::NotADataset(_)
        ));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn list_of_missing_group() {
        let (path, file) = fresh("list_missing");
        assert!(matches!(
            file.dataset_list("/absent").unwrap_err(),
            Error::NotFound(_)
        ));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn list_of_dataset_is_not_a_group() {
        let (path, mut file) = fresh("list_dataset");
        file.write_u8("/blob", &[1], &[1]).unwrap();
        assert!(matches!(
            file.dataset_list("/blob").unwrap_err(),
            Error::NotAGroup(_)
        ));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    // -----------------------------------------------------------------------
    // Enumeration
    // -----------------------------------------------------------------------

    #[test]
    fn list_and_count_group_children() {
        let (path, mut file) = fresh("list_children");
        file.add_group("/g").unwrap();
        file.write_f64("/g/a", &[1.0], &[1]).unwrap();
        file.write_f64("/g/b", &[2.0], &[1]).unwrap();
        file.write_f64("/g/c", &[3.0], &[1]).unwrap();

        let mut names = file.dataset_list("/g").unwrap();
        names.sort();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(file.num_links_in_group("/g").unwrap(), 3);
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn enumeration_follows_insertion_order() {
        let (path, mut file) = fresh("insertion_order");
        file.write_i32("/z", &[1], &[1]).unwrap();
        file.write_i32("/a", &[1], &[1]).unwrap();
        file.write_i32("/m", &[1], &[1]).unwrap();
        assert_eq!(file.dataset_list("/").unwrap(), vec!["z", "a", "m"]);
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    // -----------------------------------------------------------------------
    // Debug / error display
    // -----------------------------------------------------------------------

    #[test]
    fn container_debug_impl() {
        let (path, file) = fresh("debug_impl");
        let debug = format!("{file:?}");
        assert!(debug.contains("ContainerFile"));
        assert!(debug.contains("links"));
        drop(file);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn error_display() {
        let err = Error::NotADataset("/g".into());
        assert_eq!(err.to_string(), "not a dataset: /g");

        let err = Error::Configuration("no driver".into());
        assert!(err.to_string().contains("configuration error"));

        let err = Error::TypeMismatch {
            expected: "f64",
            actual: "i32".into(),
        };
        assert!(err.to_string().contains("expected f64"));
    }
}
