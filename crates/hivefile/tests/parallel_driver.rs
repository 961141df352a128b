//! Collective sessions with an installed driver.
//!
//! Separate binary from `parallel_no_driver`: `install_driver` is
//! process-wide and install-once, so the no-driver error path cannot be
//! exercised in the same process.

use std::path::PathBuf;

use hivefile::parallel::{install_driver, SoloDriver};
use hivefile::{ContainerFile, Error};

fn temp_container(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "hivefile_pd_{}_{name}.hvf",
        std::process::id()
    ));
    std::fs::remove_file(&path).ok();
    path
}

fn ensure_driver() {
    // Tests within a binary share the process; only the first install wins.
    install_driver(Box::new(SoloDriver)).ok();
}

#[test]
fn collective_session_roundtrip() {
    ensure_driver();
    let path = temp_container("roundtrip");

    let mut file = ContainerFile::open(&path, true, true).unwrap();
    assert!(file.is_collective());
    file.add_group("/mesh").unwrap();
    file.write_f64("/mesh/coords", &[0.0, 1.0, 2.0], &[3]).unwrap();
    file.close().unwrap();

    // A serial reopen sees the collectively written contents; the mode is
    // per-session, not a property of the data.
    let file = ContainerFile::open(&path, false, false).unwrap();
    assert!(!file.is_collective());
    assert_eq!(file.read_f64("/mesh/coords").unwrap(), vec![0.0, 1.0, 2.0]);
    drop(file);
    std::fs::remove_file(&path).ok();
}

#[test]
fn serial_session_is_not_collective() {
    ensure_driver();
    let path = temp_container("serial");
    let file = ContainerFile::open(&path, true, false).unwrap();
    assert!(!file.is_collective());
    drop(file);
    std::fs::remove_file(&path).ok();
}

#[test]
fn stateless_queries_with_driver() {
    ensure_driver();
    let path = temp_container("stateless");
    let mut file = ContainerFile::open(&path, true, true).unwrap();
    file.write_i32("/d", &[4, 5], &[2]).unwrap();
    file.close().unwrap();

    assert!(hivefile::dataset_exists(&path, "/d", true).unwrap());
    assert_eq!(hivefile::dataset_list(&path, "/", true).unwrap(), vec!["d"]);
    std::fs::remove_file(&path).ok();
}

#[test]
fn second_install_is_rejected() {
    ensure_driver();
    let err = install_driver(Box::new(SoloDriver)).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}
