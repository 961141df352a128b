//! Binary format for the hivefile hierarchical container.
//!
//! A hivefile is a single on-disk file holding a tree of groups and
//! datasets: a fixed header at offset 0, followed by checksummed object
//! records. This crate provides the byte-level encode/parse layer and the
//! in-memory object tree; the `hivefile` crate layers the accessor API on
//! top. Supports `no_std` environments with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod checksum;
pub mod datatype;
pub mod error;
pub mod header;
pub mod image;
pub mod record;
pub mod signature;
pub mod tree;
