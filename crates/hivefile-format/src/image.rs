//! Whole-image serialization.
//!
//! The engine is read-modify-write at file granularity: a complete image is
//! parsed into a [`GroupNode`] tree at open time and serialized back in one
//! piece at flush time. Records are written post-order so that every link
//! address is known before its parent group record is emitted; the root group
//! record comes last, and the header at offset 0 points at it.

#[cfg(not(feature = "std"))]
use alloc::{string::ToString, vec, vec::Vec};

use crate::error::FormatError;
use crate::header::{FileHeader, FORMAT_VERSION, HEADER_SIZE};
use crate::record::{DatasetRecord, GroupRecord, LinkEntry, LinkKind};
use crate::tree::{GroupNode, Node};

/// Maximum group nesting the parser will follow. Guards against address
/// cycles in corrupt images; legitimate hierarchies are nowhere near this.
pub const MAX_DEPTH: usize = 64;

/// Serialize a tree into a complete file image.
pub fn encode_image(root: &GroupNode, flags: u8) -> Vec<u8> {
    let mut buf = vec![0u8; HEADER_SIZE];
    let root_address = write_group(&mut buf, root);
    let header = FileHeader {
        version: FORMAT_VERSION,
        flags,
        root_address,
        eof_address: buf.len() as u64,
    };
    buf[..HEADER_SIZE].copy_from_slice(&header.encode());
    buf
}

/// A minimal valid image: empty root group.
pub fn empty_image(flags: u8) -> Vec<u8> {
    encode_image(&GroupNode::new(), flags)
}

fn write_group(buf: &mut Vec<u8>, group: &GroupNode) -> u64 {
    let mut entries = Vec::with_capacity(group.num_links());
    for (name, node) in group.iter() {
        let address = match node {
            Node::Group(g) => write_group(buf, g),
            Node::Dataset(d) => {
                let address = buf.len() as u64;
                buf.extend_from_slice(&d.encode());
                address
            }
        };
        entries.push(LinkEntry {
            name: name.to_string(),
            kind: node.kind(),
            address,
        });
    }
    let address = buf.len() as u64;
    buf.extend_from_slice(&GroupRecord { entries }.encode());
    address
}

/// Parse a complete file image into its header and object tree.
///
/// Every decode failure surfaces as a [`FormatError`]; corrupt input never
/// panics.
pub fn parse_image(data: &[u8]) -> Result<(FileHeader, GroupNode), FormatError> {
    let header = FileHeader::parse(data)?;
    if header.eof_address > data.len() as u64 {
        return Err(FormatError::UnexpectedEof {
            expected: header.eof_address as usize,
            available: data.len(),
        });
    }
    let root = parse_group(data, header.root_address, 0)?;
    Ok((header, root))
}

fn checked_offset(data: &[u8], address: u64) -> Result<usize, FormatError> {
    if address >= data.len() as u64 {
        return Err(FormatError::AddressOutOfBounds(address));
    }
    Ok(address as usize)
}

fn parse_group(data: &[u8], address: u64, depth: usize) -> Result<GroupNode, FormatError> {
    if depth >= MAX_DEPTH {
        return Err(FormatError::NestingTooDeep(MAX_DEPTH));
    }
    let offset = checked_offset(data, address)?;
    let (record, _) = GroupRecord::parse(data, offset)?;

    let mut group = GroupNode::new();
    for entry in record.entries {
        if group.child(&entry.name).is_some() {
            return Err(FormatError::DuplicateLinkName(entry.name));
        }
        let node = match entry.kind {
            LinkKind::Group => Node::Group(parse_group(data, entry.address, depth + 1)?),
            LinkKind::Dataset => {
                let offset = checked_offset(data, entry.address)?;
                let (dataset, _) = DatasetRecord::parse(data, offset)?;
                Node::Dataset(dataset)
            }
        };
        group.insert(entry.name, node);
    }
    Ok(group)
}
