//! Library block: a named tree of folders and leaf assets, where every
//! leaf embeds a whole nested file.
//!
//! Both directions walk the tree with an explicit work stack — node depth
//! is attacker-controlled, so no recursion on it.

use crate::error::{Error, Result};
use crate::file::File;
use crate::stream::BinStream;

use super::{sign, Block};

/// One node of the library file tree.  A node with children is a
/// directory; a childless node is either an empty folder (`is_folder`) or
/// a leaf that must carry an asset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub name: String,
    pub is_folder: bool,
    pub children: Vec<Node>,
    pub asset: Option<File>,
}

impl Node {
    pub fn folder(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_folder: true, ..Self::default() }
    }

    pub fn leaf(name: impl Into<String>, asset: File) -> Self {
        Self { name: name.into(), asset: Some(asset), ..Self::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Library {
    pub root: Node,
}

impl Library {
    /// Walk the tree by exact name matches, one path segment at a time.
    /// Empty segments are ignored, so `"a/b"`, `"/a/b"` and `"a//b"` agree.
    pub fn get_node(&self, path: &str) -> Option<&Node> {
        let mut current = &self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current.children.iter().find(|child| child.name == segment)?;
        }
        Some(current)
    }
}

fn write_node_header(stream: &mut BinStream, node: &Node) -> Result<u16> {
    stream.write_str(&node.name).write_u8(node.is_folder as u8);
    let child_count = u16::try_from(node.children.len())
        .map_err(|_| Error::MalformedBlock("more than 65535 child nodes"))?;
    stream.write_u16(child_count);
    if child_count == 0 && !node.is_folder {
        let asset = node
            .asset
            .as_ref()
            .filter(|file| file.header.type_sign != sign::format::NONE)
            .ok_or(Error::CorruptLibrary("leaf node carries no typed asset"))?;
        asset.write_nested(stream)?;
    }
    Ok(child_count)
}

pub(crate) fn write_library(stream: &mut BinStream, block: &Block) -> Result<()> {
    let Block::Library(library) = block else {
        return Err(Error::MalformedBlock("block is not a library"));
    };
    let mut stack = vec![&library.root];
    while let Some(node) = stack.pop() {
        write_node_header(stream, node)?;
        for child in node.children.iter().rev() {
            stack.push(child);
        }
    }
    Ok(())
}

fn read_node_header(stream: &mut BinStream) -> Result<(Node, u16)> {
    let mut node = Node {
        name: stream.read_string()?,
        is_folder: stream.read_u8()? != 0,
        ..Node::default()
    };
    let child_count = stream.read_u16()?;
    if child_count == 0 && !node.is_folder {
        let asset = File::read_nested(stream)?;
        if asset.header.type_sign == sign::format::NONE {
            return Err(Error::CorruptLibrary("leaf asset has no type"));
        }
        node.asset = Some(asset);
    }
    Ok((node, child_count))
}

pub(crate) fn read_library(stream: &mut BinStream) -> Result<Block> {
    struct PendingDir {
        node: Node,
        remaining: u16,
    }

    let (root, root_children) = read_node_header(stream)?;
    if root_children == 0 {
        return Ok(Block::Library(Library { root }));
    }

    let mut stack = vec![PendingDir { node: root, remaining: root_children }];
    loop {
        let (node, child_count) = read_node_header(stream)?;
        if child_count > 0 {
            stack.push(PendingDir { node, remaining: child_count });
            continue;
        }
        // A finished subtree: attach it, then unwind every directory this
        // completes.
        let mut done = node;
        loop {
            let Some(parent) = stack.last_mut() else {
                return Err(Error::CorruptLibrary("dangling node outside the tree"));
            };
            parent.node.children.push(done);
            parent.remaining -= 1;
            if parent.remaining > 0 {
                break;
            }
            let Some(finished) = stack.pop() else {
                return Err(Error::CorruptLibrary("dangling node outside the tree"));
            };
            if stack.is_empty() {
                return Ok(Block::Library(Library { root: finished.node }));
            }
            done = finished.node;
        }
    }
}
