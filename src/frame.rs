//! Block framing: the terminator-delimited stream of
//! `(u64 size, u32 signature, payload)` frames that forms a file body and
//! every nested block list.
//!
//! `size` counts only the payload bytes after the signature, which is what
//! makes unknown block kinds skippable.  Decode guarantees the cursor lands
//! on the next frame no matter what a payload decoder did: after every
//! frame the position is forced to `payload_start + size`.

use log::{debug, warn};

use crate::blocks::Block;
use crate::error::{Error, Result};
use crate::registry;
use crate::stream::BinStream;

/// Encode `blocks` in order, then the zero terminator.  Encoder errors are
/// fatal — a save never produces a partial block stream.
pub fn write_blocks(stream: &mut BinStream, blocks: &[Block]) -> Result<()> {
    for block in blocks {
        let signature = block.signature();
        let Some(codec) = registry::get(signature) else {
            warn!("no stream registered for block {signature:#010x}; block dropped");
            continue;
        };
        let mut payload = BinStream::new();
        (codec.write)(&mut payload, block)?;
        stream
            .write_u64(payload.len() as u64)
            .write_u32(signature)
            .write_bytes(payload.data());
    }
    stream.write_u64(0);
    Ok(())
}

/// Decode frames until the zero terminator (or the end of the buffer).
///
/// Unknown signatures are skipped over by their declared size.  A
/// registered decoder that fails drops only its own block — except for
/// library corruption, which poisons the whole file.
pub fn read_blocks(stream: &mut BinStream) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();
    while stream.remaining() > 0 {
        let block_size = stream.read_u64()? as usize;
        if block_size == 0 {
            break;
        }
        let signature = stream.read_u32()?;
        let payload_start = stream.pos();
        let payload_end = payload_start + block_size;
        if payload_end > stream.len() {
            return Err(Error::TruncatedStream {
                needed: block_size,
                left: stream.remaining(),
            });
        }

        match registry::get(signature) {
            Some(codec) => match (codec.read)(stream) {
                Ok(block) => {
                    let consumed = stream.pos() - payload_start;
                    if consumed != block_size {
                        warn!(
                            "block {signature:#010x} decoder consumed {consumed} of \
                             {block_size} payload bytes"
                        );
                    }
                    blocks.push(block);
                }
                Err(err @ Error::CorruptLibrary(_)) => return Err(err),
                Err(err) => {
                    let err = Error::BlockDecodeFailed { signature, source: Box::new(err) };
                    warn!("{err}");
                }
            },
            None => debug!("unknown block {signature:#010x}; skipping {block_size} bytes"),
        }
        stream.set_pos(payload_end);
    }
    Ok(blocks)
}
