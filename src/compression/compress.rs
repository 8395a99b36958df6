use std::io;

use log::{error, info};

use super::compress_chunk::compress_chunk;
use super::tokenize::ChunkScratch;
use crate::error::XpressError;
use crate::tools::cli::XpOpts;
use crate::tools::dictionary::{Dictionary, MatchFinder};
use crate::tools::files::{read_input, write_output, Job};
use crate::tools::symbol::{CHUNK_SIZE, MIN_DATA};

/// A safe output capacity for compressing `len` bytes.
///
/// No symbol code is longer than 15 bits and every match costs less per byte than a literal, so a
/// chunk never needs more than two bytes per input byte on top of its table, words and end symbol.
pub fn max_compressed_size(len: usize) -> usize {
    let chunks = ((len + CHUNK_SIZE - 1) / CHUNK_SIZE).max(1);
    chunks * (MIN_DATA + 4) + 2 * len
}

/// Compress `input` into `output` with the default match finder. Returns the compressed size.
pub fn compress(input: &[u8], output: &mut [u8]) -> Result<usize, XpressError> {
    let mut dictionary = Dictionary::new(input);
    compress_with(input, output, &mut dictionary)
}

/// Compress `input` into `output`, taking matches from `finder`. The finder must be built over
/// the same `input`.
pub fn compress_with<M: MatchFinder>(
    input: &[u8],
    output: &mut [u8],
    finder: &mut M,
) -> Result<usize, XpressError> {
    let mut scratch = ChunkScratch::new(input.len());
    let mut in_pos = 0;
    let mut out_pos = 0;
    let mut chunks = 0;

    loop {
        let len = (input.len() - in_pos).min(CHUNK_SIZE);
        let chunk = compress_chunk(
            input,
            in_pos,
            len,
            &mut output[out_pos..],
            &mut scratch,
            finder,
        )
        .map_err(|e| {
            error!("Xpress Huffman compression error in chunk {}: {}", chunks + 1, e);
            e
        })?;
        in_pos += chunk.consumed;
        out_pos += chunk.written;
        chunks += 1;
        if chunk.end_of_stream {
            break;
        }
        if chunk.consumed == 0 {
            error!("Xpress Huffman compression made no progress at {}", in_pos);
            return Err(XpressError::Internal("chunk consumed no input"));
        }
    }

    info!(
        "Compressed {} bytes into {} bytes in {} chunks",
        input.len(),
        out_pos,
        chunks
    );
    Ok(out_pos)
}

/// Compress into a new, exactly sized vec. `level` runs from 1 (fastest) to 9 (smallest).
pub fn compress_to_vec(input: &[u8], level: u8) -> Result<Vec<u8>, XpressError> {
    let mut output = vec![0_u8; max_compressed_size(input.len())];
    let mut dictionary = Dictionary::with_level(input, level);
    let written = compress_with(input, &mut output, &mut dictionary)?;
    output.truncate(written);
    Ok(output)
}

/// Compress every input named in opts <XpOpts> (or stdin when there are none).
pub fn compress_files(opts: &XpOpts) -> io::Result<()> {
    for job in Job::for_compression(opts) {
        let data = read_input(&job)?;
        let packed = compress_to_vec(&data, opts.level)?;
        info!(
            "{}: {} -> {} bytes",
            job.source_name(),
            data.len(),
            packed.len()
        );
        write_output(&job, opts, &packed)?;
    }
    Ok(())
}
