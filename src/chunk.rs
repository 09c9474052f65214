//! Fixed-stride overlap chunker.
//!
//! Splits document body text into windows of at most `chunk_size`
//! characters, each window starting `chunk_size - overlap` characters after
//! the previous one. Offsets are character offsets, so multi-byte text
//! never gets cut mid-codepoint.
//!
//! Chunk ids are deterministic (`{document_id}_chunk_{index}`), which makes
//! re-ingestion overwrite rather than duplicate vectors in the store.

use crate::error::{Error, Result};
use crate::models::{Chunk, Document};

/// Split a document body into overlapping fixed-size chunks.
///
/// Pure function over its inputs; performs no I/O. An empty body yields an
/// empty vector (a no-op, not an error). A body shorter than `chunk_size`
/// yields exactly one chunk equal to the whole body.
///
/// Windows are cut until one reaches the end of the body; a trailing window
/// that would contain only the previous window's overlap is never emitted.
/// Dropping each chunk's leading `overlap` characters (except the first)
/// and concatenating in index order reconstructs the body exactly.
///
/// # Errors
///
/// Returns a configuration error before any text is processed when
/// `chunk_size` is zero or `overlap >= chunk_size`.
pub fn chunk_document(doc: &Document, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(Error::config("chunking.chunk_size must be > 0"));
    }
    if overlap >= chunk_size {
        return Err(Error::config(format!(
            "chunking.overlap ({}) must be less than chunking.chunk_size ({})",
            overlap, chunk_size
        )));
    }

    if doc.body.is_empty() {
        return Ok(Vec::new());
    }

    // Byte offset of every char boundary, plus the end of the string, so
    // char windows can be sliced without re-walking the body each time.
    let mut boundaries: Vec<usize> = doc.body.char_indices().map(|(i, _)| i).collect();
    boundaries.push(doc.body.len());
    let n_chars = boundaries.len() - 1;

    let stride = chunk_size - overlap;
    let mut windows: Vec<(usize, usize)> = Vec::new();
    let mut start = 0usize;

    loop {
        let end = (start + chunk_size).min(n_chars);
        windows.push((start, end));
        if end == n_chars {
            break;
        }
        start += stride;
    }

    let total = windows.len();
    let chunks = windows
        .into_iter()
        .enumerate()
        .map(|(index, (start, end))| Chunk {
            id: format!("{}_chunk_{}", doc.id, index),
            document_id: doc.id.clone(),
            index,
            total,
            start,
            end,
            text: doc.body[boundaries[start]..boundaries[end]].to_string(),
        })
        .collect();

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn make_doc(body: &str) -> Document {
        Document {
            id: "doc1".to_string(),
            title: "Doc One".to_string(),
            source: "test".to_string(),
            body: body.to_string(),
            metadata: Map::new(),
        }
    }

    /// Drop each chunk's leading `overlap` chars (except the first) and
    /// concatenate; the result must equal the original body.
    fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(&chunk.text);
            } else {
                out.extend(chunk.text.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn test_empty_body_yields_no_chunks() {
        let chunks = chunk_document(&make_doc(""), 10, 2).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_body_yields_single_chunk() {
        let doc = make_doc("hello");
        let chunks = chunk_document(&doc, 10, 2).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].total, 1);
        assert_eq!((chunks[0].start, chunks[0].end), (0, 5));
    }

    #[test]
    fn test_body_exactly_chunk_size() {
        let chunks = chunk_document(&make_doc("abcdefghij"), 10, 3).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "abcdefghij");
    }

    #[test]
    fn test_overlap_equal_to_chunk_size_is_rejected() {
        let err = chunk_document(&make_doc("abc"), 4, 4).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_overlap_greater_than_chunk_size_is_rejected() {
        let err = chunk_document(&make_doc("abc"), 4, 7).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let err = chunk_document(&make_doc("abc"), 0, 0).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_stride_and_spans() {
        // len 10, size 4, overlap 2 => starts 0, 2, 4, 6
        let chunks = chunk_document(&make_doc("abcdefghij"), 4, 2).unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].text, "abcd");
        assert_eq!(chunks[1].text, "cdef");
        assert_eq!(chunks[2].text, "efgh");
        assert_eq!(chunks[3].text, "ghij");
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert_eq!(c.total, 4);
            assert_eq!(c.start, i * 2);
            assert_eq!(c.id, format!("doc1_chunk_{}", i));
        }
    }

    #[test]
    fn test_no_trailing_all_overlap_window() {
        // A literal "while start < len" loop would emit a 5th window [8, 10)
        // consisting entirely of overlap; the count identity forbids it.
        let chunks = chunk_document(&make_doc("abcdefghij"), 4, 2).unwrap();
        assert_eq!(chunks.last().unwrap().end, 10);
        assert_eq!(chunks.len(), 4);
    }

    #[test]
    fn test_chunk_count_formula() {
        // count == ceil((len - overlap) / (chunk_size - overlap)) for len > overlap
        for (len, size, overlap) in [
            (10usize, 4usize, 2usize),
            (11, 4, 2),
            (100, 10, 3),
            (57, 12, 5),
            (1000, 100, 20),
        ] {
            let body: String = std::iter::repeat('x').take(len).collect();
            let chunks = chunk_document(&make_doc(&body), size, overlap).unwrap();
            let expected = (len - overlap).div_ceil(size - overlap);
            assert_eq!(
                chunks.len(),
                expected,
                "len={} size={} overlap={}",
                len,
                size,
                overlap
            );
        }
    }

    #[test]
    fn test_reconstruction_round_trip() {
        let body = "The quick brown fox jumps over the lazy dog. \
                    Pack my box with five dozen liquor jugs.";
        for (size, overlap) in [(10, 0), (10, 3), (16, 8), (7, 6), (90, 10)] {
            let chunks = chunk_document(&make_doc(body), size, overlap).unwrap();
            assert_eq!(
                reconstruct(&chunks, overlap),
                body,
                "size={} overlap={}",
                size,
                overlap
            );
        }
    }

    #[test]
    fn test_multibyte_text_is_not_split_mid_codepoint() {
        let body = "héllo wörld — ünïcode tëxt ø πλ";
        let chunks = chunk_document(&make_doc(body), 7, 2).unwrap();
        assert_eq!(reconstruct(&chunks, 2), body);
        for c in &chunks {
            assert!(c.text.chars().count() <= 7);
        }
    }

    #[test]
    fn test_deterministic() {
        let body = "alpha beta gamma delta epsilon zeta";
        let a = chunk_document(&make_doc(body), 9, 4).unwrap();
        let b = chunk_document(&make_doc(body), 9, 4).unwrap();
        assert_eq!(a, b);
    }
}
