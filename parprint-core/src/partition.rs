use serde::{Deserialize, Serialize};

/// Half-open page range `[start, end)`, 0-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, page: usize) -> bool {
        self.start <= page && page < self.end
    }
}

/// Split `[0, total_pages)` into `num_chunks` contiguous ranges.
///
/// Every range has `total_pages / num_chunks` pages and the last one also
/// takes the remainder. With fewer pages than chunks, the first
/// `total_pages` ranges get one page each and the rest are empty ranges
/// pinned at `total_pages`, so the output length is always `num_chunks`.
pub fn partition(total_pages: usize, num_chunks: usize) -> Vec<PageRange> {
    if num_chunks == 0 {
        return Vec::new();
    }
    if total_pages < num_chunks {
        return (0..num_chunks)
            .map(|i| {
                let start = i.min(total_pages);
                let end = (i + 1).min(total_pages);
                PageRange { start, end }
            })
            .collect();
    }

    let per_chunk = total_pages / num_chunks;
    (0..num_chunks)
        .map(|i| {
            let start = i * per_chunk;
            let end = if i == num_chunks - 1 {
                total_pages
            } else {
                start + per_chunk
            };
            PageRange { start, end }
        })
        .collect()
}
