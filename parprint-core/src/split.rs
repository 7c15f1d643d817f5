use std::path::Path;

use lopdf::Document as PdfDocument;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{Chunk, Document, chunk_file_name, document_stem};
use crate::error::Result;
use crate::partition::{PageRange, partition};

/// A loaded source PDF.
pub struct SourcePdf {
    pub document: Document,
    pdf: PdfDocument,
}

impl SourcePdf {
    /// Load `<dir>/<name>.pdf`.
    pub fn open(dir: &Path, name: &str) -> Result<Self> {
        let source = Document::source_path(dir, name);
        let pdf = PdfDocument::load(&source)?;
        let total_pages = pdf.get_pages().len();
        debug!(path = %source.display(), pages = total_pages, "loaded");
        Ok(Self {
            document: Document {
                name: document_stem(name).to_string(),
                total_pages,
                source,
            },
            pdf,
        })
    }

    /// Partition into `num_chunks` ranges and write one PDF per non-empty
    /// range into `out_dir` as `<stem>_<i>.pdf`.
    ///
    /// Empty ranges (fewer pages than chunks) produce no file.
    pub fn write_chunks(&self, num_chunks: usize, out_dir: &Path) -> Result<Vec<Chunk>> {
        let ranges = partition(self.document.total_pages, num_chunks);
        let empty = ranges.iter().filter(|r| r.is_empty()).count();
        if empty > 0 {
            warn!(
                document = %self.document.name,
                pages = self.document.total_pages,
                chunks = num_chunks,
                empty,
                "fewer pages than queues; some queues get no chunk"
            );
        }

        ranges
            .par_iter()
            .enumerate()
            .filter(|(_, r)| !r.is_empty())
            .map(|(index, range)| -> Result<Chunk> {
                let local_path = out_dir.join(chunk_file_name(&self.document.name, index, "pdf"));
                let mut part = self.extract(*range);
                part.save(&local_path)?;
                Ok(Chunk {
                    index,
                    range: *range,
                    local_path,
                })
            })
            .collect()
    }

    /// Copy of the document holding only the pages in `range`.
    fn extract(&self, range: PageRange) -> PdfDocument {
        let mut part = self.pdf.clone();
        // lopdf numbers pages from 1
        let unwanted: Vec<u32> = part
            .get_pages()
            .keys()
            .copied()
            .filter(|n| !range.contains(*n as usize - 1))
            .collect();
        part.delete_pages(&unwanted);
        part.prune_objects();
        part.renumber_objects();
        part.compress();
        part
    }
}
