//! Bulk payload encoding.
//!
//! The `_bulk` endpoint takes newline-delimited JSON: for every document an
//! action line naming the target index and document id, followed by the
//! document itself.

use bytes::Bytes;
use serde::Serialize;
use std::io::Write;

use crate::transform::CanonicalRecord;

/// Action line metadata.
#[derive(Serialize)]
struct IndexAction<'a> {
    index: ActionMeta<'a>,
}

#[derive(Serialize)]
struct ActionMeta<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_id")]
    id: &'a str,
}

/// Streaming writer that appends action/document pairs as records arrive.
///
/// The pipeline feeds records straight from the transformer, so a page is
/// only held once, as encoded bytes.
pub struct BulkWriter<'a, W: Write> {
    index: &'a str,
    out: W,
    documents: usize,
}

impl<'a, W: Write> BulkWriter<'a, W> {
    pub fn new(index: &'a str, out: W) -> Self {
        Self {
            index,
            out,
            documents: 0,
        }
    }

    /// Append one action/document pair.
    pub fn write_record(&mut self, record: &CanonicalRecord) -> std::io::Result<()> {
        let action = IndexAction {
            index: ActionMeta {
                index: self.index,
                id: record.document_id(),
            },
        };
        serde_json::to_writer(&mut self.out, &action)?;
        self.out.write_all(b"\n")?;
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.documents += 1;
        Ok(())
    }

    /// Number of documents written so far.
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Flush and return the underlying writer and document count.
    pub fn finish(mut self) -> std::io::Result<(W, usize)> {
        self.out.flush()?;
        Ok((self.out, self.documents))
    }
}

/// Encoded bulk request body for one page.
#[derive(Debug, Clone)]
pub struct BulkBatch {
    body: Bytes,
    documents: usize,
}

impl BulkBatch {
    /// Encode `records` for `index`, preserving input order.
    pub fn build<'r>(
        records: impl IntoIterator<Item = &'r CanonicalRecord>,
        index: &str,
    ) -> std::io::Result<Self> {
        let mut writer = BulkWriter::new(index, Vec::new());
        for record in records {
            writer.write_record(record)?;
        }
        let (buf, documents) = writer.finish()?;
        Ok(Self::from_parts(buf, documents))
    }

    pub(crate) fn from_parts(body: impl Into<Bytes>, documents: usize) -> Self {
        Self {
            body: body.into(),
            documents,
        }
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}
