//! Single-page extraction
//!
//! Each output document is built by cloning the loaded source, deleting
//! every other page and pruning what no longer has a referrer.

use crate::error::SplitError;
use lopdf::Document;

/// Parse PDF bytes into a document
pub fn load_document(bytes: &[u8]) -> Result<Document, SplitError> {
    Document::load_mem(bytes).map_err(|e| SplitError::ParseError(e.to_string()))
}

/// Number of pages in a loaded document
pub fn page_count(doc: &Document) -> usize {
    doc.get_pages().len()
}

/// Build a standalone PDF holding only `page` (1-indexed) of `doc`
///
/// The source document is left untouched so it can be reused for every
/// page of a split.
pub fn extract_page(doc: &Document, page: u32) -> Result<Vec<u8>, SplitError> {
    if page == 0 {
        return Err(SplitError::OperationError(
            "Page numbers must be >= 1".into(),
        ));
    }

    let total = page_count(doc) as u32;
    if page > total {
        return Err(SplitError::OperationError(format!(
            "Page {} does not exist (document has {} pages)",
            page, total
        )));
    }

    let mut single = doc.clone();

    // Delete in reverse order to keep the remaining page numbers stable
    let pages_to_delete: Vec<u32> = (1..=total).rev().filter(|&p| p != page).collect();
    for page_num in pages_to_delete {
        single.delete_pages(&[page_num]);
    }

    single.prune_objects();
    single.compress();

    let mut buffer = Vec::new();
    single
        .save_to(&mut buffer)
        .map_err(|e| SplitError::OperationError(format!("Save failed: {}", e)))?;

    Ok(buffer)
}

#[cfg(test)]
pub(crate) mod test_pdf {
    use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};

    /// Create a simple PDF with N pages, page i showing "Page i"
    pub(crate) fn create_test_pdf(num_pages: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();

        for i in 0..num_pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new(
                        "Tf",
                        vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                    ),
                    Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            format!("Page {}", i + 1).into_bytes(),
                            lopdf::StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(612),
                        Object::Integer(792),
                    ]),
                ),
                ("Contents", Object::Reference(content_id)),
            ]);
            page_ids.push(doc.add_object(page));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(num_pages as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    /// Text drawn on the only page of a single-page PDF
    pub(crate) fn page_label(bytes: &[u8]) -> String {
        let doc = Document::load_mem(bytes).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let content = doc.get_and_decode_page_content(page_id).unwrap();
        content
            .operations
            .iter()
            .find(|op| op.operator == "Tj")
            .and_then(|op| op.operands.first())
            .and_then(|o| o.as_str().ok())
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .unwrap()
    }
}
