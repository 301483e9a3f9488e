//! Content stream queries on `lopdf` pages

use crate::error::{PdfError, Result};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId, Stream};
use serde::Serialize;

/// Whether a page carries any drawing instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentState {
    /// No content stream, or only streams without a single operator
    Empty,
    /// At least one content operator is present
    HasContent,
}

impl ContentState {
    pub fn is_empty(&self) -> bool {
        matches!(self, ContentState::Empty)
    }
}

/// Determine whether a page has any content operators
///
/// A missing `/Contents` entry, an empty `/Contents` array, or streams that
/// decode to nothing but whitespace all count as empty.
///
/// # Errors
///
/// Returns an error if `/Contents` points at a missing object, at something
/// other than a stream, or if the stream cannot be decoded.
pub fn page_content_state(doc: &Document, page_id: ObjectId) -> Result<ContentState> {
    let page = doc.get_dictionary(page_id)?;

    let contents = match page.get(b"Contents") {
        Ok(contents) => contents,
        Err(_) => return Ok(ContentState::Empty),
    };

    let streams = resolve_streams(doc, contents)?;
    for stream in streams {
        let data = decoded_content(stream)?;
        let content = Content::decode(&data)?;
        if !content.operations.is_empty() {
            return Ok(ContentState::HasContent);
        }
    }

    Ok(ContentState::Empty)
}

fn resolve_streams<'a>(doc: &'a Document, contents: &'a Object) -> Result<Vec<&'a Stream>> {
    match contents {
        Object::Reference(id) => match doc.get_object(*id)? {
            Object::Stream(stream) => Ok(vec![stream]),
            Object::Array(items) => items
                .iter()
                .map(|item| resolve_single(doc, item))
                .collect(),
            _ => Err(PdfError::InvalidStructure(format!(
                "/Contents {} {} R is not a stream",
                id.0, id.1
            ))),
        },
        Object::Array(items) => items.iter().map(|item| resolve_single(doc, item)).collect(),
        Object::Stream(stream) => Ok(vec![stream]),
        Object::Null => Ok(Vec::new()),
        _ => Err(PdfError::InvalidStructure(
            "/Contents is neither a stream nor an array".into(),
        )),
    }
}

fn resolve_single<'a>(doc: &'a Document, item: &'a Object) -> Result<&'a Stream> {
    let object = match item {
        Object::Reference(id) => doc.get_object(*id)?,
        direct => direct,
    };
    object
        .as_stream()
        .map_err(|_| PdfError::InvalidStructure("/Contents array entry is not a stream".into()))
}

fn decoded_content(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.has(b"Filter") {
        Ok(stream.decompressed_content()?)
    } else {
        Ok(stream.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use lopdf::dictionary;
    use std::io::Write;

    fn page_with(doc: &mut Document, contents: Option<Object>) -> ObjectId {
        let mut page = dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        };
        if let Some(contents) = contents {
            page.set("Contents", contents);
        }
        doc.add_object(page)
    }

    fn add_stream(doc: &mut Document, bytes: &[u8]) -> ObjectId {
        doc.add_object(Stream::new(dictionary! {}, bytes.to_vec()))
    }

    #[test]
    fn test_missing_contents_is_empty() {
        let mut doc = Document::with_version("1.5");
        let page_id = page_with(&mut doc, None);
        assert_eq!(page_content_state(&doc, page_id).unwrap(), ContentState::Empty);
    }

    #[test]
    fn test_empty_array_is_empty() {
        let mut doc = Document::with_version("1.5");
        let page_id = page_with(&mut doc, Some(Object::Array(vec![])));
        assert!(page_content_state(&doc, page_id).unwrap().is_empty());
    }

    #[test]
    fn test_whitespace_only_stream_is_empty() {
        let mut doc = Document::with_version("1.5");
        let stream_id = add_stream(&mut doc, b"  \n\t\r\n");
        let page_id = page_with(&mut doc, Some(Object::Reference(stream_id)));
        assert_eq!(page_content_state(&doc, page_id).unwrap(), ContentState::Empty);
    }

    #[test]
    fn test_drawing_operators_count_as_content() {
        let mut doc = Document::with_version("1.5");
        let blank_id = add_stream(&mut doc, b"");
        let drawing_id = add_stream(&mut doc, b"0 0 m 100 100 l S");
        let page_id = page_with(
            &mut doc,
            Some(Object::Array(vec![
                Object::Reference(blank_id),
                Object::Reference(drawing_id),
            ])),
        );
        assert_eq!(
            page_content_state(&doc, page_id).unwrap(),
            ContentState::HasContent
        );
    }

    #[test]
    fn test_dangling_reference_is_an_error() {
        let mut doc = Document::with_version("1.5");
        let page_id = page_with(&mut doc, Some(Object::Reference((999, 0))));
        assert!(page_content_state(&doc, page_id).is_err());
    }

    #[test]
    fn test_non_stream_contents_is_an_error() {
        let mut doc = Document::with_version("1.5");
        let not_a_stream = doc.add_object(Object::Integer(7));
        let page_id = page_with(&mut doc, Some(Object::Reference(not_a_stream)));
        assert!(matches!(
            page_content_state(&doc, page_id),
            Err(PdfError::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_compressed_stream_is_decoded() {
        let mut doc = Document::with_version("1.5");
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"BT /F1 12 Tf (Hi) Tj ET").unwrap();
        let stream = Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            encoder.finish().unwrap(),
        );
        let stream_id = doc.add_object(stream);
        let page_id = page_with(&mut doc, Some(Object::Reference(stream_id)));
        assert_eq!(
            page_content_state(&doc, page_id).unwrap(),
            ContentState::HasContent
        );
    }
}
