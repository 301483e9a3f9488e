//! Shared helpers for building small `lopdf` documents in unit tests

use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Description of one page in a generated document
#[derive(Debug, Clone)]
pub(crate) struct PageSpec {
    pub media_box: [i64; 4],
    pub rotate: Option<i64>,
    pub content: Option<Vec<u8>>,
}

impl PageSpec {
    /// Letter page showing `label` as text
    pub fn labeled(label: &str) -> Self {
        Self {
            media_box: [0, 0, 612, 792],
            rotate: None,
            content: Some(format!("BT /F1 12 Tf 72 720 Td ({label}) Tj ET").into_bytes()),
        }
    }

    /// Letter page without a `/Contents` entry
    pub fn without_contents() -> Self {
        Self {
            media_box: [0, 0, 612, 792],
            rotate: None,
            content: None,
        }
    }

    pub fn with_media_box(mut self, media_box: [i64; 4]) -> Self {
        self.media_box = media_box;
        self
    }

    pub fn with_rotate(mut self, degrees: i64) -> Self {
        self.rotate = Some(degrees);
        self
    }
}

/// Build a document with the given pages under a single `/Pages` node
pub(crate) fn build_document(pages: &[PageSpec]) -> Document {
    build_document_with_parent_rotate(pages, None)
}

/// Same as [`build_document`] with an inheritable `/Rotate` on the `/Pages` node
pub(crate) fn build_document_with_parent_rotate(
    pages: &[PageSpec],
    parent_rotate: Option<i64>,
) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for spec in pages {
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => spec.media_box.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        };
        if let Some(content) = &spec.content {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.clone()));
            page.set("Contents", Object::Reference(content_id));
        }
        if let Some(rotate) = spec.rotate {
            page.set("Rotate", Object::Integer(rotate));
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages_dict = dictionary! {
        "Type" => "Pages",
        "Count" => Object::Integer(kids.len() as i64),
        "Kids" => kids,
    };
    if let Some(rotate) = parent_rotate {
        pages_dict.set("Rotate", Object::Integer(rotate));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc
}

/// Document of `count` labeled pages: "Page 1", "Page 2", ...
pub(crate) fn labeled_document(count: usize) -> Document {
    let pages: Vec<PageSpec> = (1..=count)
        .map(|i| PageSpec::labeled(&format!("Page {i}")))
        .collect();
    build_document(&pages)
}

/// Text labels of every page, in page order
pub(crate) fn page_labels(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .values()
        .map(|page_id| label_of(doc, *page_id))
        .collect()
}

fn label_of(doc: &Document, page_id: ObjectId) -> String {
    let content = doc.get_page_content(page_id).unwrap_or_default();
    let text = String::from_utf8_lossy(&content);
    match (text.find('('), text.find(')')) {
        (Some(start), Some(end)) if start < end => text[start + 1..end].to_string(),
        _ => String::new(),
    }
}

/// Save to memory and parse again, as a reader of the output file would
pub(crate) fn reload(doc: &mut Document) -> Document {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    Document::load_mem(&buffer).unwrap()
}
