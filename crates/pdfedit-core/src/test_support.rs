//! In-memory PDF fixtures for unit tests

use lopdf::{content::Content, content::Operation, dictionary, Dictionary, Document, Object, Stream};

fn text_content(text: &str, x: i64, y: i64, size: i64) -> Vec<u8> {
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(size)]),
            Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    text.as_bytes().to_vec(),
                    lopdf::StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    content.encode().unwrap()
}

fn finish(mut doc: Document, pages_id: lopdf::ObjectId, page_ids: Vec<lopdf::ObjectId>) -> Vec<u8> {
    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// PDF with one Letter page per entry, each showing its text at (100, 700)
pub fn create_pdf_with_texts(texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut page_ids = Vec::new();
    for text in texts {
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            text_content(text, 100, 700, 12),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        page_ids.push(page_id);
    }

    finish(doc, pages_id, page_ids)
}

/// PDF with `num_pages` pages reading "Page 1", "Page 2", ...
pub fn create_test_pdf(num_pages: u32) -> Vec<u8> {
    let texts: Vec<String> = (1..=num_pages).map(|i| format!("Page {}", i)).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    create_pdf_with_texts(&refs)
}

/// Two A4 pages under an intermediate Pages node that carries the MediaBox
pub fn create_nested_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let root_id = doc.new_object_id();
    let middle_id = doc.new_object_id();

    let mut kids = Vec::new();
    for i in 0..2 {
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            text_content(&format!("Nested {}", i + 1), 72, 720, 12),
        ));
        kids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(middle_id),
            "Contents" => Object::Reference(content_id),
        }));
    }

    doc.objects.insert(
        middle_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Parent" => Object::Reference(root_id),
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => Dictionary::new(),
            "Kids" => kids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
        }),
    );

    doc.objects.insert(
        root_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 2,
            "Kids" => vec![Object::Reference(middle_id)],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(root_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Single Letter page with an AcroForm: a text field "name" and a checkbox
/// "agree", both with normal appearance streams.
pub fn create_form_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    let text_ap = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 200.into(), 20.into()],
        },
        b"0 0 1 rg 0 0 200 20 re f".to_vec(),
    ));
    let name_field = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal("name"),
        "Rect" => vec![100.into(), 600.into(), 300.into(), 620.into()],
        "P" => Object::Reference(page_id),
        "AP" => dictionary! { "N" => Object::Reference(text_ap) },
    });

    let on_ap = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 12.into(), 12.into()],
        },
        b"0 g 0 0 12 12 re f".to_vec(),
    ));
    let off_ap = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 12.into(), 12.into()],
        },
        Vec::new(),
    ));
    let agree_field = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Btn",
        "T" => Object::string_literal("agree"),
        "V" => "Off",
        "AS" => "Off",
        "Rect" => vec![100.into(), 550.into(), 112.into(), 562.into()],
        "P" => Object::Reference(page_id),
        "AP" => dictionary! {
            "N" => dictionary! {
                "Yes" => Object::Reference(on_ap),
                "Off" => Object::Reference(off_ap),
            },
        },
    });

    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        text_content("Form page", 100, 700, 12),
    ));
    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => Dictionary::new(),
            "Annots" => vec![Object::Reference(name_field), Object::Reference(agree_field)],
        }),
    );

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => 1,
        "Kids" => vec![Object::Reference(page_id)],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let acroform = doc.add_object(dictionary! {
        "Fields" => vec![Object::Reference(name_field), Object::Reference(agree_field)],
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
        "AcroForm" => Object::Reference(acroform),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Half-transparent RGBA PNG
pub fn create_png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        let data: Vec<u8> = (0..width * height)
            .flat_map(|i| [255u8, (i * 40) as u8, 0, 128])
            .collect();
        writer.write_image_data(&data).unwrap();
    }
    out
}
