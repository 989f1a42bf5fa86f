//! Shared fixtures for the CLI integration tests

#![allow(dead_code)]

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use std::path::{Path, PathBuf};

pub fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("pdfedit").unwrap();
    // Keep a developer's RUST_LOG from changing what the tests see
    cmd.env_remove("RUST_LOG");
    cmd
}

fn text_stream(text: &str) -> Vec<u8> {
    Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 12.into()]),
            Operation::new("Td", vec![100.into(), 700.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(text.as_bytes().to_vec(), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ],
    }
    .encode()
    .unwrap()
}

/// Letter-size PDF with one page per entry showing that text
pub fn pdf_with_texts(texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for text in texts {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), text_stream(text)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// One-page PDF with a text field "name" and no appearance streams
pub fn form_pdf() -> Vec<u8> {
    let mut doc = Document::load_mem(&pdf_with_texts(&["Form"])).unwrap();
    let page_id = *doc.get_pages().get(&1).unwrap();

    let field_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal("name"),
        "Rect" => vec![100.into(), 600.into(), 300.into(), 620.into()],
        "P" => Object::Reference(page_id),
    });
    doc.get_dictionary_mut(page_id)
        .unwrap()
        .set("Annots", vec![Object::Reference(field_id)]);

    let acroform_id = doc.add_object(dictionary! {
        "Fields" => vec![Object::Reference(field_id)],
    });
    let catalog_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    doc.get_dictionary_mut(catalog_id)
        .unwrap()
        .set("AcroForm", Object::Reference(acroform_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn load(path: &Path) -> Document {
    Document::load(path).unwrap()
}

pub fn page_count(path: &Path) -> usize {
    load(path).get_pages().len()
}

pub fn page_text(path: &Path, page: u32) -> String {
    load(path).extract_text(&[page]).unwrap().trim().to_string()
}
