//! Subcommand implementations: read files, call the library, write results

use crate::cli::{Commands, InOut, TextStyleArgs};
use crate::config::Config;
use anyhow::{bail, Context};
use pdfedit_core::selection::{self, PageIndexSet};
use pdfedit_core::{
    Color, EmbeddedImage, ImagePlacement, OverlayPlan, PageSize, SignatureOptions, StandardFont,
    TextEdit, TextPlacement,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn read_pdf(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_pdf(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn load_image(path: &Path) -> anyhow::Result<EmbeddedImage> {
    EmbeddedImage::from_path(path)
        .with_context(|| format!("Failed to load image {}", path.display()))
}

/// Parse a page range against the document, `None` meaning every page
fn page_selection(bytes: &[u8], expression: Option<&str>) -> anyhow::Result<PageIndexSet> {
    let page_count = pdfedit_core::get_page_count(bytes)? as usize;
    match expression {
        Some(expr) => selection::parse(expr, page_count)
            .with_context(|| format!("Invalid page range '{}'", expr)),
        None => Ok(PageIndexSet::all(page_count)),
    }
}

struct ResolvedStyle {
    font: StandardFont,
    size: f64,
    color: Color,
}

fn resolve_style(style: &TextStyleArgs, config: &Config) -> anyhow::Result<ResolvedStyle> {
    let font_name = style.font.as_deref().unwrap_or(&config.text.font);
    let color_name = style.color.as_deref().unwrap_or(&config.text.color);
    Ok(ResolvedStyle {
        font: StandardFont::resolve(font_name, style.bold, style.italic),
        size: style.size.unwrap_or(config.text.size),
        color: Color::parse(color_name)?,
    })
}

/// Stringify JSON field values; strings are taken verbatim
fn form_values(json: &str) -> anyhow::Result<BTreeMap<String, String>> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("Form data is not valid JSON")?;
    let serde_json::Value::Object(map) = value else {
        bail!("Form data must be a JSON object of field name to value");
    };

    Ok(map
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (name, value)
        })
        .collect())
}

/// `--data` is inline JSON when it parses as JSON, otherwise a file path
fn form_data(arg: &str) -> anyhow::Result<BTreeMap<String, String>> {
    if serde_json::from_str::<serde_json::Value>(arg).is_ok() {
        return form_values(arg);
    }

    let path = Path::new(arg);
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    form_values(&json).with_context(|| format!("Invalid form data in {}", path.display()))
}

/// Read input, transform, write output
fn transform(
    io: &InOut,
    op: impl FnOnce(&[u8]) -> anyhow::Result<Vec<u8>>,
) -> anyhow::Result<()> {
    let input = read_pdf(&io.input)?;
    let output = op(&input)?;
    write_pdf(&io.output, &output)?;
    tracing::info!("Wrote {} ({} bytes)", io.output.display(), output.len());
    Ok(())
}

pub fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::WriteText {
            io,
            page,
            x,
            y,
            text,
            style,
        } => {
            let style = resolve_style(&style, config)?;
            let placement = TextPlacement {
                font: style.font,
                size: style.size,
                color: style.color,
                ..TextPlacement::new(page, text, x, y)
            };
            transform(&io, |pdf| Ok(pdfedit_core::write_text(pdf, &placement)?))
        }

        Commands::EditText {
            io,
            page,
            old,
            new,
            style,
        } => {
            let resolved = resolve_style(&style, config)?;
            let edit = TextEdit {
                font: Some(resolved.font),
                // Keep the replaced text's size unless asked otherwise
                size: style.size,
                color: Some(resolved.color),
                ..TextEdit::new(page, old, new)
            };
            transform(&io, |pdf| {
                let outcome = pdfedit_core::edit_text(pdf, &edit)?;
                if !outcome.replaced {
                    tracing::warn!(
                        "'{}' not found on page {}; output is unchanged",
                        edit.old_text,
                        page
                    );
                }
                Ok(outcome.bytes)
            })
        }

        Commands::AddImage {
            io,
            image,
            page,
            x,
            y,
            width,
            height,
        } => {
            let image = load_image(&image)?;
            let width = match (width, height) {
                (None, None) => Some(config.image.default_width),
                (width, _) => width,
            };
            let placement = ImagePlacement {
                page,
                x,
                y,
                width,
                height,
            };
            transform(&io, |pdf| Ok(pdfedit_core::add_image(pdf, &image, &placement)?))
        }

        Commands::Sign {
            io,
            image,
            page,
            width,
        } => {
            let image = load_image(&image)?;
            let options = SignatureOptions {
                page,
                width: width.unwrap_or(config.signature.width),
                margin_x: config.signature.margin_x,
                margin_y: config.signature.margin_y,
            };
            transform(&io, |pdf| Ok(pdfedit_core::sign(pdf, &image, &options)?))
        }

        Commands::Merge { inputs, output } => {
            let documents = inputs
                .iter()
                .map(|path| read_pdf(path))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let merged = pdfedit_core::merge_documents(documents)?;
            write_pdf(&output, &merged)?;
            tracing::info!("Merged {} files into {}", inputs.len(), output.display());
            Ok(())
        }

        Commands::Split {
            input,
            ranges,
            output_dir,
        } => {
            let pdf = read_pdf(&input)?;
            let selection = page_selection(&pdf, ranges.as_deref())?;
            let pages = pdfedit_core::split_pages(&pdf, &selection)?;

            fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;
            for page in &pages {
                write_pdf(&output_dir.join(page.file_name()), &page.bytes)?;
            }
            tracing::info!("Wrote {} page(s) to {}", pages.len(), output_dir.display());
            Ok(())
        }

        Commands::Extract { io, pages } => transform(&io, |pdf| {
            let selection = page_selection(pdf, Some(pages.as_str()))?;
            Ok(pdfedit_core::extract_pages(pdf, &selection)?)
        }),

        Commands::Rotate { io, degrees, pages } => transform(&io, |pdf| {
            let selection = page_selection(pdf, pages.as_deref())?;
            Ok(pdfedit_core::rotate_pages(pdf, degrees, Some(&selection))?)
        }),

        Commands::ExtractText { input, pages } => {
            let pdf = read_pdf(&input)?;
            let selection = page_selection(&pdf, pages.as_deref())?;
            let text = pdfedit_core::extract_text(&pdf, Some(&selection))?;
            println!("{}", text);
            Ok(())
        }

        Commands::Fields { input, json } => {
            let fields = pdfedit_core::list_fields(&read_pdf(&input)?)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&fields)?);
            } else {
                for field in &fields {
                    println!(
                        "{}\t{:?}\t{}",
                        field.name,
                        field.kind,
                        field.value.as_deref().unwrap_or("")
                    );
                }
            }
            Ok(())
        }

        Commands::FillForm { io, data, flatten } => {
            let values = form_data(&data)?;
            transform(&io, |pdf| Ok(pdfedit_core::fill_form(pdf, &values, flatten)?))
        }

        Commands::Flatten { io } => transform(&io, |pdf| Ok(pdfedit_core::flatten_form(pdf)?)),

        Commands::DeletePages { io, pages } => {
            transform(&io, |pdf| Ok(pdfedit_core::delete_pages(pdf, &pages)?))
        }

        Commands::ReorderPages { io, order } => {
            transform(&io, |pdf| Ok(pdfedit_core::reorder_pages(pdf, &order)?))
        }

        Commands::InsertBlankPage {
            io,
            at,
            width,
            height,
        } => {
            let size = PageSize {
                width: width.unwrap_or(config.blank_page.width),
                height: height.unwrap_or(config.blank_page.height),
            };
            transform(&io, |pdf| Ok(pdfedit_core::insert_blank_page(pdf, at, size)?))
        }

        Commands::Apply {
            io,
            plan: plan_path,
        } => {
            let json = fs::read_to_string(&plan_path)
                .with_context(|| format!("Failed to read {}", plan_path.display()))?;
            let plan = OverlayPlan::from_json(&json)
                .with_context(|| format!("Invalid overlay plan in {}", plan_path.display()))?;
            tracing::debug!("Applying {} operation(s)", plan.len());
            transform(&io, |pdf| Ok(pdfedit_core::apply_plan(pdf, &plan)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_form_values_stringify() {
        let values = form_values(r#"{"name": "Ada", "age": 36, "agree": true, "note": null}"#)
            .unwrap();
        assert_eq!(values["name"], "Ada");
        assert_eq!(values["age"], "36");
        assert_eq!(values["agree"], "true");
        assert_eq!(values["note"], "");
    }

    #[test]
    fn test_form_values_rejects_non_object() {
        assert!(form_values("[1, 2]").is_err());
        assert!(form_values("{").is_err());
    }

    #[test]
    fn test_form_data_inline_or_file() {
        let inline = form_data(r#"{"name": "Ada"}"#).unwrap();
        assert_eq!(inline["name"], "Ada");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"{"name": "Grace"}"#).unwrap();
        let from_file = form_data(path.to_str().unwrap()).unwrap();
        assert_eq!(from_file["name"], "Grace");

        let err = form_data("/nonexistent/data.json").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/data.json"));
    }

    #[test]
    fn test_resolve_style_prefers_flags() {
        let config = Config::default();
        let args = TextStyleArgs {
            font: Some("Courier".into()),
            size: None,
            color: Some("#ff0000".into()),
            bold: true,
            italic: false,
        };
        let style = resolve_style(&args, &config).unwrap();
        assert_eq!(style.font, StandardFont::CourierBold);
        assert_eq!(style.size, 12.0);
        assert_eq!(style.color, Color::rgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_resolve_style_bad_color() {
        let args = TextStyleArgs {
            font: None,
            size: None,
            color: Some("not-a-color".into()),
            bold: false,
            italic: false,
        };
        assert!(resolve_style(&args, &Config::default()).is_err());
    }
}
