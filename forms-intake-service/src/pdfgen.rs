//! Renders the filled-out form as a single- or multi-page A4 PDF.

use anyhow::Context as _;
use chrono::Local;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::models::FormKind;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_LEFT_MM: f32 = 18.0;
const TITLE_Y_MM: f32 = 279.0;
const BODY_TOP_MM: f32 = 262.0;
const LINE_STEP_MM: f32 = 9.0;
// Below this the footer would collide; start a new page instead.
const BODY_BOTTOM_MM: f32 = 35.0;
const FOOTER_Y_MM: f32 = 14.0;

/// Write `<slug>_filled.pdf` into `output_dir`, one "label: value" line per
/// answer in schema order. Returns the path of the generated file.
pub fn generate_filled_pdf(
    kind: FormKind,
    answers: &[(String, String)],
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir {}", output_dir.display()))?;

    let title = format!("RBI Compliance Form - {}", kind.label());
    let (doc, page, layer) =
        PdfDocument::new(title.clone(), Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");

    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let oblique = doc.add_builtin_font(BuiltinFont::HelveticaOblique)?;

    let mut current_layer = doc.get_page(page).get_layer(layer);
    current_layer.use_text(title, 16.0, Mm(MARGIN_LEFT_MM), Mm(TITLE_Y_MM), &bold);

    let mut y = BODY_TOP_MM;
    for (field, value) in answers {
        current_layer.use_text(
            format!("{}: {}", field, value),
            12.0,
            Mm(MARGIN_LEFT_MM),
            Mm(y),
            &regular,
        );
        y -= LINE_STEP_MM;
        if y < BODY_BOTTOM_MM {
            let (next_page, next_layer) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            current_layer = doc.get_page(next_page).get_layer(next_layer);
            y = BODY_TOP_MM;
        }
    }

    current_layer.use_text(
        format!("Generated on {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
        10.0,
        Mm(MARGIN_LEFT_MM),
        Mm(FOOTER_Y_MM),
        &oblique,
    );

    let path = output_dir.join(format!("{}_filled.pdf", kind.slug()));
    let file = File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| anyhow::anyhow!("failed to write PDF: {}", e))?;

    Ok(path)
}
