use std::error::Error;

use tabled::{
    settings::{Panel, Style},
    Table, Tabled,
};

use crate::mapping::{
    consensus::infer_from_labeled_pairs,
    validator::{validate_layout, LabelResult},
};

use super::Context;

#[derive(Tabled)]
struct LabelRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Byte")]
    byte_index: String,
    #[tabled(rename = "Mask")]
    mask: String,
    #[tabled(rename = "Xor")]
    xor: String,
    #[tabled(rename = "Collisions")]
    collisions: String,
}

impl From<&LabelResult> for LabelRow {
    fn from(result: &LabelResult) -> Self {
        let hex = |value: Option<u8>| value.map(|v| format!("{v:#04x}")).unwrap_or_default();
        Self {
            label: result.label.clone(),
            result: match result.reason.as_deref() {
                None => "ok".to_string(),
                Some(reason) => format!("FAIL ({reason})"),
            },
            byte_index: result
                .byte_index
                .map(|idx| idx.to_string())
                .unwrap_or_default(),
            mask: hex(result.mask),
            xor: hex(result.xor),
            collisions: result.collisions.join(", "),
        }
    }
}

/// Infer buttons from every stored sample and print the resulting layout.
/// Axes and dpad are taken from the layout in use.
pub fn handle_infer(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let samples = ctx.store.load_samples()?;
    if samples.is_empty() {
        return Err(format!(
            "No samples found in {}",
            ctx.store.samples_path().display()
        )
        .into());
    }

    let inference = infer_from_labeled_pairs(&samples);
    let mut layout = ctx.store.load_layout_or_default();
    layout.buttons = inference.buttons;
    println!("{}", serde_json::to_string_pretty(&layout)?);
    if !inference.unresolved.is_empty() {
        eprintln!("Unresolved: {}", inference.unresolved.join(", "));
    }

    Ok(())
}

pub fn handle_validate(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let layout = ctx.store.load_layout_or_default();
    let samples = ctx.store.load_samples()?;
    let result = validate_layout(&layout, &samples);

    let rows: Vec<LabelRow> = result.per_label.iter().map(LabelRow::from).collect();
    let mut table = Table::new(rows);
    table
        .with(Style::modern_rounded())
        .with(Panel::header("Layout Validation"));
    println!("{table}");
    println!(
        "{} sample(s), {} failure(s), {} collision(s)",
        result.per_label.len(),
        result.failures().count(),
        result.collision_count()
    );

    if !result.ok {
        return Err("Layout failed validation".into());
    }

    Ok(())
}
