//! Plain-text rendering of results and charts.

use std::fmt::{self, Write};

use fever_dose_core::{
    group_by_formulation, DosageOutcome, DosageResult, Market, Product, WeightChart,
};

/// Shown instead of engine error details.
const UNABLE_TO_CALCULATE: &str = "Unable to calculate a dose for this product.";

/// Render per-product result cards, grouped by formulation.
pub fn render_results(results: &[DosageResult], market: Market) -> String {
    let mut out = String::new();
    // String writes are infallible
    write_results(&mut out, results, market).ok();
    out
}

/// Render a weight chart as an aligned text table.
pub fn render_chart(chart: &WeightChart, products: &[Product], market: Market) -> String {
    let mut out = String::new();
    write_chart(&mut out, chart, products, market).ok();
    out
}

fn write_results(out: &mut impl Write, results: &[DosageResult], market: Market) -> fmt::Result {
    for group in group_by_formulation(results) {
        write_result(out, group.primary(), market)?;

        let alternatives: Vec<&str> = group
            .alternatives()
            .iter()
            .map(|r| r.product.display_name(market))
            .collect();
        if !alternatives.is_empty() {
            writeln!(out, "  same formulation: {}", alternatives.join(", "))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_result(out: &mut impl Write, result: &DosageResult, market: Market) -> fmt::Result {
    let product = &result.product;
    writeln!(
        out,
        "{} ({} {} mg/mL)",
        product.display_name(market),
        product.display_ingredient(market),
        product.strength_mg_per_ml
    )?;

    match &result.outcome {
        DosageOutcome::Success { volumes, message } => {
            writeln!(
                out,
                "  {:.1} ~ {:.1} mL every {} h, at most {} doses per day",
                volumes.min_ml, volumes.max_ml, product.interval_hours, product.max_doses_per_day
            )?;
            writeln!(
                out,
                "  single-dose max {:.1} mL, daily max {:.1} mL",
                volumes.max_single_ml, volumes.max_daily_ml
            )?;
            if let Some(message) = message {
                writeln!(out, "  note: {}", message)?;
            }
        }
        DosageOutcome::AgeBlock { message } => writeln!(out, "  not recommended: {}", message)?,
        DosageOutcome::Error { .. } => writeln!(out, "  {}", UNABLE_TO_CALCULATE)?,
    }
    Ok(())
}

fn write_chart(
    out: &mut impl Write,
    chart: &WeightChart,
    products: &[Product],
    market: Market,
) -> fmt::Result {
    let mut header = vec!["Weight".to_string()];
    header.extend(products.iter().map(|p| p.display_name(market).to_string()));

    let mut rows = vec![header];
    for row in &chart.rows {
        let mut line = vec![format!("{} kg", row.weight_kg)];
        for cell in &row.cells {
            line.push(match (cell.min_ml, cell.max_ml) {
                (Some(min), Some(max)) if cell.at_single_max => {
                    format!("{:.1} ~ {:.1} mL *", min, max)
                }
                (Some(min), Some(max)) => format!("{:.1} ~ {:.1} mL", min, max),
                _ => "-".to_string(),
            });
        }
        rows.push(line);
    }

    let columns = rows[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .map(|r| r.get(c).map_or(0, |s| s.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let pad = width.saturating_sub(cell.chars().count());
                format!("{}{}", cell, " ".repeat(pad))
            })
            .collect();
        writeln!(out, "{}", cells.join("  ").trim_end())?;
    }
    writeln!(
        out,
        "\nAge assumed: {} months. * single-dose maximum. Check each product's minimum age.",
        chart.age_months
    )
}
