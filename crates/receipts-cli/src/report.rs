//! Markdown rendering of the three dashboard tabs.

use std::fmt::{self, Write};

use receipts_core::{analytics, Dataset};

pub(crate) fn render_report(dataset: &Dataset, top: usize) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let summary = analytics::summarize(dataset);

    writeln!(out, "# Receipt Data Analysis\n")?;
    write!(out, "Loaded {} records", summary.records)?;
    if let (Some(first), Some(last)) = (summary.first_purchase, summary.last_purchase) {
        write!(
            out,
            " ({} to {})",
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M")
        )?;
    }
    writeln!(out, "\n")?;
    writeln!(
        out,
        "Total revenue: ${:.2}, total discount: ${:.2}\n",
        summary.total_revenue, summary.total_discount
    )?;

    render_brands(&mut out, dataset, top)?;
    render_habits(&mut out, dataset, top)?;
    render_pricing(&mut out, dataset, top)?;
    Ok(out)
}

fn render_brands(out: &mut String, dataset: &Dataset, top: usize) -> fmt::Result {
    let tab = analytics::brand_performance(dataset, top);
    writeln!(out, "## Brand Performance\n")?;

    writeln!(out, "### Top {top} Brands by Purchase Frequency\n")?;
    writeln!(out, "| Brand | Purchases |\n|---|---|")?;
    for entry in &tab.purchase_counts {
        writeln!(out, "| {} | {} |", entry.label, entry.count)?;
    }

    writeln!(out, "\n### Top {top} Brands by Total Revenue\n")?;
    writeln!(out, "| Brand | Revenue ($) |\n|---|---|")?;
    for entry in &tab.revenue {
        writeln!(out, "| {} | {:.2} |", entry.label, entry.value)?;
    }

    writeln!(out, "\n### Brand Preference by Channel\n")?;
    write!(out, "| Brand |")?;
    for channel in &tab.channel_mix.channels {
        write!(out, " {channel} |")?;
    }
    write!(out, "\n|---|")?;
    for _ in &tab.channel_mix.channels {
        write!(out, "---|")?;
    }
    writeln!(out)?;
    for row in &tab.channel_mix.rows {
        write!(out, "| {} |", row.brand)?;
        for count in row.counts.values() {
            write!(out, " {count} |")?;
        }
        writeln!(out)?;
    }
    writeln!(out)
}

fn render_habits(out: &mut String, dataset: &Dataset, top: usize) -> fmt::Result {
    let tab = analytics::shopping_habits(dataset, top);
    writeln!(out, "## Shopping Habits\n")?;

    writeln!(out, "### Top {top} Purchase Locations\n")?;
    writeln!(out, "| Location | Purchases | Share |\n|---|---|---|")?;
    for entry in &tab.locations {
        writeln!(out, "| {} | {} | {:.1}% |", entry.label, entry.count, entry.percent)?;
    }

    writeln!(out, "\n### Purchase Activity by Hour of Day\n")?;
    writeln!(out, "| Hour | Purchases |\n|---|---|")?;
    for bucket in &tab.hourly_activity {
        writeln!(out, "| {:02}:00 | {} |", bucket.hour, bucket.count)?;
    }

    writeln!(out, "\n### Purchase Channel Distribution\n")?;
    writeln!(out, "| Channel | Purchases | Share |\n|---|---|---|")?;
    for entry in &tab.channels {
        writeln!(out, "| {} | {} | {:.1}% |", entry.label, entry.count, entry.percent)?;
    }
    writeln!(out)
}

fn render_pricing(out: &mut String, dataset: &Dataset, top: usize) -> fmt::Result {
    let tab = analytics::pricing_discounts(dataset, top);
    writeln!(out, "## Pricing & Discounts\n")?;

    writeln!(out, "### Price Distribution\n")?;
    writeln!(out, "| Price ($) | Count |\n|---|---|")?;
    for bin in tab.price_histogram.iter().filter(|b| b.count > 0) {
        writeln!(out, "| {:.2} – {:.2} | {} |", bin.lower, bin.upper, bin.count)?;
    }

    let undefined = dataset.len() - tab.discount_scatter.len();
    writeln!(
        out,
        "\n{} rows plotted as discount % vs price; {undefined} without a defined discount %.\n",
        tab.discount_scatter.len()
    )?;

    writeln!(out, "### Top {top} Brands by Average Discount %\n")?;
    writeln!(out, "| Brand | Average Discount (%) |\n|---|---|")?;
    for entry in &tab.brand_average_discount {
        writeln!(out, "| {} | {:.2} |", entry.label, entry.value)?;
    }
    Ok(())
}
