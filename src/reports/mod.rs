use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use triadforge::hive::HiveReport;
use triadforge::layouts::Layout;
use triadforge::optimizer::{Decision, OptimizationResult, Transition};

/// Slots per row: number, top, home, bottom.
const ROW_LENGTHS: [usize; 4] = [13, 13, 11, 10];

fn layout_rows(layout: &Layout) -> Vec<String> {
    let bytes = layout.as_bytes();
    let mut rows = Vec::with_capacity(ROW_LENGTHS.len());
    let mut start = 0;
    for (i, len) in ROW_LENGTHS.iter().enumerate() {
        // Indent each row by its stagger.
        let indent = " ".repeat(i);
        let keys: Vec<String> = bytes[start..start + len]
            .iter()
            .map(|&b| (b as char).to_string())
            .collect();
        rows.push(format!("{}{}", indent, keys.join(" ")));
        start += len;
    }
    rows
}

pub fn print_layout_grid(name: &str, layout: &Layout) {
    println!("\nLayout: {}", name);
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    let bytes = layout.as_bytes();
    let mut start = 0;
    for len in ROW_LENGTHS {
        let cells: Vec<Cell> = bytes[start..start + len]
            .iter()
            .map(|&b| Cell::new((b as char).to_string()).set_alignment(CellAlignment::Center))
            .collect();
        table.add_row(cells);
        start += len;
    }
    println!("{}", table);
}

pub fn print_search_result(result: &OptimizationResult) {
    println!("\n=== 🏆 FINAL RESULT ===");
    println!("Score: {:.6}", result.score);
    println!("Layout: {}", result.layout);
    println!(
        "Start score: {:.6} | Rounds: {} (best: #{}) | {:.2}s | {:.0} layouts/s",
        result.initial_score,
        result.rounds,
        result.best_round + 1,
        result.elapsed_secs,
        result.layouts_per_sec
    );

    if result.rounds > 1 {
        let mut table = Table::new();
        table.load_preset(ASCII_FULL);
        table.set_header(vec![
            Cell::new("Round").add_attribute(Attribute::Bold),
            Cell::new("Best Effort").add_attribute(Attribute::Bold),
        ]);
        for (i, score) in result.round_scores.iter().enumerate() {
            let mut cell = Cell::new(format!("{:.6}", score));
            if i == result.best_round {
                cell = cell.fg(Color::Green);
            }
            table.add_row(vec![Cell::new(i + 1), cell]);
        }
        if let Some(col) = table.column_mut(1) {
            col.set_cell_alignment(CellAlignment::Right);
        }
        println!("{}", table);
    }
}

/// `results` are (name, effort) pairs; printed lowest effort first, with the
/// difference against `baseline` when one is given.
pub fn print_comparison(results: &[(String, f64)], baseline: Option<(&str, f64)>) {
    let mut sorted: Vec<&(String, f64)> = results.iter().collect();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let vs_header = match baseline {
        Some((name, _)) => format!("vs {}", name),
        None => "vs best".to_string(),
    };
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Layout").add_attribute(Attribute::Bold),
        Cell::new("Effort").fg(Color::Cyan),
        Cell::new(vs_header),
    ]);

    let reference = baseline
        .map(|(_, s)| s)
        .or_else(|| sorted.first().map(|r| r.1));

    for (rank, (name, score)) in sorted.iter().enumerate() {
        let diff = match reference {
            Some(r) if r != 0.0 => format!("{:+.2}%", (score - r) / r * 100.0),
            _ => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(format!("{:.6}", score)).fg(Color::Cyan),
            Cell::new(diff),
        ]);
    }

    for i in 2..=3 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
    println!("{}", table);
}

fn show(bytes: &[u8]) -> String {
    // Spaces are invisible in a table cell.
    bytes
        .iter()
        .map(|&b| if b == b' ' { '␣' } else { b as char })
        .collect()
}

pub fn print_triads(entries: &[([u8; 3], u64)], total: u64, limit: usize) {
    println!(
        "\n📊 Triads: {} shown of {} occurrences",
        entries.len().min(limit),
        total
    );
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec![
        Cell::new("Triad").add_attribute(Attribute::Bold),
        Cell::new("Count").add_attribute(Attribute::Bold),
        Cell::new("Share").add_attribute(Attribute::Bold),
    ]);
    for (triad, count) in entries.iter().take(limit) {
        table.add_row(vec![
            Cell::new(show(triad)),
            Cell::new(count),
            Cell::new(format!("{:.3}%", share(*count, total))),
        ]);
    }
    for i in 1..=2 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
    println!("{}", table);
}

pub fn print_digraphs(entries: &[([u8; 2], u64)], limit: usize) {
    let total: u64 = entries.iter().map(|(_, c)| c).sum();
    println!("\n📊 Digraphs: {} distinct", entries.len());
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec![
        Cell::new("Digraph").add_attribute(Attribute::Bold),
        Cell::new("Count").add_attribute(Attribute::Bold),
        Cell::new("Share").add_attribute(Attribute::Bold),
    ]);
    for (digraph, count) in entries.iter().take(limit) {
        table.add_row(vec![
            Cell::new(show(digraph)),
            Cell::new(count),
            Cell::new(format!("{:.3}%", share(*count, total))),
        ]);
    }
    println!("{}", table);
}

fn share(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

pub fn print_transition(t: &Transition<'_>) {
    let verdict = match t.decision {
        Decision::Improved => "better",
        Decision::Accepted => "worse",
        Decision::Rejected => "rejected",
    };
    println!(
        "\n[{}] {:.6} -> {:.6} (delta {:+.6}, p {:.4}, t {:.6}) {}",
        t.iteration, t.previous_score, t.score, t.delta, t.probability, t.temperature, verdict
    );

    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec![Cell::new("Before"), Cell::new("After")]);
    for (before, after) in layout_rows(t.previous).into_iter().zip(layout_rows(t.layout)) {
        table.add_row(vec![Cell::new(before), Cell::new(after)]);
    }
    println!("{}", table);
}

pub fn print_hive_report(report: &HiveReport) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec![
        Cell::new("Workers"),
        Cell::new("Completed").fg(Color::Green),
        Cell::new("Lost").fg(Color::Red),
        Cell::new("Improvements"),
    ]);
    table.add_row(vec![
        Cell::new(report.workers),
        Cell::new(report.completed),
        Cell::new(report.lost),
        Cell::new(report.improvements),
    ]);
    println!("{}", table);

    match &report.best {
        Some(best) => {
            println!("\n=== 🏆 FINAL RESULT ===");
            println!("Score: {:.6}", best.score);
            println!("Layout: {}", best.layout);
            print_layout_grid("BEST", &best.layout);
        }
        None => println!("\n⚠️  No job completed; no result to report."),
    }
}
