use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use serde_json::Value;

fn clear_terminal() {
    println!("{}c", 27 as char);
}

pub fn print_snapshot_as_tables(snapshot: &Value) {
    clear_terminal();

    let banner = &snapshot["banner"];
    println!(
        "1h volume: {} -> {} ({}%)",
        text(&banner["past"]),
        text(&banner["current"]),
        number(&banner["change"]),
    );
    println!("Gainers");
    println!("{}", movers_table(rows(&snapshot["gainers"]), Color::Green));
    println!("Losers");
    println!("{}", movers_table(rows(&snapshot["losers"]), Color::Red));
}

pub fn movers_table(rows: &[Value], gain_color: Color) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Symbol"),
            Cell::new("Price"),
            Cell::new("Initial"),
            Cell::new("Gain %").fg(gain_color),
            Cell::new("Minutes"),
        ]);

    for row in rows {
        // the initial price key carries the interval length, e.g. `initial_3min`
        let initial = row
            .as_object()
            .and_then(|fields| {
                fields
                    .iter()
                    .find(|(key, _)| key.starts_with("initial_"))
                    .map(|(_, value)| value)
            })
            .unwrap_or(&Value::Null);

        table.add_row(vec![
            text(&row["symbol"]),
            number(&row["current"]),
            number(initial),
            number(&row["gain"]),
            number(&row["interval_minutes"]),
        ]);
    }

    table
}

fn rows(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or_default()
}

fn text(value: &Value) -> String {
    value.as_str().unwrap_or("-").to_string()
}

fn number(value: &Value) -> String {
    value
        .as_f64()
        .map(|number| format!("{:.2}", number))
        .unwrap_or_else(|| "-".to_string())
}
