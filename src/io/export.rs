//! CSV export of recorded history and plain-text export of settlement logs.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::history::HistoryRecorder;
use crate::sim::log::join_blocks;

/// Fixed history columns; one `storage_<name>` column per storage follows.
const HEADER: &str = "step,hour,consumption,production,energy_surplus,energy_deficit,\
                      energy_added_to_storage,energy_sold_to_grid,energy_bought_from_storages,\
                      energy_bought_from_grid,grid_purchase_applied,unmet_demand,p2p_price,\
                      grid_purchase_price,grid_sale_price,tokens_minted,tokens_burned,\
                      tokens_gained_from_grid,token_balance,decision_source";

/// Exports recorded history to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `history` - Recorded simulation history
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_history_csv(history: &HistoryRecorder, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_history_csv(history, buf)
}

/// Writes recorded history as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_history_csv(history: &HistoryRecorder, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header: Vec<String> = HEADER.split(',').map(|s| s.trim().to_string()).collect();
    header.extend(history.storage.iter().map(|(name, _)| format!("storage_{name}")));
    wtr.write_record(&header)?;

    for r in history.rows() {
        let mut record = vec![
            r.step.to_string(),
            r.hour.to_string(),
            format!("{:.4}", r.consumption),
            format!("{:.4}", r.production),
            format!("{:.4}", r.energy_surplus),
            format!("{:.4}", r.energy_deficit),
            format!("{:.4}", r.energy_added_to_storage),
            format!("{:.4}", r.energy_sold_to_grid),
            format!("{:.4}", r.energy_bought_from_storages),
            format!("{:.4}", r.energy_bought_from_grid),
            format!("{:.4}", r.grid_purchase_applied),
            format!("{:.4}", r.unmet_demand),
            format!("{:.4}", r.p2p_price),
            format!("{:.4}", r.grid_purchase_price),
            format!("{:.4}", r.grid_sale_price),
            format!("{:.4}", r.tokens_minted),
            format!("{:.4}", r.tokens_burned),
            format!("{:.4}", r.tokens_gained_from_grid),
            format!("{:.4}", r.token_balance),
            r.decision_source.to_string(),
        ];
        record.extend(r.storage_levels.iter().map(|(_, level)| format!("{level:.4}")));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes settlement log blocks to a text file, one blank line between blocks.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_log(blocks: &[String], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_log(blocks, io::BufWriter::new(file))
}

/// Writes settlement log blocks to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_log(blocks: &[String], mut writer: impl Write) -> io::Result<()> {
    writer.write_all(join_blocks(blocks).as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::tests::sample_step;

    fn history(n: usize) -> HistoryRecorder {
        let mut history = HistoryRecorder::new(["A"]);
        for step in 0..n {
            history.record(&sample_step(step));
        }
        history
    }

    fn to_string(history: &HistoryRecorder) -> String {
        let mut buf = Vec::new();
        write_history_csv(history, &mut buf).expect("export should succeed");
        String::from_utf8(buf).expect("CSV is UTF-8")
    }

    #[test]
    fn header_lists_storage_columns_last() {
        let output = to_string(&history(1));
        let first_line = output.lines().next().expect("header line");
        assert!(first_line.starts_with("step,hour,consumption,production,"));
        assert!(first_line.ends_with("token_balance,decision_source,storage_A"));
    }

    #[test]
    fn row_count_matches_step_count() {
        let output = to_string(&history(24));
        // 1 header + 24 data rows
        assert_eq!(output.lines().count(), 25);
    }

    #[test]
    fn deterministic_output() {
        let h = history(5);
        assert_eq!(to_string(&h), to_string(&h));
    }

    #[test]
    fn rows_parse_back() {
        let output = to_string(&history(3));
        let mut rdr = csv::ReaderBuilder::new().from_reader(output.as_bytes());
        let width = rdr.headers().expect("header parses").len();
        assert_eq!(width, 21);

        let mut row_count = 0;
        for record in rdr.records() {
            let rec = record.expect("every row should parse");
            for i in (2..19).chain(std::iter::once(20)) {
                assert!(rec[i].parse::<f64>().is_ok(), "column {i} should be numeric");
            }
            assert_eq!(&rec[19], "provider");
            row_count += 1;
        }
        assert_eq!(row_count, 3);
    }

    #[test]
    fn log_blocks_separated_by_blank_line() {
        let mut buf = Vec::new();
        write_log(&["one".to_string(), "two".to_string()], &mut buf).expect("write should succeed");
        assert_eq!(String::from_utf8(buf).unwrap(), "one\n\ntwo\n");
    }
}
