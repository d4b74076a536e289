use std::io::Write as _;

use clap::Parser;

use super::*;

const RECEIPTS: &str = r#"[
  {"brand":"Cann","item":"Grapefruit","price":10.0,"quantity":2,"channel":"D2C","location":"New York","date":"2023-07-15T14:30:00","discount":5.0},
  {"brand":"Brez","item":"Dream","price":7.5,"quantity":4,"channel":"Retail","location":"Austin","date":"2023-07-16T09:00:00","discount":0.0},
  {"brand":"Cann","item":"Sample","price":0.0,"quantity":1,"channel":"Retail","location":"Austin","date":"2023-07-16T09:30:00","discount":0.0}
]"#;

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["receipts-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_format_command() {
    let cli = Cli::try_parse_from(["receipts-cli", "format"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Format)));
}

#[test]
fn parses_load_command_with_path() {
    let cli = Cli::try_parse_from(["receipts-cli", "load", "receipts.json"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Load { ref path }) if path == Path::new("receipts.json")
    ));
}

#[test]
fn parses_report_command_with_top() {
    let cli = Cli::try_parse_from(["receipts-cli", "report", "r.json", "--top", "5"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Report { top: Some(5), .. })
    ));
}

#[test]
fn report_top_defaults_to_none() {
    let cli = Cli::try_parse_from(["receipts-cli", "report", "r.json"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Report { top: None, .. })));
}

#[test]
fn load_requires_path() {
    assert!(Cli::try_parse_from(["receipts-cli", "load"]).is_err());
}

#[test]
fn load_dataset_reads_and_normalizes_file() {
    let file = write_temp(RECEIPTS);
    let dataset = load_dataset(file.path()).expect("valid receipts file");
    assert_eq!(dataset.len(), 3);
    assert!((dataset.records()[0].total_price - 20.0).abs() < 1e-9);
}

#[test]
fn load_dataset_prefixes_ingestion_errors() {
    let file = write_temp("[{\"brand\": \"Cann\"");
    let err = load_dataset(file.path()).unwrap_err();
    assert!(
        err.to_string().starts_with("Error processing file:"),
        "got: {err}"
    );
}

#[test]
fn load_dataset_reports_missing_file() {
    let err = load_dataset(Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(err.to_string().contains("failed to read"), "got: {err}");
}

#[test]
fn render_report_covers_all_tabs() {
    let file = write_temp(RECEIPTS);
    let dataset = load_dataset(file.path()).unwrap();
    let text = report::render_report(&dataset, 10).expect("render");

    assert!(text.contains("Loaded 3 records (2023-07-15 14:30 to 2023-07-16 09:30)"));
    assert!(text.contains("## Brand Performance"));
    assert!(text.contains("## Shopping Habits"));
    assert!(text.contains("## Pricing & Discounts"));
    assert!(text.contains("| Cann | 2 |"));
    assert!(text.contains("| Brez | 30.00 |"));
    assert!(text.contains("| Brand | D2C | Retail |"));
    assert!(text.contains("| 09:00 | 2 |"));
    assert!(text.contains("1 without a defined discount %"));
}

#[test]
fn format_and_bare_invocation_skip_configuration() {
    let format = Cli::try_parse_from(["receipts-cli", "format"]).unwrap();
    assert_eq!(static_output(format.command.as_ref()), Some(EXPECTED_FORMAT));

    let bare = Cli::try_parse_from(["receipts-cli"]).unwrap();
    assert_eq!(static_output(bare.command.as_ref()), Some(NO_COMMAND_HINT));
}

#[test]
fn load_and_report_need_configuration() {
    for args in [
        vec!["receipts-cli", "load", "r.json"],
        vec!["receipts-cli", "report", "r.json", "--top", "3"],
    ] {
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(static_output(cli.command.as_ref()).is_none());
    }
}
