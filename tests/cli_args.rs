use clap::Parser;
use serial_test::serial;

use llm_cost_report::cli::Args;
use llm_cost_report::filters::DateFilter;

fn parse(argv: &[&str]) -> Args {
    let mut full = vec!["llm-cost-report"];
    full.extend_from_slice(argv);
    Args::try_parse_from(full).unwrap()
}

#[test]
#[serial]
fn defaults_are_all_records_grouped_by_section() {
    let args = parse(&[]);
    assert!(matches!(args.date_filter().unwrap(), DateFilter::All));
    assert!(!args.json);
    assert!(args.auth_header().is_none());
    assert_eq!(args.currency, "USD");
}

#[test]
#[serial]
fn custom_filter_requires_both_bounds() {
    let args = parse(&["--filter", "custom", "--start", "01/03/2025"]);
    assert!(args.date_filter().is_err());

    let args = parse(&[
        "--filter", "custom", "--start", "01/03/2025", "--end", "31/03/2025",
    ]);
    match args.date_filter().unwrap() {
        DateFilter::Custom { start, end } => {
            assert_eq!(start.to_string(), "2025-03-01");
            assert_eq!(end.to_string(), "2025-03-31");
        }
        other => panic!("expected custom filter, got {other:?}"),
    }
}

#[test]
#[serial]
fn custom_filter_rejects_inverted_range() {
    let args = parse(&[
        "--filter", "custom", "--start", "31/03/2025", "--end", "01/03/2025",
    ]);
    assert!(args.date_filter().is_err());
}

#[test]
#[serial]
fn auth_header_needs_name_and_value() {
    let args = parse(&["--auth-header-name", "x-api-key"]);
    assert!(args.auth_header().is_none());

    let args = parse(&[
        "--auth-header-name", "x-api-key", "--auth-header-value", "s3cret",
    ]);
    assert_eq!(
        args.auth_header(),
        Some(("x-api-key".to_string(), "s3cret".to_string()))
    );
}

#[test]
#[serial]
fn urls_come_from_the_environment() {
    std::env::set_var("COST_CONVERSATIONS_URL", "https://hooks.test/conv");
    std::env::set_var("COST_PRICING_URL", "https://hooks.test/price");
    let args = parse(&[]);
    std::env::remove_var("COST_CONVERSATIONS_URL");
    std::env::remove_var("COST_PRICING_URL");

    assert_eq!(
        args.conversations_url.as_deref(),
        Some("https://hooks.test/conv")
    );
    assert_eq!(args.pricing_url.as_deref(), Some("https://hooks.test/price"));
}
