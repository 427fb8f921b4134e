use super::*;

#[test]
fn parses_header_and_rows_in_file_order() {
    let dataset = Dataset::from_csv_str(
        "sales_date,sales_amount,region\n2024-01-02,10.5,North\n2024-01-01,3,South\n",
    )
    .expect("dataset");

    assert_eq!(
        dataset.column_names(),
        &["sales_date", "sales_amount", "region"]
    );
    assert_eq!(dataset.row_count(), 2);
    assert_eq!(dataset.head(1)[0][0], "2024-01-02");
}

#[test]
fn strips_byte_order_mark_from_first_header() {
    let dataset = Dataset::from_csv_bytes(b"\xEF\xBB\xBFproduct,sales_amount\nA,1\n").expect("dataset");
    assert!(dataset.has_column("product"));
}

#[test]
fn rejects_non_utf8_bytes() {
    let err = Dataset::from_csv_bytes(&[0x70, 0xff, 0xfe, 0x0a]).expect_err("should fail");
    assert!(matches!(err, DatasetError::InvalidUtf8));
    assert!(err.is_malformed_input());
}

#[test]
fn rejects_empty_file() {
    let err = Dataset::from_csv_str("").expect_err("should fail");
    assert!(matches!(err, DatasetError::NoColumns));
}

#[test]
fn pads_short_rows_and_rejects_long_rows() {
    let dataset = Dataset::from_csv_str("a,b,c\n1,2\n").expect("dataset");
    assert_eq!(dataset.head(1)[0], vec!["1", "2", ""]);

    let err = Dataset::from_csv_str("a,b\n1,2\n1,2,3\n").expect_err("should fail");
    let DatasetError::RaggedRow {
        line,
        expected,
        found,
    } = err
    else {
        panic!("expected ragged row error");
    };
    assert_eq!((line, expected, found), (3, 2, 3));
}

#[test]
fn duplicate_headers_get_numeric_suffixes() {
    let dataset = Dataset::from_csv_str("a,a,a.1,a\n1,2,3,4\n").expect("dataset");
    assert_eq!(dataset.column_names(), &["a", "a.1", "a.1.1", "a.2"]);
}

#[test]
fn numeric_column_treats_missing_markers_as_none() {
    let dataset = Dataset::from_csv_str("sales_amount\n1.5\n\nNaN\n N/A \n-2\n").expect("dataset");
    let values = dataset.numeric_column("sales_amount").expect("numeric");
    assert_eq!(values, vec![Some(1.5), None, None, Some(-2.0)]);
}

#[test]
fn numeric_column_reports_first_non_numeric_cell() {
    let dataset = Dataset::from_csv_str("sales_amount\n1\n$20\nabc\n").expect("dataset");
    let err = dataset.numeric_column("sales_amount").expect_err("should fail");
    let DatasetError::NotNumeric { column, row, value } = err else {
        panic!("expected type error");
    };
    assert_eq!(column, "sales_amount");
    assert_eq!(row, 2);
    assert_eq!(value, "$20");
}

#[test]
fn numeric_column_rejects_infinite_and_nan_spellings() {
    for bad in ["NAN", "inf", "-Infinity"] {
        let csv = format!("sales_amount\n5\n{bad}\n");
        let dataset = Dataset::from_csv_str(&csv).expect("dataset");
        let err = dataset.numeric_column("sales_amount").expect_err(bad);
        assert!(
            matches!(&err, DatasetError::NotNumeric { row: 2, value, .. } if value == bad),
            "{bad}: {err}"
        );
    }
}

#[test]
fn whitespace_only_lines_are_skipped() {
    let dataset = Dataset::from_csv_str("product\nA\n   \n\t\nB\n").expect("dataset");
    assert_eq!(dataset.row_count(), 2);
    assert_eq!(
        dataset.text_column("product").expect("text"),
        vec![Some("A"), Some("B")]
    );
}

#[test]
fn unknown_column_is_an_error() {
    let dataset = Dataset::from_csv_str("a\n1\n").expect("dataset");
    assert!(matches!(
        dataset.text_column("b"),
        Err(DatasetError::UnknownColumn(name)) if name == "b"
    ));
}

#[test]
fn column_names_are_case_sensitive() {
    let dataset = Dataset::from_csv_str("Sales_Amount\n1\n").expect("dataset");
    assert!(!dataset.has_column("sales_amount"));
}

#[test]
fn infers_column_kinds() {
    let dataset = Dataset::from_csv_str("i,f,t,e\n1,1,x,\n2,2.5,3,\n").expect("dataset");
    assert_eq!(dataset.column_kind(0), ColumnKind::Integer);
    assert_eq!(dataset.column_kind(1), ColumnKind::Float);
    assert_eq!(dataset.column_kind(2), ColumnKind::Text);
    assert_eq!(dataset.column_kind(3), ColumnKind::Empty);

    let dataset = Dataset::from_csv_str("x\n1\ninf\n").expect("dataset");
    assert_eq!(dataset.column_kind(0), ColumnKind::Text);
}

#[test]
fn head_is_bounded_by_row_count() {
    let dataset = Dataset::from_csv_str("a\n1\n2\n").expect("dataset");
    assert_eq!(dataset.head(5).len(), 2);
    assert_eq!(dataset.head(1).len(), 1);
}
