//! Hive connector over external S3 locations: TINYINT, SMALLINT and
//! CHAR(n), no UUID, TIME or JSON.

use super::{CatalogKind, CatalogScenario, Cell, Expected, TableProperty, numbered_columns};
use crate::fixtures::values::*;

pub const CHAR_LENGTH: usize = 80;

pub const COLUMN_TYPES: [&str; 17] = [
    "INT",
    "TINYINT",
    "SMALLINT",
    "BIGINT",
    "BOOLEAN",
    "REAL",
    "DOUBLE",
    "DECIMAL(20,10)",
    "VARCHAR",
    "CHAR(80)",
    "VARBINARY",
    "ARRAY<INTEGER>",
    "MAP<VARCHAR,INTEGER>",
    "ROW(a VARCHAR, b INT)",
    "TIMESTAMP",
    "TIMESTAMP(3)",
    "DATE",
];

pub fn scenario() -> CatalogScenario {
    let min_row = vec![
        Cell::integer(MIN_INT),
        Cell::integer(MIN_TINY),
        Cell::integer(MIN_SMALL),
        Cell::integer(MIN_BIG),
        Cell::boolean("true", true),
        Cell::new(REAL_LITERAL, Expected::Real(0.142_857_142_857_142_86)),
        Cell::new(DOUBLE_LITERAL, Expected::Double(0.142_857_142_857_142_857_14)),
        Cell::decimal(DECIMAL_LITERAL, 10),
        Cell::varchar(&format!("{}'{SYMBOLS}", alphanumerics())),
        Cell::char(SYMBOLS, CHAR_LENGTH),
        Cell::varbinary(),
        Cell::integer_array(),
        Cell::integer_map(),
        Cell::row(SYMBOLS, "0x07f", 0x07f),
        Cell::typed(
            "TIMESTAMP",
            "2024-07-01 15:55:23",
            Expected::Timestamp("2024-07-01 15:55:23"),
        ),
        Cell::typed(
            "TIMESTAMP",
            "2024-07-01 15:55:23.123",
            Expected::Timestamp("2024-07-01 15:55:23.123"),
        ),
        Cell::typed("DATE", "2024-07-01", Expected::Date("2024-07-01")),
    ];

    let max_row = vec![
        Cell::integer(MAX_INT),
        Cell::integer(MAX_TINY),
        Cell::integer(MAX_SMALL),
        Cell::integer(MAX_BIG),
        Cell::boolean("TRUE", true),
        Cell::new(
            NEGATIVE_FRACTION_LITERAL,
            Expected::Real(-0.142_857_142_857_142_857_14),
        ),
        Cell::new(
            NEGATIVE_FRACTION_LITERAL,
            Expected::Double(-0.142_857_142_857_142_857_14),
        ),
        Cell::decimal(NEGATIVE_DECIMAL_LITERAL, 10),
        Cell::varchar(&format!("{ACCENTS}{SPECIALS}")),
        Cell::char(ACCENTS, CHAR_LENGTH),
        Cell::varbinary(),
        Cell::integer_array(),
        Cell::integer_map(),
        Cell::row(SPECIALS, "-2", -2),
        Cell::typed(
            "TIMESTAMP",
            "2024-07-01 15:55:23",
            Expected::Timestamp("2024-07-01 15:55:23"),
        ),
        Cell::typed(
            "TIMESTAMP",
            "2024-07-01 15:55:23.123",
            Expected::Timestamp("2024-07-01 15:55:23.123"),
        ),
        Cell::typed("DATE", "2024-07-01", Expected::Date("2024-07-01")),
    ];

    CatalogScenario {
        kind: CatalogKind::Hive,
        table: "table_1".to_string(),
        columns: numbered_columns(&COLUMN_TYPES),
        rows: [min_row, max_row],
        properties: vec![
            TableProperty::Location("external_location"),
            TableProperty::Value("format", "'PARQUET'".to_string()),
            // Partition columns must come last
            TableProperty::Value("partitioned_by", "ARRAY['c17']".to_string()),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::StepFailure;
    use serde_json::{Value, json};
    use trino_client::QueryResult;

    #[test]
    fn test_char_fixtures_fit_column_length() {
        for fixture in [SYMBOLS, ACCENTS] {
            assert!(fixture.chars().count() <= CHAR_LENGTH, "{fixture}");
        }
    }

    fn stored_rows() -> Vec<Vec<Value>> {
        vec![
            vec![
                json!(MIN_INT),
                json!(-128),
                json!(-32768),
                json!(MIN_BIG),
                json!(true),
                json!(0.14285715),
                json!(0.14285714285714285),
                json!("3.1400000000"),
                json!(format!("{}'{SYMBOLS}", alphanumerics())),
                json!(format!("{SYMBOLS:<80}")),
                json!("ZWg/"),
                json!([1, 2, 3]),
                json!({"foo": 1, "bar": 2}),
                json!([SYMBOLS, 127]),
                json!("2024-07-01 15:55:23.000"),
                json!("2024-07-01 15:55:23.123"),
                json!("2024-07-01"),
            ],
            vec![
                json!(MAX_INT),
                json!(127),
                json!(32767),
                json!(MAX_BIG),
                json!(true),
                json!(-0.14285715),
                json!(-0.14285714285714285),
                json!("-3.1400000000"),
                json!(format!("{ACCENTS}{SPECIALS}")),
                json!(format!("{ACCENTS:<80}")),
                json!("ZWg/"),
                json!([1, 2, 3]),
                json!({"foo": 1, "bar": 2}),
                json!([SPECIALS, -2]),
                json!("2024-07-01 15:55:23.000"),
                json!("2024-07-01 15:55:23.123"),
                json!("2024-07-01"),
            ],
        ]
    }

    fn result(rows: Vec<Vec<Value>>) -> QueryResult {
        QueryResult {
            rows,
            ..QueryResult::default()
        }
    }

    #[test]
    fn test_stored_rows_verify() {
        scenario().verify_rows(&result(stored_rows())).unwrap();
    }

    #[test]
    fn test_unpadded_char_is_rejected() {
        let mut rows = stored_rows();
        rows[1][9] = json!(ACCENTS);

        let err = scenario().verify_rows(&result(rows)).unwrap_err();

        match err {
            StepFailure::Cell { row, column, .. } => {
                assert_eq!((row, column.as_str()), (2, "c10"));
            }
            other => panic!("unexpected failure: {other}"),
        }
    }

    #[test]
    fn test_smallint_maximum_is_positive() {
        let scenario = scenario();
        assert_eq!(scenario.rows[1][2].literal, "32767");
        assert_eq!(scenario.rows[0][2].literal, "-32768");
    }

    #[test]
    fn test_partition_column_is_last() {
        let scenario = scenario();
        assert_eq!(scenario.columns.len(), 17);
        assert_eq!(scenario.columns[16].name, "c17");
        assert!(scenario.rows.iter().all(|row| row.len() == 17));
    }

    #[test]
    fn test_extra_column_is_rejected() {
        let mut rows = stored_rows();
        rows[0].push(json!(null));

        let err = scenario().verify_rows(&result(rows)).unwrap_err();
        assert!(matches!(
            err,
            StepFailure::ColumnCount {
                row: 1,
                expected: 17,
                actual: 18
            }
        ));
    }
}
