//! Iceberg catalog: UUID and zoned timestamps, no CHAR(n), TINYINT or SMALLINT.

use chrono_tz::Tz;
use uuid::Uuid;

use super::{CatalogKind, CatalogScenario, Cell, Expected, TableProperty, numbered_columns};
use crate::fixtures::values::*;

pub const COLUMN_TYPES: [&str; 16] = [
    "INT",
    "BIGINT",
    "BOOLEAN",
    "REAL",
    "DOUBLE",
    "DECIMAL(20,10)",
    "VARCHAR",
    "VARBINARY",
    "ARRAY<INTEGER>",
    "MAP<VARCHAR,INTEGER>",
    "ROW(a VARCHAR, b INT)",
    "UUID",
    "TIME(6)",
    "TIMESTAMP(6) WITHOUT TIME ZONE",
    "TIMESTAMP(6) WITH TIME ZONE",
    "DATE",
];

pub fn scenario() -> CatalogScenario {
    with_uuids(Uuid::new_v4(), Uuid::new_v4())
}

/// Scenario inserting the given UUIDs into the minimum and maximum rows.
pub fn with_uuids(min_uuid: Uuid, max_uuid: Uuid) -> CatalogScenario {
    let min_row = vec![
        Cell::integer(MIN_INT),
        Cell::integer(MIN_BIG),
        Cell::boolean("true", true),
        Cell::new(REAL_LITERAL, Expected::Real(0.142_857_142_857_142_86)),
        Cell::new(DOUBLE_LITERAL, Expected::Double(0.142_857_142_857_142_857_14)),
        Cell::decimal(DECIMAL_LITERAL, 10),
        Cell::varchar(&format!("{}'{SYMBOLS}", alphanumerics())),
        Cell::varbinary(),
        Cell::integer_array(),
        Cell::integer_map(),
        Cell::row(SYMBOLS, "0x07f", 0x07f),
        uuid(min_uuid),
        Cell::typed("TIME", "15:55:23", Expected::Time("15:55:23")),
        Cell::typed(
            "TIMESTAMP",
            "2024-07-01 15:55:23",
            Expected::Timestamp("2024-07-01 15:55:23"),
        ),
        Cell::typed(
            "TIMESTAMP",
            "2024-07-01 15:55:23.123456 Europe/Zurich",
            Expected::TimestampTz {
                local: "2024-07-01 15:55:23.123456",
                zone: Tz::Europe__Zurich,
            },
        ),
        Cell::typed("DATE", "2024-07-01", Expected::Date("2024-07-01")),
    ];

    let max_row = vec![
        Cell::integer(MAX_INT),
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
        Cell::varbinary(),
        Cell::integer_array(),
        Cell::integer_map(),
        Cell::row(SPECIALS, "-2", -2),
        uuid(max_uuid),
        Cell::typed("TIME", "15:55:23", Expected::Time("15:55:23")),
        Cell::typed(
            "TIMESTAMP",
            "2024-07-01 15:55:23",
            Expected::Timestamp("2024-07-01 15:55:23"),
        ),
        Cell::typed(
            "TIMESTAMP",
            "2024-07-01 15:55:23.123456 GMT",
            Expected::TimestampTz {
                local: "2024-07-01 15:55:23.123456",
                zone: Tz::GMT,
            },
        ),
        Cell::typed("DATE", "2024-07-01", Expected::Date("2024-07-01")),
    ];

    CatalogScenario {
        kind: CatalogKind::Iceberg,
        table: "table_1".to_string(),
        columns: numbered_columns(&COLUMN_TYPES),
        rows: [min_row, max_row],
        properties: vec![
            TableProperty::Location("location"),
            TableProperty::Value("format", "'PARQUET'".to_string()),
            TableProperty::Value("partitioning", "ARRAY['year(c16)']".to_string()),
        ],
    }
}

fn uuid(value: Uuid) -> Cell {
    Cell::new(format!("UUID '{value}'"), Expected::Uuid(value))
}
