#[cfg(test)]
mod tests {
    use crate::{
        DIM_X_LABELS, FACT_Y_FACTS, dim_x, dim_x_rows, fact_y, fact_y_rows, star_source,
        utils::{assert_row_count, assert_rows_match, replicate},
    };
    use connectors::memory::database::{JournalEntry, MemoryDatabase};
    use engine_core::{
        error::{ReflectionError, ReplicationError},
        report::{CopyResult, CopyStatus, Phase, RunStatus},
    };
    use engine_runtime::execution::factory::MemoryConnectionProvider;
    use model::{
        core::{data_type::DataType, value::Value},
        records::row::RowData,
        schema::{column::ColumnDescriptor, foreign_key::ForeignKeyDescriptor, table::TableDescriptor},
    };
    use tracing_test::traced_test;

    fn fact_z() -> TableDescriptor {
        TableDescriptor::new("fact_z")
            .column(ColumnDescriptor::new("id", DataType::Integer).not_null())
            .column(ColumnDescriptor::new("fact_y_id", DataType::Integer))
            .primary_key(&["id"])
            .foreign_key(ForeignKeyDescriptor::new(&["fact_y_id"], "fact_y", &["id"]))
    }

    fn fact_z_rows() -> Vec<RowData> {
        vec![RowData::from_pairs(
            "fact_z",
            [("id", Value::Int32(1)), ("fact_y_id", Value::Int32(1))],
        )]
    }

    // Scenario: dim_x (3 rows) and fact_y (5 rows, FK to dim_x) into an empty destination.
    // Expected Outcome:
    // - dim_x loads before fact_y.
    // - Both tables land with every row, the run is Done and both tables report ok.
    #[traced_test]
    #[tokio::test]
    async fn star_schema_into_empty_destination() {
        let source = star_source();
        let dest = MemoryDatabase::new();
        let provider = MemoryConnectionProvider::new(source.clone(), dest.clone());

        let report = replicate(&provider).await.expect("replication failed");

        assert_eq!(report.load_order, ["dim_x", "fact_y"]);
        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(
            report.tables,
            vec![CopyResult::ok("dim_x", 3, 3), CopyResult::ok("fact_y", 5, 5)]
        );
        assert_eq!(report.rows_committed(), 8);
        assert!(report.failure.is_none());

        assert_row_count(&dest, "dim_x", 3);
        assert_row_count(&dest, "fact_y", 5);
        assert_rows_match(&source, &dest, "dim_x");
        assert_rows_match(&source, &dest, "fact_y");
        assert_eq!(dest.table("fact_y").unwrap().foreign_keys, fact_y().foreign_keys);

        assert_eq!(
            dest.journal(),
            vec![
                JournalEntry::Drop("fact_y".to_string()),
                JournalEntry::Drop("dim_x".to_string()),
                JournalEntry::Create("dim_x".to_string()),
                JournalEntry::Create("fact_y".to_string()),
                JournalEntry::Commit,
                JournalEntry::Insert {
                    table: "dim_x".to_string(),
                    rows: 3
                },
                JournalEntry::Commit,
                JournalEntry::Insert {
                    table: "fact_y".to_string(),
                    rows: 5
                },
                JournalEntry::Commit,
            ]
        );
        assert!(logs_contain("Load order: dim_x, fact_y"));
    }

    // Scenario: The destination already holds different data, and a different
    // shape, for dim_x and fact_y.
    // Expected Outcome: Old rows and old columns are gone; the destination matches the source.
    #[traced_test]
    #[tokio::test]
    async fn rerun_fully_replaces_existing_data() {
        let source = star_source();
        let stale_dim = dim_x().column(ColumnDescriptor::new("legacy_flag", DataType::Boolean));
        let stale_rows: Vec<RowData> = (1..=7)
            .map(|id| {
                RowData::from_pairs(
                    "dim_x",
                    [
                        ("id", Value::Int32(id)),
                        ("label", Value::from(format!("old-{id}"))),
                        ("legacy_flag", Value::Boolean(true)),
                    ],
                )
            })
            .collect();
        let dest = MemoryDatabase::new()
            .with_table(stale_dim, stale_rows)
            .with_table(fact_y(), fact_y_rows(&[(7, 1), (7, 2)]));
        let provider = MemoryConnectionProvider::new(source.clone(), dest.clone());

        replicate(&provider).await.expect("first run failed");

        assert_row_count(&dest, "dim_x", 3);
        assert_row_count(&dest, "fact_y", 5);
        assert_rows_match(&source, &dest, "dim_x");
        assert_rows_match(&source, &dest, "fact_y");
        assert!(dest.table("dim_x").unwrap().find_column("legacy_flag").is_none());

        // A second pass over the now-populated destination replaces rather than appends.
        let report = replicate(&provider).await.expect("second run failed");
        assert_eq!(report.status, RunStatus::Done);
        assert_row_count(&dest, "dim_x", 3);
        assert_row_count(&dest, "fact_y", 5);
        assert_rows_match(&source, &dest, "fact_y");
    }

    // Scenario: fact_y has no rows in the source.
    // Expected Outcome: fact_y is reported as skipped_empty and the run still reaches Done.
    #[traced_test]
    #[tokio::test]
    async fn empty_table_is_skipped() {
        let source = MemoryDatabase::new()
            .with_table(dim_x(), dim_x_rows(&DIM_X_LABELS))
            .with_table(fact_y(), vec![]);
        let dest = MemoryDatabase::new();
        let provider = MemoryConnectionProvider::new(source, dest.clone());

        let report = replicate(&provider).await.expect("replication failed");

        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(report.phases.last(), Some(&Phase::Done));
        assert_eq!(report.table("dim_x").unwrap().status, CopyStatus::Ok);
        assert_eq!(
            report.table("fact_y").unwrap(),
            &CopyResult::skipped_empty("fact_y")
        );
        // The table is still recreated, just left empty.
        assert_row_count(&dest, "fact_y", 0);
        assert!(logs_contain("Source table is empty, skipping"));
    }

    // Scenario: Inserts into fact_y are forced to fail; fact_z depends on fact_y.
    // Expected Outcome:
    // - fact_y reports failed and its transaction is rolled back.
    // - fact_z is never attempted.
    // - The run fails in the Copying phase naming fact_y.
    #[traced_test]
    #[tokio::test]
    async fn forced_insert_failure_halts_copy() {
        let source = star_source().with_table(fact_z(), fact_z_rows());
        let dest = MemoryDatabase::new();
        dest.fail_writes_to("fact_y");
        let provider = MemoryConnectionProvider::new(source, dest.clone());

        let err = replicate(&provider).await.unwrap_err();

        assert_eq!(err.phase, Phase::Copying);
        assert!(matches!(
            err.source,
            ReplicationError::CopyFailed { ref table, .. } if table == "fact_y"
        ));

        let report = err.report;
        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.load_order, ["dim_x", "fact_y", "fact_z"]);
        let statuses: Vec<(&str, CopyStatus)> = report
            .tables
            .iter()
            .map(|t| (t.table.as_str(), t.status))
            .collect();
        assert_eq!(
            statuses,
            vec![("dim_x", CopyStatus::Ok), ("fact_y", CopyStatus::Failed)]
        );
        assert_eq!(report.table("fact_y").unwrap().rows_attempted, 5);
        assert_eq!(report.table("fact_y").unwrap().rows_committed, 0);

        let failure = report.failure.as_ref().unwrap();
        assert_eq!(failure.phase, Phase::Copying);
        assert_eq!(failure.table.as_deref(), Some("fact_y"));
        assert_eq!(failure.kind, "copy_failed");

        assert_row_count(&dest, "dim_x", 3);
        assert_row_count(&dest, "fact_y", 0);
        assert_row_count(&dest, "fact_z", 0);
        assert_eq!(dest.journal().last(), Some(&JournalEntry::Rollback));
        assert!(logs_contain("Table copy failed, halting"));
    }

    // Scenario: A fact_y row references a dim_x id that does not exist.
    // Expected Outcome: The destination rejects fact_y as a constraint violation.
    #[tokio::test]
    async fn constraint_violation_is_copy_failed() {
        let mut facts = FACT_Y_FACTS.to_vec();
        facts.push((99, 100));
        let source = MemoryDatabase::new()
            .with_table(dim_x(), dim_x_rows(&DIM_X_LABELS))
            .with_table(fact_y(), fact_y_rows(&facts));
        let dest = MemoryDatabase::new();
        let provider = MemoryConnectionProvider::new(source, dest.clone());

        let err = replicate(&provider).await.unwrap_err();

        assert_eq!(err.source.kind(), "copy_failed");
        assert_eq!(err.source.table(), Some("fact_y"));
        let fact = err.report.table("fact_y").unwrap();
        assert_eq!(fact.rows_attempted, 6);
        assert!(fact.error.as_deref().unwrap().starts_with("Constraint violation"));
        assert_row_count(&dest, "fact_y", 0);
    }

    // Scenario: A table references itself.
    // Expected Outcome: No load order exists; the run fails before touching the destination.
    #[tokio::test]
    async fn self_reference_is_cyclic() {
        let employee = TableDescriptor::new("employee")
            .column(ColumnDescriptor::new("id", DataType::Integer).not_null())
            .column(ColumnDescriptor::new("manager_id", DataType::Integer))
            .primary_key(&["id"])
            .foreign_key(ForeignKeyDescriptor::new(&["manager_id"], "employee", &["id"]));
        let source = star_source().with_table(employee, vec![]);
        let dest = MemoryDatabase::new();
        let provider = MemoryConnectionProvider::new(source, dest.clone());

        let err = replicate(&provider).await.unwrap_err();

        assert_eq!(err.phase, Phase::Reflecting);
        match &err.source {
            ReplicationError::CyclicDependency { tables } => {
                assert_eq!(tables, &["employee".to_string()])
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.report.tables.is_empty());
        assert!(dest.journal().is_empty());
        assert!(dest.table_names().is_empty());
    }

    // Scenario: fact_y references dim_x, but dim_x is not in the source.
    // Expected Outcome: Reflection fails with a dangling reference.
    #[tokio::test]
    async fn dangling_reference_is_a_reflection_error() {
        let source = MemoryDatabase::new().with_table(fact_y(), fact_y_rows(&FACT_Y_FACTS));
        let provider = MemoryConnectionProvider::new(source, MemoryDatabase::new());

        let err = replicate(&provider).await.unwrap_err();

        assert_eq!(err.phase, Phase::Reflecting);
        assert!(matches!(
            err.source,
            ReplicationError::Reflection(ReflectionError::DanglingReference { ref referenced, .. })
                if referenced == "dim_x"
        ));
    }

    // Scenario: The second DDL statement fails while replacing a populated destination.
    // Expected Outcome: Nothing is dropped; the old data survives untouched.
    #[tokio::test]
    async fn failed_materialization_leaves_destination_untouched() {
        let dest = MemoryDatabase::new()
            .with_table(dim_x(), dim_x_rows(&["old"]))
            .with_table(fact_y(), fact_y_rows(&[(1, 1)]));
        dest.fail_ddl(true);
        let provider = MemoryConnectionProvider::new(star_source(), dest.clone());

        let err = replicate(&provider).await.unwrap_err();

        assert_eq!(err.phase, Phase::Materializing);
        assert_eq!(err.source.kind(), "materialization_error");
        assert!(err.report.tables.is_empty());
        assert_row_count(&dest, "dim_x", 1);
        assert_row_count(&dest, "fact_y", 1);
        assert_eq!(dest.journal(), vec![JournalEntry::Rollback]);
    }

    // Scenario: orders.customer_code references customers.code, which is UNIQUE but not the key.
    // Expected Outcome: The unique constraint is recreated first, so the foreign key materializes
    // and every row copies.
    #[tokio::test]
    async fn foreign_key_to_unique_column() {
        let customers = TableDescriptor::new("customers")
            .column(ColumnDescriptor::new("id", DataType::Integer).not_null())
            .column(ColumnDescriptor::new("code", DataType::VarChar(Some(8))).not_null())
            .primary_key(&["id"])
            .unique(&["code"]);
        let orders = TableDescriptor::new("orders")
            .column(ColumnDescriptor::new("id", DataType::Integer).not_null())
            .column(ColumnDescriptor::new("customer_code", DataType::VarChar(Some(8))))
            .primary_key(&["id"])
            .foreign_key(ForeignKeyDescriptor::new(&["customer_code"], "customers", &["code"]));
        let source = MemoryDatabase::new()
            .with_table(
                customers,
                vec![
                    RowData::from_pairs("customers", [("id", Value::Int32(1)), ("code", Value::from("ACME"))]),
                    RowData::from_pairs("customers", [("id", Value::Int32(2)), ("code", Value::from("GLOBEX"))]),
                ],
            )
            .with_table(
                orders,
                vec![
                    RowData::from_pairs("orders", [("id", Value::Int32(10)), ("customer_code", Value::from("GLOBEX"))]),
                    RowData::from_pairs("orders", [("id", Value::Int32(11)), ("customer_code", Value::Null)]),
                ],
            );
        let dest = MemoryDatabase::new();
        let provider = MemoryConnectionProvider::new(source.clone(), dest.clone());

        let report = replicate(&provider).await.expect("replication failed");

        assert_eq!(report.status, RunStatus::Done);
        assert_eq!(report.load_order, ["customers", "orders"]);
        assert_eq!(
            dest.table("customers").unwrap().unique_keys,
            vec![vec!["code".to_string()]]
        );
        assert_rows_match(&source, &dest, "customers");
        assert_rows_match(&source, &dest, "orders");
    }

    // Scenario: A table holds values a lossy decoder would alter: numerics beyond 28
    // significant digits and NaN, array literals, microsecond timestamptz and NULLs.
    // Expected Outcome: Every value lands in the destination unchanged.
    #[tokio::test]
    async fn edge_values_pass_through_unchanged() {
        let ledger = TableDescriptor::new("ledger")
            .column(ColumnDescriptor::new("id", DataType::BigInt).not_null())
            .column(ColumnDescriptor::new("balance", DataType::from_postgres_type("numeric")))
            .column(ColumnDescriptor::new("tags", DataType::Custom("text[]".into())))
            .column(ColumnDescriptor::new("posted_at", DataType::TimestampTz))
            .primary_key(&["id"]);
        let posted_at = chrono::DateTime::parse_from_rfc3339("1999-12-31T23:59:59.999999-05:00")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let rows = [
            ("100000000000000000000000000000000", "{a,\"b c\"}"),
            ("0.12345678901234567890123456789012", "{}"),
            ("NaN", "{NULL}"),
        ]
        .iter()
        .enumerate()
        .map(|(i, (balance, tags))| {
            RowData::from_pairs(
                "ledger",
                [
                    ("id", Value::Int(i as i64 + 1)),
                    ("balance", Value::from(*balance)),
                    ("tags", Value::from(*tags)),
                    ("posted_at", Value::Timestamp(posted_at)),
                ],
            )
        })
        .chain(std::iter::once(RowData::from_pairs(
            "ledger",
            [
                ("id", Value::Int(4)),
                ("balance", Value::Null),
                ("tags", Value::Null),
                ("posted_at", Value::Null),
            ],
        )))
        .collect();
        let source = MemoryDatabase::new().with_table(ledger, rows);
        let dest = MemoryDatabase::new();
        let provider = MemoryConnectionProvider::new(source.clone(), dest.clone());

        let report = replicate(&provider).await.expect("replication failed");

        assert_eq!(report.tables, vec![CopyResult::ok("ledger", 4, 4)]);
        assert_rows_match(&source, &dest, "ledger");
        let stored = dest.rows("ledger").unwrap();
        assert_eq!(
            stored[0].get_value("balance"),
            Value::from("100000000000000000000000000000000")
        );
        assert_eq!(stored[2].get_value("balance"), Value::from("NaN"));
        assert_eq!(stored[3].get_value("posted_at"), Value::Null);
    }

    // Scenario: The run report is serialized for external tooling.
    // Expected Outcome: Statuses and phases use their snake_case names.
    #[tokio::test]
    async fn report_serializes_to_json() {
        let source = MemoryDatabase::new()
            .with_table(dim_x(), dim_x_rows(&DIM_X_LABELS))
            .with_table(fact_y(), vec![]);
        let provider = MemoryConnectionProvider::new(source, MemoryDatabase::new());

        let report = replicate(&provider).await.unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json["status"], "done");
        assert_eq!(json["load_order"], serde_json::json!(["dim_x", "fact_y"]));
        assert_eq!(json["tables"][0]["status"], "ok");
        assert_eq!(json["tables"][0]["rows_committed"], 3);
        assert_eq!(json["tables"][1]["status"], "skipped_empty");
        assert_eq!(json["phases"][5], "done");
        assert!(json.get("failure").is_none());
    }
}
