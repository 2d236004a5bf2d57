//! Integration tests for finlens.

use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use finlens::{
    AggregationRequest, Backend, ColumnRole, ColumnType, FinlensError, MergeStrategy, Parser,
    ServiceLabel, Session, SessionConfig, SourceLabel, Table, Value, classify_columns,
    classify_source, merge, profile,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".csv").expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

/// Helper to write a named file into a temp directory.
fn write_named(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

fn parse(content: &str) -> Table {
    let (table, _) = Parser::new()
        .parse_bytes(content.as_bytes(), "test.csv")
        .expect("Parse failed");
    table
}

// =============================================================================
// Ingestion and Profiling
// =============================================================================

#[test]
fn test_parse_csv_file() {
    let content = "service,region,usage_date,total_cost\n\
                   EC2,us-east-1,2024-01-01,12.50\n\
                   S3,us-east-1,2024-01-01,3.10\n\
                   EC2,eu-west-1,2024-01-02,8.00\n";
    let file = create_test_file(content);

    let (table, meta) = Parser::new().parse_file(file.path()).expect("Parse failed");

    assert_eq!(meta.row_count, 3);
    assert_eq!(meta.column_count, 4);
    assert_eq!(meta.format, "csv");
    assert_eq!(
        table.column("usage_date").unwrap().column_type,
        ColumnType::Timestamp
    );
}

#[test]
fn test_parse_tsv_auto_detect() {
    let content = "instance_id\tinstance_type\tcpu_utilization\n\
                   i-001\tm5.large\t41.5\n\
                   i-002\tt3.micro\t3.2\n";
    let (table, meta) = Parser::new()
        .parse_bytes(content.as_bytes(), "inventory.tsv")
        .expect("Parse failed");

    assert_eq!(meta.format, "tsv");
    assert_eq!(table.column_count(), 3);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Parser::new()
        .parse_file("/definitely/not/here.csv")
        .unwrap_err();
    assert!(matches!(err, FinlensError::Io { .. }));
}

#[test]
fn test_profile_counts() {
    let table = parse(
        "service,total_cost,created_at\n\
         EC2,1.5,2024-01-01\n\
         ,2.5,\n\
         EC2,NA,2024-01-03\n",
    );
    let profile = profile(&table);

    assert_eq!(profile.row_count, 3);
    assert_eq!(profile.date_columns, vec!["created_at"]);
    let service = profile.column("service").unwrap();
    assert_eq!(service.distinct_count, 1);
    assert_eq!(service.null_count, 1);
    assert_eq!(service.sample_values, vec![Value::Text("EC2".into())]);
    assert_eq!(profile.numeric_columns(), vec!["total_cost"]);
    assert_eq!(profile.missing_values()["total_cost"], 1);
}

// =============================================================================
// Classification
// =============================================================================

#[test]
fn test_account_id_is_identifier() {
    let table = parse("account_id,account_cost,total_cost\n123,4.5,6.0\n");
    let roles = classify_columns(&table);

    assert_eq!(roles.role_of("account_id"), Some(ColumnRole::Identifier));
    assert_eq!(roles.role_of("account_cost"), Some(ColumnRole::Identifier));
    assert_eq!(roles.role_of("total_cost"), Some(ColumnRole::Cost));
}

#[test]
fn test_classification_is_deterministic() {
    let table = parse("service,usage_type,tag_env,cost\nEC2,BoxUsage,prod,1\n");
    assert_eq!(classify_columns(&table), classify_columns(&table));
    assert_eq!(
        classify_source(&table, Some("x.csv")),
        classify_source(&table, Some("x.csv"))
    );
}

#[test]
fn test_cur_columns() {
    let table = parse("line_item_product_code,line_item_unblended_cost\nAmazonEC2,1.25\n");
    assert_eq!(
        classify_source(&table, None),
        SourceLabel::CostAndUsageReport
    );
    assert_eq!(
        classify_source(&table, None).to_string(),
        "AWS Cost & Usage Report (CUR)"
    );
}

#[test]
fn test_unknown_columns() {
    let table = parse("foo,bar\n1,2\n");
    assert_eq!(classify_source(&table, None).to_string(), "Unknown AWS Data");
    assert_eq!(
        finlens::infer_service(&table.column_names()),
        ServiceLabel::Unknown
    );
}

// =============================================================================
// Reconciliation
// =============================================================================

#[test]
fn test_identical_schema_merge() {
    let a = parse("service,region,cost\nEC2,us,1\nS3,us,2\nRDS,eu,3\n");
    let b = parse("region,cost,service\nus,4,EC2\nus,5,S3\neu,6,RDS\nap,7,EC2\neu,8,S3\n");

    let outcome = merge(&[
        finlens::NamedTable::new("a.csv", a),
        finlens::NamedTable::new("b.csv", b),
    ])
    .unwrap();

    assert_eq!(outcome.strategy, MergeStrategy::IdenticalSchema);
    assert_eq!(outcome.strategy.to_string(), "identical schema");
    assert_eq!(outcome.table.row_count(), 8);
    assert_eq!(outcome.table.column_names(), vec!["service", "region", "cost"]);
}

#[test]
fn test_disjoint_merge_succeeds() {
    let a = parse("check_name,status\nroot mfa,ok\n");
    let b = parse("bucket_name,storage_class\nlogs,STANDARD\narchive,GLACIER\n");

    let outcome = merge(&[
        finlens::NamedTable::new("advisor.csv", a),
        finlens::NamedTable::new("buckets.csv", b),
    ])
    .unwrap();

    assert_eq!(outcome.strategy, MergeStrategy::ForceMerge);
    assert_eq!(outcome.table.row_count(), 3);
    let source = outcome.table.column("_source_file").unwrap();
    assert_eq!(source.get(0), Some(&Value::Text("advisor.csv".into())));
    assert_eq!(source.get(2), Some(&Value::Text("buckets.csv".into())));
    assert!(outcome.table.has_column("_file_type"));
}

#[test]
fn test_session_loads_files_in_order() {
    let dir = TempDir::new().unwrap();
    let jan = write_named(&dir, "jan.csv", "service,total_cost\nEC2,10\nS3,2\n");
    let feb = write_named(&dir, "feb.csv", "service,total_cost\nEC2,12.5\n");

    let mut session = Session::new().unwrap();
    let outcome = session.load_files(&[jan, feb]).unwrap();

    assert_eq!(outcome.strategy, MergeStrategy::IdenticalSchema);
    assert_eq!(session.sources().len(), 2);
    let cost = session.table().unwrap().column("total_cost").unwrap();
    assert_eq!(cost.column_type, ColumnType::Float);
    assert_eq!(cost.get(2), Some(&Value::Float(12.5)));
}

// =============================================================================
// Query Sandbox
// =============================================================================

fn loaded_session(backend: Backend) -> Session {
    let mut session = Session::with_config(SessionConfig {
        backend,
        ..SessionConfig::default()
    })
    .unwrap();
    session
        .load_bytes(
            b"service,region,usage_amount,total_cost\n\
              EC2,us-east-1,10,5.5\n\
              S3,us-east-1,200,1.25\n\
              EC2,eu-west-1,4,2.25\n\
              Lambda,eu-west-1,1000,0.5\n",
            "costs.csv",
        )
        .unwrap();
    session
}

#[test]
fn test_drop_table_rejected_any_case() {
    let session = loaded_session(Backend::Sql);
    for query in ["DROP TABLE aws_data", "drop table aws_data", "SELECT 1; Drop Table x"] {
        let err = session.query(query).unwrap_err();
        assert!(matches!(err, FinlensError::UnsafeQuery { .. }), "{query}");
    }
    assert_eq!(session.table().unwrap().row_count(), 4);
}

#[test]
fn test_count_with_and_without_table_name() {
    let session = loaded_session(Backend::Sql);
    let named = session.query("SELECT COUNT(*) FROM aws_data").unwrap();
    let other = session.query("SELECT COUNT(*) FROM costs").unwrap();

    assert_eq!(named.row_count(), 1);
    assert_eq!(named.column_count(), 1);
    assert_eq!(named.columns()[0].get(0), Some(&Value::Integer(4)));
    assert_eq!(other.columns()[0].get(0), Some(&Value::Integer(4)));
}

#[test]
fn test_query_error_is_structured() {
    let session = loaded_session(Backend::Sql);
    let err = session.query("SELEC nonsense").unwrap_err();
    assert!(matches!(err, FinlensError::QueryExecution(_)));
}

#[test]
fn test_stats_and_suggestions() {
    let session = loaded_session(Backend::Sql);
    let stats = session.stats().unwrap();

    assert_eq!(stats.total_rows, 4);
    let cost = stats.cost.as_ref().unwrap();
    assert_eq!(cost.column, "total_cost");
    assert_eq!(cost.total, 9.5);
    assert_eq!(cost.max, 5.5);
    assert_eq!(cost.min, 0.5);
    assert_eq!(stats.top_dimensions[0].column, "service");
    assert_eq!(
        stats.top_dimensions[0].values[0],
        (Value::Text("EC2".into()), 2)
    );

    let suggestions = session.suggestions();
    assert!(!suggestions.is_empty() && suggestions.len() <= 5);
    assert_eq!(suggestions[0].description, "Total total_cost by service");

    let basic = loaded_session(Backend::Basic);
    assert_eq!(basic.stats().unwrap(), stats);
}

#[test]
fn test_aggregation_through_session() {
    let session = loaded_session(Backend::Sql);
    let result = session
        .aggregate(&AggregationRequest::sum("total_cost", "region"))
        .unwrap();

    assert_eq!(result.column_names(), vec!["region", "total_total_cost"]);
    assert_eq!(
        result.row(0).unwrap(),
        vec![&Value::Text("us-east-1".into()), &Value::Float(6.75)]
    );
}

#[test]
fn test_analysis_bundle() {
    let session = loaded_session(Backend::Basic);
    let analysis = session.analyze().unwrap();

    assert_eq!(analysis.service, ServiceLabel::CostAndUsageReport);
    assert_eq!(analysis.profile.row_count, 4);
    assert_eq!(
        analysis.roles.columns_with(ColumnRole::Dimension),
        vec!["service", "region"]
    );

    let json = serde_json::to_string(&analysis).unwrap();
    assert!(json.contains("\"usage_amount\":\"metric\""));
}

#[test]
fn test_export_after_merge() {
    let dir = TempDir::new().unwrap();
    let a = write_named(&dir, "a.csv", "region,x\nus,1\n");
    let b = write_named(&dir, "b.csv", "region,y\nus,2\n");

    let mut session = Session::new().unwrap();
    let outcome = session.load_files(&[a, b]).unwrap();
    assert_eq!(outcome.strategy, MergeStrategy::KeyJoin);

    let mut out = Vec::new();
    session.export_csv(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "region,x,y\nus,1,2\n");
}
