//! Service and export-kind detection from column names.
//!
//! Both heuristics look only at column names (and, for the file-type rules,
//! an optional filename). They never read cell values.

use crate::schema::{ServiceLabel, SourceLabel};
use crate::table::Table;

/// Keyword hits needed before a service is reported.
const MIN_SERVICE_HITS: usize = 2;

/// Column fragments that mark a billing export regardless of other keywords.
const BILLING_FRAGMENTS: &[&str] = &["cost", "charge", "price"];

/// Keyword sets per service, checked in this order.
pub const SERVICE_KEYWORDS: &[(ServiceLabel, &[&str])] = &[
    (ServiceLabel::Ec2, &["instance", "ec2", "availability_zone", "instance_type", "ami"]),
    (ServiceLabel::S3, &["bucket", "s3", "storage", "object"]),
    (ServiceLabel::Rds, &["rds", "database", "db_instance", "engine"]),
    (ServiceLabel::Lambda, &["lambda", "function", "invocation", "duration"]),
    (ServiceLabel::DynamoDb, &["dynamodb", "table", "read_capacity", "write_capacity"]),
    (ServiceLabel::CloudFront, &["cloudfront", "distribution", "edge"]),
    (ServiceLabel::Ebs, &["volume", "ebs", "snapshot", "gp2", "gp3"]),
    (ServiceLabel::Vpc, &["vpc", "subnet", "nat", "gateway", "endpoint"]),
    (ServiceLabel::Elb, &["load_balancer", "elb", "alb", "nlb", "target"]),
    (ServiceLabel::CloudWatch, &["metric", "alarm", "log", "cloudwatch"]),
    (
        ServiceLabel::CostAndUsageReport,
        &["line_item", "usage_type", "unblended_cost", "blended_cost"],
    ),
    (ServiceLabel::Iam, &["user", "role", "policy", "permission", "iam"]),
    (ServiceLabel::Route53, &["route53", "dns", "hosted_zone", "record"]),
    (ServiceLabel::Sqs, &["queue", "sqs", "message"]),
    (ServiceLabel::Sns, &["topic", "sns", "subscription"]),
    (ServiceLabel::Ecs, &["ecs", "task", "container", "cluster", "fargate"]),
    (ServiceLabel::Eks, &["eks", "kubernetes", "node", "pod"]),
    (ServiceLabel::Athena, &["athena", "query", "execution"]),
    (ServiceLabel::Glue, &["glue", "crawler", "job", "catalog"]),
    (ServiceLabel::Redshift, &["redshift", "cluster", "node", "warehouse"]),
];

/// A file-type rule: matches when any column name contains one of `columns`
/// or the lowercased filename contains one of `filenames`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTypeRule {
    pub label: SourceLabel,
    pub columns: &'static [&'static str],
    pub filenames: &'static [&'static str],
}

impl FileTypeRule {
    fn matches(&self, lower_columns: &[String], lower_filename: Option<&str>) -> bool {
        let by_column = lower_columns
            .iter()
            .any(|c| self.columns.iter().any(|frag| c.contains(frag)));
        let by_name = lower_filename
            .map(|f| self.filenames.iter().any(|frag| f.contains(frag)))
            .unwrap_or(false);
        by_column || by_name
    }
}

/// File-type rules in priority order.
pub const FILE_TYPE_RULES: &[FileTypeRule] = &[
    FileTypeRule {
        label: SourceLabel::CostAndUsageReport,
        columns: &["line_item_", "lineitem/", "bill_billing_period", "pricing_public_on_demand"],
        filenames: &["cost_and_usage", "cur_"],
    },
    FileTypeRule {
        label: SourceLabel::TrustedAdvisor,
        columns: &["check_name", "check_id"],
        filenames: &["trusted"],
    },
    FileTypeRule {
        label: SourceLabel::CostOptimizationHub,
        columns: &["recommendation_id", "estimated_monthly_savings"],
        filenames: &["optimization"],
    },
    FileTypeRule {
        label: SourceLabel::ComputeOptimizer,
        columns: &["current_instance_type", "recommended_instance_type", "finding_reason"],
        filenames: &["compute_optimizer", "compute-optimizer"],
    },
    FileTypeRule {
        label: SourceLabel::SavingsPlans,
        columns: &["savings_plan_arn", "savings_plan_type", "commitment"],
        filenames: &["savings_plan", "savingsplan"],
    },
    FileTypeRule {
        label: SourceLabel::ReservedInstances,
        columns: &["reservation_arn", "reserved_instance", "ri_utilization"],
        filenames: &["reservation", "reserved"],
    },
    FileTypeRule {
        label: SourceLabel::Budgets,
        columns: &["budget_name", "budget_limit", "budgeted_amount"],
        filenames: &["budget"],
    },
    FileTypeRule {
        label: SourceLabel::CostAnomalyDetection,
        columns: &["anomaly_id", "anomaly_score", "root_cause"],
        filenames: &["anomal"],
    },
    FileTypeRule {
        label: SourceLabel::CostExplorer,
        columns: &["unblended_cost", "blended_cost", "amortized_cost"],
        filenames: &["cost_explorer", "cost-explorer"],
    },
    FileTypeRule {
        label: SourceLabel::ResourceTagging,
        columns: &["untagged", "tag_key", "resource_tags"],
        filenames: &["tagging"],
    },
    // Inventories match on columns only
    FileTypeRule {
        label: SourceLabel::Ec2Inventory,
        columns: &["instance_id", "instance_type"],
        filenames: &[],
    },
    FileTypeRule {
        label: SourceLabel::EbsVolumes,
        columns: &["volume_id", "volume_type", "snapshot_id"],
        filenames: &[],
    },
    FileTypeRule {
        label: SourceLabel::S3Storage,
        columns: &["bucket_name", "storage_class"],
        filenames: &[],
    },
    FileTypeRule {
        label: SourceLabel::RdsDatabases,
        columns: &["db_instance", "engine_version"],
        filenames: &[],
    },
    FileTypeRule {
        label: SourceLabel::LambdaFunctions,
        columns: &["function_name", "invocations"],
        filenames: &[],
    },
    FileTypeRule {
        label: SourceLabel::CloudWatchMetrics,
        columns: &["metric_name", "namespace"],
        filenames: &[],
    },
];

/// Guess the AWS service a set of columns describes.
///
/// Any cost, charge or price column marks the data as a billing export.
/// Otherwise the first service with at least two keyword hits in the joined,
/// lowercased column names wins.
pub fn infer_service<S: AsRef<str>>(columns: &[S]) -> ServiceLabel {
    let lower: Vec<String> = columns.iter().map(|c| c.as_ref().to_lowercase()).collect();

    if lower
        .iter()
        .any(|c| BILLING_FRAGMENTS.iter().any(|f| c.contains(f)))
    {
        return ServiceLabel::CostAndUsageReport;
    }

    let joined = lower.join(" ");
    SERVICE_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            keywords.iter().filter(|k| joined.contains(*k)).count() >= MIN_SERVICE_HITS
        })
        .map(|(label, _)| *label)
        .unwrap_or(ServiceLabel::Unknown)
}

/// Guess the kind of export from column names and an optional filename.
pub fn infer_file_type<S: AsRef<str>>(columns: &[S], filename: Option<&str>) -> SourceLabel {
    let lower_columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_lowercase()).collect();
    let lower_filename = filename.map(str::to_lowercase);

    FILE_TYPE_RULES
        .iter()
        .find(|rule| rule.matches(&lower_columns, lower_filename.as_deref()))
        .map(|rule| rule.label)
        .unwrap_or(SourceLabel::Unknown)
}

/// Table-level front end for both inferencers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceClassifier;

impl SourceClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn source(&self, table: &Table, filename: Option<&str>) -> SourceLabel {
        infer_file_type(&table.column_names(), filename)
    }

    pub fn service(&self, table: &Table) -> ServiceLabel {
        infer_service(&table.column_names())
    }
}

/// Kind of export a table appears to be.
pub fn classify_source(table: &Table, filename: Option<&str>) -> SourceLabel {
    SourceClassifier::new().source(table, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_columns_short_circuit() {
        assert_eq!(
            infer_service(&["instance_id", "instance_type", "hourly_price"]),
            ServiceLabel::CostAndUsageReport
        );
        assert_eq!(infer_service(&["Total_Charge"]), ServiceLabel::CostAndUsageReport);
    }

    #[test]
    fn test_service_needs_two_hits() {
        assert_eq!(
            infer_service(&["bucket_name", "storage_class"]),
            ServiceLabel::S3
        );
        assert_eq!(infer_service(&["bucket_name", "owner"]), ServiceLabel::Unknown);
    }

    #[test]
    fn test_service_order() {
        // "instance" and "instance_type" hit EC2 before RDS's "db_instance" and "engine"
        assert_eq!(
            infer_service(&["db_instance", "instance_type", "engine"]),
            ServiceLabel::Ec2
        );
        assert_eq!(infer_service(&["volume_id", "snapshot_id"]), ServiceLabel::Ebs);
        assert_eq!(infer_service(&Vec::<String>::new()), ServiceLabel::Unknown);
    }

    #[test]
    fn test_file_type_by_columns() {
        assert_eq!(
            infer_file_type(&["lineItem/UsageAccountId", "lineItem/UnblendedCost"], None),
            SourceLabel::CostAndUsageReport
        );
        assert_eq!(
            infer_file_type(&["Check_Name", "status"], None),
            SourceLabel::TrustedAdvisor
        );
        assert_eq!(
            infer_file_type(&["volume_id", "size_gb"], None),
            SourceLabel::EbsVolumes
        );
        assert_eq!(infer_file_type(&["a", "b"], None), SourceLabel::Unknown);
    }

    #[test]
    fn test_file_type_priority() {
        // Compute Optimizer columns also contain "instance_type" (EC2); the earlier rule wins
        assert_eq!(
            infer_file_type(&["instance_id", "current_instance_type"], None),
            SourceLabel::ComputeOptimizer
        );
        // A CUR filename beats later column rules
        assert_eq!(
            infer_file_type(&["bucket_name"], Some("CUR_2024_01.csv")),
            SourceLabel::CostAndUsageReport
        );
    }

    #[test]
    fn test_inventory_rules_ignore_filename() {
        assert_eq!(
            infer_file_type(&["name", "owner"], Some("ec2_lambda_s3.csv")),
            SourceLabel::Unknown
        );
        assert_eq!(
            infer_file_type(&["name"], Some("monthly-budget.csv")),
            SourceLabel::Budgets
        );
    }

    #[test]
    fn test_unknown_display() {
        assert_eq!(SourceLabel::Unknown.to_string(), "Unknown AWS Data");
        assert_eq!(ServiceLabel::Unknown.to_string(), "Unknown AWS Service");
    }
}
