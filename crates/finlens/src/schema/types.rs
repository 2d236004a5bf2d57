//! Closed taxonomies assigned by the classifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic role of a column in a cost/usage export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Resource, account or row identifier (e.g., resource_id, account).
    Identifier,
    /// Numeric measurement that is not money (e.g., usage_amount).
    Metric,
    /// Monetary amount (e.g., total_cost, unit_price).
    Cost,
    /// Date or time column, recognised by name.
    Timestamp,
    /// Resource tag.
    Tag,
    /// Categorical grouping column (e.g., service, region).
    Dimension,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Identifier => "identifier",
            ColumnRole::Metric => "metric",
            ColumnRole::Cost => "cost",
            ColumnRole::Timestamp => "timestamp",
            ColumnRole::Tag => "tag",
            ColumnRole::Dimension => "dimension",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of cloud data export a file appears to be.
///
/// Variant order is the classifier's priority order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceLabel {
    CostAndUsageReport,
    TrustedAdvisor,
    CostOptimizationHub,
    ComputeOptimizer,
    SavingsPlans,
    ReservedInstances,
    Budgets,
    CostAnomalyDetection,
    CostExplorer,
    ResourceTagging,
    Ec2Inventory,
    EbsVolumes,
    S3Storage,
    RdsDatabases,
    LambdaFunctions,
    CloudWatchMetrics,
    #[default]
    Unknown,
}

impl SourceLabel {
    /// Human-readable label shown to users.
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceLabel::CostAndUsageReport => "AWS Cost & Usage Report (CUR)",
            SourceLabel::TrustedAdvisor => "AWS Trusted Advisor Report",
            SourceLabel::CostOptimizationHub => "Cost Optimization Hub Export",
            SourceLabel::ComputeOptimizer => "AWS Compute Optimizer Export",
            SourceLabel::SavingsPlans => "Savings Plans Report",
            SourceLabel::ReservedInstances => "Reserved Instance Report",
            SourceLabel::Budgets => "AWS Budgets Report",
            SourceLabel::CostAnomalyDetection => "Cost Anomaly Detection Report",
            SourceLabel::CostExplorer => "AWS Cost Explorer Export",
            SourceLabel::ResourceTagging => "Resource Tagging Report",
            SourceLabel::Ec2Inventory => "EC2 Instance Inventory",
            SourceLabel::EbsVolumes => "EBS Volume Report",
            SourceLabel::S3Storage => "S3 Storage Report",
            SourceLabel::RdsDatabases => "RDS Database Report",
            SourceLabel::LambdaFunctions => "Lambda Function Report",
            SourceLabel::CloudWatchMetrics => "CloudWatch Metrics Export",
            SourceLabel::Unknown => "Unknown AWS Data",
        }
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// AWS service a single export appears to describe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceLabel {
    Ec2,
    S3,
    Rds,
    Lambda,
    DynamoDb,
    CloudFront,
    Ebs,
    Vpc,
    Elb,
    CloudWatch,
    CostAndUsageReport,
    Iam,
    Route53,
    Sqs,
    Sns,
    Ecs,
    Eks,
    Athena,
    Glue,
    Redshift,
    #[default]
    Unknown,
}

impl ServiceLabel {
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceLabel::Ec2 => "EC2",
            ServiceLabel::S3 => "S3",
            ServiceLabel::Rds => "RDS",
            ServiceLabel::Lambda => "Lambda",
            ServiceLabel::DynamoDb => "DynamoDB",
            ServiceLabel::CloudFront => "CloudFront",
            ServiceLabel::Ebs => "EBS",
            ServiceLabel::Vpc => "VPC",
            ServiceLabel::Elb => "ELB",
            ServiceLabel::CloudWatch => "CloudWatch",
            ServiceLabel::CostAndUsageReport => "Cost & Usage Report",
            ServiceLabel::Iam => "IAM",
            ServiceLabel::Route53 => "Route53",
            ServiceLabel::Sqs => "SQS",
            ServiceLabel::Sns => "SNS",
            ServiceLabel::Ecs => "ECS",
            ServiceLabel::Eks => "EKS",
            ServiceLabel::Athena => "Athena",
            ServiceLabel::Glue => "Glue",
            ServiceLabel::Redshift => "Redshift",
            ServiceLabel::Unknown => "Unknown AWS Service",
        }
    }
}

impl fmt::Display for ServiceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
