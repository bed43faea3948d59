//! CSV output formatting for subnet plans and VPC facts.

use crate::error::ValidationError;
use crate::models::{broadcast_addr, num_aws_hosts, SubnetDescriptor, SubnetPlan, VpcFacts};
use crate::processing::Role;
use colored::Colorize;

/// One printable subnet line.
#[derive(Debug, Clone, PartialEq)]
pub struct SubnetPrintRow {
    pub j: usize,
    pub role: Role,
    pub subnet_cidr: String,
    pub broadcast: String,
    pub aws_hosts: u64,
    pub availability_zone: String,
    pub subnet_id: String,
    pub subnet_name: String,
}

fn subnet_rows(
    rows: &mut Vec<SubnetPrintRow>,
    role: Role,
    subnets: &[SubnetDescriptor],
) -> Result<(), ValidationError> {
    for s in subnets {
        let cidr = s.address_space()?;
        rows.push(SubnetPrintRow {
            j: rows.len(),
            role,
            subnet_cidr: cidr.to_string(),
            broadcast: broadcast_addr(cidr.addr, cidr.mask)?.to_string(),
            aws_hosts: num_aws_hosts(cidr.mask)?,
            availability_zone: s.availability_zone.clone(),
            subnet_id: s.id.clone(),
            subnet_name: s.name.clone(),
        });
    }
    Ok(())
}

/// Rows for a plan, public subnets first.
pub fn plan_rows(plan: &SubnetPlan) -> Result<Vec<SubnetPrintRow>, ValidationError> {
    let mut rows = Vec::with_capacity(plan.public.len() + plan.private.len());
    subnet_rows(&mut rows, Role::Public, &plan.public)?;
    subnet_rows(&mut rows, Role::Private, &plan.private)?;
    Ok(rows)
}

/// Print a subnet plan as CSV to stdout.
pub fn plan_print(vpc_cidr: &str, plan: &SubnetPlan) -> Result<(), ValidationError> {
    log::info!(
        "#Start plan_print() vpc {} with {} public and {} private subnets",
        vpc_cidr,
        plan.public.len(),
        plan.private.len()
    );
    print_csv_header();
    for row in plan_rows(plan)? {
        print_csv_row(&row);
    }
    Ok(())
}

/// Print the existing subnets of a VPC as CSV to stdout.
pub fn vpc_print(facts: &VpcFacts) -> Result<(), ValidationError> {
    log::info!("#Start vpc_print() {facts}");
    if !facts.has_available_internet_gateway() {
        println!("#{}# {} has no available internet gateway", "NOTE".on_red(), facts.vpc_id);
    }
    let plan = SubnetPlan {
        public: facts.public.clone(),
        private: facts.private.clone(),
    };
    print_csv_header();
    for row in plan_rows(&plan)? {
        print_csv_row(&row);
    }
    Ok(())
}

/// Column names and minimum widths, in print order.
const COLUMNS: [(&str, usize); 8] = [
    ("cnt", 6),
    ("role", 9),
    ("subnet_cidr", 18),
    ("aws_hosts", 12),
    ("broadcast", 19),
    ("zone", 16),
    ("subnet_id", 26),
    ("subnet_name", 24),
];

impl SubnetPrintRow {
    /// Cell values in [`COLUMNS`] order.
    fn cells(&self) -> [String; 8] {
        [
            self.j.to_string(),
            self.role.to_string(),
            self.subnet_cidr.clone(),
            format!("{}_hosts", self.aws_hosts),
            format!("{}_br", self.broadcast),
            self.availability_zone.clone(),
            self.subnet_id.clone(),
            self.subnet_name.clone(),
        ]
    }
}

/// Quote `value` and right-align it in `width`; longer values are never cut.
fn quote_field(value: &str, width: usize) -> String {
    format!("{:>width$}", format!("\"{value}\""))
}

fn csv_header() -> String {
    COLUMNS
        .iter()
        .map(|(name, width)| quote_field(name, *width))
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_line(row: &SubnetPrintRow) -> String {
    row.cells()
        .iter()
        .zip(COLUMNS)
        .map(|(cell, (_, width))| quote_field(cell, width))
        .collect::<Vec<_>>()
        .join(",")
}

fn print_csv_header() {
    println!("{}", csv_header());
}

/// Print a single CSV row.
fn print_csv_row(row: &SubnetPrintRow) {
    println!("{}", csv_line(row));
}
