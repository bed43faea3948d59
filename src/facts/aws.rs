//! AWS facts through the `aws ec2 describe-*` commands.
//!
//! Subnet roles are not stored anywhere in AWS; they are derived from routing.
//! A subnet uses its explicitly associated route table, or the VPC main table
//! when it has none, and is public when that table sends `0.0.0.0/0` to an
//! internet gateway.

use super::cli::{CommandRunner, ShellRunner};
use crate::config::Settings;
use crate::error::FactsError;
use crate::models::{InternetGateway, SubnetDescriptor, VpcFacts};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

const QUAD_ZERO_ROUTE: &str = "0.0.0.0/0";

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct DescribeVpcs {
    #[serde(default)]
    vpcs: Vec<Vpc>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct Vpc {
    vpc_id: String,
    cidr_block: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct DescribeSubnets {
    #[serde(default)]
    subnets: Vec<Subnet>,
}

/// Subnet as returned by `describe-subnets`.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Subnet {
    pub subnet_id: String,
    pub availability_zone: String,
    pub cidr_block: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct DescribeRouteTables {
    #[serde(default)]
    route_tables: Vec<RouteTable>,
}

/// Route table as returned by `describe-route-tables`.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct RouteTable {
    pub route_table_id: String,
    #[serde(default)]
    pub associations: Vec<Association>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Association {
    #[serde(default)]
    pub main: bool,
    pub subnet_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Route {
    pub destination_cidr_block: Option<String>,
    pub gateway_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct DescribeInternetGateways {
    #[serde(default)]
    internet_gateways: Vec<AwsInternetGateway>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsInternetGateway {
    internet_gateway_id: String,
    #[serde(default)]
    attachments: Vec<Attachment>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct Attachment {
    state: String,
    vpc_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct DescribeAvailabilityZones {
    #[serde(default)]
    availability_zones: Vec<AvailabilityZone>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AvailabilityZone {
    zone_name: String,
    state: String,
}

/// Parse CLI JSON output, reporting the path of the first bad field.
fn parse_output<T: DeserializeOwned>(what: &str, output: &str) -> Result<T, FactsError> {
    let mut deserializer = serde_json::Deserializer::from_str(output);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", output);
        FactsError::Parse {
            what: what.to_string(),
            path: e.path().to_string(),
            reason: e.inner().to_string(),
        }
    })
}

fn has_internet_gateway_route(table: &RouteTable, igw_id: Option<&str>) -> bool {
    table.routes.iter().any(|route| {
        route.destination_cidr_block.as_deref() == Some(QUAD_ZERO_ROUTE)
            && route.gateway_id.as_deref().is_some_and(|gw| match igw_id {
                Some(id) => gw == id,
                None => gw.starts_with("igw-"),
            })
    })
}

/// Split `subnets` into (public, private) by inspecting `route_tables`.
///
/// With `igw_id` set only routes to that gateway count as public; otherwise
/// any `igw-` gateway does.
pub fn classify_subnets(
    subnets: &[Subnet],
    route_tables: &[RouteTable],
    igw_id: Option<&str>,
) -> (Vec<SubnetDescriptor>, Vec<SubnetDescriptor>) {
    let main_table = route_tables
        .iter()
        .find(|t| t.associations.iter().any(|a| a.main));

    let mut public = Vec::new();
    let mut private = Vec::new();
    for subnet in subnets {
        let table = route_tables
            .iter()
            .find(|t| {
                t.associations
                    .iter()
                    .any(|a| a.subnet_id.as_deref() == Some(subnet.subnet_id.as_str()))
            })
            .or(main_table);

        let mut descriptor = SubnetDescriptor::existing(
            &subnet.subnet_id,
            &subnet.availability_zone,
            &subnet.cidr_block,
        );
        if let Some(name) = subnet.tags.iter().find(|t| t.key == "Name") {
            descriptor.name = name.value.clone();
        }

        match table {
            Some(t) if has_internet_gateway_route(t, igw_id) => {
                log::debug!("{} is public via {}", subnet.subnet_id, t.route_table_id);
                public.push(descriptor);
            }
            _ => private.push(descriptor),
        }
    }
    (public, private)
}

fn not_found_or(err: FactsError, vpc_id: &str) -> FactsError {
    match err {
        FactsError::Command(msg) if msg.contains("InvalidVpcID.NotFound") => {
            FactsError::VpcNotFound(vpc_id.to_string())
        }
        other => other,
    }
}

/// Gathers facts by running the AWS CLI.
pub struct AwsCli<R: CommandRunner = ShellRunner> {
    runner: Arc<R>,
    settings: Settings,
}

impl AwsCli<ShellRunner> {
    pub fn new(settings: Settings) -> AwsCli<ShellRunner> {
        AwsCli::with_runner(ShellRunner, settings)
    }
}

impl<R: CommandRunner + 'static> AwsCli<R> {
    pub fn with_runner(runner: R, settings: Settings) -> AwsCli<R> {
        AwsCli {
            runner: Arc::new(runner),
            settings,
        }
    }

    /// Full command line for `aws ec2 <subcommand> <args>`.
    fn ec2_command(&self, subcommand: &str, args: &str) -> String {
        let mut cmd = format!(
            "{aws} ec2 {subcommand} {args} --output json",
            aws = self.settings.aws_cli
        );
        if let Some(region) = &self.settings.region {
            cmd.push_str(&format!(" --region {region}"));
        }
        if let Some(profile) = &self.settings.profile {
            cmd.push_str(&format!(" --profile {profile}"));
        }
        cmd
    }

    /// Run one describe command on a blocking task and parse its output.
    async fn describe<T>(&self, subcommand: &'static str, args: String) -> Result<T, FactsError>
    where
        T: DeserializeOwned,
    {
        let runner = Arc::clone(&self.runner);
        let cmd = self.ec2_command(subcommand, &args);
        let output = tokio::task::spawn_blocking(move || runner.run(&cmd))
            .await
            .map_err(|e| FactsError::Command(format!("{subcommand} task failed: {e}")))??;
        parse_output(subcommand, &output)
    }

    /// Available zones of the configured region.
    pub async fn list_availability_zones(&self) -> Result<Vec<String>, FactsError> {
        let zones: DescribeAvailabilityZones = self
            .describe("describe-availability-zones", String::new())
            .await?;
        Ok(zones
            .availability_zones
            .into_iter()
            .filter(|z| z.state == "available")
            .map(|z| z.zone_name)
            .collect())
    }

    /// Fetch CIDR, subnets, route tables and internet gateway of `vpc_id`.
    ///
    /// The four lookups are independent and run concurrently.
    pub async fn gather_vpc_facts(&self, vpc_id: &str) -> Result<VpcFacts, FactsError> {
        let filter = format!("--filters Name=vpc-id,Values={vpc_id}");
        let (vpcs, subnets, tables, igws) = futures::try_join!(
            self.describe::<DescribeVpcs>("describe-vpcs", format!("--vpc-ids {vpc_id}")),
            self.describe::<DescribeSubnets>("describe-subnets", filter.clone()),
            self.describe::<DescribeRouteTables>("describe-route-tables", filter),
            self.describe::<DescribeInternetGateways>(
                "describe-internet-gateways",
                format!("--filters Name=attachment.vpc-id,Values={vpc_id}"),
            ),
        )
        .map_err(|e| not_found_or(e, vpc_id))?;

        let vpc = vpcs
            .vpcs
            .into_iter()
            .find(|v| v.vpc_id == vpc_id)
            .ok_or_else(|| FactsError::VpcNotFound(vpc_id.to_string()))?;

        let internet_gateway = igws.internet_gateways.into_iter().find_map(|igw| {
            igw.attachments
                .into_iter()
                .find(|a| a.vpc_id == vpc_id)
                .map(|a| InternetGateway {
                    id: igw.internet_gateway_id,
                    state: a.state,
                })
        });

        let igw_id = internet_gateway.as_ref().map(|igw| igw.id.as_str());
        let (public, private) = classify_subnets(&subnets.subnets, &tables.route_tables, igw_id);
        log::info!(
            "{vpc_id}: {} public, {} private subnets, internet gateway {:?}",
            public.len(),
            private.len(),
            igw_id
        );

        Ok(VpcFacts {
            vpc_id: vpc.vpc_id,
            cidr: vpc.cidr_block,
            public,
            private,
            internet_gateway,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    const TEST_DATA: &str = "src/tests/test_data";

    /// Answers commands from fixture files keyed by describe subcommand.
    struct FixtureRunner {
        outputs: HashMap<&'static str, String>,
    }

    impl FixtureRunner {
        fn new() -> FixtureRunner {
            let mut outputs = HashMap::new();
            for (sub, file) in [
                ("describe-vpcs", "aws_describe_vpcs.json"),
                ("describe-subnets", "aws_describe_subnets.json"),
                ("describe-route-tables", "aws_describe_route_tables.json"),
                ("describe-internet-gateways", "aws_describe_internet_gateways.json"),
                ("describe-availability-zones", "aws_describe_availability_zones.json"),
            ] {
                let json = fs::read_to_string(format!("{TEST_DATA}/{file}"))
                    .expect("Error reading fixture");
                outputs.insert(sub, json);
            }
            FixtureRunner { outputs }
        }
    }

    impl CommandRunner for FixtureRunner {
        fn run(&self, cmd: &str) -> Result<String, FactsError> {
            if cmd.contains("vpc-missing") {
                return Err(FactsError::Command(
                    "ERROR running: An error occurred (InvalidVpcID.NotFound)".to_string(),
                ));
            }
            self.outputs
                .iter()
                .find(|(sub, _)| cmd.contains(*sub))
                .map(|(_, out)| out.clone())
                .ok_or_else(|| FactsError::Command(format!("unexpected command {cmd}")))
        }
    }

    fn aws() -> AwsCli<FixtureRunner> {
        AwsCli::with_runner(FixtureRunner::new(), Settings::default())
    }

    fn route(dest: &str, gw: &str) -> Route {
        Route {
            destination_cidr_block: Some(dest.to_string()),
            gateway_id: Some(gw.to_string()),
        }
    }

    fn subnet(id: &str, cidr: &str) -> Subnet {
        Subnet {
            subnet_id: id.to_string(),
            availability_zone: "us-west-2a".to_string(),
            cidr_block: cidr.to_string(),
            tags: vec![],
        }
    }

    #[test]
    fn test_classify_explicit_and_main_tables() {
        let tables = vec![
            RouteTable {
                route_table_id: "rtb-main".to_string(),
                associations: vec![Association {
                    main: true,
                    subnet_id: None,
                }],
                routes: vec![route("10.0.0.0/16", "local")],
            },
            RouteTable {
                route_table_id: "rtb-public".to_string(),
                associations: vec![Association {
                    main: false,
                    subnet_id: Some("subnet-pub".to_string()),
                }],
                routes: vec![route("10.0.0.0/16", "local"), route(QUAD_ZERO_ROUTE, "igw-1")],
            },
        ];
        let subnets = vec![subnet("subnet-pub", "10.0.0.0/24"), subnet("subnet-priv", "10.0.1.0/24")];

        let (public, private) = classify_subnets(&subnets, &tables, Some("igw-1"));
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, "subnet-pub");
        assert_eq!(private.len(), 1);
        assert_eq!(private[0].id, "subnet-priv");

        // a route to a different gateway does not make the subnet public
        let (public, _) = classify_subnets(&subnets, &tables, Some("igw-other"));
        assert!(public.is_empty());
    }

    #[test]
    fn test_classify_main_table_with_igw_makes_unassociated_public() {
        let tables = vec![RouteTable {
            route_table_id: "rtb-main".to_string(),
            associations: vec![Association {
                main: true,
                subnet_id: None,
            }],
            routes: vec![route(QUAD_ZERO_ROUTE, "igw-9")],
        }];
        let (public, private) = classify_subnets(&[subnet("subnet-x", "10.0.0.0/24")], &tables, None);
        assert_eq!(public.len(), 1);
        assert!(private.is_empty());
    }

    #[test]
    fn test_parse_output_reports_path() {
        let err = parse_output::<DescribeVpcs>("describe-vpcs", r#"{"Vpcs":[{"VpcId":1}]}"#)
            .unwrap_err();
        match err {
            FactsError::Parse { what, path, .. } => {
                assert_eq!(what, "describe-vpcs");
                assert_eq!(path, "Vpcs[0].VpcId");
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_ec2_command_appends_region_and_profile() {
        let settings = Settings {
            aws_cli: "aws".to_string(),
            region: Some("us-west-2".to_string()),
            profile: Some("dev".to_string()),
        };
        let aws = AwsCli::with_runner(FixtureRunner::new(), settings);
        assert_eq!(
            aws.ec2_command("describe-vpcs", "--vpc-ids vpc-1"),
            "aws ec2 describe-vpcs --vpc-ids vpc-1 --output json --region us-west-2 --profile dev"
        );
    }

    #[tokio::test]
    async fn test_gather_vpc_facts_from_fixtures() {
        let facts = aws().gather_vpc_facts("vpc-0a1b2c3d").await.unwrap();
        assert_eq!(facts.cidr, "10.0.0.0/16");
        assert!(facts.has_available_internet_gateway());
        let public: Vec<&str> = facts.public.iter().map(|s| s.cidr.as_str()).collect();
        let private: Vec<&str> = facts.private.iter().map(|s| s.cidr.as_str()).collect();
        assert_eq!(public, vec!["10.0.20.0/24", "10.0.21.0/24"]);
        assert_eq!(private, vec!["10.0.30.0/24"]);
        assert_eq!(facts.public[0].name, "public-us-west-2a");
    }

    #[tokio::test]
    async fn test_gather_vpc_facts_not_found() {
        let err = aws().gather_vpc_facts("vpc-missing").await.unwrap_err();
        assert!(matches!(err, FactsError::VpcNotFound(ref id) if id == "vpc-missing"));
    }

    #[tokio::test]
    async fn test_list_availability_zones_skips_unavailable() {
        let zones = aws().list_availability_zones().await.unwrap();
        assert_eq!(zones, vec!["us-west-2a", "us-west-2b", "us-west-2c"]);
    }
}
