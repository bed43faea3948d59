use clap::Parser;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use std::error::Error;
use std::path::Path;
use vpc_subnet_planner::config::{Settings, LOG_CONFIG_FILE};
use vpc_subnet_planner::facts::{default_cache_file, load_facts, AwsCli, CloudFacts};
use vpc_subnet_planner::output::{plan_print, vpc_print};
use vpc_subnet_planner::{
    partition_vpc_cidr, read_validation_request, validate_request, FactsSnapshot,
};

#[derive(Parser, Debug)]
#[command(
    name = "vpc-subnet-planner",
    version,
    about = "Plan and validate VPC subnets and Kubernetes networks"
)]
struct Cli {
    /// Reuse gathered facts from a JSON cache file (dated default when no file given)
    #[arg(long, global = true, num_args = 0..=1, default_missing_value = "")]
    cache: Option<String>,

    /// AWS region, overrides AWS_REGION
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Split a VPC CIDR into public and private subnets per availability zone
    Plan {
        /// VPC CIDR block, e.g. 10.0.0.0/16
        vpc_cidr: String,

        /// Zones to use; the region's available zones when omitted
        #[arg(long, value_delimiter = ',')]
        zones: Vec<String>,
    },

    /// Validate a JSON request document and print the JSON response
    Validate {
        /// Path of the request file
        request: String,

        /// Treat overlap with the Docker bridge network as an error
        #[arg(long)]
        strict_docker_bridge: bool,
    },

    /// Show the existing subnets of a VPC
    Facts {
        vpc_id: String,
    },
}

fn init_logging() -> Result<(), Box<dyn Error>> {
    if Path::new(LOG_CONFIG_FILE).exists() {
        log4rs::init_file(LOG_CONFIG_FILE, Default::default())?;
    } else {
        let stderr = ConsoleAppender::builder().target(Target::Stderr).build();
        let config = Config::builder()
            .appender(Appender::builder().build("stderr", Box::new(stderr)))
            .build(Root::builder().appender("stderr").build(log::LevelFilter::Warn))?;
        log4rs::init_config(config)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    init_logging()?;
    dotenv::dotenv().ok();
    log::info!("#Start main()");

    let cli = Cli::parse();
    let settings = Settings::from_env().with_region(cli.region);
    let aws = AwsCli::new(settings);
    let cache_file = cli.cache.map(|c| if c.is_empty() { default_cache_file() } else { c });
    let cache_file = cache_file.as_deref();

    match cli.command {
        Commands::Plan { vpc_cidr, zones } => {
            let zones = if zones.is_empty() {
                load_facts(cache_file, &aws, None, true).await?.list_availability_zones()?
            } else {
                zones
            };
            let plan = partition_vpc_cidr(&vpc_cidr, &zones)?;
            plan_print(&vpc_cidr, &plan)?;
        }
        Commands::Validate {
            request,
            strict_docker_bridge,
        } => {
            let request = read_validation_request(&request)?;
            let facts = if request.targets_existing_vpc() {
                load_facts(cache_file, &aws, Some(&request.aws_vpc_id), false).await?
            } else {
                FactsSnapshot::default()
            };
            let response = validate_request(&facts, &request, strict_docker_bridge)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.valid {
                log::warn!("Request is not valid: {}", response.message);
                std::process::exit(1);
            }
        }
        Commands::Facts { vpc_id } => {
            let facts = load_facts(cache_file, &aws, Some(&vpc_id), false).await?;
            vpc_print(&facts.fetch_vpc_facts(&vpc_id)?)?;
        }
    }

    log::info!("#End main()");
    Ok(())
}
