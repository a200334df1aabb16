//! MAAS CLI - Drive a MAAS region controller from the command line.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use maas_client::config::DEFAULT_TIMEOUT_SECS;
use maas_client::{ClientConfig, ClientSet, Params};

/// MAAS CLI - Bare metal provisioning through MAAS.
#[derive(Parser)]
#[command(name = "maas")]
#[command(about = "Manage machines, images and networking in MAAS")]
struct Cli {
    /// MAAS endpoint, e.g. `http://10.0.0.1:5240/MAAS` (or set `MAAS_ENDPOINT`).
    #[arg(long, env = "MAAS_ENDPOINT")]
    endpoint: Option<String>,

    /// MAAS API key (or set `MAAS_API_KEY` env var).
    #[arg(long, env = "MAAS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "MAAS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// YAML config file; overrides endpoint, API key and timeout.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the user the API key belongs to.
    Whoami,

    /// Machine lifecycle.
    #[command(subcommand)]
    Machines(MachineCommands),

    /// List availability zones.
    Zones,

    /// List subnets.
    Subnets,

    /// List VM hosts.
    VmHosts,

    /// List boot resources.
    BootResources,

    /// Ask rack controllers to sync boot images.
    ImportImages,

    /// Create a custom boot resource and upload its image.
    UploadImage {
        /// Resource name, e.g. `custom/ubuntu-hardened`.
        #[arg(long)]
        name: String,

        /// Architecture, e.g. `amd64/generic`.
        #[arg(long, default_value = "amd64/generic")]
        architecture: String,

        /// Image file.
        #[arg(long)]
        file: PathBuf,

        /// Human readable title.
        #[arg(long)]
        title: Option<String>,

        /// File type (`tgz`, `ddraw`, ...).
        #[arg(long, default_value = "tgz")]
        file_type: String,
    },

    /// Tag management.
    #[command(subcommand)]
    Tags(TagCommands),
}

#[derive(Subcommand)]
enum MachineCommands {
    /// List machines.
    List {
        /// Only machines with this hostname.
        #[arg(long)]
        hostname: Option<String>,
    },

    /// Show one machine.
    Get {
        /// System ID.
        #[arg(long)]
        id: String,
    },

    /// Allocate a machine.
    Allocate {
        /// Availability zone.
        #[arg(long)]
        zone: Option<String>,

        /// Resource pool.
        #[arg(long)]
        pool: Option<String>,

        /// Required tags (comma-separated).
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Deploy an allocated machine.
    Deploy {
        /// System ID.
        #[arg(long)]
        id: String,

        /// Operating system.
        #[arg(long, default_value = "ubuntu")]
        os: String,

        /// Distro series.
        #[arg(long, default_value = "jammy")]
        distro: String,
    },

    /// Release a machine.
    Release {
        /// System ID.
        #[arg(long)]
        id: String,

        /// Quick-erase disks on release.
        #[arg(long, default_value = "false")]
        erase: bool,
    },

    /// Power a machine on.
    PowerOn {
        /// System ID.
        #[arg(long)]
        id: String,
    },

    /// Give the boot interface a static address.
    SetStaticIp {
        /// System ID.
        #[arg(long)]
        id: String,

        /// Address to assign.
        #[arg(long)]
        ip: IpAddr,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// List tags.
    List,

    /// Tag machines.
    Assign {
        /// Tag name.
        #[arg(long)]
        name: String,

        /// System IDs (comma-separated).
        #[arg(long, value_delimiter = ',')]
        machines: Vec<String>,
    },

    /// Untag machines.
    Unassign {
        /// Tag name.
        #[arg(long)]
        name: String,

        /// System IDs (comma-separated).
        #[arg(long, value_delimiter = ',')]
        machines: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(&cli)?;
    let clients = ClientSet::from_config(&config).context("Failed to create MAAS client")?;

    match cli.command {
        Commands::Whoami => {
            let user = clients.authenticate().await?;
            println!("{} <{}>", user.username, user.email);
        }

        Commands::Machines(command) => run_machine_command(&clients, command).await?,

        Commands::Zones => {
            let zones = clients.zones().list().await?;
            println!("\n{:<6} {:<20} {:<40}", "ID", "NAME", "DESCRIPTION");
            println!("{}", "-".repeat(66));
            for zone in zones {
                println!("{:<6} {:<20} {:<40}", zone.id, zone.name, zone.description);
            }
        }

        Commands::Subnets => {
            let subnets = clients.subnets().list().await?;
            println!("\n{:<6} {:<20} {:<20} {:<12}", "ID", "CIDR", "NAME", "FABRIC");
            println!("{}", "-".repeat(60));
            for subnet in subnets {
                let fabric = subnet.vlan.map(|vlan| vlan.fabric_name).unwrap_or_default();
                println!(
                    "{:<6} {:<20} {:<20} {:<12}",
                    subnet.id, subnet.cidr, subnet.name, fabric
                );
            }
        }

        Commands::VmHosts => {
            let hosts = clients.vm_hosts().list(None).await?;
            println!(
                "\n{:<6} {:<20} {:<8} {:<12} {:<12}",
                "ID", "NAME", "TYPE", "CORES", "MEMORY (MB)"
            );
            println!("{}", "-".repeat(62));
            for host in hosts {
                println!(
                    "{:<6} {:<20} {:<8} {:<12} {:<12}",
                    host.id,
                    host.name,
                    host.host_type,
                    format!("{}/{}", host.used.cores, host.total.cores),
                    format!("{}/{}", host.used.memory, host.total.memory),
                );
            }
        }

        Commands::BootResources => {
            let resources = clients.boot_resources().list(None).await?;
            println!("\n{:<6} {:<30} {:<16} {:<10}", "ID", "NAME", "ARCH", "TYPE");
            println!("{}", "-".repeat(64));
            for resource in resources {
                println!(
                    "{:<6} {:<30} {:<16} {:<10}",
                    resource.id, resource.name, resource.architecture, resource.resource_type
                );
            }
        }

        Commands::ImportImages => {
            clients.rack_controllers().import_boot_images().await?;
            println!("Boot image import started");
        }

        Commands::UploadImage {
            name,
            architecture,
            file,
            title,
            file_type,
        } => {
            let (sha256, size) = file_digest(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            info!("Creating boot resource {name} ({size} bytes, sha256 {sha256})");

            let mut resources = clients.boot_resources();
            let mut builder = resources
                .builder(&name, &architecture, &sha256, file.clone(), size)
                .with_file_type(&file_type);
            if let Some(title) = &title {
                builder = builder.with_title(title);
            }
            let (handle, resource) = builder.create().await?;
            handle
                .upload(&resource)
                .await
                .with_context(|| format!("Failed to upload boot resource {}", resource.id))?;
            println!("Uploaded boot resource {} ({})", resource.id, resource.name);
        }

        Commands::Tags(command) => run_tag_command(&clients, command).await?,
    }

    Ok(())
}

async fn run_machine_command(clients: &ClientSet, command: MachineCommands) -> Result<()> {
    match command {
        MachineCommands::List { hostname } => {
            let filter = hostname.map(|hostname| Params::new().with("hostname", hostname));
            let machines = clients.machines().list(filter.as_ref()).await?;
            println!(
                "\n{:<10} {:<20} {:<12} {:<8} {:<16}",
                "SYSTEM ID", "HOSTNAME", "STATE", "POWER", "IPv4"
            );
            println!("{}", "-".repeat(70));
            for machine in machines {
                let ip = machine
                    .ip_addresses
                    .iter()
                    .find(|ip| ip.is_ipv4())
                    .map(ToString::to_string)
                    .unwrap_or_default();
                println!(
                    "{:<10} {:<20} {:<12} {:<8} {:<16}",
                    machine.system_id, machine.hostname, machine.state, machine.power_state, ip
                );
            }
        }

        MachineCommands::Get { id } => {
            let machine = clients.machines().machine(&id).get().await?;
            println!("\nMachine Details:");
            println!("  System ID: {}", machine.system_id);
            println!("  Hostname:  {}", machine.hostname);
            println!("  FQDN:      {}", machine.fqdn);
            println!("  State:     {}", machine.state);
            println!("  Power:     {}", machine.power_state);
            println!(
                "  Zone:      {}",
                machine.zone.as_ref().map(|z| z.name.as_str()).unwrap_or_default()
            );
            println!("  OS:        {} {}", machine.os_system, machine.distro_series);
            println!("  Memory:    {} MB", machine.memory);
            println!("  Storage:   {:.1} GB", machine.total_storage_gb());
            if let Some(kind) = machine.boot_interface_type {
                println!("  Boot NIC:  {kind}");
            }
        }

        MachineCommands::Allocate { zone, pool, tags } => {
            let mut machines = clients.machines();
            let mut allocator = machines.allocator();
            if let Some(zone) = &zone {
                allocator = allocator.with_zone(zone);
            }
            if let Some(pool) = &pool {
                allocator = allocator.with_resource_pool(pool);
            }
            if !tags.is_empty() {
                allocator = allocator.with_tags(tags);
            }
            let machine = allocator.allocate().await.context("Allocation failed")?;
            println!("Allocated {} ({})", machine.system_id, machine.hostname);
        }

        MachineCommands::Deploy { id, os, distro } => {
            let mut handle = clients.machines().machine(&id);
            let machine = handle
                .deployer()
                .set_os_system(&os)
                .set_distro_series(&distro)
                .deploy()
                .await?;
            println!("{} is {}", machine.system_id, machine.state);
        }

        MachineCommands::Release { id, erase } => {
            let mut handle = clients.machines().machine(&id);
            let mut releaser = handle.releaser();
            if erase {
                releaser = releaser.with_erase().with_quick_erase();
            }
            let machine = releaser.release().await?;
            println!("{} is {}", machine.system_id, machine.state);
        }

        MachineCommands::PowerOn { id } => {
            let mut handle = clients.machines().machine(&id);
            let machine = handle.power_on().power_on().await?;
            println!("{} power is {}", machine.system_id, machine.power_state);
        }

        MachineCommands::SetStaticIp { id, ip } => {
            clients
                .network_interfaces()
                .set_boot_interface_static_ip(&id, ip)
                .await
                .with_context(|| format!("Failed to set {ip} on {id}"))?;
            println!("{id} boot interface now uses {ip}");
        }
    }

    Ok(())
}

async fn run_tag_command(clients: &ClientSet, command: TagCommands) -> Result<()> {
    match command {
        TagCommands::List => {
            let tags = clients.tags().list().await?;
            println!("\n{:<24} {:<40}", "NAME", "COMMENT");
            println!("{}", "-".repeat(64));
            for tag in tags {
                println!("{:<24} {:<40}", tag.name, tag.comment);
            }
        }

        TagCommands::Assign { name, machines } => {
            let ids: Vec<&str> = machines.iter().map(String::as_str).collect();
            clients.tags().assign(&name, &ids).await?;
            println!("Tagged {} machine(s) with {name}", ids.len());
        }

        TagCommands::Unassign { name, machines } => {
            let ids: Vec<&str> = machines.iter().map(String::as_str).collect();
            clients.tags().unassign(&name, &ids).await?;
            println!("Removed {name} from {} machine(s)", ids.len());
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    if let Some(path) = &cli.config {
        return ClientConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    let endpoint = cli
        .endpoint
        .clone()
        .context("MAAS endpoint is required (--endpoint or MAAS_ENDPOINT)")?;
    let api_key = cli
        .api_key
        .clone()
        .context("MAAS API key is required (--api-key or MAAS_API_KEY)")?;

    let mut config = ClientConfig::new(endpoint, api_key);
    config.timeout_secs = cli.timeout;
    Ok(config)
}

/// SHA-256 (hex) and size of a file, read in 1 MiB blocks.
async fn file_digest(path: &Path) -> Result<(String, u64)> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 1 << 20];
    let mut size = 0u64;

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }

    Ok((hex::encode(hasher.finalize()), size))
}
