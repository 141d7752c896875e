use clap::{Parser, Subcommand};
use relaydb_cli::{Cli, Config, RoleArg, DEFAULT_DRIVERS};
use relaydb_common::ManagerConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "relaydb")]
#[command(author = "RelayDB Developers")]
#[command(version)]
#[command(about = "RelayDB CLI - inspect connection registries and master/slave routing")]
struct Args {
    /// 管理器配置文件 (TOML)
    #[arg(short, long, env = "RELAYDB_CONFIG", default_value = "relaydb.toml")]
    config: PathBuf,

    /// 覆盖配置文件中的日志级别
    #[arg(long)]
    log_level: Option<String>,

    /// 注册为静态连接的驱动,可重复
    #[arg(long = "driver")]
    drivers: Vec<String>,

    #[arg(long, default_value = "table")]
    format: String,

    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 列出所有连接 id
    List,
    /// 打印规范化后的拓扑
    Topology { id: Option<String> },
    /// 通过管理器解析连接
    Resolve {
        id: Option<String>,
        #[arg(long, value_enum, default_value_t = RoleArg::Auto)]
        role: RoleArg,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let drivers = if args.drivers.is_empty() {
        DEFAULT_DRIVERS.iter().map(|d| d.to_string()).collect()
    } else {
        args.drivers
    };

    let config = Config {
        config_path: args.config,
        log_level: args.log_level,
        drivers,
        format: args.format,
        color: !args.no_color,
    };

    let mut manager_config = ManagerConfig::from_file(&config.config_path)?;
    if let Some(level) = &config.log_level {
        manager_config.log.level = level.clone();
    }
    relaydb_core::init_logging(&manager_config.log);

    let cli = Cli::with_manager_config(&config, &manager_config)?;

    let report = match args.command {
        Command::List => cli.list(),
        Command::Topology { id } => cli.topology(id.as_deref())?,
        Command::Resolve { id, role } => cli.resolve(id.as_deref(), role)?,
    };
    cli.print(&report);

    Ok(())
}
