//! Command-line entry point of the backup engine.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing::error;

use pgbackup::backup::{do_backup, BackupEnv, BackupOptions};
use pgbackup::catalog::{BackupId, BackupMode, Catalog};
use pgbackup::compress::CompressAlg;
use pgbackup::config::InstanceConfig;
use pgbackup::delete::do_delete;
use pgbackup::pg_client::{PostgresBlockFetcher, PostgresClient};
use pgbackup::restore::{do_restore, RestoreOptions};
use pgbackup::show::{show_backup, show_instance};
use pgbackup::validate::do_validate;
use pgbackup::wal_stream::ReplicationStreamer;
use utils::logging::{self, LogFormat};

#[derive(Parser)]
#[command(name = "pgbackup", version, about = "physical backup manager for PostgreSQL clusters")]
struct Cli {
    /// Root of the backup catalog.
    #[arg(short = 'B', long, env = "BACKUP_PATH", global = true)]
    backup_path: Option<Utf8PathBuf>,

    /// Instance name within the catalog.
    #[arg(long, global = true)]
    instance: Option<String>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize an empty backup catalog.
    Init,

    /// Register a PostgreSQL instance in the catalog.
    AddInstance {
        /// Data directory of the instance.
        #[arg(short = 'D', long)]
        pgdata: Utf8PathBuf,
        /// libpq connection string used by backup sessions.
        #[arg(short = 'd', long)]
        connection: Option<String>,
    },

    /// Remove an instance and all its backups from the catalog.
    DelInstance,

    /// Persist configuration values for an instance.
    SetConfig {
        #[arg(long)]
        compress_algorithm: Option<CompressAlg>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
        compress_level: Option<u32>,
        #[arg(long)]
        archive_timeout: Option<u64>,
        #[arg(short = 'j', long)]
        threads: Option<usize>,
        #[arg(short = 'd', long)]
        connection: Option<String>,
        /// Colon-separated list of external directories to archive.
        #[arg(short = 'E', long)]
        external_dirs: Option<String>,
    },

    /// Print the effective configuration of an instance.
    ShowConfig,

    /// Take a backup.
    Backup {
        #[arg(short = 'b', long)]
        backup_mode: BackupModeArg,
        /// Stream WAL over a replication connection instead of relying on
        /// continuous archiving.
        #[arg(long)]
        stream: bool,
        /// Use a temporary replication slot for streaming.
        #[arg(long)]
        temp_slot: bool,
        #[arg(long)]
        compress_algorithm: Option<CompressAlg>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
        compress_level: Option<u32>,
        #[arg(short = 'j', long)]
        threads: Option<usize>,
        /// Request an immediate checkpoint instead of a smoothed one.
        #[arg(long)]
        fast_checkpoint: bool,
        #[arg(long)]
        no_validate: bool,
    },

    /// Restore a backup into an empty data directory.
    Restore {
        #[arg(short = 'i', long)]
        backup_id: String,
        /// Destination data directory.
        #[arg(short = 'D', long)]
        pgdata: Utf8PathBuf,
        /// Relocate a tablespace: OLDDIR=NEWDIR. May be given repeatedly.
        #[arg(short = 'T', long = "tablespace-mapping")]
        tablespace_mapping: Vec<String>,
        /// Write a standby recovery configuration.
        #[arg(short = 'R', long)]
        restore_as_replica: bool,
        #[arg(long)]
        no_validate: bool,
    },

    /// Re-check a backup against its recorded checksums.
    Validate {
        #[arg(short = 'i', long)]
        backup_id: String,
    },

    /// List backups, or print one backup's metadata.
    Show {
        #[arg(short = 'i', long)]
        backup_id: Option<String>,
    },

    /// Delete a backup together with its descendants.
    Delete {
        #[arg(short = 'i', long)]
        backup_id: String,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum BackupModeArg {
    Full,
    Page,
    Ptrack,
    Delta,
}

impl From<BackupModeArg> for BackupMode {
    fn from(arg: BackupModeArg) -> BackupMode {
        match arg {
            BackupModeArg::Full => BackupMode::Full,
            BackupModeArg::Page => BackupMode::Page,
            BackupModeArg::Ptrack => BackupMode::Ptrack,
            BackupModeArg::Delta => BackupMode::Delta,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init(LogFormat::Plain, cli.verbose) {
        eprintln!("failed to initialize logging: {e:#}");
        std::process::exit(1);
    }

    if let Err(e) = run(cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn backup_root(cli: &Cli) -> Result<Utf8PathBuf> {
    cli.backup_path
        .clone()
        .context("required parameter not specified: backup path (-B, --backup-path)")
}

fn catalog_for(cli: &Cli) -> Result<Catalog> {
    let root = backup_root(cli)?;
    let instance = cli
        .instance
        .clone()
        .context("required parameter not specified: --instance")?;
    Ok(Catalog::new(root, instance))
}

fn parse_backup_id(s: &str) -> Result<BackupId> {
    s.parse()
        .with_context(|| format!("invalid backup ID {s:?}"))
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Init => {
            let root = backup_root(&cli)?;
            Catalog::init_root(&root)?;
            println!("backup catalog initialized at {root}");
            Ok(())
        }

        Command::AddInstance { pgdata, connection } => {
            let catalog = catalog_for(&cli)?;
            catalog.add_instance()?;
            let mut config = InstanceConfig::new(pgdata.clone());
            config.connection = connection.clone();
            // Pin the instance identity so a future backup cannot target
            // the wrong cluster.
            let control_path = pgdata.join(postgres_ffi::pg_constants::PG_CONTROL_FILE_NAME);
            let control = std::fs::read(&control_path)
                .with_context(|| format!("cannot read control file \"{control_path}\""))?;
            let control = postgres_ffi::controlfile_utils::ControlFileData::decode(&control)?;
            config.system_identifier = control.system_identifier;
            config.save(&catalog)?;
            println!("instance '{}' successfully added", catalog.instance);
            Ok(())
        }

        Command::DelInstance => {
            let catalog = catalog_for(&cli)?;
            catalog.del_instance()?;
            println!("instance '{}' successfully deleted", catalog.instance);
            Ok(())
        }

        Command::SetConfig {
            compress_algorithm,
            compress_level,
            archive_timeout,
            threads,
            connection,
            external_dirs,
        } => {
            let catalog = catalog_for(&cli)?;
            let mut config = InstanceConfig::load(&catalog)?;
            if let Some(alg) = compress_algorithm {
                config.compress_alg = *alg;
            }
            if let Some(level) = compress_level {
                config.compress_level = *level;
            }
            if let Some(timeout) = archive_timeout {
                config.archive_timeout_secs = *timeout;
            }
            if let Some(threads) = threads {
                config.num_threads = *threads;
            }
            if let Some(connection) = connection {
                config.connection = Some(connection.clone());
            }
            if let Some(dirs) = external_dirs {
                config.external_dirs = dirs.split(':').map(Utf8PathBuf::from).collect();
            }
            config.save(&catalog)
        }

        Command::ShowConfig => {
            let catalog = catalog_for(&cli)?;
            let config = InstanceConfig::load(&catalog)?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }

        Command::Backup {
            backup_mode,
            stream,
            temp_slot,
            compress_algorithm,
            compress_level,
            threads,
            fast_checkpoint,
            no_validate,
        } => {
            let catalog = catalog_for(&cli)?;
            let config = InstanceConfig::load(&catalog)?;
            let conninfo = config
                .connection
                .clone()
                .context("no connection string configured for this instance")?;

            let interrupted = Arc::new(AtomicBool::new(false));
            for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
                signal_hook::flag::register(signal, Arc::clone(&interrupted))
                    .context("cannot install signal handler")?;
            }

            let mut client = PostgresClient::connect(&conninfo)?;
            let fetcher = Arc::new(PostgresBlockFetcher::new(conninfo.clone()));
            let streamer = (*stream).then(|| {
                let mut streamer =
                    ReplicationStreamer::new(conninfo.clone(), config.xlog_seg_size, *temp_slot);
                if !*temp_slot {
                    streamer.slot_name = format!("pgbackup_{}", catalog.instance);
                }
                Box::new(streamer) as Box<dyn pgbackup::wal_stream::WalStreamer>
            });

            let opts = BackupOptions {
                mode: (*backup_mode).into(),
                stream: *stream,
                compress_alg: compress_algorithm.unwrap_or(config.compress_alg),
                compress_level: compress_level.unwrap_or(config.compress_level),
                num_threads: threads.unwrap_or(config.num_threads),
                fast_checkpoint: *fast_checkpoint,
                no_validate: *no_validate,
            };
            let env = BackupEnv {
                catalog: &catalog,
                config: &config,
                client: &mut client,
                fetcher: Some(fetcher),
                streamer,
                interrupted,
            };
            let id = do_backup(env, &opts)?;
            println!("backup {id} completed");
            Ok(())
        }

        Command::Restore {
            backup_id,
            pgdata,
            tablespace_mapping,
            restore_as_replica,
            no_validate,
        } => {
            let catalog = catalog_for(&cli)?;
            let id = parse_backup_id(backup_id)?;
            let mut mappings = Vec::new();
            for mapping in tablespace_mapping {
                let (old, new) = mapping
                    .split_once('=')
                    .with_context(|| format!("invalid tablespace mapping {mapping:?}, expected OLDDIR=NEWDIR"))?;
                mappings.push((Utf8PathBuf::from(old), Utf8PathBuf::from(new)));
            }
            let opts = RestoreOptions {
                no_validate: *no_validate,
                as_replica: *restore_as_replica,
                tablespace_mapping: mappings,
            };
            do_restore(&catalog, id, pgdata, &opts)
        }

        Command::Validate { backup_id } => {
            let catalog = catalog_for(&cli)?;
            do_validate(&catalog, parse_backup_id(backup_id)?)
        }

        Command::Show { backup_id } => {
            let catalog = catalog_for(&cli)?;
            match backup_id {
                Some(id) => print!("{}", show_backup(&catalog, parse_backup_id(id)?)?),
                None => println!("{}", show_instance(&catalog)?),
            }
            Ok(())
        }

        Command::Delete { backup_id } => {
            let catalog = catalog_for(&cli)?;
            do_delete(&catalog, parse_backup_id(backup_id)?)
        }
    }
}
