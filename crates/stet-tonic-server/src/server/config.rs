use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use core::time::Duration;
use std::net::SocketAddr;

/// Which document store backs the Person collection.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// A MongoDB deployment reachable through `MONGO_URI`.
    Mongo,
    /// A process-local store. Contents are lost on exit.
    Memory,
}

/// Runtime configuration for the `stet-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a `.env`
/// file is honored), with defaults matching a local development setup: the
/// server on port 50051 and MongoDB on its default port.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "stet-server",
    version,
    about = "A gRPC service for creating, reading, updating and deleting people"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub server_addr: String,

    /// Document store backend.
    ///
    /// Environment variable: `STORE_BACKEND`
    #[arg(long = "store", env = "STORE_BACKEND", value_enum, default_value_t = StoreBackend::Mongo)]
    pub store: StoreBackend,

    /// MongoDB connection string.
    ///
    /// Environment variable: `MONGO_URI`
    #[arg(long, env = "MONGO_URI", default_value_t = String::from("mongodb://localhost:27017"))]
    pub mongo_uri: String,

    /// Database holding the Person collection.
    ///
    /// Environment variable: `MONGO_DATABASE`
    #[arg(long, env = "MONGO_DATABASE", default_value_t = String::from("mydb"))]
    pub database: String,

    /// Collection holding Person documents.
    ///
    /// Environment variable: `MONGO_COLLECTION`
    #[arg(long, env = "MONGO_COLLECTION", default_value_t = String::from("stet"))]
    pub collection: String,

    /// How long startup may spend establishing the store connection before
    /// giving up.
    ///
    /// Environment variable: `CONNECT_TIMEOUT_MS`
    #[arg(long, env = "CONNECT_TIMEOUT_MS", default_value_t = 5_000)]
    pub connect_timeout_ms: u64,

    /// Upper bound on closing the store connection during shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT_MS`
    #[arg(long, env = "SHUTDOWN_TIMEOUT_MS", default_value_t = 5_000)]
    pub shutdown_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: SocketAddr,
    pub store: StoreBackend,
    pub mongo: MongoConfig,
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Configuration for a memory-backed server bound to `server_addr`.
    pub fn in_memory(server_addr: SocketAddr) -> Self {
        Self {
            server_addr,
            store: StoreBackend::Memory,
            mongo: MongoConfig {
                uri: String::new(),
                database: String::new(),
                collection: String::new(),
                connect_timeout: Duration::from_secs(5),
            },
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let server_addr: SocketAddr = args
            .server_addr
            .parse()
            .with_context(|| format!("SERVER_ADDR ({}) is not a socket address", args.server_addr))?;

        if args.connect_timeout_ms == 0 {
            bail!("CONNECT_TIMEOUT_MS must be greater than 0");
        }

        if args.shutdown_timeout_ms == 0 {
            bail!("SHUTDOWN_TIMEOUT_MS must be greater than 0");
        }

        if args.store == StoreBackend::Mongo {
            if args.mongo_uri.trim().is_empty() {
                bail!("MONGO_URI must not be empty");
            }
            if args.database.trim().is_empty() {
                bail!("MONGO_DATABASE must not be empty");
            }
            if args.collection.trim().is_empty() {
                bail!("MONGO_COLLECTION must not be empty");
            }
        }

        Ok(Self {
            server_addr,
            store: args.store,
            mongo: MongoConfig {
                uri: args.mongo_uri,
                database: args.database,
                collection: args.collection,
                connect_timeout: Duration::from_millis(args.connect_timeout_ms),
            },
            shutdown_timeout: Duration::from_millis(args.shutdown_timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};

    /// Parses `extra` as the command line with every `env =` lookup removed,
    /// so variables set in the surrounding shell cannot leak in.
    fn parse_args(extra: &[&str]) -> Result<CliArgs, clap::Error> {
        let argv = std::iter::once("stet-server").chain(extra.iter().copied());
        let matches = CliArgs::command()
            .mut_args(|arg| arg.env(None::<&str>))
            .try_get_matches_from(argv)?;
        CliArgs::from_arg_matches(&matches)
    }

    fn parse(extra: &[&str]) -> anyhow::Result<ServerConfig> {
        ServerConfig::try_from(parse_args(extra)?)
    }

    #[test]
    fn defaults_target_local_mongo() {
        let config = parse(&[]).unwrap();

        assert_eq!(config.server_addr, "0.0.0.0:50051".parse().unwrap());
        assert_eq!(config.store, StoreBackend::Mongo);
        assert_eq!(config.mongo.uri, "mongodb://localhost:27017");
        assert_eq!(config.mongo.database, "mydb");
        assert_eq!(config.mongo.collection, "stet");
        assert_eq!(config.mongo.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--server-addr",
            "127.0.0.1:6000",
            "--mongo-uri",
            "mongodb://db:27017",
            "--collection",
            "people",
            "--connect-timeout-ms",
            "250",
        ])
        .unwrap();

        assert_eq!(config.server_addr, "127.0.0.1:6000".parse().unwrap());
        assert_eq!(config.mongo.uri, "mongodb://db:27017");
        assert_eq!(config.mongo.collection, "people");
        assert_eq!(config.mongo.connect_timeout, Duration::from_millis(250));
    }

    #[test]
    fn memory_backend_ignores_mongo_settings() {
        let config = parse(&["--store", "memory", "--database", ""]).unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
    }

    #[test]
    fn rejects_unparseable_listen_address() {
        let err = parse(&["--server-addr", "localhost"]).unwrap_err();
        assert!(err.to_string().contains("SERVER_ADDR"));
    }

    #[test]
    fn rejects_zero_timeouts() {
        assert!(parse(&["--connect-timeout-ms", "0"]).is_err());
        assert!(parse(&["--shutdown-timeout-ms", "0"]).is_err());
    }

    #[test]
    fn rejects_empty_collection_for_mongo() {
        let err = parse(&["--store", "mongo", "--collection", " "]).unwrap_err();
        assert!(err.to_string().contains("MONGO_COLLECTION"));
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(parse_args(&["--store", "redis"]).is_err());
    }
}
