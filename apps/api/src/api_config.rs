use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rolegraph_core::AppError;
use tracing_subscriber::EnvFilter;

/// Verb the binary was started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCommand {
    Serve,
    Migrate,
    Seed,
}

impl ApiCommand {
    fn parse(argument: Option<&str>) -> Result<Self, AppError> {
        match argument {
            None | Some("serve") => Ok(Self::Serve),
            Some("migrate") => Ok(Self::Migrate),
            Some("seed") => Ok(Self::Seed),
            Some(other) => Err(AppError::Validation(format!(
                "unknown command '{other}', expected 'serve', 'migrate' or 'seed'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionCacheBackend {
    InMemory,
    Redis,
    Disabled,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub command: ApiCommand,
    pub database_url: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub super_role_name: String,
    pub permission_cache_backend: PermissionCacheBackend,
    pub permission_cache_ttl_seconds: u32,
    pub redis_url: Option<String>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let command = ApiCommand::parse(env::args().nth(1).as_deref())?;
        Self::from_lookup(command, |name| env::var(name).ok())
    }

    fn from_lookup<F>(command: ApiCommand, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = required_non_empty(&lookup, "DATABASE_URL")?;
        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let super_role_name = lookup("SUPER_ROLE_NAME")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "super_admin".to_owned());

        let permission_cache_backend = match lookup("PERMISSION_CACHE_BACKEND")
            .unwrap_or_else(|| "in_memory".to_owned())
            .as_str()
        {
            "in_memory" => PermissionCacheBackend::InMemory,
            "redis" => PermissionCacheBackend::Redis,
            "disabled" => PermissionCacheBackend::Disabled,
            other => {
                return Err(AppError::Validation(format!(
                    "PERMISSION_CACHE_BACKEND must be 'in_memory', 'redis' or 'disabled', got '{other}'"
                )));
            }
        };

        let permission_cache_ttl_seconds = match lookup("PERMISSION_CACHE_TTL_SECONDS") {
            Some(value) => value.parse::<u32>().map_err(|error| {
                AppError::Validation(format!("invalid PERMISSION_CACHE_TTL_SECONDS: {error}"))
            })?,
            None => 60,
        };

        let redis_url = lookup("REDIS_URL").filter(|value| !value.trim().is_empty());

        Ok(Self {
            command,
            database_url,
            frontend_url,
            api_host,
            api_port,
            super_role_name,
            permission_cache_backend,
            permission_cache_ttl_seconds,
            redis_url,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }

    pub fn requires_redis(&self) -> bool {
        self.permission_cache_backend == PermissionCacheBackend::Redis
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty<F>(lookup: &F, name: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
