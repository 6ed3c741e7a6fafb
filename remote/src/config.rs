use crate::RemoteResult;
use anyhow::Context;
use std::env;

/// Connection details for the deployment server, read from the environment.
///
/// In CI these come from the pipeline's secret store; locally a `.env` file
/// (see `.env.example`) is loaded first. The password is plaintext by design
/// of this demo pipeline — see the repository non-goals.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
    /// Remote base directory holding `staging/` and `prod/`.
    pub base_path: String,
    pub port: u16,
}

impl DeployConfig {
    /// Load all connection settings, failing with the variable name when one
    /// is missing.
    pub fn from_env() -> RemoteResult<Self> {
        // A missing .env file is fine; CI provides real environment variables.
        let _ = dotenvy::dotenv();

        Ok(Self {
            hostname: require("DEPLOY_SERVER_HOSTNAME")?,
            username: require("DEPLOY_SERVER_USERNAME")?,
            password: require("DEPLOY_SERVER_PASSWORD")?,
            base_path: require("DEPLOY_SERVER_PATH")?,
            port: port_from_env()?,
        })
    }
}

/// The smoke-test stage only needs the hostname, not full credentials.
pub fn hostname_from_env() -> RemoteResult<String> {
    let _ = dotenvy::dotenv();
    require("DEPLOY_SERVER_HOSTNAME")
}

fn require(name: &str) -> RemoteResult<String> {
    env::var(name).with_context(|| format!("environment variable {name} is not set"))
}

fn port_from_env() -> RemoteResult<u16> {
    match env::var("DEPLOY_SERVER_PORT") {
        Ok(value) => value
            .parse()
            .with_context(|| format!("DEPLOY_SERVER_PORT is not a valid port: {value}")),
        Err(_) => Ok(22),
    }
}
