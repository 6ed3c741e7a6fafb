//! Deployment-host plumbing for the pipeline: environment-based
//! credentials, SFTP transfer of model directories, and remote shell
//! execution over SSH.
//!
//! All sessions are password-authenticated and skip host-key verification,
//! matching how the CI pipeline connects to its disposable staging host.
//! Do not reuse this crate against hosts you care about.

mod config;
mod paths;
mod session;
mod shell;

pub use config::{DeployConfig, hostname_from_env};
pub use paths::{prod_relative, staging_path};
pub use session::RemoteSession;
pub use shell::{deploy_command, deploy_commands, join_fail_fast};

/// Crate-wide result type.
pub type RemoteResult<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_path_is_exact_concatenation() {
        assert_eq!(staging_path("/srv/models", "3"), "/srv/models/staging/3");
        // The version is used verbatim; no normalization happens here.
        assert_eq!(staging_path("/srv/models", " 3"), "/srv/models/staging/ 3");
    }

    #[test]
    fn prod_relative_is_rooted_at_the_base_dir() {
        assert_eq!(prod_relative("7"), "./prod/7");
    }

    #[test]
    fn deploy_command_preserves_order_with_fail_fast_joiner() {
        let command = deploy_command("/srv/models", "3", "model_serving");

        let rm = command.find(r#"rm -rf "./prod/3""#).expect("rm present");
        let cp = command
            .find(r#"cp -r "/srv/models/staging/3" ./prod"#)
            .expect("cp present");
        assert!(rm < cp, "rm must run before cp");
        assert!(command.contains(" && "));
        assert!(command.starts_with("docker ps -q"));
        assert!(command.ends_with("docker restart model_serving"));
    }

    #[test]
    fn deploy_commands_stop_change_dir_replace_restart() {
        let commands = deploy_commands("/srv/models", "12", "model_serving");
        assert_eq!(commands.len(), 5);
        assert_eq!(commands[1], r#"cd "/srv/models""#);
        assert_eq!(commands[2], r#"rm -rf "./prod/12""#);
        assert_eq!(commands[3], r#"cp -r "/srv/models/staging/12" ./prod"#);
    }

    #[test]
    fn join_fail_fast_uses_double_ampersand() {
        let joined = join_fail_fast(&["a".to_string(), "b".to_string()]);
        assert_eq!(joined, "a && b");
    }
}
