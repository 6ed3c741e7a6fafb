use crate::paths::{prod_relative, staging_path};

/// The individual deployment commands, in execution order:
/// stop the serving container if running, enter the model root, drop any
/// existing copy of this version, promote staging to prod (copy, not move —
/// staging is kept as history), restart the container.
pub fn deploy_commands(base_path: &str, version: &str, container: &str) -> Vec<String> {
    vec![
        format!(
            "docker ps -q --filter name=\"{container}\" --filter status=\"running\" | xargs -r docker stop"
        ),
        format!("cd \"{base_path}\""),
        format!("rm -rf \"{}\"", prod_relative(version)),
        format!("cp -r \"{}\" ./prod", staging_path(base_path, version)),
        format!("docker restart {container}"),
    ]
}

/// Join commands with `&&` so the chain aborts on the first failure.
pub fn join_fail_fast(commands: &[String]) -> String {
    commands.join(" && ")
}

/// The full composite command executed over SSH by the deploy stage.
pub fn deploy_command(base_path: &str, version: &str, container: &str) -> String {
    join_fail_fast(&deploy_commands(base_path, version, container))
}
