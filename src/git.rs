use std::process::Command;

/// Shells out to `git config --get <property>` (spec §4.6, §6: "External
/// processes: `git config --get <property>` for git functions. No other
/// process invocations.").
///
/// A failing subprocess (not a git repo, property unset, `git` missing) is a
/// soft failure: logs a warning and returns `None`, never an `Err` (spec §7).
pub fn config(property: &str) -> Option<String> {
    let output = match Command::new("git").arg("config").arg("--get").arg(property).output() {
        Ok(output) => output,
        Err(err) => {
            log::warn!("failed to run git config --get {}: {}", property, err);
            return None;
        }
    };

    if !output.status.success() {
        log::warn!("git config --get {} exited with {}", property, output.status);
        return None;
    }

    match String::from_utf8(output.stdout) {
        Ok(value) => Some(value.trim_end_matches('\n').to_string()),
        Err(err) => {
            log::warn!("git config --get {} produced non-UTF-8 output: {}", property, err);
            None
        }
    }
}
