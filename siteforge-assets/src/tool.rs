//! External tool invocation (stylesheet compiler, image optimiser).
//!
//! A tool is configured as an argv list. The placeholders `{input}` and
//! `{output}` are replaced in every argument before the command runs.

use std::path::Path;
use std::process::Command;

use crate::error::AssetError;

pub const INPUT_PLACEHOLDER: &str = "{input}";
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Substitute placeholders in every argument.
pub fn resolve_args(template: &[String], input: &Path, output: &Path) -> Vec<String> {
    let input = input.display().to_string();
    let output = output.display().to_string();
    template
        .iter()
        .map(|arg| {
            arg.replace(INPUT_PLACEHOLDER, &input)
                .replace(OUTPUT_PLACEHOLDER, &output)
        })
        .collect()
}

/// Run `template` with `input`/`output` substituted, in `cwd`.
///
/// A non-zero exit is an error carrying the tool's stderr. Stderr from a
/// successful run is logged as a warning.
pub fn run_tool(
    template: &[String],
    input: &Path,
    output: &Path,
    cwd: &Path,
) -> Result<(), AssetError> {
    let args = resolve_args(template, input, output);
    let Some((program, rest)) = args.split_first() else {
        return Err(AssetError::ToolFailed {
            program: String::new(),
            status: "not configured".into(),
            stderr: "empty command".into(),
        });
    };

    tracing::debug!("running: {}", args.join(" "));
    let out = Command::new(program)
        .args(rest)
        .current_dir(cwd)
        .output()
        .map_err(|source| AssetError::ToolSpawn {
            program: program.clone(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
    if !out.status.success() {
        return Err(AssetError::ToolFailed {
            program: program.clone(),
            status: out.status.to_string(),
            stderr,
        });
    }
    if !stderr.is_empty() {
        tracing::warn!("{program}: {stderr}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn placeholders_are_substituted_everywhere() {
        let template = vec![
            "sass".to_string(),
            "--no-source-map".to_string(),
            "{input}:{output}".to_string(),
        ];
        let args = resolve_args(
            &template,
            &PathBuf::from("src/assets/css/styles.scss"),
            &PathBuf::from("build/css/styles.css"),
        );
        assert_eq!(args[2], "src/assets/css/styles.scss:build/css/styles.css");
        assert_eq!(args[1], "--no-source-map");
    }

    #[test]
    fn empty_command_is_an_error() {
        let err = run_tool(&[], Path::new("a"), Path::new("b"), Path::new(".")).unwrap_err();
        assert!(matches!(err, AssetError::ToolFailed { .. }));
    }

    #[test]
    fn unknown_program_fails_to_spawn() {
        let template = vec!["siteforge-no-such-tool-xyz".to_string()];
        let err = run_tool(&template, Path::new("a"), Path::new("b"), Path::new(".")).unwrap_err();
        assert!(matches!(err, AssetError::ToolSpawn { .. }), "got: {err}");
    }

    #[test]
    #[cfg(unix)]
    fn failing_tool_reports_stderr() {
        let template = vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo broken >&2; exit 3".to_string(),
        ];
        let err = run_tool(&template, Path::new("a"), Path::new("b"), Path::new(".")).unwrap_err();
        match err {
            AssetError::ToolFailed { stderr, .. } => assert_eq!(stderr, "broken"),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn stderr_on_success_is_not_an_error() {
        let template = vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo deprecated >&2".to_string(),
        ];
        run_tool(&template, Path::new("a"), Path::new("b"), Path::new(".")).unwrap();
    }
}
