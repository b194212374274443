//! Formatted output helpers for CLI commands.
//!
//! Plans and copy reports go to stdout; progress goes through `tracing`.

use std::path::Path;
use std::time::Duration;

use imgsync_core::SyncPair;
use imgsync_core::executor::{CopyReport, CopyStatus};
use imgsync_core::plan::Plan;
use serde::Serialize;

/// Workflow command that hides `value` in GitHub Actions logs.
fn mask_command(value: &str, in_actions: bool) -> Option<String> {
    (in_actions && !value.is_empty()).then(|| format!("::add-mask::{value}"))
}

/// Registers `value` as a secret when running inside GitHub Actions.
pub fn mask_secret(value: &str) {
    let in_actions = std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true");
    if let Some(line) = mask_command(value, in_actions) {
        println!("{line}");
    }
}

/// Formats a duration as seconds with one decimal (e.g., "12.3s").
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}

/// Prints a human-readable plan.
pub fn print_plan(images_file: &Path, plan: &Plan) {
    println!("Sync Plan for: {}", images_file.display());
    println!("{}", "\u{2550}".repeat(35));
    println!();

    let mut total = 0;
    for key_plan in &plan.keys {
        println!("  {} [{}]", key_plan.key, key_plan.descriptor);
        match &key_plan.result {
            Ok(pairs) => {
                total += pairs.len();
                for pair in pairs {
                    println!(
                        "      {} -> {}",
                        pair.original_source(),
                        pair.original_destination()
                    );
                }
            }
            Err(e) => println!("      ! {e}"),
        }
    }

    println!();
    println!("  {total} pair(s) will be copied.");
    let failed = plan.failed_keys();
    if failed > 0 {
        println!("  {failed} key(s) could not be resolved.");
    }
}

#[derive(Serialize)]
struct KeyRow<'a> {
    key: &'a str,
    descriptor: String,
    pairs: &'a [SyncPair],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn plan_rows(plan: &Plan) -> Vec<KeyRow<'_>> {
    plan.keys
        .iter()
        .map(|key_plan| {
            let (pairs, error) = match &key_plan.result {
                Ok(pairs) => (pairs.as_slice(), None),
                Err(e) => (&[][..], Some(e.to_string())),
            };
            KeyRow {
                key: &key_plan.key,
                descriptor: key_plan.descriptor.to_string(),
                pairs,
                error,
            }
        })
        .collect()
}

/// Prints the plan as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print_plan_json(plan: &Plan) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&plan_rows(plan))?);
    Ok(())
}

/// Prints the outcome of a copy run.
pub fn print_report(report: &CopyReport, elapsed: Duration) {
    println!("Sync Summary:");
    for (index, outcome) in report.outcomes.iter().enumerate() {
        let mark = match outcome.status {
            CopyStatus::Succeeded => "ok",
            CopyStatus::Failed { .. } => "FAILED",
        };
        println!(
            "  [{}/{}] {mark:<6} {}",
            index + 1,
            report.outcomes.len(),
            outcome.pair.summary()
        );
        if let CopyStatus::Failed { diagnostic } = &outcome.status {
            for line in diagnostic.lines() {
                println!("           {line}");
            }
        }
    }
    println!(
        "  {} copied, {} failed in {}",
        report.succeeded(),
        report.failures().count(),
        format_duration(elapsed)
    );
}

#[cfg(test)]
mod tests {
    use imgsync_common::error::ImgsyncError;
    use imgsync_core::classify;
    use imgsync_core::pair::cartesian;
    use imgsync_core::plan::KeyPlan;

    use super::*;

    #[test]
    fn mask_command_only_inside_actions() {
        assert_eq!(
            mask_command("s3cret", true).as_deref(),
            Some("::add-mask::s3cret")
        );
        assert_eq!(mask_command("s3cret", false), None);
    }

    #[test]
    fn mask_command_skips_empty_values() {
        assert_eq!(mask_command("", true), None);
    }

    #[test]
    fn format_duration_uses_one_decimal() {
        assert_eq!(format_duration(Duration::from_millis(12_345)), "12.3s");
    }

    #[test]
    fn plan_rows_carry_pairs_and_errors() {
        let plan = Plan {
            keys: vec![
                KeyPlan {
                    key: "nginx:1".into(),
                    descriptor: classify("nginx:1"),
                    result: Ok(cartesian(&["nginx:1"], &["m/nginx"])),
                },
                KeyPlan {
                    key: "ghost".into(),
                    descriptor: classify("ghost"),
                    result: Err(ImgsyncError::ImageNotFound {
                        image: "ghost".into(),
                    }),
                },
            ],
        };
        let json = serde_json::to_value(plan_rows(&plan)).expect("should serialize");
        assert_eq!(json[0]["pairs"][0]["source"], "docker://nginx:1");
        assert!(json[0].get("error").is_none());
        assert_eq!(json[1]["error"], "image ghost not found");
        assert_eq!(json[1]["pairs"].as_array().map(Vec::len), Some(0));
    }
}
