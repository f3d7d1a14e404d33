//! Console reporter: human-readable output with color codes.

use canon_core::types::{ArtifactKind, FindingKind, VerificationReport};

use super::Reporter;

/// Console reporter for human-readable terminal output.
pub struct ConsoleReporter {
    pub use_color: bool,
}

impl ConsoleReporter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn kind_prefix(&self, kind: &FindingKind) -> &'static str {
        match kind {
            FindingKind::Missing => "missing",
            FindingKind::Shadow => "shadow",
            FindingKind::SeverityMismatch => "severity",
            FindingKind::CategoryMismatch => "category",
            FindingKind::MatrixMisaligned => "matrix",
        }
    }

    fn color_start(&self, kind: &FindingKind) -> &'static str {
        if !self.use_color {
            return "";
        }
        match kind {
            FindingKind::Missing => "\x1b[31m",           // red
            FindingKind::Shadow => "\x1b[35m",            // magenta
            FindingKind::SeverityMismatch => "\x1b[33m",  // yellow
            FindingKind::CategoryMismatch => "\x1b[33m",  // yellow
            FindingKind::MatrixMisaligned => "\x1b[31m",  // red
        }
    }

    fn color_end(&self) -> &'static str {
        if self.use_color {
            "\x1b[0m"
        } else {
            ""
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Reporter for ConsoleReporter {
    fn name(&self) -> &'static str {
        "console"
    }

    fn generate(&self, report: &VerificationReport) -> Result<String, String> {
        let mut output = String::new();

        output.push_str("╔══════════════════════════════════════════╗\n");
        output.push_str("║        Canon Verification Report         ║\n");
        output.push_str("╚══════════════════════════════════════════╝\n\n");

        output.push_str(&format!(
            "canonical rules: {} ({} matrix)\n\n",
            report.canonical_rule_count, report.matrix
        ));

        for kind in ArtifactKind::ALL {
            let coverage = report.artifact_coverage.get(&kind).copied().unwrap_or(0.0);
            let symbol = if coverage >= 100.0 { "✓" } else { "✗" };
            output.push_str(&format!(
                "{symbol} {kind:<9} — coverage {coverage:.1}%\n"
            ));
        }
        output.push('\n');

        for finding in &report.findings {
            let cs = self.color_start(&finding.kind);
            let ce = self.color_end();
            let prefix = self.kind_prefix(&finding.kind);
            let artifact = finding.artifact_kind.map(|a| a.as_str()).unwrap_or("-");
            let rule = finding.rule_id.as_ref().map(|r| r.as_str()).unwrap_or("-");
            output.push_str(&format!(
                "  {cs}{prefix}{ce}: {artifact}: {rule}: {}\n",
                finding.detail
            ));
        }

        for warning in &report.extraction_warnings {
            output.push_str(&format!("  ⚠ {warning}\n"));
        }

        if !report.findings.is_empty() || !report.extraction_warnings.is_empty() {
            output.push('\n');
        }

        output.push_str(&format!(
            "─── Score: {:.1}  Tier: {} ───\n",
            report.overall_score,
            report.certification_tier.as_str().to_uppercase()
        ));

        if report.findings.is_empty() {
            output.push_str("Result: CONSISTENT ✓\n");
        } else {
            output.push_str(&format!(
                "Result: {} findings ✗\n",
                report.findings.len()
            ));
        }

        Ok(output)
    }
}
