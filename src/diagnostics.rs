//! # Diagnostics
//!
//! The warning sink shared across the pipeline. Each named warning runs in
//! one of three modes (off, warn, error); parse phases additionally
//! accumulate hard user errors and abort at the phase boundary when any
//! were reported.
//!
//! Option resolution is two-phase: the full command line is collected
//! first, then applied here with specific settings overriding general ones
//! regardless of the order they appeared in.

use crate::errors::CompileError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarningMode {
    Off,
    Warn,
    Err,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Warning {
    ColorPrecisionLoss,
    KeyFrameDidNotAppear,
    UsedTrueColorMode,
    AttributeFormatMismatch,
    MissingAttributesCsv,
    MissingBehaviorsHeader,
    UnusedAttribute,
}

pub const ALL_WARNINGS: [Warning; 7] = [
    Warning::ColorPrecisionLoss,
    Warning::KeyFrameDidNotAppear,
    Warning::UsedTrueColorMode,
    Warning::AttributeFormatMismatch,
    Warning::MissingAttributesCsv,
    Warning::MissingBehaviorsHeader,
    Warning::UnusedAttribute,
];

impl Warning {
    pub fn name(&self) -> &'static str {
        match self {
            Warning::ColorPrecisionLoss => "color-precision-loss",
            Warning::KeyFrameDidNotAppear => "key-frame-did-not-appear",
            Warning::UsedTrueColorMode => "used-true-color-mode",
            Warning::AttributeFormatMismatch => "attribute-format-mismatch",
            Warning::MissingAttributesCsv => "missing-attributes-csv",
            Warning::MissingBehaviorsHeader => "missing-behaviors-header",
            Warning::UnusedAttribute => "unused-attribute",
        }
    }

    pub fn from_name(name: &str) -> Option<Warning> {
        ALL_WARNINGS.iter().copied().find(|w| w.name() == name)
    }

    fn slot(&self) -> usize {
        match self {
            Warning::ColorPrecisionLoss => 0,
            Warning::KeyFrameDidNotAppear => 1,
            Warning::UsedTrueColorMode => 2,
            Warning::AttributeFormatMismatch => 3,
            Warning::MissingAttributesCsv => 4,
            Warning::MissingBehaviorsHeader => 5,
            Warning::UnusedAttribute => 6,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostics {
    modes: [WarningMode; ALL_WARNINGS.len()],
    warn_count: usize,
    err_count: usize,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics::new()
    }
}

impl Diagnostics {
    /// All warnings start disabled; `-Wall` or specific flags enable them.
    pub fn new() -> Self {
        Diagnostics {
            modes: [WarningMode::Off; ALL_WARNINGS.len()],
            warn_count: 0,
            err_count: 0,
        }
    }

    pub fn set_all(&mut self, mode: WarningMode) {
        self.modes = [mode; ALL_WARNINGS.len()];
    }

    pub fn set(&mut self, warning: Warning, mode: WarningMode) {
        self.modes[warning.slot()] = mode;
    }

    pub fn mode(&self, warning: Warning) -> WarningMode {
        self.modes[warning.slot()]
    }

    pub fn promote_enabled_to_errors(&mut self) {
        for mode in self.modes.iter_mut() {
            if *mode == WarningMode::Warn {
                *mode = WarningMode::Err;
            }
        }
    }

    /// Report a flagged condition through its configured mode.
    pub fn warn(&mut self, warning: Warning, message: &str) {
        match self.mode(warning) {
            WarningMode::Off => {}
            WarningMode::Warn => {
                eprintln!("warning: {} [-W{}]", message, warning.name());
                self.warn_count += 1;
            }
            WarningMode::Err => {
                eprintln!("error: {} [-Werror={}]", message, warning.name());
                self.err_count += 1;
            }
        }
    }

    /// Report a hard user error. Parse phases keep going so every problem
    /// in the input surfaces in one run.
    pub fn user_error(&mut self, message: &str) {
        eprintln!("error: {}", message);
        self.err_count += 1;
    }

    pub fn err_count(&self) -> usize {
        self.err_count
    }

    pub fn warn_count(&self) -> usize {
        self.warn_count
    }

    /// Phase boundary: abort when anything was reported as an error.
    pub fn check_phase(&self, phase: &str) -> Result<(), CompileError> {
        if self.err_count > 0 {
            return Err(CompileError::UserErrors {
                phase: phase.to_string(),
                count: self.err_count,
            });
        }
        Ok(())
    }
}

/// Apply collected `-W` option values. Precedence is positional-independent:
/// `all`/`none` first, then specific enables/disables, then specific
/// `error=`, then the blanket `error` promotion, and finally `no-error=`
/// downgrades (back to WARN).
pub fn resolve_warning_options(diags: &mut Diagnostics, specs: &[String]) -> Result<(), String> {
    let mut enable_all = false;
    let mut disable_all = false;
    let mut all_errors = false;
    let mut enables: Vec<Warning> = Vec::new();
    let mut disables: Vec<Warning> = Vec::new();
    let mut errors: Vec<Warning> = Vec::new();
    let mut no_errors: Vec<Warning> = Vec::new();

    for spec in specs {
        match spec.as_str() {
            "all" => enable_all = true,
            "none" => disable_all = true,
            "error" => all_errors = true,
            other => {
                if let Some(name) = other.strip_prefix("error=") {
                    errors.push(
                        Warning::from_name(name)
                            .ok_or_else(|| format!("unknown warning '{}'", name))?,
                    );
                } else if let Some(name) = other.strip_prefix("no-error=") {
                    no_errors.push(
                        Warning::from_name(name)
                            .ok_or_else(|| format!("unknown warning '{}'", name))?,
                    );
                } else if let Some(name) = other.strip_prefix("no-") {
                    disables.push(
                        Warning::from_name(name)
                            .ok_or_else(|| format!("unknown warning '{}'", name))?,
                    );
                } else {
                    enables.push(
                        Warning::from_name(other)
                            .ok_or_else(|| format!("unknown warning '{}'", other))?,
                    );
                }
            }
        }
    }

    if enable_all {
        diags.set_all(WarningMode::Warn);
    }
    if disable_all {
        diags.set_all(WarningMode::Off);
    }
    for w in enables {
        diags.set(w, WarningMode::Warn);
    }
    for w in disables {
        diags.set(w, WarningMode::Off);
    }
    for w in errors {
        diags.set(w, WarningMode::Err);
    }
    if all_errors {
        diags.promote_enabled_to_errors();
    }
    for w in no_errors {
        if diags.mode(w) == WarningMode::Err {
            diags.set(w, WarningMode::Warn);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(specs: &[&str]) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let specs: Vec<String> = specs.iter().map(|s| s.to_string()).collect();
        resolve_warning_options(&mut diags, &specs).unwrap();
        diags
    }

    #[test]
    fn warnings_default_off() {
        let mut diags = Diagnostics::new();
        diags.warn(Warning::ColorPrecisionLoss, "ignored");
        assert_eq!(diags.warn_count(), 0);
        assert_eq!(diags.err_count(), 0);
    }

    #[test]
    fn wall_enables_everything() {
        let diags = resolved(&["all"]);
        for w in ALL_WARNINGS {
            assert_eq!(diags.mode(w), WarningMode::Warn);
        }
    }

    #[test]
    fn specific_disable_beats_wall_regardless_of_order() {
        let diags = resolved(&["no-unused-attribute", "all"]);
        assert_eq!(diags.mode(Warning::UnusedAttribute), WarningMode::Off);
        assert_eq!(diags.mode(Warning::ColorPrecisionLoss), WarningMode::Warn);
    }

    #[test]
    fn werror_promotes_only_enabled_warnings() {
        let diags = resolved(&["color-precision-loss", "error"]);
        assert_eq!(diags.mode(Warning::ColorPrecisionLoss), WarningMode::Err);
        assert_eq!(diags.mode(Warning::UnusedAttribute), WarningMode::Off);
    }

    #[test]
    fn no_error_downgrades_after_blanket_promotion() {
        let diags = resolved(&["all", "error", "no-error=unused-attribute"]);
        assert_eq!(diags.mode(Warning::UnusedAttribute), WarningMode::Warn);
        assert_eq!(diags.mode(Warning::ColorPrecisionLoss), WarningMode::Err);
    }

    #[test]
    fn unknown_warning_name_is_rejected() {
        let mut diags = Diagnostics::new();
        let err = resolve_warning_options(&mut diags, &["bogus-warning".to_string()]);
        assert!(err.is_err());
    }

    #[test]
    fn phase_check_aborts_on_accumulated_errors() {
        let mut diags = Diagnostics::new();
        diags.user_error("bad row");
        diags.user_error("worse row");
        let err = diags.check_phase("attributes parse").unwrap_err();
        assert_eq!(err.to_string(), "attributes parse failed with 2 error(s)");
    }
}
