//! Custom-resource scripts bundled with each workload kind.

use stackship_core::WorkloadKind;

/// A named custom-resource function whose body ships as a bundled template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomResource {
    name: &'static str,
}

const DYNAMIC_DESIRED_COUNT: CustomResource = CustomResource::new("DynamicDesiredCountFunction");
const ENV_CONTROLLER: CustomResource = CustomResource::new("EnvControllerFunction");
const RULE_PRIORITY: CustomResource = CustomResource::new("RulePriorityFunction");
const NLB_CUSTOM_DOMAIN: CustomResource = CustomResource::new("NLBCustomDomainFunction");
const NLB_CERT_VALIDATOR: CustomResource = CustomResource::new("NLBCertValidatorFunction");
const BACKLOG_PER_TASK: CustomResource = CustomResource::new("BacklogPerTaskCalculatorFunction");
const CUSTOM_DOMAIN: CustomResource = CustomResource::new("CustomDomainFunction");
const TRIGGER_STATE_MACHINE: CustomResource = CustomResource::new("TriggerStateMachineFunction");
const CERTIFICATE_VALIDATION: CustomResource = CustomResource::new("CertificateValidationFunction");

const LBWS: &[CustomResource] = &[
    DYNAMIC_DESIRED_COUNT,
    ENV_CONTROLLER,
    RULE_PRIORITY,
    NLB_CUSTOM_DOMAIN,
    NLB_CERT_VALIDATOR,
];
const BACKEND: &[CustomResource] = &[DYNAMIC_DESIRED_COUNT, ENV_CONTROLLER, RULE_PRIORITY];
const WORKER: &[CustomResource] = &[DYNAMIC_DESIRED_COUNT, BACKLOG_PER_TASK, ENV_CONTROLLER];
const RDWS: &[CustomResource] = &[ENV_CONTROLLER, CUSTOM_DOMAIN];
const SCHEDULED_JOB: &[CustomResource] = &[ENV_CONTROLLER];
const STATIC_SITE: &[CustomResource] = &[TRIGGER_STATE_MACHINE, CERTIFICATE_VALIDATION, CUSTOM_DOMAIN];

/// The custom resources a workload kind's stack references.
pub fn for_kind(kind: WorkloadKind) -> &'static [CustomResource] {
    match kind {
        WorkloadKind::LoadBalancedWebService => LBWS,
        WorkloadKind::BackendService => BACKEND,
        WorkloadKind::WorkerService => WORKER,
        WorkloadKind::RequestDrivenWebService => RDWS,
        WorkloadKind::ScheduledJob => SCHEDULED_JOB,
        WorkloadKind::StaticSite => STATIC_SITE,
    }
}

impl CustomResource {
    const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bundled template location, `custom-resources/<kebab-case-name>.js`.
    pub fn template_path(&self) -> String {
        format!("custom-resources/{}.js", kebab_case(self.name))
    }

    /// Logical name used in the content key.
    pub fn key_name(&self) -> String {
        self.name.to_lowercase()
    }
}

/// `NLBCertValidatorFunction` → `nlb-cert-validator-function`.
///
/// An uppercase letter starts a new word when it follows a lowercase letter,
/// or when it ends an acronym (is followed by a lowercase letter).
fn kebab_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev_lower = chars[i - 1].is_ascii_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev_lower || (chars[i - 1].is_ascii_uppercase() && next_lower) {
                out.push('-');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("EnvControllerFunction", "env-controller-function")]
    #[case("NLBCertValidatorFunction", "nlb-cert-validator-function")]
    #[case("NLBCustomDomainFunction", "nlb-custom-domain-function")]
    #[case("BacklogPerTaskCalculatorFunction", "backlog-per-task-calculator-function")]
    fn kebab_case_handles_acronyms(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(kebab_case(input), expected);
    }

    #[test]
    fn every_kind_has_custom_resources() {
        for kind in WorkloadKind::all() {
            assert!(!for_kind(*kind).is_empty(), "{kind} has none");
        }
    }

    #[test]
    fn key_name_is_lowercase() {
        assert_eq!(ENV_CONTROLLER.key_name(), "envcontrollerfunction");
        assert_eq!(
            ENV_CONTROLLER.template_path(),
            "custom-resources/env-controller-function.js"
        );
    }
}
