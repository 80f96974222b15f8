//! Ordered, fail-fast execution of provisioning steps.
//!
//! The sequencer runs each step exactly once, in the order given, and stops
//! at the first failure. Steps that already completed are NOT undone:
//! partitioning and encryption destroy the previous disk contents, so a
//! failed run leaves the disk in whatever state the last successful step
//! produced and the installation has to be restarted from the beginning.

use anyhow::Result;
use tracing::{debug, info};

use crate::error::CryptstrapError;

type Action<'a> = Box<dyn FnOnce() -> Result<()> + 'a>;

/// One named, irreversible provisioning action.
pub struct ProvisioningStep<'a> {
    name: String,
    action: Action<'a>,
}

impl<'a> ProvisioningStep<'a> {
    /// Creates a step from its name and action.
    pub fn new(name: impl Into<String>, action: impl FnOnce() -> Result<()> + 'a) -> Self {
        Self {
            name: name.into(),
            action: Box::new(action),
        }
    }

    /// Returns the step name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for ProvisioningStep<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningStep").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Runs a fixed sequence of provisioning steps.
#[derive(Debug, Default)]
pub struct StepSequencer<'a> {
    steps: Vec<ProvisioningStep<'a>>,
}

impl<'a> StepSequencer<'a> {
    /// Creates a sequencer over `steps`; their order is the execution order.
    pub fn new(steps: Vec<ProvisioningStep<'a>>) -> Self {
        Self { steps }
    }

    /// Returns true if there are no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns the step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(ProvisioningStep::name).collect()
    }

    /// Runs every step in order.
    ///
    /// On the first failing step returns `StepFailure` carrying that step's
    /// name and error; no later step is attempted and nothing is rolled back.
    pub fn run(self) -> Result<(), CryptstrapError> {
        let total = self.steps.len();
        info!("starting provisioning sequence with {} step(s)", total);

        for (index, step) in self.steps.into_iter().enumerate() {
            let ProvisioningStep { name, action } = step;
            info!("running step {}/{}: {}", index + 1, total, name);
            if let Err(e) = action() {
                tracing::error!(
                    step = %name,
                    "step failed; {} remaining step(s) skipped, completed steps are not rolled back",
                    total - index - 1
                );
                return Err(CryptstrapError::step_failure(name, e));
            }
            debug!("step {} completed", name);
        }

        info!("provisioning sequence completed successfully");
        Ok(())
    }
}
