//! Response objects handlers write their results and diagnostics into.
//!
//! Every response owns a [`Diagnostics`] collection; appending an error
//! entry is how an operation fails. The dispatch layer pre-populates state
//! fields where an operation starts from existing data (read keeps the
//! prior state, modify-plan starts from the host's proposed plan).

use crate::data::State;
use crate::diag::Diagnostics;
use crate::schema::Schema;
use crate::types::AttributeChange;

/// Response from the provider's configure handler.
#[derive(Debug, Clone, Default)]
pub struct ConfigureProviderResponse {
    /// Diagnostics accumulated during configuration.
    pub diagnostics: Diagnostics,
}

/// Response from a resource's create handler.
#[derive(Debug, Clone)]
pub struct CreateResourceResponse {
    /// The state of the resource after creation. Starts null.
    pub state: State,
    /// Diagnostics accumulated during creation.
    pub diagnostics: Diagnostics,
}

impl CreateResourceResponse {
    /// An empty response for a resource with the given schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            state: State::new(schema),
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Response from a resource's read handler.
#[derive(Debug, Clone)]
pub struct ReadResourceResponse {
    /// The refreshed state. Starts as the prior state; a handler that sets
    /// it to null tells the host the resource no longer exists.
    pub state: State,
    /// Diagnostics accumulated during the read.
    pub diagnostics: Diagnostics,
}

impl ReadResourceResponse {
    /// A response pre-populated with the prior state.
    pub fn from_state(state: State) -> Self {
        Self {
            state,
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Response from a resource's update handler.
#[derive(Debug, Clone)]
pub struct UpdateResourceResponse {
    /// The state of the resource after the update. Starts null.
    pub state: State,
    /// Diagnostics accumulated during the update.
    pub diagnostics: Diagnostics,
}

impl UpdateResourceResponse {
    /// An empty response for a resource with the given schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            state: State::new(schema),
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Response from a resource's delete handler.
///
/// A delete with no error diagnostics removes the resource from state; there
/// is no state to return.
#[derive(Debug, Clone, Default)]
pub struct DeleteResourceResponse {
    /// Diagnostics accumulated during the delete.
    pub diagnostics: Diagnostics,
}

/// Response from a resource's modify-plan handler.
#[derive(Debug, Clone)]
pub struct ModifyResourcePlanResponse {
    /// The (possibly adjusted) planned state. Starts as the host's proposed
    /// plan.
    pub plan: State,
    /// Attribute changes the resource wants surfaced alongside the plan.
    pub changes: Vec<AttributeChange>,
    /// Attribute paths whose pending change requires the resource to be
    /// replaced rather than updated in place.
    pub requires_replace: Vec<String>,
    /// Diagnostics accumulated during planning.
    pub diagnostics: Diagnostics,
}

impl ModifyResourcePlanResponse {
    /// A response pre-populated with the host's proposed plan.
    pub fn from_plan(plan: State) -> Self {
        Self {
            plan,
            changes: Vec::new(),
            requires_replace: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Response from a resource's import handler.
#[derive(Debug, Clone)]
pub struct ImportResourceStateResponse {
    /// The imported state. Must hold enough for a subsequent read to fully
    /// refresh the resource. Starts null.
    pub state: State,
    /// Diagnostics accumulated during the import.
    pub diagnostics: Diagnostics,
}

impl ImportResourceStateResponse {
    /// An empty response for a resource with the given schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            state: State::new(schema),
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Response from a resource's state upgrade handler.
#[derive(Debug, Clone)]
pub struct UpgradeResourceStateResponse {
    /// The state rewritten to the current schema version. Starts null.
    pub state: State,
    /// Diagnostics accumulated during the upgrade.
    pub diagnostics: Diagnostics,
}

impl UpgradeResourceStateResponse {
    /// An empty response for a resource with the given schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            state: State::new(schema),
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Response from a data source's read handler.
#[derive(Debug, Clone)]
pub struct ReadDataSourceResponse {
    /// The data read from the external source. Starts null.
    pub state: State,
    /// Diagnostics accumulated during the read.
    pub diagnostics: Diagnostics,
}

impl ReadDataSourceResponse {
    /// An empty response for a data source with the given schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            state: State::new(schema),
            diagnostics: Diagnostics::new(),
        }
    }
}
