//! Trial masters, one per dojo level.

pub mod delta_factor;
pub mod hints;
pub mod traits;

use std::sync::Arc;

pub use delta_factor::DeltaFactorMaster;
pub use hints::HintsMaster;
pub use traits::{ChallengeContext, Master};

use crate::domain::ports::{DeltaEstimator, ReferenceDatabase, WorkflowFactory};

/// The built-in masters in level order.
pub fn builtin_masters(
    hints_factory: Arc<dyn WorkflowFactory>,
    delta_factory: Arc<dyn WorkflowFactory>,
    database: Arc<dyn ReferenceDatabase>,
    estimator: Arc<dyn DeltaEstimator>,
    reference_code: impl Into<String>,
) -> Vec<Arc<dyn Master>> {
    vec![
        Arc::new(HintsMaster::new(hints_factory)),
        Arc::new(DeltaFactorMaster::new(
            delta_factory,
            database,
            estimator,
            reference_code,
        )),
    ]
}
