//! The lottery-number collaborator boundary. Applications normally arrive
//! with `lottery_number_quota` already populated; when a run is configured
//! to need a fallback and none is wired in, that's a configuration error,
//! not a silent default.

use crate::tables::ApplicationRow;
use sc_core::ScError;

pub trait LotteryGenerator {
    fn fill_missing(&self, applications: &mut [ApplicationRow]) -> Result<(), ScError>;
}

/// The default collaborator: always refuses. Any caller that needs lottery
/// numbers generated (rather than supplied in the input data) must provide
/// a real `LotteryGenerator` implementation.
pub struct NoLotteryGenerator;

impl LotteryGenerator for NoLotteryGenerator {
    fn fill_missing(&self, applications: &mut [ApplicationRow]) -> Result<(), ScError> {
        if applications.iter().any(|a| a.lottery_number_quota.is_none()) {
            return Err(ScError::ConfigError(
                "applications are missing lottery_number_quota and no lottery generator is configured".to_string(),
            ));
        }
        Ok(())
    }
}
