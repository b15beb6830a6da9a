//! Regras de consistência entre campos do formulário

use crate::error::ValidationError;
use crate::models::{LossReason, VolumeLoss};

/// `Motivo_Perda` é `N/A` exatamente quando não houve perda de volume.
pub fn check_loss_reason(volume_loss: VolumeLoss, loss_reason: LossReason) -> Result<(), ValidationError> {
    match (volume_loss, loss_reason) {
        (VolumeLoss::Yes, LossReason::NotApplicable) => Err(ValidationError::MissingLossReason),
        (VolumeLoss::No, reason) if reason.is_reason() => Err(ValidationError::UnexpectedLossReason {
            reason: reason.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_combination() {
        for reason in LossReason::ALL {
            let without_loss = check_loss_reason(VolumeLoss::No, *reason);
            let with_loss = check_loss_reason(VolumeLoss::Yes, *reason);
            if reason.is_reason() {
                assert!(without_loss.is_err(), "{reason} sem perda deveria falhar");
                assert!(with_loss.is_ok(), "{reason} com perda deveria passar");
            } else {
                assert!(without_loss.is_ok());
                assert_eq!(with_loss, Err(ValidationError::MissingLossReason));
            }
        }
    }
}
