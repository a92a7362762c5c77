//! Tracking-subscription state machine.
//!
//! A monitored entity's standing subscription moves through four states.
//! The wire/storage values are the Portuguese labels used across the
//! platform (`pendente`, `ativo`, `pausado`, `erro`).
//!
//! ```text
//! pendente ──resolve ok──▶ ativo ◀──resume──▶ pausado
//!                            │
//!                subscription lost upstream
//!                            ▼
//!                          erro ──re-activate──▶ pendente
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status of a tracking subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingStatus {
    /// Created, no successful resolve yet.
    Pendente,
    /// At least one successful resolve; polled on schedule.
    Ativo,
    /// Operator-paused; no polling attempted while paused.
    Pausado,
    /// Subscription lost upstream; terminal until an operator re-activates.
    Erro,
}

impl TrackingStatus {
    /// Storage value as written to the `tracking_status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pendente => "pendente",
            Self::Ativo => "ativo",
            Self::Pausado => "pausado",
            Self::Erro => "erro",
        }
    }

    /// Parse a storage value back into a status.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "pendente" => Ok(Self::Pendente),
            "ativo" => Ok(Self::Ativo),
            "pausado" => Ok(Self::Pausado),
            "erro" => Ok(Self::Erro),
            other => Err(CoreError::Validation(format!(
                "unknown tracking status: {other}"
            ))),
        }
    }

    /// Whether a scheduled sync should poll this subscription at all.
    pub fn is_pollable(self) -> bool {
        matches!(self, Self::Pendente | Self::Ativo)
    }

    /// Validate a transition, returning the new status.
    pub fn transition_to(self, next: TrackingStatus) -> Result<TrackingStatus, CoreError> {
        let allowed = match (self, next) {
            // First successful resolve activates.
            (Self::Pendente, Self::Ativo) => true,
            // Active and paused are freely togglable by an operator.
            (Self::Ativo, Self::Pausado) | (Self::Pausado, Self::Ativo) => true,
            // A lost subscription can be hit from any pollable state.
            (Self::Pendente, Self::Erro) | (Self::Ativo, Self::Erro) => true,
            // Re-activation after error goes back through pending.
            (Self::Erro, Self::Pendente) => true,
            // No-op transitions are fine.
            (a, b) if a == b => true,
            _ => false,
        };

        if allowed {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition(format!(
                "tracking status cannot move from {} to {}",
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_activates_on_first_resolve() {
        let next = TrackingStatus::Pendente
            .transition_to(TrackingStatus::Ativo)
            .unwrap();
        assert_eq!(next, TrackingStatus::Ativo);
    }

    #[test]
    fn paused_subscription_is_not_pollable() {
        assert!(!TrackingStatus::Pausado.is_pollable());
        assert!(TrackingStatus::Pendente.is_pollable());
        assert!(TrackingStatus::Ativo.is_pollable());
        assert!(!TrackingStatus::Erro.is_pollable());
    }

    #[test]
    fn error_must_reactivate_through_pending() {
        assert!(TrackingStatus::Erro
            .transition_to(TrackingStatus::Ativo)
            .is_err());
        assert!(TrackingStatus::Erro
            .transition_to(TrackingStatus::Pendente)
            .is_ok());
    }

    #[test]
    fn paused_cannot_jump_to_error() {
        assert!(TrackingStatus::Pausado
            .transition_to(TrackingStatus::Erro)
            .is_err());
    }

    #[test]
    fn storage_round_trip() {
        for status in [
            TrackingStatus::Pendente,
            TrackingStatus::Ativo,
            TrackingStatus::Pausado,
            TrackingStatus::Erro,
        ] {
            assert_eq!(TrackingStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(TrackingStatus::parse("active").is_err());
    }
}
