//! Bonus Claims - daily streak reward, daily cipher, exchange selection
//!
//! Each claim checks its idempotency flag first and is a silent no-op when
//! there is nothing to do. Failures are contained by [`best_effort`] so one
//! bad claim never aborts the cycle.

use crate::api::GameApi;
use crate::cipher::decode_cipher;
use crate::models::GameConfig;
use crate::pacing::{is_stop_requested, Pacer};
use crate::state::GameState;
use crate::utils::format_coins;
use anyhow::Result;
use core_logic::is_fatal_session_error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Nothing to claim, flag already set
    Skipped,
    Claimed { reward: Option<i64> },
    Rejected,
}

/// Logs and swallows a failed optional action.
///
/// Stop requests and invalid sessions still propagate.
pub fn best_effort<T>(session: &str, action: &str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if is_stop_requested(&e) || is_fatal_session_error(&e) => Err(e),
        Err(e) => {
            warn!("{} | {} failed: {:#}", session, action, e);
            Ok(None)
        }
    }
}

/// Claims today's streak reward if the latest daily task is open.
pub async fn claim_daily_task<A: GameApi + ?Sized>(
    api: &A,
    pacer: &Pacer,
    session: &str,
) -> Result<ClaimOutcome> {
    pacer.checkpoint()?;
    let tasks = api.fetch_tasks().await?;
    let Some(task) = tasks.last() else {
        debug!("{} | No daily task listed", session);
        return Ok(ClaimOutcome::Skipped);
    };
    if task.is_completed {
        debug!("{} | Daily reward already claimed", session);
        return Ok(ClaimOutcome::Skipped);
    }

    pacer.checkpoint()?;
    if !api.claim_daily_task().await? {
        warn!("{} | Daily reward claim was rejected", session);
        return Ok(ClaimOutcome::Rejected);
    }

    let reward = task.current_reward();
    info!(
        target: "task_result",
        "{} | Claimed daily reward | Day: {} | Reward: {}",
        session,
        task.days,
        reward.map(format_coins).unwrap_or_else(|| "?".to_string())
    );
    Ok(ClaimOutcome::Claimed { reward })
}

/// Decodes and submits today's cipher unless it is missing or claimed.
pub async fn claim_daily_cipher<A: GameApi + ?Sized>(
    api: &A,
    game_config: &mut GameConfig,
    pacer: &Pacer,
    session: &str,
) -> Result<ClaimOutcome> {
    let Some(cipher) = game_config.daily_cipher.as_mut() else {
        debug!("{} | No daily cipher published", session);
        return Ok(ClaimOutcome::Skipped);
    };
    if cipher.is_claimed || cipher.cipher.trim().is_empty() {
        debug!("{} | Daily cipher already claimed", session);
        return Ok(ClaimOutcome::Skipped);
    }

    let decoded = decode_cipher(&cipher.cipher);
    pacer.checkpoint()?;
    if !api.claim_cipher(&decoded).await? {
        warn!("{} | Cipher {} was rejected", session, decoded);
        return Ok(ClaimOutcome::Rejected);
    }

    cipher.is_claimed = true;
    info!(
        target: "task_result",
        "{} | Claimed daily cipher {} | Bonus: +{}",
        session,
        decoded,
        format_coins(cipher.bonus_coins)
    );
    Ok(ClaimOutcome::Claimed {
        reward: Some(cipher.bonus_coins),
    })
}

/// Selects `exchange_id` once for accounts that have none.
pub async fn select_default_exchange<A: GameApi + ?Sized>(
    api: &A,
    state: &mut GameState,
    exchange_id: &str,
    pacer: &Pacer,
    session: &str,
) -> Result<ClaimOutcome> {
    if state
        .profile
        .exchange_id
        .as_deref()
        .is_some_and(|id| !id.is_empty())
    {
        return Ok(ClaimOutcome::Skipped);
    }

    pacer.checkpoint()?;
    if !api.select_exchange(exchange_id).await? {
        warn!("{} | Exchange {} was rejected", session, exchange_id);
        return Ok(ClaimOutcome::Rejected);
    }

    state.set_exchange(exchange_id);
    info!(target: "task_result", "{} | Selected exchange {}", session, exchange_id);
    Ok(ClaimOutcome::Claimed { reward: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::StopRequested;
    use core_logic::SessionError;

    #[test]
    fn test_best_effort_swallows_transient() {
        let result: Result<u32> = Err(anyhow::anyhow!("connection reset"));
        assert_eq!(best_effort("acc", "Daily reward", result).unwrap(), None);
        assert_eq!(best_effort("acc", "Daily reward", Ok(5)).unwrap(), Some(5));
    }

    #[test]
    fn test_best_effort_passes_stop_and_fatal() {
        let stop: Result<()> = Err(StopRequested.into());
        assert!(best_effort("acc", "Cipher", stop).is_err());

        let fatal: Result<()> = Err(SessionError::invalid("acc", "revoked").into());
        assert!(best_effort("acc", "Cipher", fatal).is_err());
    }
}
