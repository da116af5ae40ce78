//! Property-based tests for MovementWorkflow.

use proptest::prelude::*;

use crate::movement::error::MovementError;
use crate::movement::service::{MovementTransition, MovementWorkflow, TransitionTarget};
use crate::movement::types::{MovementAction, MovementStatus};

/// Strategy for generating random MovementStatus values.
fn arb_status() -> impl Strategy<Value = MovementStatus> {
    prop::sample::select(MovementStatus::ALL.to_vec())
}

/// Strategy for generating random MovementAction values.
fn arb_action() -> impl Strategy<Value = MovementAction> {
    prop::sample::select(MovementAction::ALL.to_vec())
}

/// Strategy for generating blank or absent reasons.
fn arb_blank_reason() -> impl Strategy<Value = Option<String>> {
    prop_oneof![Just(None), "[ \t]{0,5}".prop_map(Some)]
}

/// Strategy for generating usable reasons.
fn arb_reason() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{0,60}"
}

fn dispatch(
    action: MovementAction,
    status: MovementStatus,
    reason: Option<String>,
) -> Result<Option<MovementTransition>, MovementError> {
    match action {
        MovementAction::Start => MovementWorkflow::start(status).map(Some),
        MovementAction::Complete => MovementWorkflow::complete(status).map(Some),
        MovementAction::Hold => MovementWorkflow::hold(status, reason).map(Some),
        MovementAction::Release => MovementWorkflow::release(status, None).map(Some),
        MovementAction::Cancel => MovementWorkflow::cancel(status, reason).map(Some),
        MovementAction::Delete => MovementWorkflow::ensure_deletable(status).map(|()| None),
        MovementAction::Edit => MovementWorkflow::ensure_editable(status).map(|()| None),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: Complete only from IN_PROGRESS
    // =========================================================================

    /// Completion fails with IllegalTransition from every other status.
    #[test]
    fn prop_complete_only_from_in_progress(status in arb_status()) {
        let result = MovementWorkflow::complete(status);
        if status == MovementStatus::InProgress {
            prop_assert_eq!(result.unwrap().new_status(), MovementStatus::Completed);
        } else {
            let is_illegal = matches!(
                result,
                Err(MovementError::IllegalTransition { action: MovementAction::Complete, current })
                    if current == status
            );
            prop_assert!(is_illegal);
        }
    }

    // =========================================================================
    // Property 2: Hold and cancel need a reason
    // =========================================================================

    /// Blank reasons fail with MissingReason wherever the action is legal.
    #[test]
    fn prop_blank_reason_rejected(
        status in arb_status(),
        reason in arb_blank_reason(),
    ) {
        for action in [MovementAction::Hold, MovementAction::Cancel] {
            let legal = MovementWorkflow::target(action, status, None).is_some();
            let result = dispatch(action, status, reason.clone());
            if legal {
                let is_missing_reason = matches!(result, Err(MovementError::MissingReason { .. }));
                prop_assert!(is_missing_reason);
            } else {
                let is_illegal = matches!(result, Err(MovementError::IllegalTransition { .. }));
                prop_assert!(is_illegal);
            }
        }
    }

    // =========================================================================
    // Property 3: Cancel is terminal
    // =========================================================================

    /// A second cancel always fails with IllegalTransition.
    #[test]
    fn prop_cancel_twice_fails(status in arb_status(), reason in arb_reason()) {
        if let Ok(first) = MovementWorkflow::cancel(status, Some(reason.clone())) {
            let second = MovementWorkflow::cancel(first.new_status(), Some(reason));
            let is_illegal = matches!(
                second,
                Err(MovementError::IllegalTransition { current: MovementStatus::Cancelled, .. })
            );
            prop_assert!(is_illegal);
        }
    }

    // =========================================================================
    // Property 4: Hold/release round trip
    // =========================================================================

    /// Release restores exactly the status the movement was held from.
    #[test]
    fn prop_release_restores_pre_hold_status(
        origin in prop_oneof![Just(MovementStatus::Pending), Just(MovementStatus::InProgress)],
        reason in arb_reason(),
    ) {
        let hold = MovementWorkflow::hold(origin, Some(reason)).unwrap();
        let MovementTransition::Hold { held_from, new_status, .. } = hold else {
            return Err(TestCaseError::fail("expected Hold"));
        };
        prop_assert_eq!(new_status, MovementStatus::OnHold);

        let release = MovementWorkflow::release(new_status, Some(held_from)).unwrap();
        prop_assert_eq!(release.new_status(), origin);
    }

    // =========================================================================
    // Property 5: Single transition table
    // =========================================================================

    /// Every action function agrees with the table and with allowed_actions.
    #[test]
    fn prop_actions_agree_with_table(
        status in arb_status(),
        action in arb_action(),
        reason in arb_reason(),
    ) {
        let target = MovementWorkflow::target(action, status, None);
        let allowed = MovementWorkflow::allowed_actions(status).contains(&action);
        prop_assert_eq!(target.is_some(), allowed);

        let result = dispatch(action, status, Some(reason));
        match (target, result) {
            (Some(TransitionTarget::Status(expected)), Ok(Some(transition))) => {
                prop_assert_eq!(transition.new_status(), expected);
                prop_assert_eq!(transition.action(), action);
            }
            (Some(TransitionTarget::Removed | TransitionTarget::Unchanged), Ok(None)) => {}
            (None, Err(MovementError::IllegalTransition { action: failed, current })) => {
                prop_assert_eq!(failed, action);
                prop_assert_eq!(current, status);
            }
            (target, result) => {
                return Err(TestCaseError::fail(format!(
                    "table says {target:?} but dispatch returned {result:?}"
                )));
            }
        }
    }

    /// Terminal statuses offer no status-changing action.
    #[test]
    fn prop_terminal_statuses_are_final(action in arb_action()) {
        for status in [MovementStatus::Completed, MovementStatus::Cancelled] {
            let target = MovementWorkflow::target(action, status, None);
            let changes_status = matches!(target, Some(TransitionTarget::Status(_)));
            prop_assert!(!changes_status);
        }
    }
}
