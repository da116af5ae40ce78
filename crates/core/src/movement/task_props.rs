//! Property-based tests for TaskWorkflow and TaskPriority.

use proptest::prelude::*;
use stockflow_shared::types::{MovementId, UserId};
use uuid::Uuid;

use crate::movement::error::MovementError;
use crate::movement::task::{MovementTask, NewMovementTask, TaskActionInput, TaskPriority, TaskWorkflow};
use crate::movement::types::{TaskAction, TaskStatus, TaskType};

/// Strategy for generating random TaskStatus values.
fn arb_task_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

/// Strategy for generating random TaskAction values.
fn arb_task_action() -> impl Strategy<Value = TaskAction> {
    prop::sample::select(TaskAction::ALL.to_vec())
}

/// Strategy for generating random user ids.
fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(Uuid::from_u128(n)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: Transition table is the only authority
    // =========================================================================

    /// Dispatch succeeds exactly when the table has an entry.
    #[test]
    fn prop_dispatch_matches_table(
        status in arb_task_status(),
        action in arb_task_action(),
        user in arb_user(),
    ) {
        let mut task = MovementTask::from_draft(MovementId::new(), NewMovementTask::new(TaskType::Pick));
        task.status = status;
        let input = TaskActionInput {
            user_id: Some(user),
            reason: Some("re-planned".into()),
        };

        let result = TaskWorkflow::transition(&task, action, input);
        match TaskWorkflow::next_status(action, status) {
            Some(expected) => prop_assert_eq!(result.unwrap().new_status(), expected),
            None => {
                let is_illegal = matches!(
                    result,
                    Err(MovementError::IllegalTaskTransition { action: a, current })
                        if a == action && current == status
                );
                prop_assert!(is_illegal);
            }
        }
    }

    /// Terminal tasks accept nothing.
    #[test]
    fn prop_terminal_tasks_are_final(action in arb_task_action()) {
        for status in [TaskStatus::Completed, TaskStatus::Cancelled] {
            prop_assert!(TaskWorkflow::next_status(action, status).is_none());
        }
    }

    // =========================================================================
    // Property 2: Assignment needs a user
    // =========================================================================

    /// Assigning a pending task without a user always fails.
    #[test]
    fn prop_assign_without_user_fails(status in arb_task_status()) {
        let result = TaskWorkflow::assign(status, None);
        if status == TaskStatus::Pending {
            prop_assert!(matches!(result, Err(MovementError::MissingAssignee)));
        } else {
            let is_illegal = matches!(result, Err(MovementError::IllegalTaskTransition { .. }));
            prop_assert!(is_illegal);
        }
    }

    // =========================================================================
    // Property 3: Priority range
    // =========================================================================

    /// Only 1..=10 are valid task priorities.
    #[test]
    fn prop_priority_range(value in any::<u8>()) {
        let result = TaskPriority::new(value);
        prop_assert_eq!(result.is_ok(), (1..=10).contains(&value));
        if let Ok(priority) = result {
            prop_assert_eq!(priority.value(), value);
        }
    }
}
