use cadence::error::CadenceError;
use cadence::models::TaskStatus;

#[test]
fn test_forward_transitions() {
    assert_eq!(TaskStatus::Todo.transition(TaskStatus::InProgress).unwrap(), TaskStatus::InProgress);
    assert_eq!(TaskStatus::InProgress.transition(TaskStatus::Completed).unwrap(), TaskStatus::Completed);
}

#[test]
fn test_cancel_from_any_state_and_reopen() {
    for from in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Completed] {
        assert!(from.can_transition_to(TaskStatus::Cancelled), "{} -> cancelled", from);
    }
    assert!(TaskStatus::Cancelled.can_transition_to(TaskStatus::Todo));
}

#[test]
fn test_disallowed_transitions() {
    assert!(!TaskStatus::Todo.can_transition_to(TaskStatus::Completed));
    assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Todo));
    assert!(!TaskStatus::Cancelled.can_transition_to(TaskStatus::InProgress));
    assert!(!TaskStatus::Cancelled.can_transition_to(TaskStatus::Cancelled));

    match TaskStatus::Todo.transition(TaskStatus::Completed) {
        Err(CadenceError::InvalidTransition { from, to }) => {
            assert_eq!(from, TaskStatus::Todo);
            assert_eq!(to, TaskStatus::Completed);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_status_parsing() {
    assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
    assert_eq!("done".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
    assert!("later".parse::<TaskStatus>().is_err());
}
