use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;

use super::engine::{Command, Game, GameEvent};
use crate::error::GameError;

/// Handle for a deferred command, used to cancel it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

/// Deferred delivery of commands back into [`Game::update`].
///
/// Implementations must never deliver a command after its task was
/// cancelled. Cancelling a task that already fired is a no-op.
pub trait Scheduler {
    fn schedule_once(&mut self, delay: Duration, command: Command) -> TaskId;
    fn schedule_repeating(&mut self, interval: Duration, command: Command) -> TaskId;
    fn cancel(&mut self, task: TaskId);
}

struct Pending {
    due: Duration,
    every: Option<Duration>,
    command: Command,
}

#[derive(Default)]
struct ClockState {
    now: Duration,
    next_id: u64,
    tasks: BTreeMap<TaskId, Pending>,
}

impl ClockState {
    fn insert(&mut self, due: Duration, every: Option<Duration>, command: Command) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.tasks.insert(id, Pending { due, every, command });
        id
    }
}

/// Virtual clock for headless play. Time only moves through [`advance`],
/// which fires due tasks in deadline order.
///
/// Clones share one timeline: hand one clone to the game and keep another
/// to drive it.
///
/// [`advance`]: ManualClock::advance
#[derive(Clone, Default)]
pub struct ManualClock {
    inner: Rc<RefCell<ClockState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock::default()
    }

    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of tasks that have neither fired nor been cancelled. Repeating
    /// tasks count until cancelled.
    pub fn pending(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Moves time forward by `by`, feeding every task that falls due into
    /// `game`. Tasks scheduled or cancelled while firing are honoured within
    /// the same call.
    pub fn advance(&self, game: &mut Game, by: Duration) -> Result<Vec<GameEvent>, GameError> {
        let target = self.now() + by;
        let mut events = Vec::new();
        while let Some(command) = self.pop_due(target) {
            events.extend(game.update(command)?);
        }
        self.inner.borrow_mut().now = target;
        Ok(events)
    }

    fn pop_due(&self, until: Duration) -> Option<Command> {
        let mut st = self.inner.borrow_mut();
        let (id, due) = st
            .tasks
            .iter()
            .filter(|(_, task)| task.due <= until)
            .min_by_key(|(id, task)| (task.due, **id))
            .map(|(id, task)| (*id, task.due))?;
        st.now = due;
        let every = st.tasks.get(&id)?.every;
        let command = match every {
            Some(every) => {
                let task = st.tasks.get_mut(&id)?;
                task.due += every;
                task.command.clone()
            }
            None => st.tasks.remove(&id)?.command,
        };
        trace!(task = id.0, ?command, "manual clock fired");
        Some(command)
    }
}

impl Scheduler for ManualClock {
    fn schedule_once(&mut self, delay: Duration, command: Command) -> TaskId {
        let mut st = self.inner.borrow_mut();
        let due = st.now + delay;
        st.insert(due, None, command)
    }

    fn schedule_repeating(&mut self, interval: Duration, command: Command) -> TaskId {
        let every = interval.max(Duration::from_millis(1));
        let mut st = self.inner.borrow_mut();
        let due = st.now + every;
        st.insert(due, Some(every), command)
    }

    fn cancel(&mut self, task: TaskId) {
        self.inner.borrow_mut().tasks.remove(&task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_task_never_fires() {
        let mut clock = ManualClock::new();
        let task = clock.schedule_once(Duration::from_millis(10), Command::Reset);
        assert_eq!(clock.pending(), 1);
        clock.cancel(task);
        assert_eq!(clock.pending(), 0);
        assert!(clock.pop_due(Duration::from_secs(1)).is_none());
    }

    #[test]
    fn fires_in_deadline_order_and_repeats() {
        let mut clock = ManualClock::new();
        clock.schedule_repeating(Duration::from_secs(1), Command::Tick { generation: 1 });
        clock.schedule_once(Duration::from_millis(500), Command::Settle { generation: 1 });

        let horizon = Duration::from_millis(2500);
        assert_eq!(
            clock.pop_due(horizon),
            Some(Command::Settle { generation: 1 })
        );
        assert_eq!(clock.now(), Duration::from_millis(500));
        assert_eq!(clock.pop_due(horizon), Some(Command::Tick { generation: 1 }));
        assert_eq!(clock.pop_due(horizon), Some(Command::Tick { generation: 1 }));
        assert_eq!(clock.pop_due(horizon), None);
        assert_eq!(clock.pending(), 1);
    }
}
