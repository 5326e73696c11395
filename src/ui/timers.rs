use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use pairs::{Command, Scheduler, TaskId};
use tracing::trace;

pub type Dispatch = Rc<dyn Fn(Command)>;

/// Late-bound route from fired timers back into the game. Filled in once
/// the state that owns the game exists.
#[derive(Clone, Default)]
pub struct DispatchSlot(Rc<RefCell<Option<Dispatch>>>);

impl DispatchSlot {
    pub fn set(&self, dispatch: Dispatch) {
        *self.0.borrow_mut() = Some(dispatch);
    }

    fn deliver(&self, command: Command) {
        let handler = self.0.borrow().clone();
        if let Some(handler) = handler {
            handler(command);
        }
    }
}

/// Runs game timers as glib main-loop sources.
pub struct GlibScheduler {
    next_id: u64,
    sources: Rc<RefCell<HashMap<TaskId, glib::SourceId>>>,
    dispatch: DispatchSlot,
}

impl GlibScheduler {
    pub fn new(dispatch: DispatchSlot) -> Self {
        GlibScheduler {
            next_id: 0,
            sources: Rc::new(RefCell::new(HashMap::new())),
            dispatch,
        }
    }

    fn next_task(&mut self) -> TaskId {
        self.next_id += 1;
        TaskId(self.next_id)
    }
}

impl Scheduler for GlibScheduler {
    fn schedule_once(&mut self, delay: Duration, command: Command) -> TaskId {
        let id = self.next_task();
        let sources = self.sources.clone();
        let dispatch = self.dispatch.clone();
        let source = glib::timeout_add_local_once(delay, move || {
            // The source is gone once this returns; forget it so a later
            // cancel does not try to remove it again.
            sources.borrow_mut().remove(&id);
            dispatch.deliver(command);
        });
        self.sources.borrow_mut().insert(id, source);
        id
    }

    fn schedule_repeating(&mut self, interval: Duration, command: Command) -> TaskId {
        let id = self.next_task();
        let dispatch = self.dispatch.clone();
        let source = glib::timeout_add_local(interval, move || {
            dispatch.deliver(command.clone());
            glib::ControlFlow::Continue
        });
        self.sources.borrow_mut().insert(id, source);
        id
    }

    fn cancel(&mut self, task: TaskId) {
        let source = self.sources.borrow_mut().remove(&task);
        if let Some(source) = source {
            trace!(task = task.0, "removing glib source");
            source.remove();
        }
    }
}
