use std::time::Duration;

/// Handle shared by every action queued by one `after`/`sequence` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Pending<A> {
    task: TaskId,
    due: Duration,
    order: u64,
    action: A,
}

/// Cooperative timer queue driven by the game tick.
///
/// The owner only advances it while unpaused, so a frozen scheduler keeps
/// every pending action (and its remaining delay) exactly where it was.
#[derive(Debug)]
pub struct Scheduler<A> {
    now: Duration,
    next_task: u64,
    next_order: u64,
    queue: Vec<Pending<A>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_task: 0,
            next_order: 0,
            queue: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn after(&mut self, delay: Duration, action: A) -> TaskId {
        self.sequence([(delay, action)])
    }

    /// Queues actions that each fire `delay` after the previous one.
    pub fn sequence<I>(&mut self, steps: I) -> TaskId
    where
        I: IntoIterator<Item = (Duration, A)>,
    {
        let task = TaskId(self.next_task);
        self.next_task += 1;

        let mut due = self.now;
        for (delay, action) in steps {
            due = due.saturating_add(delay);
            let order = self.next_order;
            self.next_order += 1;
            let at = self
                .queue
                .partition_point(|pending| (pending.due, pending.order) <= (due, order));
            self.queue.insert(
                at,
                Pending {
                    task,
                    due,
                    order,
                    action,
                },
            );
        }
        task
    }

    pub fn cancel(&mut self, task: TaskId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|pending| pending.task != task);
        self.queue.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.queue.clear();
    }

    pub fn is_pending(&self, task: TaskId) -> bool {
        self.queue.iter().any(|pending| pending.task == task)
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pops the earliest action due at or before `until`, moving the clock to
    /// its due time. Returns `None` once nothing else is due, leaving the clock
    /// at `until`.
    ///
    /// Callers loop on this so actions queued by a fired action are ordered
    /// against the remaining ones.
    pub fn pop_until(&mut self, until: Duration) -> Option<A> {
        match self.queue.first() {
            Some(first) if first.due <= until => {
                let pending = self.queue.remove(0);
                self.now = self.now.max(pending.due);
                Some(pending.action)
            }
            _ => {
                self.now = self.now.max(until);
                None
            }
        }
    }

    /// Advances by `dt` and returns every action that came due, in order.
    pub fn advance(&mut self, dt: Duration) -> Vec<A> {
        let until = self.now.saturating_add(dt);
        let mut fired = Vec::new();
        while let Some(action) = self.pop_until(until) {
            fired.push(action);
        }
        fired
    }
}
