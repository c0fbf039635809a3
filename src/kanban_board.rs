use crate::task::{Record, STATUS_FIELD};

/// In-memory record store for one board session.
///
/// Rebuilt wholesale on every reload. The only in-place mutation is
/// [`KanbanBoard::set_status`].
#[derive(Debug, Default)]
pub struct KanbanBoard {
    tasks: Vec<Record>,
}

impl KanbanBoard {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn replace(&mut self, tasks: Vec<Record>) {
        self.tasks = tasks;
    }

    pub fn tasks(&self) -> &[Record] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Record> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    /// Sets the status of the first record with identifier `id`.
    /// Returns false when no record matches.
    pub fn set_status(&mut self, id: &str, status: &str) -> bool {
        if id.is_empty() {
            return false;
        }
        match self.tasks.iter_mut().find(|t| t.id() == id) {
            Some(task) => {
                task.insert(STATUS_FIELD, status);
                true
            }
            None => false,
        }
    }
}
