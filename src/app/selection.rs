use crate::model::ModuleType;

/// Which application and module the console is pointed at.
///
/// Owned by `AppState` and only written by `update`. The tickets number the
/// latest application and signature requests; an answer carrying an older
/// ticket lost the race against a newer selection and is dropped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SelectionState {
    pub current_app_id: usize,
    pub current_module_url: Option<String>,
    pub current_module_type: Option<ModuleType>,
    app_ticket: u64,
    module_ticket: u64,
}

impl SelectionState {
    pub fn next_app_ticket(&mut self) -> u64 {
        self.app_ticket += 1;
        self.app_ticket
    }

    pub fn next_module_ticket(&mut self) -> u64 {
        self.module_ticket += 1;
        self.module_ticket
    }

    pub fn is_current_app_ticket(&self, ticket: u64) -> bool {
        ticket == self.app_ticket
    }

    pub fn is_current_module_ticket(&self, ticket: u64) -> bool {
        ticket == self.module_ticket
    }

    pub fn select_app(&mut self, index: usize) {
        self.current_app_id = index;
    }

    pub fn select_module(&mut self, url: String, module_type: ModuleType) {
        self.current_module_url = Some(url);
        self.current_module_type = Some(module_type);
    }

    pub fn clear_module(&mut self) {
        self.current_module_url = None;
        self.current_module_type = None;
    }
}
