//! tables - assignment of the shared flow-table numbering space to pipeline apps

use std::collections::HashMap;

/// The table numbering space is 0..=254 (255 is reserved).
pub const MAX_TABLE_NUM: u8 = 254;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableError {
    #[error("app '{0}' was not registered with the pipeline")]
    UnknownApp(String),
    #[error("app '{0}' registered twice")]
    DuplicateApp(String),
    #[error("app '{0}' is last in the pipeline and has no next table")]
    NoNextTable(String),
    #[error("flow table numbering space exhausted")]
    ExhaustedTableSpace,
}

#[derive(Debug, Clone)]
pub struct TableAssignment {
    pub main_table: u8,
    pub scratch_tables: Vec<u8>,
}

/// Hands out table numbers to apps.  Main tables are assigned 0, 1, ...
/// in pipeline order at startup; scratch allocations continue from
/// there.  A number, once assigned, is never reused for a different app
/// within the process lifetime.
#[derive(Debug)]
pub struct TableAllocator {
    order: Vec<String>,
    assignments: HashMap<String, TableAssignment>,
    next_unassigned: u16,
}

impl TableAllocator {
    /// Deterministic for a fixed registration order: apps encode
    /// "resubmit to next table" flows with these numbers.
    pub fn new(apps_in_pipeline_order: &[&str]) -> Result<Self, TableError> {
        if apps_in_pipeline_order.len() > MAX_TABLE_NUM as usize + 1 {
            return Err(TableError::ExhaustedTableSpace);
        }
        let mut assignments = HashMap::new();
        let mut order = Vec::new();
        for (idx, name) in apps_in_pipeline_order.iter().enumerate() {
            let previous = assignments.insert(
                name.to_string(),
                TableAssignment {
                    main_table: idx as u8,
                    scratch_tables: Vec::new(),
                },
            );
            if previous.is_some() {
                return Err(TableError::DuplicateApp(name.to_string()));
            }
            order.push(name.to_string());
        }
        Ok(TableAllocator {
            next_unassigned: order.len() as u16,
            order,
            assignments,
        })
    }

    pub fn get_table_num(&self, app: &str) -> Result<u8, TableError> {
        self.assignments
            .get(app)
            .map(|a| a.main_table)
            .ok_or_else(|| TableError::UnknownApp(app.to_string()))
    }

    /// Main table of the app following `app` in the pipeline, for
    /// building its resubmit-to-next default flows.
    pub fn get_next_table_num(&self, app: &str) -> Result<u8, TableError> {
        let idx = self
            .order
            .iter()
            .position(|name| name == app)
            .ok_or_else(|| TableError::UnknownApp(app.to_string()))?;
        match self.order.get(idx + 1) {
            Some(next) => self.get_table_num(next),
            None => Err(TableError::NoNextTable(app.to_string())),
        }
    }

    /// Allocate `count` further table numbers exclusively for `app`.
    pub fn allocate_scratch_tables(
        &mut self,
        app: &str,
        count: usize,
    ) -> Result<Vec<u8>, TableError> {
        let assignment = self
            .assignments
            .get_mut(app)
            .ok_or_else(|| TableError::UnknownApp(app.to_string()))?;
        if count == 0 {
            return Ok(Vec::new());
        }
        // next_unassigned never exceeds MAX_TABLE_NUM + 1, so comparing
        // against the remaining space keeps the arithmetic in range for
        // any `count`.
        let available = MAX_TABLE_NUM as usize + 1 - self.next_unassigned as usize;
        if count > available {
            return Err(TableError::ExhaustedTableSpace);
        }
        let end = self.next_unassigned + count as u16;
        let tables: Vec<u8> = (self.next_unassigned..end).map(|t| t as u8).collect();
        self.next_unassigned = end;
        assignment.scratch_tables.extend(&tables);
        Ok(tables)
    }

    pub fn assignment(&self, app: &str) -> Result<&TableAssignment, TableError> {
        self.assignments
            .get(app)
            .ok_or_else(|| TableError::UnknownApp(app.to_string()))
    }

    pub fn app_order(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
