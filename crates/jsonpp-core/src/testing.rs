//! In-memory collaborators for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::engine::Preprocessor;
use crate::error::{ResolveError, ResolveResult};
use crate::exec::{CommandExecutor, CommandOutput};
use crate::loader::DocumentLoader;

#[derive(Debug, Clone, Default)]
pub struct MapLoader {
    documents: Rc<HashMap<String, Value>>,
    requests: Rc<RefCell<Vec<String>>>,
}

impl MapLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locator: &str, document: Value) -> Self {
        Rc::make_mut(&mut self.documents).insert(locator.to_string(), document);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl DocumentLoader for MapLoader {
    fn fetch(&self, locator: &str) -> ResolveResult<Value> {
        self.requests.borrow_mut().push(locator.to_string());
        self.documents
            .get(locator)
            .cloned()
            .ok_or_else(|| ResolveError::fetch(locator, "no such document"))
    }
}

pub fn engine_with(loader: MapLoader) -> Preprocessor {
    Preprocessor::new().with_loader(loader)
}

/// Returns a fixed output and records every argv it was given.
#[derive(Debug, Clone)]
pub struct ScriptedExecutor {
    output: CommandOutput,
    calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl ScriptedExecutor {
    pub fn ok(stdout: &str) -> Self {
        Self::raw(stdout.as_bytes().to_vec())
    }

    pub fn raw(stdout: Vec<u8>) -> Self {
        Self::new(CommandOutput {
            stdout,
            stderr: Vec::new(),
            status: Some(0),
        })
    }

    pub fn failing(status: i32, stderr: &str) -> Self {
        Self::new(CommandOutput {
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
            status: Some(status),
        })
    }

    fn new(output: CommandOutput) -> Self {
        Self {
            output,
            calls: Rc::default(),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn run(&self, argv: &[String]) -> ResolveResult<CommandOutput> {
        self.calls.borrow_mut().push(argv.to_vec());
        Ok(self.output.clone())
    }
}
