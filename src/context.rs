//! Per-invocation evaluator scope. Built fresh for every `decode`/`encode`
//! call and threaded down through recursive `Object`/`ArrayObject` fields
//! by reference, never shared across invocations -- see spec §5.

use crate::value::{Record, Value};

/// `self`/`root`/`prefix` plus any user-registered variables, scoped to
/// one decode or encode call. Entering a nested object swaps `self`;
/// `root` never changes once a call begins.
pub struct Scope<'a> {
    root: &'a Record,
    current: &'a Record,
    prefix: Option<i64>,
    vars: &'a dyn Fn(&str) -> Option<Value>,
}

fn no_vars(_: &str) -> Option<Value> {
    None
}

impl<'a> Scope<'a> {
    pub fn root_call(current: &'a Record) -> Scope<'a> {
        Scope {
            root: current,
            current,
            prefix: None,
            vars: &no_vars,
        }
    }

    pub fn nested(root: &'a Record, current: &'a Record, prefix: Option<i64>) -> Scope<'a> {
        Scope {
            root,
            current,
            prefix,
            vars: &no_vars,
        }
    }

    pub fn with_prefix(&self, prefix: i64) -> Scope<'a> {
        Scope {
            root: self.root,
            current: self.current,
            prefix: Some(prefix),
            vars: self.vars,
        }
    }

    pub fn root(&self) -> &'a Record {
        self.root
    }

    pub fn current(&self) -> &'a Record {
        self.current
    }

    pub fn prefix(&self) -> Option<i64> {
        self.prefix
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        match name {
            "prefix" => self.prefix.map(|p| Value::I64(p)),
            "self" => Some(Value::Object(self.current.clone())),
            "root" => Some(Value::Object(self.root.clone())),
            _ => self
                .current
                .get(name)
                .cloned()
                .or_else(|| (self.vars)(name)),
        }
    }
}
