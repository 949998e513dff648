//! In-memory stand-in for the store, covering the commands the tests issue.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rkit::{Arg, CommandChannel, KitError, KitResult, Reply};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    List(Vec<String>),
    Hash(HashMap<String, String>),
}

#[derive(Default)]
struct State {
    data: HashMap<String, Value>,
    expiry: HashMap<String, i64>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    commands: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn shared() -> Arc<Self> {
        init_tracing();
        Arc::new(MemoryStore::default())
    }

    /// Names of every command received, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        match self.state.lock().unwrap().data.get(key) {
            Some(Value::List(items)) => Some(items.clone()),
            _ => None,
        }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn wrong_type() -> KitError {
    KitError::Server {
        message: b"WRONGTYPE Operation against a key holding the wrong kind of value".to_vec(),
    }
}

fn syntax_error() -> KitError {
    KitError::Server {
        message: b"ERR syntax error".to_vec(),
    }
}

fn bulk(value: Option<String>) -> Reply {
    Reply::Bulk(value.map(String::into_bytes))
}

fn ok() -> Reply {
    Reply::Simple(b"OK".to_vec())
}

#[async_trait]
impl CommandChannel for MemoryStore {
    async fn execute(&self, command: &str, args: &[Arg]) -> KitResult<Reply> {
        self.commands.lock().unwrap().push(command.to_string());
        let args: Vec<String> = args
            .iter()
            .map(|arg| String::from_utf8_lossy(arg.as_bytes()).into_owned())
            .collect();
        let mut state = self.state.lock().unwrap();
        match (command, args.as_slice()) {
            ("DEL", [key]) => {
                state.expiry.remove(key);
                Ok(Reply::Integer(state.data.remove(key).is_some() as i64))
            }
            ("EXISTS", [key]) => Ok(Reply::Integer(state.data.contains_key(key) as i64)),
            ("TYPE", [key]) => {
                let name = match state.data.get(key) {
                    None => "none",
                    Some(Value::Str(_)) => "string",
                    Some(Value::List(_)) => "list",
                    Some(Value::Hash(_)) => "hash",
                };
                Ok(Reply::Simple(name.as_bytes().to_vec()))
            }
            ("EXPIRE", [key, seconds]) => {
                if !state.data.contains_key(key) {
                    return Ok(Reply::Integer(0));
                }
                let seconds = seconds.parse().map_err(|_| syntax_error())?;
                state.expiry.insert(key.clone(), seconds);
                Ok(Reply::Integer(1))
            }
            ("TTL", [key]) => Ok(Reply::Integer(match state.data.get(key) {
                None => -2,
                Some(_) => state.expiry.get(key).copied().unwrap_or(-1),
            })),
            ("RENAME", [from, to]) => {
                let value = state.data.remove(from).ok_or_else(|| KitError::Server {
                    message: b"ERR no such key".to_vec(),
                })?;
                state.data.insert(to.clone(), value);
                Ok(ok())
            }
            ("SET", [key, value]) => {
                state.data.insert(key.clone(), Value::Str(value.clone()));
                Ok(ok())
            }
            ("HSET", [key, field, value]) => {
                let entry = state
                    .data
                    .entry(key.clone())
                    .or_insert_with(|| Value::Hash(HashMap::new()));
                match entry {
                    Value::Hash(map) => {
                        let added = map.insert(field.clone(), value.clone()).is_none();
                        Ok(Reply::Integer(added as i64))
                    }
                    _ => Err(wrong_type()),
                }
            }
            ("RPUSH", [key, values @ ..]) if !values.is_empty() => {
                let entry = state
                    .data
                    .entry(key.clone())
                    .or_insert_with(|| Value::List(Vec::new()));
                match entry {
                    Value::List(items) => {
                        items.extend(values.iter().cloned());
                        Ok(Reply::Integer(items.len() as i64))
                    }
                    _ => Err(wrong_type()),
                }
            }
            ("SORT", [key, options @ ..]) => sort(&mut state, key, options),
            _ => Err(KitError::Server {
                message: format!("ERR unknown command '{command}'").into_bytes(),
            }),
        }
    }
}

fn lookup(state: &State, pattern: &str, element: &str) -> Option<String> {
    if pattern == "#" {
        return Some(element.to_string());
    }
    let resolved = pattern.replacen('*', element, 1);
    match resolved.split_once("->") {
        Some((key, field)) => match state.data.get(key) {
            Some(Value::Hash(map)) => map.get(field).cloned(),
            _ => None,
        },
        None => match state.data.get(&resolved) {
            Some(Value::Str(value)) => Some(value.clone()),
            _ => None,
        },
    }
}

fn sort(state: &mut State, key: &str, options: &[String]) -> KitResult<Reply> {
    let mut by = None;
    let mut gets = Vec::new();
    let mut limit = None;
    let mut desc = false;
    let mut alpha = false;
    let mut store = None;

    let mut idx = 0;
    while idx < options.len() {
        match options[idx].as_str() {
            "BY" => {
                by = Some(options.get(idx + 1).ok_or_else(syntax_error)?.clone());
                idx += 2;
            }
            "GET" => {
                gets.push(options.get(idx + 1).ok_or_else(syntax_error)?.clone());
                idx += 2;
            }
            "LIMIT" => {
                let offset: i64 = options.get(idx + 1).and_then(|v| v.parse().ok()).ok_or_else(syntax_error)?;
                let count: i64 = options.get(idx + 2).and_then(|v| v.parse().ok()).ok_or_else(syntax_error)?;
                limit = Some((offset, count));
                idx += 3;
            }
            "STORE" => {
                store = Some(options.get(idx + 1).ok_or_else(syntax_error)?.clone());
                idx += 2;
            }
            "ASC" => {
                desc = false;
                idx += 1;
            }
            "DESC" => {
                desc = true;
                idx += 1;
            }
            "ALPHA" => {
                alpha = true;
                idx += 1;
            }
            _ => return Err(syntax_error()),
        }
    }

    let mut elements = match state.data.get(key) {
        None => Vec::new(),
        Some(Value::List(items)) => items.clone(),
        Some(_) => return Err(wrong_type()),
    };

    let view: &State = state;
    let weights: HashMap<String, Option<String>> = elements
        .iter()
        .map(|el| {
            let weight = match &by {
                Some(pattern) => lookup(view, pattern, el),
                None => Some(el.clone()),
            };
            (el.clone(), weight)
        })
        .collect();
    let mut failed = false;
    elements.sort_by(|a, b| {
        let (wa, wb) = (&weights[a], &weights[b]);
        let order = if alpha {
            wa.cmp(wb)
        } else {
            let parse = |w: &Option<String>| match w {
                None => Some(0.0),
                Some(text) => text.parse::<f64>().ok(),
            };
            match (parse(wa), parse(wb)) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => {
                    failed = true;
                    Ordering::Equal
                }
            }
        };
        let order = order.then_with(|| a.cmp(b));
        if desc {
            order.reverse()
        } else {
            order
        }
    });
    if failed {
        return Err(KitError::Server {
            message: b"ERR One or more scores can't be converted into double".to_vec(),
        });
    }

    if let Some((offset, count)) = limit {
        let start = (offset.max(0) as usize).min(elements.len());
        let end = if count < 0 {
            elements.len()
        } else {
            (start + count as usize).min(elements.len())
        };
        elements = elements[start..end].to_vec();
    }

    let values: Vec<Option<String>> = if gets.is_empty() {
        elements.into_iter().map(Some).collect()
    } else {
        elements
            .iter()
            .flat_map(|el| gets.iter().map(move |pattern| (el, pattern)))
            .map(|(el, pattern)| lookup(view, pattern, el))
            .collect()
    };

    match store {
        Some(dest) => {
            let stored: Vec<String> = values.into_iter().map(Option::unwrap_or_default).collect();
            let count = stored.len() as i64;
            state.data.insert(dest, Value::List(stored));
            Ok(Reply::Integer(count))
        }
        None => Ok(Reply::Array(values.into_iter().map(bulk).collect())),
    }
}
