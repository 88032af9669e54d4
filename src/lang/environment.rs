use std::collections::BTreeMap;

use crate::lang::ast::Identifier;
use crate::lang::error::{Error, Result};
use crate::lang::value::Value;

/// Live variable bindings for one interpreter
///
/// There is a single flat scope. `for` loops temporarily `bind` their loop variable and `remove`
/// it when the loop exits.
#[derive(Default)]
pub struct Environment {
    inner: BTreeMap<Identifier, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            inner: BTreeMap::default(),
        }
    }

    /// Introduce a new variable. Fails if `ident` is already bound.
    pub fn define(&mut self, ident: Identifier, val: Value) -> Result<()> {
        if self.inner.contains_key(&ident) {
            return Err(Error::NameConflict(ident));
        }

        self.inner.insert(ident, val);
        Ok(())
    }

    pub fn get(&self, ident: &Identifier) -> Result<Value> {
        self.inner
            .get(ident)
            .copied()
            .ok_or_else(|| Error::UndefinedVariable(ident.clone()))
    }

    /// Overwrite an existing variable
    pub fn set(&mut self, ident: &Identifier, val: Value) -> Result<()> {
        match self.inner.get_mut(ident) {
            Some(slot) => {
                *slot = val;
                Ok(())
            }
            None => Err(Error::UndefinedVariable(ident.clone())),
        }
    }

    /// Insert or overwrite without any existence check
    pub fn bind(&mut self, ident: Identifier, val: Value) {
        self.inner.insert(ident, val);
    }

    /// Idempotent
    pub fn remove(&mut self, ident: &Identifier) {
        self.inner.remove(ident);
    }

    pub fn contains(&self, ident: &Identifier) -> bool {
        self.inner.contains_key(ident)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &Value)> {
        self.inner.iter()
    }
}

#[test]
fn test_define() {
    let mut env = Environment::new();
    env.define("x".into(), 1.0).expect("first define failed");
    assert_eq!(env.get(&"x".into()).expect("x missing"), 1.0);

    match env.define("x".into(), 2.0) {
        Err(Error::NameConflict(ident)) => assert_eq!(ident, Identifier::from("x")),
        _ => panic!("redefinition should conflict"),
    }

    // Failed define must not clobber the old value
    assert_eq!(env.get(&"x".into()).expect("x missing"), 1.0);
}

#[test]
fn test_get_set_missing() {
    let mut env = Environment::new();
    assert!(matches!(
        env.get(&"y".into()),
        Err(Error::UndefinedVariable(_))
    ));
    assert!(matches!(
        env.set(&"y".into(), 3.0),
        Err(Error::UndefinedVariable(_))
    ));
    assert!(!env.contains(&"y".into()));
}

#[test]
fn test_bind_remove() {
    let mut env = Environment::new();
    env.bind("i".into(), 0.0);
    env.bind("i".into(), 1.0);
    assert_eq!(env.get(&"i".into()).expect("i missing"), 1.0);
    assert_eq!(env.iter().count(), 1);

    env.remove(&"i".into());
    env.remove(&"i".into());
    assert!(!env.contains(&"i".into()));
}
