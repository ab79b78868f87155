use serde::{Deserialize, Serialize};
use tracing::debug;

use super::path::{PropertyPath, ScopeName};
use super::value::Value;
use super::{MemoryError, MemoryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum ArrayChange {
    Push,
    Pop,
    Take,
    Remove,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum PropertyKind {
    Array,
    Object,
}

impl PropertyKind {
    fn empty_value(&self) -> Value {
        match self {
            PropertyKind::Array => Value::empty_list(),
            PropertyKind::Object => Value::empty_map(),
        }
    }
}

/// Read access to the memory scopes visible from one dialog frame.
pub trait MemoryRead {
    fn scope(&self, name: ScopeName) -> Option<&Value>;

    fn lookup(&self, path: &PropertyPath) -> Option<&Value> {
        match path.scope {
            Some(scope) => self.scope(scope)?.get_path(&path.segments),
            None => ScopeName::RESOLUTION_ORDER.iter().find_map(|scope| {
                self.scope(*scope)
                    .and_then(|root| root.get_path(&path.segments))
            }),
        }
    }

    /// Missing properties resolve to null.
    fn resolve(&self, path: &PropertyPath) -> Value {
        self.lookup(path).cloned().unwrap_or_default()
    }
}

/// Turn, user and conversation scopes. The dialog scope lives on each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryScopes {
    pub turn: Value,
    pub user: Value,
    pub conversation: Value,
}

impl Default for MemoryScopes {
    fn default() -> Self {
        Self {
            turn: Value::empty_map(),
            user: Value::empty_map(),
            conversation: Value::empty_map(),
        }
    }
}

impl MemoryScopes {
    pub fn new(user: Value, conversation: Value) -> Self {
        Self {
            turn: Value::empty_map(),
            user,
            conversation,
        }
    }

    pub fn view<'a>(&'a self, dialog: Option<&'a Value>) -> MemoryView<'a> {
        MemoryView {
            scopes: self,
            dialog,
        }
    }
}

impl MemoryRead for MemoryScopes {
    fn scope(&self, name: ScopeName) -> Option<&Value> {
        match name {
            ScopeName::Dialog => None,
            ScopeName::Turn => Some(&self.turn),
            ScopeName::User => Some(&self.user),
            ScopeName::Conversation => Some(&self.conversation),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MemoryView<'a> {
    scopes: &'a MemoryScopes,
    dialog: Option<&'a Value>,
}

impl MemoryRead for MemoryView<'_> {
    fn scope(&self, name: ScopeName) -> Option<&Value> {
        match name {
            ScopeName::Dialog => self.dialog,
            other => self.scopes.scope(other),
        }
    }
}

/// Mutable memory of the active frame: the shared scopes plus that frame's dialog scope.
pub struct DialogMemory<'a> {
    scopes: &'a mut MemoryScopes,
    dialog: &'a mut Value,
}

impl MemoryRead for DialogMemory<'_> {
    fn scope(&self, name: ScopeName) -> Option<&Value> {
        match name {
            ScopeName::Dialog => Some(&*self.dialog),
            other => self.scopes.scope(other),
        }
    }
}

impl<'a> DialogMemory<'a> {
    pub fn new(scopes: &'a mut MemoryScopes, dialog: &'a mut Value) -> Self {
        Self { scopes, dialog }
    }

    pub fn view(&self) -> MemoryView<'_> {
        MemoryView {
            scopes: &*self.scopes,
            dialog: Some(&*self.dialog),
        }
    }

    fn scope_mut(&mut self, name: ScopeName) -> &mut Value {
        match name {
            ScopeName::Dialog => &mut *self.dialog,
            ScopeName::Turn => &mut self.scopes.turn,
            ScopeName::User => &mut self.scopes.user,
            ScopeName::Conversation => &mut self.scopes.conversation,
        }
    }

    fn writable_segments<'p>(
        &mut self,
        path: &'p PropertyPath,
    ) -> MemoryResult<(&mut Value, &'p [super::PathSegment])> {
        let scope = path.require_scope()?;
        if path.segments.is_empty() {
            return Err(MemoryError::InvalidPath(format!(
                "cannot overwrite the whole {} scope",
                scope
            )));
        }
        Ok((self.scope_mut(scope), &path.segments))
    }

    pub fn set(&mut self, path: &PropertyPath, value: Value) -> MemoryResult<()> {
        debug!("set {} = {:?}", path, value);
        let (root, segments) = self.writable_segments(path)?;
        root.set_path(segments, value)
    }

    pub fn delete(&mut self, path: &PropertyPath) -> MemoryResult<Option<Value>> {
        let (root, segments) = self.writable_segments(path)?;
        Ok(root.remove_path(segments))
    }

    /// Resets the property to an empty array or object.
    pub fn init_property(&mut self, path: &PropertyPath, kind: PropertyKind) -> MemoryResult<()> {
        self.set(path, kind.empty_value())
    }

    /// Applies an array edit in place and returns the removed item, if any.
    ///
    /// `Push` and `Clear` create the array when the property is missing. `Remove` yields
    /// whether a matching item was found.
    pub fn edit_array(
        &mut self,
        path: &PropertyPath,
        change: ArrayChange,
        value: Option<Value>,
    ) -> MemoryResult<Option<Value>> {
        let invalid = |reason: &str| MemoryError::InvalidArrayOperation {
            operation: change,
            path: path.to_string(),
            reason: reason.to_string(),
        };
        let (root, segments) = self.writable_segments(path)?;

        let exists = matches!(root.get_path(segments), Some(v) if !v.is_null());
        if !exists {
            return match change {
                ArrayChange::Push => {
                    root.set_path(segments, Value::List(vec![value.unwrap_or_default()]))?;
                    Ok(None)
                }
                ArrayChange::Clear => {
                    root.set_path(segments, Value::empty_list())?;
                    Ok(None)
                }
                _ => Err(invalid("property does not exist")),
            };
        }

        let Some(Value::List(list)) = root.get_path_mut(segments) else {
            return Err(invalid("property is not an array"));
        };
        let result = match change {
            ArrayChange::Push => {
                list.push(value.unwrap_or_default());
                None
            }
            ArrayChange::Pop => Some(list.pop().unwrap_or_default()),
            ArrayChange::Take => Some(if list.is_empty() {
                Value::Null
            } else {
                list.remove(0)
            }),
            ArrayChange::Remove => {
                let target = value.unwrap_or_default();
                let position = list.iter().position(|item| item.loose_eq(&target));
                if let Some(index) = position {
                    list.remove(index);
                }
                Some(Value::Boolean(position.is_some()))
            }
            ArrayChange::Clear => {
                list.clear();
                None
            }
        };
        Ok(result)
    }
}
