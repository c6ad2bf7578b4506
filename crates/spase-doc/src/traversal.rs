//! Cursor APIs for navigating and editing a document tree
//!
//! [`Cursor`] walks a shared reference and keeps the path it took for error
//! reporting. [`CursorMut`] does the same over a mutable reference and adds
//! [`CursorMut::assign`], which writes through the parent of the final
//! segment: object members are inserted or replaced, array slots must exist.

use serde_json::Value;

use crate::path::{DocPath, PathSegment};
use crate::{json_type_name, Error, Result};

/// A read cursor positioned on one value of a document
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    value: &'a Value,
    path: DocPath,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the document root
    pub fn new(value: &'a Value) -> Self {
        Self {
            value,
            path: DocPath::root(),
        }
    }

    /// Current value
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Path from the root to the current value
    pub fn path(&self) -> &DocPath {
        &self.path
    }

    /// Step into a single segment
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] if the member or slot does not exist,
    /// or [`Error::TypeMismatch`] when the current value is a scalar.
    pub fn child(&self, segment: &PathSegment) -> Result<Cursor<'a>> {
        let mut path = self.path.clone();
        path.push(segment.clone());
        let value = step(self.value, segment, &path)?;
        Ok(Cursor { value, path })
    }

    /// Follow a full path from the current position
    ///
    /// # Errors
    ///
    /// Propagates the first failing [`Cursor::child`] step.
    pub fn navigate(&self, path: &DocPath) -> Result<Cursor<'a>> {
        let mut cursor = self.clone();
        for segment in path.segments() {
            cursor = cursor.child(segment)?;
        }
        Ok(cursor)
    }
}

/// A write cursor positioned on one value of a document
#[derive(Debug)]
pub struct CursorMut<'a> {
    value: &'a mut Value,
    path: DocPath,
}

impl<'a> CursorMut<'a> {
    /// Create a cursor at the document root
    pub fn new(value: &'a mut Value) -> Self {
        Self {
            value,
            path: DocPath::root(),
        }
    }

    pub fn value(&self) -> &Value {
        self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        self.value
    }

    pub fn path(&self) -> &DocPath {
        &self.path
    }

    /// Consume the cursor and return the reference it holds
    pub fn into_value(self) -> &'a mut Value {
        self.value
    }

    /// Step into a single segment, consuming this cursor
    ///
    /// # Errors
    ///
    /// Same conditions as [`Cursor::child`].
    pub fn child(self, segment: &PathSegment) -> Result<CursorMut<'a>> {
        let mut path = self.path;
        path.push(segment.clone());
        let value = step_mut(self.value, segment, &path)?;
        Ok(CursorMut { value, path })
    }

    /// Follow a full path from the current position
    ///
    /// # Errors
    ///
    /// Propagates the first failing step.
    pub fn navigate(self, path: &DocPath) -> Result<CursorMut<'a>> {
        let mut cursor = self;
        for segment in path.segments() {
            cursor = cursor.child(segment)?;
        }
        Ok(cursor)
    }

    /// Assign `value` at `path` relative to this cursor and return what was
    /// there before (`None` when a new object member was created).
    ///
    /// Navigates to the parent of the final segment, then writes. The empty
    /// path replaces the current value.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent cannot be reached, the parent is a
    /// scalar, or an array index is out of bounds.
    pub fn assign(self, path: &DocPath, value: Value) -> Result<Option<Value>> {
        let Some((parent_path, last)) = path.split_last() else {
            let previous = std::mem::replace(self.value, value);
            return Ok(Some(previous));
        };

        let parent = self.navigate(&parent_path)?;
        let parent_pointer = parent.path.to_pointer();
        match parent.value {
            Value::Object(map) => Ok(map.insert(last.token(), value)),
            Value::Array(items) => {
                let index = last.as_index().ok_or_else(|| {
                    Error::invalid_path(path.to_pointer(), "array segment is not an index")
                })?;
                let slot = items
                    .get_mut(index)
                    .ok_or_else(|| Error::node_not_found(path.to_pointer()))?;
                Ok(Some(std::mem::replace(slot, value)))
            }
            other => Err(Error::type_mismatch(
                parent_pointer,
                "object or array",
                json_type_name(other),
            )),
        }
    }
}

/// Read the value at `path`
///
/// # Errors
///
/// See [`Cursor::navigate`].
pub fn get<'a>(document: &'a Value, path: &DocPath) -> Result<&'a Value> {
    Cursor::new(document).navigate(path).map(|c| c.value())
}

/// Assign `value` at `path` and return the previous value
///
/// # Errors
///
/// See [`CursorMut::assign`].
pub fn set(document: &mut Value, path: &DocPath, value: Value) -> Result<Option<Value>> {
    CursorMut::new(document).assign(path, value)
}

fn step<'a>(value: &'a Value, segment: &PathSegment, path: &DocPath) -> Result<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(&segment.token())
            .ok_or_else(|| Error::node_not_found(path.to_pointer())),
        Value::Array(items) => segment
            .as_index()
            .and_then(|index| items.get(index))
            .ok_or_else(|| Error::node_not_found(path.to_pointer())),
        other => Err(Error::type_mismatch(
            path.to_pointer(),
            "object or array",
            json_type_name(other),
        )),
    }
}

fn step_mut<'a>(
    value: &'a mut Value,
    segment: &PathSegment,
    path: &DocPath,
) -> Result<&'a mut Value> {
    match value {
        Value::Object(map) => map
            .get_mut(&segment.token())
            .ok_or_else(|| Error::node_not_found(path.to_pointer())),
        Value::Array(items) => segment
            .as_index()
            .and_then(|index| items.get_mut(index))
            .ok_or_else(|| Error::node_not_found(path.to_pointer())),
        other => Err(Error::type_mismatch(
            path.to_pointer(),
            "object or array",
            json_type_name(other),
        )),
    }
}
