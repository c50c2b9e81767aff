//! Dynamic value graph held by stores.
//!
//! `Value` mirrors a plain object graph with reference semantics: cloning a
//! `Value` aliases the same node, so identity and sharing are observable and
//! a node can be frozen in place. Primitives are carried inline.
//!
//! Every `Object`, `Array` and `Date` node carries a frozen flag. Once set,
//! every mutator on that node fails with [`StoreError::ImmutableMutation`].

mod date;
mod json;

pub use date::Date;

use crate::error::{Result, StoreError};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, freezable storage cell behind every non-primitive value.
pub(crate) struct Node<T> {
    frozen: AtomicBool,
    data: RwLock<T>,
}

impl<T> Node<T> {
    pub(crate) fn new(data: T) -> Arc<Self> {
        Arc::new(Self {
            frozen: AtomicBool::new(false),
            data: RwLock::new(data),
        })
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Set the frozen flag. Taken under the write lock so no mutation can be
    /// in flight while the flag flips.
    pub(crate) fn freeze(&self) {
        let _guard = self.data.write();
        self.frozen.store(true, Ordering::Release);
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, T> {
        self.data.read()
    }

    /// Acquire the data for mutation, failing if the node is frozen.
    pub(crate) fn write(&self, what: impl FnOnce(&T) -> String) -> Result<RwLockWriteGuard<'_, T>> {
        let guard = self.data.write();
        if self.frozen.load(Ordering::Acquire) {
            return Err(StoreError::ImmutableMutation(what(&*guard)));
        }
        Ok(guard)
    }
}

/// Contents of an object node.
#[derive(Clone, Default)]
pub(crate) struct ObjectData {
    pub(crate) class: Option<Arc<str>>,
    pub(crate) fields: BTreeMap<String, Value>,
}

/// Shared handle to a string-keyed record.
///
/// An object may carry a class tag naming the domain type it represents.
/// Clones, merges and re-hydration preserve the tag.
#[derive(Clone)]
pub struct Object(pub(crate) Arc<Node<ObjectData>>);

impl Object {
    /// Create an empty plain object.
    pub fn new() -> Self {
        Self(Node::new(ObjectData::default()))
    }

    /// Create an empty object tagged with a class name.
    pub fn with_class(class: impl AsRef<str>) -> Self {
        Self(Node::new(ObjectData {
            class: Some(Arc::from(class.as_ref())),
            fields: BTreeMap::new(),
        }))
    }

    pub(crate) fn from_parts(class: Option<Arc<str>>, fields: BTreeMap<String, Value>) -> Self {
        Self(Node::new(ObjectData { class, fields }))
    }

    /// Class tag, if any.
    pub fn class(&self) -> Option<Arc<str>> {
        self.0.read().class.clone()
    }

    /// Replace the class tag.
    pub fn set_class(&self, class: Option<&str>) -> Result<()> {
        let mut data = self.0.write(|_| "cannot change the class of a frozen object".into())?;
        data.class = class.map(Arc::from);
        Ok(())
    }

    /// Get a field (aliases the stored handle).
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.read().fields.get(key).cloned()
    }

    /// Set a field, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>> {
        let key = key.into();
        let mut data = self
            .0
            .write(|_| format!("cannot assign property \"{}\" of a frozen object", key))?;
        Ok(data.fields.insert(key, value.into()))
    }

    /// Remove a field, returning its value.
    pub fn remove(&self, key: &str) -> Result<Option<Value>> {
        let mut data = self
            .0
            .write(|_| format!("cannot delete property \"{}\" of a frozen object", key))?;
        Ok(data.fields.remove(key))
    }

    /// Whether the object has a field named `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.read().fields.contains_key(key)
    }

    /// Field names in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.0.read().fields.keys().cloned().collect()
    }

    /// Snapshot of all fields. The lock is released before returning.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .read()
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn fields(&self) -> BTreeMap<String, Value> {
        self.0.read().fields.clone()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.read().fields.len()
    }

    /// Whether the object has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.read().fields.is_empty()
    }

    /// Freeze this node only (children stay as they are).
    pub fn freeze(&self) {
        self.0.freeze();
    }

    /// Whether this node rejects writes.
    pub fn is_frozen(&self) -> bool {
        self.0.is_frozen()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let fields = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_parts(None, fields)
    }
}

/// Largest number of nulls `Array::set` inserts to reach a sparse index.
pub const MAX_SPARSE_GAP: usize = 1 << 16;

/// Shared handle to an ordered list.
#[derive(Clone)]
pub struct Array(pub(crate) Arc<Node<Vec<Value>>>);

impl Array {
    /// Create an empty array.
    pub fn new() -> Self {
        Self(Node::new(Vec::new()))
    }

    /// Wrap `items` in a new array node.
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Node::new(items))
    }

    /// Element at `index` (aliases the stored handle).
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    /// Replace the element at `index`; appends when `index == len`.
    ///
    /// Writing past the end fills the gap with nulls. Gaps wider than
    /// [`MAX_SPARSE_GAP`] fail with `IndexOutOfRange`.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        let mut items = self
            .0
            .write(|_| format!("cannot assign index {} of a frozen array", index))?;
        let value = value.into();
        let len = items.len();
        if index < len {
            items[index] = value;
        } else if index - len > MAX_SPARSE_GAP {
            return Err(StoreError::IndexOutOfRange { index, len });
        } else {
            items.resize(index, Value::Null);
            items.push(value);
        }
        Ok(())
    }

    /// Append an element.
    pub fn push(&self, value: impl Into<Value>) -> Result<()> {
        let mut items = self.0.write(|_| "cannot add an item to a frozen array".into())?;
        items.push(value.into());
        Ok(())
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Result<Option<Value>> {
        let mut items = self.0.write(|_| "cannot remove an item from a frozen array".into())?;
        Ok(items.pop())
    }

    /// Remove every element.
    pub fn clear(&self) -> Result<()> {
        let mut items = self.0.write(|_| "cannot clear a frozen array".into())?;
        items.clear();
        Ok(())
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Snapshot of the elements (aliased handles).
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    /// Freeze this node only (elements stay as they are).
    pub fn freeze(&self) {
        self.0.freeze();
    }

    /// Whether this node rejects writes.
    pub fn is_frozen(&self) -> bool {
        self.0.is_frozen()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

type Callable = dyn Fn(&[Value]) -> Value + Send + Sync;

/// Opaque callable value.
///
/// Functions are never copied or frozen; clones share the same callable.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    callable: Arc<Callable>,
}

impl Function {
    /// Wrap `callable` under a display name.
    pub fn new<F>(name: impl AsRef<str>, callable: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.as_ref()),
            callable: Arc::new(callable),
        }
    }

    /// Display name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the wrapped callable.
    pub fn call(&self, args: &[Value]) -> Value {
        (self.callable)(args)
    }

    /// Whether both handles share the same callable.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.callable, &other.callable)
    }
}

/// A node in a store's value graph.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(Date),
    Array(Array),
    Object(Object),
    Function(Function),
}

impl Value {
    /// Empty plain object.
    pub fn object() -> Self {
        Value::Object(Object::new())
    }

    /// Empty array.
    pub fn array() -> Self {
        Value::Array(Array::new())
    }

    /// Whether this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for objects, arrays and dates: the node kinds that are cloned,
    /// frozen and compared structurally.
    pub fn is_object_like(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_) | Value::Date(_))
    }

    /// Plain record (not an array or date).
    pub fn is_plain_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// The object handle, if this is an object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The array handle, if this is an array.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The date handle, if this is a date.
    pub fn as_date(&self) -> Option<&Date> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    /// The function handle, if this is a function.
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// String contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value when it is a whole number.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    /// Boolean value, if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Field lookup on objects; `None` for every other kind.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_object().and_then(|o| o.get(key))
    }

    /// Element lookup on arrays; `None` for every other kind.
    pub fn at(&self, index: usize) -> Option<Value> {
        self.as_array().and_then(|a| a.get(index))
    }

    /// Set a field on an object value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>> {
        match self {
            Value::Object(o) => o.set(key, value),
            other => Err(StoreError::TypeMismatch {
                expected: "object",
                got: other.type_name(),
            }),
        }
    }

    /// Class tag of an object value.
    pub fn class(&self) -> Option<Arc<str>> {
        self.as_object().and_then(|o| o.class())
    }

    /// Whether this node is frozen. Primitives are always immutable.
    pub fn is_frozen(&self) -> bool {
        match self {
            Value::Object(o) => o.is_frozen(),
            Value::Array(a) => a.is_frozen(),
            Value::Date(d) => d.is_frozen(),
            Value::Function(_) => false,
            _ => true,
        }
    }

    /// Identity comparison between two handles. Primitives never share
    /// identity; use [`crate::helpers::strict_equals`] for `===` semantics.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Date(a), Value::Date(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

/// Deep structural equality (the `advanced` comparison strategy).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        crate::helpers::advanced_equals(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Date(d) => write!(f, "{:?}", d),
            Value::Array(a) => f.debug_list().entries(a.to_vec()).finish(),
            Value::Object(o) => {
                if let Some(class) = o.class() {
                    write!(f, "{} ", class)?;
                }
                f.debug_map().entries(o.entries()).finish()
            }
            Value::Function(func) => write!(f, "[Function {}]", func.name()),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Value::Object(self.clone()), f)
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Value::Array(self.clone()), f)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function {}]", self.name)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Date> for Value {
    fn from(d: Date) -> Self {
        Value::Date(d)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array::from_vec(items))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
