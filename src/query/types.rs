//! Query handles and the values they carry.

use crate::helpers::{compare, strict_equals, CloneMode, ObjectCompareType};
use crate::value::Value;
use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::fmt;
use std::time::Duration;

/// Unique ID of a query scope within its store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(pub u64);

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query#{}", self.0)
    }
}

/// A value a query can emit.
///
/// `is_same` drives duplicate suppression; `isolate` produces the copy handed
/// to the subscriber.
pub trait Selectable: Send + 'static {
    fn is_same(&self, previous: &Self, compare_type: ObjectCompareType) -> bool;

    fn isolate(&self, mode: CloneMode) -> Self;
}

impl Selectable for Value {
    fn is_same(&self, previous: &Self, compare_type: ObjectCompareType) -> bool {
        if self.is_object_like() && previous.is_object_like() {
            compare(compare_type, previous, self)
        } else {
            strict_equals(previous, self)
        }
    }

    fn isolate(&self, mode: CloneMode) -> Self {
        if self.is_object_like() {
            mode.apply(self)
        } else {
            self.clone()
        }
    }
}

macro_rules! selectable_by_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Selectable for $ty {
                fn is_same(&self, previous: &Self, _: ObjectCompareType) -> bool {
                    self == previous
                }

                fn isolate(&self, _: CloneMode) -> Self {
                    self.clone()
                }
            }
        )*
    };
}

selectable_by_eq!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String, ());

impl<T: Selectable> Selectable for Option<T> {
    fn is_same(&self, previous: &Self, compare_type: ObjectCompareType) -> bool {
        match (self, previous) {
            (Some(a), Some(b)) => a.is_same(b, compare_type),
            (None, None) => true,
            _ => false,
        }
    }

    fn isolate(&self, mode: CloneMode) -> Self {
        self.as_ref().map(|v| v.isolate(mode))
    }
}

impl<T: Selectable> Selectable for Vec<T> {
    fn is_same(&self, previous: &Self, compare_type: ObjectCompareType) -> bool {
        self.len() == previous.len()
            && self
                .iter()
                .zip(previous)
                .all(|(a, b)| a.is_same(b, compare_type))
    }

    fn isolate(&self, mode: CloneMode) -> Self {
        self.iter().map(|v| v.isolate(mode)).collect()
    }
}

macro_rules! selectable_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Selectable),+> Selectable for ($($name,)+) {
            fn is_same(&self, previous: &Self, compare_type: ObjectCompareType) -> bool {
                $(self.$idx.is_same(&previous.$idx, compare_type))&&+
            }

            fn isolate(&self, mode: CloneMode) -> Self {
                ($(self.$idx.isolate(mode),)+)
            }
        }
    };
}

selectable_tuple!(A: 0, B: 1);
selectable_tuple!(A: 0, B: 1, C: 2);

/// Receiving end of a query.
///
/// The stream disconnects when the scope is disposed, dropped for falling
/// behind, or the store is destroyed.
pub struct QueryHandle<R> {
    pub id: QueryId,
    pub(crate) receiver: Receiver<R>,
}

impl<R> QueryHandle<R> {
    /// Receive the next value (blocking).
    pub fn recv(&self) -> Result<R, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a value (non-blocking).
    pub fn try_recv(&self) -> Result<R, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<R, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything received so far.
    pub fn try_iter(&self) -> impl Iterator<Item = R> + '_ {
        self.receiver.try_iter()
    }

    /// Underlying channel, for use with `crossbeam_channel::select!`.
    pub fn receiver(&self) -> &Receiver<R> {
        &self.receiver
    }
}
