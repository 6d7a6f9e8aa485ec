//! Device ids and typed device handles.

use std::marker::PhantomData;

/// Position of a device in its [`DeviceRegistry`](super::DeviceRegistry).
///
/// Events carry a `DeviceId` rather than a reference to the device, so the
/// queue never owns or borrows devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceId(usize);

impl DeviceId {
    #[inline]
    pub fn new(index: usize) -> Self {
        DeviceId(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "D{}", self.0)
    }
}

/// A [`DeviceId`] that remembers the concrete device type.
///
/// Handles are what setup code uses to build input events and to read a
/// device back out of the registry without downcasting by hand.
pub struct DeviceHandle<D> {
    id: DeviceId,
    _marker: PhantomData<fn() -> D>,
}

impl<D> DeviceHandle<D> {
    pub(crate) fn new(id: DeviceId) -> Self {
        DeviceHandle {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(self) -> DeviceId {
        self.id
    }
}

// Manual impls: deriving would demand `D: Clone` etc.
impl<D> Clone for DeviceHandle<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for DeviceHandle<D> {}

impl<D> PartialEq for DeviceHandle<D> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<D> Eq for DeviceHandle<D> {}

impl<D> std::fmt::Debug for DeviceHandle<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeviceHandle({})", self.id)
    }
}
