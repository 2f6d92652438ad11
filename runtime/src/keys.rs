use lasso::Spur;
use std::fmt::Display;
use std::num::NonZeroU32;

pub type Symbol = Spur;

/// Process-stable class identifier handed out by the class-loading side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(NonZeroU32);

impl ClassId {
    pub fn new(id: NonZeroU32) -> Self {
        Self(id)
    }

    /// Returns `None` for 0, which is never a valid class id.
    pub fn from_u32(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    pub fn into_inner(self) -> NonZeroU32 {
        self.0
    }

    pub fn as_u32(&self) -> u32 {
        self.0.get()
    }
}

impl Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of an object owned by the allocation side. Only used as a key.
pub type ObjectId = usize;

/// Lookup key for a declared field inside one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub name: Symbol,
    pub scope: crate::rt::field::FieldScope,
}
